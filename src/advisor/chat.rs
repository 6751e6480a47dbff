use tracing::{info, instrument};

use super::model::{ChatMessage, ChatRole, ModelHandle};
use crate::error::{FinderError, Result};

const SYSTEM_PROMPT: &str = "You are a friendly and expert video game assistant named GameFinder. \
Help users discover new video games based on their preferences. \
Keep responses concise, friendly and helpful, and ask clarifying questions when needed. \
When you recommend a game, briefly say why. \
Do not recommend more than 3 games at a time unless explicitly asked. \
Do not use markdown.";

const CHAT_TEMPERATURE: f32 = 0.7;

/// Free-text assistant reply to a multi-turn conversation.
///
/// The history must be non-empty and end with a user turn.
#[instrument(skip(model, history), fields(turns = history.len()))]
pub async fn chat(model: &ModelHandle, history: &[ChatMessage]) -> Result<String> {
    match history.last() {
        None => {
            return Err(FinderError::InvalidInput(
                "chat history is empty".to_string(),
            ))
        }
        Some(last) if last.role != ChatRole::User => {
            return Err(FinderError::InvalidInput(
                "chat history must end with a user message".to_string(),
            ))
        }
        Some(_) => {}
    }
    let reply = model
        .generate_text(Some(SYSTEM_PROMPT), history, Some(CHAT_TEMPERATURE))
        .await?;
    info!(target: "advisor", chars = reply.len(), "chat reply generated");
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::model::ModelConfig;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn flash(server: &Server) -> ModelHandle {
        let mut cfg = ModelConfig::new(Some("flash-key".into()), "flash");
        cfg.base_url = server.url();
        ModelHandle::new("chat", cfg).unwrap()
    }

    #[tokio::test]
    async fn replies_with_model_text() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/flash:generateContent")
            .match_header("x-goog-api-key", "flash-key")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": { "temperature": 0.7 }
            })))
            .with_body(
                json!({ "candidates": [{ "content": { "parts": [
                    { "text": "Try Hollow Knight, " },
                    { "text": "it nails exploration." }
                ] } }] })
                .to_string(),
            )
            .create_async()
            .await;

        let history = vec![ChatMessage::user("I liked Celeste, what next?")];
        let reply = chat(&flash(&server), &history).await.unwrap();
        mock.assert_async().await;
        assert_eq!(reply, "Try Hollow Knight, it nails exploration.");
    }

    #[tokio::test]
    async fn rejects_empty_or_model_terminated_history() {
        let server = Server::new_async().await;
        let handle = flash(&server);
        assert!(chat(&handle, &[]).await.unwrap_err().is_client_error());
        let history = vec![ChatMessage::user("hi"), ChatMessage::model("hello!")];
        assert!(chat(&handle, &history).await.unwrap_err().is_client_error());
    }
}
