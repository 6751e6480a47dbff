use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::error::{FinderError, Result};
use crate::util::env::env_opt;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const ADVISORY_MODEL: &str = "gemini-2.5-pro";
const CHAT_MODEL: &str = "gemini-2.5-flash";

/// Resolved configuration for one generative model.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl ModelConfig {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: GEMINI_BASE_URL.to_string(),
            api_key,
            model: model.into(),
        }
    }

    /// Higher-capability model used for discovery and price lookups.
    pub fn advisory_from_env() -> Self {
        Self::from_env("GEMINI_API_KEY", "GEMINI_MODEL", ADVISORY_MODEL)
    }

    /// Faster model used for open-ended chat.
    pub fn chat_from_env() -> Self {
        Self::from_env("GEMINI_API_KEY_FLASH", "GEMINI_CHAT_MODEL", CHAT_MODEL)
    }

    fn from_env(key_var: &str, model_var: &str, default_model: &str) -> Self {
        let mut cfg = Self::new(
            env_opt(key_var),
            env_opt(model_var).unwrap_or_else(|| default_model.to_string()),
        );
        if let Some(base) = env_opt("GEMINI_BASE_URL") {
            cfg.base_url = base;
        }
        cfg
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
        }
    }
}

/// Runtime check of a structured model output beyond what deserialization enforces.
pub trait Validate {
    fn validate(&self) -> std::result::Result<(), String>;
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<ChatRole>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Long-lived handle to one configured model, created once at startup and passed
/// explicitly to the flows that need it.
#[derive(Debug, Clone)]
pub struct ModelHandle {
    name: &'static str,
    cfg: ModelConfig,
    http: Client,
}

impl ModelHandle {
    pub fn new(name: &'static str, cfg: ModelConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("game-finder/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { name, cfg, http })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    /// Free-text reply to a role-tagged history.
    pub async fn generate_text(
        &self,
        system: Option<&str>,
        history: &[ChatMessage],
        temperature: Option<f32>,
    ) -> Result<String> {
        let request = GenerateRequest {
            system_instruction: system.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            contents: history
                .iter()
                .map(|m| Content {
                    role: Some(m.role),
                    parts: vec![Part { text: &m.content }],
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature,
                ..GenerationConfig::default()
            },
        };
        self.generate(&request).await
    }

    /// Single prompt constrained to `schema`; the reply is parsed and validated as `T`.
    pub async fn generate_structured<T>(&self, prompt: &str, schema: &Value) -> Result<T>
    where
        T: DeserializeOwned + Validate,
    {
        let request = GenerateRequest {
            system_instruction: None,
            contents: vec![Content {
                role: Some(ChatRole::User),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: None,
                response_mime_type: Some("application/json"),
                response_schema: Some(schema),
            },
        };
        let text = self.generate(&request).await?;
        parse_structured(&text)
    }

    #[instrument(skip(self, request), fields(handle = self.name, model = %self.cfg.model))]
    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String> {
        let api_key = self
            .cfg
            .api_key
            .as_deref()
            .ok_or(FinderError::MissingCredentials(self.name))?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.model
        );
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(
                target: "advisor",
                handle = self.name,
                status = status.as_u16(),
                body = %text,
                "model request failed"
            );
            return Err(FinderError::ModelStatus {
                status: status.as_u16(),
                body: text,
            });
        }
        let body: GenerateResponse = response.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(FinderError::EmptyModelResponse);
        }
        debug!(target: "advisor", handle = self.name, chars = text.len(), "model replied");
        Ok(text)
    }
}

fn parse_structured<T>(text: &str) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let json = strip_code_fence(text);
    let parsed: T = serde_json::from_str(json)
        .map_err(|err| FinderError::InvalidModelOutput(format!("{err}")))?;
    parsed.validate().map_err(FinderError::InvalidModelOutput)?;
    Ok(parsed)
}

/// Models occasionally wrap JSON in a markdown fence despite the declared mime type.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Answer {
        value: String,
    }

    impl Validate for Answer {
        fn validate(&self) -> std::result::Result<(), String> {
            if self.value.is_empty() {
                return Err("value must not be empty".into());
            }
            Ok(())
        }
    }

    fn handle(server: &Server, key: Option<&str>) -> ModelHandle {
        let mut cfg = ModelConfig::new(key.map(str::to_string), "test-model");
        cfg.base_url = server.url();
        ModelHandle::new("test", cfg).unwrap()
    }

    fn reply(text: &str) -> String {
        json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }] })
            .to_string()
    }

    #[tokio::test]
    async fn sends_history_and_system_prompt() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/test-model:generateContent")
            .match_header("x-goog-api-key", "secret")
            .match_body(Matcher::PartialJson(json!({
                "systemInstruction": { "parts": [{ "text": "be brief" }] },
                "contents": [
                    { "role": "user", "parts": [{ "text": "hi" }] },
                    { "role": "model", "parts": [{ "text": "hello" }] }
                ],
                "generationConfig": { "temperature": 0.5 }
            })))
            .with_body(reply("Try Hades."))
            .create_async()
            .await;

        let history = [ChatMessage::user("hi"), ChatMessage::model("hello")];
        let text = handle(&server, Some("secret"))
            .generate_text(Some("be brief"), &history, Some(0.5))
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(text, "Try Hades.");
    }

    #[tokio::test]
    async fn structured_output_is_validated() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/models/test-model:generateContent")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .with_body(reply(r#"{"value":""}"#))
            .create_async()
            .await;

        let err = handle(&server, Some("k"))
            .generate_structured::<Answer>("q", &json!({ "type": "OBJECT" }))
            .await
            .unwrap_err();
        assert!(matches!(err, FinderError::InvalidModelOutput(_)));
    }

    #[tokio::test]
    async fn empty_candidates_are_a_hard_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/models/test-model:generateContent")
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;
        let err = handle(&server, Some("k"))
            .generate_text(None, &[ChatMessage::user("hi")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, FinderError::EmptyModelResponse));
    }

    #[tokio::test]
    async fn missing_key_fails_before_calling_out() {
        let mut server = Server::new_async().await;
        let never = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let model = handle(&server, None);
        let err = model
            .generate_text(None, &[ChatMessage::user("hi")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, FinderError::MissingCredentials(name) if name == model.name()));
        never.assert_async().await;
    }

    #[tokio::test]
    async fn upstream_status_is_surfaced() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/models/test-model:generateContent")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;
        let err = handle(&server, Some("k"))
            .generate_text(None, &[ChatMessage::user("hi")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, FinderError::ModelStatus { status: 503, .. }));
    }

    #[test]
    fn strips_markdown_fences() {
        let parsed: Answer = parse_structured("```json\n{\"value\":\"ok\"}\n```").unwrap();
        assert_eq!(parsed.value, "ok");
        assert!(parse_structured::<Answer>("not json").is_err());
    }
}
