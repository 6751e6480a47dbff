//! Natural-language game discovery: the advisory model suggests titles, the
//! catalog resolves them into real entries.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::model::{ModelHandle, Validate};
use crate::catalog::{CatalogClient, Game};
use crate::error::{FinderError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub reason: String,
}

/// Structured model output. `recommendations` may legitimately be empty, in which
/// case `introduction_text` explains why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryOutput {
    pub introduction_text: String,
    pub recommendations: Vec<Recommendation>,
}

impl Validate for DiscoveryOutput {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.introduction_text.trim().is_empty() {
            return Err("introductionText must not be empty".to_string());
        }
        if let Some(r) = self.recommendations.iter().find(|r| r.title.trim().is_empty()) {
            return Err(format!("recommendation with empty title (reason: {})", r.reason));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedGame {
    #[serde(flatten)]
    pub game: Game,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResult {
    pub introduction_text: String,
    pub games: Vec<RecommendedGame>,
}

fn output_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "introductionText": {
                "type": "STRING",
                "description": "Friendly text introducing the recommendations, or explaining why there are none. Never empty."
            },
            "recommendations": {
                "type": "ARRAY",
                "description": "3 to 5 recommended games; empty when nothing relevant exists.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING", "description": "Exact, official game title." },
                        "reason": { "type": "STRING", "description": "One or two sentences on why it fits." }
                    },
                    "required": ["title", "reason"]
                }
            }
        },
        "required": ["introductionText", "recommendations"]
    })
}

fn prompt(query: &str) -> String {
    format!(
        "You are a friendly and expert video game assistant.\n\
         Write a short introduction, then suggest 3 to 5 games matching the user's request.\n\
         Always fill introductionText; if nothing matches, explain why there and return an empty \
         recommendations array.\n\
         Use the exact, official title of each game.\n\n\
         User request: {query}"
    )
}

/// Ask the advisory model for recommendations. An unparseable or empty reply is an error;
/// an empty recommendation list is not.
#[instrument(skip(model))]
pub async fn find_games(model: &ModelHandle, query: &str) -> Result<DiscoveryOutput> {
    let query = query.trim();
    if query.is_empty() {
        return Err(FinderError::InvalidInput("discovery query is empty".to_string()));
    }
    let output: DiscoveryOutput = model
        .generate_structured(&prompt(query), &output_schema())
        .await?;
    info!(
        target: "advisor",
        recommendations = output.recommendations.len(),
        "discovery model replied"
    );
    Ok(output)
}

/// Resolve each recommendation against the catalog concurrently. Titles without a
/// match, or whose lookup fails, are dropped; order of the surviving titles is kept.
pub async fn resolve_recommendations(
    catalog: &CatalogClient,
    recommendations: Vec<Recommendation>,
) -> Vec<RecommendedGame> {
    let lookups = recommendations.into_iter().map(|rec| async move {
        match catalog.find_game_by_title(&rec.title).await {
            Ok(Some(game)) => Some(RecommendedGame {
                game,
                reason: rec.reason,
            }),
            Ok(None) => {
                warn!(target: "advisor", title = %rec.title, "no catalog match for recommendation");
                None
            }
            Err(err) => {
                warn!(
                    target: "advisor",
                    title = %rec.title,
                    error = %err,
                    "catalog lookup failed for recommendation"
                );
                None
            }
        }
    });
    join_all(lookups).await.into_iter().flatten().collect()
}

/// Full discovery flow: model suggestions resolved into catalog games.
pub async fn discover(
    model: &ModelHandle,
    catalog: &CatalogClient,
    query: &str,
) -> Result<DiscoveryResult> {
    let output = find_games(model, query).await?;
    let games = resolve_recommendations(catalog, output.recommendations).await;
    Ok(DiscoveryResult {
        introduction_text: output.introduction_text,
        games,
    })
}
