// HTTP API server binary for game-finder

use anyhow::{Context, Result};
use game_finder::advisor::{ModelConfig, ModelHandle};
use game_finder::api::{ApiServer, AppState};
use game_finder::catalog::CatalogClient;
use game_finder::tracing::init_tracing;
use game_finder::util::db::Db;
use game_finder::util::env as env_util;

#[actix_web::main]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing("info,sqlx=warn")?;

    tracing::info!("Initializing game-finder API server");

    env_util::preflight_check(
        "api_server",
        &["API_SECRET"],
        &[
            "API_HOST",
            "API_PORT",
            "API_SECRET",
            "ALLOWED_ORIGINS",
            "DATABASE_URL",
            "DB_MAX_CONNS",
            "IGDB_BASE_URL",
            "IGDB_CLIENT_ID",
            "IGDB_ACCESS_TOKEN",
            "CATALOG_TOTAL_COUNT_CAP",
            "GEMINI_BASE_URL",
            "GEMINI_MODEL",
            "GEMINI_API_KEY",
            "GEMINI_CHAT_MODEL",
            "GEMINI_API_KEY_FLASH",
        ],
    )?;

    let server = ApiServer::from_env()?;

    let catalog = CatalogClient::from_env().context("building catalog client")?;
    if !catalog.is_configured() {
        tracing::warn!("catalog credentials missing; catalog endpoints will return empty results");
    }
    let advisor = ModelHandle::new("advisor", ModelConfig::advisory_from_env())
        .context("building advisory model handle")?;
    let chat = ModelHandle::new("chat", ModelConfig::chat_from_env())
        .context("building chat model handle")?;

    let database_url = env_util::database_url();
    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNS", 5u32);
    let db = Db::connect(&database_url, max_connections).await?;

    tracing::info!("Collection store ready");

    server
        .run(AppState::new(catalog, advisor, chat, db))
        .await
}
