use reqwest::Client;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, error, instrument, warn};

use super::mapper::{map_franchise, map_game, map_platform, map_studio, parse_count};
use super::model::{Franchise, Game, Page, Platform, Studio};
use super::query::{
    build_franchise_query, build_game_query, build_studio_query, by_id, GameFilter, ListingFilter,
};
use crate::error::{FinderError, Result};
use crate::normalization::platform::{canonical_platform_name, PlatformFamily};
use crate::util::env::{env_opt, env_parse};

const IGDB_BASE_URL: &str = "https://api.igdb.com/v4";
const DEFAULT_TOTAL_COUNT_CAP: u64 = 50_000;
/// Value shipped in the sample `.env`; treated the same as an unset client id.
const PLACEHOLDER_CLIENT_ID: &str = "your_client_id_here";

const GAME_LIST_FIELDS: &str = "name, cover.url, platforms.name, total_rating, first_release_date";
const GAME_DETAIL_FIELDS: &str = "name, summary, cover.url, platforms.name, total_rating, \
    screenshots.url, first_release_date, genres.name, themes.name, franchises.name, \
    game_modes.name, videos.video_id, videos.name, involved_companies.company.name, \
    involved_companies.developer, involved_companies.publisher";
const FRANCHISE_LIST_FIELDS: &str = "name, games.name, games.cover.url, games.first_release_date";
const FRANCHISE_DETAIL_FIELDS: &str = "name, games.name, games.cover.url, games.platforms.name, \
    games.total_rating, games.first_release_date";
const STUDIO_LIST_FIELDS: &str = "name, logo.url, developed.id";

/// Popular platform ids offered by the platform filter: PC, PS4, Xbox One,
/// Switch, PS5, Xbox Series X|S.
const POPULAR_PLATFORM_IDS: [i64; 6] = [6, 48, 49, 130, 167, 169];

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub client_id: Option<String>,
    pub access_token: Option<String>,
    /// Upper bound for reported totals; pages themselves are never truncated.
    pub total_count_cap: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: IGDB_BASE_URL.to_string(),
            client_id: None,
            access_token: None,
            total_count_cap: DEFAULT_TOTAL_COUNT_CAP,
        }
    }
}

impl CatalogConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_opt("IGDB_BASE_URL") {
            cfg.base_url = v;
        }
        cfg.client_id = env_opt("IGDB_CLIENT_ID");
        cfg.access_token = env_opt("IGDB_ACCESS_TOKEN");
        cfg.total_count_cap = env_parse("CATALOG_TOTAL_COUNT_CAP", DEFAULT_TOTAL_COUNT_CAP);
        cfg
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        let client_id = self
            .client_id
            .as_deref()
            .filter(|id| *id != PLACEHOLDER_CLIENT_ID)?;
        let token = self.access_token.as_deref()?;
        Some((client_id, token))
    }
}

/// Client for the external game catalog (IGDB).
///
/// Missing credentials are not an error: every call degrades to empty results so
/// the browse pages still render. A non-2xx response once credentials are set is.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    cfg: CatalogConfig,
    http: Client,
}

impl CatalogClient {
    pub fn new(cfg: CatalogConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("game-finder/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { cfg, http })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(CatalogConfig::from_env())
    }

    pub fn is_configured(&self) -> bool {
        self.cfg.credentials().is_some()
    }

    /// POST a query to `endpoint`; `Ok(None)` when credentials are not configured.
    #[instrument(skip(self, body))]
    async fn post(&self, endpoint: &str, body: String) -> Result<Option<Value>> {
        let Some((client_id, token)) = self.cfg.credentials() else {
            warn!(
                target: "catalog",
                endpoint,
                "catalog credentials are not configured; returning empty result"
            );
            return Ok(None);
        };
        let url = format!("{}/{}", self.cfg.base_url.trim_end_matches('/'), endpoint);
        debug!(target: "catalog", endpoint, body = %body, "catalog query");
        let response = self
            .http
            .post(&url)
            .header("Client-ID", client_id)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(
                target: "catalog",
                endpoint,
                status = status.as_u16(),
                body = %text,
                "catalog request failed"
            );
            return Err(FinderError::CatalogStatus {
                status: status.as_u16(),
                body: text,
            });
        }
        let payload: Value = response.json().await?;
        Ok(Some(payload))
    }

    async fn fetch_records(&self, endpoint: &str, body: String) -> Result<Vec<Value>> {
        match self.post(endpoint, body).await? {
            Some(Value::Array(records)) => Ok(records),
            Some(other) => {
                warn!(
                    target: "catalog",
                    endpoint,
                    kind = json_kind(&other),
                    "expected an array of records; treating as empty"
                );
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_count(&self, endpoint: &str, body: String) -> Result<u64> {
        let count = self
            .post(&format!("{endpoint}/count"), body)
            .await?
            .map(|payload| parse_count(&payload))
            .unwrap_or(0);
        Ok(count.min(self.cfg.total_count_cap))
    }

    /// One page of the game browser plus the capped total for the filter.
    #[instrument(skip(self))]
    pub async fn games(&self, filter: &GameFilter) -> Result<Page<Game>> {
        let query = build_game_query(filter);
        let total_count = self.fetch_count("games", query.count_body()).await?;
        let records = self
            .fetch_records("games", query.page_body(GAME_LIST_FIELDS))
            .await?;
        Ok(Page {
            items: records.iter().map(map_game).collect(),
            total_count,
        })
    }

    /// First catalog game whose name matches `title`, by the default popularity order.
    pub async fn find_game_by_title(&self, title: &str) -> Result<Option<Game>> {
        let filter = GameFilter {
            search: Some(title.to_string()),
            page_size: Some(1),
            ..GameFilter::default()
        };
        let query = build_game_query(&filter);
        let records = self
            .fetch_records("games", query.page_body(GAME_LIST_FIELDS))
            .await?;
        Ok(records.first().map(map_game))
    }

    #[instrument(skip(self))]
    pub async fn game_details(&self, id: i64) -> Result<Option<Game>> {
        let body = format!("fields {GAME_DETAIL_FIELDS}; {}", by_id(id));
        let records = self.fetch_records("games", body).await?;
        Ok(records.first().map(map_game))
    }

    /// Canonical platform filter options; the four baseline families are always present.
    #[instrument(skip(self))]
    pub async fn platforms(&self) -> Result<Vec<Platform>> {
        let ids = POPULAR_PLATFORM_IDS
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let body = format!("fields name; where id = ({ids}); limit 10;");
        let records = self.fetch_records("platforms", body).await?;
        Ok(canonical_platforms(records.iter().map(map_platform)))
    }

    #[instrument(skip(self))]
    pub async fn franchises(&self, filter: &ListingFilter) -> Result<Page<Franchise>> {
        let query = build_franchise_query(filter);
        let total_count = self.fetch_count("franchises", query.count_body()).await?;
        let records = self
            .fetch_records("franchises", query.page_body(FRANCHISE_LIST_FIELDS))
            .await?;
        Ok(Page {
            items: records.iter().map(map_franchise).collect(),
            total_count,
        })
    }

    #[instrument(skip(self))]
    pub async fn franchise_details(&self, id: i64) -> Result<Option<Franchise>> {
        let body = format!("fields {FRANCHISE_DETAIL_FIELDS}; {}", by_id(id));
        let records = self.fetch_records("franchises", body).await?;
        Ok(records.first().map(map_franchise))
    }

    #[instrument(skip(self))]
    pub async fn studios(&self, filter: &ListingFilter) -> Result<Page<Studio>> {
        let query = build_studio_query(filter);
        let total_count = self.fetch_count("companies", query.count_body()).await?;
        let records = self
            .fetch_records("companies", query.page_body(STUDIO_LIST_FIELDS))
            .await?;
        Ok(Page {
            items: records.iter().map(map_studio).collect(),
            total_count,
        })
    }
}

/// Collapse raw platforms into display families, first occurrence wins, then
/// fill in any missing baseline family.
fn canonical_platforms(raw: impl IntoIterator<Item = Platform>) -> Vec<Platform> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<Platform> = Vec::new();
    for platform in raw {
        if !POPULAR_PLATFORM_IDS.contains(&platform.id) {
            continue;
        }
        let name = canonical_platform_name(&platform.name);
        if name.is_empty() || !seen.insert(name.clone()) {
            continue;
        }
        out.push(Platform {
            id: platform.id,
            name,
        });
    }
    for (family, id) in PlatformFamily::BASELINE {
        let name = family.display_name();
        if seen.insert(name.to_string()) {
            out.push(Platform {
                id,
                name: name.to_string(),
            });
        }
    }
    out
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
