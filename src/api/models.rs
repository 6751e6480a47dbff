// API request/response models (DTOs)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::advisor::ChatMessage;
use crate::catalog::{GameFilter, ListingFilter, SortKey};
use crate::collections::{GameStatus, ItemId, ItemRef};
use crate::error::{FinderError, Result};

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: Some(Meta::now()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            meta: Some(Meta::now()),
        }
    }
}

/// Metadata included in all API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct Meta {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub version: String,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: uuid::Uuid::new_v4().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub catalog_configured: bool,
    pub uptime_seconds: u64,
}

/// Game browser query string: `?search=&platform=&page=&pageSize=&sort=`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamesQuery {
    pub search: Option<String>,
    pub platform: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort: Option<String>,
}

impl GamesQuery {
    pub fn into_filter(self) -> Result<GameFilter> {
        Ok(GameFilter {
            search: self.search,
            platform_name: self.platform,
            page: self.page,
            page_size: self.page_size,
            sort: parse_sort(self.sort.as_deref())?,
        })
    }
}

/// Franchise / studio listing query string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort: Option<String>,
}

impl ListingQuery {
    pub fn into_filter(self) -> Result<ListingFilter> {
        Ok(ListingFilter {
            search: self.search,
            page: self.page,
            page_size: self.page_size,
            sort: parse_sort(self.sort.as_deref())?,
        })
    }
}

fn parse_sort(raw: Option<&str>) -> Result<Option<SortKey>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse().map(Some).map_err(FinderError::InvalidInput),
        None => Ok(None),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiscoverRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricesRequest {
    pub game_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatusRequest {
    pub status: GameStatus,
    pub game_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatusResponse {
    pub game_id: i64,
    pub status: GameStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FavoriteStatusesRequest {
    pub items: Vec<ItemId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggleResponse {
    pub is_favorite: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedList {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToListsRequest {
    pub list_ids: Vec<String>,
    pub item: ItemRef,
}
