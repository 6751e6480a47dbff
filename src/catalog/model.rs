use serde::{Deserialize, Serialize};

/// Image reference used when the catalog has no cover, screenshot or logo.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.jpg";

/// A reference to another catalog entity (genre, theme, franchise, platform, company...).
///
/// The name is only present when the query expanded the nested field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screenshot {
    pub id: i64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Resolved cover URL, or [`PLACEHOLDER_IMAGE`].
    pub cover_url: String,
    pub platforms: Vec<NamedRef>,
    /// 0-100, 0 meaning unrated.
    pub rating: f64,
    pub screenshots: Vec<Screenshot>,
    /// Seconds since the Unix epoch.
    pub release_date: Option<i64>,
    pub genres: Vec<NamedRef>,
    pub themes: Vec<NamedRef>,
    pub franchises: Vec<NamedRef>,
    pub game_modes: Vec<NamedRef>,
    pub videos: Vec<Video>,
    pub developers: Vec<NamedRef>,
    pub publishers: Vec<NamedRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Franchise {
    pub id: i64,
    pub name: String,
    pub cover_url: String,
    /// Newest release first, undated games last.
    pub games: Vec<Game>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Studio {
    pub id: i64,
    pub name: String,
    pub logo_url: String,
    pub developed: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: i64,
    pub name: String,
}

/// One page of a catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Capped total reported by the catalog for the unpaginated query.
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }
}
