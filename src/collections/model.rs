use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::Game;

/// Per-user play state of a game. A game with no record is `Unplayed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Unplayed,
    Playing,
    Played,
}

impl GameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Unplayed => "unplayed",
            GameStatus::Playing => "playing",
            GameStatus::Played => "played",
        }
    }

    /// Counts towards the user's experiences.
    pub fn is_experienced(self) -> bool {
        matches!(self, GameStatus::Playing | GameStatus::Played)
    }
}

impl FromStr for GameStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unplayed" => Ok(GameStatus::Unplayed),
            "playing" => Ok(GameStatus::Playing),
            "played" => Ok(GameStatus::Played),
            other => Err(format!("unknown game status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Game,
    Franchise,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Game => "game",
            ItemType::Franchise => "franchise",
        }
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "game" => Ok(ItemType::Game),
            "franchise" => Ok(ItemType::Franchise),
            other => Err(format!("unknown item type: {other}")),
        }
    }
}

/// Identity of a favoritable / listable item. Displays as its store key, `"{type}-{id}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId {
    pub id: i64,
    #[serde(rename = "type")]
    pub item_type: ItemType,
}

impl ItemId {
    pub fn new(item_type: ItemType, id: i64) -> Self {
        Self { id, item_type }
    }

    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.item_type.as_str(), self.id)
    }
}

/// Item reference as stored in favorites and lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    pub id: i64,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub name: String,
    pub cover_url: String,
}

impl ItemRef {
    pub fn item_id(&self) -> ItemId {
        ItemId::new(self.item_type, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGame {
    pub game_id: i64,
    pub status: GameStatus,
    pub game_name: String,
    pub updated_at: DateTime<Utc>,
}

/// A catalog game joined with the user's status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperiencedGame {
    #[serde(flatten)]
    pub game: Game,
    pub status: GameStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    /// Store key, `"{type}-{id}"`.
    pub id: String,
    pub item_id: i64,
    pub item_type: ItemType,
    pub name: String,
    pub cover_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserList {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub item_count: u32,
    pub cover_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    /// Store key, `"{type}-{id}"`.
    pub id: String,
    pub item_id: i64,
    pub item_type: ItemType,
    pub name: String,
    pub cover_url: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDetails {
    pub list: UserList,
    pub items: Vec<ListItem>,
}

/// Whether an item is a member of one of the user's lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMembership {
    pub id: String,
    pub name: String,
    pub in_list: bool,
}
