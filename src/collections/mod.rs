//! Per-user collections: game statuses, favorites and named lists.

pub mod favorites;
pub mod games;
pub mod lists;
pub mod model;
pub mod optimistic;

use std::str::FromStr;

use crate::error::{FinderError, Result};

pub use model::{
    ExperiencedGame, FavoriteItem, GameStatus, ItemId, ItemRef, ItemType, ListDetails, ListItem,
    ListMembership, UserGame, UserList,
};
pub use optimistic::LocalCollectionState;

fn require_user(user_id: &str) -> Result<&str> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(FinderError::InvalidInput("user id is empty".to_string()));
    }
    Ok(user_id)
}

/// Parse an enum stored as text; bad values surface as a store decode error.
fn decode_text<T>(raw: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>()
        .map_err(|err| FinderError::Store(sqlx::Error::Decode(err.into())))
}
