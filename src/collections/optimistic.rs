//! Locally cached collection flags updated optimistically around store writes.
//!
//! A change is applied to the cache first, then written; a failed write restores the
//! previous value and returns the error so the caller can report it.

use std::collections::HashMap;
use std::future::Future;
use tracing::warn;

use super::favorites;
use super::games;
use super::model::{GameStatus, ItemId, ItemRef};
use crate::error::Result;
use crate::util::db::Db;

/// Apply `next` to `slot`, await `attempt`, and put the previous value back on error.
pub async fn apply_optimistic<V, T, F>(slot: &mut V, next: V, attempt: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let previous = std::mem::replace(slot, next);
    match attempt.await {
        Ok(value) => Ok(value),
        Err(err) => {
            *slot = previous;
            Err(err)
        }
    }
}

/// One user's favorite and status flags as last seen by the UI layer.
#[derive(Debug, Clone, Default)]
pub struct LocalCollectionState {
    user_id: String,
    favorites: HashMap<ItemId, bool>,
    statuses: HashMap<i64, GameStatus>,
}

impl LocalCollectionState {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Cached favorite flag; unknown items read as not favorite.
    pub fn is_favorite(&self, item: ItemId) -> bool {
        self.favorites.get(&item).copied().unwrap_or(false)
    }

    pub fn status(&self, game_id: i64) -> GameStatus {
        self.statuses.get(&game_id).copied().unwrap_or_default()
    }

    /// Fill the cache from the store for `items`.
    pub async fn load_favorites(&mut self, db: &Db, items: &[ItemId]) -> Result<()> {
        let statuses = favorites::favorite_statuses(db, &self.user_id, items).await?;
        for item in items {
            if let Some(flag) = statuses.get(&item.key()) {
                self.favorites.insert(*item, *flag);
            }
        }
        Ok(())
    }

    pub async fn load_status(&mut self, db: &Db, game_id: i64) -> Result<GameStatus> {
        let status = games::game_status(db, &self.user_id, game_id).await?;
        self.statuses.insert(game_id, status);
        Ok(status)
    }

    /// Flip the cached flag, then toggle in the store. The store's answer wins on success.
    pub async fn toggle_favorite(&mut self, db: &Db, item: &ItemRef) -> Result<bool> {
        let id = item.item_id();
        let slot = self.favorites.entry(id).or_insert(false);
        let next = !*slot;
        let result =
            apply_optimistic(slot, next, favorites::toggle_favorite(db, &self.user_id, item)).await;
        match result {
            Ok(stored) => {
                self.favorites.insert(id, stored);
                Ok(stored)
            }
            Err(err) => {
                warn!(target: "collections", user_id = %self.user_id, item = %id, error = %err, "favorite toggle rolled back");
                Err(err)
            }
        }
    }

    pub async fn set_status(
        &mut self,
        db: &Db,
        game_id: i64,
        status: GameStatus,
        game_name: &str,
    ) -> Result<()> {
        let slot = self.statuses.entry(game_id).or_default();
        let write = games::set_game_status(db, &self.user_id, game_id, status, game_name);
        apply_optimistic(slot, status, write).await.inspect_err(|err| {
            warn!(target: "collections", user_id = %self.user_id, game_id, error = %err, "status update rolled back");
        })
    }
}
