use chrono::Utc;
use futures::future::join_all;
use sqlx::Row;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

use super::model::{FavoriteItem, ItemId, ItemRef};
use super::{decode_text, require_user};
use crate::error::Result;
use crate::util::db::Db;

pub async fn is_favorite(db: &Db, user_id: &str, item: ItemId) -> Result<bool> {
    let user_id = require_user(user_id)?;
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM favorites WHERE user_id = ? AND item_key = ?")
            .bind(user_id)
            .bind(item.key())
            .fetch_optional(&db.pool)
            .await?;
    Ok(found.is_some())
}

/// Favorite flags keyed by `"{type}-{id}"`, checked concurrently. Items whose check
/// fails are absent from the map.
#[instrument(skip(db, items), fields(items = items.len()))]
pub async fn favorite_statuses(
    db: &Db,
    user_id: &str,
    items: &[ItemId],
) -> Result<HashMap<String, bool>> {
    require_user(user_id)?;
    let checks = items.iter().map(|item| async move {
        match is_favorite(db, user_id, *item).await {
            Ok(flag) => Some((item.key(), flag)),
            Err(err) => {
                warn!(target: "collections", user_id, item = %item, error = %err, "favorite check failed");
                None
            }
        }
    });
    Ok(join_all(checks).await.into_iter().flatten().collect())
}

/// Remove the favorite if present, otherwise add it. Returns the new state.
#[instrument(skip(db, item), fields(item = %item.item_id()))]
pub async fn toggle_favorite(db: &Db, user_id: &str, item: &ItemRef) -> Result<bool> {
    let user_id = require_user(user_id)?;
    let key = item.item_id().key();
    let mut tx = db.pool.begin().await?;
    let removed = sqlx::query("DELETE FROM favorites WHERE user_id = ? AND item_key = ?")
        .bind(user_id)
        .bind(&key)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if removed == 0 {
        sqlx::query(
            "INSERT INTO favorites (user_id, item_key, item_id, item_type, name, cover_url, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&key)
        .bind(item.id)
        .bind(item.item_type.as_str())
        .bind(&item.name)
        .bind(&item.cover_url)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    let favorite = removed == 0;
    info!(target: "collections", user_id, favorite, "favorite toggled");
    Ok(favorite)
}

/// The user's favorites, newest first.
pub async fn favorites(db: &Db, user_id: &str) -> Result<Vec<FavoriteItem>> {
    let user_id = require_user(user_id)?;
    let rows = sqlx::query(
        "SELECT item_key, item_id, item_type, name, cover_url, created_at
         FROM favorites
         WHERE user_id = ?
         ORDER BY created_at DESC, rowid DESC",
    )
    .bind(user_id)
    .fetch_all(&db.pool)
    .await?;
    rows.iter()
        .map(|row| -> Result<FavoriteItem> {
            Ok(FavoriteItem {
                id: row.try_get("item_key")?,
                item_id: row.try_get("item_id")?,
                item_type: decode_text(&row.try_get::<String, _>("item_type")?)?,
                name: row.try_get("name")?,
                cover_url: row.try_get("cover_url")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::model::ItemType;

    fn item(id: i64, item_type: ItemType, name: &str) -> ItemRef {
        ItemRef {
            id,
            item_type,
            name: name.into(),
            cover_url: format!("https://img/{id}.jpg"),
        }
    }

    #[tokio::test]
    async fn toggle_twice_restores_original_state() {
        let db = Db::memory().await.unwrap();
        let answer = item(42, ItemType::Game, "Deep Thought");

        assert!(toggle_favorite(&db, "u1", &answer).await.unwrap());
        assert!(is_favorite(&db, "u1", answer.item_id()).await.unwrap());

        assert!(!toggle_favorite(&db, "u1", &answer).await.unwrap());
        assert!(!is_favorite(&db, "u1", answer.item_id()).await.unwrap());
        assert!(favorites(&db, "u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn games_and_franchises_with_same_id_are_distinct() {
        let db = Db::memory().await.unwrap();
        toggle_favorite(&db, "u1", &item(7, ItemType::Game, "Seven")).await.unwrap();
        toggle_favorite(&db, "u1", &item(7, ItemType::Franchise, "Seven Saga")).await.unwrap();

        let listed = favorites(&db, "u1").await.unwrap();
        let keys: Vec<&str> = listed.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(keys, vec!["franchise-7", "game-7"]);
        assert_eq!(listed[0].item_type, ItemType::Franchise);
        assert_eq!(listed[1].cover_url, "https://img/7.jpg");
    }

    #[tokio::test]
    async fn batch_statuses_are_keyed() {
        let db = Db::memory().await.unwrap();
        toggle_favorite(&db, "u1", &item(1, ItemType::Game, "One")).await.unwrap();

        let statuses = favorite_statuses(
            &db,
            "u1",
            &[ItemId::new(ItemType::Game, 1), ItemId::new(ItemType::Franchise, 2)],
        )
        .await
        .unwrap();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses["game-1"], true);
        assert_eq!(statuses["franchise-2"], false);
    }

    #[tokio::test]
    async fn favorites_are_per_user() {
        let db = Db::memory().await.unwrap();
        toggle_favorite(&db, "u1", &item(1, ItemType::Game, "One")).await.unwrap();
        assert!(!is_favorite(&db, "u2", ItemId::new(ItemType::Game, 1)).await.unwrap());
    }
}
