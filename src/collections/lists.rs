use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::model::{ItemId, ItemRef, ListDetails, ListItem, ListMembership, UserList};
use super::{decode_text, require_user};
use crate::catalog::model::PLACEHOLDER_IMAGE;
use crate::error::{FinderError, Result};
use crate::util::db::Db;

const LIST_SUMMARY_SELECT: &str = "SELECT l.id, l.name, l.created_at, l.cover_url,
        (SELECT COUNT(*) FROM list_items i WHERE i.list_id = l.id) AS item_count,
        (SELECT i.cover_url FROM list_items i WHERE i.list_id = l.id
            ORDER BY i.added_at DESC, i.name ASC LIMIT 1) AS newest_cover
     FROM lists l";

/// New empty list; returns its id.
#[instrument(skip(db))]
pub async fn create_list(db: &Db, user_id: &str, name: &str) -> Result<String> {
    let user_id = require_user(user_id)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(FinderError::InvalidInput("list name is empty".to_string()));
    }
    let id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO lists (id, user_id, name, cover_url, created_at) VALUES (?, ?, ?, NULL, ?)")
        .bind(&id)
        .bind(user_id)
        .bind(name)
        .bind(Utc::now())
        .execute(&db.pool)
        .await?;
    info!(target: "collections", user_id, list_id = %id, "list created");
    Ok(id)
}

/// The user's lists, newest first, with derived item count and cover.
pub async fn user_lists(db: &Db, user_id: &str) -> Result<Vec<UserList>> {
    let user_id = require_user(user_id)?;
    let rows = sqlx::query(&format!(
        "{LIST_SUMMARY_SELECT} WHERE l.user_id = ? ORDER BY l.created_at DESC, l.rowid DESC"
    ))
    .bind(user_id)
    .fetch_all(&db.pool)
    .await?;
    rows.iter().map(list_from_row).collect()
}

/// A list with its items (newest first); `None` when the list does not exist for this user.
pub async fn list_details(db: &Db, user_id: &str, list_id: &str) -> Result<Option<ListDetails>> {
    let user_id = require_user(user_id)?;
    let Some(row) = sqlx::query(&format!(
        "{LIST_SUMMARY_SELECT} WHERE l.user_id = ? AND l.id = ?"
    ))
    .bind(user_id)
    .bind(list_id)
    .fetch_optional(&db.pool)
    .await?
    else {
        return Ok(None);
    };
    let list = list_from_row(&row)?;

    let rows = sqlx::query(
        "SELECT item_key, item_id, item_type, name, cover_url, added_at
         FROM list_items
         WHERE list_id = ?
         ORDER BY added_at DESC, name ASC",
    )
    .bind(list_id)
    .fetch_all(&db.pool)
    .await?;
    let items = rows
        .iter()
        .map(|row| -> Result<ListItem> {
            Ok(ListItem {
                id: row.try_get("item_key")?,
                item_id: row.try_get("item_id")?,
                item_type: decode_text(&row.try_get::<String, _>("item_type")?)?,
                name: row.try_get("name")?,
                cover_url: row.try_get("cover_url")?,
                added_at: row.try_get("added_at")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(ListDetails { list, items }))
}

/// Delete a list and its items. Returns whether the list existed.
#[instrument(skip(db))]
pub async fn delete_list(db: &Db, user_id: &str, list_id: &str) -> Result<bool> {
    let user_id = require_user(user_id)?;
    let mut tx = db.pool.begin().await?;
    let removed = sqlx::query("DELETE FROM lists WHERE id = ? AND user_id = ?")
        .bind(list_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if removed > 0 {
        sqlx::query("DELETE FROM list_items WHERE list_id = ?")
            .bind(list_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    info!(target: "collections", user_id, list_id, deleted = removed > 0, "list delete");
    Ok(removed > 0)
}

/// Put `item` into every list of `list_ids` in one transaction. An unknown list id
/// aborts the whole write. Re-adding an item refreshes its snapshot and `added_at`.
#[instrument(skip(db, item), fields(item = %item.item_id(), lists = list_ids.len()))]
pub async fn add_item_to_lists(
    db: &Db,
    user_id: &str,
    list_ids: &[String],
    item: &ItemRef,
) -> Result<()> {
    let user_id = require_user(user_id)?;
    let key = item.item_id().key();
    let added_at = Utc::now();
    let mut tx = db.pool.begin().await?;
    for list_id in list_ids {
        let owned: Option<i64> = sqlx::query_scalar("SELECT 1 FROM lists WHERE id = ? AND user_id = ?")
            .bind(list_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if owned.is_none() {
            warn!(target: "collections", user_id, list_id = %list_id, "add to unknown list; aborting batch");
            return Err(FinderError::NotFound(format!("list {list_id}")));
        }
        sqlx::query(
            "INSERT INTO list_items (list_id, item_key, item_id, item_type, name, cover_url, added_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (list_id, item_key) DO UPDATE SET
                name = excluded.name,
                cover_url = excluded.cover_url,
                added_at = excluded.added_at",
        )
        .bind(list_id)
        .bind(&key)
        .bind(item.id)
        .bind(item.item_type.as_str())
        .bind(&item.name)
        .bind(&item.cover_url)
        .bind(added_at)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    info!(target: "collections", user_id, "item added to lists");
    Ok(())
}

/// Every list of the user with a flag telling whether `item` is in it.
pub async fn item_list_statuses(db: &Db, user_id: &str, item: ItemId) -> Result<Vec<ListMembership>> {
    let user_id = require_user(user_id)?;
    let rows = sqlx::query(
        "SELECT l.id, l.name,
            EXISTS (SELECT 1 FROM list_items i WHERE i.list_id = l.id AND i.item_key = ?) AS in_list
         FROM lists l
         WHERE l.user_id = ?
         ORDER BY l.created_at DESC, l.rowid DESC",
    )
    .bind(item.key())
    .bind(user_id)
    .fetch_all(&db.pool)
    .await?;
    rows.iter()
        .map(|row| -> Result<ListMembership> {
            Ok(ListMembership {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                in_list: row.try_get::<i64, _>("in_list")? != 0,
            })
        })
        .collect()
}

/// Remove one item, by key, from one of the user's lists. Removing an absent item is a no-op.
#[instrument(skip(db))]
pub async fn remove_item_from_list(db: &Db, user_id: &str, list_id: &str, item_key: &str) -> Result<()> {
    let user_id = require_user(user_id)?;
    let removed = sqlx::query(
        "DELETE FROM list_items
         WHERE list_id = ? AND item_key = ?
           AND list_id IN (SELECT id FROM lists WHERE user_id = ?)",
    )
    .bind(list_id)
    .bind(item_key)
    .bind(user_id)
    .execute(&db.pool)
    .await?
    .rows_affected();
    info!(target: "collections", user_id, list_id, item_key, removed, "list item removed");
    Ok(())
}

fn list_from_row(row: &SqliteRow) -> Result<UserList> {
    let item_count: i64 = row.try_get("item_count")?;
    let own_cover: Option<String> = row.try_get("cover_url")?;
    let newest_cover: Option<String> = row.try_get("newest_cover")?;
    let cover_url = [own_cover, newest_cover]
        .into_iter()
        .flatten()
        .find(|url| !url.is_empty())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());
    Ok(UserList {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        item_count: u32::try_from(item_count).unwrap_or(u32::MAX),
        cover_url,
    })
}
