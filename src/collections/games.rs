use chrono::{DateTime, Utc};
use futures::future::join_all;
use sqlx::Row;
use tracing::{info, instrument, warn};

use super::model::{ExperiencedGame, GameStatus, UserGame};
use super::{decode_text, require_user};
use crate::catalog::CatalogClient;
use crate::error::Result;
use crate::util::db::Db;

/// Upsert the user's status for a game; `updated_at` is refreshed on every write.
#[instrument(skip(db, game_name))]
pub async fn set_game_status(
    db: &Db,
    user_id: &str,
    game_id: i64,
    status: GameStatus,
    game_name: &str,
) -> Result<()> {
    let user_id = require_user(user_id)?;
    sqlx::query(
        "INSERT INTO user_games (user_id, game_id, status, game_name, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT (user_id, game_id) DO UPDATE SET
            status = excluded.status,
            game_name = excluded.game_name,
            updated_at = excluded.updated_at",
    )
    .bind(user_id)
    .bind(game_id)
    .bind(status.as_str())
    .bind(game_name)
    .bind(Utc::now())
    .execute(&db.pool)
    .await?;
    info!(target: "collections", user_id, game_id, status = status.as_str(), "game status updated");
    Ok(())
}

/// Stored status, or `Unplayed` when the user never set one.
pub async fn game_status(db: &Db, user_id: &str, game_id: i64) -> Result<GameStatus> {
    let user_id = require_user(user_id)?;
    let raw: Option<String> =
        sqlx::query_scalar("SELECT status FROM user_games WHERE user_id = ? AND game_id = ?")
            .bind(user_id)
            .bind(game_id)
            .fetch_optional(&db.pool)
            .await?;
    match raw {
        Some(raw) => decode_text(&raw),
        None => Ok(GameStatus::Unplayed),
    }
}

/// All status records of the user, most recently updated first.
pub async fn user_games(db: &Db, user_id: &str) -> Result<Vec<UserGame>> {
    let user_id = require_user(user_id)?;
    let rows = sqlx::query(
        "SELECT game_id, status, game_name, updated_at
         FROM user_games
         WHERE user_id = ?
         ORDER BY updated_at DESC, game_id DESC",
    )
    .bind(user_id)
    .fetch_all(&db.pool)
    .await?;
    rows.iter()
        .map(|row| -> Result<UserGame> {
            Ok(UserGame {
                game_id: row.try_get("game_id")?,
                status: decode_text(&row.try_get::<String, _>("status")?)?,
                game_name: row.try_get("game_name")?,
                updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
            })
        })
        .collect()
}

/// Games the user is playing or has played, resolved against the catalog concurrently.
/// Records whose lookup misses or fails are dropped; store order is kept.
#[instrument(skip(db, catalog))]
pub async fn experienced_games(
    db: &Db,
    catalog: &CatalogClient,
    user_id: &str,
) -> Result<Vec<ExperiencedGame>> {
    let records = user_games(db, user_id).await?;
    let lookups = records
        .into_iter()
        .filter(|record| record.status.is_experienced())
        .map(|record| async move {
            match catalog.game_details(record.game_id).await {
                Ok(Some(game)) => Some(ExperiencedGame {
                    game,
                    status: record.status,
                }),
                Ok(None) => {
                    warn!(target: "collections", game_id = record.game_id, "experienced game not in catalog");
                    None
                }
                Err(err) => {
                    warn!(
                        target: "collections",
                        game_id = record.game_id,
                        error = %err,
                        "failed to resolve experienced game"
                    );
                    None
                }
            }
        });
    Ok(join_all(lookups).await.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogConfig;
    use crate::error::FinderError;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn status_defaults_to_unplayed_and_upserts() {
        let db = Db::memory().await.unwrap();
        assert_eq!(game_status(&db, "u1", 1942).await.unwrap(), GameStatus::Unplayed);

        set_game_status(&db, "u1", 1942, GameStatus::Playing, "The Witcher 3").await.unwrap();
        set_game_status(&db, "u1", 1942, GameStatus::Played, "The Witcher 3").await.unwrap();
        assert_eq!(game_status(&db, "u1", 1942).await.unwrap(), GameStatus::Played);
        assert_eq!(game_status(&db, "u2", 1942).await.unwrap(), GameStatus::Unplayed);
        assert_eq!(user_games(&db, "u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn user_games_are_ordered_by_last_update() {
        let db = Db::memory().await.unwrap();
        set_game_status(&db, "u1", 1, GameStatus::Playing, "A").await.unwrap();
        set_game_status(&db, "u1", 2, GameStatus::Playing, "B").await.unwrap();
        set_game_status(&db, "u1", 1, GameStatus::Played, "A").await.unwrap();

        let ids: Vec<i64> = user_games(&db, "u1")
            .await
            .unwrap()
            .iter()
            .map(|g| g.game_id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn blank_user_is_rejected() {
        let db = Db::memory().await.unwrap();
        let err = set_game_status(&db, " ", 1, GameStatus::Played, "A").await.unwrap_err();
        assert!(matches!(err, FinderError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn experiences_skip_unplayed_and_unresolved() {
        let db = Db::memory().await.unwrap();
        set_game_status(&db, "u1", 1942, GameStatus::Played, "The Witcher 3").await.unwrap();
        set_game_status(&db, "u1", 7, GameStatus::Unplayed, "Shelved").await.unwrap();
        set_game_status(&db, "u1", 404, GameStatus::Playing, "Delisted").await.unwrap();

        let mut igdb = Server::new_async().await;
        let witcher = igdb
            .mock("POST", "/games")
            .match_body(Matcher::Regex("where id = 1942;".into()))
            .with_body(r#"[{"id":1942,"name":"The Witcher 3: Wild Hunt"}]"#)
            .expect(1)
            .create_async()
            .await;
        igdb.mock("POST", "/games")
            .match_body(Matcher::Regex("where id = 404;".into()))
            .with_body("[]")
            .create_async()
            .await;
        let catalog = CatalogClient::new(CatalogConfig {
            base_url: igdb.url(),
            client_id: Some("client".into()),
            access_token: Some("token".into()),
            ..CatalogConfig::default()
        })
        .unwrap();

        let games = experienced_games(&db, &catalog, "u1").await.unwrap();
        witcher.assert_async().await;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].game.id, 1942);
        assert_eq!(games[0].status, GameStatus::Played);
    }
}
