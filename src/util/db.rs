use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

use crate::util::env::env_flag;

/// Schema steps, applied in order and tracked in `_migrations`.
const MIGRATIONS: &[(i64, &str, &str)] = &[
    (
        1,
        "user_games",
        "CREATE TABLE IF NOT EXISTS user_games (
            user_id    TEXT NOT NULL,
            game_id    INTEGER NOT NULL,
            status     TEXT NOT NULL,
            game_name  TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, game_id)
        );
        CREATE INDEX IF NOT EXISTS user_games_updated_idx ON user_games (user_id, updated_at);",
    ),
    (
        2,
        "favorites",
        "CREATE TABLE IF NOT EXISTS favorites (
            user_id    TEXT NOT NULL,
            item_key   TEXT NOT NULL,
            item_id    INTEGER NOT NULL,
            item_type  TEXT NOT NULL,
            name       TEXT NOT NULL,
            cover_url  TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (user_id, item_key)
        );",
    ),
    (
        3,
        "lists",
        "CREATE TABLE IF NOT EXISTS lists (
            id         TEXT PRIMARY KEY,
            user_id    TEXT NOT NULL,
            name       TEXT NOT NULL,
            cover_url  TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS lists_user_idx ON lists (user_id, created_at);
        CREATE TABLE IF NOT EXISTS list_items (
            list_id   TEXT NOT NULL,
            item_key  TEXT NOT NULL,
            item_id   INTEGER NOT NULL,
            item_type TEXT NOT NULL,
            name      TEXT NOT NULL,
            cover_url TEXT NOT NULL,
            added_at  TEXT NOT NULL,
            PRIMARY KEY (list_id, item_key)
        );",
    ),
];

#[derive(Clone)]
pub struct Db {
    pub pool: SqlitePool,
}

impl Db {
    // SECURITY: never include raw DSNs in tracing spans.
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(10));
        // Each in-memory connection is its own database; keep exactly one alive forever.
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options
                .max_connections(max_connections.max(1))
                .idle_timeout(Duration::from_secs(600))
        };
        let pool = pool_options.connect_with(connect_options).await?;
        info!(in_memory, "connected to collection store");

        let db = Self { pool };
        if in_memory || env_flag("AUTO_MIGRATE", true) {
            db.run_migrations().await?;
        } else {
            info!("AUTO_MIGRATE disabled; skipping migrations");
        }
        Ok(db)
    }

    /// Fresh, migrated in-memory store.
    pub async fn memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version      INTEGER PRIMARY KEY,
                description  TEXT NOT NULL,
                installed_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
             )",
        )
        .execute(&self.pool)
        .await?;

        let applied: HashSet<i64> = sqlx::query("SELECT version FROM _migrations")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|r| r.try_get::<i64, _>(0))
            .collect::<Result<_, _>>()?;

        for (version, description, sql) in MIGRATIONS {
            if applied.contains(version) {
                continue;
            }
            let mut tx = self.pool.begin().await?;
            sqlx::raw_sql(sql).execute(&mut *tx).await?;
            sqlx::query("INSERT INTO _migrations (version, description) VALUES (?, ?)")
                .bind(*version)
                .bind(*description)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            info!(version, description, "applied migration");
        }
        Ok(())
    }
}
