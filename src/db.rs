// src/db.rs
use crate::models::chat::ChatTurn;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;

    // Run migrations on startup
    run_migrations(&pool).await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Append-only log of chat turns backed by the `chats` table.
#[derive(Clone)]
pub struct ChatLog {
    pool: SqlitePool,
}

impl ChatLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Empty the log and restart ids at 1.
    pub async fn reset(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM chats").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'chats'")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::warn!("🧹 Chat log cleared");
        Ok(())
    }

    pub async fn append_turn(&self, user_message: &str, bot_reply: &str, timestamp: &str) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO chats (user_message, bot_reply, timestamp) VALUES (?, ?, ?)")
            .bind(user_message)
            .bind(bot_reply)
            .bind(timestamp)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// All turns in insertion order.
    pub async fn list_all_turns(&self) -> Result<Vec<ChatTurn>, sqlx::Error> {
        sqlx::query_as::<_, ChatTurn>("SELECT id, user_message, bot_reply, timestamp FROM chats ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn count_turns(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chats")
            .fetch_one(&self.pool)
            .await
    }
}

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}
