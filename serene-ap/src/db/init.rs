//! Database initialization
//!
//! Opens (creating when missing) the settings database and seeds defaults.

use crate::error::Result;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;
use tracing::info;

/// Open the database at `db_path` and make sure the schema exists
pub async fn init_database(db_path: &Path) -> Result<Pool<Sqlite>> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_settings_table(&pool).await?;
    init_settings_defaults(&pool).await?;

    Ok(pool)
}

pub async fn create_settings_table(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert defaults for settings that are missing. Existing values are kept.
pub async fn init_settings_defaults(pool: &Pool<Sqlite>) -> Result<()> {
    let defaults = [
        (super::settings::KEY_PLAYBACK_RATE, "1.0"),
        (super::settings::KEY_SELECTED_VOICE, super::settings::DEFAULT_VOICE),
    ];

    for (key, default_value) in defaults {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
            .bind(key)
            .fetch_one(pool)
            .await?;

        if !exists {
            sqlx::query("INSERT INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;

            info!("Initialized setting '{}' with default value: {}", key, default_value);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn memory_pool() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_settings_table(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_init_settings_defaults() {
        let pool = memory_pool().await;
        init_settings_defaults(&pool).await.unwrap();

        let voice: String = sqlx::query_scalar("SELECT value FROM settings WHERE key = 'selected_voice'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(voice, "Elias");
    }

    #[tokio::test]
    async fn test_init_settings_idempotent() {
        let pool = memory_pool().await;
        sqlx::query("INSERT INTO settings (key, value) VALUES ('playback_rate', '1.75')")
            .execute(&pool)
            .await
            .unwrap();

        init_settings_defaults(&pool).await.unwrap();
        init_settings_defaults(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE key = 'playback_rate'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let rate: String = sqlx::query_scalar("SELECT value FROM settings WHERE key = 'playback_rate'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rate, "1.75");
    }

    #[tokio::test]
    async fn test_init_database_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("serene.db");

        let pool = init_database(&path).await.unwrap();
        assert!(path.exists());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}
