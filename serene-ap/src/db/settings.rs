//! Settings database access
//!
//! Runtime preferences in the `settings` key-value table: last playback rate,
//! selected narration voice and the floating control's screen position.
//! Loaded at startup and written on change.

use crate::error::{Error, Result};
use crate::playback::is_valid_rate;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::warn;

pub const KEY_PLAYBACK_RATE: &str = "playback_rate";
pub const KEY_SELECTED_VOICE: &str = "selected_voice";
pub const KEY_FLOATING_X: &str = "floating_control_x";
pub const KEY_FLOATING_Y: &str = "floating_control_y";

/// Narration voice used until the user picks another
pub const DEFAULT_VOICE: &str = "Elias";

/// Screen coordinate of the floating mini-player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatingControlPosition {
    pub x: f64,
    pub y: f64,
}

/// Everything persisted, as loaded at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub playback_rate: f32,
    pub selected_voice: String,
    pub floating_control: Option<FloatingControlPosition>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            playback_rate: 1.0,
            selected_voice: DEFAULT_VOICE.to_string(),
            floating_control: None,
        }
    }
}

/// Last playback rate. Unusable stored values fall back to 1.0.
pub async fn get_playback_rate(db: &Pool<Sqlite>) -> Result<f32> {
    match get_setting::<f32>(db, KEY_PLAYBACK_RATE).await {
        Ok(Some(rate)) if is_valid_rate(rate) => Ok(rate),
        Ok(Some(rate)) => {
            warn!("Ignoring stored playback rate {}", rate);
            Ok(1.0)
        }
        Ok(None) => Ok(1.0),
        Err(Error::Config(msg)) => {
            warn!("{}", msg);
            Ok(1.0)
        }
        Err(e) => Err(e),
    }
}

/// Rates outside `[MIN_RATE, MAX_RATE]` are rejected and never stored
pub async fn set_playback_rate(db: &Pool<Sqlite>, rate: f32) -> Result<()> {
    if !is_valid_rate(rate) {
        return Err(Error::InvalidRate(rate));
    }
    set_setting(db, KEY_PLAYBACK_RATE, rate).await
}

pub async fn get_selected_voice(db: &Pool<Sqlite>) -> Result<String> {
    Ok(get_setting::<String>(db, KEY_SELECTED_VOICE)
        .await?
        .filter(|voice| !voice.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_VOICE.to_string()))
}

pub async fn set_selected_voice(db: &Pool<Sqlite>, voice: &str) -> Result<()> {
    let voice = voice.trim();
    if voice.is_empty() {
        return Err(Error::Config("voice name must not be empty".to_string()));
    }
    set_setting(db, KEY_SELECTED_VOICE, voice).await
}

/// Floating control position; None until both coordinates were saved
pub async fn get_floating_control(db: &Pool<Sqlite>) -> Result<Option<FloatingControlPosition>> {
    let x = get_setting::<f64>(db, KEY_FLOATING_X).await?;
    let y = get_setting::<f64>(db, KEY_FLOATING_Y).await?;
    Ok(match (x, y) {
        (Some(x), Some(y)) => Some(FloatingControlPosition { x, y }),
        _ => None,
    })
}

pub async fn set_floating_control(db: &Pool<Sqlite>, position: FloatingControlPosition) -> Result<()> {
    if !position.x.is_finite() || !position.y.is_finite() {
        return Err(Error::Config("floating control position must be finite".to_string()));
    }
    set_setting(db, KEY_FLOATING_X, position.x).await?;
    set_setting(db, KEY_FLOATING_Y, position.y).await
}

pub async fn load_app_settings(db: &Pool<Sqlite>) -> Result<AppSettings> {
    Ok(AppSettings {
        playback_rate: get_playback_rate(db).await?,
        selected_voice: get_selected_voice(db).await?,
        floating_control: get_floating_control(db).await?,
    })
}

/// Generic setting getter
///
/// Returns None if key doesn't exist in database.
/// Parses value from string using FromStr trait.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter
///
/// Inserts or updates setting in database.
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    let value_str = value.to_string();

    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value_str)
    .execute(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_settings_table;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_settings_table(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_playback_rate_get_set() {
        let db = setup_test_db().await;
        assert_eq!(get_playback_rate(&db).await.unwrap(), 1.0);

        set_playback_rate(&db, 1.25).await.unwrap();
        assert_eq!(get_playback_rate(&db).await.unwrap(), 1.25);

        assert!(matches!(
            set_playback_rate(&db, 0.0).await,
            Err(Error::InvalidRate(_))
        ));
        assert_eq!(get_playback_rate(&db).await.unwrap(), 1.25);
    }

    #[tokio::test]
    async fn test_corrupt_rate_falls_back_to_default() {
        let db = setup_test_db().await;
        set_setting(&db, KEY_PLAYBACK_RATE, "fast").await.unwrap();
        assert_eq!(get_playback_rate(&db).await.unwrap(), 1.0);

        set_setting(&db, KEY_PLAYBACK_RATE, -2.0).await.unwrap();
        assert_eq!(get_playback_rate(&db).await.unwrap(), 1.0);

        // Stored by an older build without range checks
        set_setting(&db, KEY_PLAYBACK_RATE, 1e-30_f32).await.unwrap();
        assert_eq!(get_playback_rate(&db).await.unwrap(), 1.0);
        set_setting(&db, KEY_PLAYBACK_RATE, 3e38_f32).await.unwrap();
        assert_eq!(get_playback_rate(&db).await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_out_of_range_rate_not_stored() {
        let db = setup_test_db().await;
        for rate in [1e-30, 0.25, 4.0, 3e38] {
            assert!(matches!(
                set_playback_rate(&db, rate).await,
                Err(Error::InvalidRate(_))
            ));
        }
        assert_eq!(get_setting::<f32>(&db, KEY_PLAYBACK_RATE).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_selected_voice_defaults_to_elias() {
        let db = setup_test_db().await;
        assert_eq!(get_selected_voice(&db).await.unwrap(), "Elias");

        set_selected_voice(&db, "Maya").await.unwrap();
        assert_eq!(get_selected_voice(&db).await.unwrap(), "Maya");

        assert!(set_selected_voice(&db, "  ").await.is_err());
    }

    #[tokio::test]
    async fn test_floating_control_roundtrip() {
        let db = setup_test_db().await;
        assert_eq!(get_floating_control(&db).await.unwrap(), None);

        let position = FloatingControlPosition { x: 24.0, y: 612.5 };
        set_floating_control(&db, position).await.unwrap();
        assert_eq!(get_floating_control(&db).await.unwrap(), Some(position));
    }

    #[tokio::test]
    async fn test_setting_update_uses_upsert() {
        let db = setup_test_db().await;
        set_setting(&db, "test_key", "value1").await.unwrap();
        set_setting(&db, "test_key", "value2").await.unwrap();

        let value: Option<String> = get_setting(&db, "test_key").await.unwrap();
        assert_eq!(value, Some("value2".to_string()));

        let missing: Option<String> = get_setting(&db, "nonexistent").await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_load_app_settings() {
        let db = setup_test_db().await;
        set_playback_rate(&db, 0.75).await.unwrap();

        let settings = load_app_settings(&db).await.unwrap();
        assert_eq!(
            settings,
            AppSettings {
                playback_rate: 0.75,
                ..AppSettings::default()
            }
        );
    }
}
