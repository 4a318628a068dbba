//! Configuration management for serene-ap
//!
//! Two tiers:
//! 1. **TOML bootstrap**: database path, port, logging, recorder limits and
//!    controller timer periods. Read once at startup.
//! 2. **Database runtime**: user preferences in the `settings` table
//!    (see [`crate::db::settings`]).
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--port, --config, --root-folder)
//! 2. Environment variables (SERENE_CONFIG, SERENE_ROOT_FOLDER)
//! 3. TOML configuration file
//! 4. Built-in defaults
//!
//! A missing config file is not an error; every field has a default.

use crate::controller::ControllerTimings;
use crate::error::{Error, Result};
use crate::recording::RecordingLimits;
use serde::Deserialize;
use serene_common::config::{load_toml, locate_config_file, resolve_root_folder};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// SQLite database file; defaults to `<root_folder>/serene.db`
    pub database_path: Option<PathBuf>,

    /// HTTP server port
    pub port: u16,

    /// Data root folder
    pub root_folder: Option<PathBuf>,

    /// Capture file directory; defaults to `<root_folder>/recordings`
    pub recordings_dir: Option<PathBuf>,

    pub logging: LoggingConfig,
    pub recording: RecordingConfig,
    pub playback: PlaybackConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            port: default_port(),
            root_folder: None,
            recordings_dir: None,
            logging: LoggingConfig::default(),
            recording: RecordingConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive used when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecordingConfig {
    /// Takes shorter than this are discarded
    pub min_duration_ms: u64,

    /// Watchdog stops takes at this length
    pub max_duration_ms: u64,

    /// Answer given by the simulated permission prompt
    pub permission_granted: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: 1_000,
            max_duration_ms: 60_000,
            permission_granted: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Remote skip-forward/backward step
    pub skip_interval_secs: u64,

    pub position_sample_ms: u64,
    pub sleep_tick_ms: u64,
    pub watchdog_tick_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            skip_interval_secs: 15,
            position_sample_ms: 500,
            sleep_tick_ms: 1_000,
            watchdog_tick_ms: 100,
        }
    }
}

fn default_port() -> u16 {
    5740
}

fn default_log_level() -> String {
    "serene_ap=info,serene_common=info,tower_http=info".to_string()
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub port: Option<u16>,
    pub root_folder: Option<PathBuf>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub recordings_dir: PathBuf,
    pub port: u16,
    pub toml: TomlConfig,
}

impl Config {
    /// Resolve configuration from overrides, the TOML file and defaults
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        let toml = match locate_config_file(overrides.config_file.as_deref()) {
            Some(path) => {
                let toml: TomlConfig = load_toml(&path)?;
                info!("Loaded TOML configuration from {}", path.display());
                toml
            }
            None => {
                info!("No configuration file found, using built-in defaults");
                TomlConfig::default()
            }
        };

        Self::resolve(toml, overrides)
    }

    /// Apply overrides and derive paths from an already parsed TOML config
    pub fn resolve(toml: TomlConfig, overrides: ConfigOverrides) -> Result<Self> {
        toml.validate()?;

        let root_folder =
            resolve_root_folder(overrides.root_folder.as_deref(), toml.root_folder.as_deref());
        let database_path = under_root(&root_folder, toml.database_path.as_deref(), "serene.db");
        let recordings_dir =
            under_root(&root_folder, toml.recordings_dir.as_deref(), "recordings");
        let port = overrides.port.unwrap_or(toml.port);

        Ok(Self {
            root_folder,
            database_path,
            recordings_dir,
            port,
            toml,
        })
    }

    pub fn recording_limits(&self) -> RecordingLimits {
        RecordingLimits {
            min_duration: Duration::from_millis(self.toml.recording.min_duration_ms),
            max_duration: Duration::from_millis(self.toml.recording.max_duration_ms),
        }
    }

    pub fn timings(&self) -> ControllerTimings {
        let playback = &self.toml.playback;
        ControllerTimings {
            position_sample: Duration::from_millis(playback.position_sample_ms),
            sleep_tick: Duration::from_millis(playback.sleep_tick_ms),
            watchdog_tick: Duration::from_millis(playback.watchdog_tick_ms),
            skip_interval: Duration::from_secs(playback.skip_interval_secs),
        }
    }
}

impl TomlConfig {
    fn validate(&self) -> Result<()> {
        let recording = &self.recording;
        if recording.max_duration_ms == 0 || recording.min_duration_ms > recording.max_duration_ms {
            return Err(Error::Config(format!(
                "recording limits out of order: min {}ms, max {}ms",
                recording.min_duration_ms, recording.max_duration_ms
            )));
        }

        let playback = &self.playback;
        for (name, value) in [
            ("position_sample_ms", playback.position_sample_ms),
            ("sleep_tick_ms", playback.sleep_tick_ms),
            ("watchdog_tick_ms", playback.watchdog_tick_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("playback.{} must be positive", name)));
            }
        }
        Ok(())
    }
}

/// Relative paths are taken relative to the root folder
fn under_root(root: &Path, configured: Option<&Path>, default_name: &str) -> PathBuf {
    match configured {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => root.join(path),
        None => root.join(default_name),
    }
}
