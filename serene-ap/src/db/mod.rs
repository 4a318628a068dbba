//! Database access layer
//!
//! SQLite key-value settings that survive restarts.

pub mod init;
pub mod settings;

pub use init::{init_database, init_settings_defaults};
pub use settings::{AppSettings, FloatingControlPosition};
