//! # Serene Common Library
//!
//! Shared code for the Serene audio core including:
//! - Event types (AudioEvent enum) and the EventBus
//! - Session consumer, interruption and transport types
//! - Configuration file and root folder resolution
//! - Millisecond duration helpers

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
pub use events::{AudioEvent, Consumer, EventBus};
