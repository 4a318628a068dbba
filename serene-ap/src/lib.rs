//! # Serene audio core (serene-ap)
//!
//! Arbitrates the single hardware audio session between the foreground
//! playlist player, the voice-memo recorder and the ambient noise loop, and
//! runs the playlist state machine behind an HTTP/SSE control surface.
//!
//! **Architecture:** one serialized controller task ([`controller`]) owns the
//! [`session::SessionArbiter`], the [`playback::PlaylistEngine`] and the
//! [`recording::RecorderController`]. Decoding and capture are delegated to
//! platform adapters behind traits.

pub mod api;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod platform;
pub mod playback;
pub mod recording;
pub mod remote;
pub mod session;

pub use controller::{AudioController, AudioHandle};
pub use error::{Error, Result};
