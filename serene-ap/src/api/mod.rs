//! HTTP surface
//!
//! REST endpoints for the app shell and OS glue plus an SSE stream of
//! [`AudioEvent`](serene_common::events::AudioEvent)s.

pub mod handlers;
pub mod playback;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};
