//! Test helper modules for serene-ap integration tests
//!
//! - harness: controller wired to simulated adapters in a temp directory
//! - test_server: HTTP router over that controller

#![allow(dead_code)]

pub mod harness;
pub mod test_server;

pub use harness::{drain, item, settle, test_db, SessionLog, TestAudio, TestAudioBuilder};
pub use test_server::{make_request, TestServer};
