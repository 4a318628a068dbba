//! Audio controller
//!
//! The single serialized context that owns the session arbiter, the playlist
//! engine and the recorder. Everything else talks to it through an
//! [`AudioHandle`].

mod actor;
mod command;
mod handle;

pub use actor::{AudioController, AudioSnapshot, ControllerParts, ControllerTimings, SessionSnapshot};
pub use handle::{AudioHandle, Mailbox};
