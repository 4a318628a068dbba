//! Host adapters
//!
//! Stand-ins for the platform media stack used when the core runs as a
//! standalone service. Real OS glue implements the same traits.

mod capture;
mod permission;
mod player;

pub use capture::FileCaptureBackend;
pub use permission::FixedPermission;
pub use player::SimulatedPlayer;
