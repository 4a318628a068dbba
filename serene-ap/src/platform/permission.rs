//! Configured capture permission

use crate::recording::RecordPermission;
use futures::future::{self, BoxFuture, FutureExt};

/// Answers every permission request with the configured value
#[derive(Debug, Clone, Copy)]
pub struct FixedPermission(pub bool);

impl RecordPermission for FixedPermission {
    fn request(&self) -> BoxFuture<'static, bool> {
        future::ready(self.0).boxed()
    }
}
