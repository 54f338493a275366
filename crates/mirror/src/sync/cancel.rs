//! User-triggered cancellation

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

use crate::error::MirrorError;

/// Shared flag checked before every remote round trip
///
/// Clones share the same flag. The binary registers [`flag`](Self::flag)
/// with the signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// The underlying flag, for signal handler registration
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }

    /// Fail with `MirrorError::Cancelled` once cancellation was requested
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(MirrorError::Cancelled.into());
        }
        Ok(())
    }
}
