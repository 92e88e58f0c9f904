//! Cooperative cancellation for long-running analysis loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{AnalysisError, Result};

/// Shared flag checked by the clustering loop and the pairwise gap scan.
///
/// Clones share the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    inner: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// Create a flag that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    /// Clear a previous cancellation request.
    pub fn reset(&self) {
        self.inner.store(false, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }

    /// Return `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AnalysisError::Cancelled.into())
        } else {
            Ok(())
        }
    }
}
