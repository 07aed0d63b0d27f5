// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cooperative cancellation between top-level steps.

use crate::error::{Result, TransferError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag a caller sets to stop a running export or import.
///
/// Checked between roots during capture and between nodes during creation.
/// Work already applied to the scene stays applied.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Return [`TransferError::Cancelled`] if cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            tracing::info!("Operation cancelled");
            return Err(TransferError::Cancelled);
        }
        Ok(())
    }
}
