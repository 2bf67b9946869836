// src/engine/cancel.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::{ResflowError, Result};

/// Cooperative cancellation signal shared between the caller and a run.
///
/// Cloning shares the underlying flag. Discovery and apply poll it once per
/// file; once set, the run stops and persists nothing.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ResflowError::Cancelled)
        } else {
            Ok(())
        }
    }
}
