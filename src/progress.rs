// isocdmak/src/progress.rs
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{BuildError, Result};

/// One progress report from a running build.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub current_entry: usize,
    pub total_entries: usize,
    /// Whole percent, rounded down.
    pub percent: u8,
    pub status_message: Option<String>,
}

impl Progress {
    pub fn entry(current_entry: usize, total_entries: usize) -> Self {
        let percent = if total_entries == 0 {
            0
        } else {
            (current_entry.min(total_entries) * 100 / total_entries) as u8
        };
        Self {
            current_entry,
            total_entries,
            percent,
            status_message: None,
        }
    }

    pub fn status(message: impl Into<String>) -> Self {
        Self {
            status_message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Receives progress reports synchronously from the builder.
pub trait ProgressSink {
    fn report(&mut self, progress: Progress);
}

impl<F: FnMut(Progress)> ProgressSink for F {
    fn report(&mut self, progress: Progress) {
        self(progress)
    }
}

/// Cooperative cancellation flag shared between a build and its owner.
#[derive(Clone, Debug, Default)]
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

    /// Returns `Err(BuildError::Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(BuildError::Cancelled);
        }
        Ok(())
    }
}
