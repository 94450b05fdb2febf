//! Cooperative cancellation by edit generation.
//!
//! Every edit bumps a shared generation counter. A layout job remembers the
//! generation it was started for and stops at the next page boundary once
//! the counter has moved on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared edit generation counter
#[derive(Debug, Clone, Default)]
pub struct Generation {
    current: Arc<AtomicU64>,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Advance the generation, cancelling every outstanding token.
    pub fn bump(&self) -> u64 {
        self.current.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Token valid until the next bump
    pub fn token(&self) -> CancelToken {
        CancelToken {
            counter: Some(self.current.clone()),
            generation: self.current(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    counter: Option<Arc<AtomicU64>>,
    generation: u64,
}

impl CancelToken {
    /// A token that is never cancelled
    pub fn never() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.counter
            .as_ref()
            .map(|counter| counter.load(Ordering::Acquire) != self.generation)
            .unwrap_or(false)
    }
}
