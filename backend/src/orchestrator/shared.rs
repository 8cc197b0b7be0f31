//! Shared engine handle for multi-threaded hosts
//!
//! Every operation takes the one lock for its whole duration, so two
//! mutations never interleave.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::orchestrator::engine::{DayResult, GameEngine};

/// Cloneable handle to one engine
#[derive(Debug, Clone)]
pub struct SharedGame {
    inner: Arc<Mutex<GameEngine>>,
}

impl SharedGame {
    pub fn new(engine: GameEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run `f` with exclusive access to the engine
    ///
    /// A poisoned lock is recovered: the engine commits each operation in a
    /// single assignment, so a panic elsewhere cannot leave it half-updated.
    pub fn with<R>(&self, f: impl FnOnce(&mut GameEngine) -> R) -> R {
        let mut guard = self.lock();
        f(&mut *guard)
    }

    pub fn next_day(&self) -> Option<DayResult> {
        self.with(GameEngine::next_day)
    }

    fn lock(&self) -> MutexGuard<'_, GameEngine> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
