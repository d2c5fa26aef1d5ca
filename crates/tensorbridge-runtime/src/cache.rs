//! Lazy, failure-sticky memoization of one inference result per epoch.
//!
//! An epoch runs from one [`RenderCache::invalidate`] to the next. The first
//! lookup of an epoch computes under the cache lock; every other lookup,
//! concurrent or later, observes the outcome of that single attempt.

use std::sync::{Arc, Mutex, MutexGuard};

use tensorbridge_core::Result;
use tracing::debug;

use crate::{ErrorReporter, InferenceResult};

#[derive(Clone, Debug, Default)]
enum CacheState {
    #[default]
    Empty,
    Computing,
    Fresh(Arc<InferenceResult>),
    Failed,
}

/// Observable phase of the cache state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CachePhase {
    Empty,
    Computing,
    Fresh,
    Failed,
}

/// What a row request should render from.
#[derive(Clone, Debug)]
pub enum CacheLookup {
    Fresh(Arc<InferenceResult>),
    /// This epoch's attempt failed; serve source data unchanged.
    PassThrough,
}

#[derive(Debug, Default)]
pub struct RenderCache {
    state: Mutex<CacheState>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the epoch's result, running `compute` if this is the epoch's
    /// first request. A failure is reported once through `reporter` and
    /// turns every later lookup of the epoch into [`CacheLookup::PassThrough`].
    pub fn get_or_compute<F>(&self, reporter: &dyn ErrorReporter, compute: F) -> CacheLookup
    where
        F: FnOnce() -> Result<InferenceResult>,
    {
        let mut state = self.lock();
        if let Some(lookup) = lookup_of(&state) {
            return lookup;
        }

        *state = CacheState::Computing;
        debug!("render cache miss, running inference");
        *state = match compute() {
            Ok(result) => CacheState::Fresh(Arc::new(result)),
            Err(err) => {
                reporter.error(&format!("Processing failed: {err}"));
                CacheState::Failed
            }
        };

        lookup_of(&state).unwrap_or(CacheLookup::PassThrough)
    }

    /// Starts a new epoch.
    pub fn invalidate(&self) {
        *self.lock() = CacheState::Empty;
    }

    /// Current phase. Blocks while a computation holds the cache.
    pub fn phase(&self) -> CachePhase {
        match *self.lock() {
            CacheState::Empty => CachePhase::Empty,
            CacheState::Computing => CachePhase::Computing,
            CacheState::Fresh(_) => CachePhase::Fresh,
            CacheState::Failed => CachePhase::Failed,
        }
    }

    /// The stored result of a successful epoch, without triggering a compute.
    pub fn peek(&self) -> Option<Arc<InferenceResult>> {
        match &*self.lock() {
            CacheState::Fresh(result) => Some(Arc::clone(result)),
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // The state is only ever replaced whole, so a poisoned guard is intact.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn lookup_of(state: &CacheState) -> Option<CacheLookup> {
    match state {
        CacheState::Fresh(result) => Some(CacheLookup::Fresh(Arc::clone(result))),
        CacheState::Failed => Some(CacheLookup::PassThrough),
        // Computing is only left behind by a panicking compute; retry it.
        CacheState::Empty | CacheState::Computing => None,
    }
}
