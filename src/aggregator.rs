// aggregator.rs - Shared result collection
// Purpose: Workers append finished verdicts under one mutex; the caller drains
//          the collection once every worker has joined

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::result::ProbeResult;

#[derive(Clone, Debug, Default)]
pub struct ResultAggregator {
    results: Arc<Mutex<Vec<ProbeResult>>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ProbeResult>> {
        // Poisoning is ignored: push and take never leave the Vec half-updated
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, result: ProbeResult) {
        self.lock().push(result);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take everything collected so far, in arrival order
    pub fn drain(&self) -> Vec<ProbeResult> {
        std::mem::take(&mut *self.lock())
    }
}
