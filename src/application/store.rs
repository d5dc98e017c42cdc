// Telemetry store - Session-scoped, append-only series of live samples
use crate::domain::telemetry::Sample;
use chrono::{DateTime, Utc};
use std::sync::{PoisonError, RwLock};
use std::time::Instant;

/// The session context: when the session started and every sample collected since.
///
/// Lives for the duration of the process and is never persisted. A batch passed to
/// [`TelemetryStore::append`] becomes visible to readers all at once.
#[derive(Debug)]
pub struct TelemetryStore {
    started_at: DateTime<Utc>,
    origin: Instant,
    samples: RwLock<Vec<Sample>>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            origin: Instant::now(),
            samples: RwLock::new(Vec::new()),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Monotonic instant that elapsed times are measured from.
    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Append a batch, preserving its order. Returns the number of samples added.
    pub fn append(&self, batch: Vec<Sample>) -> usize {
        if batch.is_empty() {
            return 0;
        }
        let added = batch.len();
        let mut samples = self.samples.write().unwrap_or_else(PoisonError::into_inner);
        samples.extend(batch);
        added
    }

    /// Copy of the full series in append order.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn latest(&self) -> Option<Sample> {
        self.samples
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.samples.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}
