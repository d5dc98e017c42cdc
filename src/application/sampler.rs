// Telemetry sampler - Turns one instrumentation query into normalized samples
use crate::application::battery_source::{BatteryStatusSource, SamplerError};
use crate::domain::telemetry::Sample;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct TelemetrySampler {
    source: Arc<dyn BatteryStatusSource>,
}

impl TelemetrySampler {
    pub fn new(source: Arc<dyn BatteryStatusSource>) -> Self {
        Self { source }
    }

    /// Query the source once and build one sample per returned record.
    ///
    /// Every sample of one call shares the same timestamp and elapsed time. Query
    /// failures are returned to the caller, never swallowed.
    pub async fn sample(&self, session_start: Instant) -> Result<Vec<Sample>, SamplerError> {
        let records = self.source.query().await?;

        let timestamp = Utc::now();
        let elapsed_seconds = session_start.elapsed().as_secs_f64();

        tracing::debug!(
            "{} returned {} battery record(s) at {:.1}s",
            self.source.name(),
            records.len(),
            elapsed_seconds
        );

        Ok(records
            .iter()
            .map(|raw| Sample::from_raw(raw, timestamp, elapsed_seconds))
            .collect())
    }
}
