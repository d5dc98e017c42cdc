// Port for live battery instrumentation
use crate::domain::telemetry::RawBatteryStatus;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SamplerError {
    /// The data source cannot be reached at all. Fatal at startup.
    #[error("battery instrumentation unavailable: {0}")]
    InstrumentationUnavailable(String),
    /// A single query against a reachable source failed.
    #[error("battery status query failed: {0}")]
    Query(String),
}

#[async_trait]
pub trait BatteryStatusSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Read every battery status record currently reported. An empty result is valid.
    async fn query(&self) -> Result<Vec<RawBatteryStatus>, SamplerError>;
}
