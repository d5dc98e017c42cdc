// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod http_response;
pub mod jsonld;
pub mod parquet_export;
pub mod qr;
pub mod report_parser;
pub mod sysfs_source;
#[cfg(windows)]
pub mod wmi_source;
pub mod zenodo;

use crate::application::battery_source::{BatteryStatusSource, SamplerError};
use crate::infrastructure::config::{SourceKind, TelemetrySettings};
use std::sync::Arc;

/// Connect to the configured instrumentation source. Failure here is fatal.
pub fn open_battery_source(settings: &TelemetrySettings) -> Result<Arc<dyn BatteryStatusSource>, SamplerError> {
    match settings.source {
        SourceKind::Wmi => open_wmi(),
        SourceKind::Sysfs => Ok(Arc::new(sysfs_source::SysfsBatterySource::open(&settings.sysfs_root)?)),
        SourceKind::Auto if cfg!(windows) => open_wmi(),
        SourceKind::Auto => Ok(Arc::new(sysfs_source::SysfsBatterySource::open(&settings.sysfs_root)?)),
    }
}

#[cfg(windows)]
fn open_wmi() -> Result<Arc<dyn BatteryStatusSource>, SamplerError> {
    Ok(Arc::new(wmi_source::WmiBatterySource::open()?))
}

#[cfg(not(windows))]
fn open_wmi() -> Result<Arc<dyn BatteryStatusSource>, SamplerError> {
    Err(SamplerError::InstrumentationUnavailable(
        "WMI is only available on Windows".to_string(),
    ))
}
