// Linux power_supply class adapter for battery status
use crate::application::battery_source::{BatteryStatusSource, SamplerError};
use crate::domain::telemetry::RawBatteryStatus;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads `/sys/class/power_supply/*` and converts to the source-native units the
/// sampler expects: mV, mWh, and rates in 1e-8 W. Energy and power come from
/// `energy_now`/`power_now`, or from `charge_now`/`current_now` times voltage.
#[derive(Debug, Clone)]
pub struct SysfsBatterySource {
    root: PathBuf,
}

impl SysfsBatterySource {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SamplerError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SamplerError::InstrumentationUnavailable(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    async fn read_battery(dir: &Path) -> Result<Option<RawBatteryStatus>, SamplerError> {
        match read_attr(dir, "type").await? {
            Some(kind) if kind == "Battery" => {}
            _ => return Ok(None),
        }

        let voltage_uv = read_number(dir, "voltage_now").await?;
        let status = read_attr(dir, "status").await?;

        // Some batteries only report charge (µAh) and current (µA); scale those by voltage.
        let energy_uwh = match read_number(dir, "energy_now").await? {
            Some(uwh) => Some(uwh),
            None => read_number(dir, "charge_now")
                .await?
                .zip(voltage_uv)
                .map(|(uah, uv)| uah * uv / 1_000_000),
        };
        let power_uw = match read_number(dir, "power_now").await? {
            Some(uw) => Some(uw),
            None => read_number(dir, "current_now")
                .await?
                .zip(voltage_uv)
                .map(|(ua, uv)| ua * uv / 1_000_000),
        };

        let rate = power_uw.map(|uw| uw.abs() * 100);
        let (discharge_rate, charge_rate) = match status.as_deref() {
            Some("Discharging") => (rate, None),
            Some("Charging") => (None, rate),
            _ => (None, None),
        };

        Ok(Some(RawBatteryStatus {
            voltage: voltage_uv.map(|uv| uv / 1000),
            remaining_capacity: energy_uwh.map(|uwh| uwh / 1000),
            discharge_rate,
            charge_rate,
        }))
    }
}

async fn read_attr(dir: &Path, name: &str) -> Result<Option<String>, SamplerError> {
    match tokio::fs::read_to_string(dir.join(name)).await {
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SamplerError::Query(format!(
            "failed to read {}: {}",
            dir.join(name).display(),
            e
        ))),
    }
}

async fn read_number(dir: &Path, name: &str) -> Result<Option<i64>, SamplerError> {
    Ok(read_attr(dir, name)
        .await?
        .and_then(|value| value.parse::<i64>().ok()))
}

#[async_trait]
impl BatteryStatusSource for SysfsBatterySource {
    fn name(&self) -> &'static str {
        "sysfs"
    }

    async fn query(&self) -> Result<Vec<RawBatteryStatus>, SamplerError> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            SamplerError::Query(format!("failed to list {}: {}", self.root.display(), e))
        })?;

        let mut dirs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SamplerError::Query(e.to_string()))?
        {
            dirs.push(entry.path());
        }
        // Stable order across cycles: BAT0 before BAT1
        dirs.sort();

        let mut records = Vec::new();
        for dir in dirs {
            if let Some(record) = Self::read_battery(&dir).await? {
                records.push(record);
            }
        }
        Ok(records)
    }
}
