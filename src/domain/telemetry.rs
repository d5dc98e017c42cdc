// Live battery telemetry domain models
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Divisor turning raw millivolts into volts.
pub const VOLTAGE_DIVISOR: f64 = 1_000.0;
/// Divisor turning raw milliwatt-hours into watt-hours.
pub const CAPACITY_DIVISOR: f64 = 1_000.0;
/// Divisor turning the instrumentation's raw rate unit into watts.
pub const RATE_DIVISOR: f64 = 100_000_000.0;

/// One battery status record as reported by the instrumentation source, in
/// source-native integer units. `None` means the source did not expose the field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawBatteryStatus {
    pub voltage: Option<i64>,
    pub remaining_capacity: Option<i64>,
    pub discharge_rate: Option<i64>,
    pub charge_rate: Option<i64>,
}

/// One normalized live reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub elapsed_seconds: f64,
    pub voltage_v: Option<f64>,
    pub remaining_capacity_wh: Option<f64>,
    pub discharge_rate_w: Option<f64>,
    pub charge_rate_w: Option<f64>,
}

impl Sample {
    /// Normalize a raw record taken at `timestamp`, `elapsed_seconds` after session start.
    ///
    /// A raw value of zero is reported as absent, same as a missing field: the
    /// instrumentation uses zero for "not reporting" and a zero-volt reading would
    /// only mislead the charts.
    pub fn from_raw(raw: &RawBatteryStatus, timestamp: DateTime<Utc>, elapsed_seconds: f64) -> Self {
        Self {
            timestamp,
            elapsed_seconds,
            voltage_v: scale(raw.voltage, VOLTAGE_DIVISOR),
            remaining_capacity_wh: scale(raw.remaining_capacity, CAPACITY_DIVISOR),
            discharge_rate_w: scale(raw.discharge_rate, RATE_DIVISOR),
            charge_rate_w: scale(raw.charge_rate, RATE_DIVISOR),
        }
    }
}

fn scale(raw: Option<i64>, divisor: f64) -> Option<f64> {
    match raw {
        Some(0) | None => None,
        Some(value) => Some(value as f64 / divisor),
    }
}
