// Battery report domain models
use serde::{Serialize, Serializer};
use std::fmt;

/// An energy quantity in watt-hours.
///
/// Displays the way the report values are shown on the dashboard: whole values keep
/// one decimal place (`50.0 Wh`), fractional values print every significant digit
/// (`50.123 Wh`).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct WattHours(pub f64);

impl WattHours {
    pub fn from_milliwatt_hours(mwh: i64) -> Self {
        Self(mwh as f64 / 1000.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for WattHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.1} Wh", self.0)
        } else {
            write!(f, "{} Wh", self.0)
        }
    }
}

/// Summary capacities are reported as `"<value> Wh"` strings.
fn serialize_labelled<S: Serializer>(value: &Option<WattHours>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(wh) => serializer.collect_str(wh),
        None => serializer.serialize_none(),
    }
}

/// Static metadata extracted from the vendor report. Every field is optional:
/// presence depends on what the report contains.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    #[serde(serialize_with = "serialize_labelled")]
    pub design_capacity: Option<WattHours>,
    #[serde(serialize_with = "serialize_labelled")]
    pub full_charge_capacity: Option<WattHours>,
    pub cycle_count: Option<u32>,
    pub chemistry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityHistoryPoint {
    pub period: String,
    pub full_charge_capacity: WattHours,
    pub design_capacity: WattHours,
}

/// Result of parsing one report document.
///
/// `capacity_history` is `None` when the report has no history table at all, and
/// `Some(vec![])` when the table exists but no row could be read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatteryReport {
    pub summary: ReportSummary,
    pub capacity_history: Option<Vec<CapacityHistoryPoint>>,
}
