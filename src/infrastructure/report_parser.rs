// Battery report parser - Scrapes the vendor-generated HTML battery report
use crate::domain::report::{BatteryReport, CapacityHistoryPoint, ReportSummary, WattHours};
use scraper::{ElementRef, Html, Selector};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Zero-based position of the capacity history table in the vendor report.
///
/// The report carries no structural marker for this table, so it is located by
/// position. Reports with fewer tables have no history.
pub const CAPACITY_HISTORY_TABLE_INDEX: usize = 5;

static TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));
static LABEL: LazyLock<Selector> = LazyLock::new(|| selector("span.label"));

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read battery report {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("battery report is empty")]
    Empty,
}

#[derive(Debug, Clone, Copy)]
enum SummaryField {
    DesignCapacity,
    FullChargeCapacity,
    CycleCount,
    Chemistry,
}

/// Label fragment to summary field, checked in order; the first match wins.
const LABEL_FIELDS: &[(&str, SummaryField)] = &[
    ("design capacity", SummaryField::DesignCapacity),
    ("full charge capacity", SummaryField::FullChargeCapacity),
    ("cycle count", SummaryField::CycleCount),
    ("chemistry", SummaryField::Chemistry),
];

impl SummaryField {
    fn for_label(label: &str) -> Option<Self> {
        let label = label.to_lowercase();
        LABEL_FIELDS
            .iter()
            .find(|(fragment, _)| label.contains(*fragment))
            .map(|(_, field)| *field)
    }

    /// Store `value` into `summary`. Returns false when the value does not parse.
    fn apply(self, summary: &mut ReportSummary, value: &str) -> bool {
        match self {
            SummaryField::DesignCapacity => parse_capacity(value)
                .map(|wh| summary.design_capacity = Some(wh))
                .is_some(),
            SummaryField::FullChargeCapacity => parse_capacity(value)
                .map(|wh| summary.full_charge_capacity = Some(wh))
                .is_some(),
            SummaryField::CycleCount => clean_value(value)
                .parse::<u32>()
                .ok()
                .map(|count| summary.cycle_count = Some(count))
                .is_some(),
            SummaryField::Chemistry => {
                summary.chemistry = Some(clean_value(value));
                true
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportParser {
    history_table_index: usize,
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new(CAPACITY_HISTORY_TABLE_INDEX)
    }
}

impl ReportParser {
    pub fn new(history_table_index: usize) -> Self {
        Self { history_table_index }
    }

    pub fn parse_file(&self, path: &Path) -> Result<BatteryReport, ReportError> {
        let document = std::fs::read_to_string(path).map_err(|source| ReportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse(&document)
    }

    pub fn parse(&self, document: &str) -> Result<BatteryReport, ReportError> {
        if document.trim().is_empty() {
            return Err(ReportError::Empty);
        }

        let html = Html::parse_document(document);
        let tables: Vec<ElementRef> = html.select(&TABLE).collect();

        let mut summary = ReportSummary::default();
        for table in &tables {
            for row in table.select(&ROW) {
                read_summary_row(row, &mut summary);
            }
        }

        let capacity_history = tables
            .get(self.history_table_index)
            .map(|table| read_capacity_history(*table));

        tracing::debug!(
            "Parsed battery report: {} table(s), history {}",
            tables.len(),
            match &capacity_history {
                Some(points) => format!("{} point(s)", points.len()),
                None => "absent".to_string(),
            }
        );

        Ok(BatteryReport {
            summary,
            capacity_history,
        })
    }
}

fn read_summary_row(row: ElementRef, summary: &mut ReportSummary) {
    let Some(label) = row.select(&LABEL).next() else {
        return;
    };
    let Some(value) = row.select(&CELL).nth(1) else {
        return;
    };

    let label = cell_text(label);
    let Some(field) = SummaryField::for_label(&label) else {
        return;
    };

    let value = cell_text(value);
    if !field.apply(summary, &value) {
        tracing::debug!("Skipping report row {:?}: unreadable value {:?}", label, value);
    }
}

fn read_capacity_history(table: ElementRef) -> Vec<CapacityHistoryPoint> {
    table
        .select(&ROW)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&CELL).map(cell_text).collect();
            let [period, full_charge, design] = cells.as_slice() else {
                return None;
            };
            let point = CapacityHistoryPoint {
                period: period.clone(),
                full_charge_capacity: parse_capacity(full_charge)?,
                design_capacity: parse_capacity(design)?,
            };
            Some(point)
        })
        .collect()
}

/// Concatenated text of an element with each text node trimmed.
fn cell_text(element: ElementRef) -> String {
    element.text().map(str::trim).collect()
}

/// Drop the milliwatt-hour suffix and thousands separators.
fn clean_value(value: &str) -> String {
    value.replace(" mWh", "").replace(',', "").trim().to_string()
}

fn parse_capacity(value: &str) -> Option<WattHours> {
    clean_value(value)
        .parse::<i64>()
        .ok()
        .map(WattHours::from_milliwatt_hours)
}
