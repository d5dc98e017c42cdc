// Dashboard service - Use case for building the dashboard view
use crate::application::poller::Poller;
use crate::application::store::TelemetryStore;
use crate::domain::dashboard::{
    ChartData, ChartKind, ChartPoint, Dashboard, PointX, TileData, NOT_AVAILABLE, NO_DATA, NO_READING,
};
use crate::domain::report::{BatteryReport, CapacityHistoryPoint, ReportSummary};
use crate::domain::telemetry::Sample;
use crate::infrastructure::report_parser::{ReportError, ReportParser};
use std::path::PathBuf;
use std::sync::Arc;

pub const DASHBOARD_TITLE: &str = "Battery Report Dashboard";
pub const NO_HISTORY_NOTICE: &str = "No capacity history data found in the battery report.";

/// One live measurement: tile and chart labels plus how to read it from a sample.
struct Measurement {
    id: &'static str,
    title: &'static str,
    chart_title: &'static str,
    axis_title: &'static str,
    unit: &'static str,
    value: fn(&Sample) -> Option<f64>,
}

static MEASUREMENTS: [Measurement; 4] = [
    Measurement {
        id: "voltage",
        title: "Voltage",
        chart_title: "Battery Voltage Over Time",
        axis_title: "Voltage  /  V",
        unit: "V",
        value: |s: &Sample| s.voltage_v,
    },
    Measurement {
        id: "remaining_capacity",
        title: "Remaining Capacity",
        chart_title: "Remaining Capacity Over Time",
        axis_title: "Capacity  /  Wh",
        unit: "Wh",
        value: |s: &Sample| s.remaining_capacity_wh,
    },
    Measurement {
        id: "discharge_rate",
        title: "Discharge Rate",
        chart_title: "Discharge Rate Over Time",
        axis_title: "Discharge Rate  /  W",
        unit: "W",
        value: |s: &Sample| s.discharge_rate_w,
    },
    Measurement {
        id: "charge_rate",
        title: "Charge Rate",
        chart_title: "Charge Rate Over Time",
        axis_title: "Charge Rate  /  W",
        unit: "W",
        value: |s: &Sample| s.charge_rate_w,
    },
];

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<TelemetryStore>,
    poller: Arc<Poller>,
    parser: ReportParser,
    report_path: PathBuf,
}

impl DashboardService {
    pub fn new(store: Arc<TelemetryStore>, poller: Arc<Poller>, parser: ReportParser, report_path: PathBuf) -> Self {
        Self {
            store,
            poller,
            parser,
            report_path,
        }
    }

    /// Read and parse the report. The document is static, but re-reading keeps this
    /// stateless and picks up a report generated after startup.
    pub async fn load_report(&self) -> Result<BatteryReport, ReportError> {
        let parser = self.parser.clone();
        let path = self.report_path.clone();
        match tokio::task::spawn_blocking(move || parser.parse_file(&path)).await {
            Ok(result) => result,
            Err(e) => Err(ReportError::Read {
                path: self.report_path.clone(),
                source: std::io::Error::other(e),
            }),
        }
    }

    pub async fn get_dashboard(&self) -> Dashboard {
        // Snapshot first: the live series never depends on the report.
        let samples = self.store.snapshot();
        let mut notices = Vec::new();

        let report = match self.load_report().await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!("Battery report unavailable: {}", e);
                notices.push(e.to_string());
                None
            }
        };
        let summary = report.as_ref().map(|r| &r.summary);
        let history = report.as_ref().and_then(|r| r.capacity_history.as_deref());

        let mut charts = live_charts(&samples);
        match history {
            Some(points) => charts.push(history_chart(points)),
            None => notices.push(NO_HISTORY_NOTICE.to_string()),
        }

        if let Some(error) = self.poller.last_error() {
            notices.push(error);
        }

        Dashboard {
            title: DASHBOARD_TITLE.to_string(),
            metadata: metadata_tiles(summary),
            status: status_tiles(samples.last()),
            charts,
            notices,
            sample_count: samples.len(),
        }
    }
}

fn metadata_tiles(summary: Option<&ReportSummary>) -> Vec<TileData> {
    let empty = ReportSummary::default();
    let summary = summary.unwrap_or(&empty);
    let or_missing = |value: Option<String>| value.unwrap_or_else(|| NOT_AVAILABLE.to_string());

    vec![
        TileData::new(
            "design_capacity",
            "Design Capacity",
            or_missing(summary.design_capacity.map(|wh| wh.to_string())),
        ),
        TileData::new(
            "full_charge_capacity",
            "Full Charge Capacity",
            or_missing(summary.full_charge_capacity.map(|wh| wh.to_string())),
        ),
        TileData::new(
            "cycle_count",
            "Cycle Count",
            or_missing(summary.cycle_count.map(|c| c.to_string())),
        ),
        TileData::new("chemistry", "Chemistry", or_missing(summary.chemistry.clone())),
    ]
}

fn status_tiles(latest: Option<&Sample>) -> Vec<TileData> {
    MEASUREMENTS
        .iter()
        .map(|m| {
            let value = match latest {
                None => NO_DATA.to_string(),
                Some(sample) => match (m.value)(sample) {
                    Some(v) => format!("{:.2} {}", v, m.unit),
                    None => NO_READING.to_string(),
                },
            };
            TileData::new(m.id, m.title, value)
        })
        .collect()
}

fn live_charts(samples: &[Sample]) -> Vec<ChartData> {
    MEASUREMENTS
        .iter()
        .map(|m| {
            let points = samples
                .iter()
                .filter_map(|s| (m.value)(s).map(|y| ChartPoint::new(PointX::Seconds(s.elapsed_seconds), y)))
                .collect();
            ChartData::new(m.id, m.chart_title, "Time  /  s", m.axis_title, ChartKind::Line, points)
        })
        .collect()
}

fn history_chart(history: &[CapacityHistoryPoint]) -> ChartData {
    let points = history
        .iter()
        .map(|p| ChartPoint::new(PointX::Label(p.period.clone()), p.full_charge_capacity.value()))
        .collect();
    ChartData::new(
        "capacity_history",
        "Battery Full Charge Capacity Over Time (Report)",
        "Period",
        "Full Charge Capacity  /  Wh",
        ChartKind::Scatter,
        points,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sampler::tests::{battery, ScriptedSource};
    use crate::application::sampler::TelemetrySampler;
    use crate::domain::telemetry::RawBatteryStatus;
    use std::time::Duration;

    const REPORT: &str = r#"<html><body>
        <table>
          <tr><td><span class="label">DESIGN CAPACITY</span></td><td>50,000 mWh</td></tr>
          <tr><td><span class="label">CYCLE COUNT</span></td><td>12</td></tr>
        </table>
        </body></html>"#;

    fn service(responses: Vec<RawBatteryStatus>, report_path: PathBuf) -> (DashboardService, Arc<Poller>) {
        let store = Arc::new(TelemetryStore::new());
        let source = ScriptedSource::new(vec![Ok(responses)]);
        let poller = Arc::new(Poller::new(
            TelemetrySampler::new(Arc::new(source)),
            store.clone(),
            Duration::from_secs(30),
        ));
        let service = DashboardService::new(store, poller.clone(), ReportParser::default(), report_path);
        (service, poller)
    }

    #[tokio::test]
    async fn test_missing_report_does_not_hide_live_data() {
        let dir = tempfile::tempdir().unwrap();
        let (service, poller) = service(vec![battery(12_000)], dir.path().join("missing.html"));
        poller.poll_once().await.unwrap();

        let dashboard = service.get_dashboard().await;

        assert_eq!(dashboard.sample_count, 1);
        assert_eq!(dashboard.charts[0].points.len(), 1);
        assert_eq!(dashboard.charts[0].points[0].y, 12.0);
        assert!(dashboard.metadata.iter().all(|t| t.value == NOT_AVAILABLE));
        assert!(dashboard.notices.iter().any(|n| n.contains("missing.html")));
        assert_eq!(dashboard.status[0].value, "12.00 V");
    }

    #[tokio::test]
    async fn test_report_tiles_and_missing_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("battery-report.html");
        std::fs::write(&path, REPORT).unwrap();
        let (service, _poller) = service(Vec::new(), path);

        let dashboard = service.get_dashboard().await;

        let values: Vec<&str> = dashboard.metadata.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["50.0 Wh", NOT_AVAILABLE, "12", NOT_AVAILABLE]);
        assert!(dashboard.status.iter().all(|t| t.value == NO_DATA));
        assert_eq!(dashboard.charts.len(), 4);
        assert!(dashboard.notices.contains(&NO_HISTORY_NOTICE.to_string()));
    }

    #[test]
    fn test_status_tiles_mark_absent_readings() {
        let sample = Sample::from_raw(
            &RawBatteryStatus {
                voltage: Some(11_870),
                remaining_capacity: Some(0),
                discharge_rate: Some(712_000_000),
                charge_rate: None,
            },
            chrono::Utc::now(),
            60.0,
        );

        let values: Vec<String> = status_tiles(Some(&sample)).into_iter().map(|t| t.value).collect();

        assert_eq!(values, vec!["11.87 V", NO_READING, "7.12 W", NO_READING]);
    }

    #[test]
    fn test_live_charts_skip_absent_points() {
        let mut first = Sample::from_raw(&battery(12_000), chrono::Utc::now(), 0.0);
        let second = Sample::from_raw(&battery(11_900), chrono::Utc::now(), 30.0);
        first.voltage_v = None;

        let charts = live_charts(&[first, second]);

        assert_eq!(charts[0].points, vec![ChartPoint::new(PointX::Seconds(30.0), 11.9)]);
        assert_eq!(charts[1].points.len(), 2);
    }
}
