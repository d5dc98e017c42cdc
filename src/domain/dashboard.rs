// Dashboard view model consumed by the rendering layer
use serde::Serialize;

pub const NOT_AVAILABLE: &str = "Not available";
pub const NO_READING: &str = "N/A";
pub const NO_DATA: &str = "No data";

#[derive(Debug, Clone, Serialize)]
pub struct TileData {
    pub id: String,
    pub title: String,
    pub value: String,
}

impl TileData {
    pub fn new(id: &str, title: &str, value: String) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            value,
        }
    }
}

/// X coordinate of a chart point: elapsed seconds for live series, a period label
/// for report history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PointX {
    Seconds(f64),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: PointX,
    pub y: f64,
}

impl ChartPoint {
    pub fn new(x: PointX, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Line,
    Scatter,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub id: String,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub kind: ChartKind,
    pub points: Vec<ChartPoint>,
}

impl ChartData {
    pub fn new(
        id: &str,
        title: &str,
        x_title: &str,
        y_title: &str,
        kind: ChartKind,
        points: Vec<ChartPoint>,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            x_title: x_title.to_string(),
            y_title: y_title.to_string(),
            kind,
            points,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub metadata: Vec<TileData>,
    pub status: Vec<TileData>,
    pub charts: Vec<ChartData>,
    pub notices: Vec<String>,
    pub sample_count: usize,
}
