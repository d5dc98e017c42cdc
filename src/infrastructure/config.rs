use serde::Deserialize;
use std::path::PathBuf;

use crate::infrastructure::report_parser::CAPACITY_HISTORY_TABLE_INDEX;

const ENV_PREFIX: &str = "BATTERY_DASHBOARD";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub zenodo: ZenodoSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Auto,
    Wmi,
    Sysfs,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            source: SourceKind::default(),
            sysfs_root: default_sysfs_root(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportSettings {
    #[serde(default = "default_report_path")]
    pub path: PathBuf,
    #[serde(default = "default_history_table_index")]
    pub history_table_index: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            path: default_report_path(),
            history_table_index: default_history_table_index(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Creator {
    pub name: String,
    #[serde(default)]
    pub orcid: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZenodoSettings {
    #[serde(default = "default_true")]
    pub sandbox: bool,
    #[serde(default = "default_true")]
    pub publish_draft: bool,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub creators: Vec<Creator>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default = "default_license")]
    pub license: String,
}

impl Default for ZenodoSettings {
    fn default() -> Self {
        Self {
            sandbox: true,
            publish_draft: true,
            title: default_title(),
            description: default_description(),
            keywords: default_keywords(),
            creators: Vec::new(),
            publisher: None,
            license: default_license(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_poll_interval() -> u64 {
    30
}

fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/sys/class/power_supply")
}

fn default_report_path() -> PathBuf {
    PathBuf::from("battery-report.html")
}

fn default_history_table_index() -> usize {
    CAPACITY_HISTORY_TABLE_INDEX
}

fn default_true() -> bool {
    true
}

fn default_title() -> String {
    "Laptop battery telemetry".to_string()
}

fn default_description() -> String {
    "Battery data logged live from a laptop, capturing voltage, remaining capacity, discharge rate, and charge rate over time.".to_string()
}

fn default_keywords() -> Vec<String> {
    ["battery data", "voltage", "capacity", "discharge rate", "charge rate"]
        .iter()
        .map(|k| k.to_string())
        .collect()
}

fn default_license() -> String {
    "CC-BY-4.0".to_string()
}

/// Load `config/dashboard.toml` (optional) overlaid with `BATTERY_DASHBOARD__*`
/// environment variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    load_app_config_from("config/dashboard")
}

pub fn load_app_config_from(file: &str) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(file).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
