// Windows WMI adapter for battery status (root\WMI BatteryStatus)
use crate::application::battery_source::{BatteryStatusSource, SamplerError};
use crate::domain::telemetry::RawBatteryStatus;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::mpsc;
use tokio::sync::oneshot;
use wmi::{COMLibrary, WMIConnection};

const NAMESPACE: &str = "root\\WMI";
const QUERY: &str = "SELECT * FROM BatteryStatus";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BatteryStatusRow {
    voltage: Option<u32>,
    remaining_capacity: Option<u32>,
    discharge_rate: Option<i32>,
    charge_rate: Option<i32>,
}

impl From<BatteryStatusRow> for RawBatteryStatus {
    fn from(row: BatteryStatusRow) -> Self {
        Self {
            voltage: row.voltage.map(i64::from),
            remaining_capacity: row.remaining_capacity.map(i64::from),
            discharge_rate: row.discharge_rate.map(i64::from),
            charge_rate: row.charge_rate.map(i64::from),
        }
    }
}

type Reply = oneshot::Sender<Result<Vec<RawBatteryStatus>, SamplerError>>;

/// COM connections are bound to the thread that created them, so one worker thread
/// owns the connection and serves queries sent over a channel.
pub struct WmiBatterySource {
    requests: mpsc::Sender<Reply>,
}

impl WmiBatterySource {
    pub fn open() -> Result<Self, SamplerError> {
        let (requests, incoming) = mpsc::channel::<Reply>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), SamplerError>>(1);

        std::thread::Builder::new()
            .name("wmi-battery".to_string())
            .spawn(move || {
                let connection = match connect() {
                    Ok(connection) => {
                        let _ = ready_tx.send(Ok(()));
                        connection
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while let Ok(reply) = incoming.recv() {
                    let result = connection
                        .raw_query::<BatteryStatusRow>(QUERY)
                        .map(|rows| rows.into_iter().map(RawBatteryStatus::from).collect())
                        .map_err(|e| SamplerError::Query(e.to_string()));
                    let _ = reply.send(result);
                }
            })
            .map_err(|e| SamplerError::InstrumentationUnavailable(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|_| SamplerError::InstrumentationUnavailable("WMI worker exited".to_string()))??;

        tracing::info!("Connected to WMI namespace {}", NAMESPACE);
        Ok(Self { requests })
    }
}

fn connect() -> Result<WMIConnection, SamplerError> {
    let com = COMLibrary::new().map_err(|e| SamplerError::InstrumentationUnavailable(e.to_string()))?;
    WMIConnection::with_namespace_path(NAMESPACE, com)
        .map_err(|e| SamplerError::InstrumentationUnavailable(e.to_string()))
}

#[async_trait]
impl BatteryStatusSource for WmiBatterySource {
    fn name(&self) -> &'static str {
        "wmi"
    }

    async fn query(&self) -> Result<Vec<RawBatteryStatus>, SamplerError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(reply)
            .map_err(|_| SamplerError::Query("WMI worker stopped".to_string()))?;
        response
            .await
            .map_err(|_| SamplerError::Query("WMI worker dropped the request".to_string()))?
    }
}
