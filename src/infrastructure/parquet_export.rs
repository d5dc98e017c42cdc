// Parquet exporter - Columnar serialization of the live telemetry series
use crate::domain::telemetry::Sample;
use arrow::array::{ArrayRef, Float64Array, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub const EXPORT_FILE_NAME: &str = "battery_data.parquet";

pub const COL_TIMESTAMP: &str = "Timestamp";
pub const COL_TEST_TIME: &str = "TestTime";
pub const COL_VOLTAGE: &str = "Voltage";
pub const COL_REMAINING_CAPACITY: &str = "Remaining Capacity";
pub const COL_DISCHARGE_RATE: &str = "Discharge Rate";
pub const COL_CHARGE_RATE: &str = "Charge Rate";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to build record batch: {0}")]
    Arrow(#[from] ArrowError),
    #[error("failed to write parquet: {0}")]
    Parquet(#[from] ParquetError),
}

fn measurement(name: &str, unit: &str, nullable: bool) -> Field {
    Field::new(name, DataType::Float64, nullable)
        .with_metadata(HashMap::from([("unit".to_string(), unit.to_string())]))
}

/// Export schema, in column order.
pub fn telemetry_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(
            COL_TIMESTAMP,
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            false,
        ),
        measurement(COL_TEST_TIME, "s", false),
        measurement(COL_VOLTAGE, "V", true),
        measurement(COL_REMAINING_CAPACITY, "Wh", true),
        measurement(COL_DISCHARGE_RATE, "W", true),
        measurement(COL_CHARGE_RATE, "W", true),
    ]))
}

fn optional_column(series: &[Sample], value: impl Fn(&Sample) -> Option<f64>) -> ArrayRef {
    Arc::new(series.iter().map(value).collect::<Float64Array>())
}

/// Arrange the series as a single record batch. Absent readings become nulls.
pub fn to_record_batch(series: &[Sample]) -> Result<RecordBatch, ExportError> {
    let timestamps = series
        .iter()
        .map(|s| s.timestamp.timestamp_micros())
        .collect::<Vec<i64>>();
    let elapsed = series.iter().map(|s| s.elapsed_seconds).collect::<Vec<f64>>();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(TimestampMicrosecondArray::from(timestamps).with_timezone("UTC")),
        Arc::new(Float64Array::from(elapsed)),
        optional_column(series, |s| s.voltage_v),
        optional_column(series, |s| s.remaining_capacity_wh),
        optional_column(series, |s| s.discharge_rate_w),
        optional_column(series, |s| s.charge_rate_w),
    ];

    Ok(RecordBatch::try_new(telemetry_schema(), columns)?)
}

/// Serialize the series to an in-memory Parquet file.
pub fn export(series: &[Sample]) -> Result<Bytes, ExportError> {
    let batch = to_record_batch(series)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    tracing::debug!("Exported {} sample(s) to {} parquet bytes", series.len(), buffer.len());
    Ok(Bytes::from(buffer))
}
