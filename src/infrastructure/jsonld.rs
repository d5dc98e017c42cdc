// JSON-LD dataset description (CSVW + DCAT) published next to the parquet export
use crate::infrastructure::config::ZenodoSettings;
use crate::infrastructure::parquet_export::{
    COL_CHARGE_RATE, COL_DISCHARGE_RATE, COL_REMAINING_CAPACITY, COL_TEST_TIME, COL_TIMESTAMP,
    COL_VOLTAGE, EXPORT_FILE_NAME,
};
use chrono::NaiveDate;
use serde_json::{json, Value};

pub const METADATA_FILE_NAME: &str = "metadata.jsonld";

fn column(name: &str, title: &str, description: &str, datatype: &str, unit: Option<&str>) -> Value {
    let mut column = json!({
        "name": name,
        "titles": title,
        "dc:description": description,
        "datatype": datatype,
    });
    if let Some(unit) = unit {
        column["unit"] = json!(unit);
    }
    column
}

fn table_schema() -> Value {
    let mut timestamp = column(
        COL_TIMESTAMP,
        "Timestamp",
        "Date and time of data logging event",
        "dateTime",
        None,
    );
    timestamp["format"] = json!("yyyy-MM-ddTHH:mm:ss");

    json!({
        "columns": [
            timestamp,
            column(COL_TEST_TIME, "Test Time", "Elapsed time in seconds since data logging started", "number", Some("s")),
            column(COL_VOLTAGE, "Voltage", "Battery voltage at time of logging", "number", Some("V")),
            column(COL_REMAINING_CAPACITY, "Remaining Capacity", "Battery remaining capacity in watt-hours", "number", Some("Wh")),
            column(COL_DISCHARGE_RATE, "Discharge Rate", "Battery discharge rate in watts", "number", Some("W")),
            column(COL_CHARGE_RATE, "Charge Rate", "Battery charge rate in watts", "number", Some("W")),
        ],
        "primaryKey": COL_TIMESTAMP,
    })
}

/// Describe the exported dataset as it is reachable under `record_url`.
pub fn dataset_metadata(settings: &ZenodoSettings, record_url: &str, issued: NaiveDate) -> Value {
    let date = issued.format("%Y-%m-%d").to_string();
    let record_url = record_url.trim_end_matches('/');

    let mut metadata = json!({
        "@context": [
            "http://www.w3.org/ns/csvw",
            {
                "dcat": "http://www.w3.org/ns/dcat#",
                "dcterms": "http://purl.org/dc/terms/",
                "foaf": "http://xmlns.com/foaf/0.1/",
                "schema": "http://schema.org/",
                "xsd": "http://www.w3.org/2001/XMLSchema#"
            }
        ],
        "@type": "dcat:Dataset",
        "dcterms:title": settings.title,
        "dcterms:description": settings.description,
        "dcterms:issued": date,
        "dcterms:modified": date,
        "dcat:keyword": settings.keywords,
        "dcterms:language": {
            "@type": "dcterms:ISO639-2",
            "@value": "eng"
        },
        "dcat:distribution": {
            "@type": "dcat:Distribution",
            "dcat:accessURL": record_url,
            "dcterms:format": {
                "rdf:value": "Parquet",
                "dcterms:mediaType": "application/octet-stream"
            },
            "dcat:downloadURL": format!("{}/files/{}", record_url, EXPORT_FILE_NAME)
        },
        "tableSchema": table_schema(),
    });

    if let Some(publisher) = &settings.publisher {
        metadata["dcterms:publisher"] = json!({
            "@type": "foaf:Organization",
            "foaf:name": publisher,
        });
    }

    let creators: Vec<Value> = settings
        .creators
        .iter()
        .map(|creator| {
            let mut person = json!({ "@type": "foaf:Person", "foaf:name": creator.name });
            if let Some(orcid) = &creator.orcid {
                person["foaf:orcid"] = json!(orcid);
            }
            person
        })
        .collect();
    if !creators.is_empty() {
        metadata["dcterms:creator"] = Value::Array(creators);
    }

    metadata
}
