use crate::domain::model::NormalizedRecord;
use crate::domain::ports::{RecordSink, Storage};
use crate::utils::error::{EtlError, PersistenceError};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::str::FromStr;

pub const JSON_FILENAME: &str = "olympiads.json";
pub const CSV_FILENAME: &str = "events.csv";

const CSV_HEADER: [&str; 5] = ["olympiad", "url", "event", "start", "end"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    pub const ALL: [&'static str; 2] = ["json", "csv"];

    pub fn filename(&self) -> &'static str {
        match self {
            OutputFormat::Json => JSON_FILENAME,
            OutputFormat::Csv => CSV_FILENAME,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = EtlError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(EtlError::InvalidConfigValueError {
                field: "output.formats".to_string(),
                value: other.to_string(),
                reason: format!("Valid formats: {}", OutputFormat::ALL.join(", ")),
            }),
        }
    }
}

fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

pub fn encode_json(records: &[NormalizedRecord]) -> Result<Vec<u8>, PersistenceError> {
    serde_json::to_vec_pretty(records)
        .map_err(|e| PersistenceError::with_source("could not encode records as JSON", e))
}

/// One row per event; missing dates become empty cells.
pub fn encode_csv(records: &[NormalizedRecord]) -> Result<Vec<u8>, PersistenceError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let write_err = |e: csv::Error| PersistenceError::with_source("could not write events CSV", e);

    writer.write_record(CSV_HEADER).map_err(write_err)?;
    for record in records {
        for event in &record.events {
            let start = date_cell(event.start);
            let end = date_cell(event.end);
            writer
                .write_record([
                    record.name.as_str(),
                    record.url.as_str(),
                    event.name.as_str(),
                    start.as_str(),
                    end.as_str(),
                ])
                .map_err(write_err)?;
        }
    }

    writer.into_inner().map_err(|e| {
        PersistenceError::new(format!("could not finish events CSV: {}", e.error()))
    })
}

/// Writes each run's records to storage in the configured formats.
pub struct FileRecordSink<S: Storage> {
    storage: S,
    formats: Vec<OutputFormat>,
}

impl<S: Storage> FileRecordSink<S> {
    pub fn new(storage: S, formats: Vec<OutputFormat>) -> Self {
        Self { storage, formats }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[async_trait]
impl<S: Storage> RecordSink for FileRecordSink<S> {
    async fn persist(&self, records: Vec<NormalizedRecord>) -> Result<(), PersistenceError> {
        for format in &self.formats {
            let data = match format {
                OutputFormat::Json => encode_json(&records)?,
                OutputFormat::Csv => encode_csv(&records)?,
            };

            tracing::debug!(
                "Writing {} ({} bytes) to storage",
                format.filename(),
                data.len()
            );
            self.storage
                .write_file(format.filename(), &data)
                .await
                .map_err(|e| {
                    PersistenceError::with_source(format!("could not write {}", format.filename()), e)
                })?;
        }

        tracing::info!("Persisted {} olympiad records", records.len());
        Ok(())
    }
}
