use crate::utils::error::{DeadlineError, SourceError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One olympiad page to ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceListing {
    pub name: String,
    pub url: String,
}

impl SourceListing {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// An event label paired with its unparsed deadline text, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawToken {
    pub label: String,
    pub deadline_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedListing {
    pub name: String,
    pub url: String,
}

/// Either side may be open, but never both for a parsed deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn until(end: NaiveDate) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub name: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl NormalizedEvent {
    pub fn new(name: impl Into<String>, range: DateRange) -> Self {
        Self {
            name: name.into(),
            start: range.start,
            end: range.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub name: String,
    pub url: String,
    pub events: Vec<NormalizedEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub listing: SourceListing,
    pub error: SourceError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEvent {
    pub source_url: String,
    pub token: RawToken,
    pub error: DeadlineError,
}

/// Counters and failure details for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestionReport {
    /// Sources that produced a record.
    pub sources_processed: usize,
    pub sources_failed: usize,
    pub events_parsed: usize,
    pub events_skipped: usize,
    pub failures: Vec<SourceFailure>,
    pub skipped: Vec<SkippedEvent>,
}

impl IngestionReport {
    pub fn record_failure(&mut self, listing: SourceListing, error: SourceError) {
        self.sources_failed += 1;
        self.failures.push(SourceFailure { listing, error });
    }

    pub fn record_skipped(&mut self, source_url: &str, token: RawToken, error: DeadlineError) {
        self.events_skipped += 1;
        self.skipped.push(SkippedEvent {
            source_url: source_url.to_string(),
            token,
            error,
        });
    }

    pub fn total_sources(&self) -> usize {
        self.sources_processed + self.sources_failed
    }
}

impl std::fmt::Display for IngestionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} sources processed, {} failed; {} events parsed, {} skipped",
            self.sources_processed, self.sources_failed, self.events_parsed, self.events_skipped
        )
    }
}
