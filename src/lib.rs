pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::IngestConfig;

pub use adapters::{FileRecordSink, HttpFetcher, LocalStorage, OutputFormat, RetryPolicy};
pub use crate::core::{
    deadline::{parse_deadline, AcademicCycle, DeadlineParser},
    etl::EtlEngine,
    extract::{extract_event_tokens, extract_related_listings},
    pipeline::IngestionPipeline,
};
pub use domain::model::{
    DateRange, IngestionReport, NormalizedEvent, NormalizedRecord, RawToken, RelatedListing,
    SourceListing,
};
pub use utils::error::{EtlError, Result};
