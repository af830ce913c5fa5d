use crate::core::pipeline::IngestionPipeline;
use crate::domain::model::{IngestionReport, SourceListing};
use crate::domain::ports::{MarkupFetcher, RecordSink};
use crate::utils::error::Result;
use std::time::Instant;

/// Runs one ingestion: process every listing, then persist the batch.
///
/// Per-source and per-event failures end up in the returned report. Only a
/// persistence failure makes the run itself fail.
pub struct EtlEngine<F: MarkupFetcher, K: RecordSink> {
    pipeline: IngestionPipeline<F>,
    sink: K,
}

impl<F: MarkupFetcher, K: RecordSink> EtlEngine<F, K> {
    pub fn new(pipeline: IngestionPipeline<F>, sink: K) -> Self {
        Self { pipeline, sink }
    }

    pub fn pipeline(&self) -> &IngestionPipeline<F> {
        &self.pipeline
    }

    pub async fn run(&self, listings: &[SourceListing]) -> Result<IngestionReport> {
        let started = Instant::now();
        tracing::info!(
            "Starting ingestion of {} sources (academic cycle {})",
            listings.len(),
            self.pipeline.parser().cycle().start_year
        );

        let (records, report) = self.pipeline.collect(listings).await;
        tracing::info!(
            "Normalized {} records with {} events ({} events skipped)",
            records.len(),
            report.events_parsed,
            report.events_skipped
        );

        self.sink.persist(records).await?;

        tracing::info!(
            sources_processed = report.sources_processed,
            sources_failed = report.sources_failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ingestion finished"
        );
        Ok(report)
    }
}
