use crate::core::deadline::DeadlineParser;
use crate::core::extract::{extract_event_tokens, extract_related_listings};
use crate::domain::model::{
    IngestionReport, NormalizedEvent, NormalizedRecord, RawToken, SourceListing,
};
use crate::domain::ports::MarkupFetcher;
use crate::utils::error::{DeadlineError, ExtractError, SourceError};
use futures::stream::{self, StreamExt};
use url::Url;

/// Events parsed from one source, plus the tokens that could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBatch {
    pub record: NormalizedRecord,
    pub skipped: Vec<(RawToken, DeadlineError)>,
}

/// Fetches, extracts and parses source listings.
pub struct IngestionPipeline<F: MarkupFetcher> {
    fetcher: F,
    parser: DeadlineParser,
    concurrent_requests: usize,
}

impl<F: MarkupFetcher> IngestionPipeline<F> {
    pub fn new(fetcher: F, parser: DeadlineParser) -> Self {
        Self {
            fetcher,
            parser,
            concurrent_requests: 1,
        }
    }

    /// Allow up to `limit` fetches in flight. Output order is unaffected.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrent_requests = limit.max(1);
        self
    }

    pub fn parser(&self) -> &DeadlineParser {
        &self.parser
    }

    /// Turns tokens into events. A token whose deadline does not parse is set
    /// aside; its siblings are kept.
    pub fn normalize(&self, listing: &SourceListing, tokens: Vec<RawToken>) -> SourceBatch {
        let mut events = Vec::with_capacity(tokens.len());
        let mut skipped = Vec::new();

        for token in tokens {
            match self.parser.parse(&token.deadline_text) {
                Ok(range) => events.push(NormalizedEvent::new(token.label, range)),
                Err(error) => {
                    tracing::warn!(
                        url = %listing.url,
                        label = %token.label,
                        error = %error,
                        "skipping event with unparseable deadline"
                    );
                    skipped.push((token, error));
                }
            }
        }

        SourceBatch {
            record: NormalizedRecord {
                name: listing.name.clone(),
                url: listing.url.clone(),
                events,
            },
            skipped,
        }
    }

    pub async fn process_source(&self, listing: &SourceListing) -> Result<SourceBatch, SourceError> {
        tracing::debug!(url = %listing.url, "fetching listing page");
        let markup = self.fetcher.fetch_markup(&listing.url).await?;
        let tokens = extract_event_tokens(&markup)?;
        tracing::debug!(url = %listing.url, tokens = tokens.len(), "extracted event tokens");
        Ok(self.normalize(listing, tokens))
    }

    /// Processes every listing and returns the records in listing order,
    /// along with a report of what failed or was skipped.
    pub async fn collect(
        &self,
        listings: &[SourceListing],
    ) -> (Vec<NormalizedRecord>, IngestionReport) {
        let mut records = Vec::with_capacity(listings.len());
        let mut report = IngestionReport::default();

        let mut outcomes = stream::iter(listings.iter().map(|listing| async move {
            (listing, self.process_source(listing).await)
        }))
        .buffered(self.concurrent_requests);

        while let Some((listing, outcome)) = outcomes.next().await {
            match outcome {
                Ok(batch) => {
                    report.sources_processed += 1;
                    report.events_parsed += batch.record.events.len();
                    for (token, error) in batch.skipped {
                        report.record_skipped(&listing.url, token, error);
                    }
                    records.push(batch.record);
                }
                Err(error) => {
                    match &error {
                        SourceError::Extract(_) => tracing::warn!(
                            url = %listing.url,
                            error = %error,
                            "listing page layout not recognized; extractor may need updating"
                        ),
                        SourceError::Fetch(_) => tracing::warn!(
                            url = %listing.url,
                            error = %error,
                            "listing page could not be fetched"
                        ),
                    }
                    report.record_failure(listing.clone(), error);
                }
            }
        }

        (records, report)
    }

    /// Builds source listings from the olympiads a seed page links to.
    /// Relative links are resolved against the seed URL.
    pub async fn discover(&self, seed_url: &str) -> Result<Vec<SourceListing>, SourceError> {
        let markup = self.fetcher.fetch_markup(seed_url).await?;
        let related = extract_related_listings(&markup)?;

        let base = Url::parse(seed_url).map_err(|e| ExtractError::UnrecognizedPageFormat {
            message: format!("seed URL {} is not absolute: {}", seed_url, e),
        })?;

        let listings = related
            .into_iter()
            .map(|entry| {
                let url = base
                    .join(&entry.url)
                    .map_err(|e| ExtractError::UnrecognizedPageFormat {
                        message: format!("link {} cannot be resolved: {}", entry.url, e),
                    })?;
                Ok(SourceListing::new(entry.name, url.to_string()))
            })
            .collect::<Result<Vec<_>, ExtractError>>()?;

        tracing::info!(seed = seed_url, found = listings.len(), "discovered related olympiads");
        Ok(listings)
    }
}

/// Appends `extra` to `base`, skipping URLs already present.
pub fn merge_listings(base: &mut Vec<SourceListing>, extra: Vec<SourceListing>) {
    for listing in extra {
        if !base.iter().any(|existing| existing.url == listing.url) {
            base.push(listing);
        }
    }
}
