use crate::domain::model::{NormalizedRecord, SourceListing};
use crate::utils::error::{FetchError, PersistenceError, Result};
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn sources(&self) -> &[SourceListing];
    fn cycle_start_year(&self) -> Option<i32>;
    fn output_path(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn retry_attempts(&self) -> u32;
    fn retry_delay(&self) -> Duration;
    fn concurrent_requests(&self) -> usize;
}

/// Fetches raw page markup for a URL.
#[async_trait]
pub trait MarkupFetcher: Send + Sync {
    async fn fetch_markup(&self, url: &str) -> std::result::Result<String, FetchError>;
}

/// Receives the full batch of records produced by one run.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn persist(
        &self,
        records: Vec<NormalizedRecord>,
    ) -> std::result::Result<(), PersistenceError>;
}
