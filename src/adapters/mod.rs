// Adapters layer: concrete implementations of the domain ports.

pub mod http;
pub mod sink;
pub mod storage;

pub use http::{HttpFetcher, RetryPolicy};
pub use sink::{FileRecordSink, OutputFormat};
pub use storage::LocalStorage;
