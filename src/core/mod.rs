pub mod deadline;
pub mod etl;
pub mod extract;
pub mod pipeline;

pub use crate::domain::model::{
    DateRange, IngestionReport, NormalizedEvent, NormalizedRecord, RawToken, RelatedListing,
    SourceListing,
};
pub use crate::domain::ports::{ConfigProvider, MarkupFetcher, RecordSink, Storage};
pub use crate::utils::error::Result;
