//! Record indexing.

mod indexer;

pub use indexer::{BulkIndexOutcome, RecordIndexer};
