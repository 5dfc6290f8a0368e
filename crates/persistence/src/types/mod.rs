//! Core types for stored records, persistent identifiers and search.

mod pid;
mod record;
mod search;

pub use pid::{PersistentIdentifier, PidStatus};
pub use record::{RecordId, StoredRecord};
pub use search::{
    IndexDocument, SearchHit, SearchPage, SearchQuery, SortDirective, SortField, SortOrder,
    TermBucket,
};
