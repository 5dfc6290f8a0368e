//! Search query and index document types.
//!
//! A search query carries an optional free-text term, a terms filter on the
//! document type, a sort directive and pagination. Index documents are the
//! denormalized copies of record payloads the indexer writes into a named
//! index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IndexError, StorageResult};
use crate::types::{RecordId, StoredRecord};

/// Fields a search result may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Sort by the indexed title.
    Title,
    /// Sort by the record's external control number.
    ControlNumber,
}

impl SortField {
    /// Returns the query-parameter name of the field.
    pub const fn as_str(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::ControlNumber => "control_number",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending (the default).
    Asc,
    /// Descending.
    Desc,
}

/// A parsed sort directive such as `title` or `-control_number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    /// The field to sort by.
    pub field: SortField,
    /// The direction to sort in.
    pub order: SortOrder,
}

impl SortDirective {
    /// Creates an ascending directive.
    pub const fn asc(field: SortField) -> Self {
        Self {
            field,
            order: SortOrder::Asc,
        }
    }

    /// Creates a descending directive.
    pub const fn desc(field: SortField) -> Self {
        Self {
            field,
            order: SortOrder::Desc,
        }
    }

    /// Parses a directive from its query-string form.
    ///
    /// A leading `-` selects descending order: `-control_number`.
    pub fn parse(input: &str) -> StorageResult<Self> {
        let (order, name) = match input.strip_prefix('-') {
            Some(rest) => (SortOrder::Desc, rest),
            None => (SortOrder::Asc, input),
        };

        let field = match name {
            "title" => SortField::Title,
            "control_number" => SortField::ControlNumber,
            other => {
                return Err(IndexError::UnknownSortField {
                    field: other.to_string(),
                }
                .into());
            }
        };

        Ok(Self { field, order })
    }
}

/// A search query over a named index.
///
/// Built with the fluent `with_*` methods:
///
/// ```
/// use docket_persistence::types::{SearchQuery, SortDirective, SortField};
///
/// let query = SearchQuery::new()
///     .with_type_filter("report")
///     .with_sort(SortDirective::asc(SortField::ControlNumber))
///     .with_page(1, 10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Free-text term matched against the indexed title.
    pub q: Option<String>,

    /// Terms filter on the document type; empty means no filtering.
    pub type_filter: Vec<String>,

    /// Sort directive; `None` leaves result order to the backend.
    pub sort: Option<SortDirective>,

    /// 1-based page number (0 is treated as 1).
    pub page: usize,

    /// Page size; 0 means the backend default of 10.
    pub size: usize,
}

impl SearchQuery {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the free-text term.
    pub fn with_q(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    /// Adds a document-type filter term.
    pub fn with_type_filter(mut self, doc_type: impl Into<String>) -> Self {
        self.type_filter.push(doc_type.into());
        self
    }

    /// Sets the sort directive.
    pub fn with_sort(mut self, sort: SortDirective) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sets page number and size.
    pub fn with_page(mut self, page: usize, size: usize) -> Self {
        self.page = page;
        self.size = size;
        self
    }

    /// Effective 1-based page number.
    pub fn effective_page(&self) -> usize {
        self.page.max(1)
    }

    /// Effective page size, clamped to `max_size`.
    pub fn effective_size(&self, max_size: usize) -> usize {
        let size = if self.size == 0 { 10 } else { self.size };
        size.min(max_size)
    }
}

/// One search hit: a record identifier plus its indexed payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The record's internal identifier.
    pub record_id: RecordId,
    /// The denormalized payload as it was at index time.
    pub payload: Value,
}

/// One bucket of a terms aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermBucket {
    /// The term value (e.g. a document type).
    pub value: String,
    /// Number of matching documents.
    pub count: u64,
}

/// A page of search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    /// The hits on this page, in sort order.
    pub hits: Vec<SearchHit>,
    /// Total number of documents matching the query across all pages.
    pub total: u64,
    /// Terms aggregation over the document type, computed on the filtered
    /// result set before pagination.
    pub type_buckets: Vec<TermBucket>,
}

/// A denormalized index document, keyed by record identifier.
///
/// The payload is copied verbatim; `title`, `suggest_title`,
/// `control_number` and `doc_type` are extracted at index time so the
/// backend can sort, filter, facet and suggest without touching the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDocument {
    /// The record this document was built from.
    pub record_id: RecordId,
    /// The record payload at index time.
    pub payload: Value,
    /// Extracted `title` field, if present.
    pub title: Option<String>,
    /// Completion-suggester source, derived from the title.
    pub suggest_title: Option<String>,
    /// Extracted `control_number`, if present in the payload.
    pub control_number: Option<String>,
    /// Extracted `type` field, if present.
    pub doc_type: Option<String>,
    /// When the document was (re)built.
    pub indexed_at: DateTime<Utc>,
}

impl IndexDocument {
    /// Builds an index document from a stored record.
    pub fn from_record(record: &StoredRecord) -> Self {
        let payload = record.payload();
        let title = payload
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string);
        let control_number = payload.get("control_number").map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        let doc_type = payload
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            record_id: record.id(),
            payload: payload.clone(),
            suggest_title: title.clone(),
            title,
            control_number,
            doc_type,
            indexed_at: Utc::now(),
        }
    }

    /// Overrides the control number (used when it is resolved from the
    /// identifier registry rather than the payload).
    pub fn with_control_number(mut self, control_number: impl Into<String>) -> Self {
        self.control_number = Some(control_number.into());
        self
    }
}
