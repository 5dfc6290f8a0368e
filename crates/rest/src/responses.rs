//! Response body shapes.
//!
//! Every record-returning endpoint wraps the stored payload in the same
//! envelope: the external identifier, persistence metadata and links.

use chrono::{DateTime, Utc};
use docket_persistence::types::{PersistentIdentifier, RecordId, StoredRecord, TermBucket};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Links attached to a record envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordLinks {
    /// Canonical URL of the record.
    #[serde(rename = "self")]
    pub self_link: String,
}

/// A record as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEnvelope {
    /// The external identifier the record is addressed by.
    pub id: String,
    /// The record's internal identifier.
    pub record_id: RecordId,
    /// The record's revision counter.
    pub revision: u64,
    /// When the record was created.
    pub created: DateTime<Utc>,
    /// When the record was last modified.
    pub updated: DateTime<Utc>,
    /// The record payload.
    pub metadata: Value,
    /// Navigation links.
    pub links: RecordLinks,
}

impl RecordEnvelope {
    /// Builds the envelope for a record addressed by `pid`.
    pub fn new(pid: &PersistentIdentifier, record: &StoredRecord, base_url: &str) -> Self {
        Self {
            id: pid.pid_value().to_string(),
            record_id: record.id(),
            revision: record.revision(),
            created: record.created_at(),
            updated: record.updated_at(),
            metadata: record.payload().clone(),
            links: RecordLinks {
                self_link: record_url(base_url, pid.pid_value()),
            },
        }
    }
}

/// Returns the canonical URL for a record addressed by its external id.
pub fn record_url(base_url: &str, pid_value: &str) -> String {
    format!("{}/records/{}", base_url.trim_end_matches('/'), pid_value)
}

/// One hit in a search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHitBody {
    /// The record's internal identifier.
    pub record_id: RecordId,
    /// The indexed payload.
    pub metadata: Value,
}

/// The `hits` object of a search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHitsBody {
    /// Hits on this page, in sort order.
    pub hits: Vec<SearchHitBody>,
    /// Total matches across all pages.
    pub total: u64,
}

/// The terms aggregation over the document type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeAggregation {
    /// One bucket per distinct type value.
    pub buckets: Vec<TermBucket>,
}

/// Aggregations attached to a search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregations {
    /// The terms aggregation on the `type` field.
    #[serde(rename = "type")]
    pub doc_type: TypeAggregation,
}

/// Pagination links of a search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLinks {
    /// This page.
    #[serde(rename = "self")]
    pub self_link: String,
    /// The next page, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// The previous page, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

/// The body of a search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching records.
    pub hits: SearchHitsBody,
    /// Facet aggregations.
    pub aggregations: Aggregations,
    /// Pagination links.
    pub links: PageLinks,
}

/// The body of a suggest response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestResponse {
    /// The prefix that was completed.
    pub text: String,
    /// Completions, best first.
    pub suggestions: Vec<String>,
}
