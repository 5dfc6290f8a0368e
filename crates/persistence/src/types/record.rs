//! Stored record types.
//!
//! This module defines the [`StoredRecord`] type, which wraps an opaque JSON
//! payload with persistence metadata such as revision and timestamps, and the
//! [`RecordId`] identifier records are keyed by.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Internal identifier of a stored record.
///
/// A `RecordId` is a random v4 UUID. It is assigned at creation time and
/// never changes for the lifetime of the record; updates only touch the
/// payload and revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A record with persistence metadata.
///
/// `StoredRecord` wraps an opaque JSON payload (a mapping of field names to
/// values) along with the metadata the store maintains:
///
/// - **Identity**: the generated [`RecordId`], immutable once created
/// - **Revision**: a counter incremented on every update
/// - **Timestamps**: creation, modification and (soft) deletion times
///
/// # Examples
///
/// ```
/// use docket_persistence::types::StoredRecord;
/// use serde_json::json;
///
/// let record = StoredRecord::new(None, json!({
///     "title": "Awesome meeting report",
///     "type": "report",
/// }));
///
/// assert_eq!(record.revision(), 1);
/// assert!(!record.is_deleted());
/// assert_eq!(record.payload()["type"], "report");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    /// The record's internal identifier.
    id: RecordId,

    /// The revision counter (starts at 1, incremented on each update).
    revision: u64,

    /// The record payload as JSON.
    payload: Value,

    /// When the record was first created.
    created_at: DateTime<Utc>,

    /// When the record was last modified.
    updated_at: DateTime<Utc>,

    /// If the record has been deleted, when it was deleted.
    deleted_at: Option<DateTime<Utc>>,
}

impl StoredRecord {
    /// Creates a new record with revision 1.
    ///
    /// When `id` is `None`, a fresh [`RecordId`] is generated.
    pub fn new(id: Option<RecordId>, payload: Value) -> Self {
        let now = Utc::now();
        Self {
            id: id.unwrap_or_default(),
            revision: 1,
            payload,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Reconstructs a record from storage columns.
    pub fn from_storage(
        id: RecordId,
        revision: u64,
        payload: Value,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            revision,
            payload,
            created_at,
            updated_at,
            deleted_at,
        }
    }

    /// Returns the record's internal identifier.
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Returns the revision counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the record payload as JSON.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Consumes self and returns the payload.
    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// Returns when the record was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the record was last modified.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns when the record was deleted, if applicable.
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns `true` if the record has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Creates the next revision of this record with a replaced payload.
    pub fn new_revision(self, payload: Value) -> Self {
        Self {
            id: self.id,
            revision: self.revision + 1,
            payload,
            created_at: self.created_at,
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    /// Marks this record as deleted, bumping the revision.
    pub fn mark_deleted(self) -> Self {
        let now = Utc::now();
        Self {
            id: self.id,
            revision: self.revision + 1,
            payload: self.payload,
            created_at: self.created_at,
            updated_at: now,
            deleted_at: Some(now),
        }
    }
}
