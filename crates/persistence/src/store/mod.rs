//! Storage traits and abstractions.
//!
//! Three trait seams split the persistence surface by concern:
//!
//! - [`RecordStore`] - CRUD over stored records
//! - [`PidStore`] - minting and resolving persistent identifiers
//! - [`SearchIndex`] - writing and querying denormalized index documents
//!
//! The SQLite backend implements all three; the REST layer and the indexer
//! are generic over whichever subset they need.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageResult;
use crate::types::{
    IndexDocument, PersistentIdentifier, PidStatus, RecordId, SearchPage, SearchQuery,
    StoredRecord,
};

/// Core storage trait for records.
///
/// All mutating operations are durable when they return: each call runs in
/// its own transaction. For the explicit-commit batching model, see the
/// backend's unit-of-work API.
///
/// # Example
///
/// ```ignore
/// async fn example<S: RecordStore>(store: &S) -> StorageResult<()> {
///     let record = store
///         .create(serde_json::json!({"title": "Furniture order"}), None)
///         .await?;
///
///     let read = store.read(record.id()).await?;
///     assert!(read.is_some());
///
///     store.delete(record.id()).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Creates a new record with revision 1.
    ///
    /// When `id` is `None`, a fresh identifier is generated.
    ///
    /// # Errors
    ///
    /// * `RecordError::AlreadyExists` - a record with the given id exists
    async fn create(&self, payload: Value, id: Option<RecordId>) -> StorageResult<StoredRecord>;

    /// Reads a record by identifier.
    ///
    /// Soft-deleted records read as `None`.
    async fn read(&self, id: RecordId) -> StorageResult<Option<StoredRecord>>;

    /// Replaces a record's payload, bumping the revision.
    ///
    /// Optimistic: `current` carries the revision the caller last saw.
    ///
    /// # Errors
    ///
    /// * `RecordError::NotFound` - the record does not exist or is deleted
    /// * `RecordError::RevisionConflict` - the record was modified since
    ///   `current` was read
    async fn update(&self, current: &StoredRecord, payload: Value) -> StorageResult<StoredRecord>;

    /// Soft-deletes a record.
    ///
    /// # Errors
    ///
    /// * `RecordError::NotFound` - the record does not exist
    /// * `RecordError::Gone` - the record is already deleted
    async fn delete(&self, id: RecordId) -> StorageResult<()>;

    /// Counts live (non-deleted) records.
    async fn count(&self) -> StorageResult<u64>;

    /// Checks whether a live record exists.
    async fn exists(&self, id: RecordId) -> StorageResult<bool> {
        Ok(self.read(id).await?.is_some())
    }
}

/// Storage trait for persistent identifiers.
#[async_trait]
pub trait PidStore: Send + Sync {
    /// Creates an identifier entry for an existing record.
    ///
    /// # Errors
    ///
    /// * `PidError::AlreadyExists` - `(scheme, pid_value)` is already taken;
    ///   minting never overwrites
    /// * `PidError::MissingObject` - the referenced record does not exist
    async fn mint(
        &self,
        scheme: &str,
        pid_value: &str,
        object_type: &str,
        object_id: RecordId,
        status: PidStatus,
    ) -> StorageResult<PersistentIdentifier>;

    /// Looks up an identifier by scheme and value.
    ///
    /// Deleted identifiers resolve with their `Deleted` status so callers
    /// can distinguish "never existed" from "gone".
    ///
    /// # Errors
    ///
    /// * `PidError::NotFound` - no entry for `(scheme, pid_value)`
    async fn resolve(&self, scheme: &str, pid_value: &str)
    -> StorageResult<PersistentIdentifier>;

    /// Transitions an identifier to `Registered`.
    ///
    /// # Errors
    ///
    /// * `PidError::InvalidTransition` - only `New` and `Reserved`
    ///   identifiers can be registered
    async fn register(&self, scheme: &str, pid_value: &str)
    -> StorageResult<PersistentIdentifier>;

    /// Transitions an identifier to `Deleted`.
    async fn mark_deleted(
        &self,
        scheme: &str,
        pid_value: &str,
    ) -> StorageResult<PersistentIdentifier>;

    /// Returns the next free sequential numeric value for a scheme.
    ///
    /// Values start at `"1"`; non-numeric existing values are ignored.
    async fn next_pid_value(&self, scheme: &str) -> StorageResult<String>;

    /// Returns all identifiers pointing at a record.
    async fn pids_for_record(&self, id: RecordId) -> StorageResult<Vec<PersistentIdentifier>>;
}

/// Storage trait for the search index.
///
/// An index is a named collection of [`IndexDocument`]s keyed by record
/// identifier. Writing a document for an already-indexed record replaces
/// the previous document.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Writes or replaces the document for a record in the named index.
    async fn write_document(&self, index: &str, document: IndexDocument) -> StorageResult<()>;

    /// Removes the document for a record from the named index.
    ///
    /// Returns `true` if a document was removed.
    async fn delete_document(&self, index: &str, id: RecordId) -> StorageResult<bool>;

    /// Runs a search query against the named index.
    async fn search(&self, index: &str, query: &SearchQuery) -> StorageResult<SearchPage>;

    /// Returns up to `size` title completions for a prefix.
    async fn suggest(&self, index: &str, prefix: &str, size: usize)
    -> StorageResult<Vec<String>>;

    /// Counts the documents in the named index.
    async fn document_count(&self, index: &str) -> StorageResult<u64>;
}
