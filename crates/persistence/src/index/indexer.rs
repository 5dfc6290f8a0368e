//! The record indexer.
//!
//! Copies a record's current payload into the search index, keyed by the
//! record's identifier. Indexing is idempotent: re-indexing a record
//! replaces its previous document. Nothing here runs automatically; callers
//! decide when a record is (re)indexed, so index documents can go stale if
//! the underlying record changes without a new indexing call.

use std::sync::Arc;

use crate::error::{RecordError, StorageError, StorageResult};
use crate::store::{PidStore, RecordStore, SearchIndex};
use crate::types::{IndexDocument, RecordId};

/// The scheme whose registered identifier doubles as the record's control
/// number when the payload does not carry one.
const CONTROL_NUMBER_SCHEME: &str = "recid";

/// Copies record payloads into a named search index.
pub struct RecordIndexer<S> {
    store: Arc<S>,
    index_name: String,
}

impl<S> RecordIndexer<S>
where
    S: RecordStore + PidStore + SearchIndex,
{
    /// Creates an indexer writing to `index_name`.
    pub fn new(store: Arc<S>, index_name: impl Into<String>) -> Self {
        Self {
            store,
            index_name: index_name.into(),
        }
    }

    /// Returns the name of the index this indexer writes to.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Fetches the record's current payload and writes/replaces its index
    /// document.
    ///
    /// When the payload carries no `control_number`, the record's registered
    /// `recid` identifier (if any) is used instead, so that identifier-based
    /// sorting works for records minted the usual way.
    ///
    /// # Errors
    ///
    /// * `RecordError::NotFound` - the record does not exist or is deleted
    pub async fn index_by_id(&self, id: RecordId) -> StorageResult<()> {
        let record = self
            .store
            .read(id)
            .await?
            .ok_or(RecordError::NotFound { id })?;

        let mut document = IndexDocument::from_record(&record);
        if document.control_number.is_none() {
            document.control_number = self.registered_control_number(id).await?;
        }

        self.store.write_document(&self.index_name, document).await?;
        tracing::info!(index = %self.index_name, record_id = %id, "record indexed");
        Ok(())
    }

    /// Removes the record's document from the index.
    ///
    /// Returns `true` if a document was removed.
    pub async fn delete_by_id(&self, id: RecordId) -> StorageResult<bool> {
        self.store.delete_document(&self.index_name, id).await
    }

    /// Indexes a batch of records, collecting per-record failures instead of
    /// stopping at the first.
    pub async fn bulk_index(&self, ids: &[RecordId]) -> BulkIndexOutcome {
        let mut outcome = BulkIndexOutcome::default();
        for &id in ids {
            match self.index_by_id(id).await {
                Ok(()) => outcome.indexed.push(id),
                Err(err) => {
                    tracing::warn!(record_id = %id, error = %err, "indexing failed");
                    outcome.failures.push((id, err));
                }
            }
        }
        outcome
    }

    async fn registered_control_number(&self, id: RecordId) -> StorageResult<Option<String>> {
        let pids = self.store.pids_for_record(id).await?;
        Ok(pids
            .iter()
            .find(|pid| pid.scheme() == CONTROL_NUMBER_SCHEME && pid.is_registered())
            .map(|pid| pid.pid_value().to_string()))
    }
}

/// Result of a [`RecordIndexer::bulk_index`] call.
#[derive(Default)]
pub struct BulkIndexOutcome {
    /// Records whose documents were written.
    pub indexed: Vec<RecordId>,
    /// Records that failed, with the error for each.
    pub failures: Vec<(RecordId, StorageError)>,
}

impl BulkIndexOutcome {
    /// Returns `true` if every record was indexed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::sqlite::SqliteBackend;
    use crate::types::{PidStatus, SearchQuery};
    use serde_json::json;

    const INDEX: &str = "testrecords-testrecord-v1.0.0";

    fn indexer() -> (Arc<SqliteBackend>, RecordIndexer<SqliteBackend>) {
        let backend = Arc::new(SqliteBackend::in_memory().unwrap());
        backend.init_schema().unwrap();
        let indexer = RecordIndexer::new(Arc::clone(&backend), INDEX);
        (backend, indexer)
    }

    #[tokio::test]
    async fn test_index_copies_payload() {
        let (backend, indexer) = indexer();
        let record = backend
            .create(json!({"title": "Awesome meeting report", "type": "report"}), None)
            .await
            .unwrap();

        indexer.index_by_id(record.id()).await.unwrap();

        let page = backend.search(INDEX, &SearchQuery::new()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.hits[0].payload, *record.payload());
    }

    #[tokio::test]
    async fn test_reindex_is_idempotent() {
        let (backend, indexer) = indexer();
        let record = backend.create(json!({"type": "report"}), None).await.unwrap();

        indexer.index_by_id(record.id()).await.unwrap();
        indexer.index_by_id(record.id()).await.unwrap();

        assert_eq!(backend.document_count(INDEX).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_index_missing_record_fails() {
        let (_backend, indexer) = indexer();

        let err = indexer.index_by_id(RecordId::new()).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Record(RecordError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_control_number_from_registered_pid() {
        let (backend, indexer) = indexer();
        let record = backend
            .create(json!({"title": "Furniture order", "type": "order"}), None)
            .await
            .unwrap();
        backend
            .mint("recid", "2", "rec", record.id(), PidStatus::Registered)
            .await
            .unwrap();

        indexer.index_by_id(record.id()).await.unwrap();

        // The document sorts under the pid value even though the payload
        // carries no control_number.
        let page = backend
            .search(
                INDEX,
                &SearchQuery::new()
                    .with_sort(crate::types::SortDirective::parse("control_number").unwrap()),
            )
            .await
            .unwrap();
        assert_eq!(page.hits.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_until_reindexed() {
        let (backend, indexer) = indexer();
        let record = backend.create(json!({"title": "v1"}), None).await.unwrap();
        indexer.index_by_id(record.id()).await.unwrap();

        // Updating the record does not touch the index.
        backend.update(&record, json!({"title": "v2"})).await.unwrap();
        let page = backend.search(INDEX, &SearchQuery::new()).await.unwrap();
        assert_eq!(page.hits[0].payload["title"], "v1");

        // Re-indexing refreshes the document.
        indexer.index_by_id(record.id()).await.unwrap();
        let page = backend.search(INDEX, &SearchQuery::new()).await.unwrap();
        assert_eq!(page.hits[0].payload["title"], "v2");
    }

    #[tokio::test]
    async fn test_bulk_index_collects_failures() {
        let (backend, indexer) = indexer();
        let record = backend.create(json!({}), None).await.unwrap();
        let missing = RecordId::new();

        let outcome = indexer.bulk_index(&[record.id(), missing]).await;

        assert!(!outcome.is_complete());
        assert_eq!(outcome.indexed, vec![record.id()]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, missing);
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let (backend, indexer) = indexer();
        let record = backend.create(json!({}), None).await.unwrap();
        indexer.index_by_id(record.id()).await.unwrap();

        assert!(indexer.delete_by_id(record.id()).await.unwrap());
        assert_eq!(backend.document_count(INDEX).await.unwrap(), 0);
    }
}
