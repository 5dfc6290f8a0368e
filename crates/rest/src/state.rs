//! Application state for the Docket REST API.
//!
//! This module defines the shared application state that is available to all
//! request handlers: the storage backend, the record indexer and the server
//! configuration.

use std::sync::Arc;

use docket_persistence::index::RecordIndexer;
use docket_persistence::store::{PidStore, RecordStore, SearchIndex};

use crate::config::{PermissionPolicy, SearchConfig, ServerConfig};

/// Shared application state for the REST API.
///
/// # Type Parameters
///
/// * `S` - The storage backend type (must implement [`RecordStore`],
///   [`PidStore`] and [`SearchIndex`])
pub struct AppState<S> {
    /// The storage backend.
    backend: Arc<S>,

    /// The indexer copying record payloads into the search index.
    indexer: Arc<RecordIndexer<S>>,

    /// Server configuration.
    config: Arc<ServerConfig>,

    /// Search-surface configuration (sort options, facets, suggester).
    search_config: Arc<SearchConfig>,
}

// Manually implement Clone since S is behind Arcs and doesn't need to be Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            indexer: Arc::clone(&self.indexer),
            config: Arc::clone(&self.config),
            search_config: Arc::clone(&self.search_config),
        }
    }
}

impl<S> AppState<S>
where
    S: RecordStore + PidStore + SearchIndex,
{
    /// Creates a new AppState with the given backend and configuration.
    ///
    /// The indexer is built over the same backend, writing to the index
    /// named in the configuration.
    pub fn new(backend: Arc<S>, config: ServerConfig) -> Self {
        let indexer = Arc::new(RecordIndexer::new(
            Arc::clone(&backend),
            config.index_name.clone(),
        ));
        Self {
            backend,
            indexer,
            config: Arc::new(config),
            search_config: Arc::new(SearchConfig::default()),
        }
    }

    /// Replaces the search-surface configuration.
    pub fn with_search_config(mut self, search_config: SearchConfig) -> Self {
        self.search_config = Arc::new(search_config);
        self
    }

    /// Returns a reference to the storage backend.
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Returns a reference to the record indexer.
    pub fn indexer(&self) -> &RecordIndexer<S> {
        &self.indexer
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns a reference to the search-surface configuration.
    pub fn search_config(&self) -> &SearchConfig {
        &self.search_config
    }

    /// Returns the per-verb permission policy.
    pub fn policy(&self) -> PermissionPolicy {
        self.config.policy()
    }

    /// Returns the base URL for the server.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Returns the default page size for search results.
    pub fn default_page_size(&self) -> usize {
        self.config.default_page_size
    }

    /// Returns the maximum page size for search results.
    pub fn max_page_size(&self) -> usize {
        self.config.max_page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docket_persistence::error::StorageResult;
    use docket_persistence::types::{
        IndexDocument, PersistentIdentifier, PidStatus, RecordId, SearchPage, SearchQuery,
        StoredRecord,
    };
    use serde_json::Value;

    // Mock storage for testing
    struct MockStorage;

    #[async_trait]
    impl RecordStore for MockStorage {
        fn backend_name(&self) -> &'static str {
            "mock"
        }

        async fn create(
            &self,
            _payload: Value,
            _id: Option<RecordId>,
        ) -> StorageResult<StoredRecord> {
            unimplemented!()
        }

        async fn read(&self, _id: RecordId) -> StorageResult<Option<StoredRecord>> {
            unimplemented!()
        }

        async fn update(
            &self,
            _current: &StoredRecord,
            _payload: Value,
        ) -> StorageResult<StoredRecord> {
            unimplemented!()
        }

        async fn delete(&self, _id: RecordId) -> StorageResult<()> {
            unimplemented!()
        }

        async fn count(&self) -> StorageResult<u64> {
            unimplemented!()
        }
    }

    #[async_trait]
    impl PidStore for MockStorage {
        async fn mint(
            &self,
            _scheme: &str,
            _pid_value: &str,
            _object_type: &str,
            _object_id: RecordId,
            _status: PidStatus,
        ) -> StorageResult<PersistentIdentifier> {
            unimplemented!()
        }

        async fn resolve(
            &self,
            _scheme: &str,
            _pid_value: &str,
        ) -> StorageResult<PersistentIdentifier> {
            unimplemented!()
        }

        async fn register(
            &self,
            _scheme: &str,
            _pid_value: &str,
        ) -> StorageResult<PersistentIdentifier> {
            unimplemented!()
        }

        async fn mark_deleted(
            &self,
            _scheme: &str,
            _pid_value: &str,
        ) -> StorageResult<PersistentIdentifier> {
            unimplemented!()
        }

        async fn next_pid_value(&self, _scheme: &str) -> StorageResult<String> {
            unimplemented!()
        }

        async fn pids_for_record(
            &self,
            _id: RecordId,
        ) -> StorageResult<Vec<PersistentIdentifier>> {
            unimplemented!()
        }
    }

    #[async_trait]
    impl SearchIndex for MockStorage {
        async fn write_document(
            &self,
            _index: &str,
            _document: IndexDocument,
        ) -> StorageResult<()> {
            unimplemented!()
        }

        async fn delete_document(&self, _index: &str, _id: RecordId) -> StorageResult<bool> {
            unimplemented!()
        }

        async fn search(&self, _index: &str, _query: &SearchQuery) -> StorageResult<SearchPage> {
            unimplemented!()
        }

        async fn suggest(
            &self,
            _index: &str,
            _prefix: &str,
            _size: usize,
        ) -> StorageResult<Vec<String>> {
            unimplemented!()
        }

        async fn document_count(&self, _index: &str) -> StorageResult<u64> {
            unimplemented!()
        }
    }

    #[test]
    fn test_app_state_creation() {
        let backend = Arc::new(MockStorage);
        let config = ServerConfig::default();
        let state = AppState::new(backend, config);

        assert_eq!(state.backend().backend_name(), "mock");
        assert_eq!(state.indexer().index_name(), "records-record-v1.0.0");
    }

    #[test]
    fn test_app_state_config_access() {
        let backend = Arc::new(MockStorage);
        let config = ServerConfig {
            base_url: "https://records.example.com".to_string(),
            default_page_size: 25,
            max_page_size: 500,
            ..Default::default()
        };
        let state = AppState::new(backend, config);

        assert_eq!(state.base_url(), "https://records.example.com");
        assert_eq!(state.default_page_size(), 25);
        assert_eq!(state.max_page_size(), 500);
    }

    #[test]
    fn test_app_state_clone() {
        let backend = Arc::new(MockStorage);
        let state = AppState::new(backend, ServerConfig::default());
        let cloned = state.clone();

        assert_eq!(state.base_url(), cloned.base_url());
    }
}
