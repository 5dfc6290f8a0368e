//! Docket Persistence Layer
//!
//! This crate stores the three kinds of state the Docket record registry
//! needs: opaque JSON **records**, **persistent identifiers** mapping
//! external string ids onto records, and denormalized **index documents**
//! for search. A single SQLite backend implements all three behind trait
//! seams, so the REST layer and the indexer stay backend-agnostic.
//!
//! # Architecture
//!
//! - [`types`] - stored records, persistent identifiers, search types
//! - [`error`] - error types for all operations
//! - [`store`] - the [`RecordStore`], [`PidStore`] and [`SearchIndex`] traits
//! - [`backends`] - the SQLite implementation (in-memory and file modes)
//! - [`index`] - the [`RecordIndexer`] copying record payloads into an index
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use docket_persistence::backends::sqlite::SqliteBackend;
//! use docket_persistence::index::RecordIndexer;
//! use docket_persistence::store::PidStore;
//! use docket_persistence::types::PidStatus;
//! use serde_json::json;
//!
//! # async fn example() -> docket_persistence::error::StorageResult<()> {
//! let backend = Arc::new(SqliteBackend::in_memory()?);
//! backend.init_schema()?;
//!
//! // Batched writes commit explicitly.
//! let uow = backend.unit_of_work()?;
//! let record = uow.create_record(
//!     json!({"title": "Awesome meeting report", "type": "report"}),
//!     None,
//! )?;
//! uow.commit()?;
//!
//! // Mint an external identifier for the record.
//! let pid = backend
//!     .mint("recid", "1", "rec", record.id(), PidStatus::Registered)
//!     .await?;
//! assert!(pid.is_registered());
//!
//! // Copy the payload into the search index.
//! let indexer = RecordIndexer::new(Arc::clone(&backend), "records-record-v1.0.0");
//! indexer.index_by_id(record.id()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Unit of work
//!
//! Mutations through the async traits are durable when they return. For the
//! explicit-commit model - several writes made visible in one step - use
//! [`SqliteBackend::unit_of_work`](backends::sqlite::SqliteBackend::unit_of_work):
//! writes through the guard are invisible to other connections until
//! `commit()`, and dropping the guard uncommitted rolls them back.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod error;
pub mod index;
pub mod store;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use index::RecordIndexer;
pub use store::{PidStore, RecordStore, SearchIndex};
pub use types::{PersistentIdentifier, PidStatus, RecordId, SearchQuery, StoredRecord};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
