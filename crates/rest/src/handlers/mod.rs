//! HTTP request handlers.
//!
//! One module per interaction, all generic over the storage backend. The
//! shared [`resolve_live`] helper turns an external identifier into the
//! record it points at, with 404/410 semantics.

mod create;
mod delete;
mod health;
mod read;
mod search;
mod suggest;
mod update;

pub use create::create_handler;
pub use delete::delete_handler;
pub use health::health_handler;
pub use read::read_handler;
pub use search::search_handler;
pub use suggest::suggest_handler;
pub use update::update_handler;

use docket_persistence::error::{PidError, StorageError};
use docket_persistence::store::{PidStore, RecordStore, SearchIndex};
use docket_persistence::types::{PersistentIdentifier, StoredRecord};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// The identifier scheme records are addressed by.
pub(crate) const RECID_SCHEME: &str = "recid";

/// The object type tag identifiers carry for records.
pub(crate) const RECORD_OBJECT_TYPE: &str = "rec";

/// Resolves an external identifier to a live record.
///
/// Returns 404 for unknown identifiers, 410 for deleted identifiers and for
/// identifiers whose record has been deleted.
pub(crate) async fn resolve_live<S>(
    state: &AppState<S>,
    pid_value: &str,
) -> ApiResult<(PersistentIdentifier, StoredRecord)>
where
    S: RecordStore + PidStore + SearchIndex,
{
    let pid = state
        .backend()
        .resolve(RECID_SCHEME, pid_value)
        .await
        .map_err(|err| match err {
            StorageError::Pid(PidError::NotFound { .. }) => ApiError::NotFound {
                pid: pid_value.to_string(),
            },
            other => other.into(),
        })?;

    if pid.is_deleted() {
        return Err(ApiError::Gone {
            pid: pid_value.to_string(),
        });
    }

    let object_id = pid.object_id().ok_or_else(|| ApiError::Internal {
        message: format!("identifier {pid_value} is not assigned to a record"),
    })?;

    let record = state
        .backend()
        .read(object_id)
        .await?
        .ok_or_else(|| ApiError::Gone {
            pid: pid_value.to_string(),
        })?;

    Ok((pid, record))
}
