//! Persistent identifier types.
//!
//! A persistent identifier maps an external-facing string identifier (for
//! example the numeric `recid` values exposed in URLs) to an internal
//! [`RecordId`], together with a lifecycle status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PidError, StorageResult};
use crate::types::RecordId;

/// Lifecycle status of a persistent identifier.
///
/// Stored as single-character codes; the codes are part of the on-disk
/// format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PidStatus {
    /// The identifier has been created but not yet reserved or registered.
    New,
    /// The identifier is reserved and cannot be minted by anyone else.
    Reserved,
    /// The identifier is registered and publicly resolvable.
    Registered,
    /// The identifier redirects to another identifier.
    Redirected,
    /// The identifier (or the object it points to) has been deleted.
    Deleted,
}

impl PidStatus {
    /// Returns the single-character storage code.
    pub const fn code(self) -> &'static str {
        match self {
            PidStatus::New => "N",
            PidStatus::Reserved => "K",
            PidStatus::Registered => "R",
            PidStatus::Redirected => "M",
            PidStatus::Deleted => "D",
        }
    }
}

impl fmt::Display for PidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PidStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N" => Ok(PidStatus::New),
            "K" => Ok(PidStatus::Reserved),
            "R" => Ok(PidStatus::Registered),
            "M" => Ok(PidStatus::Redirected),
            "D" => Ok(PidStatus::Deleted),
            other => Err(format!("unknown pid status code: {other}")),
        }
    }
}

/// An external-facing stable identifier mapped to an internal record.
///
/// One identifier entry refers to exactly one record at a time; a record may
/// have zero or more identifiers pointing to it. The pair
/// `(scheme, pid_value)` is unique across the store.
///
/// # Examples
///
/// ```
/// use docket_persistence::types::{PersistentIdentifier, PidStatus, RecordId};
///
/// let record_id = RecordId::new();
/// let pid = PersistentIdentifier::new("recid", "1", "rec", record_id, PidStatus::Registered);
///
/// assert_eq!(pid.scheme(), "recid");
/// assert_eq!(pid.pid_value(), "1");
/// assert!(pid.is_registered());
/// assert_eq!(pid.object_id(), Some(record_id));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistentIdentifier {
    /// The identifier scheme (e.g. "recid", "doi").
    scheme: String,

    /// The external string identifier, unique per scheme.
    pid_value: String,

    /// Type tag of the referenced object (e.g. "rec").
    object_type: String,

    /// The referenced record, if the identifier has been assigned.
    object_id: Option<RecordId>,

    /// Lifecycle status.
    status: PidStatus,

    /// When the identifier was created.
    created_at: DateTime<Utc>,

    /// When the identifier was last modified.
    updated_at: DateTime<Utc>,
}

impl PersistentIdentifier {
    /// Creates an identifier entry assigned to a record.
    pub fn new(
        scheme: impl Into<String>,
        pid_value: impl Into<String>,
        object_type: impl Into<String>,
        object_id: RecordId,
        status: PidStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            scheme: scheme.into(),
            pid_value: pid_value.into(),
            object_type: object_type.into(),
            object_id: Some(object_id),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs an identifier from storage columns.
    pub fn from_storage(
        scheme: impl Into<String>,
        pid_value: impl Into<String>,
        object_type: impl Into<String>,
        object_id: Option<RecordId>,
        status: PidStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            pid_value: pid_value.into(),
            object_type: object_type.into(),
            object_id,
            status,
            created_at,
            updated_at,
        }
    }

    /// Returns the identifier scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the external string identifier.
    pub fn pid_value(&self) -> &str {
        &self.pid_value
    }

    /// Returns the referenced object's type tag.
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Returns the referenced record identifier, if assigned.
    pub fn object_id(&self) -> Option<RecordId> {
        self.object_id
    }

    /// Returns the lifecycle status.
    pub fn status(&self) -> PidStatus {
        self.status
    }

    /// Returns when the identifier was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the identifier was last modified.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` if the identifier is registered.
    pub fn is_registered(&self) -> bool {
        self.status == PidStatus::Registered
    }

    /// Returns `true` if the identifier has been deleted.
    pub fn is_deleted(&self) -> bool {
        self.status == PidStatus::Deleted
    }

    /// Checks whether a transition from the current status to `to` is legal.
    ///
    /// Registration is only allowed from `New` or `Reserved`; deletion is
    /// allowed from any state except `Deleted` itself.
    pub fn check_transition(&self, to: PidStatus) -> StorageResult<()> {
        let allowed = match to {
            PidStatus::Registered => {
                matches!(self.status, PidStatus::New | PidStatus::Reserved)
            }
            PidStatus::Deleted => self.status != PidStatus::Deleted,
            PidStatus::Reserved => self.status == PidStatus::New,
            PidStatus::Redirected => self.status == PidStatus::Registered,
            PidStatus::New => false,
        };

        if allowed {
            Ok(())
        } else {
            Err(PidError::InvalidTransition {
                scheme: self.scheme.clone(),
                pid_value: self.pid_value.clone(),
                from: self.status,
                to,
            }
            .into())
        }
    }
}
