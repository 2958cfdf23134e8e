//! Error types surfaced by the inventory core.
//!
//! Every public operation of the record store, the ordering engine, the
//! selection coordinator and the sync service returns [`InventoryError`].
//! Sync conflicts are not errors. They are resolved
//! automatically, logged, and reported through
//! [`SyncReport`](crate::sync::SyncReport) instead of failing the caller.

use sea_orm::DbErr;
use uuid::Uuid;

use crate::record::RecordKind;

/// Errors returned by inventory operations.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// The operation referenced an identifier that does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: Uuid },

    /// The local store could not commit the change.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The remote backend could not be reached. Queued changes are kept.
    #[error("Sync backend unavailable: {0}")]
    SyncUnavailable(String),

    /// Some of the requested deletions committed, the rest did not.
    #[error("Deleted {} item(s), {} could not be deleted", .deleted.len(), .failed.len())]
    PartialDeletion { deleted: Vec<Uuid>, failed: Vec<Uuid> },

    /// A drag-reorder request that cannot be applied to the working sequence.
    #[error("Invalid reorder: {0}")]
    InvalidReorder(String),

    /// Record attributes that violate the data model.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Convenience alias used across the crate.
pub type Result<T, E = InventoryError> = std::result::Result<T, E>;

impl InventoryError {
    pub fn not_found(kind: RecordKind, id: Uuid) -> Self {
        Self::NotFound { kind, id }
    }

    /// Whether the error only means the remote is unreachable right now.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::SyncUnavailable(_))
    }
}

impl From<DbErr> for InventoryError {
    fn from(err: DbErr) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<anyhow::Error> for InventoryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Persistence(format!("{err:#}"))
    }
}
