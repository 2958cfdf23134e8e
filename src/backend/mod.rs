//! Remote backend abstraction for multi-device sync.
//!
//! This module defines the interface every remote must implement, along
//! with the change representation exchanged over it and its error type.
//! The remote is an append-only change feed: devices push their local
//! changes and pull everybody's changes back through an opaque cursor.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InventoryError;
use crate::record::{RecordData, RecordKind};

pub mod factory;
pub mod file;
pub mod ledger;
pub mod memory;

/// Common error types for backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Backend error: {0}")]
    Other(String),
}

impl From<BackendError> for InventoryError {
    fn from(err: BackendError) -> Self {
        // Whatever the remote failure, local data is untouched and the queue
        // is kept; callers treat it as "sync paused".
        InventoryError::SyncUnavailable(err.to_string())
    }
}

/// What a remote change does to its record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum RemotePayload {
    /// Full record state.
    Upsert(RecordData),
    /// The record was deleted. Terminal.
    Tombstone,
}

/// One record-level change as stored on the remote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteChange {
    pub kind: RecordKind,
    pub id: Uuid,
    pub modified_date: DateTime<Utc>,
    pub payload: RemotePayload,
}

impl RemoteChange {
    pub fn upsert(record: RecordData) -> Self {
        Self {
            kind: record.kind(),
            id: record.id(),
            modified_date: record.modified_date(),
            payload: RemotePayload::Upsert(record),
        }
    }

    pub fn tombstone(kind: RecordKind, id: Uuid, deleted_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            id,
            modified_date: deleted_at,
            payload: RemotePayload::Tombstone,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self.payload, RemotePayload::Tombstone)
    }

    pub fn record(&self) -> Option<&RecordData> {
        match &self.payload {
            RemotePayload::Upsert(record) => Some(record),
            RemotePayload::Tombstone => None,
        }
    }
}

/// Why the remote refused a pushed change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The remote holds a newer version.
    Stale,
    /// The record was deleted on the remote.
    Deleted,
}

/// Outcome of one pushed change.
#[derive(Clone, Debug, PartialEq)]
pub enum PushStatus {
    Accepted,
    /// Not applied. `current` is the version the remote keeps.
    Rejected { reason: RejectReason, current: RemoteChange },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PushResult {
    pub id: Uuid,
    pub status: PushStatus,
}

/// A page of remote changes.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ChangeBatch {
    pub changes: Vec<RemoteChange>,
    /// Cursor to resume from after applying `changes`.
    pub cursor: String,
    pub has_more: bool,
}

/// Backend trait that all sync remotes must implement.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Returns the backend type identifier (e.g., "memory", "file").
    fn backend_type(&self) -> &str;

    /// Push changes in order. One result per change, in the same order.
    async fn push(&self, changes: Vec<RemoteChange>) -> Result<Vec<PushResult>, BackendError>;

    /// Fetch up to `limit` changes recorded after `cursor` (`None` = from the start).
    async fn fetch_changes(&self, cursor: Option<&str>, limit: usize) -> Result<ChangeBatch, BackendError>;
}
