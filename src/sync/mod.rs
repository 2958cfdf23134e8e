//! Synchronization service for Inventorist.
//!
//! This module provides the [`SyncService`] struct which reconciles the
//! local [`RecordStore`] with a remote backend shared by every device of
//! the user:
//! - Push uploads the change log in mutation order
//! - Pull fetches everybody's changes through a persisted cursor
//! - Conflicts are resolved by [`conflict::resolve`] and reported, never raised
//! - A background task syncs periodically and backs off while offline
//!
//! Sync never blocks local work: while the remote is unreachable local
//! mutations keep committing and stay queued.

mod background;
pub mod conflict;
mod pull;
mod push;

pub use background::SyncHandle;
pub use conflict::{ConflictOutcome, Resolution};

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::backend::RemoteBackend;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::record::{ChangeOperation, RecordKind};
use crate::store::RecordStore;
use crate::utils::datetime;

/// Summary of one push, pull or full sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Local changes accepted by the remote.
    pub pushed: usize,
    /// Remote changes that modified local data.
    pub pulled: usize,
    /// Remote changes that needed no local write (own echoes, repeats).
    pub skipped: usize,
    /// Records whose local and remote versions diverged.
    pub conflicts: Vec<ConflictOutcome>,
}

impl SyncReport {
    pub fn merge(&mut self, other: SyncReport) {
        self.pushed += other.pushed;
        self.pulled += other.pulled;
        self.skipped += other.skipped;
        self.conflicts.extend(other.conflicts);
    }
}

/// Represents the current status of the synchronization service.
///
/// Published through a `watch` channel so a UI can render a non-blocking
/// status indicator.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    /// No sync has run yet
    Idle,
    /// A sync pass is currently running
    InProgress,
    /// The last sync pass completed
    Success { report: SyncReport, at: DateTime<Utc> },
    /// The remote could not be reached; local changes stay queued
    Unavailable { message: String },
    /// The last sync pass failed locally
    Error { message: String },
}

/// How a local deletion reached the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemotePropagation {
    /// The remote accepted every deletion.
    Pushed,
    /// At least one deletion is still queued and will go out on a later sync.
    Queued,
}

/// Service that reconciles the local store with the remote backend.
///
/// Cloning is cheap; clones share locks and status.
#[derive(Clone)]
pub struct SyncService {
    store: RecordStore,
    backend: Arc<dyn RemoteBackend>,
    config: SyncConfig,
    sync_lock: Arc<Mutex<()>>,
    push_lock: Arc<Mutex<()>>,
    pull_lock: Arc<Mutex<()>>,
    status: Arc<watch::Sender<SyncStatus>>,
}

impl SyncService {
    pub fn new(store: RecordStore, backend: Arc<dyn RemoteBackend>, config: SyncConfig) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        Self {
            store,
            backend,
            config,
            sync_lock: Arc::new(Mutex::new(())),
            push_lock: Arc::new(Mutex::new(())),
            pull_lock: Arc::new(Mutex::new(())),
            status: Arc::new(status),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn backend(&self) -> Arc<dyn RemoteBackend> {
        self.backend.clone()
    }

    /// Latest published status.
    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Receive every status change.
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Checks if a sync pass is currently running.
    pub fn is_syncing(&self) -> bool {
        matches!(*self.status.borrow(), SyncStatus::InProgress)
    }

    /// Queue a change for push outside of a regular store mutation.
    ///
    /// Store mutations queue their own changes; this is for replaying a
    /// record explicitly, e.g. after restoring data from a backup.
    pub async fn enqueue_local_change(&self, kind: RecordKind, id: Uuid, operation: ChangeOperation) -> Result<()> {
        self.store.enqueue_change(kind, id, operation).await?;
        Ok(())
    }

    /// Performs a full synchronization: push, then pull.
    ///
    /// Only one pass runs at a time; a second caller waits for the running
    /// pass to finish and then runs its own.
    ///
    /// # Errors
    /// - `SyncUnavailable` if the remote can't be reached (changes stay queued)
    /// - `Persistence` if the local store failed
    pub async fn sync(&self) -> Result<SyncReport> {
        let _pass = self.sync_lock.lock().await;
        self.status.send_replace(SyncStatus::InProgress);
        info!("🔄 Starting sync with '{}' backend...", self.backend.backend_type());

        let result = self.perform_sync().await;
        match &result {
            Ok(report) => {
                info!(
                    "✅ Sync completed: {} pushed, {} pulled, {} skipped, {} conflict(s)",
                    report.pushed,
                    report.pulled,
                    report.skipped,
                    report.conflicts.len()
                );
                self.status.send_replace(SyncStatus::Success {
                    report: report.clone(),
                    at: datetime::now_millis(),
                });
            }
            Err(e) if e.is_unavailable() => {
                warn!("📴 {}", e);
                self.status.send_replace(SyncStatus::Unavailable { message: e.to_string() });
            }
            Err(e) => {
                error!("❌ Sync failed: {}", e);
                self.status.send_replace(SyncStatus::Error { message: e.to_string() });
            }
        }
        result
    }

    async fn perform_sync(&self) -> Result<SyncReport> {
        let mut report = self.push().await?;
        report.merge(self.pull().await?);
        Ok(report)
    }

    /// Push the queued deletions of `ids` right away.
    ///
    /// The deletions are already committed and queued locally, so an
    /// unreachable remote is not an error here: they go out on a later sync.
    pub async fn propagate_deletions(&self, ids: &[Uuid]) -> RemotePropagation {
        if ids.is_empty() {
            return RemotePropagation::Pushed;
        }
        if let Err(e) = self.push().await {
            warn!("📴 {} deletion(s) queued for a later sync: {}", ids.len(), e);
            return RemotePropagation::Queued;
        }

        for id in ids {
            match self.store.has_pending_changes(*id).await {
                Ok(false) => {}
                Ok(true) => return RemotePropagation::Queued,
                Err(e) => {
                    warn!("Could not check queued changes of {}: {}", id, e);
                    return RemotePropagation::Queued;
                }
            }
        }
        info!("☁️ Propagated {} deletion(s)", ids.len());
        RemotePropagation::Pushed
    }
}
