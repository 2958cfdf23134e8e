//! Push: upload the local change log.

use chrono::{DateTime, Utc};
use log::{info, warn};
use uuid::Uuid;

use super::{ConflictOutcome, Resolution, SyncReport, SyncService};
use crate::backend::{PushStatus, RemoteChange};
use crate::error::{InventoryError, Result};
use crate::record::{ChangeOperation, RecordKind};
use crate::store::QueuedChange;

/// The queued changes of one record, folded into the change to send.
#[derive(Debug, Clone, PartialEq)]
struct OutgoingChange {
    kind: RecordKind,
    id: Uuid,
    operation: ChangeOperation,
    modified_date: DateTime<Utc>,
    seqs: Vec<i32>,
    last_seq: i32,
}

/// Fold queued changes per record, keeping first-mutation order. The latest
/// operation wins since an upsert always sends the current record state.
fn coalesce(queued: Vec<QueuedChange>) -> Vec<OutgoingChange> {
    let mut outgoing: Vec<OutgoingChange> = Vec::new();
    for change in queued {
        match outgoing.iter_mut().find(|entry| entry.id == change.id) {
            Some(entry) => {
                entry.operation = change.operation;
                entry.modified_date = change.modified_date;
                entry.seqs.push(change.seq);
                entry.last_seq = change.seq;
            }
            None => outgoing.push(OutgoingChange {
                kind: change.kind,
                id: change.id,
                operation: change.operation,
                modified_date: change.modified_date,
                seqs: vec![change.seq],
                last_seq: change.seq,
            }),
        }
    }
    outgoing
}

impl SyncService {
    /// Upload the changes queued so far.
    ///
    /// Changes queued while the push runs wait for the next one. A change
    /// the remote rejects is reconciled with the version the remote keeps
    /// instead of being retried as is. When that reconciliation changed
    /// items, the manual order is renumbered densely before returning.
    ///
    /// # Errors
    /// `SyncUnavailable` if the remote can't be reached; nothing is lost
    pub async fn push(&self) -> Result<SyncReport> {
        let _guard = self.push_lock.lock().await;
        let mut report = SyncReport::default();

        let Some(bound) = self.store.last_pending_seq().await? else {
            return Ok(report);
        };

        let mut after = 0;
        let mut items_changed = false;
        loop {
            let queued = self
                .store
                .pending_changes(after, bound, self.config.push_batch_size)
                .await?;
            let Some(last) = queued.last() else {
                break;
            };
            after = last.seq;
            items_changed |= self.push_batch(coalesce(queued), &mut report).await?;
        }

        if items_changed {
            let repaired = self.store.repair_sort_orders().await?;
            if repaired > 0 {
                info!("🔧 Renumbered {} item(s) after rejected push", repaired);
            }
        }

        if report.pushed > 0 {
            info!("📤 Pushed {} change(s)", report.pushed);
        }
        Ok(report)
    }

    /// Send one batch. Returns whether a rejection rewrote a local item.
    async fn push_batch(&self, batch: Vec<OutgoingChange>, report: &mut SyncReport) -> Result<bool> {
        let mut changes = Vec::with_capacity(batch.len());
        let mut sent = Vec::with_capacity(batch.len());
        for entry in batch {
            let change = match entry.operation {
                ChangeOperation::Delete => RemoteChange::tombstone(entry.kind, entry.id, entry.modified_date),
                ChangeOperation::Upsert => match self.store.record_data(entry.kind, entry.id).await? {
                    Some(record) => RemoteChange::upsert(record),
                    None => {
                        // Gone before it could be sent.
                        self.store.acknowledge_changes(entry.id, entry.last_seq).await?;
                        continue;
                    }
                },
            };
            changes.push(change);
            sent.push(entry);
        }
        if changes.is_empty() {
            return Ok(false);
        }

        let all_seqs: Vec<i32> = sent.iter().flat_map(|entry| entry.seqs.iter().copied()).collect();
        let results = match self.backend.push(changes).await {
            Ok(results) => results,
            Err(e) => {
                self.store.record_push_failure(&all_seqs, &e.to_string()).await?;
                return Err(e.into());
            }
        };
        if results.len() != sent.len() {
            let message = format!("remote answered {} of {} pushed changes", results.len(), sent.len());
            self.store.record_push_failure(&all_seqs, &message).await?;
            return Err(InventoryError::SyncUnavailable(message));
        }

        let mut items_changed = false;
        for (entry, result) in sent.into_iter().zip(results) {
            match result.status {
                PushStatus::Accepted => {
                    self.store.acknowledge_changes(entry.id, entry.last_seq).await?;
                    report.pushed += 1;
                }
                PushStatus::Rejected { reason, current } => {
                    warn!("⚠️ Remote rejected {} {} ({:?})", entry.kind, entry.id, reason);
                    let applied = self.store.apply_remote_change(&current).await?;
                    items_changed |= applied.changed && applied.kind == RecordKind::Item;
                    if applied.resolution == Resolution::KeepLocal {
                        // Edited again since it was sent; the newer version goes next time.
                        self.store
                            .record_push_failure(&entry.seqs, &format!("rejected by remote: {:?}", reason))
                            .await?;
                    } else {
                        self.store.acknowledge_changes(entry.id, entry.last_seq).await?;
                    }
                    report.conflicts.push(ConflictOutcome {
                        kind: entry.kind,
                        id: entry.id,
                        resolution: applied.resolution,
                    });
                }
            }
        }
        Ok(items_changed)
    }
}
