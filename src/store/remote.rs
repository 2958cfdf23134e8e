//! Applying remote changes to the local store.

use log::{debug, warn};
use sea_orm::{ConnectionTrait, TransactionTrait};
use uuid::Uuid;

use super::outbox::load_record;
use super::{ChangeKind, ChangeOrigin, RecordStore, StoreEvent};
use crate::backend::RemoteChange;
use crate::error::Result;
use crate::ordering;
use crate::record::{ChangeOperation, RecordData, RecordKind};
use crate::repositories::{
    CategoryRepository, ItemRepository, LocationRepository, PendingChangeRepository, TombstoneRepository,
};
use crate::sync::conflict::{self, LocalState, Resolution};

/// Result of applying one remote change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedChange {
    pub kind: RecordKind,
    pub id: Uuid,
    pub resolution: Resolution,
    /// Unpushed local changes were overridden or kept over the remote version.
    pub conflict: bool,
    /// Local data was modified.
    pub changed: bool,
}

async fn write_record<C>(conn: &C, exists: bool, record: &RecordData) -> Result<()>
where
    C: ConnectionTrait,
{
    match record {
        RecordData::Item(item) if exists => {
            ItemRepository::update(conn, item.clone()).await?;
        }
        RecordData::Item(item) => {
            ItemRepository::insert(conn, item.clone()).await?;
        }
        RecordData::Location(location) if exists => {
            LocationRepository::update(conn, location.clone()).await?;
        }
        RecordData::Location(location) => {
            LocationRepository::insert(conn, location.clone()).await?;
        }
        RecordData::Category(category) if exists => {
            CategoryRepository::update(conn, category.clone()).await?;
        }
        RecordData::Category(category) => {
            CategoryRepository::insert(conn, category.clone()).await?;
        }
    }
    Ok(())
}

async fn delete_record<C>(conn: &C, kind: RecordKind, id: &Uuid) -> Result<bool>
where
    C: ConnectionTrait,
{
    let deleted = match kind {
        RecordKind::Item => ItemRepository::delete(conn, id).await?,
        RecordKind::Location => LocationRepository::delete(conn, id).await?,
        RecordKind::Category => CategoryRepository::delete(conn, id).await?,
    };
    Ok(deleted)
}

impl RecordStore {
    /// Reconcile one remote change with the local copy of its record.
    ///
    /// The decision comes from [`conflict::resolve`]. Taking the remote
    /// version or deleting drops the local queue for the record; keeping
    /// the local version makes sure it is queued for push again. Applying
    /// the same change twice leaves the store as after the first time.
    pub async fn apply_remote_change(&self, change: &RemoteChange) -> Result<AppliedChange> {
        let storage = self.storage.lock().await;
        let txn = storage.conn.begin().await?;

        let local = load_record(&txn, change.kind, &change.id).await?;
        let state = LocalState {
            modified_date: local.as_ref().map(RecordData::modified_date),
            has_pending: PendingChangeRepository::has_pending(&txn, &change.id).await?,
            tombstoned: TombstoneRepository::exists(&txn, &change.id).await?,
        };
        let resolution = conflict::resolve(&state, change);

        let mut events = Vec::new();
        let mut changed = false;
        match resolution {
            Resolution::TakeRemote => {
                if let Some(remote) = change.record() {
                    if local.as_ref() != Some(remote) {
                        write_record(&txn, local.is_some(), remote).await?;
                        changed = true;
                        let kind = if local.is_some() {
                            ChangeKind::Updated
                        } else {
                            ChangeKind::Created
                        };
                        events.push(StoreEvent::new(change.kind, change.id, kind, ChangeOrigin::Remote));
                    }
                }
                PendingChangeRepository::delete_for_record(&txn, &change.id).await?;
            }
            Resolution::KeepLocal => {
                if !state.has_pending {
                    if let Some(modified) = state.modified_date {
                        PendingChangeRepository::append(
                            &txn,
                            change.kind,
                            &change.id,
                            ChangeOperation::Upsert,
                            modified,
                        )
                        .await?;
                    }
                }
            }
            Resolution::DeleteLocal => {
                if delete_record(&txn, change.kind, &change.id).await? {
                    changed = true;
                    events.push(StoreEvent::new(
                        change.kind,
                        change.id,
                        ChangeKind::Deleted,
                        ChangeOrigin::Remote,
                    ));
                    if let Some(RecordData::Item(item)) = &local {
                        let remaining = ItemRepository::get_all(&txn).await?;
                        let repair = ordering::plan_scope_repair(&remaining, self.scope, self.scope.key(item));
                        for (id, sort_order) in repair {
                            ItemRepository::set_sort_order(&txn, &id, sort_order).await?;
                            events.push(StoreEvent::new(
                                RecordKind::Item,
                                id,
                                ChangeKind::Reordered,
                                ChangeOrigin::Repair,
                            ));
                        }
                    }
                }
                PendingChangeRepository::delete_for_record(&txn, &change.id).await?;
                TombstoneRepository::record(&txn, change.kind, &change.id, change.modified_date).await?;
            }
            Resolution::Skip => {}
        }
        txn.commit().await?;

        let conflict = state.has_pending
            && match resolution {
                Resolution::TakeRemote => changed,
                Resolution::KeepLocal | Resolution::DeleteLocal => true,
                Resolution::Skip => false,
            };
        if conflict {
            warn!(
                "⚔️ Conflict on {} {} resolved as {:?}",
                change.kind, change.id, resolution
            );
        } else {
            debug!("Remote {} {} resolved as {:?}", change.kind, change.id, resolution);
        }

        self.publish(events);
        Ok(AppliedChange {
            kind: change.kind,
            id: change.id,
            resolution,
            conflict,
            changed,
        })
    }
}
