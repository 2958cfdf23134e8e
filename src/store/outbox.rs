//! Change log access for the sync engine.

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, TransactionTrait};
use uuid::Uuid;

use super::RecordStore;
use crate::constants::SYNC_CURSOR_KEY;
use crate::entities::pending_change;
use crate::error::{InventoryError, Result};
use crate::record::{ChangeOperation, RecordData, RecordKind};
use crate::repositories::{
    CategoryRepository, ItemRepository, LocationRepository, PendingChangeRepository, SyncStateRepository,
};

/// A local mutation waiting to be pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedChange {
    pub seq: i32,
    pub kind: RecordKind,
    pub id: Uuid,
    pub operation: ChangeOperation,
    pub modified_date: DateTime<Utc>,
    pub attempts: i32,
    pub last_error: Option<String>,
}

impl TryFrom<pending_change::Model> for QueuedChange {
    type Error = InventoryError;

    fn try_from(change: pending_change::Model) -> Result<Self> {
        Ok(Self {
            seq: change.seq,
            kind: change.record_kind.parse()?,
            id: change.record_id,
            operation: change.operation.parse()?,
            modified_date: change.modified_date,
            attempts: change.attempts,
            last_error: change.last_error,
        })
    }
}

/// Current local version of a record, if it exists.
pub(super) async fn load_record<C>(conn: &C, kind: RecordKind, id: &Uuid) -> Result<Option<RecordData>>
where
    C: ConnectionTrait,
{
    let record = match kind {
        RecordKind::Item => ItemRepository::get_by_id(conn, id).await?.map(RecordData::Item),
        RecordKind::Location => LocationRepository::get_by_id(conn, id).await?.map(RecordData::Location),
        RecordKind::Category => CategoryRepository::get_by_id(conn, id).await?.map(RecordData::Category),
    };
    Ok(record)
}

impl RecordStore {
    /// Queued changes with `after < seq <= up_to`, oldest first.
    pub async fn pending_changes(&self, after: i32, up_to: i32, limit: usize) -> Result<Vec<QueuedChange>> {
        let storage = self.storage.lock().await;
        PendingChangeRepository::get_range(&storage.conn, after, up_to, limit as u64)
            .await?
            .into_iter()
            .map(QueuedChange::try_from)
            .collect()
    }

    /// Sequence number of the newest queued change.
    pub async fn last_pending_seq(&self) -> Result<Option<i32>> {
        let storage = self.storage.lock().await;
        Ok(PendingChangeRepository::last_seq(&storage.conn).await?)
    }

    pub async fn pending_count(&self) -> Result<u64> {
        let storage = self.storage.lock().await;
        Ok(PendingChangeRepository::count(&storage.conn).await?)
    }

    pub async fn has_pending_changes(&self, id: Uuid) -> Result<bool> {
        let storage = self.storage.lock().await;
        Ok(PendingChangeRepository::has_pending(&storage.conn, &id).await?)
    }

    /// Current local version of a record, `None` once it is deleted.
    pub async fn record_data(&self, kind: RecordKind, id: Uuid) -> Result<Option<RecordData>> {
        let storage = self.storage.lock().await;
        load_record(&storage.conn, kind, &id).await
    }

    /// Queue a change for a record outside of a regular mutation.
    ///
    /// Upserts are stamped with the record's own `modified_date` and require
    /// the record to exist.
    pub async fn enqueue_change(&self, kind: RecordKind, id: Uuid, operation: ChangeOperation) -> Result<i32> {
        let storage = self.storage.lock().await;
        let modified_date = match operation {
            ChangeOperation::Upsert => load_record(&storage.conn, kind, &id)
                .await?
                .ok_or_else(|| InventoryError::not_found(kind, id))?
                .modified_date(),
            ChangeOperation::Delete => self.now(),
        };
        let change = PendingChangeRepository::append(&storage.conn, kind, &id, operation, modified_date).await?;
        Ok(change.seq)
    }

    /// Drop the changes of a record the backend accepted, up to `up_to`.
    ///
    /// Changes queued after the push started have a higher sequence number
    /// and stay queued.
    pub async fn acknowledge_changes(&self, id: Uuid, up_to: i32) -> Result<u64> {
        let storage = self.storage.lock().await;
        Ok(PendingChangeRepository::delete_for_record_up_to(&storage.conn, &id, up_to).await?)
    }

    pub async fn record_push_failure(&self, seqs: &[i32], error: &str) -> Result<()> {
        let storage = self.storage.lock().await;
        let txn = storage.conn.begin().await?;
        PendingChangeRepository::record_failure(&txn, seqs, error).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Last remote cursor consumed by a pull.
    pub async fn sync_cursor(&self) -> Result<Option<String>> {
        let storage = self.storage.lock().await;
        Ok(SyncStateRepository::get(&storage.conn, SYNC_CURSOR_KEY).await?)
    }

    pub async fn set_sync_cursor(&self, cursor: &str) -> Result<()> {
        let storage = self.storage.lock().await;
        Ok(SyncStateRepository::set(&storage.conn, SYNC_CURSOR_KEY, cursor).await?)
    }
}
