//! Record store: the authoritative local collection of items, locations and
//! categories.
//!
//! The store is a ledger with identity integrity and referential tolerance.
//! It owns the single mutation lock of the process: every mutation, local or
//! remote, runs inside one database transaction while holding the lock, so a
//! reorder pass can never interleave with a delete. Local mutations append
//! to the sync change log in the same transaction. After commit a
//! [`StoreEvent`] is broadcast, still under the lock, so observers see
//! mutations in commit order.

mod catalog;
mod items;
mod outbox;
mod remote;

pub use catalog::{NewCategory, NewLocation};
pub use items::NewItem;
pub use outbox::QueuedChange;
pub use remote::AppliedChange;

use anyhow::Result as AnyResult;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::config::Config;
use crate::constants::STORE_EVENT_CAPACITY;
use crate::ordering::OrderingScope;
use crate::record::RecordKind;
use crate::storage::LocalStorage;
use crate::utils::datetime;

/// Source of modification timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    Reordered,
}

/// Who caused a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A mutation issued on this device. Queued for push.
    Local,
    /// A change pulled from the remote backend.
    Remote,
    /// A `sort_order` repair. Neither timestamped nor queued.
    Repair,
}

/// Committed-mutation notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreEvent {
    pub kind: RecordKind,
    pub id: Uuid,
    pub change: ChangeKind,
    pub origin: ChangeOrigin,
}

impl StoreEvent {
    pub fn new(kind: RecordKind, id: Uuid, change: ChangeKind, origin: ChangeOrigin) -> Self {
        Self {
            kind,
            id,
            change,
            origin,
        }
    }

    pub fn is_item_deletion(&self) -> bool {
        self.kind == RecordKind::Item && self.change == ChangeKind::Deleted
    }
}

/// Shared handle on the local record collection.
#[derive(Clone)]
pub struct RecordStore {
    storage: Arc<Mutex<LocalStorage>>,
    events: broadcast::Sender<StoreEvent>,
    clock: Clock,
    scope: OrderingScope,
}

impl RecordStore {
    /// Wrap an opened storage.
    pub fn new(storage: LocalStorage, scope: OrderingScope) -> Self {
        let (events, _) = broadcast::channel(STORE_EVENT_CAPACITY);
        Self {
            storage: Arc::new(Mutex::new(storage)),
            events,
            clock: Arc::new(Utc::now),
            scope,
        }
    }

    /// Open the storage described by the configuration.
    pub async fn open(config: &Config) -> AnyResult<Self> {
        let storage = LocalStorage::new(&config.storage).await?;
        Ok(Self::new(storage, config.ordering.scope))
    }

    /// Fresh in-memory store with collection-wide ordering.
    pub async fn in_memory() -> AnyResult<Self> {
        Ok(Self::new(LocalStorage::in_memory().await?, OrderingScope::Collection))
    }

    /// Replace the timestamp source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Shared storage handle. Holding its lock blocks every store mutation.
    pub fn storage(&self) -> Arc<Mutex<LocalStorage>> {
        self.storage.clone()
    }

    pub fn scope(&self) -> OrderingScope {
        self.scope
    }

    /// Receive an event for every committed mutation from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn now(&self) -> DateTime<Utc> {
        datetime::truncate_to_millis((self.clock)())
    }

    fn publish(&self, events: Vec<StoreEvent>) {
        for event in events {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }
}
