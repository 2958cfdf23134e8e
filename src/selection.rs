//! Selection and deletion coordinator.
//!
//! Holds the set of item ids the user has selected and turns it into
//! committed deletions. A selection only ever grows through the current
//! view, and stale ids (items deleted elsewhere in the meantime) are
//! dropped quietly instead of failing the whole request.

use log::{info, warn};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::error::{InventoryError, Result};
use crate::store::{RecordStore, StoreEvent};
use crate::sync::{RemotePropagation, SyncService};
use crate::view::ItemView;

/// Outcome of a successful [`SelectionCoordinator::delete_selected`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionReport {
    /// Items removed from the store, in store order.
    pub deleted: Vec<Uuid>,
    /// Selected ids that no longer existed.
    pub dropped: Vec<Uuid>,
    /// How the deletions reached the remote.
    pub remote: RemotePropagation,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionCoordinator {
    selected: BTreeSet<Uuid>,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` if it is part of `view`.
    pub fn select(&mut self, id: Uuid, view: &ItemView) -> bool {
        view.contains(&id) && self.selected.insert(id)
    }

    /// Remove `id` whether or not it is still displayed, so stale ids can
    /// always be dropped.
    pub fn deselect(&mut self, id: Uuid) -> bool {
        self.selected.remove(&id)
    }

    /// Flip membership of `id`. Ids outside `view` are ignored.
    pub fn toggle(&mut self, id: Uuid, view: &ItemView) -> bool {
        if !view.contains(&id) {
            return self.selected.contains(&id);
        }
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
        self.selected.contains(&id)
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: &Uuid) -> bool {
        self.selected.contains(id)
    }

    pub fn selected(&self) -> Vec<Uuid> {
        self.selected.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Forget items deleted by any origin, remote tombstones included.
    pub fn on_store_event(&mut self, event: &StoreEvent) {
        if event.is_item_deletion() {
            self.selected.remove(&event.id);
        }
    }

    /// Delete every selected item that still exists.
    ///
    /// Each item is deleted in its own transaction. The committed deletions
    /// are then handed to `sync` (when there is one) and removed from the
    /// selection.
    ///
    /// # Errors
    /// - `Persistence` if no deletion could be committed; the selection is untouched
    /// - `PartialDeletion` if some failed; the selection keeps exactly the failed ids
    pub async fn delete_selected(
        &mut self,
        store: &RecordStore,
        sync: Option<&SyncService>,
    ) -> Result<DeletionReport> {
        let requested = self.selected.clone();
        let live = store.all_items().await?;

        let mut targets = Vec::new();
        let mut dropped: Vec<Uuid> = requested.iter().copied().collect();
        for item in &live {
            if requested.contains(&item.id) {
                targets.push(item.id);
                dropped.retain(|id| *id != item.id);
            }
        }

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        let mut last_error = None;
        for id in targets {
            match store.delete_item(id).await {
                Ok(_) => deleted.push(id),
                Err(InventoryError::NotFound { .. }) => dropped.push(id),
                Err(e) => {
                    warn!("Failed to delete item {}: {}", id, e);
                    failed.push(id);
                    last_error = Some(e);
                }
            }
        }

        if deleted.is_empty() {
            if let Some(e) = last_error {
                return Err(match e {
                    e @ InventoryError::Persistence(_) => e,
                    other => InventoryError::Persistence(other.to_string()),
                });
            }
        }

        let remote = match sync {
            Some(sync) => sync.propagate_deletions(&deleted).await,
            None if deleted.is_empty() => RemotePropagation::Pushed,
            None => RemotePropagation::Queued,
        };

        if !failed.is_empty() {
            self.selected = failed.iter().copied().collect();
            return Err(InventoryError::PartialDeletion { deleted, failed });
        }

        for id in deleted.iter().chain(dropped.iter()) {
            self.selected.remove(id);
        }
        info!("🗑️ Deleted {} selected item(s), dropped {} stale id(s)", deleted.len(), dropped.len());
        Ok(DeletionReport {
            deleted,
            dropped,
            remote,
        })
    }
}
