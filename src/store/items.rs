//! Item mutations and reads.

use chrono::{DateTime, Utc};
use log::{debug, info};
use sea_orm::{ConnectionTrait, TransactionTrait};
use std::collections::HashMap;
use uuid::Uuid;

use super::{ChangeKind, ChangeOrigin, RecordStore, StoreEvent};
use crate::entities::item;
use crate::error::{InventoryError, Result};
use crate::ordering::{self, SortAssignment};
use crate::record::{ChangeOperation, RecordKind};
use crate::repositories::{ItemRepository, PendingChangeRepository, TombstoneRepository};
use crate::view::ItemView;

/// Attributes of an item to create. The store assigns id, `sort_order` and
/// `modified_date`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub quantity: i32,
    pub symbol: Option<String>,
    pub image_data: Option<Vec<u8>>,
    pub symbol_color: Option<String>,
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

impl NewItem {
    /// A single unit of `name`, without location or category.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: 1,
            ..Self::default()
        }
    }

    pub fn with_quantity(mut self, quantity: i32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_location(mut self, location_id: Uuid) -> Self {
        self.location_id = Some(location_id);
        self
    }

    pub fn with_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>, color: Option<String>) -> Self {
        self.symbol = Some(symbol.into());
        self.symbol_color = color;
        self
    }
}

fn validate(item: &item::Model) -> Result<()> {
    if item.quantity < 0 {
        return Err(InventoryError::InvalidRecord(format!(
            "quantity of '{}' cannot be negative ({})",
            item.name, item.quantity
        )));
    }
    Ok(())
}

/// Write repair assignments. Repairs keep `modified_date` and are not queued.
async fn write_repair<C>(conn: &C, plan: &[SortAssignment], events: &mut Vec<StoreEvent>) -> Result<()>
where
    C: ConnectionTrait,
{
    for (id, sort_order) in plan {
        ItemRepository::set_sort_order(conn, id, *sort_order).await?;
        events.push(StoreEvent::new(
            RecordKind::Item,
            *id,
            ChangeKind::Reordered,
            ChangeOrigin::Repair,
        ));
    }
    Ok(())
}

/// Write user-driven assignments: only changed values, each timestamped and
/// queued for push.
async fn write_local_orders<C>(
    conn: &C,
    items: &[item::Model],
    plan: &[SortAssignment],
    now: DateTime<Utc>,
    events: &mut Vec<StoreEvent>,
) -> Result<usize>
where
    C: ConnectionTrait,
{
    let by_id: HashMap<Uuid, &item::Model> = items.iter().map(|item| (item.id, item)).collect();
    let mut changed = 0;
    for (id, sort_order) in plan {
        let current = by_id
            .get(id)
            .ok_or_else(|| InventoryError::not_found(RecordKind::Item, *id))?;
        if current.sort_order == *sort_order {
            continue;
        }
        let mut updated = (*current).clone();
        updated.sort_order = *sort_order;
        updated.modified_date = now;
        ItemRepository::update(conn, updated).await?;
        PendingChangeRepository::append(conn, RecordKind::Item, id, ChangeOperation::Upsert, now).await?;
        events.push(StoreEvent::new(
            RecordKind::Item,
            *id,
            ChangeKind::Reordered,
            ChangeOrigin::Local,
        ));
        changed += 1;
    }
    Ok(changed)
}

impl RecordStore {
    /// Every item, in stable `(sort_order, id)` order.
    pub async fn all_items(&self) -> Result<Vec<item::Model>> {
        let storage = self.storage.lock().await;
        Ok(ItemRepository::get_all(&storage.conn).await?)
    }

    pub async fn get_item(&self, id: Uuid) -> Result<item::Model> {
        let storage = self.storage.lock().await;
        ItemRepository::get_by_id(&storage.conn, &id)
            .await?
            .ok_or_else(|| InventoryError::not_found(RecordKind::Item, id))
    }

    /// Create an item at the end of its ordering scope.
    pub async fn create_item(&self, new_item: NewItem) -> Result<item::Model> {
        let now = self.now();
        let storage = self.storage.lock().await;
        let txn = storage.conn.begin().await?;

        let existing = ItemRepository::get_all(&txn).await?;
        let item = item::Model {
            id: Uuid::new_v4(),
            name: new_item.name,
            quantity: new_item.quantity,
            symbol: new_item.symbol,
            image_data: new_item.image_data,
            symbol_color: new_item.symbol_color,
            sort_order: ordering::next_sort_order(&existing, self.scope, new_item.category_id),
            modified_date: now,
            location_id: new_item.location_id,
            category_id: new_item.category_id,
        };
        validate(&item)?;

        let item = ItemRepository::insert(&txn, item).await?;
        PendingChangeRepository::append(&txn, RecordKind::Item, &item.id, ChangeOperation::Upsert, now).await?;
        txn.commit().await?;

        debug!("Created item '{}' ({}) at position {}", item.name, item.id, item.sort_order);
        self.publish(vec![StoreEvent::new(
            RecordKind::Item,
            item.id,
            ChangeKind::Created,
            ChangeOrigin::Local,
        )]);
        Ok(item)
    }

    /// Edit an item in place.
    ///
    /// Identity and position can't change: any id or `sort_order` written by
    /// `edit` is discarded. Use [`reorder`](Self::reorder) to move an item.
    /// Moving an item into another ordering scope appends it to the new
    /// scope and closes the gap it leaves behind.
    pub async fn update_item<F>(&self, id: Uuid, edit: F) -> Result<item::Model>
    where
        F: FnOnce(&mut item::Model),
    {
        let now = self.now();
        let storage = self.storage.lock().await;
        let txn = storage.conn.begin().await?;

        let current = ItemRepository::get_by_id(&txn, &id)
            .await?
            .ok_or_else(|| InventoryError::not_found(RecordKind::Item, id))?;
        let mut updated = current.clone();
        edit(&mut updated);
        updated.id = current.id;
        updated.sort_order = current.sort_order;
        updated.modified_date = now;
        validate(&updated)?;

        let mut events = Vec::new();
        let old_key = self.scope.key(&current);
        if self.scope.key(&updated) != old_key {
            let others: Vec<item::Model> = ItemRepository::get_all(&txn)
                .await?
                .into_iter()
                .filter(|item| item.id != id)
                .collect();
            updated.sort_order = ordering::next_sort_order(&others, self.scope, updated.category_id);
            let repair = ordering::plan_scope_repair(&others, self.scope, old_key);
            write_repair(&txn, &repair, &mut events).await?;
        }

        let updated = ItemRepository::update(&txn, updated).await?;
        PendingChangeRepository::append(&txn, RecordKind::Item, &id, ChangeOperation::Upsert, now).await?;
        txn.commit().await?;

        events.insert(
            0,
            StoreEvent::new(RecordKind::Item, id, ChangeKind::Updated, ChangeOrigin::Local),
        );
        self.publish(events);
        Ok(updated)
    }

    /// Delete an item, leave a tombstone and close the gap in its scope.
    ///
    /// Returns the deleted record.
    pub async fn delete_item(&self, id: Uuid) -> Result<item::Model> {
        let now = self.now();
        let storage = self.storage.lock().await;
        let txn = storage.conn.begin().await?;

        let current = ItemRepository::get_by_id(&txn, &id)
            .await?
            .ok_or_else(|| InventoryError::not_found(RecordKind::Item, id))?;
        ItemRepository::delete(&txn, &id).await?;
        TombstoneRepository::record(&txn, RecordKind::Item, &id, now).await?;
        PendingChangeRepository::append(&txn, RecordKind::Item, &id, ChangeOperation::Delete, now).await?;

        let mut events = vec![StoreEvent::new(
            RecordKind::Item,
            id,
            ChangeKind::Deleted,
            ChangeOrigin::Local,
        )];
        let remaining = ItemRepository::get_all(&txn).await?;
        let repair = ordering::plan_scope_repair(&remaining, self.scope, self.scope.key(&current));
        write_repair(&txn, &repair, &mut events).await?;
        txn.commit().await?;

        info!("🗑️ Deleted item '{}' ({})", current.name, id);
        self.publish(events);
        Ok(current)
    }

    /// Apply a drag of `dragged` onto `target` in the displayed `view`.
    ///
    /// The plan is computed from a snapshot read inside the write
    /// transaction. Only items whose `sort_order` actually changes are
    /// written, timestamped and queued for push.
    ///
    /// Returns the number of items that moved.
    pub async fn reorder(&self, view: &ItemView, dragged: Uuid, target: Uuid) -> Result<usize> {
        let now = self.now();
        let storage = self.storage.lock().await;
        let txn = storage.conn.begin().await?;

        let items = ItemRepository::get_all(&txn).await?;
        let plan = ordering::plan_reorder(
            &items,
            &view.ids(),
            view.query.sort_mode,
            self.scope,
            dragged,
            target,
        )?;

        let mut events = Vec::new();
        let changed = write_local_orders(&txn, &items, &plan, now, &mut events).await?;
        txn.commit().await?;

        if changed > 0 {
            info!("↕️ Moved item {} onto {} ({} item(s) renumbered)", dragged, target, changed);
        }
        self.publish(events);
        Ok(changed)
    }

    /// Write an explicit set of `sort_order` values as a local change.
    ///
    /// # Errors
    /// `NotFound` if any id is unknown; nothing is written in that case
    pub async fn apply_sort_orders(&self, assignments: &[SortAssignment]) -> Result<usize> {
        let now = self.now();
        let storage = self.storage.lock().await;
        let txn = storage.conn.begin().await?;

        let items = ItemRepository::get_all(&txn).await?;
        let mut events = Vec::new();
        let changed = write_local_orders(&txn, &items, assignments, now, &mut events).await?;
        txn.commit().await?;

        self.publish(events);
        Ok(changed)
    }

    /// Renumber every ordering scope densely from 0.
    ///
    /// Repairs don't touch `modified_date` and aren't queued: every device
    /// runs the same deterministic repair on the same converged data.
    pub async fn repair_sort_orders(&self) -> Result<usize> {
        let storage = self.storage.lock().await;
        let txn = storage.conn.begin().await?;

        let items = ItemRepository::get_all(&txn).await?;
        let plan = ordering::plan_repair(&items, self.scope);
        let mut events = Vec::new();
        write_repair(&txn, &plan, &mut events).await?;
        txn.commit().await?;

        if !plan.is_empty() {
            debug!("Repaired sort order of {} item(s)", plan.len());
        }
        self.publish(events);
        Ok(plan.len())
    }
}
