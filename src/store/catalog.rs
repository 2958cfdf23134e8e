//! Locations and categories.
//!
//! Items reference both weakly: deleting a location or a category leaves
//! the items that point at it untouched, and readers resolve the dangling
//! reference to "Unknown" / uncategorized.

use log::info;
use sea_orm::TransactionTrait;
use uuid::Uuid;

use super::{ChangeKind, ChangeOrigin, RecordStore, StoreEvent};
use crate::constants::DEFAULT_LOCATION_COLOR;
use crate::entities::{category, location};
use crate::error::{InventoryError, Result};
use crate::record::{ChangeOperation, RecordKind};
use crate::repositories::{CategoryRepository, LocationRepository, PendingChangeRepository, TombstoneRepository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLocation {
    pub name: String,
    pub color: String,
    pub display_in_row: bool,
}

impl NewLocation {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: DEFAULT_LOCATION_COLOR.to_string(),
            display_in_row: true,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub display_in_row: bool,
}

impl NewCategory {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_in_row: true,
        }
    }
}

impl RecordStore {
    pub async fn all_locations(&self) -> Result<Vec<location::Model>> {
        let storage = self.storage.lock().await;
        Ok(LocationRepository::get_all(&storage.conn).await?)
    }

    pub async fn get_location(&self, id: Uuid) -> Result<location::Model> {
        let storage = self.storage.lock().await;
        LocationRepository::get_by_id(&storage.conn, &id)
            .await?
            .ok_or_else(|| InventoryError::not_found(RecordKind::Location, id))
    }

    pub async fn create_location(&self, new_location: NewLocation) -> Result<location::Model> {
        let now = self.now();
        let storage = self.storage.lock().await;
        let txn = storage.conn.begin().await?;

        let location = location::Model {
            id: Uuid::new_v4(),
            name: new_location.name,
            color: new_location.color,
            display_in_row: new_location.display_in_row,
            modified_date: now,
        };
        let location = LocationRepository::insert(&txn, location).await?;
        PendingChangeRepository::append(&txn, RecordKind::Location, &location.id, ChangeOperation::Upsert, now)
            .await?;
        txn.commit().await?;

        self.publish(vec![StoreEvent::new(
            RecordKind::Location,
            location.id,
            ChangeKind::Created,
            ChangeOrigin::Local,
        )]);
        Ok(location)
    }

    pub async fn update_location<F>(&self, id: Uuid, edit: F) -> Result<location::Model>
    where
        F: FnOnce(&mut location::Model),
    {
        let now = self.now();
        let storage = self.storage.lock().await;
        let txn = storage.conn.begin().await?;

        let current = LocationRepository::get_by_id(&txn, &id)
            .await?
            .ok_or_else(|| InventoryError::not_found(RecordKind::Location, id))?;
        let mut updated = current;
        edit(&mut updated);
        updated.id = id;
        updated.modified_date = now;

        let updated = LocationRepository::update(&txn, updated).await?;
        PendingChangeRepository::append(&txn, RecordKind::Location, &id, ChangeOperation::Upsert, now).await?;
        txn.commit().await?;

        self.publish(vec![StoreEvent::new(
            RecordKind::Location,
            id,
            ChangeKind::Updated,
            ChangeOrigin::Local,
        )]);
        Ok(updated)
    }

    /// Delete a location. Items stored there keep their dangling reference.
    pub async fn delete_location(&self, id: Uuid) -> Result<location::Model> {
        let now = self.now();
        let storage = self.storage.lock().await;
        let txn = storage.conn.begin().await?;

        let current = LocationRepository::get_by_id(&txn, &id)
            .await?
            .ok_or_else(|| InventoryError::not_found(RecordKind::Location, id))?;
        LocationRepository::delete(&txn, &id).await?;
        TombstoneRepository::record(&txn, RecordKind::Location, &id, now).await?;
        PendingChangeRepository::append(&txn, RecordKind::Location, &id, ChangeOperation::Delete, now).await?;
        txn.commit().await?;

        info!("🗑️ Deleted location '{}' ({})", current.name, id);
        self.publish(vec![StoreEvent::new(
            RecordKind::Location,
            id,
            ChangeKind::Deleted,
            ChangeOrigin::Local,
        )]);
        Ok(current)
    }

    pub async fn all_categories(&self) -> Result<Vec<category::Model>> {
        let storage = self.storage.lock().await;
        Ok(CategoryRepository::get_all(&storage.conn).await?)
    }

    pub async fn get_category(&self, id: Uuid) -> Result<category::Model> {
        let storage = self.storage.lock().await;
        CategoryRepository::get_by_id(&storage.conn, &id)
            .await?
            .ok_or_else(|| InventoryError::not_found(RecordKind::Category, id))
    }

    pub async fn create_category(&self, new_category: NewCategory) -> Result<category::Model> {
        let now = self.now();
        let storage = self.storage.lock().await;
        let txn = storage.conn.begin().await?;

        let category = category::Model {
            id: Uuid::new_v4(),
            name: new_category.name,
            display_in_row: new_category.display_in_row,
            modified_date: now,
        };
        let category = CategoryRepository::insert(&txn, category).await?;
        PendingChangeRepository::append(&txn, RecordKind::Category, &category.id, ChangeOperation::Upsert, now)
            .await?;
        txn.commit().await?;

        self.publish(vec![StoreEvent::new(
            RecordKind::Category,
            category.id,
            ChangeKind::Created,
            ChangeOrigin::Local,
        )]);
        Ok(category)
    }

    pub async fn update_category<F>(&self, id: Uuid, edit: F) -> Result<category::Model>
    where
        F: FnOnce(&mut category::Model),
    {
        let now = self.now();
        let storage = self.storage.lock().await;
        let txn = storage.conn.begin().await?;

        let current = CategoryRepository::get_by_id(&txn, &id)
            .await?
            .ok_or_else(|| InventoryError::not_found(RecordKind::Category, id))?;
        let mut updated = current;
        edit(&mut updated);
        updated.id = id;
        updated.modified_date = now;

        let updated = CategoryRepository::update(&txn, updated).await?;
        PendingChangeRepository::append(&txn, RecordKind::Category, &id, ChangeOperation::Upsert, now).await?;
        txn.commit().await?;

        self.publish(vec![StoreEvent::new(
            RecordKind::Category,
            id,
            ChangeKind::Updated,
            ChangeOrigin::Local,
        )]);
        Ok(updated)
    }

    /// Delete a category. Its items become uncategorized for display but
    /// keep their ordering scope until they are edited.
    pub async fn delete_category(&self, id: Uuid) -> Result<category::Model> {
        let now = self.now();
        let storage = self.storage.lock().await;
        let txn = storage.conn.begin().await?;

        let current = CategoryRepository::get_by_id(&txn, &id)
            .await?
            .ok_or_else(|| InventoryError::not_found(RecordKind::Category, id))?;
        CategoryRepository::delete(&txn, &id).await?;
        TombstoneRepository::record(&txn, RecordKind::Category, &id, now).await?;
        PendingChangeRepository::append(&txn, RecordKind::Category, &id, ChangeOperation::Delete, now).await?;
        txn.commit().await?;

        info!("🗑️ Deleted category '{}' ({})", current.name, id);
        self.publish(vec![StoreEvent::new(
            RecordKind::Category,
            id,
            ChangeKind::Deleted,
            ChangeOrigin::Local,
        )]);
        Ok(current)
    }
}
