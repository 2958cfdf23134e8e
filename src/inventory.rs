//! The surface a UI drives.
//!
//! [`Inventory`] wires the record store, the cached view, the selection and
//! the optional sync service together. A UI renders what it returns and
//! never computes order, filtering or conflict outcomes itself.

use anyhow::Result as AnyResult;
use log::info;
use tokio::sync::broadcast::{self, error::TryRecvError};
use uuid::Uuid;

use crate::backend::factory;
use crate::config::Config;
use crate::entities::item;
use crate::error::Result;
use crate::selection::{DeletionReport, SelectionCoordinator};
use crate::store::{NewItem, RecordStore, StoreEvent};
use crate::sync::SyncService;
use crate::view::{self, ItemRow, ItemView, ViewCache, ViewQuery};

pub struct Inventory {
    store: RecordStore,
    sync: Option<SyncService>,
    view: ViewCache,
    selection: SelectionCoordinator,
    events: broadcast::Receiver<StoreEvent>,
}

impl Inventory {
    pub fn new(store: RecordStore, sync: Option<SyncService>, query: ViewQuery) -> Self {
        Self {
            view: ViewCache::new(&store, query),
            events: store.subscribe(),
            selection: SelectionCoordinator::new(),
            store,
            sync,
        }
    }

    /// Open the store and the remote described by `config`.
    pub async fn open(config: &Config) -> AnyResult<Self> {
        let store = RecordStore::open(config).await?;
        let sync = if config.remote.enabled {
            let backend = factory::create_backend(&config.remote)?;
            info!("🔌 Using '{}' remote ({})", config.remote.name, backend.backend_type());
            Some(SyncService::new(store.clone(), backend, config.sync.clone()))
        } else {
            None
        };
        Ok(Self::new(store, sync, config.view.default_query()?))
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn sync(&self) -> Option<&SyncService> {
        self.sync.as_ref()
    }

    pub fn query(&self) -> &ViewQuery {
        self.view.query()
    }

    /// Switch category, sort mode or search. Changing the category is a
    /// tab change and clears the selection.
    pub fn set_query(&mut self, query: ViewQuery) {
        if query.category != self.view.query().category {
            self.selection.clear_selection();
        }
        self.view.set_query(query);
    }

    /// The displayed sequence for the current query.
    pub async fn filtered_items(&mut self) -> Result<ItemView> {
        self.apply_events().await?;
        self.view.items(&self.store).await
    }

    /// The displayed sequence with location and category names resolved.
    pub async fn rows(&mut self) -> Result<Vec<ItemRow>> {
        let current = self.filtered_items().await?;
        let locations = self.store.all_locations().await?;
        let categories = self.store.all_categories().await?;
        Ok(view::item_rows(&current.items, &locations, &categories))
    }

    /// Drag `dragged` onto `target` within `current_view`.
    pub async fn request_reorder(&self, dragged: Uuid, target: Uuid, current_view: &ItemView) -> Result<usize> {
        self.store.reorder(current_view, dragged, target).await
    }

    pub async fn create_item(&self, new_item: NewItem) -> Result<item::Model> {
        self.store.create_item(new_item).await
    }

    pub async fn update_item<F>(&self, id: Uuid, edit: F) -> Result<item::Model>
    where
        F: FnOnce(&mut item::Model),
    {
        self.store.update_item(id, edit).await
    }

    pub fn select(&mut self, id: Uuid, current_view: &ItemView) -> bool {
        self.selection.select(id, current_view)
    }

    pub fn deselect(&mut self, id: Uuid) -> bool {
        self.selection.deselect(id)
    }

    pub fn toggle(&mut self, id: Uuid, current_view: &ItemView) -> bool {
        self.selection.toggle(id, current_view)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear_selection();
    }

    pub fn selected(&self) -> Vec<Uuid> {
        self.selection.selected()
    }

    pub async fn delete_selected(&mut self) -> Result<DeletionReport> {
        self.apply_events().await?;
        self.selection.delete_selected(&self.store, self.sync.as_ref()).await
    }

    /// Drop selected ids deleted since the last call. After a lagged
    /// channel the selection is checked against the live items instead.
    async fn apply_events(&mut self) -> Result<()> {
        let mut lagged = false;
        loop {
            match self.events.try_recv() {
                Ok(event) => self.selection.on_store_event(&event),
                Err(TryRecvError::Lagged(_)) => lagged = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if lagged && !self.selection.is_empty() {
            let live = self.store.all_items().await?;
            for id in self.selection.selected() {
                if !live.iter().any(|item| item.id == id) {
                    self.selection.deselect(id);
                }
            }
        }
        Ok(())
    }
}
