//! Filter/sort view builder.
//!
//! [`filtered_items`] maps a record snapshot, a category filter and a sort
//! mode to the display sequence. It never mutates records and is
//! idempotent: equal inputs give the exact same sequence, element order
//! included, because every sort is stable over the store's deterministic
//! snapshot order.
//!
//! [`ViewCache`] keeps the last computed sequence and recomputes it only
//! after the store reports a committed mutation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tokio::sync::broadcast::{self, error::TryRecvError};
use uuid::Uuid;

use crate::constants::{UNCATEGORIZED, UNKNOWN_LOCATION};
use crate::entities::{category, item, location};
use crate::error::Result;
use crate::store::{RecordStore, StoreEvent};

/// How a view orders its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Ascending manual `sort_order`.
    #[default]
    Order,
    /// Case-insensitive name, ascending.
    Alphabetical,
    /// Most recently modified first.
    DateModified,
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Order => "order",
            Self::Alphabetical => "alphabetical",
            Self::DateModified => "date_modified",
        };
        f.write_str(name)
    }
}

impl FromStr for SortMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "order" => Ok(Self::Order),
            "alphabetical" => Ok(Self::Alphabetical),
            "date_modified" | "datemodified" => Ok(Self::DateModified),
            other => anyhow::bail!("Unknown sort mode '{}'", other),
        }
    }
}

/// Category restriction of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    /// The "All Items" sentinel.
    #[default]
    All,
    Category(Uuid),
}

impl CategoryFilter {
    pub fn matches(&self, item: &item::Model) -> bool {
        match self {
            Self::All => true,
            Self::Category(id) => item.category_id == Some(*id),
        }
    }
}

/// Everything that determines a displayed sequence besides the records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewQuery {
    pub category: CategoryFilter,
    pub sort_mode: SortMode,
    /// Case-insensitive substring matched against item names.
    pub search: Option<String>,
}

impl ViewQuery {
    pub fn new(category: CategoryFilter, sort_mode: SortMode) -> Self {
        Self {
            category,
            sort_mode,
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() { None } else { Some(search) };
        self
    }
}

/// A displayed sequence together with the query that produced it.
///
/// Drag-reorder requests carry this so the ordering engine can check that
/// the drag happened inside a manually ordered view.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemView {
    pub query: ViewQuery,
    pub items: Vec<item::Model>,
}

impl ItemView {
    pub fn ids(&self) -> Vec<Uuid> {
        self.items.iter().map(|item| item.id).collect()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.items.iter().any(|item| item.id == *id)
    }
}

/// Build the display sequence for `query` from a record snapshot.
pub fn filtered_items(items: &[item::Model], query: &ViewQuery) -> Vec<item::Model> {
    let needle = query.search.as_ref().map(|search| search.to_lowercase());
    let mut result: Vec<item::Model> = items
        .iter()
        .filter(|item| query.category.matches(item))
        .filter(|item| {
            needle
                .as_ref()
                .map_or(true, |needle| item.name.to_lowercase().contains(needle.as_str()))
        })
        .cloned()
        .collect();

    // All three sorts are stable: ties keep input order.
    match query.sort_mode {
        SortMode::Order => result.sort_by_key(|item| item.sort_order),
        SortMode::Alphabetical => result.sort_by_cached_key(|item| item.name.to_lowercase()),
        SortMode::DateModified => result.sort_by(|a, b| b.modified_date.cmp(&a.modified_date)),
    }
    result
}

/// An item with its weak references resolved for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    pub item: item::Model,
    pub location_name: String,
    pub location_color: Option<String>,
    pub category_name: String,
}

/// Resolve location and category names for a displayed sequence.
///
/// Absent or dangling references fall back to "Unknown" (location) and
/// the empty string (category).
pub fn item_rows(
    items: &[item::Model],
    locations: &[location::Model],
    categories: &[category::Model],
) -> Vec<ItemRow> {
    let locations: HashMap<Uuid, &location::Model> = locations.iter().map(|l| (l.id, l)).collect();
    let categories: HashMap<Uuid, &category::Model> = categories.iter().map(|c| (c.id, c)).collect();

    items
        .iter()
        .map(|item| {
            let location = item.location_id.and_then(|id| locations.get(&id));
            let category = item.category_id.and_then(|id| categories.get(&id));
            ItemRow {
                item: item.clone(),
                location_name: location.map_or_else(|| UNKNOWN_LOCATION.to_string(), |l| l.name.clone()),
                location_color: location.map(|l| l.color.clone()),
                category_name: category.map_or_else(|| UNCATEGORIZED.to_string(), |c| c.name.clone()),
            }
        })
        .collect()
}

/// Locations shown in the quick-filter row.
pub fn quick_filter_locations(locations: &[location::Model]) -> Vec<location::Model> {
    locations.iter().filter(|l| l.display_in_row).cloned().collect()
}

/// Categories shown in the quick-filter row.
pub fn quick_filter_categories(categories: &[category::Model]) -> Vec<category::Model> {
    categories.iter().filter(|c| c.display_in_row).cloned().collect()
}

/// Cached display sequence, invalidated by committed store mutations.
pub struct ViewCache {
    query: ViewQuery,
    events: broadcast::Receiver<StoreEvent>,
    items: Option<Vec<item::Model>>,
}

impl ViewCache {
    pub fn new(store: &RecordStore, query: ViewQuery) -> Self {
        Self {
            query,
            events: store.subscribe(),
            items: None,
        }
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    /// Switch to another query; the next read recomputes.
    pub fn set_query(&mut self, query: ViewQuery) {
        if query != self.query {
            self.query = query;
            self.items = None;
        }
    }

    /// Drain pending store events. Returns whether the cache was invalidated.
    pub fn invalidate_on_events(&mut self) -> bool {
        let mut dirty = false;
        loop {
            match self.events.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => dirty = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if dirty {
            self.items = None;
        }
        dirty
    }

    /// Current sequence, recomputed only when invalidated.
    pub async fn items(&mut self, store: &RecordStore) -> Result<ItemView> {
        self.invalidate_on_events();
        let items = match self.items.take() {
            Some(items) => items,
            None => filtered_items(&store.all_items().await?, &self.query),
        };
        self.items = Some(items.clone());
        Ok(ItemView {
            query: self.query.clone(),
            items,
        })
    }

    /// Whether a computed sequence is cached.
    pub fn is_cached(&self) -> bool {
        self.items.is_some()
    }
}
