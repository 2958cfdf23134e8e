//! Manual ordering engine.
//!
//! Computes `sort_order` plans for insert, drag-reorder and repair. Every
//! function here is pure: it takes item snapshots and returns the
//! assignments to write. The [`RecordStore`](crate::store::RecordStore)
//! applies a plan inside the same transaction that read the snapshot, so a
//! plan can never race a concurrent delete.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::entities::item;
use crate::error::{InventoryError, Result};
use crate::record::RecordKind;
use crate::view::SortMode;

/// New `sort_order` for one item.
pub type SortAssignment = (Uuid, i32);

/// Set of items over which a dense `sort_order` sequence is maintained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingScope {
    /// One sequence for the whole collection.
    #[default]
    Collection,
    /// One sequence per category (uncategorized items form their own scope).
    Category,
}

impl OrderingScope {
    /// Scope key of an item. Items with equal keys share a sequence.
    pub fn key(&self, item: &item::Model) -> Option<Uuid> {
        self.key_for(item.category_id)
    }

    /// Scope key for an item filed under `category_id`.
    pub fn key_for(&self, category_id: Option<Uuid>) -> Option<Uuid> {
        match self {
            Self::Collection => None,
            Self::Category => category_id,
        }
    }
}

/// Items of one scope in their manual order. Ties fall back to the id so the
/// result does not depend on input order.
fn scope_sequence(items: &[item::Model], scope: OrderingScope, key: Option<Uuid>) -> Vec<&item::Model> {
    let mut sequence: Vec<&item::Model> = items.iter().filter(|item| scope.key(item) == key).collect();
    sequence.sort_by_key(|item| (item.sort_order, item.id));
    sequence
}

fn renumber(sequence: &[&item::Model]) -> Vec<SortAssignment> {
    sequence
        .iter()
        .enumerate()
        .map(|(index, item)| (item.id, index as i32))
        .collect()
}

/// `sort_order` for an item inserted into the scope of `category_id`.
pub fn next_sort_order(items: &[item::Model], scope: OrderingScope, category_id: Option<Uuid>) -> i32 {
    let key = scope.key_for(category_id);
    items
        .iter()
        .filter(|item| scope.key(item) == key)
        .map(|item| item.sort_order)
        .max()
        .map_or(0, |max| max + 1)
}

/// Plan a drag of `dragged` onto `target`.
///
/// `working` is the displayed sequence the drag happened in and `sort_mode`
/// the mode it was produced with. The dragged item takes the target's slot:
/// it lands after the target when moving forward and before it when moving
/// backward. Every item of the scope is then renumbered `0..n`.
///
/// Returns an empty plan when `dragged == target`.
///
/// # Errors
/// - `InvalidReorder` if the view is not in `order` mode, either id is absent
///   from the working sequence, or the two items live in different scopes
/// - `NotFound` if either item no longer exists in `items`
pub fn plan_reorder(
    items: &[item::Model],
    working: &[Uuid],
    sort_mode: SortMode,
    scope: OrderingScope,
    dragged: Uuid,
    target: Uuid,
) -> Result<Vec<SortAssignment>> {
    if dragged == target {
        return Ok(Vec::new());
    }
    if sort_mode != SortMode::Order {
        return Err(InventoryError::InvalidReorder(format!(
            "manual reordering needs the '{}' sort mode, view uses '{}'",
            SortMode::Order,
            sort_mode
        )));
    }
    for (role, id) in [("dragged", dragged), ("target", target)] {
        if !working.contains(&id) {
            return Err(InventoryError::InvalidReorder(format!(
                "{role} item {id} is not part of the working sequence"
            )));
        }
    }

    let find = |id: Uuid| {
        items
            .iter()
            .find(|item| item.id == id)
            .ok_or_else(|| InventoryError::not_found(RecordKind::Item, id))
    };
    let dragged_item = find(dragged)?;
    let target_item = find(target)?;

    let key = scope.key(dragged_item);
    if scope.key(target_item) != key {
        return Err(InventoryError::InvalidReorder(format!(
            "items {dragged} and {target} belong to different ordering scopes"
        )));
    }

    let mut sequence = scope_sequence(items, scope, key);
    let from = sequence.iter().position(|item| item.id == dragged);
    let to = sequence.iter().position(|item| item.id == target);
    let (Some(from), Some(to)) = (from, to) else {
        return Err(InventoryError::InvalidReorder(
            "dragged or target item missing from its scope".to_string(),
        ));
    };

    let moved = sequence.remove(from);
    sequence.insert(to, moved);
    Ok(renumber(&sequence))
}

/// Plan the renumbering that makes one scope dense again.
///
/// Only items whose value changes are returned.
pub fn plan_scope_repair(items: &[item::Model], scope: OrderingScope, key: Option<Uuid>) -> Vec<SortAssignment> {
    let sequence = scope_sequence(items, scope, key);
    sequence
        .iter()
        .enumerate()
        .filter(|(index, item)| item.sort_order != *index as i32)
        .map(|(index, item)| (item.id, index as i32))
        .collect()
}

/// Plan the renumbering that makes every scope dense again.
///
/// Used after a pull, when concurrent reorders from other devices may have
/// produced duplicates or gaps.
pub fn plan_repair(items: &[item::Model], scope: OrderingScope) -> Vec<SortAssignment> {
    let keys: BTreeMap<Option<Uuid>, ()> = items.iter().map(|item| (scope.key(item), ())).collect();
    keys.into_keys()
        .flat_map(|key| plan_scope_repair(items, scope, key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(name: &str, sort_order: i32, category_id: Option<Uuid>) -> item::Model {
        item::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            quantity: 1,
            symbol: None,
            image_data: None,
            symbol_color: None,
            sort_order,
            modified_date: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            location_id: None,
            category_id,
        }
    }

    fn apply(items: &mut [item::Model], plan: &[SortAssignment]) {
        for (id, order) in plan {
            if let Some(item) = items.iter_mut().find(|item| item.id == *id) {
                item.sort_order = *order;
            }
        }
    }

    fn names_in_order(items: &[item::Model]) -> Vec<String> {
        let mut sorted = items.to_vec();
        sorted.sort_by_key(|item| item.sort_order);
        sorted.into_iter().map(|item| item.name).collect()
    }

    #[test]
    fn test_next_sort_order_appends_after_max() {
        let items = vec![item("a", 0, None), item("b", 4, None)];
        assert_eq!(next_sort_order(&items, OrderingScope::Collection, None), 5);
        assert_eq!(next_sort_order(&[], OrderingScope::Collection, None), 0);
    }

    #[test]
    fn test_next_sort_order_per_category_scope() {
        let tools = Uuid::new_v4();
        let items = vec![item("a", 7, Some(tools)), item("b", 2, None)];
        assert_eq!(next_sort_order(&items, OrderingScope::Category, Some(tools)), 8);
        assert_eq!(next_sort_order(&items, OrderingScope::Category, None), 3);
        assert_eq!(next_sort_order(&items, OrderingScope::Category, Some(Uuid::new_v4())), 0);
    }

    #[test]
    fn test_drag_forward_lands_after_target() {
        let mut items = vec![item("A", 0, None), item("B", 1, None), item("C", 2, None)];
        let working: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        let plan = plan_reorder(
            &items,
            &working,
            SortMode::Order,
            OrderingScope::Collection,
            items[0].id,
            items[2].id,
        )
        .unwrap();
        apply(&mut items, &plan);
        assert_eq!(names_in_order(&items), vec!["B", "C", "A"]);
        let mut orders: Vec<i32> = items.iter().map(|item| item.sort_order).collect();
        orders.sort();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_drag_backward_lands_before_target() {
        let mut items = vec![
            item("A", 0, None),
            item("B", 1, None),
            item("C", 2, None),
            item("D", 3, None),
        ];
        let working: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        let plan = plan_reorder(
            &items,
            &working,
            SortMode::Order,
            OrderingScope::Collection,
            items[3].id,
            items[1].id,
        )
        .unwrap();
        apply(&mut items, &plan);
        assert_eq!(names_in_order(&items), vec!["A", "D", "B", "C"]);
    }

    #[test]
    fn test_reorder_renumbers_sparse_sequence_densely() {
        let mut items = vec![item("A", 3, None), item("B", 10, None), item("C", 10, None), item("D", 42, None)];
        let working: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        let plan = plan_reorder(
            &items,
            &working,
            SortMode::Order,
            OrderingScope::Collection,
            items[0].id,
            items[1].id,
        )
        .unwrap();
        assert_eq!(plan.len(), 4);
        apply(&mut items, &plan);
        let mut orders: Vec<i32> = items.iter().map(|item| item.sort_order).collect();
        orders.sort();
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_reorder_same_item_is_noop() {
        let items = vec![item("A", 0, None)];
        let plan = plan_reorder(
            &items,
            &[items[0].id],
            SortMode::Order,
            OrderingScope::Collection,
            items[0].id,
            items[0].id,
        )
        .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_reorder_rejects_non_order_mode() {
        let items = vec![item("A", 0, None), item("B", 1, None)];
        let working: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        let result = plan_reorder(
            &items,
            &working,
            SortMode::Alphabetical,
            OrderingScope::Collection,
            items[0].id,
            items[1].id,
        );
        assert!(matches!(result, Err(InventoryError::InvalidReorder(_))));
    }

    #[test]
    fn test_reorder_rejects_target_outside_working_sequence() {
        let items = vec![item("A", 0, None), item("B", 1, None)];
        let result = plan_reorder(
            &items,
            &[items[0].id],
            SortMode::Order,
            OrderingScope::Collection,
            items[0].id,
            items[1].id,
        );
        assert!(matches!(result, Err(InventoryError::InvalidReorder(_))));
    }

    #[test]
    fn test_reorder_rejects_cross_scope_drag() {
        let items = vec![item("A", 0, Some(Uuid::new_v4())), item("B", 0, Some(Uuid::new_v4()))];
        let working: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        let result = plan_reorder(
            &items,
            &working,
            SortMode::Order,
            OrderingScope::Category,
            items[0].id,
            items[1].id,
        );
        assert!(matches!(result, Err(InventoryError::InvalidReorder(_))));
    }

    #[test]
    fn test_reorder_reports_vanished_item() {
        let items = vec![item("A", 0, None)];
        let ghost = Uuid::new_v4();
        let result = plan_reorder(
            &items,
            &[items[0].id, ghost],
            SortMode::Order,
            OrderingScope::Collection,
            items[0].id,
            ghost,
        );
        assert!(matches!(result, Err(InventoryError::NotFound { .. })));
    }

    #[test]
    fn test_repair_closes_gaps_and_breaks_ties() {
        let items = vec![item("A", 0, None), item("B", 2, None), item("C", 2, None), item("D", 9, None)];
        let mut repaired = items.clone();
        apply(&mut repaired, &plan_repair(&items, OrderingScope::Collection));
        let mut orders: Vec<i32> = repaired.iter().map(|item| item.sort_order).collect();
        orders.sort();
        assert_eq!(orders, vec![0, 1, 2, 3]);
        assert_eq!(repaired[0].sort_order, 0);
        assert_eq!(repaired[3].sort_order, 3);
    }

    #[test]
    fn test_repair_of_dense_sequence_is_empty() {
        let items = vec![item("A", 0, None), item("B", 1, None)];
        assert!(plan_repair(&items, OrderingScope::Collection).is_empty());
    }

    #[test]
    fn test_repair_keeps_category_scopes_separate() {
        let kitchen = Uuid::new_v4();
        let items = vec![item("A", 5, Some(kitchen)), item("B", 5, None), item("C", 8, None)];
        let mut repaired = items.clone();
        apply(&mut repaired, &plan_repair(&items, OrderingScope::Category));
        assert_eq!(repaired[0].sort_order, 0);
        assert_eq!(repaired[1].sort_order, 0);
        assert_eq!(repaired[2].sort_order, 1);
    }
}
