mod common;

use std::sync::Arc;

use common::{names, test_store, TestClock};
use inventorist::backend::memory::MemoryRemote;
use inventorist::config::SyncConfig;
use inventorist::error::InventoryError;
use inventorist::selection::SelectionCoordinator;
use inventorist::store::{NewItem, RecordStore};
use inventorist::sync::{RemotePropagation, SyncService};
use inventorist::view::{filtered_items, ItemView, ViewQuery};
use sea_orm::ConnectionTrait;

async fn current_view(store: &RecordStore) -> ItemView {
    let query = ViewQuery::default();
    let items = filtered_items(&store.all_items().await.unwrap(), &query);
    ItemView { query, items }
}

async fn install_delete_guard(store: &RecordStore, condition: &str) {
    let storage = store.storage();
    let storage = storage.lock().await;
    let sql = format!(
        "CREATE TRIGGER block_delete BEFORE DELETE ON items {condition} \
         BEGIN SELECT RAISE(ABORT, 'item is locked'); END;"
    );
    storage.conn.execute_unprepared(&sql).await.unwrap();
}

#[tokio::test]
async fn test_deselect_drops_ids_no_longer_displayed() {
    let clock = TestClock::new();
    let store = test_store(&clock).await;
    let a = store.create_item(NewItem::named("A")).await.unwrap();
    let mut selection = SelectionCoordinator::new();
    assert!(selection.select(a.id, &current_view(&store).await));

    let empty = ItemView {
        query: ViewQuery::default(),
        items: Vec::new(),
    };
    assert!(!empty.contains(&a.id));
    assert!(selection.deselect(a.id));
    assert!(selection.is_empty());
}

#[tokio::test]
async fn test_select_ignores_ids_outside_view() {
    let clock = TestClock::new();
    let store = test_store(&clock).await;
    let a = store.create_item(NewItem::named("A")).await.unwrap();
    let view = current_view(&store).await;
    let mut selection = SelectionCoordinator::new();

    assert!(!selection.select(uuid::Uuid::new_v4(), &view));
    assert!(selection.select(a.id, &view));
    assert!(!selection.select(a.id, &view));
    assert!(!selection.toggle(a.id, &view));
    assert!(selection.toggle(a.id, &view));
    assert_eq!(selection.selected(), vec![a.id]);

    selection.clear_selection();
    assert!(selection.is_empty());
}

#[tokio::test]
async fn test_delete_selected_removes_items_and_clears_selection() {
    let clock = TestClock::new();
    let store = test_store(&clock).await;
    let a = store.create_item(NewItem::named("A")).await.unwrap();
    store.create_item(NewItem::named("B")).await.unwrap();
    let c = store.create_item(NewItem::named("C")).await.unwrap();

    let view = current_view(&store).await;
    let mut selection = SelectionCoordinator::new();
    selection.select(a.id, &view);
    selection.select(c.id, &view);

    let report = selection.delete_selected(&store, None).await.unwrap();
    let mut deleted = report.deleted.clone();
    deleted.sort();
    let mut expected = vec![a.id, c.id];
    expected.sort();
    assert_eq!(deleted, expected);
    assert!(report.dropped.is_empty());
    assert_eq!(report.remote, RemotePropagation::Queued);

    assert!(selection.is_empty());
    let after = current_view(&store).await;
    assert_eq!(names(&after), vec!["B"]);
    assert_eq!(after.items[0].sort_order, 0);
}

#[tokio::test]
async fn test_stale_selection_is_dropped_silently() {
    let clock = TestClock::new();
    let store = test_store(&clock).await;
    let a = store.create_item(NewItem::named("A")).await.unwrap();
    let b = store.create_item(NewItem::named("B")).await.unwrap();

    let view = current_view(&store).await;
    let mut selection = SelectionCoordinator::new();
    selection.select(a.id, &view);
    selection.select(b.id, &view);

    // deleted elsewhere before the user confirmed
    store.delete_item(b.id).await.unwrap();

    let report = selection.delete_selected(&store, None).await.unwrap();
    assert_eq!(report.deleted, vec![a.id]);
    assert_eq!(report.dropped, vec![b.id]);
    assert!(selection.is_empty());
    assert!(store.all_items().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_store_events_prune_selection() {
    let clock = TestClock::new();
    let store = test_store(&clock).await;
    let a = store.create_item(NewItem::named("A")).await.unwrap();
    let b = store.create_item(NewItem::named("B")).await.unwrap();
    let mut events = store.subscribe();

    let view = current_view(&store).await;
    let mut selection = SelectionCoordinator::new();
    selection.select(a.id, &view);
    selection.select(b.id, &view);

    store.delete_item(a.id).await.unwrap();
    while let Ok(event) = events.try_recv() {
        selection.on_store_event(&event);
    }
    assert_eq!(selection.selected(), vec![b.id]);
}

#[tokio::test]
async fn test_failed_deletion_keeps_selection() {
    let clock = TestClock::new();
    let store = test_store(&clock).await;
    let a = store.create_item(NewItem::named("A")).await.unwrap();
    let b = store.create_item(NewItem::named("B")).await.unwrap();
    install_delete_guard(&store, "").await;

    let view = current_view(&store).await;
    let mut selection = SelectionCoordinator::new();
    selection.select(a.id, &view);
    selection.select(b.id, &view);

    let err = selection.delete_selected(&store, None).await.unwrap_err();
    assert!(matches!(err, InventoryError::Persistence(_)));
    assert_eq!(selection.len(), 2);
    assert_eq!(store.all_items().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_partial_deletion_reports_failed_ids() {
    let clock = TestClock::new();
    let store = test_store(&clock).await;
    let a = store.create_item(NewItem::named("A")).await.unwrap();
    let locked = store.create_item(NewItem::named("Locked item")).await.unwrap();
    let c = store.create_item(NewItem::named("C")).await.unwrap();
    install_delete_guard(&store, "WHEN old.name = 'Locked item'").await;

    let view = current_view(&store).await;
    let mut selection = SelectionCoordinator::new();
    for id in [a.id, locked.id, c.id] {
        selection.select(id, &view);
    }

    match selection.delete_selected(&store, None).await {
        Err(InventoryError::PartialDeletion { deleted, failed }) => {
            assert_eq!(deleted.len(), 2);
            assert!(deleted.contains(&a.id) && deleted.contains(&c.id));
            assert_eq!(failed, vec![locked.id]);
        }
        other => panic!("expected partial deletion, got {:?}", other),
    }
    assert_eq!(selection.selected(), vec![locked.id]);

    let after = current_view(&store).await;
    assert_eq!(names(&after), vec!["Locked item"]);
    assert_eq!(after.items[0].sort_order, 0);
}

#[tokio::test]
async fn test_deletions_are_propagated_or_queued() {
    let clock = TestClock::new();
    let store = test_store(&clock).await;
    let remote = MemoryRemote::new();
    let sync = SyncService::new(store.clone(), Arc::new(remote.clone()), SyncConfig::default());
    let a = store.create_item(NewItem::named("A")).await.unwrap();
    let b = store.create_item(NewItem::named("B")).await.unwrap();
    sync.sync().await.unwrap();

    let mut selection = SelectionCoordinator::new();
    selection.select(a.id, &current_view(&store).await);
    let report = selection.delete_selected(&store, Some(&sync)).await.unwrap();
    assert_eq!(report.remote, RemotePropagation::Pushed);
    assert!(remote.ledger().await.current(&a.id).unwrap().is_tombstone());

    remote.set_online(false);
    selection.select(b.id, &current_view(&store).await);
    let report = selection.delete_selected(&store, Some(&sync)).await.unwrap();
    assert_eq!(report.remote, RemotePropagation::Queued);
    assert!(selection.is_empty());
    assert!(store.has_pending_changes(b.id).await.unwrap());

    remote.set_online(true);
    sync.sync().await.unwrap();
    assert!(remote.ledger().await.current(&b.id).unwrap().is_tombstone());
}
