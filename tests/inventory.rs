mod common;

use common::names;
use inventorist::config::{Config, StorageConfig};
use inventorist::store::{NewCategory, NewItem};
use inventorist::sync::RemotePropagation;
use inventorist::view::{CategoryFilter, SortMode, ViewQuery};
use inventorist::Inventory;

async fn open_inventory() -> Inventory {
    let config = Config {
        storage: StorageConfig::in_memory(),
        ..Config::default()
    };
    Inventory::open(&config).await.unwrap()
}

#[tokio::test]
async fn test_open_uses_configured_query_and_remote() {
    let mut config = Config {
        storage: StorageConfig::in_memory(),
        ..Config::default()
    };
    config.view.default_sort_mode = SortMode::Alphabetical;
    config.remote.enabled = false;

    let inventory = Inventory::open(&config).await.unwrap();
    assert_eq!(inventory.query().sort_mode, SortMode::Alphabetical);
    assert!(inventory.sync().is_none());

    let inventory = open_inventory().await;
    assert_eq!(inventory.sync().unwrap().backend().backend_type(), "memory");
}

#[tokio::test]
async fn test_reorder_select_and_delete_through_facade() {
    let mut inventory = open_inventory().await;
    for name in ["A", "B", "C"] {
        inventory.create_item(NewItem::named(name)).await.unwrap();
    }

    let view = inventory.filtered_items().await.unwrap();
    let (a, c) = (view.items[0].id, view.items[2].id);
    inventory.request_reorder(a, c, &view).await.unwrap();
    let view = inventory.filtered_items().await.unwrap();
    assert_eq!(names(&view), vec!["B", "C", "A"]);

    assert!(inventory.select(a, &view));
    assert!(inventory.select(c, &view));
    let report = inventory.delete_selected().await.unwrap();
    assert_eq!(report.deleted.len(), 2);
    assert_eq!(report.remote, RemotePropagation::Pushed);
    assert!(inventory.selected().is_empty());

    let view = inventory.filtered_items().await.unwrap();
    assert_eq!(names(&view), vec!["B"]);
    let rows = inventory.rows().await.unwrap();
    assert_eq!(rows[0].location_name, "Unknown");
}

#[tokio::test]
async fn test_selection_follows_deletions_and_tab_changes() {
    let mut inventory = open_inventory().await;
    let tools = inventory
        .store()
        .create_category(NewCategory::named("Tools"))
        .await
        .unwrap();
    let saw = inventory
        .create_item(NewItem::named("Saw").with_category(tools.id))
        .await
        .unwrap();
    let cup = inventory.create_item(NewItem::named("Cup")).await.unwrap();

    let view = inventory.filtered_items().await.unwrap();
    inventory.select(saw.id, &view);
    inventory.select(cup.id, &view);

    // deleted from somewhere else, e.g. a sync pull
    inventory.store().delete_item(cup.id).await.unwrap();
    inventory.filtered_items().await.unwrap();
    assert_eq!(inventory.selected(), vec![saw.id]);

    // sort changes keep the selection, category changes clear it
    inventory.set_query(ViewQuery::new(CategoryFilter::All, SortMode::DateModified));
    assert_eq!(inventory.selected(), vec![saw.id]);
    inventory.set_query(ViewQuery::new(CategoryFilter::Category(tools.id), SortMode::Order));
    assert!(inventory.selected().is_empty());

    let renamed = inventory
        .update_item(saw.id, |item| item.name = "Hand saw".to_string())
        .await
        .unwrap();
    let view = inventory.filtered_items().await.unwrap();
    assert_eq!(view.items, vec![renamed]);

    inventory.clear_selection();
    assert!(!inventory.deselect(saw.id));
    assert!(inventory.toggle(saw.id, &view));
}
