//! Integration test: a record file browsed through the public managers.
//!
//! Filter store -> navigation manager -> panel registry, wired the way the binary
//! wires them, over files in a temp directory.

use boview::integration::{forward_filter_changes, merge_filters};
use boview::model::{Entity, FilterMap, FilterValue, Record, PAGE_SIZE_FILTER_KEY};
use boview::source::JsonFileSource;
use boview::state::{
    FilterConfig, FilterStore, FilterStoreOptions, NavigationManager, NavigationStep,
    PanelOptions, PanelRegistry,
};
use boview::storage::{JsonFileStore, SharedStore};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

// ===== Test Helpers =====

struct TempDir(PathBuf);

impl TempDir {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("boview_flow_{}_{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        TempDir(dir)
    }

    fn path(&self, file: &str) -> PathBuf {
        self.0.join(file)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn write_records(dir: &TempDir) -> PathBuf {
    let records: Vec<_> = (0..25)
        .map(|i| {
            json!({
                "id": format!("ord_{i:02}"),
                "status": if i < 5 { "refunded" } else { "paid" },
                "total": i * 10,
            })
        })
        .collect();
    let path = dir.path("orders.json");
    fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();
    path
}

fn page_size(n: i64) -> FilterMap {
    FilterMap::from([(PAGE_SIZE_FILTER_KEY.to_string(), FilterValue::Number(n))])
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

// ===== Tests =====

#[tokio::test]
async fn browsing_across_pages_with_filters() {
    let dir = TempDir::new("browse");
    let source = JsonFileSource::load(write_records(&dir)).expect("records load");
    let storage: SharedStore = Arc::new(JsonFileStore::open(dir.path("prefs.json")).unwrap());

    let base = page_size(10);
    let navigation: NavigationManager<Record> =
        NavigationManager::new(Arc::new(source), base.clone());
    let mut filters = FilterStore::new(
        FilterStoreOptions::new(FilterConfig::default())
            .session_key("filters-orders")
            .debounce(Duration::ZERO),
        Arc::clone(&storage),
    )
    .on_filters_change(forward_filter_changes(navigation.clone(), base));

    navigation.refresh().await.unwrap();
    let state = navigation.snapshot();
    assert_eq!(state.total_items, 25);
    assert_eq!(state.total_pages(), 3);

    // Walk from the last row of page 1 into page 2.
    navigation.select_at(9);
    let step = navigation.navigate_next().await.unwrap();
    assert_eq!(step, NavigationStep::Moved(state_id("ord_10")));
    assert_eq!(navigation.snapshot().current_page, 2);
    assert_eq!(navigation.snapshot().global_index(), Some(10));

    // Narrowing by status refetches page 1 and keeps the selection id.
    filters.set_filter("statusFilter", Some(FilterValue::from("refunded")));
    settle().await;
    let state = navigation.snapshot();
    assert_eq!(state.current_page, 1);
    assert_eq!(state.total_items, 5);
    assert_eq!(state.selected_entity_id, Some(state_id("ord_10")));
    assert!(state.current_entity().is_none(), "selection is off this page");
    assert!(!state.can_go_next());
}

#[tokio::test]
async fn filter_session_is_restored_from_disk() {
    let dir = TempDir::new("session");
    let prefs = dir.path("prefs.json");

    {
        let storage: SharedStore = Arc::new(JsonFileStore::open(&prefs).unwrap());
        let mut filters = FilterStore::new(
            FilterStoreOptions::new(FilterConfig::default())
                .session_key("filters-orders")
                .debounce(Duration::ZERO),
            storage,
        );
        filters.set_filter("statusFilter", Some(FilterValue::from("paid")));
    }

    let storage: SharedStore = Arc::new(JsonFileStore::open(&prefs).unwrap());
    let filters = FilterStore::new(
        FilterStoreOptions::new(FilterConfig::default()).session_key("filters-orders"),
        storage,
    );
    assert_eq!(
        filters.value("statusFilter"),
        Some(&FilterValue::from("paid"))
    );

    let source = JsonFileSource::load(write_records(&dir)).unwrap();
    let starting = merge_filters(&page_size(10), filters.filter_values());
    let navigation: NavigationManager<Record> = NavigationManager::new(Arc::new(source), starting);
    navigation.refresh().await.unwrap();
    assert_eq!(navigation.snapshot().total_items, 20);
}

#[tokio::test(start_paused = true)]
async fn panel_width_survives_restart_and_close_grace() {
    let dir = TempDir::new("panel");
    let prefs = dir.path("prefs.json");
    let options = PanelOptions {
        viewport_width: 1600,
        ..PanelOptions::default()
    };

    {
        let storage: SharedStore = Arc::new(JsonFileStore::open(&prefs).unwrap());
        let panels = PanelRegistry::new(storage, options.clone());
        panels.open_panel("order-detail");
        assert_eq!(panels.set_width("order-detail", 700), 700);

        assert!(panels.close_panel("order-detail"));
        tokio::time::sleep(options.close_grace + Duration::from_millis(10)).await;
        assert!(panels.get_panel(&"order-detail".into()).is_none());
    }

    let storage: SharedStore = Arc::new(JsonFileStore::open(&prefs).unwrap());
    let panels = PanelRegistry::new(storage, options);
    let state = panels.open_panel("order-detail");
    assert_eq!(state.width, 700);
}

#[tokio::test]
async fn loading_a_missing_file_fails_cleanly() {
    let dir = TempDir::new("missing");
    let result = JsonFileSource::load(dir.path("nope.json"));
    assert!(result.is_err());
}

fn state_id(raw: &str) -> boview::model::EntityId {
    boview::model::EntityId::new(raw).unwrap()
}

#[test]
fn record_ids_are_lifted_out_of_fields() {
    let record = Record::from_value(json!({"id": "ord_01", "total": 10})).unwrap();
    assert_eq!(record.id().as_str(), "ord_01");
    assert_eq!(record.field_text("total"), "10");
}
