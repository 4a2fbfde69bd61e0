//! Glue between the filter store and the navigation manager.
//!
//! The filter store announces settled values synchronously; navigation fetches are
//! async. The callback built here bridges the two by spawning the filter update on
//! the ambient tokio runtime.

use crate::model::{Entity, FilterMap};
use crate::state::{FetchOutcome, FiltersChanged, NavigationManager};
use std::sync::Arc;
use tracing::{debug, warn};

/// Overlay settled filter values on `defaults`. Settled values win.
///
/// Keys such as `pageSize` live outside the filter bar, so clearing the bar must not
/// drop them.
pub fn merge_filters(defaults: &FilterMap, values: &FilterMap) -> FilterMap {
    let mut merged = defaults.clone();
    merged.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Build the filter-store callback that forwards settled filters to `navigation`.
///
/// Without a runtime on the notifying thread the change is dropped with a warning;
/// the next settled change carries the full map, so nothing is lost permanently.
pub fn forward_filter_changes<E: Entity>(
    navigation: NavigationManager<E>,
    defaults: FilterMap,
) -> FiltersChanged {
    Arc::new(move |values: &FilterMap| {
        let filters = merge_filters(&defaults, values);
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("No async runtime; filter change not forwarded");
                return;
            }
        };

        let navigation = navigation.clone();
        runtime.spawn(async move {
            match navigation.update_filters(filters).await {
                Ok(FetchOutcome::Applied(rows)) => {
                    debug!(rows = rows.len(), "Filters applied");
                }
                Ok(FetchOutcome::Superseded) => debug!("Filter fetch superseded"),
                Ok(FetchOutcome::Skipped) => {}
                Err(err) => warn!(error = %err, "Filter fetch failed"),
            }
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FilterValue, Record};
    use crate::source::JsonFileSource;
    use serde_json::json;

    fn records() -> Vec<Record> {
        (0..30)
            .map(|i| {
                Record::from_value(json!({
                    "id": format!("pay_{i:03}"),
                    "status": if i % 3 == 0 { "failed" } else { "paid" },
                }))
                .unwrap()
            })
            .collect()
    }

    fn defaults() -> FilterMap {
        FilterMap::from([("pageSize".to_string(), FilterValue::Number(10))])
    }

    #[test]
    fn merge_keeps_defaults_and_lets_values_win() {
        let values = FilterMap::from([
            ("statusFilter".to_string(), FilterValue::from("paid")),
            ("pageSize".to_string(), FilterValue::Number(25)),
        ]);

        let merged = merge_filters(&defaults(), &values);
        assert_eq!(merged.get("pageSize"), Some(&FilterValue::Number(25)));
        assert_eq!(merged.get("statusFilter"), Some(&FilterValue::from("paid")));

        let cleared = merge_filters(&defaults(), &FilterMap::new());
        assert_eq!(cleared, defaults());
    }

    #[tokio::test]
    async fn forwarded_change_refetches_with_merged_filters() {
        let navigation: NavigationManager<Record> = NavigationManager::new(
            Arc::new(JsonFileSource::from_records(records())),
            defaults(),
        );
        navigation.refresh().await.unwrap();
        assert_eq!(navigation.snapshot().total_items, 30);

        let callback = forward_filter_changes(navigation.clone(), defaults());
        callback(&FilterMap::from([(
            "statusFilter".to_string(),
            FilterValue::from("failed"),
        )]));

        for _ in 0..5 {
            tokio::task::yield_now().await;
        }

        let state = navigation.snapshot();
        assert_eq!(state.total_items, 10);
        assert_eq!(state.page_size, 10);
        assert_eq!(state.filters.get("pageSize"), Some(&FilterValue::Number(10)));
    }

    #[test]
    fn without_runtime_change_is_dropped() {
        let navigation: NavigationManager<Record> = NavigationManager::new(
            Arc::new(JsonFileSource::from_records(records())),
            defaults(),
        );

        let callback = forward_filter_changes(navigation.clone(), defaults());
        callback(&FilterMap::from([(
            "statusFilter".to_string(),
            FilterValue::from("failed"),
        )]));

        assert_eq!(navigation.snapshot().filters, defaults());
    }
}
