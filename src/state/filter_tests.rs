//! Tests for the filter state machine.
//!
//! Tests verify:
//! - SetFilter with None clears both the value and its activation
//! - ClearFilter / ClearAll / RemoveAllAdditional transitions
//! - Default-visible vs hidden partitioning from declarative config

use super::*;
use crate::model::FilterDefinition;

fn set(key: &str, value: &str) -> FilterAction {
    FilterAction::SetFilter {
        key: key.to_string(),
        value: Some(FilterValue::from(value)),
    }
}

fn state_with(actions: Vec<FilterAction>) -> FilterState {
    actions.into_iter().fold(FilterState::default(), reduce)
}

fn payments_config() -> FilterConfig {
    FilterConfig::new(vec![
        FilterDefinition::select("status", "Status", &["paid", "failed"]),
        FilterDefinition::text("query", "Search"),
        FilterDefinition::text("customer", "Customer"),
        FilterDefinition::text("terminal", "Terminal"),
    ])
    .with_max_visible(2)
    .with_additional(vec![FilterDefinition::text("currency", "Currency")])
}

// ===== Reducer =====

#[test]
fn set_filter_upserts_value() {
    let state = state_with(vec![set("status", "paid"), set("status", "failed")]);
    assert_eq!(
        state.filter_values.get("status"),
        Some(&FilterValue::from("failed"))
    );
    assert_eq!(state.active_filter_count(), 1);
}

#[test]
fn set_filter_none_clears_value_and_activation() {
    let state = state_with(vec![
        FilterAction::ActivateHidden("status".into()),
        set("status", "paid"),
        FilterAction::SetFilter {
            key: "status".into(),
            value: None,
        },
    ]);

    assert!(!state.filter_values.contains_key("status"));
    assert!(
        !state.is_activated("status"),
        "clearing a filter must also drop its activation"
    );
}

#[test]
fn clear_filter_removes_every_duplicate_activation() {
    let state = state_with(vec![
        FilterAction::ActivateHidden("customer".into()),
        FilterAction::ActivateHidden("customer".into()),
        set("customer", "ada"),
        FilterAction::ClearFilter("customer".into()),
    ]);
    assert!(state.activated_hidden_filters.is_empty());
    assert!(!state.has_active_filters());
}

#[test]
fn activate_hidden_does_not_dedupe() {
    let state = state_with(vec![
        FilterAction::ActivateHidden("customer".into()),
        FilterAction::ActivateHidden("customer".into()),
    ]);
    assert_eq!(state.activated_hidden_filters, vec!["customer", "customer"]);
}

#[test]
fn activation_alone_does_not_set_a_value() {
    let state = state_with(vec![FilterAction::ActivateHidden("customer".into())]);
    assert!(state.is_activated("customer"));
    assert!(!state.has_active_filters());
}

#[test]
fn remove_all_additional_then_reactivate_leaves_no_value() {
    let state = state_with(vec![
        FilterAction::ActivateHidden("customer".into()),
        set("customer", "ada"),
        set("status", "paid"),
        FilterAction::RemoveAllAdditional,
        FilterAction::ActivateHidden("customer".into()),
    ]);

    assert!(!state.filter_values.contains_key("customer"));
    assert_eq!(
        state.filter_values.get("status"),
        Some(&FilterValue::from("paid")),
        "non-additional filters survive"
    );
    assert_eq!(state.activated_hidden_filters, vec!["customer"]);
}

#[test]
fn clear_all_resets_both_collections() {
    let state = state_with(vec![
        FilterAction::ActivateHidden("customer".into()),
        set("customer", "ada"),
        set("status", "paid"),
        FilterAction::ClearAll,
    ]);
    assert_eq!(state, FilterState::default());
}

#[test]
fn state_serializes_with_camel_case_keys() {
    let state = state_with(vec![
        set("status", "paid"),
        FilterAction::ActivateHidden("customer".into()),
    ]);
    let json = serde_json::to_string(&state).unwrap();
    assert_eq!(
        json,
        r#"{"filterValues":{"status":"paid"},"activatedHiddenFilters":["customer"]}"#
    );

    let back: FilterState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, state);
}

// ===== Partitioning =====

#[test]
fn falls_back_to_declaration_order_when_nothing_pinned() {
    let config = payments_config();
    let visible: Vec<&str> = config
        .default_visible_filters()
        .iter()
        .map(|f| f.key.as_str())
        .collect();
    assert_eq!(visible, vec!["status", "query"]);

    let hidden: Vec<&str> = config
        .hidden_filters()
        .iter()
        .map(|f| f.key.as_str())
        .collect();
    assert_eq!(hidden, vec!["customer", "terminal", "currency"]);
}

#[test]
fn pinned_filters_win_and_are_capped() {
    let config = FilterConfig::new(vec![
        FilterDefinition::text("a", "A"),
        FilterDefinition::text("b", "B").pinned(),
        FilterDefinition::text("c", "C").pinned(),
        FilterDefinition::text("d", "D").pinned(),
    ])
    .with_max_visible(2);

    let visible: Vec<&str> = config
        .default_visible_filters()
        .iter()
        .map(|f| f.key.as_str())
        .collect();
    assert_eq!(visible, vec!["b", "c"]);

    let hidden: Vec<&str> = config
        .hidden_filters()
        .iter()
        .map(|f| f.key.as_str())
        .collect();
    assert_eq!(hidden, vec!["a", "d"]);
}

#[test]
fn activated_and_available_partition_the_hidden_set() {
    let config = payments_config();
    let state = state_with(vec![
        FilterAction::ActivateHidden("currency".into()),
        FilterAction::ActivateHidden("customer".into()),
        FilterAction::ActivateHidden("currency".into()),
    ]);

    let activated: Vec<&str> = config
        .activated_hidden_filter_configs(&state)
        .iter()
        .map(|f| f.key.as_str())
        .collect();
    assert_eq!(activated, vec!["currency", "customer"], "activation order, no repeats");

    let available: Vec<&str> = config
        .available_hidden_filters(&state)
        .iter()
        .map(|f| f.key.as_str())
        .collect();
    assert_eq!(available, vec!["terminal"]);
}

#[test]
fn is_hidden_rejects_visible_and_unknown_keys() {
    let config = payments_config();
    assert!(config.is_hidden("currency"));
    assert!(config.is_hidden("terminal"));
    assert!(!config.is_hidden("status"));
    assert!(!config.is_hidden("nope"));
}
