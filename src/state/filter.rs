//! Filter state machine (pure).
//!
//! `FilterState` is mutated only through [`reduce`], a pure transition over
//! [`FilterAction`]. Visible/hidden partitions are derived from a declarative
//! [`FilterConfig`] and never stored.

use crate::model::{FilterDefinition, FilterMap, FilterValue};
use serde::{Deserialize, Serialize};

/// Default cap on the number of filters shown in the filter bar.
pub const DEFAULT_MAX_VISIBLE_FILTERS: usize = 4;

// ===== FilterState =====

/// Active filter values plus the hidden filters the user surfaced.
///
/// Serialized as the session-persisted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Set filters. Unset filters are absent, never null.
    #[serde(default)]
    pub filter_values: FilterMap,
    /// Hidden filters surfaced into the bar, in activation order.
    #[serde(default)]
    pub activated_hidden_filters: Vec<String>,
}

impl FilterState {
    /// Whether any filter has a value.
    pub fn has_active_filters(&self) -> bool {
        !self.filter_values.is_empty()
    }

    /// Number of filters with a value.
    pub fn active_filter_count(&self) -> usize {
        self.filter_values.len()
    }

    /// Whether `key` has been surfaced from the hidden set.
    pub fn is_activated(&self, key: &str) -> bool {
        self.activated_hidden_filters.iter().any(|k| k == key)
    }
}

// ===== FilterAction =====

/// Discrete transitions of the filter state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
    /// Upsert a value; `None` behaves like [`FilterAction::ClearFilter`].
    SetFilter {
        /// Filter key.
        key: String,
        /// New value, or `None` to clear.
        value: Option<FilterValue>,
    },
    /// Remove a value and its activation.
    ClearFilter(String),
    /// Reset everything.
    ClearAll,
    /// Surface a hidden filter. Does not dedupe.
    ActivateHidden(String),
    /// Drop every surfaced hidden filter along with its value.
    RemoveAllAdditional,
}

/// Pure transition function.
pub fn reduce(mut state: FilterState, action: FilterAction) -> FilterState {
    match action {
        FilterAction::SetFilter {
            key,
            value: Some(value),
        } => {
            state.filter_values.insert(key, value);
            state
        }
        FilterAction::SetFilter { key, value: None } | FilterAction::ClearFilter(key) => {
            state.filter_values.remove(&key);
            state.activated_hidden_filters.retain(|k| k != &key);
            state
        }
        FilterAction::ClearAll => FilterState::default(),
        FilterAction::ActivateHidden(key) => {
            state.activated_hidden_filters.push(key);
            state
        }
        FilterAction::RemoveAllAdditional => {
            for key in std::mem::take(&mut state.activated_hidden_filters) {
                state.filter_values.remove(&key);
            }
            state
        }
    }
}

// ===== FilterConfig =====

/// Declarative filter bar configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Filters in declaration order.
    pub filters: Vec<FilterDefinition>,
    /// Extra filters that always start hidden.
    pub additional_filters: Vec<FilterDefinition>,
    /// Cap on default-visible filters.
    pub max_visible: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            additional_filters: Vec::new(),
            max_visible: DEFAULT_MAX_VISIBLE_FILTERS,
        }
    }
}

impl FilterConfig {
    /// Config over `filters` with the default visible cap.
    pub fn new(filters: Vec<FilterDefinition>) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    /// Add caller-supplied additional filters.
    pub fn with_additional(mut self, additional: Vec<FilterDefinition>) -> Self {
        self.additional_filters = additional;
        self
    }

    /// Override the visible cap.
    pub fn with_max_visible(mut self, max_visible: usize) -> Self {
        self.max_visible = max_visible;
        self
    }

    /// Filters shown by default.
    ///
    /// Explicitly visible filters win (capped); when none are marked, the first
    /// `max_visible` in declaration order are shown.
    pub fn default_visible_filters(&self) -> Vec<&FilterDefinition> {
        let pinned: Vec<&FilterDefinition> = self
            .filters
            .iter()
            .filter(|f| f.visible == Some(true))
            .take(self.max_visible)
            .collect();

        if pinned.is_empty() {
            self.filters.iter().take(self.max_visible).collect()
        } else {
            pinned
        }
    }

    /// Every filter not shown by default, followed by the additional filters.
    pub fn hidden_filters(&self) -> Vec<&FilterDefinition> {
        let visible = self.default_visible_filters();
        self.filters
            .iter()
            .filter(|f| !visible.iter().any(|v| v.key == f.key))
            .chain(self.additional_filters.iter())
            .collect()
    }

    /// Whether `key` belongs to the hidden partition.
    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden_filters().iter().any(|f| f.key == key)
    }

    /// Hidden filters the user surfaced, in activation order, without repeats.
    pub fn activated_hidden_filter_configs(&self, state: &FilterState) -> Vec<&FilterDefinition> {
        let hidden = self.hidden_filters();
        let mut seen: Vec<&str> = Vec::new();
        let mut result = Vec::new();
        for key in &state.activated_hidden_filters {
            if seen.contains(&key.as_str()) {
                continue;
            }
            if let Some(def) = hidden.iter().find(|f| &f.key == key) {
                seen.push(key);
                result.push(*def);
            }
        }
        result
    }

    /// Hidden filters that can still be surfaced.
    pub fn available_hidden_filters(&self, state: &FilterState) -> Vec<&FilterDefinition> {
        self.hidden_filters()
            .into_iter()
            .filter(|f| !state.is_activated(&f.key))
            .collect()
    }

    /// Look up a definition by key across both lists.
    pub fn definition(&self, key: &str) -> Option<&FilterDefinition> {
        self.filters
            .iter()
            .chain(self.additional_filters.iter())
            .find(|f| f.key == key)
    }
}

// ===== Tests =====

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
