//! Filter values and declarative filter definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key carrying the status facet selection.
pub const STATUS_FILTER_KEY: &str = "statusFilter";
/// Key carrying the free-text search query.
pub const QUERY_FILTER_KEY: &str = "query";
/// Key carrying the requested page size.
pub const PAGE_SIZE_FILTER_KEY: &str = "pageSize";

/// A single filter value.
///
/// Serialized untagged so persisted session state reads as plain JSON.
/// "Not set" is modelled as absence from the [`FilterMap`], never as a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Boolean toggle.
    Flag(bool),
    /// Integer value (page size, amount bounds).
    Number(i64),
    /// Free text or a single selected option.
    Text(String),
    /// Several selected options.
    List(Vec<String>),
}

impl FilterValue {
    /// The value as text, if it is a `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a number. Numeric text is accepted.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Short human-readable rendering for filter chips.
    pub fn label(&self) -> String {
        match self {
            Self::Flag(b) => if *b { "yes" } else { "no" }.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(", "),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Active filters keyed by filter key.
///
/// Ordered so that serialized forms are stable and comparable.
pub type FilterMap = BTreeMap<String, FilterValue>;

/// Page size requested by a filter map, if any.
///
/// Non-positive values are ignored.
pub fn page_size_of(filters: &FilterMap) -> Option<usize> {
    filters
        .get(PAGE_SIZE_FILTER_KEY)
        .and_then(FilterValue::as_number)
        .filter(|n| *n > 0)
        .and_then(|n| usize::try_from(n).ok())
}

/// How a filter is edited in the filter bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Free text input.
    #[default]
    Text,
    /// Single choice among `options`.
    Select,
    /// Several choices among `options`.
    Multiselect,
    /// On/off switch.
    Toggle,
}

/// Declarative definition of one filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterDefinition {
    /// Key under which the value is stored in the [`FilterMap`].
    pub key: String,
    /// Human label.
    pub label: String,
    /// Editing widget.
    #[serde(default)]
    pub kind: FilterKind,
    /// Choices for select-like kinds.
    #[serde(default)]
    pub options: Vec<String>,
    /// `Some(true)` pins the filter to the default-visible set.
    #[serde(default)]
    pub visible: Option<bool>,
}

impl FilterDefinition {
    /// Text filter with no explicit visibility.
    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: FilterKind::Text,
            options: Vec::new(),
            visible: None,
        }
    }

    /// Single-choice filter.
    pub fn select(key: impl Into<String>, label: impl Into<String>, options: &[&str]) -> Self {
        Self {
            kind: FilterKind::Select,
            options: options.iter().map(|o| o.to_string()).collect(),
            ..Self::text(key, label)
        }
    }

    /// Mark the filter as explicitly visible by default.
    pub fn pinned(mut self) -> Self {
        self.visible = Some(true);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_values_deserialize_naturally() {
        let map: FilterMap = serde_json::from_str(
            r#"{"statusFilter":"failed","pageSize":40,"vip":true,"currency":["EUR","USD"]}"#,
        )
        .expect("valid json");

        assert_eq!(map["statusFilter"], FilterValue::Text("failed".into()));
        assert_eq!(map["pageSize"], FilterValue::Number(40));
        assert_eq!(map["vip"], FilterValue::Flag(true));
        assert_eq!(
            map["currency"],
            FilterValue::List(vec!["EUR".into(), "USD".into()])
        );
    }

    #[test]
    fn page_size_of_accepts_numbers_and_numeric_text() {
        let mut map = FilterMap::new();
        assert_eq!(page_size_of(&map), None);

        map.insert(PAGE_SIZE_FILTER_KEY.into(), FilterValue::Number(40));
        assert_eq!(page_size_of(&map), Some(40));

        map.insert(PAGE_SIZE_FILTER_KEY.into(), FilterValue::Text("25".into()));
        assert_eq!(page_size_of(&map), Some(25));

        map.insert(PAGE_SIZE_FILTER_KEY.into(), FilterValue::Number(0));
        assert_eq!(page_size_of(&map), None, "zero page size is ignored");
    }

    #[test]
    fn definition_parses_from_toml() {
        let def: FilterDefinition = toml::from_str(
            r#"
key = "statusFilter"
label = "Status"
kind = "select"
options = ["paid", "failed"]
visible = true
"#,
        )
        .expect("valid toml");

        assert_eq!(
            def,
            FilterDefinition::select("statusFilter", "Status", &["paid", "failed"]).pinned()
        );
    }

    #[test]
    fn labels_render_each_variant() {
        assert_eq!(FilterValue::Flag(true).label(), "yes");
        assert_eq!(FilterValue::Number(7).label(), "7");
        assert_eq!(FilterValue::from("EUR").label(), "EUR");
        assert_eq!(
            FilterValue::List(vec!["a".into(), "b".into()]).label(),
            "a, b"
        );
    }
}
