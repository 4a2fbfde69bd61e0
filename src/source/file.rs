//! JSON file record source.
//!
//! Loads a JSON array of objects once and serves filtered pages from memory. Status
//! and free-text filters are applied here, the way a back-office API would apply them
//! server-side, and a `status` facet is computed over the query-matched rows.

use super::PageFetcher;
use crate::model::{
    page_size_of, Facets, FetchError, FilterMap, FilterValue, Page, Record, QUERY_FILTER_KEY,
    STATUS_FILTER_KEY,
};
use crate::state::navigation::DEFAULT_PAGE_SIZE;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Status filter value meaning "no status restriction".
const ALL_STATUSES: &str = "all";

/// In-memory page source backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: Option<PathBuf>,
    records: Vec<Record>,
    latency: Option<Duration>,
}

impl JsonFileSource {
    /// Read and decode `path`.
    ///
    /// The file must contain a JSON array. Elements that are not objects with an `id`
    /// are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Source`] if the file cannot be read or is not a JSON array.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FetchError> {
        let path = path.as_ref();
        let source_error = |reason: String| FetchError::Source {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| source_error(e.to_string()))?;
        let value: Value =
            serde_json::from_str(&content).map_err(|e| source_error(e.to_string()))?;
        let Value::Array(items) = value else {
            return Err(source_error("expected a JSON array of records".to_string()));
        };

        let mut records = Vec::with_capacity(items.len());
        for (position, item) in items.into_iter().enumerate() {
            match Record::from_value(item) {
                Ok(record) => records.push(record),
                Err(err) => warn!(position, error = %err, "Skipping malformed record"),
            }
        }

        info!(path = %path.display(), count = records.len(), "Loaded records");

        Ok(Self {
            path: Some(path.to_path_buf()),
            records,
            latency: None,
        })
    }

    /// Source over records already in memory.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            path: None,
            records,
            latency: None,
        }
    }

    /// Delay every response by `latency`, honouring cancellation while waiting.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// File the records were read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of records loaded, before filtering.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records were loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Apply filters and slice one page. Synchronous core of [`PageFetcher::fetch`].
    pub fn page(&self, page: usize, filters: &FilterMap) -> Page<Record> {
        let page_size = page_size_of(filters).unwrap_or(DEFAULT_PAGE_SIZE);
        let query = filters.get(QUERY_FILTER_KEY).and_then(FilterValue::as_text);
        let status = filters.get(STATUS_FILTER_KEY);

        let query_matched: Vec<&Record> = self
            .records
            .iter()
            .filter(|r| query.is_none_or(|q| r.matches_query(q)))
            .collect();

        let facets = status_facets(&query_matched);

        let matched: Vec<&Record> = query_matched
            .into_iter()
            .filter(|r| status.is_none_or(|s| status_matches(s, r.status())))
            .collect();

        let total = matched.len();
        let start = page.saturating_sub(1).saturating_mul(page_size);
        let data: Vec<Record> = matched
            .into_iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();

        Page::new(data, total).with_facets(facets)
    }
}

#[async_trait]
impl PageFetcher<Record> for JsonFileSource {
    async fn fetch(
        &self,
        page: usize,
        filters: &FilterMap,
        cancel: CancellationToken,
    ) -> Result<Page<Record>, FetchError> {
        if let Some(latency) = self.latency {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(page, "Fetch cancelled while waiting");
                    return Err(FetchError::Cancelled);
                }
                _ = tokio::time::sleep(latency) => {}
            }
        }

        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        Ok(self.page(page, filters))
    }
}

fn status_matches(filter: &FilterValue, status: Option<&str>) -> bool {
    let matches = |wanted: &str| {
        wanted.eq_ignore_ascii_case(ALL_STATUSES)
            || status.is_some_and(|s| s.eq_ignore_ascii_case(wanted))
    };
    match filter {
        FilterValue::Text(wanted) => wanted.is_empty() || matches(wanted),
        FilterValue::List(wanted) => wanted.is_empty() || wanted.iter().any(|w| matches(w)),
        FilterValue::Flag(_) | FilterValue::Number(_) => true,
    }
}

fn status_facets(records: &[&Record]) -> Facets {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for status in records.iter().filter_map(|r| r.status()) {
        *counts.entry(status.to_lowercase()).or_default() += 1;
    }
    let mut facets = Facets::new();
    facets.insert("status".to_string(), counts);
    facets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entity;
    use serde_json::json;

    fn payments(count: usize) -> JsonFileSource {
        let records = (0..count)
            .map(|i| {
                let status = if i % 3 == 0 { "failed" } else { "paid" };
                Record::from_value(json!({
                    "id": format!("pay_{i:03}"),
                    "status": status,
                    "customer": if i % 2 == 0 { "Ada Lovelace" } else { "Alan Turing" },
                    "amount": 1000 + i,
                }))
                .unwrap()
            })
            .collect();
        JsonFileSource::from_records(records)
    }

    fn filters(pairs: &[(&str, FilterValue)]) -> FilterMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn pages_with_default_size() {
        let source = payments(45);
        let page = source.page(3, &FilterMap::new());
        assert_eq!(page.total, 45);
        assert_eq!(page.data.len(), 5);
        assert_eq!(page.data[0].id().as_str(), "pay_040");
    }

    #[test]
    fn page_size_filter_controls_slice() {
        let source = payments(45);
        let page = source.page(2, &filters(&[("pageSize", FilterValue::from(10_i64))]));
        assert_eq!(page.data.len(), 10);
        assert_eq!(page.data[0].id().as_str(), "pay_010");
    }

    #[test]
    fn page_past_end_is_empty_but_keeps_total() {
        let source = payments(5);
        let page = source.page(4, &FilterMap::new());
        assert!(page.data.is_empty());
        assert_eq!(page.total, 5);
    }

    #[test]
    fn status_filter_is_case_insensitive_and_all_means_everything() {
        let source = payments(9);
        let failed = source.page(1, &filters(&[("statusFilter", FilterValue::from("FAILED"))]));
        assert_eq!(failed.total, 3);

        let all = source.page(1, &filters(&[("statusFilter", FilterValue::from("all"))]));
        assert_eq!(all.total, 9);
    }

    #[test]
    fn status_list_matches_any() {
        let source = payments(9);
        let page = source.page(
            1,
            &filters(&[(
                "statusFilter",
                FilterValue::from(vec!["failed".to_string(), "paid".to_string()]),
            )]),
        );
        assert_eq!(page.total, 9);
    }

    #[test]
    fn facets_count_statuses_over_query_matches() {
        let source = payments(6);
        let page = source.page(
            1,
            &filters(&[
                ("query", FilterValue::from("ada")),
                ("statusFilter", FilterValue::from("paid")),
            ]),
        );

        // Ada rows are 0, 2, 4; row 0 failed.
        assert_eq!(page.total, 2);
        let status = &page.facets.as_ref().unwrap()["status"];
        assert_eq!(status.get("failed"), Some(&1));
        assert_eq!(status.get("paid"), Some(&2));
    }

    #[test]
    fn load_skips_malformed_records() {
        let dir = std::env::temp_dir().join(format!("boview_source_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("records.json");
        std::fs::write(&path, r#"[{"id":"a"},{"name":"no id"},42,{"id":7}]"#).unwrap();

        let source = JsonFileSource::load(&path).unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(source.path(), Some(path.as_path()));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_rejects_non_array() {
        let dir = std::env::temp_dir().join(format!("boview_source_obj_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("records.json");
        std::fs::write(&path, r#"{"id":"a"}"#).unwrap();

        let err = JsonFileSource::load(&path).unwrap_err();
        assert!(matches!(err, FetchError::Source { .. }));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_reports_missing_file() {
        let err = JsonFileSource::load("/nonexistent/boview/records.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/boview/records.json"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_latency_aborts() {
        let source = payments(3).with_latency(Duration::from_millis(200));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let filters = FilterMap::new();
        let fetch = source.fetch(1, &filters, cancel);
        trigger.cancel();

        assert_eq!(fetch.await.unwrap_err(), FetchError::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_returns_page_after_latency() {
        let source = payments(3).with_latency(Duration::from_millis(200));
        let page = source
            .fetch(1, &FilterMap::new(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(page.total, 3);
    }
}
