//! Filter store: the reducer plus session persistence and change notification.
//!
//! Every dispatch runs the pure reducer, then commits:
//! 1. Persist the serialized state if it differs from the last persisted copy.
//! 2. Schedule a debounced `on_filters_change` for the settled values, fired only
//!    when they differ from the last values notified.

use super::debounce::Debouncer;
use super::filter::{reduce, FilterAction, FilterConfig, FilterState};
use crate::model::{FilterDefinition, FilterMap, FilterValue};
use crate::storage::SharedStore;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Default quiet period before filter changes are announced.
pub const DEFAULT_FILTER_DEBOUNCE: Duration = Duration::from_millis(300);

/// Consumer callback for settled filter changes.
pub type FiltersChanged = Arc<dyn Fn(&FilterMap) + Send + Sync>;

/// Construction options for a [`FilterStore`].
#[derive(Debug, Clone)]
pub struct FilterStoreOptions {
    /// Declarative filter bar.
    pub config: FilterConfig,
    /// Explicit starting values; these win over persisted ones.
    pub initial_values: FilterMap,
    /// Session key to persist under. `None` disables persistence.
    pub session_key: Option<String>,
    /// Quiet period for change notification.
    pub debounce: Duration,
}

impl FilterStoreOptions {
    /// Options over `config` with no persistence and the default debounce.
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            initial_values: FilterMap::new(),
            session_key: None,
            debounce: DEFAULT_FILTER_DEBOUNCE,
        }
    }

    /// Persist under `key`.
    pub fn session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = Some(key.into());
        self
    }

    /// Explicit starting values.
    pub fn initial_values(mut self, values: FilterMap) -> Self {
        self.initial_values = values;
        self
    }

    /// Override the notification quiet period.
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Remembers the last announced values so equal writes are not re-announced.
#[derive(Clone)]
struct Notifier {
    last: Arc<Mutex<FilterMap>>,
    callback: Option<FiltersChanged>,
}

impl Notifier {
    fn notify(&self, values: FilterMap) {
        {
            let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            if *last == values {
                return;
            }
            *last = values.clone();
        }
        debug!(count = values.len(), "Filters settled");
        if let Some(callback) = &self.callback {
            callback(&values);
        }
    }
}

/// Filter state for one navigable view.
pub struct FilterStore {
    config: FilterConfig,
    state: FilterState,
    session_key: Option<String>,
    storage: SharedStore,
    last_persisted: Option<String>,
    notifier: Notifier,
    debouncer: Debouncer,
}

impl FilterStore {
    /// Build the store, merging persisted session state with explicit initial values.
    ///
    /// Persisted activations that no longer belong to the hidden partition are dropped.
    /// Storage failures are logged and treated as "nothing persisted".
    pub fn new(options: FilterStoreOptions, storage: SharedStore) -> Self {
        let FilterStoreOptions {
            config,
            initial_values,
            session_key,
            debounce,
        } = options;

        let (persisted, last_persisted) = match &session_key {
            Some(key) => load_persisted(&storage, key),
            None => (FilterState::default(), None),
        };

        let mut state = persisted;
        state
            .activated_hidden_filters
            .retain(|key| config.is_hidden(key));
        state.filter_values.extend(initial_values);

        let notifier = Notifier {
            last: Arc::new(Mutex::new(state.filter_values.clone())),
            callback: None,
        };

        Self {
            config,
            state,
            session_key,
            storage,
            last_persisted,
            notifier,
            debouncer: Debouncer::new(debounce),
        }
    }

    /// Register the consumer notified on settled changes.
    pub fn on_filters_change(mut self, callback: FiltersChanged) -> Self {
        self.notifier.callback = Some(callback);
        self
    }

    // ===== Actions =====

    /// Apply an action, then persist and schedule notification.
    pub fn dispatch(&mut self, action: FilterAction) {
        debug!(?action, "Filter action");
        let clears_all = matches!(action, FilterAction::ClearAll);
        self.state = reduce(std::mem::take(&mut self.state), action);
        if clears_all {
            self.clear_persisted();
        }
        self.commit();
    }

    /// Set (or with `None`, clear) one filter.
    pub fn set_filter(&mut self, key: impl Into<String>, value: Option<FilterValue>) {
        self.dispatch(FilterAction::SetFilter {
            key: key.into(),
            value,
        });
    }

    /// Clear one filter and its activation.
    pub fn clear_filter(&mut self, key: impl Into<String>) {
        self.dispatch(FilterAction::ClearFilter(key.into()));
    }

    /// Clear every filter and the persisted copy.
    pub fn clear_all(&mut self) {
        self.dispatch(FilterAction::ClearAll);
    }

    /// Surface a hidden filter.
    ///
    /// Returns `false` without dispatching when `key` is not in the hidden partition.
    pub fn activate_hidden_filter(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        if !self.config.is_hidden(&key) {
            debug!(key = %key, "Ignoring activation of non-hidden filter");
            return false;
        }
        self.dispatch(FilterAction::ActivateHidden(key));
        true
    }

    /// Drop every surfaced hidden filter and its value.
    pub fn remove_all_additional(&mut self) {
        self.dispatch(FilterAction::RemoveAllAdditional);
    }

    /// Announce a pending change now. Returns whether one was pending.
    pub fn flush(&mut self) -> bool {
        self.debouncer.flush()
    }

    // ===== Accessors =====

    /// Full state.
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Current values.
    pub fn filter_values(&self) -> &FilterMap {
        &self.state.filter_values
    }

    /// Value of one filter.
    pub fn value(&self, key: &str) -> Option<&FilterValue> {
        self.state.filter_values.get(key)
    }

    /// Surfaced hidden filter keys.
    pub fn activated_hidden_filters(&self) -> &[String] {
        &self.state.activated_hidden_filters
    }

    /// Declarative config.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Filters shown by default.
    pub fn default_visible_filters(&self) -> Vec<&FilterDefinition> {
        self.config.default_visible_filters()
    }

    /// Filters hidden by default.
    pub fn hidden_filters(&self) -> Vec<&FilterDefinition> {
        self.config.hidden_filters()
    }

    /// Hidden filters currently surfaced.
    pub fn activated_hidden_filter_configs(&self) -> Vec<&FilterDefinition> {
        self.config.activated_hidden_filter_configs(&self.state)
    }

    /// Hidden filters still available to surface.
    pub fn available_hidden_filters(&self) -> Vec<&FilterDefinition> {
        self.config.available_hidden_filters(&self.state)
    }

    /// Whether any filter is set.
    pub fn has_active_filters(&self) -> bool {
        self.state.has_active_filters()
    }

    // ===== Commit =====

    fn commit(&mut self) {
        self.persist();

        let values = self.state.filter_values.clone();
        let notifier = self.notifier.clone();
        self.debouncer.schedule(move || notifier.notify(values));
    }

    fn persist(&mut self) {
        let Some(key) = &self.session_key else {
            return;
        };

        let serialized = match serde_json::to_string(&self.state) {
            Ok(serialized) => serialized,
            Err(err) => {
                warn!(key = %key, error = %err, "Failed to serialize filter state");
                return;
            }
        };

        if self.last_persisted.as_deref() == Some(serialized.as_str()) {
            return;
        }

        match self.storage.set(key, &serialized) {
            Ok(()) => self.last_persisted = Some(serialized),
            Err(err) => warn!(key = %key, error = %err, "Failed to persist filter state"),
        }
    }

    fn clear_persisted(&mut self) {
        let Some(key) = &self.session_key else {
            return;
        };
        if let Err(err) = self.storage.remove(key) {
            warn!(key = %key, error = %err, "Failed to clear persisted filter state");
        }
        // The empty state is now what storage implicitly holds.
        self.last_persisted = serde_json::to_string(&FilterState::default()).ok();
    }
}

impl std::fmt::Debug for FilterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterStore")
            .field("state", &self.state)
            .field("session_key", &self.session_key)
            .field("debouncer", &self.debouncer)
            .finish()
    }
}

fn load_persisted(storage: &SharedStore, key: &str) -> (FilterState, Option<String>) {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return (FilterState::default(), None),
        Err(err) => {
            warn!(key = %key, error = %err, "Failed to read persisted filter state");
            return (FilterState::default(), None);
        }
    };

    match serde_json::from_str::<FilterState>(&raw) {
        Ok(state) => (state, Some(raw)),
        Err(err) => {
            warn!(key = %key, error = %err, "Ignoring unreadable persisted filter state");
            (FilterState::default(), None)
        }
    }
}

#[cfg(test)]
#[path = "filter_store_tests.rs"]
mod tests;
