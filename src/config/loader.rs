//! Configuration file loading with precedence handling.

use crate::model::FilterDefinition;
use crate::state::{FilterConfig, PanelOptions, DEFAULT_MAX_VISIBLE_FILTERS, DEFAULT_PAGE_SIZE};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "BOVIEW_CONFIG";

/// Environment variable overriding the page size.
pub const PAGE_SIZE_ENV_VAR: &str = "BOVIEW_PAGE_SIZE";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file path contains invalid UTF-8 or cannot be resolved.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/boview/config.toml`.
///
/// ```toml
/// page_size = 40
/// panel_min_width = 480
///
/// [[filters]]
/// key = "statusFilter"
/// label = "Status"
/// kind = "select"
/// options = ["all", "paid", "failed"]
/// visible = true
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Rows per page.
    #[serde(default)]
    pub page_size: Option<usize>,

    /// Narrowest side panel width in pixels.
    #[serde(default)]
    pub panel_min_width: Option<u32>,

    /// Delay before a closed panel is removed, in milliseconds.
    #[serde(default)]
    pub panel_close_grace_ms: Option<u64>,

    /// Quiet period before panel widths follow a viewport resize, in milliseconds.
    #[serde(default)]
    pub viewport_debounce_ms: Option<u64>,

    /// Quiet period before filter edits trigger a re-fetch, in milliseconds.
    #[serde(default)]
    pub filter_debounce_ms: Option<u64>,

    /// Cap on filters shown by default.
    #[serde(default)]
    pub max_visible_filters: Option<usize>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Path of the JSON file holding UI preferences (panel widths, filter sessions).
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,

    /// Pixel width of one terminal column, for panel width conversion.
    #[serde(default)]
    pub cell_width_px: Option<u16>,

    /// Filter bar declaration, replacing the built-in one.
    #[serde(default)]
    pub filters: Option<Vec<FilterDefinition>>,

    /// Extra filters that always start hidden.
    #[serde(default)]
    pub additional_filters: Option<Vec<FilterDefinition>>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Rows per page.
    pub page_size: usize,
    /// Narrowest side panel width in pixels.
    pub panel_min_width: u32,
    /// Close grace.
    pub panel_close_grace: Duration,
    /// Viewport reclamp debounce.
    pub viewport_debounce: Duration,
    /// Filter notification debounce.
    pub filter_debounce: Duration,
    /// Cap on default-visible filters.
    pub max_visible_filters: usize,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
    /// Path of the preferences file.
    pub preferences_path: PathBuf,
    /// Pixel width of one terminal column.
    pub cell_width_px: u16,
    /// Filter bar declaration.
    pub filters: Vec<FilterDefinition>,
    /// Extra hidden filters.
    pub additional_filters: Vec<FilterDefinition>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let panel = PanelOptions::default();
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            panel_min_width: panel.min_width,
            panel_close_grace: panel.close_grace,
            viewport_debounce: panel.viewport_debounce,
            filter_debounce: crate::state::DEFAULT_FILTER_DEBOUNCE,
            max_visible_filters: DEFAULT_MAX_VISIBLE_FILTERS,
            log_file_path: default_log_path(),
            preferences_path: default_preferences_path(),
            cell_width_px: 8,
            filters: default_filters(),
            additional_filters: default_additional_filters(),
        }
    }
}

impl ResolvedConfig {
    /// Filter bar config for the filter store.
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig::new(self.filters.clone())
            .with_additional(self.additional_filters.clone())
            .with_max_visible(self.max_visible_filters)
    }

    /// Panel registry options. The viewport is left at its default until the host
    /// measures the terminal.
    pub fn panel_options(&self) -> PanelOptions {
        PanelOptions {
            min_width: self.panel_min_width,
            close_grace: self.panel_close_grace,
            viewport_debounce: self.viewport_debounce,
            ..PanelOptions::default()
        }
    }
}

/// Built-in filter bar for payment-like records.
pub fn default_filters() -> Vec<FilterDefinition> {
    vec![
        FilterDefinition::select(
            crate::model::STATUS_FILTER_KEY,
            "Status",
            &["all", "paid", "pending", "failed", "refunded"],
        )
        .pinned(),
        FilterDefinition::text(crate::model::QUERY_FILTER_KEY, "Search").pinned(),
        FilterDefinition::text("customer", "Customer"),
        FilterDefinition::text("currency", "Currency"),
    ]
}

/// Built-in additional filters.
pub fn default_additional_filters() -> Vec<FilterDefinition> {
    vec![
        FilterDefinition::text("paymentMethod", "Payment method"),
        FilterDefinition::text("terminal", "Terminal"),
    ]
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/boview/boview.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    match dirs::state_dir() {
        Some(state_dir) => state_dir.join("boview").join("boview.log"),
        None => PathBuf::from("boview.log"),
    }
}

/// Resolve default preferences path, next to the log file.
pub fn default_preferences_path() -> PathBuf {
    match dirs::state_dir() {
        Some(state_dir) => state_dir.join("boview").join("preferences.json"),
        None => PathBuf::from("boview-preferences.json"),
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/boview/config.toml` on Unix, appropriate path on other platforms.
/// Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("boview").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `BOVIEW_CONFIG` environment variable
/// 3. Default path `~/.config/boview/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `BOVIEW_PAGE_SIZE`: Override page size (ignored unless a positive integer)
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(raw) = std::env::var(PAGE_SIZE_ENV_VAR) {
        match raw.trim().parse::<usize>() {
            Ok(page_size) if page_size > 0 => config.page_size = page_size,
            _ => tracing::warn!(value = %raw, "Ignoring invalid {PAGE_SIZE_ENV_VAR}"),
        }
    }

    config
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    let millis = |value: Option<u64>, default: Duration| {
        value.map(Duration::from_millis).unwrap_or(default)
    };

    ResolvedConfig {
        page_size: config
            .page_size
            .filter(|n| *n > 0)
            .unwrap_or(defaults.page_size),
        panel_min_width: config.panel_min_width.unwrap_or(defaults.panel_min_width),
        panel_close_grace: millis(config.panel_close_grace_ms, defaults.panel_close_grace),
        viewport_debounce: millis(config.viewport_debounce_ms, defaults.viewport_debounce),
        filter_debounce: millis(config.filter_debounce_ms, defaults.filter_debounce),
        max_visible_filters: config
            .max_visible_filters
            .unwrap_or(defaults.max_visible_filters),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
        preferences_path: config.preferences_path.unwrap_or(defaults.preferences_path),
        cell_width_px: config
            .cell_width_px
            .filter(|n| *n > 0)
            .unwrap_or(defaults.cell_width_px),
        filters: config.filters.unwrap_or(defaults.filters),
        additional_filters: config
            .additional_filters
            .unwrap_or(defaults.additional_filters),
    }
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only applies overrides for flags that were explicitly set by the user.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    page_size_override: Option<usize>,
) -> ResolvedConfig {
    if let Some(page_size) = page_size_override.filter(|n| *n > 0) {
        config.page_size = page_size;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
