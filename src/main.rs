//! boview - Entry Point

use boview::config::ResolvedConfig;
use boview::integration::forward_filter_changes;
use boview::model::{FilterMap, FilterValue, PAGE_SIZE_FILTER_KEY, QUERY_FILTER_KEY, STATUS_FILTER_KEY};
use boview::source::JsonFileSource;
use boview::state::{FilterStore, FilterStoreOptions, NavigationManager, PanelRegistry};
use boview::storage::{JsonFileStore, MemoryStore, SharedStore};
use boview::view::{ColorConfig, ViewStyles, ViewerParts};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// boview - page through back-office records with a resizable detail panel
#[derive(Parser, Debug)]
#[command(name = "boview")]
#[command(version)]
#[command(about = "Browse a JSON array of records page by page with filters and a detail panel")]
pub struct Args {
    /// Path to a JSON file holding an array of records with an `id` field
    pub file: PathBuf,

    /// Records per page (must be positive)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub page_size: Option<u32>,

    /// Start with this status filter applied
    #[arg(short, long)]
    pub status: Option<String>,

    /// Start with this search query applied
    #[arg(short, long)]
    pub query: Option<String>,

    /// Key under which filter state is remembered between runs
    #[arg(long, default_value = "filters-records")]
    pub session_key: String,

    /// Simulated fetch latency in milliseconds
    #[arg(long)]
    pub latency_ms: Option<u64>,

    /// Disable colors
    #[arg(long)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Filter values given on the command line. These win over the remembered session.
    fn initial_filters(&self) -> FilterMap {
        let mut filters = FilterMap::new();
        if let Some(status) = &self.status {
            filters.insert(STATUS_FILTER_KEY.to_string(), FilterValue::from(status.as_str()));
        }
        if let Some(query) = &self.query {
            filters.insert(QUERY_FILTER_KEY.to_string(), FilterValue::from(query.as_str()));
        }
        filters
    }
}

/// Filters that stay fixed for the whole run.
fn base_filters(config: &ResolvedConfig) -> FilterMap {
    let page_size = i64::try_from(config.page_size).unwrap_or(i64::MAX);
    FilterMap::from([(PAGE_SIZE_FILTER_KEY.to_string(), FilterValue::Number(page_size))])
}

fn open_preferences(config: &ResolvedConfig) -> SharedStore {
    match JsonFileStore::open(&config.preferences_path) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            warn!(
                path = ?config.preferences_path,
                error = %err,
                "Preferences unavailable; using in-memory store"
            );
            Arc::new(MemoryStore::new())
        }
    }
}

fn build_viewer(
    args: &Args,
    config: &ResolvedConfig,
) -> Result<ViewerParts, Box<dyn std::error::Error>> {
    let mut source = JsonFileSource::load(&args.file)?;
    if let Some(ms) = args.latency_ms {
        source = source.with_latency(Duration::from_millis(ms));
    }

    let storage = open_preferences(config);
    let base = base_filters(config);

    let filter_options = FilterStoreOptions::new(config.filter_config())
        .session_key(args.session_key.clone())
        .initial_values(args.initial_filters())
        .debounce(config.filter_debounce);
    let filters = FilterStore::new(filter_options, Arc::clone(&storage));

    // Start from the remembered session merged with the command line.
    let starting = boview::integration::merge_filters(&base, filters.filter_values());
    let navigation: NavigationManager<boview::model::Record> =
        NavigationManager::new(Arc::new(source), starting);
    let filters = filters.on_filters_change(forward_filter_changes(navigation.clone(), base));

    Ok(ViewerParts {
        navigation,
        filters,
        panels: PanelRegistry::new(storage, config.panel_options()),
        styles: ViewStyles::with_color_config(ColorConfig::from_env_and_args(args.no_color)),
        cell_width_px: config.cell_width_px,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration with full precedence chain:
    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = boview::config::load_config_with_precedence(args.config.clone())?;
        let merged = boview::config::merge_config(config_file);
        let with_env = boview::config::apply_env_overrides(merged);
        let page_size = args.page_size.and_then(|n| usize::try_from(n).ok());
        boview::config::apply_cli_overrides(with_env, page_size)
    };

    boview::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        "Configuration loaded and resolved"
    );

    // Fetches and timers run on the runtime; this thread keeps the terminal.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let _guard = runtime.enter();

    let parts = build_viewer(&args, &config)?;
    boview::view::run_viewer(parts)?;

    Ok(())
}
