//! State managers.
//!
//! Navigation, panel and filter state live here, independent of any renderer.
//! The pure parts (index math, filter reducer) are plain functions; the managers
//! wrap them with persistence, timers and the supersede guard.

pub mod debounce;
pub mod filter;
pub mod filter_store;
pub mod navigation;
pub mod paging;
pub mod panel;

// Re-export for convenience
pub use debounce::Debouncer;
pub use filter::{reduce, FilterAction, FilterConfig, FilterState, DEFAULT_MAX_VISIBLE_FILTERS};
pub use filter_store::{FilterStore, FilterStoreOptions, FiltersChanged, DEFAULT_FILTER_DEBOUNCE};
pub use navigation::{
    FetchOutcome, NavigationManager, NavigationState, NavigationStep, DEFAULT_PAGE_SIZE,
};
pub use panel::{
    clamp_width, Cursor, PanelId, PanelOptions, PanelRegistry, PanelState, PointerAffordance,
    MIN_PANEL_WIDTH,
};
