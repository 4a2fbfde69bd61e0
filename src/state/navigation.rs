//! Navigation state manager.
//!
//! Owns the fetched page window, pagination metadata, loading/error flags and the
//! selected entity for one navigable collection. Previous/next stepping works on the
//! flattened global index and re-fetches when it crosses a page boundary.
//!
//! # Supersede guard
//!
//! Every fetch is tagged with a monotonically increasing generation and gets a fresh
//! `CancellationToken`; starting a fetch cancels the previous token. A completion
//! whose generation is no longer the latest is discarded without touching state, so
//! a slow response can never rewind the visible page.

use super::paging;
use crate::model::{
    page_size_of, Entity, EntityId, Facets, FetchError, FilterMap, PAGE_SIZE_FILTER_KEY,
    QUERY_FILTER_KEY, STATUS_FILTER_KEY,
};
use crate::source::PageFetcher;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Page size used when neither the filters nor the caller specify one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Filter keys whose change triggers a re-fetch in [`NavigationManager::update_filters`].
const GATED_FILTER_KEYS: [&str; 3] = [STATUS_FILTER_KEY, QUERY_FILTER_KEY, PAGE_SIZE_FILTER_KEY];

// ===== NavigationState =====

/// Snapshot of one navigable collection.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationState<E> {
    /// 1-based page currently held in `data`.
    pub current_page: usize,
    /// Rows per page.
    pub page_size: usize,
    /// Size of the whole filtered collection.
    pub total_items: usize,
    /// Filters the current page was fetched with.
    pub filters: FilterMap,
    /// Selected entity, which may be absent from `data` right after a page change.
    pub selected_entity_id: Option<EntityId>,
    /// Rows of the current page.
    pub data: Vec<E>,
    /// A fetch is in flight.
    pub loading: bool,
    /// Facets returned with the current page.
    pub facets: Option<Facets>,
    /// Message of the last failed fetch, cleared by the next success.
    pub error: Option<String>,
}

impl<E: Entity> NavigationState<E> {
    /// Empty state positioned on page 1.
    pub fn new(page_size: usize, filters: FilterMap) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total_items: 0,
            filters,
            selected_entity_id: None,
            data: Vec::new(),
            loading: false,
            facets: None,
            error: None,
        }
    }

    /// Position of the selected entity in `data`.
    pub fn current_index(&self) -> Option<usize> {
        let selected = self.selected_entity_id.as_ref()?;
        self.data.iter().position(|e| e.id() == selected)
    }

    /// The selected entity, or `None` when it is not on the current page.
    pub fn current_entity(&self) -> Option<&E> {
        self.current_index().map(|i| &self.data[i])
    }

    /// Zero-based position of the selected entity in the whole collection.
    pub fn global_index(&self) -> Option<usize> {
        self.current_index()
            .map(|i| paging::global_index(self.current_page, i, self.page_size))
    }

    /// Number of pages in the collection.
    pub fn total_pages(&self) -> usize {
        paging::total_pages(self.total_items, self.page_size)
    }

    /// Whether a next entity exists.
    pub fn can_go_next(&self) -> bool {
        self.global_index()
            .is_some_and(|g| paging::can_go_next(g, self.total_items))
    }

    /// Whether a previous entity exists.
    pub fn can_go_previous(&self) -> bool {
        self.global_index().is_some_and(paging::can_go_previous)
    }
}

// ===== Outcomes =====

/// Result of a fetch-backed operation that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<E> {
    /// The response was applied; these are the new page's rows.
    Applied(Vec<E>),
    /// A newer request was issued first; this response was discarded.
    Superseded,
    /// Nothing needed fetching.
    Skipped,
}

/// Result of a previous/next step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationStep {
    /// The selection moved to this entity.
    Moved(EntityId),
    /// No entity in that direction (or nothing selected).
    Unavailable,
    /// The page fetch was superseded before it landed.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepDirection {
    Next,
    Previous,
}

/// What to select once a fetched page lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arrival {
    Keep,
    First,
    Last,
}

enum StepPlan {
    Blocked,
    Select(EntityId),
    Fetch { page: usize, filters: FilterMap },
}

fn plan_step<E: Entity>(state: &NavigationState<E>, direction: StepDirection) -> StepPlan {
    let Some(index) = state.current_index() else {
        return StepPlan::Blocked;
    };
    let global = paging::global_index(state.current_page, index, state.page_size);

    let (target, neighbour) = match direction {
        StepDirection::Next if paging::can_go_next(global, state.total_items) => {
            (global + 1, index.checked_add(1))
        }
        StepDirection::Previous if paging::can_go_previous(global) => {
            (global - 1, index.checked_sub(1))
        }
        _ => return StepPlan::Blocked,
    };

    let target_page = paging::page_from_global_index(target, state.page_size);
    if target_page == state.current_page {
        return match neighbour.and_then(|i| state.data.get(i)) {
            Some(entity) => StepPlan::Select(entity.id().clone()),
            None => StepPlan::Blocked,
        };
    }

    StepPlan::Fetch {
        page: target_page,
        filters: state.filters.clone(),
    }
}

// ===== NavigationManager =====

struct NavigationInner<E> {
    state: NavigationState<E>,
    generation: u64,
    in_flight: Option<CancellationToken>,
    /// Page of the latest issued request; equals the applied page when idle.
    requested_page: usize,
    /// Filters of the latest issued request; equal the applied filters when idle.
    requested_filters: FilterMap,
}

impl<E> NavigationInner<E> {
    fn begin_request(&mut self, page: usize, filters: &FilterMap) -> (u64, CancellationToken) {
        self.generation += 1;
        self.requested_page = page;
        self.requested_filters = filters.clone();
        if let Some(previous) = self.in_flight.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        self.in_flight = Some(token.clone());
        self.state.loading = true;
        (self.generation, token)
    }

    /// Forget an abandoned or failed request so the applied window is the reference again.
    fn settle_request(&mut self) {
        self.requested_page = self.state.current_page;
        self.requested_filters = self.state.filters.clone();
    }
}

/// Shared handle to one collection's navigation state.
///
/// Cloning the handle shares the state, so several operations may be in flight
/// at once; the supersede guard decides which response wins.
pub struct NavigationManager<E> {
    inner: Arc<Mutex<NavigationInner<E>>>,
    fetcher: Arc<dyn PageFetcher<E>>,
}

impl<E> Clone for NavigationManager<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl<E: Entity> NavigationManager<E> {
    /// Manager on page 1 with `filters`. Nothing is fetched until the first operation.
    pub fn new(fetcher: Arc<dyn PageFetcher<E>>, filters: FilterMap) -> Self {
        let page_size = page_size_of(&filters).unwrap_or(DEFAULT_PAGE_SIZE);
        Self {
            inner: Arc::new(Mutex::new(NavigationInner {
                requested_page: 1,
                requested_filters: filters.clone(),
                state: NavigationState::new(page_size, filters),
                generation: 0,
                in_flight: None,
            })),
            fetcher,
        }
    }

    /// Start on `page` instead of page 1.
    pub fn starting_at(self, page: usize) -> Self {
        self.with_inner(|inner| {
            inner.state.current_page = page.max(1);
            inner.requested_page = inner.state.current_page;
        });
        self
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut NavigationInner<E>) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    // ===== Fetching =====

    /// Fetch `page` with `filters` and make it the current window.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error when this request is still the latest. The
    /// message is also recorded in [`NavigationState::error`] and the existing rows
    /// are kept.
    pub async fn fetch_page(
        &self,
        page: usize,
        filters: FilterMap,
    ) -> Result<FetchOutcome<E>, FetchError> {
        self.fetch_with(page, filters, Arrival::Keep).await
    }

    /// Re-fetch the latest requested page and filters. Also the initial load.
    pub async fn refresh(&self) -> Result<FetchOutcome<E>, FetchError> {
        let (page, filters) =
            self.with_inner(|inner| (inner.requested_page, inner.requested_filters.clone()));
        self.fetch_with(page, filters, Arrival::Keep).await
    }

    async fn fetch_with(
        &self,
        page: usize,
        filters: FilterMap,
        arrival: Arrival,
    ) -> Result<FetchOutcome<E>, FetchError> {
        let (generation, cancel) = self.with_inner(|inner| inner.begin_request(page, &filters));
        debug!(page, generation, "Fetching page");

        let result = self.fetcher.fetch(page, &filters, cancel).await;

        self.with_inner(|inner| {
            if inner.generation != generation {
                debug!(
                    page,
                    generation,
                    latest = inner.generation,
                    "Discarding superseded fetch"
                );
                return Ok(FetchOutcome::Superseded);
            }

            inner.in_flight = None;
            let state = &mut inner.state;
            state.loading = false;

            match result {
                Ok(fetched) => {
                    state.page_size = page_size_of(&filters).unwrap_or(state.page_size);
                    state.current_page = page;
                    state.filters = filters;
                    state.total_items = fetched.total;
                    state.facets = fetched.facets;
                    state.data = fetched.data;
                    state.error = None;

                    let landing = match arrival {
                        Arrival::Keep => None,
                        Arrival::First => state.data.first(),
                        Arrival::Last => state.data.last(),
                    };
                    if let Some(entity) = landing {
                        state.selected_entity_id = Some(entity.id().clone());
                    }

                    debug!(
                        page,
                        rows = state.data.len(),
                        total = state.total_items,
                        "Page applied"
                    );
                    Ok(FetchOutcome::Applied(state.data.clone()))
                }
                Err(err) => {
                    warn!(page, error = %err, "Page fetch failed");
                    state.error = Some(err.to_string());
                    inner.settle_request();
                    Err(err)
                }
            }
        })
    }

    /// Cancel any in-flight fetch; its response will be discarded.
    pub fn abort(&self) {
        self.with_inner(|inner| {
            if let Some(token) = inner.in_flight.take() {
                token.cancel();
                inner.generation += 1;
                inner.state.loading = false;
                inner.settle_request();
                debug!(generation = inner.generation, "Aborted in-flight fetch");
            }
        });
    }

    // ===== Selection =====

    /// Select `entity`, or clear the selection with `None`. Never fetches.
    pub fn set_selected_entity(&self, entity: Option<&E>) {
        let id = entity.map(|e| e.id().clone());
        self.with_inner(|inner| inner.state.selected_entity_id = id);
    }

    /// Select by id. The id need not be on the current page.
    pub fn select_id(&self, id: Option<EntityId>) {
        self.with_inner(|inner| inner.state.selected_entity_id = id);
    }

    /// Select the row at `index` on the current page.
    pub fn select_at(&self, index: usize) -> Option<EntityId> {
        self.with_inner(|inner| {
            let id = inner.state.data.get(index)?.id().clone();
            inner.state.selected_entity_id = Some(id.clone());
            Some(id)
        })
    }

    // ===== Stepping =====

    /// Move to the next entity, fetching the following page when needed.
    ///
    /// Within the page this never suspends. Across a page boundary it awaits the
    /// fetch and selects the first row of the new page.
    pub async fn navigate_next(&self) -> Result<NavigationStep, FetchError> {
        self.step(StepDirection::Next).await
    }

    /// Move to the previous entity, selecting the last row of a freshly fetched page.
    pub async fn navigate_previous(&self) -> Result<NavigationStep, FetchError> {
        self.step(StepDirection::Previous).await
    }

    async fn step(&self, direction: StepDirection) -> Result<NavigationStep, FetchError> {
        let plan = self.with_inner(|inner| plan_step(&inner.state, direction));

        match plan {
            StepPlan::Blocked => Ok(NavigationStep::Unavailable),
            StepPlan::Select(id) => {
                self.select_id(Some(id.clone()));
                Ok(NavigationStep::Moved(id))
            }
            StepPlan::Fetch { page, filters } => {
                let arrival = match direction {
                    StepDirection::Next => Arrival::First,
                    StepDirection::Previous => Arrival::Last,
                };
                match self.fetch_with(page, filters, arrival).await? {
                    FetchOutcome::Applied(rows) => {
                        let landed = match direction {
                            StepDirection::Next => rows.first(),
                            StepDirection::Previous => rows.last(),
                        };
                        Ok(landed.map_or(NavigationStep::Unavailable, |e| {
                            NavigationStep::Moved(e.id().clone())
                        }))
                    }
                    FetchOutcome::Superseded => Ok(NavigationStep::Superseded),
                    FetchOutcome::Skipped => Ok(NavigationStep::Unavailable),
                }
            }
        }
    }

    /// Jump to `page`, clamped to the known page range. Selection is left alone.
    ///
    /// Skipped when `page` is already the latest requested page.
    pub async fn go_to_page(&self, page: usize) -> Result<FetchOutcome<E>, FetchError> {
        let target = self.with_inner(|inner| {
            let page = paging::clamp_page(page, inner.state.total_pages());
            (page != inner.requested_page).then(|| (page, inner.requested_filters.clone()))
        });

        match target {
            Some((page, filters)) => self.fetch_with(page, filters, Arrival::Keep).await,
            None => Ok(FetchOutcome::Skipped),
        }
    }

    /// Apply new filters, re-fetching page 1 when status, query or page size changed.
    ///
    /// Only those three keys are compared, against the latest requested filters so a
    /// revert during an in-flight fetch still wins; other keys ride along with the
    /// next fetch. A page size change also drops the selection and resets to page 1.
    pub async fn update_filters(&self, filters: FilterMap) -> Result<FetchOutcome<E>, FetchError> {
        let changed = self.with_inner(|inner| {
            let current = &inner.requested_filters;
            let gated_change = GATED_FILTER_KEYS
                .iter()
                .any(|key| current.get(*key) != filters.get(*key));
            if !gated_change {
                return false;
            }
            if current.get(PAGE_SIZE_FILTER_KEY) != filters.get(PAGE_SIZE_FILTER_KEY) {
                inner.state.selected_entity_id = None;
                inner.state.current_page = 1;
            }
            true
        });

        if !changed {
            debug!("Filter update does not affect the fetch; skipping");
            return Ok(FetchOutcome::Skipped);
        }

        self.fetch_with(1, filters, Arrival::Keep).await
    }

    // ===== Accessors =====

    /// Clone of the full state.
    pub fn snapshot(&self) -> NavigationState<E> {
        self.with_inner(|inner| inner.state.clone())
    }

    /// The selected entity if it is on the current page.
    pub fn current_entity(&self) -> Option<E> {
        self.with_inner(|inner| inner.state.current_entity().cloned())
    }

    /// Selected id.
    pub fn selected_entity_id(&self) -> Option<EntityId> {
        self.with_inner(|inner| inner.state.selected_entity_id.clone())
    }

    /// Whether a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.with_inner(|inner| inner.state.loading)
    }

    /// Last fetch error message.
    pub fn error(&self) -> Option<String> {
        self.with_inner(|inner| inner.state.error.clone())
    }

    /// Facets of the current page.
    pub fn facets(&self) -> Option<Facets> {
        self.with_inner(|inner| inner.state.facets.clone())
    }
}

#[cfg(test)]
#[path = "navigation_tests.rs"]
mod tests;
