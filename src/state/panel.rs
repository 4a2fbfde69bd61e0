//! Panel lifecycle registry.
//!
//! Process-wide store of named side panels. Tracks open/closing/resizing state and
//! width per panel, defers removal of a closed panel until its close animation has
//! had time to run, and persists widths through a [`KeyValueStore`].
//!
//! # Close grace
//!
//! `close_panel` only flags the entry as closing and arms a timer. The timer is a
//! tokio task tagged with a close generation; reopening aborts it, and the task
//! re-checks both the generation and `is_closing` under the lock before deleting.
//!
//! [`KeyValueStore`]: crate::storage::KeyValueStore

use super::debounce::Debouncer;
use crate::storage::{panel_width_key, SharedStore};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Narrowest a panel may be, in pixels.
pub const MIN_PANEL_WIDTH: u32 = 420;

/// Time a closed panel stays registered so its close animation can finish.
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_millis(300);

/// Quiet period before a viewport resize reclamps panel widths.
pub const DEFAULT_VIEWPORT_DEBOUNCE: Duration = Duration::from_millis(150);

/// Viewport width assumed until the host reports one.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1920;

// ===== Types =====

/// Name of a panel, e.g. `"payment-detail"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(String);

impl PanelId {
    /// Wrap a panel name.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PanelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PanelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// State of one registered panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelState {
    /// Panel is shown.
    pub open: bool,
    /// Width in pixels.
    pub width: u32,
    /// A pointer drag is resizing this panel.
    pub is_resizing: bool,
    /// Closed, waiting out the close grace before removal.
    pub is_closing: bool,
}

/// Pointer cursor the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    /// Platform default.
    #[default]
    Default,
    /// Horizontal resize.
    ColumnResize,
}

/// Global pointer affordance, changed while a panel is being resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerAffordance {
    /// Cursor shape.
    pub cursor: Cursor,
    /// Whether text selection is allowed.
    pub text_selection: bool,
}

impl PointerAffordance {
    const RESIZING: Self = Self {
        cursor: Cursor::ColumnResize,
        text_selection: false,
    };
}

impl Default for PointerAffordance {
    fn default() -> Self {
        Self {
            cursor: Cursor::Default,
            text_selection: true,
        }
    }
}

/// Registry tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelOptions {
    /// Lower width bound and default width.
    pub min_width: u32,
    /// Delay between close and removal.
    pub close_grace: Duration,
    /// Quiet period for viewport reclamp.
    pub viewport_debounce: Duration,
    /// Viewport width before the first `set_viewport_width`.
    pub viewport_width: u32,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            min_width: MIN_PANEL_WIDTH,
            close_grace: DEFAULT_CLOSE_GRACE,
            viewport_debounce: DEFAULT_VIEWPORT_DEBOUNCE,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
        }
    }
}

/// Clamp `width` to `[min, viewport / 2]`. The lower bound wins on narrow viewports.
pub fn clamp_width(width: u32, viewport_width: u32, min_width: u32) -> u32 {
    let max = min_width.max(viewport_width / 2);
    width.clamp(min_width, max)
}

// ===== Registry internals =====

struct CloseTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

struct RegistryInner {
    panels: HashMap<PanelId, PanelState>,
    close_timers: HashMap<PanelId, CloseTimer>,
    close_generation: u64,
    resizing: Option<PanelId>,
    viewport_width: u32,
    affordance: PointerAffordance,
    route_section: Option<String>,
}

impl RegistryInner {
    fn cancel_close_timer(&mut self, id: &PanelId) {
        if let Some(timer) = self.close_timers.remove(id) {
            timer.handle.abort();
        }
    }

    fn end_resize(&mut self, id: &PanelId) {
        if let Some(state) = self.panels.get_mut(id) {
            state.is_resizing = false;
        }
        if self.resizing.as_ref() == Some(id) {
            self.resizing = None;
            self.affordance = PointerAffordance::default();
        }
    }

    /// Remove a closing panel unless it was reopened or re-closed since `generation`.
    fn finish_close(&mut self, id: &PanelId, generation: u64) {
        if self
            .close_timers
            .get(id)
            .is_some_and(|timer| timer.generation != generation)
        {
            return;
        }
        self.close_timers.remove(id);

        if self.panels.get(id).is_some_and(|state| state.is_closing) {
            self.panels.remove(id);
            debug!(panel = %id, "Panel removed after close grace");
        }
    }
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        for timer in self.close_timers.values() {
            timer.handle.abort();
        }
    }
}

// ===== PanelRegistry =====

/// Shared handle to the panel registry. Clones share state.
#[derive(Clone)]
pub struct PanelRegistry {
    inner: Arc<Mutex<RegistryInner>>,
    viewport_debouncer: Arc<Mutex<Debouncer>>,
    storage: SharedStore,
    options: PanelOptions,
}

impl PanelRegistry {
    /// Empty registry persisting widths to `storage`.
    pub fn new(storage: SharedStore, options: PanelOptions) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                panels: HashMap::new(),
                close_timers: HashMap::new(),
                close_generation: 0,
                resizing: None,
                viewport_width: options.viewport_width,
                affordance: PointerAffordance::default(),
                route_section: None,
            })),
            viewport_debouncer: Arc::new(Mutex::new(Debouncer::new(options.viewport_debounce))),
            storage,
            options,
        }
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut RegistryInner) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    // ===== Open / close =====

    /// Open `id`, cancelling any pending removal.
    ///
    /// A new entry starts from the persisted width, or the minimum width, clamped
    /// to the current viewport.
    pub fn open_panel(&self, id: impl Into<PanelId>) -> PanelState {
        let id = id.into();
        let known = self.with_inner(|inner| inner.panels.contains_key(&id));
        let persisted = if known { None } else { self.persisted_width(&id) };
        let min_width = self.options.min_width;

        self.with_inner(|inner| {
            inner.cancel_close_timer(&id);
            inner.end_resize(&id);

            let viewport = inner.viewport_width;
            let state = inner.panels.entry(id.clone()).or_insert(PanelState {
                open: false,
                width: persisted.unwrap_or(min_width),
                is_resizing: false,
                is_closing: false,
            });
            state.open = true;
            state.is_closing = false;
            state.width = clamp_width(state.width, viewport, min_width);

            debug!(panel = %id, width = state.width, "Panel opened");
            *state
        })
    }

    /// Close `id` with the animated path. Returns `false` if absent or already closing.
    ///
    /// Outside a tokio runtime there is no timer to wait on and the entry is removed
    /// immediately.
    pub fn close_panel(&self, id: impl Into<PanelId>) -> bool {
        let id = id.into();
        let grace = self.options.close_grace;
        let weak = Arc::downgrade(&self.inner);

        self.with_inner(|inner| {
            let Some(state) = inner.panels.get_mut(&id) else {
                return false;
            };
            if state.is_closing {
                return false;
            }
            state.open = false;
            state.is_closing = true;
            inner.end_resize(&id);

            inner.close_generation += 1;
            let generation = inner.close_generation;
            debug!(panel = %id, generation, "Panel closing");

            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let handle = runtime.spawn(remove_after_grace(weak, id.clone(), generation, grace));
                    if let Some(previous) = inner
                        .close_timers
                        .insert(id, CloseTimer { generation, handle })
                    {
                        previous.handle.abort();
                    }
                }
                Err(_) => inner.finish_close(&id, generation),
            }
            true
        })
    }

    /// Open a closed panel or close an open one. Returns whether it is now open.
    pub fn toggle_panel(&self, id: impl Into<PanelId>) -> bool {
        let id = id.into();
        if self.is_open(&id) {
            self.close_panel(id);
            false
        } else {
            self.open_panel(id);
            true
        }
    }

    // ===== Resize =====

    /// Begin a pointer-drag resize of `id`, ending any other resize in progress.
    ///
    /// Returns `false` if the panel is not open.
    pub fn start_resize(&self, id: impl Into<PanelId>) -> bool {
        let id = id.into();
        self.with_inner(|inner| {
            if !inner.panels.get(&id).is_some_and(|state| state.open) {
                return false;
            }
            if let Some(previous) = inner.resizing.clone() {
                inner.end_resize(&previous);
            }
            if let Some(state) = inner.panels.get_mut(&id) {
                state.is_resizing = true;
            }
            inner.resizing = Some(id);
            inner.affordance = PointerAffordance::RESIZING;
            true
        })
    }

    /// End the resize of `id` and restore the default pointer affordance.
    pub fn stop_resize(&self, id: impl Into<PanelId>) {
        let id = id.into();
        self.with_inner(|inner| inner.end_resize(&id));
    }

    /// Pointer moved to horizontal position `x` (pixels from the viewport's left edge).
    ///
    /// While a panel is resizing, its width follows the pointer from the right edge.
    /// Returns the new width, or `None` when nothing is resizing.
    pub fn pointer_moved(&self, x: u32) -> Option<u32> {
        let (id, viewport) =
            self.with_inner(|inner| Some((inner.resizing.clone()?, inner.viewport_width)))?;
        Some(self.set_width(id, viewport.saturating_sub(x)))
    }

    /// Clamp `width`, store it on the panel if registered, and persist it.
    ///
    /// Returns the clamped width.
    pub fn set_width(&self, id: impl Into<PanelId>, width: u32) -> u32 {
        let id = id.into();
        let min_width = self.options.min_width;
        let clamped = self.with_inner(|inner| {
            let clamped = clamp_width(width, inner.viewport_width, min_width);
            if let Some(state) = inner.panels.get_mut(&id) {
                state.width = clamped;
            }
            clamped
        });
        persist_width(&self.storage, &id, clamped);
        clamped
    }

    // ===== Viewport and routing =====

    /// Record a new viewport width. Panel widths are reclamped once resizing settles.
    pub fn set_viewport_width(&self, width: u32) {
        self.with_inner(|inner| inner.viewport_width = width);

        let weak = Arc::downgrade(&self.inner);
        let storage = Arc::clone(&self.storage);
        let min_width = self.options.min_width;
        self.viewport_debouncer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .schedule(move || reclamp_all(&weak, &storage, min_width));
    }

    /// Apply a pending viewport reclamp now. Returns whether one was pending.
    pub fn flush_viewport(&self) -> bool {
        self.viewport_debouncer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }

    /// Notify a navigation to `path`. Leaving the current top-level section closes
    /// every open panel. Returns how many were closed.
    pub fn route_changed(&self, path: &str) -> usize {
        let section = path
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string();

        let to_close = self.with_inner(|inner| {
            let previous = inner.route_section.replace(section.clone());
            match previous {
                Some(previous) if previous != section => {
                    let mut open: Vec<PanelId> = inner
                        .panels
                        .iter()
                        .filter(|(_, state)| state.open)
                        .map(|(id, _)| id.clone())
                        .collect();
                    open.sort();
                    open
                }
                _ => Vec::new(),
            }
        });

        if !to_close.is_empty() {
            debug!(section = %section, count = to_close.len(), "Section changed; closing panels");
        }
        to_close
            .into_iter()
            .filter(|id| self.close_panel(id.clone()))
            .count()
    }

    // ===== Accessors =====

    /// State of `id`, if registered.
    pub fn get_panel(&self, id: &PanelId) -> Option<PanelState> {
        self.with_inner(|inner| inner.panels.get(id).copied())
    }

    /// Whether `id` is registered and open.
    pub fn is_open(&self, id: &PanelId) -> bool {
        self.get_panel(id).is_some_and(|state| state.open)
    }

    /// Ids of every open panel, sorted.
    pub fn open_panel_ids(&self) -> Vec<PanelId> {
        let mut ids: Vec<PanelId> = self.with_inner(|inner| {
            inner
                .panels
                .iter()
                .filter(|(_, state)| state.open)
                .map(|(id, _)| id.clone())
                .collect()
        });
        ids.sort();
        ids
    }

    /// Panel currently being resized.
    pub fn resizing_panel(&self) -> Option<PanelId> {
        self.with_inner(|inner| inner.resizing.clone())
    }

    /// Pointer cursor and text-selection state the host should apply.
    pub fn pointer_affordance(&self) -> PointerAffordance {
        self.with_inner(|inner| inner.affordance)
    }

    /// Last reported viewport width.
    pub fn viewport_width(&self) -> u32 {
        self.with_inner(|inner| inner.viewport_width)
    }

    /// Registry tuning.
    pub fn options(&self) -> &PanelOptions {
        &self.options
    }

    fn persisted_width(&self, id: &PanelId) -> Option<u32> {
        let key = panel_width_key(id.as_str());
        match self.storage.get(&key) {
            Ok(Some(raw)) => match raw.trim().parse::<u32>() {
                Ok(width) => Some(width),
                Err(err) => {
                    warn!(key = %key, error = %err, "Ignoring unreadable persisted panel width");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(key = %key, error = %err, "Failed to read persisted panel width");
                None
            }
        }
    }
}

impl fmt::Debug for PanelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (panels, viewport) =
            self.with_inner(|inner| (inner.panels.len(), inner.viewport_width));
        f.debug_struct("PanelRegistry")
            .field("panels", &panels)
            .field("viewport_width", &viewport)
            .field("options", &self.options)
            .finish()
    }
}

async fn remove_after_grace(
    inner: Weak<Mutex<RegistryInner>>,
    id: PanelId,
    generation: u64,
    grace: Duration,
) {
    tokio::time::sleep(grace).await;
    if let Some(inner) = inner.upgrade() {
        inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .finish_close(&id, generation);
    }
}

fn reclamp_all(inner: &Weak<Mutex<RegistryInner>>, storage: &SharedStore, min_width: u32) {
    let Some(inner) = inner.upgrade() else {
        return;
    };

    let changed: Vec<(PanelId, u32)> = {
        let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
        let viewport = inner.viewport_width;
        inner
            .panels
            .iter_mut()
            .filter_map(|(id, state)| {
                let clamped = clamp_width(state.width, viewport, min_width);
                (clamped != state.width).then(|| {
                    state.width = clamped;
                    (id.clone(), clamped)
                })
            })
            .collect()
    };

    for (id, width) in &changed {
        debug!(panel = %id, width, "Panel reclamped to viewport");
        persist_width(storage, id, *width);
    }
}

fn persist_width(storage: &SharedStore, id: &PanelId, width: u32) {
    let key = panel_width_key(id.as_str());
    if let Err(err) = storage.set(&key, &width.to_string()) {
        warn!(key = %key, error = %err, "Failed to persist panel width");
    }
}

#[cfg(test)]
#[path = "panel_tests.rs"]
mod tests;
