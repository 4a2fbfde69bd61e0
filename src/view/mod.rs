//! TUI rendering and terminal management (impure shell)
//!
//! The event loop never blocks on a fetch: navigation operations are spawned on the
//! tokio runtime and every frame renders from a fresh navigation snapshot.

mod detail;
pub mod layout;
mod styles;

pub use detail::detail_lines;
pub use layout::{calculate_areas, columns_to_px, px_to_columns, Screen, ScreenAreas};
pub use styles::{ColorConfig, ViewStyles};

use crate::model::{FetchError, FilterValue, Record, QUERY_FILTER_KEY, STATUS_FILTER_KEY};
use crate::state::{Cursor, FilterStore, NavigationManager, PanelId, PanelRegistry};
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
        MouseEventKind,
    },
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::future::Future;
use std::io::{self, Stdout};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, info};

/// Panel id of the record detail panel.
pub const DETAIL_PANEL: &str = "record-detail";

/// Pixels added or removed per keyboard resize step.
pub const RESIZE_STEP_PX: u32 = 40;

/// Errors that can occur during TUI operations
#[derive(Debug, Error)]
pub enum TuiError {
    /// IO error during terminal operations
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),

    /// Viewer started outside a tokio runtime
    #[error("No async runtime: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
}

/// The managers a viewer drives.
pub struct ViewerParts {
    /// Navigation over the record collection.
    pub navigation: NavigationManager<Record>,
    /// Filter bar state. Its change callback should forward to `navigation`.
    pub filters: FilterStore,
    /// Side panel lifecycle.
    pub panels: PanelRegistry,
    /// Render styles.
    pub styles: ViewStyles,
    /// Pixel width of one terminal column, used to express panel widths.
    pub cell_width_px: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputMode {
    Browse,
    Query(String),
}

/// Main TUI application
///
/// Generic over backend to support testing with TestBackend
pub struct TuiApp<B>
where
    B: Backend,
{
    terminal: Terminal<B>,
    runtime: Handle,
    navigation: NavigationManager<Record>,
    filters: FilterStore,
    panels: PanelRegistry,
    styles: ViewStyles,
    cell_width_px: u16,
    input: InputMode,
    /// Last rendered areas (for mouse hit testing)
    last_areas: Option<ScreenAreas>,
}

impl TuiApp<CrosstermBackend<Stdout>> {
    /// Create and initialize a new TUI application
    ///
    /// Sets up terminal in raw mode with alternate screen and mouse capture.
    pub fn new(parts: ViewerParts, runtime: Handle) -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(crossterm::event::EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Self::with_terminal(terminal, parts, runtime)
    }

    /// Run the event loop until the user quits (q or Ctrl+C).
    ///
    /// Redraws on every input event and on a short tick so fetch results show up
    /// without user input.
    pub fn run(&mut self) -> Result<(), TuiError> {
        const TICK: Duration = Duration::from_millis(100);

        self.start();
        loop {
            self.draw()?;
            if !event::poll(TICK)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if self.handle_key(key) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => self.handle_mouse(mouse),
                Event::Resize(width, _) => self.handle_resize(width),
                _ => {}
            }
        }
    }
}

impl<B> TuiApp<B>
where
    B: Backend,
{
    /// Build an app over an already initialized terminal.
    ///
    /// The panel registry learns the viewport width from the terminal size.
    pub fn with_terminal(
        terminal: Terminal<B>,
        parts: ViewerParts,
        runtime: Handle,
    ) -> Result<Self, TuiError> {
        let ViewerParts {
            navigation,
            filters,
            panels,
            styles,
            cell_width_px,
        } = parts;

        let width = terminal.size()?.width;
        panels.set_viewport_width(columns_to_px(width, cell_width_px));

        Ok(Self {
            terminal,
            runtime,
            navigation,
            filters,
            panels,
            styles,
            cell_width_px,
            input: InputMode::Browse,
            last_areas: None,
        })
    }

    /// Kick off the initial load.
    pub fn start(&self) {
        self.spawn_navigation(|nav| async move { nav.refresh().await.map(drop) });
    }

    fn spawn_navigation<F, Fut>(&self, op: F)
    where
        F: FnOnce(NavigationManager<Record>) -> Fut,
        Fut: Future<Output = Result<(), FetchError>> + Send + 'static,
    {
        let fut = op(self.navigation.clone());
        self.runtime.spawn(async move {
            if let Err(err) = fut.await {
                debug!(error = %err, "Navigation operation failed");
            }
        });
    }

    fn detail_panel() -> PanelId {
        PanelId::from(DETAIL_PANEL)
    }

    // ===== Input =====

    /// Handle a single keyboard event
    ///
    /// Returns true if app should quit
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        if let InputMode::Query(buffer) = &mut self.input {
            match key.code {
                KeyCode::Char(ch) => buffer.push(ch),
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Enter => {
                    let query = buffer.trim().to_string();
                    self.input = InputMode::Browse;
                    let value = (!query.is_empty()).then(|| FilterValue::from(query));
                    self.filters.set_filter(QUERY_FILTER_KEY, value);
                }
                KeyCode::Esc => self.input = InputMode::Browse,
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('n') => {
                self.spawn_navigation(|nav| async move { nav.navigate_next().await.map(drop) })
            }
            KeyCode::Char('p') => self.spawn_navigation(|nav| async move {
                nav.navigate_previous().await.map(drop)
            }),
            KeyCode::Char(']') => self.go_to_relative_page(1),
            KeyCode::Char('[') => self.go_to_relative_page(-1),
            KeyCode::Enter => self.open_detail(),
            KeyCode::Esc => {
                self.panels.close_panel(Self::detail_panel());
            }
            KeyCode::Char('<') => self.resize_detail_by(i64::from(RESIZE_STEP_PX)),
            KeyCode::Char('>') => self.resize_detail_by(-i64::from(RESIZE_STEP_PX)),
            KeyCode::Char('s') => self.cycle_status(),
            KeyCode::Char('/') => {
                let current = self
                    .filters
                    .value(QUERY_FILTER_KEY)
                    .map(FilterValue::label)
                    .unwrap_or_default();
                self.input = InputMode::Query(current);
            }
            KeyCode::Char('a') => self.activate_next_hidden_filter(),
            KeyCode::Char('x') => self.filters.remove_all_additional(),
            KeyCode::Char('c') => self.filters.clear_all(),
            KeyCode::Char('r') => {
                self.spawn_navigation(|nav| async move { nav.refresh().await.map(drop) })
            }
            _ => {}
        }
        false
    }

    /// Move the selection within the current page. Page changes go through n/p.
    fn move_selection(&self, delta: isize) {
        let state = self.navigation.snapshot();
        let Some(last) = state.data.len().checked_sub(1) else {
            return;
        };
        let target = match state.current_index() {
            Some(index) => index.saturating_add_signed(delta).min(last),
            None => 0,
        };
        self.navigation.select_at(target);
    }

    fn go_to_relative_page(&self, delta: isize) {
        let current = self.navigation.snapshot().current_page;
        let target = current.saturating_add_signed(delta).max(1);
        self.spawn_navigation(move |nav| async move { nav.go_to_page(target).await.map(drop) });
    }

    fn open_detail(&self) {
        if self.navigation.selected_entity_id().is_none() {
            self.navigation.select_at(0);
        }
        self.panels.open_panel(Self::detail_panel());
    }

    fn resize_detail_by(&self, delta: i64) {
        let Some(panel) = self.panels.get_panel(&Self::detail_panel()) else {
            return;
        };
        if !panel.open {
            return;
        }
        let width = i64::from(panel.width).saturating_add(delta).max(0);
        let width = u32::try_from(width).unwrap_or(u32::MAX);
        self.panels.set_width(Self::detail_panel(), width);
    }

    /// Step the status filter through its options. The `all` option clears it.
    fn cycle_status(&mut self) {
        let Some(options) = self
            .filters
            .config()
            .definition(STATUS_FILTER_KEY)
            .map(|definition| definition.options.clone())
        else {
            return;
        };
        if options.is_empty() {
            return;
        }

        let position = match self.filters.value(STATUS_FILTER_KEY) {
            Some(value) => {
                let current = value.label();
                options.iter().position(|o| *o == current)
            }
            None => options.iter().position(|o| o == "all"),
        };
        let next = &options[position.map_or(0, |i| (i + 1) % options.len())];

        let value = (next != "all").then(|| FilterValue::from(next.as_str()));
        self.filters.set_filter(STATUS_FILTER_KEY, value);
    }

    fn activate_next_hidden_filter(&mut self) {
        let next = self
            .filters
            .available_hidden_filters()
            .first()
            .map(|definition| definition.key.clone());
        if let Some(key) = next {
            self.filters.activate_hidden_filter(key);
        }
    }

    /// Handle mouse events: row clicks, scrolling, and panel border drags.
    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let areas = self.last_areas;
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let on_border = areas
                    .and_then(|a| a.panel)
                    .is_some_and(|panel| is_left_border(panel, mouse.column, mouse.row));
                if on_border {
                    self.panels.start_resize(Self::detail_panel());
                    return;
                }
                if let Some(table) = areas.map(|a| a.table) {
                    self.click_row(table, mouse.column, mouse.row);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let x = columns_to_px(mouse.column, self.cell_width_px);
                if let Some(width) = self.panels.pointer_moved(x) {
                    debug!(width, "Panel resized by drag");
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(id) = self.panels.resizing_panel() {
                    self.panels.stop_resize(id);
                }
            }
            MouseEventKind::ScrollDown => self.move_selection(1),
            MouseEventKind::ScrollUp => self.move_selection(-1),
            _ => {}
        }
    }

    /// Select the table row under the pointer. Rows start below the border and header.
    fn click_row(&self, table: Rect, column: u16, row: u16) {
        let first_row = table.y + 2;
        let inside = column > table.x && column < table.right().saturating_sub(1);
        if !inside || row < first_row || row >= table.bottom().saturating_sub(1) {
            return;
        }
        self.navigation.select_at(usize::from(row - first_row));
    }

    fn handle_resize(&mut self, width: u16) {
        debug!(width, "Terminal resized");
        let width = if width > 0 { width } else { 80 };
        self.panels
            .set_viewport_width(columns_to_px(width, self.cell_width_px));
    }

    // ===== Rendering =====

    /// Render the current frame
    fn draw(&mut self) -> Result<(), TuiError> {
        let state = self.navigation.snapshot();
        let panel = self.panels.get_panel(&Self::detail_panel());
        let resizing = self.panels.pointer_affordance().cursor == Cursor::ColumnResize;

        let size = self.terminal.size()?;
        let frame_area = Rect::new(0, 0, size.width.max(1), size.height);
        let panel_columns = panel
            .filter(|p| p.open || p.is_closing)
            .map(|p| px_to_columns(p.width, self.cell_width_px));
        self.last_areas = Some(calculate_areas(frame_area, panel_columns));

        let query_input = match &self.input {
            InputMode::Query(buffer) => Some(buffer.as_str()),
            InputMode::Browse => None,
        };
        let screen = Screen {
            navigation: &state,
            panel,
            filters: &self.filters,
            query_input,
            resizing,
            cell_width_px: self.cell_width_px,
            styles: &self.styles,
        };

        self.terminal
            .draw(|frame| layout::render_layout(frame, &screen))?;
        Ok(())
    }
}

fn is_left_border(panel: Rect, column: u16, row: u16) -> bool {
    let near = column == panel.x || column.saturating_add(1) == panel.x;
    near && row >= panel.y && row < panel.bottom()
}

/// Initialize and run the TUI until the user quits.
///
/// Must be called from inside a tokio runtime context (the caller enters it); fetches
/// and timers are spawned there while this thread owns the terminal.
///
/// Note: Logging must be initialized by caller before calling this function.
pub fn run_viewer(parts: ViewerParts) -> Result<(), TuiError> {
    let runtime = Handle::try_current()?;
    let mut app = TuiApp::new(parts, runtime)?;
    info!("Viewer started");

    // Run the app and ensure cleanup happens even on error
    let result = app.run();

    // Always restore terminal state
    restore_terminal()?;

    result
}

/// Restore terminal to normal state
///
/// Disables raw mode, mouse capture, and leaves alternate screen
fn restore_terminal() -> Result<(), TuiError> {
    disable_raw_mode()?;
    io::stdout().execute(crossterm::event::DisableMouseCapture)?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
