//! Screen layout rendering.
//!
//! Pure layout logic: header (filters), record table, optional side panel, status bar.
//! The side panel's width comes from the panel registry in pixels and is converted to
//! terminal columns through the configured cell width.

use super::detail;
use super::styles::ViewStyles;
use crate::model::{Entity, FilterValue, Record, QUERY_FILTER_KEY};
use crate::state::{FilterStore, NavigationState, PanelState};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Columns always left to the table when the panel is open.
pub const MIN_TABLE_COLUMNS: u16 = 24;

/// Most record fields shown as table columns (after the id).
const MAX_FIELD_COLUMNS: usize = 4;

/// Everything one frame needs.
pub struct Screen<'a> {
    /// Navigation snapshot.
    pub navigation: &'a NavigationState<Record>,
    /// Detail panel state, if registered.
    pub panel: Option<PanelState>,
    /// Filter store for the header.
    pub filters: &'a FilterStore,
    /// Query being typed, if the query prompt is active.
    pub query_input: Option<&'a str>,
    /// A panel resize drag is in progress.
    pub resizing: bool,
    /// Pixel width of one terminal column.
    pub cell_width_px: u16,
    /// Styles.
    pub styles: &'a ViewStyles,
}

/// Areas of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenAreas {
    /// Filter header.
    pub header: Rect,
    /// Record table.
    pub table: Rect,
    /// Side panel, when shown.
    pub panel: Option<Rect>,
    /// Status bar.
    pub status: Rect,
}

// ===== Geometry =====

/// Terminal columns needed to show `px` pixels (rounded up).
pub fn px_to_columns(px: u32, cell_width_px: u16) -> u16 {
    let cell = u32::from(cell_width_px.max(1));
    u16::try_from(px.div_ceil(cell)).unwrap_or(u16::MAX)
}

/// Pixel width of `columns` terminal columns.
pub fn columns_to_px(columns: u16, cell_width_px: u16) -> u32 {
    u32::from(columns) * u32::from(cell_width_px.max(1))
}

/// Split the frame. `panel_columns` is the requested panel width, if shown.
pub fn calculate_areas(frame_area: Rect, panel_columns: Option<u16>) -> ScreenAreas {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Filter header
            Constraint::Min(0),    // Table + panel
            Constraint::Length(1), // Status bar
        ])
        .split(frame_area);

    let content = vertical[1];
    let panel_width = panel_columns
        .map(|cols| cols.min(content.width.saturating_sub(MIN_TABLE_COLUMNS)))
        .filter(|cols| *cols > 0);

    let (table, panel) = match panel_width {
        Some(width) => {
            let horizontal = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(0), Constraint::Length(width)])
                .split(content);
            (horizontal[0], Some(horizontal[1]))
        }
        None => (content, None),
    };

    ScreenAreas {
        header: vertical[0],
        table,
        panel,
        status: vertical[2],
    }
}

/// Field names shown as table columns: first-seen order across the page, capped.
pub fn table_columns(rows: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in rows {
        for name in record.fields().keys() {
            if columns.len() == MAX_FIELD_COLUMNS {
                return columns;
            }
            if !columns.iter().any(|c| c == name) {
                columns.push(name.clone());
            }
        }
    }
    columns
}

/// Truncate `text` to `max_width` display columns, marking the cut with `…`.
pub fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

// ===== Rendering =====

/// Render the whole screen.
pub fn render_layout(frame: &mut Frame, screen: &Screen) {
    let panel_columns = screen
        .panel
        .filter(|p| p.open || p.is_closing)
        .map(|p| px_to_columns(p.width, screen.cell_width_px));
    let areas = calculate_areas(frame.area(), panel_columns);

    render_header(frame, areas.header, screen);
    render_table(frame, areas.table, screen);
    if let (Some(area), Some(panel)) = (areas.panel, screen.panel) {
        render_panel(frame, area, screen, panel);
    }
    render_status_bar(frame, areas.status, screen);
}

/// Header: visible filters with values, surfaced hidden filters, and a count of the rest.
fn render_header(frame: &mut Frame, area: Rect, screen: &Screen) {
    let filters = screen.filters;
    let mut parts: Vec<String> = vec!["boview".to_string()];

    let shown = filters
        .default_visible_filters()
        .into_iter()
        .chain(filters.activated_hidden_filter_configs());
    for definition in shown {
        let value = match screen.query_input {
            Some(input) if definition.key == QUERY_FILTER_KEY => format!("{input}_"),
            _ => filters
                .value(&definition.key)
                .map(FilterValue::label)
                .unwrap_or_else(|| "-".to_string()),
        };
        parts.push(format!("{}: {}", definition.label, value));
    }

    let available = filters.available_hidden_filters().len();
    if available > 0 {
        parts.push(format!("+{available} filters"));
    }

    let text = truncate(&parts.join(" | "), usize::from(area.width));
    frame.render_widget(
        Paragraph::new(Line::from(text)).style(screen.styles.header),
        area,
    );
}

fn render_table(frame: &mut Frame, area: Rect, screen: &Screen) {
    let state = screen.navigation;
    let columns = table_columns(&state.data);
    let selected = state.selected_entity_id.as_ref();

    let header = Row::new(
        std::iter::once("id".to_string())
            .chain(columns.iter().cloned())
            .map(Cell::from),
    )
    .style(screen.styles.column_title);

    let rows = state.data.iter().map(|record| {
        let mut cells = vec![Cell::from(record.id().to_string())];
        for name in &columns {
            let text = record.field_text(name);
            let style = if name == "status" {
                screen.styles.for_status(&text)
            } else {
                ratatui::style::Style::default()
            };
            cells.push(Cell::from(text).style(style));
        }
        let row = Row::new(cells);
        if selected == Some(record.id()) {
            row.style(screen.styles.selected)
        } else {
            row
        }
    });

    let mut widths = vec![Constraint::Length(12)];
    widths.extend(columns.iter().map(|_| Constraint::Fill(1)));

    let title = if state.loading && state.data.is_empty() {
        " Loading… ".to_string()
    } else {
        format!(" Records ({}) ", state.total_items)
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

fn render_panel(frame: &mut Frame, area: Rect, screen: &Screen, panel: PanelState) {
    let styles = screen.styles;
    let state = screen.navigation;

    let (title, border_style) = if panel.is_closing {
        (" closing ".to_string(), styles.panel_dimmed)
    } else if panel.is_resizing {
        (format!(" {}px ", panel.width), styles.panel_dimmed)
    } else {
        let title = state
            .selected_entity_id
            .as_ref()
            .map(|id| format!(" {id} "))
            .unwrap_or_else(|| " Detail ".to_string());
        (title, styles.panel_border)
    };

    let lines: Vec<Line> = match state.current_entity() {
        Some(record) => {
            detail::detail_lines(record, styles, usize::from(area.width.saturating_sub(2)))
        }
        None if state.selected_entity_id.is_some() => {
            vec![Line::from("Record is not on this page")]
        }
        None => vec![Line::from("No record selected")],
    };

    let mut nav_hint = Vec::new();
    if state.can_go_previous() {
        nav_hint.push(Span::raw("p: previous "));
    }
    if state.can_go_next() {
        nav_hint.push(Span::raw("n: next"));
    }

    let mut body = lines;
    if !nav_hint.is_empty() {
        body.push(Line::default());
        body.push(Line::from(nav_hint).style(styles.panel_dimmed));
    }

    let paragraph = Paragraph::new(body)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        );
    frame.render_widget(paragraph, area);
}

/// Status bar: page position, totals, loading/error, key hints.
fn render_status_bar(frame: &mut Frame, area: Rect, screen: &Screen) {
    let state = screen.navigation;
    let mut parts = vec![
        format!("Page {}/{}", state.current_page, state.total_pages().max(1)),
        format!("{} per page", state.page_size),
    ];
    if let Some(global) = state.global_index() {
        parts.push(format!("#{} of {}", global + 1, state.total_items));
    }
    if state.loading {
        parts.push("loading".to_string());
    }
    if screen.resizing {
        parts.push("resizing".to_string());
    }

    let (text, style) = match &state.error {
        Some(error) => (
            format!("{} | error: {error}", parts.join(" | ")),
            screen.styles.error,
        ),
        None => (
            format!(
                "{} | q quit  j/k move  n/p next/prev  [/] page  s status  / search",
                parts.join(" | ")
            ),
            screen.styles.status_bar,
        ),
    };

    frame.render_widget(
        Paragraph::new(Line::from(truncate(&text, usize::from(area.width)))).style(style),
        area,
    );
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
