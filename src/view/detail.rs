//! Key/value rendering of a record for the side panel.

use super::styles::ViewStyles;
use crate::model::{display_value, Entity, Record};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

/// Lines for the detail panel: the id, then one `key: value` line per field.
///
/// Keys are padded to a common width (capped at a third of the panel) so values line up.
pub fn detail_lines(record: &Record, styles: &ViewStyles, width: usize) -> Vec<Line<'static>> {
    let key_style = Style::default().add_modifier(Modifier::BOLD);
    let key_width = record
        .fields()
        .keys()
        .map(|k| k.chars().count())
        .max()
        .unwrap_or(0)
        .min(width / 3);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{:<key_width$}", "id"), key_style),
            Span::raw("  "),
            Span::raw(record.id().to_string()),
        ]),
        Line::default(),
    ];

    for (key, value) in record.fields() {
        let text = display_value(value);
        let value_style = if key == "status" {
            styles.for_status(&text)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{key:<key_width$}"), key_style),
            Span::raw("  "),
            Span::styled(text, value_style),
        ]));
    }

    lines
}
