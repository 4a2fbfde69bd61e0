//! Record table and panel styling.
//!
//! Status values get distinct colors (paid green, failed red, pending yellow).

use ratatui::style::{Color, Modifier, Style};

// ===== ColorConfig =====

/// Configuration for color output.
///
/// Determines whether colors should be enabled or disabled based on:
/// - `--no-color` CLI flag
/// - `NO_COLOR` environment variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorConfig {
    enabled: bool,
}

impl ColorConfig {
    /// Create a ColorConfig from CLI args and environment.
    ///
    /// Priority (first match wins):
    /// 1. `--no-color` flag (disables colors)
    /// 2. `NO_COLOR` env var (any value disables colors)
    /// 3. Default: colors enabled
    pub fn from_env_and_args(no_color_flag: bool) -> Self {
        let enabled = !no_color_flag && std::env::var("NO_COLOR").is_err();
        Self { enabled }
    }

    /// Colors on, regardless of environment.
    pub fn enabled() -> Self {
        Self { enabled: true }
    }

    /// Check if colors are enabled.
    pub fn colors_enabled(self) -> bool {
        self.enabled
    }
}

// ===== ViewStyles =====

/// Styles shared by the table, panel, header and status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewStyles {
    /// Header bar.
    pub header: Style,
    /// Table column titles.
    pub column_title: Style,
    /// Row of the selected record.
    pub selected: Style,
    /// Panel border while open.
    pub panel_border: Style,
    /// Panel while closing or resizing.
    pub panel_dimmed: Style,
    /// Status bar.
    pub status_bar: Style,
    /// Fetch errors.
    pub error: Style,
    colors: bool,
}

impl ViewStyles {
    /// Styles for `config`. With colors off only modifiers are used.
    pub fn with_color_config(config: ColorConfig) -> Self {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let reversed = Style::default().add_modifier(Modifier::REVERSED);
        let dim = Style::default().add_modifier(Modifier::DIM);

        if config.colors_enabled() {
            Self {
                header: bold.fg(Color::Cyan),
                column_title: bold.fg(Color::Gray),
                selected: reversed,
                panel_border: Style::default().fg(Color::Cyan),
                panel_dimmed: dim.fg(Color::DarkGray),
                status_bar: Style::default().fg(Color::Gray),
                error: Style::default().fg(Color::Red),
                colors: true,
            }
        } else {
            Self {
                header: bold,
                column_title: bold,
                selected: reversed,
                panel_border: Style::default(),
                panel_dimmed: dim,
                status_bar: Style::default(),
                error: bold,
                colors: false,
            }
        }
    }

    /// Style for a record status value.
    pub fn for_status(&self, status: &str) -> Style {
        if !self.colors {
            return Style::default();
        }
        match status.to_ascii_lowercase().as_str() {
            "paid" | "succeeded" | "active" => Style::default().fg(Color::Green),
            "failed" | "declined" | "cancelled" => Style::default().fg(Color::Red),
            "pending" | "processing" => Style::default().fg(Color::Yellow),
            "refunded" => Style::default().fg(Color::Magenta),
            _ => Style::default(),
        }
    }
}

impl Default for ViewStyles {
    fn default() -> Self {
        Self::with_color_config(ColorConfig::from_env_and_args(false))
    }
}

// ===== Tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_config_respects_no_color_flag() {
        let config = ColorConfig::from_env_and_args(true);
        assert!(
            !config.colors_enabled(),
            "--no-color flag should disable colors"
        );
    }

    #[test]
    fn status_colors_follow_outcome() {
        let styles = ViewStyles::with_color_config(ColorConfig::enabled());
        assert_eq!(styles.for_status("PAID").fg, Some(Color::Green));
        assert_eq!(styles.for_status("failed").fg, Some(Color::Red));
        assert_eq!(styles.for_status("pending").fg, Some(Color::Yellow));
        assert_eq!(styles.for_status("mystery").fg, None);
    }

    #[test]
    fn disabled_colors_use_plain_status_style() {
        let styles = ViewStyles::with_color_config(ColorConfig::from_env_and_args(true));
        assert_eq!(styles.for_status("paid"), Style::default());
        assert_eq!(styles.header.fg, None);
    }
}
