//! Color palette and styling for CLI output.
//!
//! This module defines a consistent visual style for all CLI output.

use owo_colors::{OwoColorize, Style};

/// Style for template names.
pub fn template_name() -> Style {
    Style::new().cyan().bold()
}

/// Style for section headings.
pub fn heading() -> Style {
    Style::new().white().bold()
}

/// Style for path values.
pub fn path() -> Style {
    Style::new().white()
}

/// Style for subdued hints.
pub fn hint() -> Style {
    Style::new().dimmed()
}

/// Style for success markers.
pub fn success() -> Style {
    Style::new().green()
}

/// Style for failure markers.
pub fn failure() -> Style {
    Style::new().red()
}

/// Apply a style when color is enabled.
fn styled(text: &str, style: Style, use_color: bool) -> String {
    if use_color {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

/// Format a template name with styling.
pub fn fmt_template_name(name: &str, use_color: bool) -> String {
    styled(name, template_name(), use_color)
}

/// Format a section heading with styling.
pub fn fmt_heading(text: &str, use_color: bool) -> String {
    styled(text, heading(), use_color)
}

/// Format a path with styling.
pub fn fmt_path(text: &str, use_color: bool) -> String {
    styled(text, path(), use_color)
}

/// Format hint text with styling.
pub fn fmt_hint(text: &str, use_color: bool) -> String {
    styled(text, hint(), use_color)
}

/// Format a success line, prefixed with a check mark.
pub fn fmt_success(text: &str, use_color: bool) -> String {
    format!("{} {text}", styled("✓", success(), use_color))
}

/// Format a failure line, prefixed with a cross.
pub fn fmt_failure(text: &str, use_color: bool) -> String {
    format!("{} {text}", styled("✗", failure(), use_color))
}
