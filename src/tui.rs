use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::fmt::money;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const TOTAL_STYLE: Style = Style::new()
    .fg(Color::Red)
    .add_modifier(Modifier::BOLD);

pub const ERROR_STYLE: Style = Style::new().fg(Color::Red);

const AMOUNT_STYLE: Style = Style::new().fg(Color::Cyan);
const AMOUNT_ZERO_STYLE: Style = Style::new().fg(Color::DarkGray);

/// Format a spending amount as a colored Span. Zero amounts are dimmed so
/// the populated columns stand out in a wide table.
pub fn money_span(amount: f64) -> Span<'static> {
    let style = if amount == 0.0 {
        AMOUNT_ZERO_STYLE
    } else {
        AMOUNT_STYLE
    };
    Span::styled(money(amount), style)
}

/// The period's headline total: red and bold everywhere it appears.
pub fn total_span(amount: f64) -> Span<'static> {
    Span::styled(money(amount), TOTAL_STYLE)
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_span_content() {
        assert_eq!(money_span(1234.0).content, "NT$1,234");
        assert_eq!(total_span(500.0).content, "NT$500");
    }

    #[test]
    fn test_wrap_text() {
        let (wrapped, lines) = wrap_text("a b c d e f", 3);
        assert!(lines > 1);
        assert!(wrapped.contains('\n'));

        let (same, one) = wrap_text("short", 0);
        assert_eq!(same, "short");
        assert_eq!(one, 1);
    }
}
