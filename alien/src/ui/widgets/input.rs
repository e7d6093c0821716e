//! Input field widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::ui::theme::ConsoleTheme;

/// Single-line input field with a block cursor
pub struct InputWidget<'a> {
    content: &'a str,
    cursor_position: usize,
    theme: &'a ConsoleTheme,
    title: Option<&'a str>,
    placeholder: &'a str,
    is_active: bool,
    masked: bool,
}

impl<'a> InputWidget<'a> {
    pub fn new(content: &'a str, theme: &'a ConsoleTheme) -> Self {
        Self {
            content,
            cursor_position: content.chars().count(),
            theme,
            title: None,
            placeholder: "Enter your action...",
            is_active: true,
            masked: false,
        }
    }

    pub fn cursor_position(mut self, pos: usize) -> Self {
        self.cursor_position = pos;
        self
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Draw every character as `*`.
    pub fn masked(mut self, masked: bool) -> Self {
        self.masked = masked;
        self
    }
}

impl Widget for InputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.is_active));
        if let Some(title) = self.title {
            block = block.title(format!(" {title} "));
        }

        let inner = block.inner(area);
        block.render(area, buf);

        let line = if self.content.is_empty() || !self.is_active {
            let shown = if self.content.is_empty() {
                self.placeholder.to_string()
            } else {
                display_text(self.content, self.masked)
            };
            Line::from(vec![
                Span::styled("> ", self.theme.player_style()),
                Span::styled(shown, self.theme.muted_style()),
            ])
        } else {
            let display = display_text(self.content, self.masked);

            // Character-based slicing for unicode safety
            let before_cursor: String = display.chars().take(self.cursor_position).collect();
            let at_cursor = display
                .chars()
                .nth(self.cursor_position)
                .map(|c| c.to_string())
                .unwrap_or_else(|| " ".to_string());
            let after_cursor: String = display.chars().skip(self.cursor_position + 1).collect();

            Line::from(vec![
                Span::styled("> ", self.theme.player_style()),
                Span::raw(before_cursor),
                Span::styled(
                    at_cursor,
                    Style::default()
                        .add_modifier(Modifier::REVERSED | Modifier::BOLD)
                        .fg(self.theme.player_text),
                ),
                Span::raw(after_cursor),
            ])
        };

        Paragraph::new(line).render(inner, buf);
    }
}

fn display_text(content: &str, masked: bool) -> String {
    if masked {
        "*".repeat(content.chars().count())
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(widget: InputWidget<'_>) -> String {
        let area = Rect::new(0, 0, 30, 3);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        (0..area.width)
            .map(|x| buf[(x, 1)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_masked_input_hides_key() {
        let theme = ConsoleTheme::default();
        let line = rendered(InputWidget::new("gsk_abc", &theme).masked(true));
        assert!(line.contains("*******"));
        assert!(!line.contains("gsk"));
    }

    #[test]
    fn test_placeholder_when_empty() {
        let theme = ConsoleTheme::default();
        let line = rendered(InputWidget::new("", &theme).placeholder("waiting"));
        assert!(line.contains("> waiting"));
    }
}
