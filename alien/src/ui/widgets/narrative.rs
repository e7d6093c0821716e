//! Message log widget

use alien_core::{Message, Sender};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
        StatefulWidget, Widget, Wrap,
    },
};

use crate::ui::theme::ConsoleTheme;

/// Widget for the PLAYER / GAMEMASTER exchange
pub struct NarrativeWidget<'a> {
    messages: &'a [Message],
    scroll: usize,
    theme: &'a ConsoleTheme,
    processing: bool,
}

impl<'a> NarrativeWidget<'a> {
    pub fn new(messages: &'a [Message], theme: &'a ConsoleTheme) -> Self {
        Self {
            messages,
            scroll: 0,
            theme,
            processing: false,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn processing(mut self, processing: bool) -> Self {
        self.processing = processing;
        self
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        for message in self.messages {
            let (label_style, text_style) = match message.sender {
                Sender::Player => (self.theme.player_style(), self.theme.player_style()),
                Sender::Narrator => (
                    self.theme.narrator_style().add_modifier(Modifier::BOLD),
                    self.theme.narrator_style(),
                ),
            };

            let mut content = message.content.lines();
            let first = content.next().unwrap_or_default();
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", message.sender.label()), label_style),
                Span::styled(first.to_string(), text_style),
            ]));
            for line in content {
                lines.push(Line::from(Span::styled(line.to_string(), text_style)));
            }

            // Blank line between entries
            lines.push(Line::from(""));
        }

        if self.processing {
            lines.push(Line::from(Span::styled(
                "GAMEMASTER: ...",
                self.theme.muted_style(),
            )));
        }

        lines
    }
}

impl Widget for NarrativeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Console Log ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        let inner = block.inner(area);
        block.render(area, buf);

        let lines = self.lines();

        // Estimate wrapped height so the bottom of the log is reachable
        let width = inner.width.max(1) as usize;
        let total_lines: usize = lines
            .iter()
            .map(|l| l.width().div_ceil(width).max(1))
            .sum();
        let visible_height = inner.height as usize;
        let max_scroll = total_lines.saturating_sub(visible_height);
        let scroll = self.scroll.min(max_scroll);

        Paragraph::new(lines)
            .scroll((scroll_offset(scroll), 0))
            .wrap(Wrap { trim: false })
            .render(inner, buf);

        if total_lines > visible_height {
            let scrollbar_area = Rect {
                x: inner.x + inner.width.saturating_sub(1),
                y: inner.y,
                width: 1,
                height: inner.height,
            };

            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .thumb_style(Style::default().fg(self.theme.accent))
                .track_style(Style::default().fg(self.theme.muted))
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            let mut state = ScrollbarState::new(max_scroll).position(scroll);
            scrollbar.render(scrollbar_area, buf, &mut state);
        }
    }
}

/// Paragraph offsets are `u16`; longer logs pin to the last reachable row.
fn scroll_offset(scroll: usize) -> u16 {
    u16::try_from(scroll).unwrap_or(u16::MAX)
}
