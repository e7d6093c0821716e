//! Metric meters widget

use alien_core::{GaugeReading, GaugeStyle};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};

use crate::ui::theme::ConsoleTheme;

/// Rows reserved for each meter: label plus bar.
const METER_HEIGHT: u16 = 3;

/// Left-column status panel with one meter per gauge
pub struct MetersWidget<'a> {
    gauges: &'a [GaugeReading],
    theme: &'a ConsoleTheme,
}

impl<'a> MetersWidget<'a> {
    pub fn new(gauges: &'a [GaugeReading], theme: &'a ConsoleTheme) -> Self {
        Self { gauges, theme }
    }
}

impl Widget for MetersWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Status ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut constraints: Vec<Constraint> = self
            .gauges
            .iter()
            .map(|_| Constraint::Length(METER_HEIGHT))
            .collect();
        constraints.push(Constraint::Min(0));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        for (gauge, row) in self.gauges.iter().zip(rows.iter()) {
            render_meter(gauge, self.theme, *row, buf);
        }
    }
}

fn render_meter(gauge: &GaugeReading, theme: &ConsoleTheme, area: Rect, buf: &mut Buffer) {
    let color = theme.gauge_color(gauge.alert);
    let [label_area, bar_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .areas(area);

    Paragraph::new(Line::from(vec![
        Span::styled(format!("{}: ", gauge.label), theme.title_style()),
        Span::styled(
            gauge.value.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ]))
    .render(label_area, buf);

    match gauge.style {
        GaugeStyle::Percent => {
            Gauge::default()
                .gauge_style(Style::default().fg(color).bg(theme.muted))
                .ratio(gauge.ratio().clamp(0.0, 1.0))
                .label(format!("{}%", (gauge.ratio() * 100.0).round() as i32))
                .render(bar_area, buf);
        }
        GaugeStyle::Pips => {
            Paragraph::new(pips_line(gauge, theme)).render(bar_area, buf);
        }
    }
}

/// One cell per point of range, the first `value` lit.
fn pips_line(gauge: &GaugeReading, theme: &ConsoleTheme) -> Line<'static> {
    let lit = Style::default().fg(theme.gauge_color(gauge.alert));
    let unlit = Style::default().fg(theme.muted);
    let cells = (gauge.max - gauge.min).max(0);
    let filled = (gauge.value - gauge.min).clamp(0, cells);

    Line::from(
        (0..cells)
            .map(|i| {
                if i < filled {
                    Span::styled("█ ", lit)
                } else {
                    Span::styled("░ ", unlit)
                }
            })
            .collect::<Vec<_>>(),
    )
}
