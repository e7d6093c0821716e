//! Render orchestration for the console TUI

use alien_core::character::TRAIT_MAX;
use alien_core::{resolve, StoryId, Trait};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, CreateField, Screen};
use crate::ui::widgets::{InputWidget, MetersWidget, NarrativeWidget};

const BANNER: &str = "ALIEN PLANET CONSOLE";
const METERS_WIDTH: u16 = 28;

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    match app.screen {
        Screen::StorySelect => render_story_select(frame, app, area),
        Screen::CharacterCreate => render_character_create(frame, app, area),
        Screen::Credential => render_credential(frame, app, area),
        Screen::Playing => render_playing(frame, app, area),
    }
}

/// Rect of at most `width` x `height` centered in `area`
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn banner_line(app: &App) -> Line<'static> {
    Line::from(Span::styled(BANNER, app.theme.title_style())).centered()
}

fn status_line(app: &App) -> Line<'_> {
    Line::from(Span::styled(
        app.status_message().unwrap_or_default(),
        Style::default().fg(app.theme.alert),
    ))
}

fn render_story_select(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect_fixed(64, 16, area);
    frame.render_widget(Clear, popup);

    let mut lines = vec![
        banner_line(app),
        Line::from(""),
        Line::from(Span::styled("Choose your story", app.theme.muted_style())),
        Line::from(""),
    ];

    for (i, story) in StoryId::ALL.iter().enumerate() {
        let theme = resolve(*story);
        let selected = i == app.story_index;
        let marker = if selected { "▶ " } else { "  " };
        let title_style = if selected {
            app.theme.selected_style()
        } else {
            app.theme.title_style()
        };
        lines.push(Line::from(vec![
            Span::styled(marker, app.theme.player_style()),
            Span::styled(theme.title, title_style),
        ]));
        lines.push(Line::from(Span::styled(
            format!("    {}", theme.tagline),
            app.theme.narrator_style(),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "j/k or arrows to move, Enter to select, q to quit",
        app.theme.muted_style(),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn render_character_create(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect_fixed(60, 18, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(format!(" {} ", app.selected_theme().title))
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [header, name_area, sliders_area, hint_area, status_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(Trait::ALL.len() as u16 * 2),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .areas(inner);

    frame.render_widget(Paragraph::new(banner_line(app)), header);

    let name_active = app.create_field == CreateField::Name;
    let name = InputWidget::new(app.name.text(), &app.theme)
        .cursor_position(app.name.cursor())
        .title("Name")
        .placeholder("Your name")
        .active(name_active);
    frame.render_widget(name, name_area);

    let lines: Vec<Line> = Trait::ALL
        .iter()
        .flat_map(|t| {
            let focused = app.create_field == CreateField::Slider(*t);
            [slider_line(app, *t, focused), Line::from("")]
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), sliders_area);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Tab/arrows to move, Left/Right to adjust, Enter to continue, Esc to go back",
            app.theme.muted_style(),
        )))
        .wrap(Wrap { trim: true }),
        hint_area,
    );
    frame.render_widget(Paragraph::new(status_line(app)), status_area);
}

fn slider_line(app: &App, t: Trait, focused: bool) -> Line<'static> {
    let value = app.trait_value(t);
    let label_style = if focused {
        app.theme.selected_style()
    } else {
        app.theme.title_style()
    };
    let filled = "■".repeat(usize::from(value));
    let empty = "·".repeat(usize::from(TRAIT_MAX.saturating_sub(value)));

    Line::from(vec![
        Span::styled(format!(" {:<13}", t.label()), label_style),
        Span::raw(" "),
        Span::styled(filled, Style::default().fg(app.theme.gauge_color(false))),
        Span::styled(empty, Style::default().fg(app.theme.muted)),
        Span::styled(
            format!(" {value:>2}"),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ])
}

fn render_credential(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect_fixed(60, 10, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [header, input_area, hint_area, status_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .areas(inner);

    frame.render_widget(Paragraph::new(banner_line(app)), header);
    frame.render_widget(
        InputWidget::new(app.credential.text(), &app.theme)
            .cursor_position(app.credential.cursor())
            .title("Groq API key")
            .placeholder("gsk_...")
            .masked(true),
        input_area,
    );
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "Enter to start, Esc to go back",
            app.theme.muted_style(),
        ))),
        hint_area,
    );
    frame.render_widget(Paragraph::new(status_line(app)), status_area);
}

fn render_playing(frame: &mut Frame, app: &App, area: Rect) {
    let Some(snapshot) = app.snapshot() else {
        return;
    };

    let [title_area, body_area, input_area, status_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(area);

    // Title bar
    let title = Line::from(vec![
        Span::styled(format!(" {BANNER} "), app.theme.title_style()),
        Span::styled(
            format!("| {} | {} ", snapshot.title, snapshot.player_name),
            app.theme.narrator_style(),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), title_area);

    // Meters left, log right
    let [meters_area, log_area] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(METERS_WIDTH), Constraint::Min(20)])
        .areas(body_area);

    frame.render_widget(MetersWidget::new(&snapshot.metrics, &app.theme), meters_area);
    frame.render_widget(
        NarrativeWidget::new(&snapshot.messages, &app.theme)
            .scroll(app.narrative_scroll)
            .processing(app.is_processing()),
        log_area,
    );

    // Input
    let processing = app.is_processing();
    let placeholder = if processing {
        "The console is processing..."
    } else {
        "Enter your action..."
    };
    frame.render_widget(
        InputWidget::new(app.input.text(), &app.theme)
            .cursor_position(app.input.cursor())
            .placeholder(placeholder)
            .active(!processing),
        input_area,
    );

    // Status line
    let status = match app.status_message() {
        Some(message) => Line::from(vec![
            Span::styled(snapshot.status_line(), app.theme.muted_style()),
            Span::raw("  "),
            Span::styled(message, Style::default().fg(app.theme.alert)),
        ]),
        None => Line::from(Span::styled(snapshot.status_line(), app.theme.muted_style())),
    };
    frame.render_widget(Paragraph::new(status), status_area);
}
