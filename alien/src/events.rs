//! Event handling for the console TUI

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};

use crate::app::{App, CreateField, Screen};

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
    /// The credential was confirmed; build the session.
    StartSession,
}

/// Handle a terminal event
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key_event(app, key),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

/// Handle a mouse event
fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> EventResult {
    if app.screen != Screen::Playing {
        return EventResult::Continue;
    }
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.scroll_up(3);
            EventResult::NeedsRedraw
        }
        MouseEventKind::ScrollDown => {
            app.scroll_down(3);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Handle a key event
fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    // Global shortcuts (always work)
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    match app.screen {
        Screen::StorySelect => handle_story_select(app, key),
        Screen::CharacterCreate => handle_character_create(app, key),
        Screen::Credential => handle_credential(app, key),
        Screen::Playing => handle_playing(app, key),
    }
}

fn handle_story_select(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.select_next_story(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev_story(),
        KeyCode::Enter => app.confirm_story(),
        KeyCode::Char('q') | KeyCode::Esc => return EventResult::Quit,
        _ => return EventResult::Continue,
    }
    EventResult::NeedsRedraw
}

fn handle_character_create(app: &mut App, key: KeyEvent) -> EventResult {
    match (app.create_field, key.code) {
        (_, KeyCode::Esc) => {
            app.screen = Screen::StorySelect;
        }
        (_, KeyCode::Enter) => app.confirm_field(),
        (_, KeyCode::Tab) | (_, KeyCode::Down) => app.create_field = app.create_field.next(),
        (_, KeyCode::BackTab) | (_, KeyCode::Up) => app.create_field = app.create_field.prev(),

        (CreateField::Name, KeyCode::Char(c)) => app.name.type_char(c),
        (CreateField::Name, KeyCode::Backspace) => app.name.backspace(),
        (CreateField::Name, KeyCode::Delete) => app.name.delete(),
        (CreateField::Name, KeyCode::Left) => app.name.cursor_left(),
        (CreateField::Name, KeyCode::Right) => app.name.cursor_right(),
        (CreateField::Name, KeyCode::Home) => app.name.cursor_home(),
        (CreateField::Name, KeyCode::End) => app.name.cursor_end(),

        (CreateField::Slider(t), KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('-')) => {
            app.adjust_trait(t, -1)
        }
        (CreateField::Slider(t), KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('+')) => {
            app.adjust_trait(t, 1)
        }

        _ => return EventResult::Continue,
    }
    EventResult::NeedsRedraw
}

fn handle_credential(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Enter => {
            if app.confirm_credential() {
                return EventResult::StartSession;
            }
        }
        KeyCode::Esc => app.screen = Screen::CharacterCreate,
        KeyCode::Char(c) => app.credential.type_char(c),
        KeyCode::Backspace => app.credential.backspace(),
        KeyCode::Delete => app.credential.delete(),
        KeyCode::Left => app.credential.cursor_left(),
        KeyCode::Right => app.credential.cursor_right(),
        KeyCode::Home => app.credential.cursor_home(),
        KeyCode::End => app.credential.cursor_end(),
        _ => return EventResult::Continue,
    }
    EventResult::NeedsRedraw
}

fn handle_playing(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Enter => {
            app.submit_input();
        }
        KeyCode::Esc => {
            if app.cancel_turn() {
                app.set_status("Cancelling...");
            } else {
                app.input.take();
            }
        }

        // Scrolling
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.scroll_up(10),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(10)
        }

        // History
        KeyCode::Up => app.history_prev(),
        KeyCode::Down => app.history_next(),

        // Editing
        KeyCode::Char(c) => app.input.type_char(c),
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Delete => app.input.delete(),
        KeyCode::Left => app.input.cursor_left(),
        KeyCode::Right => app.input.cursor_right(),
        KeyCode::Home => app.input.cursor_home(),
        KeyCode::End => app.input.cursor_end(),

        _ => return EventResult::Continue,
    }
    EventResult::NeedsRedraw
}

#[cfg(test)]
mod tests {
    use super::*;
    use alien_core::{StoryId, Trait};

    fn press(app: &mut App, code: KeyCode) -> EventResult {
        handle_event(app, Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_ctrl_c_quits_anywhere() {
        let mut app = App::with_credential("");
        let ev = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(handle_event(&mut app, ev), EventResult::Quit);
    }

    #[test]
    fn test_walk_through_setup() {
        let mut app = App::with_credential("");

        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_story(), StoryId::PrisonEscape);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::CharacterCreate);

        type_str(&mut app, "Dallas");
        assert_eq!(app.name.text(), "Dallas");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.create_field, CreateField::Slider(Trait::Strength));
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.trait_value(Trait::Strength), 7);

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Credential);

        // Blank key stays on the credential screen
        assert_eq!(press(&mut app, KeyCode::Enter), EventResult::NeedsRedraw);
        type_str(&mut app, "gsk_key");
        assert_eq!(press(&mut app, KeyCode::Enter), EventResult::StartSession);
    }

    #[test]
    fn test_sliders_ignore_letters() {
        let mut app = App::with_credential("");
        app.screen = Screen::CharacterCreate;
        app.create_field = CreateField::Slider(Trait::Agility);
        assert_eq!(press(&mut app, KeyCode::Char('x')), EventResult::Continue);
        assert!(app.name.is_empty());
    }
}
