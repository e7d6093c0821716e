//! Color theme and styling for the console TUI

use alien_core::theme::Palette;
use ratatui::style::{Color, Modifier, Style};

/// Console UI color theme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleTheme {
    pub primary: Color,
    pub accent: Color,
    pub alert: Color,
    pub border: Color,
    pub muted: Color,
    pub player_text: Color,
    pub narrator_text: Color,
}

impl Default for ConsoleTheme {
    fn default() -> Self {
        Self::from_palette(&Palette::CONSOLE)
    }
}

impl ConsoleTheme {
    /// Build a theme from a story palette. Unparseable colours fall back to
    /// terminal greens and reds.
    pub fn from_palette(palette: &Palette) -> Self {
        let primary = parse_hex(palette.primary).unwrap_or(Color::LightGreen);
        let accent = parse_hex(palette.accent).unwrap_or(Color::Green);
        let alert = parse_hex(palette.alert).unwrap_or(Color::Red);
        Self {
            primary,
            accent,
            alert,
            border: accent,
            muted: Color::DarkGray,
            player_text: accent,
            narrator_text: primary,
        }
    }

    /// Get style for narrator lines
    pub fn narrator_style(&self) -> Style {
        Style::default().fg(self.narrator_text)
    }

    /// Get style for player lines
    pub fn player_style(&self) -> Style {
        Style::default()
            .fg(self.player_text)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for hints and placeholders
    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted).add_modifier(Modifier::DIM)
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for a highlighted menu row
    pub fn selected_style(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    /// Get gauge color, switching to the alert color when needed
    pub fn gauge_color(&self, alert: bool) -> Color {
        if alert {
            self.alert
        } else {
            self.accent
        }
    }

    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused { self.primary } else { self.border })
    }
}

/// Parse a `#rrggbb` colour.
pub fn parse_hex(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}
