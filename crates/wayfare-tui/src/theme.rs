//! Monsoon palette and semantic styles.

use ratatui::style::{Color, Modifier, Style};

// ── Palette ───────────────────────────────────────────────────────────

pub const LAGOON: Color = Color::Rgb(64, 224, 208); // #40e0d0
pub const SAFFRON: Color = Color::Rgb(255, 176, 59); // #ffb03b
pub const HIBISCUS: Color = Color::Rgb(255, 92, 138); // #ff5c8a
pub const PALM_GREEN: Color = Color::Rgb(98, 214, 126); // #62d67e
pub const CHILLI_RED: Color = Color::Rgb(255, 94, 87); // #ff5e57
pub const MONSOON_BLUE: Color = Color::Rgb(120, 170, 255); // #78aaff

pub const SAND: Color = Color::Rgb(214, 206, 190); // #d6cebe
pub const SLATE: Color = Color::Rgb(96, 108, 130); // #606c82
pub const BG_HIGHLIGHT: Color = Color::Rgb(38, 44, 58); // #262c3a
pub const BG_DARK: Color = Color::Rgb(24, 28, 38); // #181c26

// ── Semantic styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(LAGOON).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(SAFFRON)
}

pub fn border_default() -> Style {
    Style::default().fg(SLATE)
}

pub fn table_header() -> Style {
    Style::default()
        .fg(LAGOON)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

pub fn table_row() -> Style {
    Style::default().fg(SAND)
}

pub fn table_selected() -> Style {
    Style::default()
        .fg(SAFFRON)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn tab_active() -> Style {
    Style::default()
        .fg(BG_DARK)
        .bg(LAGOON)
        .add_modifier(Modifier::BOLD)
}

pub fn tab_inactive() -> Style {
    Style::default().fg(SLATE)
}

pub fn key_hint() -> Style {
    Style::default().fg(SLATE)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(SAFFRON).add_modifier(Modifier::BOLD)
}

/// Selected entries and "create" options in pickers.
pub fn option_marker() -> Style {
    Style::default().fg(PALM_GREEN)
}

pub fn placeholder() -> Style {
    Style::default().fg(SLATE).add_modifier(Modifier::ITALIC)
}

pub fn error_text() -> Style {
    Style::default().fg(CHILLI_RED)
}
