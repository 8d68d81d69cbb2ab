//! Colours and styles for the TUI.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::render::{StyledText, Tone};

/// Default foreground.
pub const FG_PRIMARY: Color = Color::White;

/// Brackets, command names, picker highlight.
pub const ACCENT: Color = Color::Cyan;

/// Timestamps, own name, online contacts.
pub const INFO: Color = Color::Blue;

/// Errors, busy contacts, unread direct conversations.
pub const ALERT: Color = Color::Red;

/// Away state.
pub const WARN: Color = Color::Yellow;

/// Contacts in game.
pub const GAME: Color = Color::Green;

/// Offline contacts.
pub const MUTED: Color = Color::Gray;

/// Separator between the chat and roster columns.
pub const BORDER: Color = Color::DarkGray;

/// Foreground colour of a tone.
#[must_use]
pub const fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Plain | Tone::Bright => FG_PRIMARY,
        Tone::Accent => ACCENT,
        Tone::Info => INFO,
        Tone::Alert => ALERT,
        Tone::Warn => WARN,
        Tone::Game => GAME,
        Tone::Muted => MUTED,
    }
}

/// Full style of a tone.
#[must_use]
pub fn tone_style(tone: Tone) -> Style {
    let style = Style::default().fg(tone_color(tone));
    if tone == Tone::Bright {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

/// Converts styled text into a ratatui line.
#[must_use]
pub fn to_line(text: &StyledText) -> Line<'static> {
    Line::from(
        text.spans()
            .iter()
            .map(|s| Span::styled(s.text.clone(), tone_style(s.tone)))
            .collect::<Vec<_>>(),
    )
}

/// Normal text style.
#[must_use]
pub fn normal() -> Style {
    Style::default().fg(FG_PRIMARY)
}

/// Separator style.
#[must_use]
pub fn border() -> Style {
    Style::default().fg(BORDER)
}

/// Selected picker row.
#[must_use]
pub fn selected() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

/// Status bar background.
#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().fg(FG_PRIMARY).bg(Color::Rgb(30, 30, 50))
}

/// Input cursor.
#[must_use]
pub fn input_cursor() -> Style {
    Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}
