//! Terminal UI rendering.

pub mod chat_panel;
pub mod roster;
pub mod status_bar;
pub mod theme;
pub mod view;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

pub use view::TerminalView;

use crate::app::InputLine;

/// Main draw function for the entire UI.
///
/// Chat on the left, roster on the right at the configured width, then the
/// status line and the input line at the bottom.
pub fn draw(frame: &mut Frame, view: &TerminalView, input: &InputLine) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(view.layout().userlist_width),
        ])
        .split(main_chunks[0]);

    chat_panel::render_messages(frame, content_chunks[0], view);
    roster::render(frame, content_chunks[1], view);
    status_bar::render(frame, main_chunks[1], view);
    chat_panel::render_input(frame, main_chunks[2], input, view.picker().is_none());
}
