//! Status bar rendering.

use ratatui::{Frame, layout::Rect, widgets::Paragraph};

use super::theme;
use super::view::TerminalView;

/// Render the status line composed by the session.
pub fn render(frame: &mut Frame, area: Rect, view: &TerminalView) {
    let paragraph =
        Paragraph::new(theme::to_line(view.status_line())).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
