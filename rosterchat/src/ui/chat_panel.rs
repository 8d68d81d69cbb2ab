//! Chat panel rendering (front conversation + input line).

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use super::view::TerminalView;
use crate::app::InputLine;

/// Render the lines of the front conversation, bottom-aligned.
pub fn render_messages(frame: &mut Frame, area: Rect, view: &TerminalView) {
    let height = usize::from(area.height);
    let lines: Vec<Line> = view.front_buffer().map_or_else(Vec::new, |buffer| {
        let end = buffer.lines().len().saturating_sub(buffer.scroll());
        let start = end.saturating_sub(height);
        buffer
            .lines()
            .range(start..end)
            .map(theme::to_line)
            .collect()
    });

    frame.render_widget(Paragraph::new(lines).style(theme::normal()), area);
}

/// Render the input line with a block cursor.
pub fn render_input(frame: &mut Frame, area: Rect, input: &InputLine, active: bool) {
    let (before, after) = input.split_at_cursor();
    let mut spans = vec![Span::styled(before.to_string(), theme::normal())];
    if active {
        spans.push(Span::styled("\u{2588}", theme::input_cursor()));
    }
    spans.push(Span::styled(after.to_string(), theme::normal()));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
