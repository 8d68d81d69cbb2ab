//! Roster column rendering, with the picker drawn over it when open.

use ratatui::{
    Frame,
    layout::Rect,
    widgets::{Block, Borders, List, ListItem, ListState},
};

use super::theme;
use super::view::TerminalView;

/// Render the roster column.
pub fn render(frame: &mut Frame, area: Rect, view: &TerminalView) {
    let block = Block::default()
        .borders(Borders::LEFT)
        .border_style(theme::border());

    if let Some(picker) = view.picker() {
        let items: Vec<ListItem> = picker
            .items()
            .iter()
            .map(|item| ListItem::new(theme::to_line(item)))
            .collect();
        let list = List::new(items)
            .block(block.title("Select"))
            .highlight_style(theme::selected());
        let mut state = ListState::default().with_selected(Some(picker.selected()));
        frame.render_stateful_widget(list, area, &mut state);
        return;
    }

    let items: Vec<ListItem> = view
        .roster_lines()
        .iter()
        .map(|line| ListItem::new(theme::to_line(line)))
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}
