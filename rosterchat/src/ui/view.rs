//! In-memory view state behind the terminal UI.
//!
//! [`TerminalView`] is the [`Renderer`] the session drives. It only stores
//! what it is told; [`super::draw`] turns it into a frame. Keeping the two
//! apart lets tests inspect exactly what the session displayed without a
//! terminal.

use std::collections::{HashMap, VecDeque};

use rosterchat_proto::id::ConversationId;

use crate::render::{Renderer, StyledText, ViewLayout};

/// Lines of one conversation and how far it is scrolled back.
#[derive(Debug, Clone, Default)]
pub struct ConversationBuffer {
    lines: VecDeque<StyledText>,
    /// Lines hidden below the bottom of the view.
    scroll: usize,
}

impl ConversationBuffer {
    /// Stored lines, oldest first.
    #[must_use]
    pub const fn lines(&self) -> &VecDeque<StyledText> {
        &self.lines
    }

    /// Lines scrolled back from the bottom.
    #[must_use]
    pub const fn scroll(&self) -> usize {
        self.scroll
    }

    fn trim_to(&mut self, scrollback: usize) {
        while self.lines.len() > scrollback {
            self.lines.pop_front();
        }
        self.scroll = self.scroll.min(self.lines.len().saturating_sub(1));
    }
}

/// A selection list shown over the roster column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picker {
    items: Vec<StyledText>,
    selected: usize,
}

impl Picker {
    /// Rows in display order.
    #[must_use]
    pub fn items(&self) -> &[StyledText] {
        &self.items
    }

    /// Highlighted row.
    #[must_use]
    pub const fn selected(&self) -> usize {
        self.selected
    }
}

/// Headless renderer state.
#[derive(Debug, Clone)]
pub struct TerminalView {
    buffers: HashMap<ConversationId, ConversationBuffer>,
    front: ConversationId,
    roster: Vec<StyledText>,
    status: StyledText,
    picker: Option<Picker>,
    layout: ViewLayout,
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalView {
    /// Creates an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffers: HashMap::new(),
            front: ConversationId::Log,
            roster: Vec::new(),
            status: StyledText::new(),
            picker: None,
            layout: ViewLayout::default(),
        }
    }

    /// The conversation in front.
    #[must_use]
    pub const fn front(&self) -> &ConversationId {
        &self.front
    }

    /// The buffer in front, if it exists.
    #[must_use]
    pub fn front_buffer(&self) -> Option<&ConversationBuffer> {
        self.buffers.get(&self.front)
    }

    /// Whether a buffer exists for `id`.
    #[must_use]
    pub fn has_buffer(&self, id: &ConversationId) -> bool {
        self.buffers.contains_key(id)
    }

    /// Number of buffers.
    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Lines of a conversation with styling stripped.
    #[must_use]
    pub fn plain_lines(&self, id: &ConversationId) -> Vec<String> {
        self.buffers
            .get(id)
            .map(|b| b.lines.iter().map(StyledText::to_plain).collect())
            .unwrap_or_default()
    }

    /// Last line of a conversation with styling stripped.
    #[must_use]
    pub fn last_line(&self, id: &ConversationId) -> Option<String> {
        self.buffers
            .get(id)
            .and_then(|b| b.lines.back())
            .map(StyledText::to_plain)
    }

    /// Roster column lines.
    #[must_use]
    pub fn roster_lines(&self) -> &[StyledText] {
        &self.roster
    }

    /// Roster column with styling stripped.
    #[must_use]
    pub fn roster_plain(&self) -> Vec<String> {
        self.roster.iter().map(StyledText::to_plain).collect()
    }

    /// Status line.
    #[must_use]
    pub const fn status_line(&self) -> &StyledText {
        &self.status
    }

    /// The open picker.
    #[must_use]
    pub const fn picker(&self) -> Option<&Picker> {
        self.picker.as_ref()
    }

    /// Current geometry.
    #[must_use]
    pub const fn layout(&self) -> ViewLayout {
        self.layout
    }

    /// Moves the picker highlight down, wrapping.
    pub fn picker_next(&mut self) {
        if let Some(p) = &mut self.picker
            && !p.items.is_empty()
        {
            p.selected = (p.selected + 1) % p.items.len();
        }
    }

    /// Moves the picker highlight up, wrapping.
    pub fn picker_prev(&mut self) {
        if let Some(p) = &mut self.picker
            && !p.items.is_empty()
        {
            p.selected = p.selected.checked_sub(1).unwrap_or(p.items.len() - 1);
        }
    }

    /// Closes the picker, returning the highlighted row.
    pub fn take_picker_choice(&mut self) -> Option<usize> {
        self.picker
            .take()
            .filter(|p| !p.items.is_empty())
            .map(|p| p.selected)
    }

    /// Closes the picker without a choice.
    pub fn cancel_picker(&mut self) {
        self.picker = None;
    }

    /// Scrolls the front buffer back by `lines`.
    pub fn scroll_up(&mut self, lines: usize) {
        if let Some(buffer) = self.buffers.get_mut(&self.front) {
            let max = buffer.lines.len().saturating_sub(1);
            buffer.scroll = (buffer.scroll + lines).min(max);
        }
    }

    /// Scrolls the front buffer forward by `lines`.
    pub fn scroll_down(&mut self, lines: usize) {
        if let Some(buffer) = self.buffers.get_mut(&self.front) {
            buffer.scroll = buffer.scroll.saturating_sub(lines);
        }
    }
}

impl Renderer for TerminalView {
    fn create_buffer(&mut self, id: &ConversationId) {
        self.buffers.entry(id.clone()).or_default();
    }

    fn destroy_buffer(&mut self, id: &ConversationId) {
        self.buffers.remove(id);
    }

    fn set_buffer_front(&mut self, id: &ConversationId) {
        self.front = id.clone();
    }

    fn append_line(&mut self, id: &ConversationId, line: StyledText) {
        let scrollback = self.layout.scrollback;
        let Some(buffer) = self.buffers.get_mut(id) else {
            tracing::warn!(%id, "line for a conversation without a buffer");
            return;
        };
        buffer.lines.push_back(line);
        if buffer.scroll > 0 {
            buffer.scroll += 1;
        }
        buffer.trim_to(scrollback);
    }

    fn set_roster_lines(&mut self, lines: Vec<StyledText>) {
        self.roster = lines;
    }

    fn set_status_line(&mut self, line: StyledText) {
        self.status = line;
    }

    fn present_picker(&mut self, items: Vec<StyledText>) {
        self.picker = Some(Picker { items, selected: 0 });
    }

    fn apply_layout(&mut self, layout: ViewLayout) {
        self.layout = layout;
        for buffer in self.buffers.values_mut() {
            buffer.trim_to(layout.scrollback);
        }
    }
}
