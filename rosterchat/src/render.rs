//! Renderer seam between the session engine and the terminal UI.
//!
//! The engine never draws. It tells a [`Renderer`] which conversation
//! buffers exist, which one is in front, what the roster and status line
//! say, and when to show a selection list. Text is passed as
//! [`StyledText`]: plain strings tagged with a semantic [`Tone`] that the
//! concrete UI maps to colours.

use rosterchat_proto::id::ConversationId;

/// Semantic colour of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tone {
    /// Default foreground.
    #[default]
    Plain,
    /// Status line brackets, command names.
    Accent,
    /// Timestamps, own name, online contacts.
    Info,
    /// Errors, busy contacts, unread direct conversations.
    Alert,
    /// Away state.
    Warn,
    /// Contacts in game, game names.
    Game,
    /// Offline contacts.
    Muted,
    /// Snooze state, emphasised values.
    Bright,
}

/// A run of text with one tone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// The text.
    pub text: String,
    /// How it should be coloured.
    pub tone: Tone,
}

/// A line of text made of toned spans.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledText {
    spans: Vec<Span>,
}

impl StyledText {
    /// Creates an empty line.
    #[must_use]
    pub const fn new() -> Self {
        Self { spans: Vec::new() }
    }

    /// Creates a line holding one plain span.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new().push(text, Tone::Plain)
    }

    /// Creates a line holding one span of the given tone.
    #[must_use]
    pub fn toned(text: impl Into<String>, tone: Tone) -> Self {
        Self::new().push(text, tone)
    }

    /// Appends a span and returns the line.
    #[must_use]
    pub fn push(mut self, text: impl Into<String>, tone: Tone) -> Self {
        self.push_span(text, tone);
        self
    }

    /// Appends a span in place. Empty text is dropped.
    pub fn push_span(&mut self, text: impl Into<String>, tone: Tone) {
        let text = text.into();
        if !text.is_empty() {
            self.spans.push(Span { text, tone });
        }
    }

    /// Appends every span of `other`.
    pub fn extend(&mut self, other: Self) {
        self.spans.extend(other.spans);
    }

    /// The spans of this line.
    #[must_use]
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Returns `true` when the line has no visible text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The text with all tones stripped.
    #[must_use]
    pub fn to_plain(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

impl From<&str> for StyledText {
    fn from(value: &str) -> Self {
        Self::plain(value)
    }
}

impl From<String> for StyledText {
    fn from(value: String) -> Self {
        Self::plain(value)
    }
}

/// Geometry settings the renderer applies to its views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewLayout {
    /// Width of the roster column in cells.
    pub userlist_width: u16,
    /// Lines kept per conversation buffer.
    pub scrollback: usize,
}

impl Default for ViewLayout {
    fn default() -> Self {
        Self {
            userlist_width: 26,
            scrollback: 1000,
        }
    }
}

/// Display surface driven by the session engine.
///
/// All calls are infallible: the renderer owns its own failure handling.
/// [`Renderer::present_picker`] is asynchronous. The renderer shows the
/// list and the runtime later reports the choice back to the session with
/// `Session::resolve_pick`.
pub trait Renderer {
    /// Creates an empty buffer view for a conversation.
    fn create_buffer(&mut self, id: &ConversationId);

    /// Destroys a conversation's buffer view and its content.
    fn destroy_buffer(&mut self, id: &ConversationId);

    /// Brings a conversation's buffer view to the front.
    fn set_buffer_front(&mut self, id: &ConversationId);

    /// Appends a line to a conversation's buffer.
    fn append_line(&mut self, id: &ConversationId, line: StyledText);

    /// Replaces the roster column.
    fn set_roster_lines(&mut self, lines: Vec<StyledText>);

    /// Replaces the status line.
    fn set_status_line(&mut self, line: StyledText);

    /// Shows a selection list over the roster column.
    fn present_picker(&mut self, items: Vec<StyledText>);

    /// Re-lays out every view with new geometry.
    fn apply_layout(&mut self, layout: ViewLayout);
}
