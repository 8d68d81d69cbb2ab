//! Unread markers for background conversations.

use std::collections::BTreeMap;

/// What kind of conversation an unread marker belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreadKind {
    /// A room or the log.
    Room,
    /// A direct conversation.
    Direct,
}

/// One marker as displayed in the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnreadToken {
    /// 1-based position of the conversation, as typed with `/w`.
    pub position: usize,
    /// Kind of conversation.
    pub kind: UnreadKind,
}

/// Set of conversation indices with unseen activity.
///
/// Markers are keyed by registry index, so iteration order is the numeric
/// order of the indices.
#[derive(Debug, Clone, Default)]
pub struct UnreadSet {
    marks: BTreeMap<usize, UnreadKind>,
}

impl UnreadSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `index` unread unless it is the `current` conversation.
    ///
    /// Returns `true` if a new marker was added.
    pub fn mark_unread(&mut self, index: usize, kind: UnreadKind, current: usize) -> bool {
        if index == current || self.marks.contains_key(&index) {
            return false;
        }
        self.marks.insert(index, kind);
        true
    }

    /// Clears the marker for `index`. Returns `true` if one was present.
    pub fn mark_read(&mut self, index: usize) -> bool {
        self.marks.remove(&index).is_some()
    }

    /// Adjusts markers after the conversation at `index` was closed.
    ///
    /// The closed conversation's marker is dropped and markers above it move
    /// down by one, following their conversations.
    pub fn on_removed(&mut self, index: usize) {
        self.marks = std::mem::take(&mut self.marks)
            .into_iter()
            .filter(|(i, _)| *i != index)
            .map(|(i, kind)| if i > index { (i - 1, kind) } else { (i, kind) })
            .collect();
    }

    /// Whether `index` carries a marker.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.marks.contains_key(&index)
    }

    /// Number of markers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Returns `true` if no conversation is unread.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Markers in ascending position order.
    #[must_use]
    pub fn render(&self) -> Vec<UnreadToken> {
        self.marks
            .iter()
            .map(|(&index, &kind)| UnreadToken {
                position: index + 1,
                kind,
            })
            .collect()
    }
}
