//! Ordered registry of open conversations.
//!
//! The log conversation sits at index 0 and cannot be closed. Every other
//! conversation is appended on open and removed on close, shifting later
//! indices down by one. The registry tracks a current and a previous index
//! and keeps both pointing at the same logical conversation across removals
//! where that conversation still exists, falling back to the log otherwise.

use rosterchat_proto::id::ConversationId;

/// Errors raised by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Index 0 holds the log conversation, which is permanent.
    #[error("the log window cannot be closed")]
    CannotCloseLog,

    /// No conversation at the given index.
    #[error("no conversation at position {}", .0 + 1)]
    NoSuchConversation(usize),
}

/// Outcome of a successful [`ConversationRegistry::close`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closed {
    /// The conversation that was removed.
    pub id: ConversationId,
    /// Whether the closed conversation was the current one, so that a
    /// different conversation is now current.
    pub switched: bool,
}

/// Ordered collection of open conversations with current/previous pointers.
#[derive(Debug, Clone)]
pub struct ConversationRegistry {
    ids: Vec<ConversationId>,
    current: usize,
    previous: usize,
}

impl Default for ConversationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationRegistry {
    /// Creates a registry holding only the log conversation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: vec![ConversationId::Log],
            current: 0,
            previous: 0,
        }
    }

    /// Opens a conversation and returns its index.
    ///
    /// Opening an already open conversation returns its existing index.
    /// The second value is `true` when a new entry was appended.
    pub fn open(&mut self, id: ConversationId) -> (usize, bool) {
        if let Some(index) = self.index_of(&id) {
            return (index, false);
        }
        self.ids.push(id);
        (self.ids.len() - 1, true)
    }

    /// Index of an open conversation.
    #[must_use]
    pub fn index_of(&self, id: &ConversationId) -> Option<usize> {
        self.ids.iter().position(|c| c == id)
    }

    /// Conversation at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ConversationId> {
        self.ids.get(index)
    }

    /// Removes the conversation at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::CannotCloseLog`] for index 0 and
    /// [`RegistryError::NoSuchConversation`] for an index past the end.
    pub fn close(&mut self, index: usize) -> Result<Closed, RegistryError> {
        if index == 0 {
            return Err(RegistryError::CannotCloseLog);
        }
        if index >= self.ids.len() {
            return Err(RegistryError::NoSuchConversation(index));
        }
        let id = self.ids.remove(index);
        let switched = self.current == index;
        if switched {
            self.current = shift_after_removal(self.previous, index);
            self.previous = 0;
        } else {
            self.current = shift_after_removal(self.current, index);
            self.previous = shift_after_removal(self.previous, index);
        }
        Ok(Closed { id, switched })
    }

    /// Makes `index` current, remembering the old current as previous.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoSuchConversation`] for an index past the
    /// end.
    pub fn switch_to(&mut self, index: usize) -> Result<(), RegistryError> {
        if index >= self.ids.len() {
            return Err(RegistryError::NoSuchConversation(index));
        }
        self.previous = self.current;
        self.current = index;
        Ok(())
    }

    /// Index of the active conversation.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    /// Index of the conversation active before the current one.
    #[must_use]
    pub const fn previous_index(&self) -> usize {
        self.previous
    }

    /// The active conversation.
    #[must_use]
    pub fn current(&self) -> &ConversationId {
        // `current` is always in bounds and index 0 always exists.
        self.ids.get(self.current).unwrap_or(&self.ids[0])
    }

    /// Number of open conversations, the log included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always `false`: the log conversation is permanent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Open conversations in index order.
    pub fn iter(&self) -> impl Iterator<Item = &ConversationId> {
        self.ids.iter()
    }
}

/// Where a pointer ends up after the entry at `removed` is taken out.
///
/// Pointers above the removed slot move down with their conversation. A
/// pointer at the removed slot falls back to the log.
const fn shift_after_removal(pointer: usize, removed: usize) -> usize {
    if pointer > removed {
        pointer - 1
    } else if pointer == removed {
        0
    } else {
        pointer
    }
}
