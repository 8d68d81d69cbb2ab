//! Friends and room rosters, and the selector for which one is displayed.
//!
//! [`RosterModel`] holds the friends list and one member list per joined
//! room. Entries keep the order the service reported them in; sorting happens
//! on read in [`RosterModel::sorted_view`], so repeated views of unchanged
//! data are identical.

use std::cmp::Reverse;
use std::collections::HashMap;

use rosterchat_proto::id::{ConversationId, PeerId, RoomId};
use rosterchat_proto::presence::PresenceState;
use rosterchat_proto::roster::RosterEntry;

use crate::render::{StyledText, Tone};

/// Which roster an operation addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// The global friends list.
    Friends,
    /// Members of one joined room.
    Room(RoomId),
}

impl Namespace {
    /// The roster that belongs with a conversation.
    ///
    /// Rooms have their own roster; everything else shows friends.
    #[must_use]
    pub fn for_conversation(conversation: &ConversationId) -> Self {
        conversation
            .as_room()
            .map_or(Self::Friends, |room| Self::Room(room.clone()))
    }
}

/// Presence-classified entries for the friends list and every joined room.
#[derive(Debug, Default)]
pub struct RosterModel {
    friends: Vec<RosterEntry>,
    rooms: HashMap<RoomId, Vec<RosterEntry>>,
}

impl RosterModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self, ns: &Namespace) -> Option<&Vec<RosterEntry>> {
        match ns {
            Namespace::Friends => Some(&self.friends),
            Namespace::Room(room) => self.rooms.get(room),
        }
    }

    fn entries_mut(&mut self, ns: &Namespace) -> &mut Vec<RosterEntry> {
        match ns {
            Namespace::Friends => &mut self.friends,
            Namespace::Room(room) => self.rooms.entry(room.clone()).or_default(),
        }
    }

    /// Inserts an entry or replaces the one with the same id in place.
    pub fn upsert(&mut self, ns: &Namespace, entry: RosterEntry) {
        let entries = self.entries_mut(ns);
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    /// Replaces a whole namespace with a fresh snapshot.
    pub fn replace(&mut self, ns: &Namespace, entries: Vec<RosterEntry>) {
        *self.entries_mut(ns) = entries;
    }

    /// Removes one entry, returning it if it was present.
    pub fn remove(&mut self, ns: &Namespace, id: &PeerId) -> Option<RosterEntry> {
        let entries = match ns {
            Namespace::Friends => &mut self.friends,
            Namespace::Room(room) => self.rooms.get_mut(room)?,
        };
        let pos = entries.iter().position(|e| e.id == *id)?;
        Some(entries.remove(pos))
    }

    /// Empties a namespace. Room namespaces are forgotten entirely.
    pub fn clear(&mut self, ns: &Namespace) {
        match ns {
            Namespace::Friends => self.friends.clear(),
            Namespace::Room(room) => {
                self.rooms.remove(room);
            }
        }
    }

    /// Empties every namespace.
    pub fn clear_all(&mut self) {
        self.friends.clear();
        self.rooms.clear();
    }

    /// Looks up an entry by id.
    #[must_use]
    pub fn get(&self, ns: &Namespace, id: &PeerId) -> Option<&RosterEntry> {
        self.entries(ns)?.iter().find(|e| e.id == *id)
    }

    /// Looks up the first entry whose display name is exactly `name`.
    #[must_use]
    pub fn find_by_name(&self, ns: &Namespace, name: &str) -> Option<&RosterEntry> {
        self.entries(ns)?.iter().find(|e| e.display_name == name)
    }

    /// Number of entries in a namespace.
    #[must_use]
    pub fn len(&self, ns: &Namespace) -> usize {
        self.entries(ns).map_or(0, Vec::len)
    }

    /// Returns `true` if the namespace has no entries.
    #[must_use]
    pub fn is_empty(&self, ns: &Namespace) -> bool {
        self.len(ns) == 0
    }

    /// The namespace's entries in display order.
    ///
    /// Friends: descending presence rank with offline entries last. Rooms:
    /// descending presence rank. Both sorts are stable. An unknown room
    /// yields an empty view.
    #[must_use]
    pub fn sorted_view(&self, ns: &Namespace) -> Vec<&RosterEntry> {
        let Some(entries) = self.entries(ns) else {
            return Vec::new();
        };
        let mut view: Vec<&RosterEntry> = entries.iter().collect();
        match ns {
            Namespace::Friends => {
                view.sort_by_key(|e| (e.presence.is_offline(), Reverse(e.presence.rank())));
            }
            Namespace::Room(_) => view.sort_by_key(|e| Reverse(e.presence.rank())),
        }
        view
    }
}

/// Which list the roster column shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListMode {
    /// The friends list.
    #[default]
    Friends,
    /// Members of the active room.
    RoomMembers,
    /// Active games of whichever list was shown before.
    GameOverlay,
}

/// Active list mode plus the mode to return to from the game overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListSelector {
    mode: ListMode,
    last: ListMode,
}

impl ListSelector {
    /// The mode currently displayed.
    #[must_use]
    pub const fn mode(&self) -> ListMode {
        self.mode
    }

    /// The list the overlay is drawn from, or the active list.
    #[must_use]
    pub const fn base(&self) -> ListMode {
        match self.mode {
            ListMode::GameOverlay => self.last,
            mode => mode,
        }
    }

    /// Returns `true` while the game overlay is shown.
    #[must_use]
    pub const fn showing_games(&self) -> bool {
        matches!(self.mode, ListMode::GameOverlay)
    }

    /// Switches the overlay on, or back off to the remembered list.
    pub const fn toggle_games(&mut self) {
        if self.showing_games() {
            self.restore();
        } else {
            self.last = self.mode;
            self.mode = ListMode::GameOverlay;
        }
    }

    /// Leaves the overlay for the remembered list. No-op otherwise.
    pub const fn restore(&mut self) {
        if self.showing_games() {
            self.mode = self.last;
        }
    }

    /// Shows the list belonging to `conversation`, dropping the overlay.
    pub const fn follow(&mut self, conversation: &ConversationId) {
        self.mode = if conversation.is_room() {
            ListMode::RoomMembers
        } else {
            ListMode::Friends
        };
        self.last = self.mode;
    }
}

/// Tone of a roster entry's name.
#[must_use]
pub fn presence_tone(entry: &RosterEntry) -> Tone {
    match entry.presence {
        PresenceState::Online if entry.in_game() => Tone::Game,
        PresenceState::Online => Tone::Info,
        PresenceState::Busy => Tone::Alert,
        PresenceState::Away => Tone::Warn,
        PresenceState::Snooze => Tone::Bright,
        PresenceState::Offline => Tone::Muted,
        PresenceState::Other => Tone::Accent,
    }
}

/// Roster column line for an entry's name.
#[must_use]
pub fn name_line(entry: &RosterEntry) -> StyledText {
    StyledText::toned(entry.display_name.clone(), presence_tone(entry))
}

/// Roster column line for an entry's game, blank when not playing.
#[must_use]
pub fn game_line(entry: &RosterEntry) -> StyledText {
    match entry.active_game.as_deref() {
        Some(game) if !game.is_empty() => StyledText::toned(game, Tone::Game),
        _ => StyledText::new(),
    }
}
