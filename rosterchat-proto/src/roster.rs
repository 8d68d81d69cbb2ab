//! Roster entries and room ranks.

use serde::{Deserialize, Serialize};

use crate::id::PeerId;
use crate::presence::PresenceState;

/// One account as seen in a friends list or a room member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Account identifier.
    pub id: PeerId,
    /// Current display name.
    pub display_name: String,
    /// Current presence.
    pub presence: PresenceState,
    /// Name of the game being played, if any.
    pub active_game: Option<String>,
}

impl RosterEntry {
    /// Creates an entry with no active game.
    #[must_use]
    pub fn new(id: PeerId, display_name: impl Into<String>, presence: PresenceState) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            presence,
            active_game: None,
        }
    }

    /// Sets the active game.
    #[must_use]
    pub fn with_game(mut self, game: impl Into<String>) -> Self {
        self.active_game = Some(game.into());
        self
    }

    /// Returns `true` when the entry is playing a game.
    ///
    /// An empty game name counts as not playing.
    #[must_use]
    pub fn in_game(&self) -> bool {
        self.active_game.as_deref().is_some_and(|g| !g.is_empty())
    }
}

/// Rank of a member inside a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberRank {
    /// Room administrator.
    Admin,
    /// Room moderator.
    Moderator,
    /// Regular member.
    Member,
    /// Owner, officer, guest or any rank not summarised in occupancy counts.
    Other,
}

impl MemberRank {
    /// Maps the service's numeric rank code.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            2 => Self::Admin,
            4 => Self::Member,
            8 => Self::Moderator,
            _ => Self::Other,
        }
    }
}
