//! Account and room identifiers.
//!
//! The messaging service encodes people and rooms as decimal strings of two
//! fixed, non-overlapping lengths. Raw strings are classified exactly once,
//! when they are first obtained, into a [`ConversationId`]. After that the
//! engine only deals in tagged identifiers.

use serde::{Deserialize, Serialize};

/// Length of an account (peer) identifier.
pub const PEER_ID_LEN: usize = 17;

/// Length of a room identifier.
pub const ROOM_ID_LEN: usize = 18;

/// Every individual account identifier starts with this prefix.
pub const PEER_ID_PREFIX: &str = "7656119";

/// Errors produced when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier is not a valid account id.
    #[error("invalid account id: {0}")]
    InvalidPeer(String),

    /// The identifier is not a valid room id.
    #[error("invalid room id: {0}")]
    InvalidRoom(String),

    /// The identifier has neither the account nor the room length.
    #[error("unrecognised identifier: {0}")]
    Unclassified(String),
}

/// Identifier of an individual account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerId(String);

impl PeerId {
    /// Parses an account identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidPeer`] unless `raw` is exactly
    /// [`PEER_ID_LEN`] ASCII digits beginning with [`PEER_ID_PREFIX`].
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let raw = raw.trim();
        if raw.len() == PEER_ID_LEN && all_digits(raw) && raw.starts_with(PEER_ID_PREFIX) {
            Ok(Self(raw.to_string()))
        } else {
            Err(IdError::InvalidPeer(raw.to_string()))
        }
    }

    /// Returns the string form of this identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PeerId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PeerId> for String {
    fn from(value: PeerId) -> Self {
        value.0
    }
}

/// Identifier of a group chat room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Parses a room identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidRoom`] unless `raw` is exactly
    /// [`ROOM_ID_LEN`] ASCII digits.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let raw = raw.trim();
        if raw.len() == ROOM_ID_LEN && all_digits(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(IdError::InvalidRoom(raw.to_string()))
        }
    }

    /// Returns the string form of this identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomId> for String {
    fn from(value: RoomId) -> Self {
        value.0
    }
}

/// Identifies one conversation buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversationId {
    /// The always-present system log conversation.
    Log,
    /// A direct conversation with one account.
    Peer(PeerId),
    /// A group room conversation.
    Room(RoomId),
}

impl ConversationId {
    /// Classifies a raw service identifier by its length alone.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Unclassified`] when the length matches neither
    /// shape, or the matching shape's parse error when the content is not
    /// a well-formed identifier of that shape.
    pub fn classify(raw: &str) -> Result<Self, IdError> {
        match raw.trim().len() {
            PEER_ID_LEN => PeerId::parse(raw).map(Self::Peer),
            ROOM_ID_LEN => RoomId::parse(raw).map(Self::Room),
            _ => Err(IdError::Unclassified(raw.to_string())),
        }
    }

    /// Returns `true` for room conversations.
    #[must_use]
    pub const fn is_room(&self) -> bool {
        matches!(self, Self::Room(_))
    }

    /// Returns the room id if this is a room conversation.
    #[must_use]
    pub const fn as_room(&self) -> Option<&RoomId> {
        match self {
            Self::Room(room) => Some(room),
            _ => None,
        }
    }

    /// Returns the account id if this is a direct conversation.
    #[must_use]
    pub const fn as_peer(&self) -> Option<&PeerId> {
        match self {
            Self::Peer(peer) => Some(peer),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Log => f.write_str("log"),
            Self::Peer(peer) => write!(f, "{peer}"),
            Self::Room(room) => write!(f, "{room}"),
        }
    }
}

impl From<PeerId> for ConversationId {
    fn from(value: PeerId) -> Self {
        Self::Peer(value)
    }
}

impl From<RoomId> for ConversationId {
    fn from(value: RoomId) -> Self {
        Self::Room(value)
    }
}

fn all_digits(raw: &str) -> bool {
    raw.bytes().all(|b| b.is_ascii_digit())
}
