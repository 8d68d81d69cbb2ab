//! Transport layer abstraction for `RosterChat`.
//!
//! Defines the [`Transport`] trait the session engine talks to and the
//! [`ServiceEvent`]s a transport delivers back. The transport owns the
//! network connection and authentication; the engine only issues commands
//! and reads snapshots.
//!
//! Concrete implementations:
//! - [`loopback::LoopbackService`]: in-process stand-in for the service,
//!   used for offline mode and tests

pub mod loopback;

use rosterchat_proto::id::{ConversationId, PeerId, RoomId};
use rosterchat_proto::presence::PresenceState;
use rosterchat_proto::roster::{MemberRank, RosterEntry};

/// Errors that can occur during transport operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// There is no connection to the service.
    #[error("not connected to the service")]
    NotConnected,

    /// The service refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The connection dropped while the request was in flight.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Events a transport delivers to the session, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    /// Signed in to the service.
    Connected,
    /// Lost or closed the connection.
    Disconnected {
        /// Human-readable reason, if the service gave one.
        reason: Option<String>,
    },
    /// The friends list or a friend's presence changed.
    FriendsChanged,
    /// Our own name or presence changed.
    SelfChanged,
    /// We entered a room.
    RoomJoined(RoomId),
    /// We left or were removed from a room.
    RoomLeft(RoomId),
    /// Membership or member presence of a room changed.
    RoomMembersChanged(RoomId),
    /// A message arrived in a direct or room conversation.
    MessageReceived {
        /// Conversation the message belongs to.
        conversation: ConversationId,
        /// Display name of the author.
        sender: String,
        /// Message body.
        text: String,
    },
    /// Someone invited us to a room.
    RoomInvite {
        /// The room we were invited to.
        room: RoomId,
        /// Display name of the inviter.
        inviter: String,
    },
    /// Someone sent us a friend request.
    FriendRequest {
        /// The requesting account.
        from: RosterEntry,
    },
    /// Free-form result text from the service (e.g. the outcome of a block).
    Notice(String),
}

/// Client for the remote presence and messaging service.
///
/// Queries are answered from the transport's local cache and never block.
/// Commands are handed off to the service and return once queued; their
/// effects arrive later as [`ServiceEvent`]s.
pub trait Transport {
    /// Whether the transport currently holds a signed-in connection.
    fn is_connected(&self) -> bool;

    /// Our own account, once known.
    fn self_entry(&self) -> Option<RosterEntry>;

    /// Current friends list.
    fn friends_snapshot(&self) -> Vec<RosterEntry>;

    /// Current members of a joined room, without ourselves.
    fn room_members_snapshot(&self, room: &RoomId) -> Vec<RosterEntry>;

    /// Rank of every member of a joined room, ourselves included.
    fn room_member_ranks(&self, room: &RoomId) -> Vec<MemberRank>;

    /// Whether we are currently a member of `room`.
    fn is_room_member(&self, room: &RoomId) -> bool;

    /// Display name of an account, if the service has told us.
    fn peer_name(&self, peer: &PeerId) -> Option<String>;

    /// Display name of a room, if the service has told us.
    fn room_name(&self, room: &RoomId) -> Option<String>;

    /// Accounts with a pending friend request to us.
    fn pending_requests(&self) -> Vec<RosterEntry>;

    /// Starts signing in.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the attempt cannot be started.
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the connection cannot be closed cleanly.
    fn disconnect(&mut self) -> Result<(), TransportError>;

    /// Sends a message to a direct or room conversation.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the message cannot be handed off.
    fn send_message(&mut self, to: &ConversationId, text: &str) -> Result<(), TransportError>;

    /// Joins a room.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request cannot be handed off.
    fn join_room(&mut self, room: &RoomId) -> Result<(), TransportError>;

    /// Leaves a room.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request cannot be handed off.
    fn leave_room(&mut self, room: &RoomId) -> Result<(), TransportError>;

    /// Sends a friend request, or accepts a pending one from `peer`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request cannot be handed off.
    fn add_contact(&mut self, peer: &PeerId) -> Result<(), TransportError>;

    /// Removes `peer` from the friends list.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request cannot be handed off.
    fn remove_contact(&mut self, peer: &PeerId) -> Result<(), TransportError>;

    /// Blocks or unblocks an account.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request cannot be handed off.
    fn set_ignored(&mut self, peer: &PeerId, ignored: bool) -> Result<(), TransportError>;

    /// Changes our display name.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request cannot be handed off.
    fn set_presence_name(&mut self, name: &str) -> Result<(), TransportError>;

    /// Changes our presence state.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request cannot be handed off.
    fn set_presence_state(&mut self, state: PresenceState) -> Result<(), TransportError>;
}
