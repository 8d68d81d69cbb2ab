//! In-process stand-in for the messaging service.
//!
//! [`LoopbackService`] keeps a small model of the service (our account,
//! friends, pending requests, rooms) and answers [`Transport`] queries from
//! it. Commands update the model, are recorded as [`LoopbackCall`]s, and
//! emit the [`ServiceEvent`]s a real service would send back. Events travel
//! over a [`tokio::sync::mpsc`] channel, the same way a networked transport
//! running in background tasks would deliver them.
//!
//! The binary uses it for offline mode; tests use it to drive the session
//! engine and inspect which commands reached the service.

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;

use rosterchat_proto::id::{ConversationId, PeerId, RoomId};
use rosterchat_proto::presence::PresenceState;
use rosterchat_proto::roster::{MemberRank, RosterEntry};

use super::{ServiceEvent, Transport, TransportError};

/// A command that reached the loopback service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopbackCall {
    /// `connect()`.
    Connect,
    /// `disconnect()`.
    Disconnect,
    /// `send_message()`.
    SendMessage {
        /// Target conversation.
        to: ConversationId,
        /// Message body.
        text: String,
    },
    /// `join_room()`.
    JoinRoom(RoomId),
    /// `leave_room()`.
    LeaveRoom(RoomId),
    /// `add_contact()`.
    AddContact(PeerId),
    /// `remove_contact()`.
    RemoveContact(PeerId),
    /// `set_ignored()`.
    SetIgnored {
        /// Target account.
        peer: PeerId,
        /// New blocked state.
        ignored: bool,
    },
    /// `set_presence_name()`.
    SetPresenceName(String),
    /// `set_presence_state()`.
    SetPresenceState(PresenceState),
}

/// A room known to the loopback service.
#[derive(Debug, Clone)]
struct LoopbackRoom {
    name: String,
    members: Vec<(RosterEntry, MemberRank)>,
}

/// In-process [`Transport`] implementation.
pub struct LoopbackService {
    /// Whether `connect()` has been called without a later `disconnect()`.
    connected: bool,
    /// Our own account.
    me: RosterEntry,
    /// Friends list.
    friends: Vec<RosterEntry>,
    /// Accounts waiting for us to accept their friend request.
    pending: Vec<RosterEntry>,
    /// Rooms the service knows about, joined or not.
    rooms: HashMap<RoomId, LoopbackRoom>,
    /// Rooms we are currently in.
    joined: HashSet<RoomId>,
    /// Blocked accounts.
    ignored: HashSet<PeerId>,
    /// Every command received, in order.
    calls: Vec<LoopbackCall>,
    /// Error returned by the next command instead of executing it.
    fail_next: Option<TransportError>,
    /// Outgoing event channel.
    events: mpsc::UnboundedSender<ServiceEvent>,
}

impl LoopbackService {
    /// Creates a disconnected service for the account `me`.
    ///
    /// Returns the service and the receiving end of its event channel.
    #[must_use]
    pub fn new(me: RosterEntry) -> (Self, mpsc::UnboundedReceiver<ServiceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = Self {
            connected: false,
            me,
            friends: Vec::new(),
            pending: Vec::new(),
            rooms: HashMap::new(),
            joined: HashSet::new(),
            ignored: HashSet::new(),
            calls: Vec::new(),
            fail_next: None,
            events: tx,
        };
        (service, rx)
    }

    /// Adds a friend to the model.
    #[must_use]
    pub fn with_friend(mut self, entry: RosterEntry) -> Self {
        self.friends.push(entry);
        self
    }

    /// Adds a pending friend request to the model.
    #[must_use]
    pub fn with_pending_request(mut self, entry: RosterEntry) -> Self {
        self.pending.push(entry);
        self
    }

    /// Adds a joinable room to the model.
    #[must_use]
    pub fn with_room(
        mut self,
        room: RoomId,
        name: impl Into<String>,
        members: Vec<(RosterEntry, MemberRank)>,
    ) -> Self {
        self.rooms.insert(
            room,
            LoopbackRoom {
                name: name.into(),
                members,
            },
        );
        self
    }

    /// Commands received so far.
    #[must_use]
    pub fn calls(&self) -> &[LoopbackCall] {
        &self.calls
    }

    /// Makes the next command fail with `error`.
    pub fn fail_next(&mut self, error: TransportError) {
        self.fail_next = Some(error);
    }

    /// Whether `peer` is blocked.
    #[must_use]
    pub fn is_ignored(&self, peer: &PeerId) -> bool {
        self.ignored.contains(peer)
    }

    /// Injects an event as if the service had sent it.
    pub fn deliver(&self, event: ServiceEvent) {
        self.emit(event);
    }

    /// Adds or replaces a friend and announces the change.
    pub fn set_friend(&mut self, entry: RosterEntry) {
        match self.friends.iter_mut().find(|f| f.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.friends.push(entry),
        }
        self.emit(ServiceEvent::FriendsChanged);
    }

    /// Adds or replaces a member of a known room and announces the change.
    pub fn set_room_member(&mut self, room: &RoomId, entry: RosterEntry, rank: MemberRank) {
        let Some(known) = self.rooms.get_mut(room) else {
            return;
        };
        match known.members.iter_mut().find(|(m, _)| m.id == entry.id) {
            Some(existing) => *existing = (entry, rank),
            None => known.members.push((entry, rank)),
        }
        if self.joined.contains(room) {
            self.emit(ServiceEvent::RoomMembersChanged(room.clone()));
        }
    }

    fn emit(&self, event: ServiceEvent) {
        // The receiver only goes away during shutdown.
        let _ = self.events.send(event);
    }

    /// Records `call` and applies the pending failure, if any.
    fn record(&mut self, call: LoopbackCall) -> Result<(), TransportError> {
        self.calls.push(call);
        self.fail_next.take().map_or(Ok(()), Err)
    }

    fn require_connection(&self) -> Result<(), TransportError> {
        if self.connected {
            Ok(())
        } else {
            Err(TransportError::NotConnected)
        }
    }
}

impl Transport for LoopbackService {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn self_entry(&self) -> Option<RosterEntry> {
        Some(self.me.clone())
    }

    fn friends_snapshot(&self) -> Vec<RosterEntry> {
        if self.connected {
            self.friends.clone()
        } else {
            Vec::new()
        }
    }

    fn room_members_snapshot(&self, room: &RoomId) -> Vec<RosterEntry> {
        if !self.joined.contains(room) {
            return Vec::new();
        }
        self.rooms.get(room).map_or_else(Vec::new, |r| {
            r.members
                .iter()
                .filter(|(m, _)| m.id != self.me.id)
                .map(|(m, _)| m.clone())
                .collect()
        })
    }

    fn room_member_ranks(&self, room: &RoomId) -> Vec<MemberRank> {
        if !self.joined.contains(room) {
            return Vec::new();
        }
        self.rooms
            .get(room)
            .map_or_else(Vec::new, |r| r.members.iter().map(|(_, rank)| *rank).collect())
    }

    fn is_room_member(&self, room: &RoomId) -> bool {
        self.connected && self.joined.contains(room)
    }

    fn peer_name(&self, peer: &PeerId) -> Option<String> {
        if *peer == self.me.id {
            return Some(self.me.display_name.clone());
        }
        self.friends
            .iter()
            .chain(self.pending.iter())
            .chain(self.rooms.values().flat_map(|r| r.members.iter().map(|(m, _)| m)))
            .find(|e| e.id == *peer)
            .map(|e| e.display_name.clone())
    }

    fn room_name(&self, room: &RoomId) -> Option<String> {
        self.rooms.get(room).map(|r| r.name.clone())
    }

    fn pending_requests(&self) -> Vec<RosterEntry> {
        self.pending.clone()
    }

    fn connect(&mut self) -> Result<(), TransportError> {
        self.record(LoopbackCall::Connect)?;
        if self.connected {
            return Ok(());
        }
        self.connected = true;
        self.me.presence = PresenceState::Online;
        self.emit(ServiceEvent::Connected);
        self.emit(ServiceEvent::SelfChanged);
        self.emit(ServiceEvent::FriendsChanged);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        self.record(LoopbackCall::Disconnect)?;
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        self.joined.clear();
        self.me.presence = PresenceState::Offline;
        self.emit(ServiceEvent::Disconnected { reason: None });
        Ok(())
    }

    fn send_message(&mut self, to: &ConversationId, text: &str) -> Result<(), TransportError> {
        self.record(LoopbackCall::SendMessage {
            to: to.clone(),
            text: text.to_string(),
        })?;
        self.require_connection()?;
        match to {
            ConversationId::Log => Err(TransportError::Rejected(
                "the log conversation has no recipient".to_string(),
            )),
            ConversationId::Room(room) if !self.joined.contains(room) => {
                Err(TransportError::Rejected(format!("not a member of {room}")))
            }
            _ => Ok(()),
        }
    }

    fn join_room(&mut self, room: &RoomId) -> Result<(), TransportError> {
        self.record(LoopbackCall::JoinRoom(room.clone()))?;
        self.require_connection()?;
        let me = (self.me.clone(), MemberRank::Member);
        let known = self.rooms.entry(room.clone()).or_insert_with(|| LoopbackRoom {
            name: room.to_string(),
            members: Vec::new(),
        });
        if !known.members.iter().any(|(m, _)| m.id == me.0.id) {
            known.members.push(me);
        }
        if self.joined.insert(room.clone()) {
            self.emit(ServiceEvent::RoomJoined(room.clone()));
            self.emit(ServiceEvent::RoomMembersChanged(room.clone()));
        }
        Ok(())
    }

    fn leave_room(&mut self, room: &RoomId) -> Result<(), TransportError> {
        self.record(LoopbackCall::LeaveRoom(room.clone()))?;
        self.require_connection()?;
        self.joined.remove(room);
        Ok(())
    }

    fn add_contact(&mut self, peer: &PeerId) -> Result<(), TransportError> {
        self.record(LoopbackCall::AddContact(peer.clone()))?;
        self.require_connection()?;
        if let Some(pos) = self.pending.iter().position(|p| p.id == *peer) {
            let entry = self.pending.remove(pos);
            self.friends.push(entry);
            self.emit(ServiceEvent::FriendsChanged);
        }
        Ok(())
    }

    fn remove_contact(&mut self, peer: &PeerId) -> Result<(), TransportError> {
        self.record(LoopbackCall::RemoveContact(peer.clone()))?;
        self.require_connection()?;
        self.friends.retain(|f| f.id != *peer);
        self.emit(ServiceEvent::FriendsChanged);
        Ok(())
    }

    fn set_ignored(&mut self, peer: &PeerId, ignored: bool) -> Result<(), TransportError> {
        self.record(LoopbackCall::SetIgnored {
            peer: peer.clone(),
            ignored,
        })?;
        self.require_connection()?;
        let verb = if ignored {
            self.ignored.insert(peer.clone());
            "blocked"
        } else {
            self.ignored.remove(peer);
            "unblocked"
        };
        self.emit(ServiceEvent::Notice(format!("{peer} {verb}")));
        Ok(())
    }

    fn set_presence_name(&mut self, name: &str) -> Result<(), TransportError> {
        self.record(LoopbackCall::SetPresenceName(name.to_string()))?;
        self.require_connection()?;
        self.me.display_name = name.to_string();
        self.emit(ServiceEvent::SelfChanged);
        Ok(())
    }

    fn set_presence_state(&mut self, state: PresenceState) -> Result<(), TransportError> {
        self.record(LoopbackCall::SetPresenceState(state))?;
        self.require_connection()?;
        self.me.presence = state;
        self.emit(ServiceEvent::SelfChanged);
        Ok(())
    }
}
