//! Integration tests for service events: connection changes, incoming
//! messages, invites, friend requests, autojoin and idle presence.
//!
//! Verification command: `cargo test --test service_events`

use std::time::{Duration, Instant};

use rosterchat::session::notify::{UnreadKind, UnreadToken};
use rosterchat::session::roster::Namespace;
use rosterchat::session::{PickPurpose, Session, SessionSettings};
use rosterchat::settings::MemoryStore;
use rosterchat::transport::loopback::{LoopbackCall, LoopbackService};
use rosterchat::transport::{ServiceEvent, Transport, TransportError};
use rosterchat::ui::TerminalView;
use rosterchat_proto::id::{ConversationId, PeerId, RoomId};
use rosterchat_proto::presence::PresenceState;
use rosterchat_proto::roster::{MemberRank, RosterEntry};
use tokio::sync::mpsc;

// =============================================================================
// Helpers
// =============================================================================

type TestSession = Session<LoopbackService, TerminalView, MemoryStore>;

fn peer(n: u32) -> PeerId {
    PeerId::parse(&format!("765611980000{n:05}")).unwrap()
}

fn room(n: u32) -> RoomId {
    RoomId::parse(&format!("1035827914300{n:05}")).unwrap()
}

fn entry(n: u32, name: &str, presence: PresenceState) -> RosterEntry {
    RosterEntry::new(peer(n), name, presence)
}

struct Harness {
    session: TestSession,
    events: mpsc::UnboundedReceiver<ServiceEvent>,
}

impl Harness {
    fn with_settings(settings: SessionSettings) -> Self {
        let (service, events) = LoopbackService::new(entry(0, "me", PresenceState::Offline));
        let service = service
            .with_friend(entry(1, "Alice", PresenceState::Online))
            .with_pending_request(entry(4, "Dave", PresenceState::Online))
            .with_room(
                room(1),
                "Lobby",
                vec![(entry(1, "Alice", PresenceState::Online), MemberRank::Admin)],
            )
            .with_room(room(2), "Backroom", Vec::new());
        let session = Session::new(service, TerminalView::new(), MemoryStore::new(), settings);
        Self { session, events }
    }

    fn new() -> Self {
        Self::with_settings(SessionSettings::default())
    }

    fn connected() -> Self {
        let mut harness = Self::new();
        harness.submit("/connect");
        harness
    }

    fn submit(&mut self, line: &str) {
        self.session.submit(line);
        self.pump();
    }

    fn deliver(&mut self, event: ServiceEvent) {
        self.session.transport().deliver(event);
        self.pump();
    }

    fn pump(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.session.apply_event(event);
        }
        self.session.run_deferred();
    }

    fn lines(&self, id: &ConversationId) -> Vec<String> {
        self.session
            .renderer()
            .plain_lines(id)
            .iter()
            .map(|line| {
                line.split_once(" - ")
                    .map_or(line.as_str(), |(_, rest)| rest)
                    .to_string()
            })
            .collect()
    }

    fn log(&self) -> Vec<String> {
        self.lines(&ConversationId::Log)
    }

    fn last_log(&self) -> String {
        self.log().pop().unwrap_or_default()
    }

    fn current(&self) -> ConversationId {
        self.session.registry().current().clone()
    }
}

fn message(conversation: ConversationId, sender: &str, text: &str) -> ServiceEvent {
    ServiceEvent::MessageReceived {
        conversation,
        sender: sender.to_string(),
        text: text.to_string(),
    }
}

// =============================================================================
// Connection
// =============================================================================

#[test]
fn starts_disconnected() {
    let h = Harness::new();
    assert!(h.session.status().disconnected);
    assert!(h.session.renderer().status_line().to_plain().ends_with("[DISCONNECTED]"));
    assert!(h.session.renderer().roster_lines().is_empty());
}

#[test]
fn connect_logs_and_loads_friends() {
    let mut h = Harness::connected();
    let log = h.log();
    assert!(log.contains(&"Connecting...".to_string()));
    assert!(log.contains(&"Service: Connected".to_string()));
    assert!(!h.session.status().disconnected);
    assert_eq!(h.session.renderer().roster_plain(), vec!["Alice"]);

    h.submit("/connect");
    assert_eq!(h.last_log(), "Already connected.");
}

#[test]
fn connect_failure_is_reported() {
    let mut h = Harness::new();
    h.session
        .transport_mut()
        .fail_next(TransportError::ConnectionClosed);
    h.submit("/connect");
    assert_eq!(h.last_log(), "connect: Error: connection closed");
    assert!(h.session.status().disconnected);
}

#[test]
fn disconnect_event_is_logged_once() {
    let mut h = Harness::connected();
    let disconnect = ServiceEvent::Disconnected {
        reason: Some("timeout".to_string()),
    };
    h.deliver(disconnect.clone());
    h.deliver(disconnect);

    let count = h
        .log()
        .iter()
        .filter(|l| l.starts_with("Service: Disconnected"))
        .count();
    assert_eq!(count, 1);
    assert_eq!(h.last_log(), "Service: Disconnected (timeout)");
    assert!(h.session.status().disconnected);
    assert!(h.session.rosters().is_empty(&Namespace::Friends));
}

#[test]
fn disconnect_command_and_event_log_once() {
    let mut h = Harness::connected();
    h.submit("/disconnect");
    let count = h
        .log()
        .iter()
        .filter(|l| l.starts_with("Service: Disconnected"))
        .count();
    assert_eq!(count, 1);
}

// =============================================================================
// Messages
// =============================================================================

#[test]
fn incoming_message_marks_background_unread() {
    let mut h = Harness::connected();
    h.deliver(message(ConversationId::Peer(peer(1)), "Alice", "hi"));

    assert_eq!(h.current(), ConversationId::Log);
    assert_eq!(h.session.registry().len(), 2);
    assert_eq!(
        h.session.unread().render(),
        vec![UnreadToken {
            position: 2,
            kind: UnreadKind::Direct,
        }]
    );
    assert_eq!(
        h.lines(&ConversationId::Peer(peer(1))),
        vec!["Alice: hi".to_string()]
    );

    h.submit("/w 2");
    assert!(h.session.unread().is_empty());
}

#[test]
fn message_to_current_conversation_is_not_unread() {
    let mut h = Harness::connected();
    h.submit("/pm Alice");
    h.deliver(message(ConversationId::Peer(peer(1)), "Alice", "hello"));
    assert!(h.session.unread().is_empty());
}

#[test]
fn log_activity_in_background_counts_as_room() {
    let mut h = Harness::connected();
    h.submit("/pm Alice");
    h.deliver(ServiceEvent::Notice("maintenance at noon".to_string()));

    assert_eq!(
        h.session.unread().render(),
        vec![UnreadToken {
            position: 1,
            kind: UnreadKind::Room,
        }]
    );
}

#[test]
fn unread_markers_follow_closed_conversations() {
    let mut h = Harness::connected();
    h.deliver(message(ConversationId::Peer(peer(1)), "Alice", "one"));
    h.deliver(message(ConversationId::Peer(peer(4)), "Dave", "two"));
    h.deliver(message(ConversationId::Peer(peer(5)), "Erin", "three"));

    // Close the second conversation; the markers above it shift down.
    h.submit("/w 2");
    h.submit("/part");
    let positions: Vec<usize> = h
        .session
        .unread()
        .render()
        .iter()
        .map(|t| t.position)
        .collect();
    assert_eq!(positions, vec![2, 3]);
}

// =============================================================================
// Rooms
// =============================================================================

#[test]
fn invite_then_join_without_argument() {
    let mut h = Harness::connected();
    h.deliver(ServiceEvent::RoomInvite {
        room: room(1),
        inviter: "Alice".to_string(),
    });
    assert_eq!(h.session.last_invite(), Some(&room(1)));
    assert!(h.last_log().contains("/join"));
    assert!(h.last_log().contains("Lobby"));

    h.submit("/join");
    assert_eq!(h.current(), ConversationId::Room(room(1)));
    assert_eq!(
        h.lines(&ConversationId::Room(room(1))),
        vec!["You have joined Lobby".to_string()]
    );

    // Joining a room we are in only switches to it.
    h.submit("/w 1");
    h.submit("/join");
    assert_eq!(h.current(), ConversationId::Room(room(1)));
    let joins = h
        .session
        .transport()
        .calls()
        .iter()
        .filter(|c| matches!(c, LoopbackCall::JoinRoom(_)))
        .count();
    assert_eq!(joins, 1);
}

#[test]
fn join_without_invite() {
    let mut h = Harness::connected();
    h.submit("/join");
    assert_eq!(h.last_log(), "join: Error: You haven't been invited to a room.");
}

#[test]
fn room_message_and_send() {
    let mut h = Harness::connected();
    h.submit(&format!("/join {}", room(1)));
    h.deliver(message(ConversationId::Room(room(1)), "Alice", "welcome"));
    h.submit("thanks");

    assert_eq!(
        h.lines(&ConversationId::Room(room(1))),
        vec![
            "You have joined Lobby".to_string(),
            "Alice: welcome".to_string(),
            "me: thanks".to_string(),
        ]
    );
}

#[test]
fn room_left_event_clears_roster() {
    let mut h = Harness::connected();
    h.submit(&format!("/join {}", room(1)));
    h.deliver(ServiceEvent::RoomLeft(room(1)));

    assert!(h.session.rosters().is_empty(&Namespace::Room(room(1))));
    assert_eq!(
        h.lines(&ConversationId::Room(room(1))).last().map(String::as_str),
        Some("You are no longer in this room.")
    );
    assert!(h.session.renderer().roster_lines().is_empty());
}

#[test]
fn autojoin_on_connect_stays_in_background() {
    let settings = SessionSettings {
        autojoin: vec![room(1), room(2)],
        ..SessionSettings::default()
    };
    let mut h = Harness::with_settings(settings);
    h.submit("/connect");

    assert_eq!(h.current(), ConversationId::Log);
    assert_eq!(h.session.registry().len(), 3);
    assert!(h.session.transport().is_room_member(&room(1)));
    assert!(h.session.transport().is_room_member(&room(2)));
    let positions: Vec<usize> = h
        .session
        .unread()
        .render()
        .iter()
        .map(|t| t.position)
        .collect();
    assert_eq!(positions, vec![2, 3]);

    // A manual join still takes focus.
    h.submit("/part");
    h.submit("/w 2");
    h.submit("/part");
    h.submit(&format!("/join {}", room(1)));
    assert_eq!(h.current(), ConversationId::Room(room(1)));
}

#[test]
fn autojoin_run_requires_connection() {
    let mut h = Harness::new();
    h.submit("/autojoin run");
    assert_eq!(
        h.last_log(),
        "autojoin: Error: Not connected to the service. Type /connect first."
    );
}

// =============================================================================
// Friend requests
// =============================================================================

#[test]
fn friend_request_then_accept() {
    let mut h = Harness::connected();
    h.deliver(ServiceEvent::FriendRequest {
        from: entry(4, "Dave", PresenceState::Online),
    });
    assert!(h.last_log().contains("/accept"));

    h.submit("/accept");
    assert_eq!(
        h.session.suspension().map(|s| s.purpose),
        Some(PickPurpose::AcceptRequest)
    );
    assert_eq!(h.session.renderer().picker().unwrap().items().len(), 1);

    let choice = h.session.renderer_mut().take_picker_choice();
    h.session.resolve_pick(choice);
    h.pump();

    assert!(
        h.session
            .transport()
            .calls()
            .contains(&LoopbackCall::AddContact(peer(4)))
    );
    assert_eq!(h.last_log(), "Accepted friend request from Dave!");
    assert_eq!(h.session.renderer().roster_plain(), vec!["Alice", "Dave"]);

    h.submit("/accept");
    assert_eq!(
        h.last_log(),
        "accept: Error: You don't have any pending friend requests."
    );
}

// =============================================================================
// Idle presence
// =============================================================================

#[test]
fn idle_goes_away_and_input_returns() {
    let mut h = Harness::connected();
    let later = Instant::now() + Duration::from_secs(601);

    h.session.tick(later);
    h.pump();
    assert!(
        h.session
            .transport()
            .calls()
            .contains(&LoopbackCall::SetPresenceState(PresenceState::Away))
    );
    assert!(h.session.status().self_field.as_ref().unwrap().away);

    h.session.note_activity(later + Duration::from_secs(1));
    h.pump();
    assert!(
        h.session
            .transport()
            .calls()
            .contains(&LoopbackCall::SetPresenceState(PresenceState::Online))
    );
    assert!(!h.session.status().self_field.as_ref().unwrap().away);
}

#[test]
fn zero_idle_timeout_disables_auto_away() {
    let settings = SessionSettings {
        idle_away: Duration::ZERO,
        ..SessionSettings::default()
    };
    let mut h = Harness::with_settings(settings);
    h.submit("/connect");
    h.session.tick(Instant::now() + Duration::from_secs(100_000));
    assert!(
        !h.session
            .transport()
            .calls()
            .iter()
            .any(|c| matches!(c, LoopbackCall::SetPresenceState(_)))
    );
}

#[test]
fn idle_while_disconnected_sends_nothing() {
    let mut h = Harness::new();
    let later = Instant::now() + Duration::from_secs(601);
    h.session.tick(later);
    assert!(h.session.transport().calls().is_empty());

    // The timeout still fires once connected, without any input in between.
    h.submit("/connect");
    h.session.tick(later + Duration::from_secs(1));
    h.pump();
    let calls = h.session.transport().calls();
    assert!(calls.contains(&LoopbackCall::SetPresenceState(PresenceState::Away)));
    assert!(!calls.contains(&LoopbackCall::SetPresenceState(PresenceState::Online)));
    assert!(h.session.status().self_field.as_ref().unwrap().away);
}
