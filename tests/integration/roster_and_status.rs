//! Integration tests for the roster column and the status line.
//!
//! Verification command: `cargo test --test roster_and_status`

use rosterchat::render::Tone;
use rosterchat::session::roster::ListMode;
use rosterchat::session::{Session, SessionSettings};
use rosterchat::settings::MemoryStore;
use rosterchat::transport::loopback::LoopbackService;
use rosterchat::transport::{ServiceEvent, Transport};
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
    fn connected() -> Self {
        let (service, events) = LoopbackService::new(entry(0, "me", PresenceState::Offline));
        let service = service
            .with_friend(entry(3, "Carol", PresenceState::Offline))
            .with_friend(entry(2, "Bob", PresenceState::Away).with_game("Chess"))
            .with_friend(entry(1, "Alice", PresenceState::Online))
            .with_room(
                room(1),
                "Lobby",
                vec![
                    (entry(1, "Alice", PresenceState::Online), MemberRank::Admin),
                    (entry(5, "Erin", PresenceState::Away), MemberRank::Admin),
                    (entry(6, "Frank", PresenceState::Busy), MemberRank::Moderator),
                    (entry(4, "Dave", PresenceState::Offline), MemberRank::Member),
                ],
            );
        let session = Session::new(
            service,
            TerminalView::new(),
            MemoryStore::new(),
            SessionSettings::default(),
        );
        let mut harness = Self { session, events };
        harness.submit("/connect");
        harness
    }

    fn submit(&mut self, line: &str) {
        self.session.submit(line);
        self.pump();
    }

    fn pump(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.session.apply_event(event);
        }
        self.session.run_deferred();
    }

    fn roster(&self) -> Vec<String> {
        self.session.renderer().roster_plain()
    }

    fn status(&self) -> String {
        self.session.renderer().status_line().to_plain()
    }
}

// =============================================================================
// Roster column
// =============================================================================

#[test]
fn friends_sorted_by_presence_offline_last() {
    let mut h = Harness::connected();
    assert_eq!(h.roster(), vec!["Alice", "Bob", "Carol"]);

    h.session
        .transport_mut()
        .set_friend(entry(7, "Eve", PresenceState::Busy));
    h.pump();
    assert_eq!(h.roster(), vec!["Alice", "Eve", "Bob", "Carol"]);

    h.session
        .transport_mut()
        .set_friend(entry(1, "Alice", PresenceState::Offline));
    h.pump();
    assert_eq!(h.roster(), vec!["Eve", "Bob", "Carol", "Alice"]);
}

#[test]
fn roster_names_are_toned_by_presence() {
    let h = Harness::connected();
    let tones: Vec<Tone> = h
        .session
        .renderer()
        .roster_lines()
        .iter()
        .map(|line| line.spans()[0].tone)
        .collect();
    assert_eq!(tones, vec![Tone::Info, Tone::Warn, Tone::Muted]);
}

#[test]
fn room_shows_members_and_occupancy() {
    let mut h = Harness::connected();
    h.submit(&format!("/join {}", room(1)));

    assert_eq!(h.session.list_selector().mode(), ListMode::RoomMembers);
    assert_eq!(h.roster(), vec!["Alice", "Frank", "Erin", "Dave"]);
    assert_eq!(
        h.session.status().occupancy.map(|o| o.summary()),
        Some("5 users (2 admin, 1 mod)".to_string())
    );
    assert!(h.status().contains("[2:Lobby] [5 users (2 admin, 1 mod)]"));

    h.submit("/w 1");
    assert_eq!(h.session.list_selector().mode(), ListMode::Friends);
    assert_eq!(h.roster(), vec!["Alice", "Bob", "Carol"]);
    assert!(h.session.status().occupancy.is_none());
}

#[test]
fn member_changes_update_the_active_room() {
    let mut h = Harness::connected();
    h.submit(&format!("/join {}", room(1)));

    h.session.transport_mut().set_room_member(
        &room(1),
        entry(8, "Gus", PresenceState::Online),
        MemberRank::Member,
    );
    h.pump();

    assert_eq!(h.roster(), vec!["Alice", "Gus", "Frank", "Erin", "Dave"]);
    assert_eq!(
        h.session.status().occupancy.map(|o| o.users()),
        Some(6)
    );
}

#[test]
fn games_overlay_and_pm_restores_names() {
    let mut h = Harness::connected();

    h.submit("/games");
    assert!(h.session.list_selector().showing_games());
    assert_eq!(h.roster(), vec!["", "Chess", ""]);

    h.submit("/games");
    assert_eq!(h.roster(), vec!["Alice", "Bob", "Carol"]);

    h.submit("/games");
    h.submit("/pm Bob");
    assert!(!h.session.list_selector().showing_games());
    assert_eq!(h.roster(), vec!["Alice", "Bob", "Carol"]);
}

#[test]
fn games_overlay_over_room_members() {
    let mut h = Harness::connected();
    h.submit(&format!("/join {}", room(1)));
    h.submit("/games");
    assert_eq!(h.session.list_selector().base(), ListMode::RoomMembers);
    assert_eq!(h.roster().len(), 4);
}

// =============================================================================
// Status line
// =============================================================================

#[test]
fn status_fields_in_fixed_order() {
    let mut h = Harness::connected();
    h.submit(&format!("/join {}", room(1)));

    let clock = h.session.status().clock.clone();
    assert_eq!(
        h.status(),
        format!("[{clock}] [me] [2:Lobby] [5 users (2 admin, 1 mod)]")
    );

    h.session.transport().deliver(ServiceEvent::MessageReceived {
        conversation: ConversationId::Peer(peer(1)),
        sender: "Alice".to_string(),
        text: "psst".to_string(),
    });
    h.pump();
    assert!(h.status().ends_with("[5 users (2 admin, 1 mod)] [3]"));

    h.submit("/disconnect");
    assert!(h.status().ends_with("[2:Lobby] [1,3] [DISCONNECTED]"));
}

#[test]
fn direct_unread_markers_are_alert_toned() {
    let mut h = Harness::connected();
    h.session.transport().deliver(ServiceEvent::MessageReceived {
        conversation: ConversationId::Peer(peer(2)),
        sender: "Bob".to_string(),
        text: "hey".to_string(),
    });
    h.pump();

    let line = h.session.renderer().status_line();
    assert!(
        line.spans()
            .iter()
            .any(|s| s.text == "2" && s.tone == Tone::Alert)
    );
}

#[test]
fn away_self_is_warn_toned() {
    let mut h = Harness::connected();
    h.session
        .transport_mut()
        .set_presence_state(PresenceState::Away)
        .unwrap();
    h.pump();

    assert!(h.session.status().self_field.as_ref().unwrap().away);
    let line = h.session.renderer().status_line();
    assert!(
        line.spans()
            .iter()
            .any(|s| s.text == "me" && s.tone == Tone::Warn)
    );
}

#[test]
fn label_is_refreshed_after_switch() {
    let mut h = Harness::connected();
    h.submit(&format!("/join {}", room(1)));
    h.submit("/w 1");

    // Switch without running deferred work: the label shows the raw id.
    h.session.submit("/w 2");
    assert_eq!(
        h.session.status().label.as_deref(),
        Some(format!("2:{}", room(1)).as_str())
    );

    h.session.run_deferred();
    assert_eq!(h.session.status().label.as_deref(), Some("2:Lobby"));
}

#[test]
fn stale_label_refresh_is_dropped() {
    let mut h = Harness::connected();
    h.submit(&format!("/join {}", room(1)));
    h.submit("/w 1");

    h.session.submit("/w 2");
    h.session.submit("/w 1");
    h.session.run_deferred();

    assert_eq!(h.session.status().label.as_deref(), Some("1:log"));
}
