//! The session engine.
//!
//! [`Session`] owns every piece of client state (open conversations,
//! rosters, unread markers, the status line, the confirmation slot) and is
//! the only thing that talks to the [`Transport`] and the [`Renderer`].
//! Input lines arrive through [`Session::submit`], service events through
//! [`Session::apply_event`]; both mutate state synchronously and leave the
//! renderer up to date.
//!
//! # Suspension points
//!
//! The engine is single-threaded and never blocks. Two things complete
//! later:
//!
//! - A picker opened by `/remove`, `/pm` or `/accept` suspends input until
//!   the runtime reports the choice with [`Session::resolve_pick`].
//! - Switching conversations schedules a label refresh that needs fresh
//!   names from the transport. The runtime runs it with
//!   [`Session::run_deferred`] on the next tick. A refresh for a
//!   conversation that is no longer active is dropped.

pub mod confirm;
pub mod idle;
pub mod notify;
pub mod registry;
pub mod roster;
pub mod status;

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use rosterchat_proto::id::{ConversationId, PeerId, RoomId};
use rosterchat_proto::presence::PresenceState;

use crate::render::{Renderer, StyledText, Tone, ViewLayout};
use crate::settings::{PersistedSettings, SettingsStore};
use crate::transport::{ServiceEvent, Transport};

use self::confirm::ConfirmationGate;
use self::idle::{IdleTracker, IdleTransition};
use self::notify::{UnreadKind, UnreadSet};
use self::registry::ConversationRegistry;
use self::roster::{ListMode, ListSelector, Namespace, RosterModel};
use self::status::{Occupancy, SelfField, StatusLine};

/// Runtime-adjustable session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Roster column width and scrollback.
    pub layout: ViewLayout,
    /// Rooms joined automatically after connecting.
    pub autojoin: Vec<RoomId>,
    /// chrono format for line timestamps and the status clock.
    pub timestamp_format: String,
    /// Inactivity before presence goes to away. Zero disables.
    pub idle_away: Duration,
    /// Mirror diagnostics into the log conversation.
    pub debug: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            layout: ViewLayout::default(),
            autojoin: Vec::new(),
            timestamp_format: "%H:%M".to_string(),
            idle_away: idle::DEFAULT_IDLE_AWAY,
            debug: false,
        }
    }
}

/// Whether the client keeps running after an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading input.
    Continue,
    /// Exit the client.
    Quit,
}

/// What an open picker is choosing for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickPurpose {
    /// `/remove` without an argument.
    RemoveContact,
    /// `/pm` without an argument.
    DirectMessage,
    /// `/accept`.
    AcceptRequest,
}

/// An outstanding picker: the accounts offered, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suspension {
    /// What the choice will be used for.
    pub purpose: PickPurpose,
    /// Account behind each picker row.
    pub candidates: Vec<PeerId>,
}

/// Work postponed to the next tick.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Deferred {
    /// Resolve the display name in the active conversation label.
    ActiveLabel(ConversationId),
}

/// Interactive client session.
pub struct Session<T, R, S> {
    pub(crate) transport: T,
    pub(crate) renderer: R,
    pub(crate) store: S,
    pub(crate) registry: ConversationRegistry,
    pub(crate) rosters: RosterModel,
    pub(crate) lists: ListSelector,
    /// Accounts in the roster column, top to bottom.
    pub(crate) displayed: Vec<PeerId>,
    pub(crate) unread: UnreadSet,
    pub(crate) gate: ConfirmationGate,
    pub(crate) status: StatusLine,
    pub(crate) settings: SessionSettings,
    pub(crate) suspended: Option<Suspension>,
    pub(crate) last_invite: Option<RoomId>,
    /// Rooms being joined in the background; their buffers open without
    /// taking focus.
    pub(crate) autojoin_pending: HashSet<RoomId>,
    deferred: VecDeque<Deferred>,
    idle: IdleTracker,
}

impl<T: Transport, R: Renderer, S: SettingsStore> Session<T, R, S> {
    /// Creates a session showing only the log conversation.
    pub fn new(transport: T, mut renderer: R, store: S, settings: SessionSettings) -> Self {
        renderer.apply_layout(settings.layout);
        renderer.create_buffer(&ConversationId::Log);
        renderer.set_buffer_front(&ConversationId::Log);

        let idle = IdleTracker::new(settings.idle_away, Instant::now());
        let mut session = Self {
            transport,
            renderer,
            store,
            registry: ConversationRegistry::new(),
            rosters: RosterModel::new(),
            lists: ListSelector::default(),
            displayed: Vec::new(),
            unread: UnreadSet::new(),
            gate: ConfirmationGate::new(),
            status: StatusLine::default(),
            settings,
            suspended: None,
            last_invite: None,
            autojoin_pending: HashSet::new(),
            deferred: VecDeque::new(),
            idle,
        };
        session.status.clock = session.clock_text();
        session.status.disconnected = !session.transport.is_connected();
        session.refresh_self();
        if session.transport.is_connected() {
            session.refresh_friends();
        }
        session.show_current();
        session
    }

    // -----------------------------------------------------------------
    // Read accessors
    // -----------------------------------------------------------------

    /// The transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The transport, mutably.
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The renderer.
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The renderer, mutably, for view-local state such as scrolling.
    pub const fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// The settings store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Open conversations.
    pub const fn registry(&self) -> &ConversationRegistry {
        &self.registry
    }

    /// Friends and room rosters.
    pub const fn rosters(&self) -> &RosterModel {
        &self.rosters
    }

    /// Which list the roster column shows.
    pub const fn list_selector(&self) -> &ListSelector {
        &self.lists
    }

    /// Accounts in the roster column, top to bottom.
    pub fn displayed(&self) -> &[PeerId] {
        &self.displayed
    }

    /// Unread markers.
    pub const fn unread(&self) -> &UnreadSet {
        &self.unread
    }

    /// The confirmation slot.
    pub const fn gate(&self) -> &ConfirmationGate {
        &self.gate
    }

    /// Current status line fields.
    pub const fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Current settings.
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// The outstanding picker, if any.
    pub const fn suspension(&self) -> Option<&Suspension> {
        self.suspended.as_ref()
    }

    /// The room from the most recent invite.
    pub const fn last_invite(&self) -> Option<&RoomId> {
        self.last_invite.as_ref()
    }

    /// Whether input lines are accepted. `false` while a picker is open.
    pub const fn accepts_input(&self) -> bool {
        self.suspended.is_none()
    }

    // -----------------------------------------------------------------
    // Runtime entry points
    // -----------------------------------------------------------------

    /// Applies one service event.
    pub fn apply_event(&mut self, event: ServiceEvent) {
        tracing::debug!(?event, "service event");
        match event {
            ServiceEvent::Connected => {
                self.status.disconnected = false;
                self.refresh_self();
                self.log(StyledText::plain("Service: ").push("Connected", Tone::Game));
                self.refresh_friends();
                self.refresh_occupancy();
                self.refresh_status();
                self.run_autojoin();
            }
            ServiceEvent::Disconnected { reason } => {
                let already = self.status.disconnected;
                self.mark_disconnected();
                if !already {
                    let mut line = StyledText::plain("Service: ").push("Disconnected", Tone::Alert);
                    if let Some(reason) = reason {
                        line.push_span(format!(" ({reason})"), Tone::Plain);
                    }
                    self.log(line);
                }
            }
            ServiceEvent::FriendsChanged => self.refresh_friends(),
            ServiceEvent::SelfChanged => {
                self.refresh_self();
                self.refresh_status();
            }
            ServiceEvent::RoomJoined(room) => self.on_room_joined(room),
            ServiceEvent::RoomLeft(room) => {
                self.rosters.clear(&Namespace::Room(room.clone()));
                self.autojoin_pending.remove(&room);
                let conversation = ConversationId::Room(room);
                if self.registry.index_of(&conversation).is_some() {
                    self.print(
                        &conversation,
                        StyledText::toned("You are no longer in this room.", Tone::Warn),
                    );
                }
                if *self.registry.current() == conversation {
                    self.refresh_occupancy();
                    self.refresh_roster_view();
                    self.refresh_status();
                }
            }
            ServiceEvent::RoomMembersChanged(room) => self.refresh_room(&room),
            ServiceEvent::MessageReceived {
                conversation,
                sender,
                text,
            } => {
                self.open_conversation(conversation.clone());
                self.print(
                    &conversation,
                    StyledText::toned(sender, Tone::Info)
                        .push(": ", Tone::Plain)
                        .push(text, Tone::Plain),
                );
            }
            ServiceEvent::RoomInvite { room, inviter } => {
                let name = self.room_label(&room);
                self.last_invite = Some(room);
                self.log(
                    StyledText::toned(inviter, Tone::Info)
                        .push(" invited you to ", Tone::Plain)
                        .push(name, Tone::Bright)
                        .push(". Type ", Tone::Plain)
                        .push("/join", Tone::Accent)
                        .push(" to enter.", Tone::Plain),
                );
            }
            ServiceEvent::FriendRequest { from } => {
                self.log(
                    StyledText::toned(from.display_name, Tone::Info)
                        .push(
                            format!(" ({}) sent you a friend request. Type ", from.id),
                            Tone::Plain,
                        )
                        .push("/accept", Tone::Accent)
                        .push(" to respond.", Tone::Plain),
                );
            }
            ServiceEvent::Notice(text) => self.log(format!("Service: {text}")),
        }
    }

    /// Completes the outstanding picker with the chosen row, or cancels it
    /// with `None`. Does nothing when no picker is open.
    pub fn resolve_pick(&mut self, choice: Option<usize>) {
        let Some(suspension) = self.suspended.take() else {
            self.debug_note("picker result with no picker open");
            return;
        };
        let Some(peer) = choice.and_then(|i| suspension.candidates.get(i)).cloned() else {
            self.log("Selection cancelled.");
            return;
        };
        let (command, outcome) = match suspension.purpose {
            PickPurpose::RemoveContact => ("remove", self.request_removal(&peer)),
            PickPurpose::DirectMessage => ("pm", self.open_direct(&peer)),
            PickPurpose::AcceptRequest => ("accept", self.accept_request(&peer)),
        };
        if let Err(err) = outcome {
            self.report(command, &err);
        }
    }

    /// Runs work postponed by conversation switches.
    pub fn run_deferred(&mut self) {
        while let Some(task) = self.deferred.pop_front() {
            match task {
                Deferred::ActiveLabel(id) => {
                    if *self.registry.current() != id {
                        self.debug_note(&format!("dropped stale label refresh for {id}"));
                        continue;
                    }
                    let name = self.conversation_name(&id);
                    let position = self.registry.current_index() + 1;
                    self.status.label = Some(format!("{position}:{name}"));
                    self.refresh_status();
                }
            }
        }
    }

    /// Periodic housekeeping: clock and idle detection.
    pub fn tick(&mut self, now: Instant) {
        let clock = self.clock_text();
        if clock != self.status.clock {
            self.status.clock = clock;
            self.refresh_status();
        }
        // The tracker must not enter away while there is no one to tell.
        if self.transport.is_connected() && self.idle.check(now) == IdleTransition::GoAway {
            tracing::info!("idle timeout, going away");
            self.set_presence(PresenceState::Away);
        }
    }

    /// Records user input at `now`, returning from auto-away if needed.
    pub fn note_activity(&mut self, now: Instant) {
        if self.idle.activity(now) == IdleTransition::Return {
            tracing::info!("activity after idle, back online");
            self.set_presence(PresenceState::Online);
        }
    }

    fn set_presence(&mut self, state: PresenceState) {
        if !self.transport.is_connected() {
            return;
        }
        if let Err(err) = self.transport.set_presence_state(state) {
            tracing::warn!(%err, ?state, "presence change failed");
            self.log(format!("Error: could not set presence to {state}: {err}"));
        }
    }

    // -----------------------------------------------------------------
    // Conversations
    // -----------------------------------------------------------------

    /// Opens a conversation without switching to it.
    pub(crate) fn open_conversation(&mut self, id: ConversationId) -> usize {
        let (index, created) = self.registry.open(id.clone());
        if created {
            tracing::debug!(%id, index, "conversation opened");
            self.renderer.create_buffer(&id);
        }
        index
    }

    /// Makes `index` the active conversation.
    pub(crate) fn activate(&mut self, index: usize) -> Result<(), registry::RegistryError> {
        self.registry.switch_to(index)?;
        self.show_current();
        Ok(())
    }

    /// Brings the current conversation to the front and recomputes what
    /// depends on it.
    pub(crate) fn show_current(&mut self) {
        let id = self.registry.current().clone();
        let index = self.registry.current_index();
        self.renderer.set_buffer_front(&id);
        self.unread.mark_read(index);
        self.lists.follow(&id);
        self.status.label = Some(format!("{}:{id}", index + 1));
        self.refresh_occupancy();
        self.refresh_roster_view();
        self.refresh_status();
        self.deferred.push_back(Deferred::ActiveLabel(id));
    }

    fn on_room_joined(&mut self, room: RoomId) {
        let background = self.autojoin_pending.remove(&room);
        let conversation = ConversationId::Room(room.clone());
        let index = self.open_conversation(conversation.clone());
        self.rosters.replace(
            &Namespace::Room(room.clone()),
            self.transport.room_members_snapshot(&room),
        );
        let name = self.room_label(&room);
        self.print(
            &conversation,
            StyledText::plain("You have joined ").push(name, Tone::Bright),
        );
        if background {
            self.debug_note(&format!("joined {room} in the background"));
        } else if index != self.registry.current_index() {
            // The index is valid: it was just opened.
            let _ = self.activate(index);
        } else {
            self.refresh_occupancy();
            self.refresh_roster_view();
            self.refresh_status();
        }
    }

    /// Joins every autojoin room we are not in, without taking focus.
    pub(crate) fn run_autojoin(&mut self) {
        for room in self.settings.autojoin.clone() {
            if self.transport.is_room_member(&room) {
                continue;
            }
            self.autojoin_pending.insert(room.clone());
            if let Err(err) = self.transport.join_room(&room) {
                self.autojoin_pending.remove(&room);
                tracing::warn!(%room, %err, "autojoin failed");
                self.report("autojoin", &err);
            }
        }
    }

    /// Drops all rosters and marks the connection as down.
    pub(crate) fn mark_disconnected(&mut self) {
        self.rosters.clear_all();
        self.autojoin_pending.clear();
        self.status.disconnected = true;
        self.status.occupancy = None;
        self.refresh_self();
        self.refresh_roster_view();
        self.refresh_status();
    }

    // -----------------------------------------------------------------
    // Rosters and status
    // -----------------------------------------------------------------

    pub(crate) fn refresh_friends(&mut self) {
        let snapshot = self.transport.friends_snapshot();
        self.rosters.replace(&Namespace::Friends, snapshot);
        if self.lists.base() == ListMode::Friends {
            self.refresh_roster_view();
        }
    }

    fn refresh_room(&mut self, room: &RoomId) {
        let ns = Namespace::Room(room.clone());
        self.rosters.replace(&ns, self.transport.room_members_snapshot(room));
        if self.registry.current().as_room() == Some(room) {
            self.refresh_occupancy();
            self.refresh_roster_view();
            self.refresh_status();
        }
    }

    fn refresh_self(&mut self) {
        self.status.self_field = self.transport.self_entry().map(|me| SelfField {
            away: me.presence == PresenceState::Away,
            name: me.display_name,
        });
    }

    fn refresh_occupancy(&mut self) {
        self.status.occupancy = self
            .registry
            .current()
            .as_room()
            .filter(|room| self.transport.is_room_member(room))
            .map(|room| Occupancy::tally(self.transport.room_member_ranks(room)));
    }

    /// Namespace behind the roster column.
    pub(crate) fn displayed_namespace(&self) -> Namespace {
        match self.lists.base() {
            ListMode::RoomMembers => Namespace::for_conversation(self.registry.current()),
            ListMode::Friends | ListMode::GameOverlay => Namespace::Friends,
        }
    }

    /// Re-sorts the displayed roster and hands it to the renderer.
    pub(crate) fn refresh_roster_view(&mut self) {
        let ns = self.displayed_namespace();
        let view = self.rosters.sorted_view(&ns);
        let lines = if self.lists.showing_games() {
            view.iter().map(|e| roster::game_line(e)).collect()
        } else {
            view.iter().map(|e| roster::name_line(e)).collect()
        };
        self.displayed = view.iter().map(|e| e.id.clone()).collect();
        self.renderer.set_roster_lines(lines);
    }

    pub(crate) fn refresh_status(&mut self) {
        let line = status::compose(&self.status, &self.unread.render());
        self.renderer.set_status_line(line);
    }

    /// Best known name for a conversation.
    fn conversation_name(&self, id: &ConversationId) -> String {
        match id {
            ConversationId::Log => "log".to_string(),
            ConversationId::Peer(peer) => self.peer_label(peer),
            ConversationId::Room(room) => self.room_label(room),
        }
    }

    pub(crate) fn peer_label(&self, peer: &PeerId) -> String {
        self.transport
            .peer_name(peer)
            .unwrap_or_else(|| peer.to_string())
    }

    pub(crate) fn room_label(&self, room: &RoomId) -> String {
        self.transport
            .room_name(room)
            .unwrap_or_else(|| room.to_string())
    }

    // -----------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------

    fn clock_text(&self) -> String {
        chrono::Local::now()
            .format(&self.settings.timestamp_format)
            .to_string()
    }

    /// Appends a timestamped line to a conversation and marks it unread if
    /// it is in the background.
    pub(crate) fn print(&mut self, id: &ConversationId, line: StyledText) {
        let mut out = StyledText::toned(format!("{} - ", self.clock_text()), Tone::Info);
        out.extend(line);
        self.renderer.append_line(id, out);

        let Some(index) = self.registry.index_of(id) else {
            return;
        };
        let kind = match id {
            ConversationId::Peer(_) => UnreadKind::Direct,
            ConversationId::Log | ConversationId::Room(_) => UnreadKind::Room,
        };
        if self.unread.mark_unread(index, kind, self.registry.current_index()) {
            self.refresh_status();
        }
    }

    /// Appends a line to the log conversation.
    pub(crate) fn log(&mut self, line: impl Into<StyledText>) {
        self.print(&ConversationId::Log, line.into());
    }

    /// Reports a failed command as `<command>: Error: <message>`.
    pub(crate) fn report(&mut self, command: &str, err: &dyn std::fmt::Display) {
        tracing::warn!(command, %err, "command failed");
        self.log(
            StyledText::toned(command, Tone::Accent)
                .push(": ", Tone::Plain)
                .push("Error:", Tone::Alert)
                .push(format!(" {err}"), Tone::Plain),
        );
    }

    /// Traces a diagnostic, echoing it to the log in debug mode.
    pub(crate) fn debug_note(&mut self, message: &str) {
        tracing::debug!("{message}");
        if self.settings.debug {
            self.log(StyledText::toned(format!("DBG: {message}"), Tone::Muted));
        }
    }

    /// Hands the persistable settings to the store.
    pub(crate) fn persist(&mut self) -> Result<(), crate::settings::SettingsError> {
        let snapshot = PersistedSettings {
            layout: self.settings.layout,
            autojoin: self.settings.autojoin.clone(),
        };
        self.store.save(&snapshot)
    }
}
