//! Command handlers.

use rosterchat_proto::id::{ConversationId, PeerId, RoomId};

use crate::render::{Renderer, StyledText, Tone};
use crate::session::confirm::{GateError, PendingAction};
use crate::session::registry::RegistryError;
use crate::session::roster::Namespace;
use crate::session::{Flow, PickPurpose, Session};
use crate::settings::SettingsStore;
use crate::transport::Transport;

use super::help::{self, HelpTopic};
use super::resolve::Resolved;
use super::{AutojoinAction, AutojoinTarget, Command, CommandError, Input, Invocation, Setting};

impl<T: Transport, R: Renderer, S: SettingsStore> Session<T, R, S> {
    /// Handles one line of user input.
    ///
    /// Lines are ignored while a picker is open.
    pub fn submit(&mut self, line: &str) -> Flow {
        if !self.accepts_input() {
            self.debug_note("input ignored while a selection is pending");
            return Flow::Continue;
        }
        match super::parse_line(line) {
            Input::Empty => Flow::Continue,
            Input::Message(text) => {
                if let Err(err) = self.send_text(&text) {
                    tracing::warn!(%err, "message not sent");
                    self.log(
                        StyledText::toned("Error:", Tone::Alert)
                            .push(format!(" {err}"), Tone::Plain),
                    );
                }
                Flow::Continue
            }
            Input::Command { name, args } => {
                let Some(command) = Command::lookup(&name) else {
                    self.log(
                        StyledText::plain(format!("Unknown command: {name}. Type "))
                            .push("/help", Tone::Accent)
                            .push(" for a list of commands.", Tone::Plain),
                    );
                    return Flow::Continue;
                };
                match command.parse_args(&args) {
                    Ok(invocation) => self.dispatch(invocation),
                    Err(err) => {
                        self.report(command.name(), &err);
                        Flow::Continue
                    }
                }
            }
        }
    }

    /// Executes a validated command, reporting any failure to the log.
    pub fn dispatch(&mut self, invocation: Invocation) -> Flow {
        let command = invocation.command();
        tracing::debug!(command = command.name(), "dispatch");
        match self.execute(invocation) {
            Ok(flow) => flow,
            Err(err) => {
                self.report(command.name(), &err);
                Flow::Continue
            }
        }
    }

    fn execute(&mut self, invocation: Invocation) -> Result<Flow, CommandError> {
        match invocation {
            Invocation::Quit => {
                if self.transport.is_connected()
                    && let Err(err) = self.transport.disconnect()
                {
                    tracing::warn!(%err, "disconnect on quit failed");
                }
                return Ok(Flow::Quit);
            }
            Invocation::Connect => self.connect()?,
            Invocation::Disconnect => self.disconnect()?,
            Invocation::Confirm => self.confirm()?,
            Invocation::Reject => {
                self.gate.reject()?;
                self.log("Confirmation has been rejected.");
            }
            Invocation::Window(index) => self.activate(index)?,
            Invocation::Part => self.part()?,
            Invocation::Accept => self.accept()?,
            Invocation::Join(room) => self.join(room)?,
            Invocation::Persona(name) => {
                self.require_connection()?;
                self.transport.set_presence_name(&name)?;
            }
            Invocation::Add(peer) => {
                self.require_connection()?;
                self.transport.add_contact(&peer)?;
                self.log(
                    StyledText::plain("Sent a friend request to ")
                        .push(peer.to_string(), Tone::Info)
                        .push("!", Tone::Plain),
                );
            }
            Invocation::Remove(arg) => {
                self.require_connection()?;
                match self.resolve_peer(arg.as_deref().unwrap_or_default())? {
                    Resolved::Found(peer) => self.request_removal(&peer)?,
                    Resolved::Pick => self.pick_from_displayed(PickPurpose::RemoveContact),
                }
            }
            Invocation::Pm(arg) => {
                if self.lists.showing_games() {
                    self.lists.restore();
                    self.refresh_roster_view();
                }
                self.require_connection()?;
                match self.resolve_peer(arg.as_deref().unwrap_or_default())? {
                    Resolved::Found(peer) => self.open_direct(&peer)?,
                    Resolved::Pick => self.pick_from_displayed(PickPurpose::DirectMessage),
                }
            }
            Invocation::Games => {
                self.lists.toggle_games();
                self.refresh_roster_view();
            }
            Invocation::Help(topic) => self.help(topic)?,
            Invocation::Cmds => {
                let mut line = StyledText::plain("List of commands: ");
                for (i, cmd) in Command::ALL.iter().enumerate() {
                    if i > 0 {
                        line.push_span(", ", Tone::Plain);
                    }
                    line.push_span(cmd.name(), Tone::Accent);
                }
                self.log(line);
            }
            Invocation::Block(peer) => self.set_blocked(&peer, true)?,
            Invocation::Unblock(peer) => self.set_blocked(&peer, false)?,
            Invocation::Set(setting) => self.apply_setting(setting)?,
            Invocation::Autojoin(action) => self.autojoin(action)?,
            Invocation::Debug => {
                self.settings.debug = !self.settings.debug;
                self.log(
                    StyledText::plain("Debug mode has been set to ")
                        .push(self.settings.debug.to_string(), Tone::Bright)
                        .push(".", Tone::Plain),
                );
            }
        }
        Ok(Flow::Continue)
    }

    fn require_connection(&self) -> Result<(), CommandError> {
        if self.transport.is_connected() {
            Ok(())
        } else {
            Err(CommandError::NotConnected)
        }
    }

    // -----------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------

    /// Sends `text` to the active conversation.
    ///
    /// In the log conversation the text is only echoed locally.
    fn send_text(&mut self, text: &str) -> Result<(), CommandError> {
        let target = self.registry.current().clone();
        if target == ConversationId::Log {
            self.print(&target, StyledText::plain(text));
            return Ok(());
        }
        self.require_connection()?;
        if let ConversationId::Room(room) = &target
            && !self.transport.is_room_member(room)
        {
            return Err(CommandError::NotInRoom);
        }
        self.transport.send_message(&target, text)?;
        let me = self
            .status
            .self_field
            .as_ref()
            .map_or_else(|| "me".to_string(), |me| me.name.clone());
        self.print(
            &target,
            StyledText::toned(me, Tone::Info)
                .push(": ", Tone::Plain)
                .push(text, Tone::Plain),
        );
        Ok(())
    }

    // -----------------------------------------------------------------
    // Connection
    // -----------------------------------------------------------------

    fn connect(&mut self) -> Result<(), CommandError> {
        if self.transport.is_connected() {
            self.log("Already connected.");
            return Ok(());
        }
        self.log("Connecting...");
        self.transport.connect()?;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), CommandError> {
        self.transport.disconnect()?;
        if !self.status.disconnected {
            self.mark_disconnected();
            self.log(StyledText::plain("Service: ").push("Disconnected", Tone::Alert));
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Confirmation
    // -----------------------------------------------------------------

    fn confirm(&mut self) -> Result<(), CommandError> {
        if self.gate.pending().is_none() {
            return Err(GateError::NothingToConfirm.into());
        }
        self.require_connection()?;
        match self.gate.accept()? {
            PendingAction::RemoveContact(peer) => {
                self.transport.remove_contact(&peer)?;
                self.rosters.remove(&Namespace::Friends, &peer);
                self.refresh_roster_view();
                self.log("Friend has been successfully removed.");
            }
        }
        Ok(())
    }

    /// Puts the removal of `peer` up for confirmation.
    pub(crate) fn request_removal(&mut self, peer: &PeerId) -> Result<(), CommandError> {
        let Some(friend) = self.rosters.get(&Namespace::Friends, peer) else {
            return Err(CommandError::NotAFriend(self.peer_label(peer)));
        };
        let name = friend.display_name.clone();
        if let Some(replaced) = self.gate.request(PendingAction::RemoveContact(peer.clone())) {
            self.debug_note(&format!("confirmation superseded: {replaced:?}"));
        }
        self.log(
            StyledText::plain("The following friend will be removed: ")
                .push(name, Tone::Info)
                .push(". Type ", Tone::Plain)
                .push("/yes", Tone::Accent)
                .push(" or ", Tone::Plain)
                .push("/no", Tone::Accent)
                .push(" to confirm.", Tone::Plain),
        );
        Ok(())
    }

    // -----------------------------------------------------------------
    // Conversations
    // -----------------------------------------------------------------

    /// Opens the direct conversation with `peer` and switches to it.
    pub(crate) fn open_direct(&mut self, peer: &PeerId) -> Result<(), CommandError> {
        let index = self.open_conversation(ConversationId::Peer(peer.clone()));
        if index != self.registry.current_index() {
            self.activate(index)?;
        }
        Ok(())
    }

    fn part(&mut self) -> Result<(), CommandError> {
        let index = self.registry.current_index();
        if index == 0 {
            return Err(RegistryError::CannotCloseLog.into());
        }
        if let Some(room) = self.registry.current().as_room().cloned() {
            if self.transport.is_connected()
                && let Err(err) = self.transport.leave_room(&room)
            {
                tracing::warn!(%room, %err, "leave failed");
                self.report("part", &err);
            }
            self.rosters.clear(&Namespace::Room(room.clone()));
            self.autojoin_pending.remove(&room);
        }
        let closed = self.registry.close(index)?;
        self.unread.on_removed(index);
        self.renderer.destroy_buffer(&closed.id);
        tracing::debug!(id = %closed.id, "conversation closed");
        self.show_current();
        Ok(())
    }

    fn join(&mut self, room: Option<RoomId>) -> Result<(), CommandError> {
        self.require_connection()?;
        let room = room
            .or_else(|| self.last_invite.clone())
            .ok_or(CommandError::NoInvite)?;
        if self.transport.is_room_member(&room) {
            let index = self.open_conversation(ConversationId::Room(room));
            if index != self.registry.current_index() {
                self.activate(index)?;
            }
            return Ok(());
        }
        self.transport.join_room(&room)?;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Contacts
    // -----------------------------------------------------------------

    fn accept(&mut self) -> Result<(), CommandError> {
        self.require_connection()?;
        let pending = self.transport.pending_requests();
        if pending.is_empty() {
            return Err(CommandError::NoPendingRequests);
        }
        let items = pending
            .iter()
            .map(|entry| StyledText::toned(entry.display_name.clone(), Tone::Info))
            .collect();
        let candidates = pending.into_iter().map(|entry| entry.id).collect();
        self.start_picker(PickPurpose::AcceptRequest, candidates, items);
        Ok(())
    }

    /// Accepts the friend request from `peer`.
    pub(crate) fn accept_request(&mut self, peer: &PeerId) -> Result<(), CommandError> {
        self.require_connection()?;
        self.transport.add_contact(peer)?;
        let name = self.peer_label(peer);
        self.log(
            StyledText::plain("Accepted friend request from ")
                .push(name, Tone::Info)
                .push("!", Tone::Plain),
        );
        Ok(())
    }

    fn set_blocked(&mut self, peer: &PeerId, blocked: bool) -> Result<(), CommandError> {
        self.require_connection()?;
        self.transport.set_ignored(peer, blocked)?;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Help
    // -----------------------------------------------------------------

    fn help_line(&mut self, command: Command) {
        self.log(
            StyledText::plain("Help: ")
                .push(help::usage(command), Tone::Accent)
                .push(format!(" - {}", help::summary(command)), Tone::Plain),
        );
    }

    fn help(&mut self, topic: HelpTopic) -> Result<(), CommandError> {
        match topic {
            HelpTopic::Overview => self.log(help::OVERVIEW),
            HelpTopic::All => {
                for command in Command::ALL {
                    self.help_line(command);
                }
            }
            HelpTopic::Command(command) => self.help_line(command),
            HelpTopic::Unknown(topic) => return Err(CommandError::NoHelp(topic)),
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------

    fn apply_setting(&mut self, setting: Setting) -> Result<(), CommandError> {
        let (key, value) = match setting {
            Setting::UserlistWidth(width) => {
                self.settings.layout.userlist_width = width;
                ("userlistwidth", width.to_string())
            }
            Setting::Scrollback(lines) => {
                self.settings.layout.scrollback = lines;
                ("scrollback", lines.to_string())
            }
        };
        self.renderer.apply_layout(self.settings.layout);
        self.log(
            StyledText::plain(format!("{key} has been set to "))
                .push(value, Tone::Bright)
                .push(".", Tone::Plain),
        );
        self.persist()?;
        Ok(())
    }

    fn autojoin(&mut self, action: AutojoinAction) -> Result<(), CommandError> {
        match action {
            AutojoinAction::Add(room) => {
                let room = match room {
                    Some(room) => room,
                    None => self.current_room()?,
                };
                if self.settings.autojoin.contains(&room) {
                    return Err(CommandError::AlreadyInAutojoin(room));
                }
                self.log(format!("Added {} to autojoin.", self.room_label(&room)));
                self.settings.autojoin.push(room);
                self.persist()?;
            }
            AutojoinAction::Del(target) => {
                let position = match target {
                    None => {
                        let room = self.current_room()?;
                        self.autojoin_position(&room)?
                    }
                    Some(AutojoinTarget::Room(room)) => self.autojoin_position(&room)?,
                    Some(AutojoinTarget::Position(n)) => {
                        if n == 0 || n > self.settings.autojoin.len() {
                            return Err(CommandError::NotInAutojoin(n.to_string()));
                        }
                        n - 1
                    }
                };
                let room = self.settings.autojoin.remove(position);
                self.log(format!("Removed {} from autojoin.", self.room_label(&room)));
                self.persist()?;
            }
            AutojoinAction::List => {
                if self.settings.autojoin.is_empty() {
                    self.log("autojoin: (empty)");
                }
                for (i, room) in self.settings.autojoin.clone().iter().enumerate() {
                    let name = self.room_label(room);
                    self.log(format!("autojoin: {}. {room} {name}", i + 1));
                }
            }
            AutojoinAction::Run => {
                self.require_connection()?;
                self.run_autojoin();
            }
        }
        Ok(())
    }

    fn current_room(&self) -> Result<RoomId, CommandError> {
        self.registry
            .current()
            .as_room()
            .cloned()
            .ok_or(CommandError::NotARoom)
    }

    fn autojoin_position(&self, room: &RoomId) -> Result<usize, CommandError> {
        self.settings
            .autojoin
            .iter()
            .position(|r| r == room)
            .ok_or_else(|| CommandError::NotInAutojoin(room.to_string()))
    }
}
