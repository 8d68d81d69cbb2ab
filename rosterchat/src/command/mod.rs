//! Command interpreter.
//!
//! An input line starting with `/` is a command: the first word is the
//! case-insensitive command name and the rest of the line, trimmed, is its
//! argument string. Anything else is a message for the active conversation.
//!
//! Commands form a fixed table ([`Command`]). Each command validates its own
//! argument string in [`Command::parse_args`], producing a typed
//! [`Invocation`] that [`Session::dispatch`](crate::session::Session::dispatch)
//! executes.

mod handlers;
pub mod help;
mod resolve;

use rosterchat_proto::id::{PeerId, ROOM_ID_LEN, RoomId};

use crate::session::confirm::GateError;
use crate::session::registry::RegistryError;
use crate::settings::SettingsError;
use crate::transport::TransportError;

/// Largest accepted roster column width.
pub const MAX_USERLIST_WIDTH: u16 = 200;

/// Errors reported by command handlers.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The command needs a connection.
    #[error("Not connected to the service. Type /connect first.")]
    NotConnected,

    /// A required argument is missing.
    #[error("No argument specified.")]
    MissingArgument,

    /// `/w` with something that is not a window number.
    #[error("Invalid window number: {0}")]
    InvalidIndex(String),

    /// Argument is not an account id.
    #[error("Invalid account id: {0}")]
    InvalidPeer(String),

    /// Argument is not a room id.
    #[error("Invalid room id: {0}")]
    InvalidRoom(String),

    /// `/set` with an unknown key.
    #[error("Unknown setting: {0}. Settings are userlistwidth and scrollback.")]
    UnknownSetting(String),

    /// `/set` with a value that does not fit the key.
    #[error("Invalid value for {key}: {value}")]
    InvalidValue {
        /// Setting name.
        key: &'static str,
        /// Rejected value.
        value: String,
    },

    /// `/autojoin` with an unknown action.
    #[error("Unknown action: {0}. Use add, del, list or run.")]
    UnknownAction(String),

    /// `/join` without argument and no invite on record.
    #[error("You haven't been invited to a room.")]
    NoInvite,

    /// Name or id matched nobody.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// `/remove` on someone who is not a friend.
    #[error("{0} is not on your friends list.")]
    NotAFriend(String),

    /// `/accept` with nothing pending.
    #[error("You don't have any pending friend requests.")]
    NoPendingRequests,

    /// A picker would be empty.
    #[error("There is nobody to choose from.")]
    NothingToPick,

    /// Message to a room we are not in.
    #[error("You are not currently in this room.")]
    NotInRoom,

    /// `/autojoin add` for a room already listed.
    #[error("Room has already been added to autojoin: {0}")]
    AlreadyInAutojoin(RoomId),

    /// `/autojoin del` for a room or position not listed.
    #[error("Not in autojoin: {0}")]
    NotInAutojoin(String),

    /// `/autojoin add|del` without argument outside a room.
    #[error("Switch to a room or specify a room id.")]
    NotARoom,

    /// `/help` for an unknown topic.
    #[error("Help does not exist for: {0}")]
    NoHelp(String),

    /// Registry refused the operation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Confirmation gate refused the operation.
    #[error(transparent)]
    Gate(#[from] GateError),

    /// The transport refused the request.
    #[error("{0}")]
    Transport(TransportError),

    /// Settings were applied but could not be saved.
    #[error("settings were applied but not saved: {0}")]
    Settings(#[from] SettingsError),
}

impl From<TransportError> for CommandError {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::NotConnected => Self::NotConnected,
            other => Self::Transport(other),
        }
    }
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A `/command` line.
    Command {
        /// Lowercased command name.
        name: String,
        /// Argument string, trimmed.
        args: String,
    },
    /// Text for the active conversation.
    Message(String),
    /// Blank line.
    Empty,
}

/// Splits an input line into a command or a message.
#[must_use]
pub fn parse_line(line: &str) -> Input {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Input::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Input::Message(line.to_string());
    };
    let rest = rest.trim_start();
    let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    Input::Command {
        name: name.to_lowercase(),
        args: args.trim().to_string(),
    }
}

/// Every command the interpreter knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `/quit`
    Quit,
    /// `/connect`
    Connect,
    /// `/disconnect`
    Disconnect,
    /// `/yes`, `/y`
    Yes,
    /// `/no`, `/n`
    No,
    /// `/w <n>`
    Window,
    /// `/part`
    Part,
    /// `/accept`
    Accept,
    /// `/join [id]`
    Join,
    /// `/persona <name>`
    Persona,
    /// `/add <id>`
    Add,
    /// `/remove [name|id]`
    Remove,
    /// `/pm [name|id]`
    Pm,
    /// `/games`
    Games,
    /// `/help [topic|all]`
    Help,
    /// `/cmds`
    Cmds,
    /// `/block <id>`
    Block,
    /// `/unblock <id>`
    Unblock,
    /// `/set <key> <value>`
    Set,
    /// `/autojoin add|del|list|run [arg]`
    Autojoin,
    /// `/debug`
    Debug,
}

impl Command {
    /// All commands in help order.
    pub const ALL: [Self; 21] = [
        Self::Quit,
        Self::Connect,
        Self::Disconnect,
        Self::Yes,
        Self::No,
        Self::Window,
        Self::Part,
        Self::Accept,
        Self::Join,
        Self::Persona,
        Self::Add,
        Self::Remove,
        Self::Pm,
        Self::Games,
        Self::Help,
        Self::Cmds,
        Self::Block,
        Self::Unblock,
        Self::Set,
        Self::Autojoin,
        Self::Debug,
    ];

    /// Finds a command by name or alias, ignoring case.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        let found = match name.as_str() {
            "quit" => Self::Quit,
            "connect" => Self::Connect,
            "disconnect" => Self::Disconnect,
            "yes" | "y" => Self::Yes,
            "no" | "n" => Self::No,
            "w" => Self::Window,
            "part" => Self::Part,
            "accept" => Self::Accept,
            "join" => Self::Join,
            "persona" => Self::Persona,
            "add" => Self::Add,
            "remove" => Self::Remove,
            "pm" => Self::Pm,
            "games" => Self::Games,
            "help" => Self::Help,
            "cmds" => Self::Cmds,
            "block" => Self::Block,
            "unblock" => Self::Unblock,
            "set" => Self::Set,
            "autojoin" => Self::Autojoin,
            "debug" => Self::Debug,
            _ => return None,
        };
        Some(found)
    }

    /// Canonical name, as typed after the slash.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Yes => "yes",
            Self::No => "no",
            Self::Window => "w",
            Self::Part => "part",
            Self::Accept => "accept",
            Self::Join => "join",
            Self::Persona => "persona",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Pm => "pm",
            Self::Games => "games",
            Self::Help => "help",
            Self::Cmds => "cmds",
            Self::Block => "block",
            Self::Unblock => "unblock",
            Self::Set => "set",
            Self::Autojoin => "autojoin",
            Self::Debug => "debug",
        }
    }

    /// Validates `args` for this command.
    ///
    /// # Errors
    ///
    /// Returns the [`CommandError`] describing the first problem with the
    /// argument string.
    pub fn parse_args(self, args: &str) -> Result<Invocation, CommandError> {
        let args = args.trim();
        let invocation = match self {
            Self::Quit => Invocation::Quit,
            Self::Connect => Invocation::Connect,
            Self::Disconnect => Invocation::Disconnect,
            Self::Yes => Invocation::Confirm,
            Self::No => Invocation::Reject,
            Self::Window => Invocation::Window(parse_window(args)?),
            Self::Part => Invocation::Part,
            Self::Accept => Invocation::Accept,
            Self::Join => Invocation::Join(optional(args).map(parse_room).transpose()?),
            Self::Persona => Invocation::Persona(required(args)?.to_string()),
            Self::Add => Invocation::Add(parse_peer(required(args)?)?),
            Self::Remove => Invocation::Remove(optional(args).map(str::to_string)),
            Self::Pm => Invocation::Pm(optional(args).map(str::to_string)),
            Self::Games => Invocation::Games,
            Self::Help => Invocation::Help(help::HelpTopic::parse(args)),
            Self::Cmds => Invocation::Cmds,
            Self::Block => Invocation::Block(parse_peer(required(args)?)?),
            Self::Unblock => Invocation::Unblock(parse_peer(required(args)?)?),
            Self::Set => Invocation::Set(parse_setting(args)?),
            Self::Autojoin => Invocation::Autojoin(parse_autojoin(args)?),
            Self::Debug => Invocation::Debug,
        };
        Ok(invocation)
    }
}

/// A validated command ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Exit.
    Quit,
    /// Start signing in.
    Connect,
    /// Close the connection.
    Disconnect,
    /// Execute the pending confirmation.
    Confirm,
    /// Discard the pending confirmation.
    Reject,
    /// Switch to the conversation at this 0-based index.
    Window(usize),
    /// Close the active conversation.
    Part,
    /// Pick a pending friend request to accept.
    Accept,
    /// Join a room, or the last invite.
    Join(Option<RoomId>),
    /// Change our display name.
    Persona(String),
    /// Send a friend request.
    Add(PeerId),
    /// Remove a friend, picking one if no name is given.
    Remove(Option<String>),
    /// Open a direct conversation, picking one if no name is given.
    Pm(Option<String>),
    /// Toggle the game overlay.
    Games,
    /// Show help.
    Help(help::HelpTopic),
    /// List command names.
    Cmds,
    /// Block an account.
    Block(PeerId),
    /// Unblock an account.
    Unblock(PeerId),
    /// Change a layout setting.
    Set(Setting),
    /// Manage the autojoin list.
    Autojoin(AutojoinAction),
    /// Toggle diagnostics in the log conversation.
    Debug,
}

impl Invocation {
    /// The command this invocation came from.
    #[must_use]
    pub const fn command(&self) -> Command {
        match self {
            Self::Quit => Command::Quit,
            Self::Connect => Command::Connect,
            Self::Disconnect => Command::Disconnect,
            Self::Confirm => Command::Yes,
            Self::Reject => Command::No,
            Self::Window(_) => Command::Window,
            Self::Part => Command::Part,
            Self::Accept => Command::Accept,
            Self::Join(_) => Command::Join,
            Self::Persona(_) => Command::Persona,
            Self::Add(_) => Command::Add,
            Self::Remove(_) => Command::Remove,
            Self::Pm(_) => Command::Pm,
            Self::Games => Command::Games,
            Self::Help(_) => Command::Help,
            Self::Cmds => Command::Cmds,
            Self::Block(_) => Command::Block,
            Self::Unblock(_) => Command::Unblock,
            Self::Set(_) => Command::Set,
            Self::Autojoin(_) => Command::Autojoin,
            Self::Debug => Command::Debug,
        }
    }
}

/// A `/set` assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    /// Roster column width in cells.
    UserlistWidth(u16),
    /// Lines kept per conversation.
    Scrollback(usize),
}

/// An `/autojoin` action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutojoinAction {
    /// Add a room, or the active room.
    Add(Option<RoomId>),
    /// Remove a room, or the active room.
    Del(Option<AutojoinTarget>),
    /// Print the list.
    List,
    /// Join every listed room now.
    Run,
}

/// Which entry `/autojoin del` removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutojoinTarget {
    /// By room id.
    Room(RoomId),
    /// By 1-based position in `/autojoin list`.
    Position(usize),
}

fn optional(args: &str) -> Option<&str> {
    (!args.is_empty()).then_some(args)
}

fn required(args: &str) -> Result<&str, CommandError> {
    optional(args).ok_or(CommandError::MissingArgument)
}

/// Splits off the first word of an argument string.
fn split_word(args: &str) -> (&str, &str) {
    args.split_once(char::is_whitespace)
        .map_or((args, ""), |(head, tail)| (head, tail.trim()))
}

fn parse_window(args: &str) -> Result<usize, CommandError> {
    let raw = required(args)?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(CommandError::InvalidIndex(raw.to_string())),
    }
}

fn parse_peer(raw: &str) -> Result<PeerId, CommandError> {
    PeerId::parse(raw).map_err(|_| CommandError::InvalidPeer(raw.to_string()))
}

fn parse_room(raw: &str) -> Result<RoomId, CommandError> {
    RoomId::parse(raw).map_err(|_| CommandError::InvalidRoom(raw.to_string()))
}

fn parse_setting(args: &str) -> Result<Setting, CommandError> {
    let (key, value) = split_word(required(args)?);
    let key = key.to_lowercase();
    let invalid = |key: &'static str| CommandError::InvalidValue {
        key,
        value: value.to_string(),
    };
    match key.as_str() {
        "userlistwidth" => match value.parse::<u16>() {
            Ok(width) if (1..=MAX_USERLIST_WIDTH).contains(&width) => {
                Ok(Setting::UserlistWidth(width))
            }
            _ => Err(invalid("userlistwidth")),
        },
        "scrollback" => match value.parse::<usize>() {
            Ok(lines) if lines > 0 => Ok(Setting::Scrollback(lines)),
            _ => Err(invalid("scrollback")),
        },
        _ => Err(CommandError::UnknownSetting(key)),
    }
}

fn parse_autojoin(args: &str) -> Result<AutojoinAction, CommandError> {
    let (action, rest) = split_word(required(args)?);
    match action.to_lowercase().as_str() {
        "add" => Ok(AutojoinAction::Add(optional(rest).map(parse_room).transpose()?)),
        "del" => {
            let target = match optional(rest) {
                None => None,
                Some(raw) => Some(match raw.parse::<usize>() {
                    Ok(position) if raw.len() < ROOM_ID_LEN => {
                        AutojoinTarget::Position(position)
                    }
                    _ => AutojoinTarget::Room(parse_room(raw)?),
                }),
            };
            Ok(AutojoinAction::Del(target))
        }
        "list" => Ok(AutojoinAction::List),
        "run" => Ok(AutojoinAction::Run),
        other => Err(CommandError::UnknownAction(other.to_string())),
    }
}
