//! Help topics.

use super::Command;

/// What `/help` was asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelpTopic {
    /// No argument.
    Overview,
    /// `/help all`.
    All,
    /// One command.
    Command(Command),
    /// Anything else.
    Unknown(String),
}

impl HelpTopic {
    /// Interprets the `/help` argument. A leading slash is ignored.
    #[must_use]
    pub fn parse(args: &str) -> Self {
        let topic = args.trim().trim_start_matches('/').to_lowercase();
        if topic.is_empty() {
            Self::Overview
        } else if topic == "all" {
            Self::All
        } else {
            Command::lookup(&topic).map_or(Self::Unknown(topic), Self::Command)
        }
    }
}

/// Shown for `/help` without a topic.
pub const OVERVIEW: &str = "Type /help <command> for one command, /help all for every command, \
                            or /cmds for the list of command names.";

/// Usage line of a command.
#[must_use]
pub const fn usage(command: Command) -> &'static str {
    match command {
        Command::Quit => "/quit",
        Command::Connect => "/connect",
        Command::Disconnect => "/disconnect",
        Command::Yes => "/yes, /y",
        Command::No => "/no, /n",
        Command::Window => "/w <number>",
        Command::Part => "/part",
        Command::Accept => "/accept",
        Command::Join => "/join [room id]",
        Command::Persona => "/persona <name>",
        Command::Add => "/add <account id>",
        Command::Remove => "/remove [name|account id]",
        Command::Pm => "/pm [name|account id]",
        Command::Games => "/games",
        Command::Help => "/help [command|all]",
        Command::Cmds => "/cmds",
        Command::Block => "/block <account id>",
        Command::Unblock => "/unblock <account id>",
        Command::Set => "/set <userlistwidth|scrollback> <value>",
        Command::Autojoin => "/autojoin add|del|list|run [room id|position]",
        Command::Debug => "/debug",
    }
}

/// One-line description of a command.
#[must_use]
pub const fn summary(command: Command) -> &'static str {
    match command {
        Command::Quit => "Exit the client.",
        Command::Connect => "Sign in to the service.",
        Command::Disconnect => "Sign out and clear the rosters.",
        Command::Yes => "Carry out the action waiting for confirmation.",
        Command::No => "Cancel the action waiting for confirmation.",
        Command::Window => "Switch to the conversation with that number.",
        Command::Part => "Close the active conversation, leaving the room if it is one.",
        Command::Accept => "Choose a pending friend request to accept.",
        Command::Join => "Join a room, or the room you were last invited to.",
        Command::Persona => "Change your display name.",
        Command::Add => "Send a friend request.",
        Command::Remove => "Remove a friend after confirmation. \
             Without a name, pick from the list.",
        Command::Pm => "Open a direct conversation. Without a name, pick from the list.",
        Command::Games => "Show what everyone in the list is playing. Repeat to go back.",
        Command::Help => "Show help for a command, or for all of them.",
        Command::Cmds => "List every command name.",
        Command::Block => "Block an account.",
        Command::Unblock => "Unblock an account.",
        Command::Set => "Change the roster width or the scrollback length. \
             Saved to the config file.",
        Command::Autojoin => {
            "Manage the rooms joined on connect. Without an id, add and del use the active room."
        }
        Command::Debug => "Toggle diagnostics in the log window.",
    }
}
