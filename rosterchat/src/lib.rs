//! `RosterChat`: terminal chat client library.
//!
//! The [`session`] engine keeps rosters, open conversations, unread markers
//! and the status line, and executes the slash commands parsed by
//! [`command`]. It talks to a messaging service through the
//! [`transport::Transport`] trait and draws through the
//! [`render::Renderer`] trait; [`ui`] and [`app`] bind both to a terminal.

pub mod app;
pub mod command;
pub mod config;
pub mod render;
pub mod session;
pub mod settings;
pub mod transport;
pub mod ui;
