//! Application state and key handling.
//!
//! [`App`] glues the terminal to the session: it owns the input line,
//! routes key presses either to the line editor or to an open picker, and
//! feeds service events into the session between frames.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::session::{Flow, Session};
use crate::settings::SettingsStore;
use crate::transport::{ServiceEvent, Transport};
use crate::ui::TerminalView;

/// Lines scrolled per PageUp/PageDown.
const PAGE_LINES: usize = 10;

/// Single-line input editor. The cursor is a character index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLine {
    text: String,
    cursor: usize,
}

impl InputLine {
    /// Creates an empty input line.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            text: String::new(),
            cursor: 0,
        }
    }

    /// Current text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position in characters.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Text before and after the cursor.
    #[must_use]
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.text.split_at(self.byte_offset(self.cursor))
    }

    /// Insert a character at the cursor position.
    pub fn enter_char(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_offset(self.cursor);
            self.text.remove(at);
        }
    }

    /// Move cursor left.
    pub const fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move cursor right.
    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.text.chars().count() {
            self.cursor += 1;
        }
    }

    /// Move cursor to the start of the line.
    pub const fn home(&mut self) {
        self.cursor = 0;
    }

    /// Move cursor past the last character.
    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    /// Takes the text, leaving the line empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.text
            .char_indices()
            .nth(chars)
            .map_or(self.text.len(), |(i, _)| i)
    }
}

/// Main application state.
pub struct App<T, S> {
    session: Session<T, TerminalView, S>,
    events: mpsc::UnboundedReceiver<ServiceEvent>,
    input: InputLine,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl<T: Transport, S: SettingsStore> App<T, S> {
    /// Wraps a session and the receiving end of its transport's events.
    #[must_use]
    pub const fn new(
        session: Session<T, TerminalView, S>,
        events: mpsc::UnboundedReceiver<ServiceEvent>,
    ) -> Self {
        Self {
            session,
            events,
            input: InputLine::new(),
            should_quit: false,
        }
    }

    /// The session.
    pub const fn session(&self) -> &Session<T, TerminalView, S> {
        &self.session
    }

    /// The session, mutably.
    pub const fn session_mut(&mut self) -> &mut Session<T, TerminalView, S> {
        &mut self.session
    }

    /// The terminal view the session draws into.
    pub const fn view(&self) -> &TerminalView {
        self.session.renderer()
    }

    /// The input line.
    pub const fn input(&self) -> &InputLine {
        &self.input
    }

    /// Drains pending service events, then runs deferred work and the
    /// periodic tick.
    pub fn pump(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            tracing::trace!(?event, "service event");
            self.session.apply_event(event);
        }
        self.session.run_deferred();
        self.session.tick(Instant::now());
    }

    /// Handle a key event.
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        self.session.note_activity(Instant::now());

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            // Ctrl-C goes through /quit so the transport is signed out. An
            // open picker suspends input, so close it first.
            if self.session.renderer().picker().is_some() {
                self.session.renderer_mut().cancel_picker();
                self.session.resolve_pick(None);
            }
            self.submit_line("/quit");
            return;
        }

        if self.session.renderer().picker().is_some() {
            self.handle_picker_key(key);
        } else {
            self.handle_input_key(key);
        }
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.session.renderer_mut().picker_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.session.renderer_mut().picker_next(),
            KeyCode::Enter => {
                let choice = self.session.renderer_mut().take_picker_choice();
                self.session.resolve_pick(choice);
            }
            KeyCode::Esc => {
                self.session.renderer_mut().cancel_picker();
                self.session.resolve_pick(None);
            }
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let line = self.input.take();
                self.submit_line(&line);
            }
            KeyCode::Char(c) => self.input.enter_char(c),
            KeyCode::Backspace => self.input.delete_char(),
            KeyCode::Left => self.input.move_cursor_left(),
            KeyCode::Right => self.input.move_cursor_right(),
            KeyCode::Home => self.input.home(),
            KeyCode::End => self.input.end(),
            KeyCode::PageUp => self.session.renderer_mut().scroll_up(PAGE_LINES),
            KeyCode::PageDown => self.session.renderer_mut().scroll_down(PAGE_LINES),
            _ => {}
        }
    }

    fn submit_line(&mut self, line: &str) {
        if self.session.submit(line) == Flow::Quit {
            self.should_quit = true;
        }
    }
}
