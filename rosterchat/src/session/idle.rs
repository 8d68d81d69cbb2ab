//! Idle detection for automatic away.

use std::time::{Duration, Instant};

/// Default inactivity before going away.
pub const DEFAULT_IDLE_AWAY: Duration = Duration::from_secs(600);

/// What the session should do after an idle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleTransition {
    /// Nothing changed.
    None,
    /// The timeout elapsed; set presence to away.
    GoAway,
    /// Input arrived while away; set presence back to online.
    Return,
}

/// Tracks the time of the last user input.
#[derive(Debug, Clone)]
pub struct IdleTracker {
    timeout: Duration,
    last_activity: Instant,
    away: bool,
}

impl IdleTracker {
    /// Starts tracking from `now`. A zero timeout disables auto-away.
    #[must_use]
    pub const fn new(timeout: Duration, now: Instant) -> Self {
        Self {
            timeout,
            last_activity: now,
            away: false,
        }
    }

    /// Whether auto-away is currently in effect.
    #[must_use]
    pub const fn is_away(&self) -> bool {
        self.away
    }

    /// Records input at `now`.
    pub fn activity(&mut self, now: Instant) -> IdleTransition {
        self.last_activity = now;
        if std::mem::take(&mut self.away) {
            IdleTransition::Return
        } else {
            IdleTransition::None
        }
    }

    /// Checks whether the timeout has elapsed at `now`.
    pub fn check(&mut self, now: Instant) -> IdleTransition {
        if self.away || self.timeout.is_zero() {
            return IdleTransition::None;
        }
        if now.saturating_duration_since(self.last_activity) >= self.timeout {
            self.away = true;
            IdleTransition::GoAway
        } else {
            IdleTransition::None
        }
    }
}
