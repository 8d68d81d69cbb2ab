//! Presence states for roster entries.

use serde::{Deserialize, Serialize};

/// Presence state of an account, as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresenceState {
    /// Signed out.
    Offline,
    /// Signed in and available.
    Online,
    /// Signed in, do not disturb.
    Busy,
    /// Signed in, idle.
    Away,
    /// Signed in, idle for a long time.
    Snooze,
    /// Any state the service reports that has no dedicated variant
    /// (trading, looking to play, ...).
    Other,
}

impl PresenceState {
    /// Maps the service's numeric presence code.
    ///
    /// Codes outside the known range map to [`PresenceState::Other`].
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Offline,
            1 => Self::Online,
            2 => Self::Busy,
            3 => Self::Away,
            4 => Self::Snooze,
            _ => Self::Other,
        }
    }

    /// Display rank, higher sorts first.
    ///
    /// Online > Busy > Away > Snooze > Other > Offline.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Online => 5,
            Self::Busy => 4,
            Self::Away => 3,
            Self::Snooze => 2,
            Self::Other => 1,
            Self::Offline => 0,
        }
    }

    /// Returns `true` for [`PresenceState::Offline`].
    #[must_use]
    pub const fn is_offline(self) -> bool {
        matches!(self, Self::Offline)
    }
}

impl std::fmt::Display for PresenceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offline => write!(f, "offline"),
            Self::Online => write!(f, "online"),
            Self::Busy => write!(f, "busy"),
            Self::Away => write!(f, "away"),
            Self::Snooze => write!(f, "snooze"),
            Self::Other => write!(f, "other"),
        }
    }
}
