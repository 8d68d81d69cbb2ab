//! Status line state and composition.
//!
//! The status line is built from five fields that are updated independently
//! (clock, self, active conversation label, room occupancy, connection state)
//! plus the unread markers. [`compose`] concatenates them in a fixed order
//! each time anything changes.

use rosterchat_proto::roster::MemberRank;

use super::notify::{UnreadKind, UnreadToken};
use crate::render::{StyledText, Tone};

/// Member counts of a room, by rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Occupancy {
    /// Administrators.
    pub admins: usize,
    /// Moderators.
    pub mods: usize,
    /// Regular members.
    pub members: usize,
}

impl Occupancy {
    /// Counts ranks. Ranks outside admin, moderator and member are ignored.
    pub fn tally(ranks: impl IntoIterator<Item = MemberRank>) -> Self {
        ranks.into_iter().fold(Self::default(), |mut acc, rank| {
            match rank {
                MemberRank::Admin => acc.admins += 1,
                MemberRank::Moderator => acc.mods += 1,
                MemberRank::Member => acc.members += 1,
                MemberRank::Other => {}
            }
            acc
        })
    }

    /// Total counted users.
    #[must_use]
    pub const fn users(&self) -> usize {
        self.admins + self.mods + self.members
    }

    /// Renders `N users (a admin, b mod)`, omitting zero clauses.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut ranks = Vec::new();
        if self.admins > 0 {
            ranks.push(format!("{} admin", self.admins));
        }
        if self.mods > 0 {
            ranks.push(format!("{} mod", self.mods));
        }
        if ranks.is_empty() {
            format!("{} users", self.users())
        } else {
            format!("{} users ({})", self.users(), ranks.join(", "))
        }
    }
}

/// Our own entry as shown in the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfField {
    /// Display name.
    pub name: String,
    /// Whether we are away, shown highlighted.
    pub away: bool,
}

/// Independently updated status line fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusLine {
    /// Wall clock text.
    pub clock: String,
    /// Our own name and away flag, once known.
    pub self_field: Option<SelfField>,
    /// `position:label` of the active conversation.
    pub label: Option<String>,
    /// Occupancy of the active room.
    pub occupancy: Option<Occupancy>,
    /// Whether the connection is down.
    pub disconnected: bool,
}

fn bracketed(line: &mut StyledText, inner: StyledText) {
    if !line.is_empty() {
        line.push_span(" ", Tone::Plain);
    }
    line.push_span("[", Tone::Accent);
    line.extend(inner);
    line.push_span("]", Tone::Accent);
}

/// Builds the status line.
///
/// Order: clock, self, label, occupancy, unread markers, disconnected flag.
/// Empty fields are skipped.
#[must_use]
pub fn compose(status: &StatusLine, unread: &[UnreadToken]) -> StyledText {
    let mut line = StyledText::new();
    if !status.clock.is_empty() {
        bracketed(&mut line, StyledText::plain(status.clock.clone()));
    }
    if let Some(me) = &status.self_field {
        let tone = if me.away { Tone::Warn } else { Tone::Plain };
        bracketed(&mut line, StyledText::toned(me.name.clone(), tone));
    }
    if let Some(label) = &status.label {
        bracketed(&mut line, StyledText::plain(label.clone()));
    }
    if let Some(occupancy) = &status.occupancy {
        bracketed(&mut line, StyledText::plain(occupancy.summary()));
    }
    if !unread.is_empty() {
        let mut tokens = StyledText::new();
        for (i, token) in unread.iter().enumerate() {
            if i > 0 {
                tokens.push_span(",", Tone::Plain);
            }
            let tone = match token.kind {
                UnreadKind::Direct => Tone::Alert,
                UnreadKind::Room => Tone::Plain,
            };
            tokens.push_span(token.position.to_string(), tone);
        }
        bracketed(&mut line, tokens);
    }
    if status.disconnected {
        if !line.is_empty() {
            line.push_span(" ", Tone::Plain);
        }
        line.push_span("[DISCONNECTED]", Tone::Alert);
    }
    line
}
