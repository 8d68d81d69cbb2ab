//! Resolving a name or id argument to an account.

use rosterchat_proto::id::PeerId;

use crate::render::{Renderer, StyledText};
use crate::session::roster::{self, Namespace};
use crate::session::{PickPurpose, Session, Suspension};
use crate::settings::SettingsStore;
use crate::transport::Transport;

use super::CommandError;

/// Result of resolving a `/remove` or `/pm` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolved {
    /// The argument named this account.
    Found(PeerId),
    /// No argument: the user picks from the displayed list.
    Pick,
}

impl<T: Transport, R: Renderer, S: SettingsStore> Session<T, R, S> {
    /// Resolves `arg` against the rosters.
    ///
    /// Order: an account id present in any loaded roster, then an exact
    /// display name in the displayed roster, then in the active room's
    /// roster, then in the friends roster. An empty argument asks for a
    /// picker over the displayed roster.
    pub(crate) fn resolve_peer(&self, arg: &str) -> Result<Resolved, CommandError> {
        let arg = arg.trim();
        if arg.is_empty() {
            return if self.displayed.is_empty() {
                Err(CommandError::NothingToPick)
            } else {
                Ok(Resolved::Pick)
            };
        }

        let room_ns = self
            .registry
            .current()
            .as_room()
            .map(|room| Namespace::Room(room.clone()));
        let mut order = vec![self.displayed_namespace()];
        order.extend(room_ns);
        order.push(Namespace::Friends);

        if let Ok(peer) = PeerId::parse(arg)
            && order.iter().any(|ns| self.rosters.get(ns, &peer).is_some())
        {
            return Ok(Resolved::Found(peer));
        }

        order
            .iter()
            .find_map(|ns| self.rosters.find_by_name(ns, arg))
            .map(|entry| Resolved::Found(entry.id.clone()))
            .ok_or_else(|| CommandError::UserNotFound(arg.to_string()))
    }

    /// Opens a picker over the displayed roster.
    pub(crate) fn pick_from_displayed(&mut self, purpose: PickPurpose) {
        let ns = self.displayed_namespace();
        let items: Vec<StyledText> = self
            .displayed
            .iter()
            .filter_map(|peer| self.rosters.get(&ns, peer))
            .map(roster::name_line)
            .collect();
        let candidates = self.displayed.clone();
        self.start_picker(purpose, candidates, items);
    }

    /// Suspends input and shows `items`; row `i` stands for `candidates[i]`.
    pub(crate) fn start_picker(
        &mut self,
        purpose: PickPurpose,
        candidates: Vec<PeerId>,
        items: Vec<StyledText>,
    ) {
        tracing::debug!(?purpose, count = candidates.len(), "picker opened");
        self.suspended = Some(Suspension {
            purpose,
            candidates,
        });
        self.renderer.present_picker(items);
    }
}
