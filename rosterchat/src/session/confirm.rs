//! Single-slot confirmation gate for destructive actions.

use rosterchat_proto::id::PeerId;

/// Errors raised by the gate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// `accept` while nothing is pending.
    #[error("Nothing to confirm.")]
    NothingToConfirm,

    /// `reject` while nothing is pending.
    #[error("No confirmation is present.")]
    NothingToReject,
}

/// An action waiting for `/yes` or `/no`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    /// Remove an account from the friends list.
    RemoveContact(PeerId),
}

/// Holds at most one pending action.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationGate {
    pending: Option<PendingAction>,
}

impl ConfirmationGate {
    /// Creates an idle gate.
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Puts `action` in the slot, returning whatever it replaced.
    pub fn request(&mut self, action: PendingAction) -> Option<PendingAction> {
        self.pending.replace(action)
    }

    /// Takes the pending action for execution.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::NothingToConfirm`] when idle.
    pub fn accept(&mut self) -> Result<PendingAction, GateError> {
        self.pending.take().ok_or(GateError::NothingToConfirm)
    }

    /// Discards the pending action.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::NothingToReject`] when idle.
    pub fn reject(&mut self) -> Result<PendingAction, GateError> {
        self.pending.take().ok_or(GateError::NothingToReject)
    }

    /// The pending action, if any.
    #[must_use]
    pub const fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }
}
