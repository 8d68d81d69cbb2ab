//! Service-facing value types for `RosterChat`.
//!
//! These are the types a transport hands to the session engine: account and
//! room identifiers, presence states, roster entries and room ranks.

pub mod id;
pub mod presence;
pub mod roster;
