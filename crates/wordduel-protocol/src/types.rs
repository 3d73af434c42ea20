//! Id newtypes shared across the workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unique internal identifier for a user record.
///
/// Newtype over `u64` so a `UserId` can never be confused with a
/// [`RoomId`] or [`ExternalId`] even though all three are integers
/// underneath. `#[serde(transparent)]` keeps the wire form a bare
/// number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// A unique identifier for a room — one match between two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// The stable id a user has on the chat platform.
///
/// This is what the notification channel addresses; it is assigned by
/// the platform, not by us, and never changes for a given account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(pub u64);

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X-{}", self.0)
    }
}
