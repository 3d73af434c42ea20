//! Error types for the store layer.

use wordduel_protocol::{RoomId, UserId};

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The room does not exist.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The user does not exist.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// A room creation was attempted for a user who already occupies one.
    #[error("player {0} is already in room {1}")]
    AlreadyInRoom(UserId, RoomId),

    /// The room's exclusive lock could not be acquired in time.
    /// Transient — the caller should simply retry.
    #[error("timed out waiting for the lock on room {0}")]
    LockTimeout(RoomId),
}
