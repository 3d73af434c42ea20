//! Rejection reasons for state transitions.

use wordduel_protocol::{RoomId, UserId};

use crate::GameState;

/// Why a transition was rejected.
///
/// These are decisions, not failures: the snapshot the caller passed in
/// is never mutated, so a rejected action leaves the room exactly as it
/// was.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    /// The caller is not one of the room's two players.
    #[error("player {0} is not in room {1}")]
    NotOccupant(UserId, RoomId),

    /// The room is not in a state that allows this action.
    #[error("room is in state {0}, action not allowed")]
    WrongState(GameState),

    /// A guess arrived from the player who doesn't hold the turn.
    #[error("not your turn")]
    NotYourTurn,

    /// `confirm_secrets_done` from a player who hasn't stored a secret.
    #[error("no secret word stored yet")]
    SecretNotSet,

    /// Secret word outside the allowed length bounds.
    #[error("secret must be between {min} and {max} characters, got {len}")]
    InvalidSecretLength { len: usize, min: usize, max: usize },
}
