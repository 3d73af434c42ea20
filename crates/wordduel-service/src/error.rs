//! Service-level errors and the user-facing taxonomy.

use wordduel_room::TransitionError;
use wordduel_store::StoreError;

/// Errors surfaced by the service layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A rejected state transition (wrong state, not your turn, ...).
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// A repository failure (missing rows, lock timeout).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No user with that handle has talked to the bot yet.
    #[error("no player with handle {0} is known")]
    UnknownHandle(String),

    /// A player tried to challenge themselves.
    #[error("you can't challenge yourself")]
    SelfChallenge,

    /// The challenger is already occupying a room.
    #[error("you are already in a room")]
    ChallengerBusy,

    /// The challenged player is already occupying a room.
    #[error("that player is already in a room")]
    TargetBusy,

    /// Accept/decline without a pending challenge.
    #[error("you have no pending challenge")]
    NoPendingChallenge,
}

/// How a [`ServiceError`] should be presented to the player.
///
/// - `Validation` — bad input, reported verbatim
/// - `StateConflict` — the action doesn't fit the current state; a
///   hint, no retry
/// - `NotFound` — the referenced room/user is gone; local cleanup then
///   report
/// - `Transient` — nothing applied, worth retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    StateConflict,
    NotFound,
    Transient,
}

impl ServiceError {
    /// Classifies this error for the dispatcher's reply policy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transition(TransitionError::InvalidSecretLength { .. }) => ErrorKind::Validation,
            Self::Transition(_) => ErrorKind::StateConflict,
            Self::Store(StoreError::LockTimeout(_)) => ErrorKind::Transient,
            Self::Store(StoreError::RoomNotFound(_) | StoreError::UserNotFound(_)) => {
                ErrorKind::NotFound
            }
            Self::Store(StoreError::AlreadyInRoom(..)) => ErrorKind::StateConflict,
            Self::UnknownHandle(_) => ErrorKind::NotFound,
            Self::SelfChallenge => ErrorKind::Validation,
            Self::ChallengerBusy | Self::TargetBusy | Self::NoPendingChallenge => {
                ErrorKind::StateConflict
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordduel_protocol::RoomId;
    use wordduel_room::GameState;

    #[test]
    fn test_kind_classification() {
        let e: ServiceError = TransitionError::InvalidSecretLength {
            len: 1,
            min: 3,
            max: 100,
        }
        .into();
        assert_eq!(e.kind(), ErrorKind::Validation);

        let e: ServiceError = TransitionError::WrongState(GameState::Playing).into();
        assert_eq!(e.kind(), ErrorKind::StateConflict);

        let e: ServiceError = StoreError::LockTimeout(RoomId(1)).into();
        assert_eq!(e.kind(), ErrorKind::Transient);

        let e: ServiceError = StoreError::RoomNotFound(RoomId(1)).into();
        assert_eq!(e.kind(), ErrorKind::NotFound);

        assert_eq!(ServiceError::SelfChallenge.kind(), ErrorKind::Validation);
        assert_eq!(
            ServiceError::NoPendingChallenge.kind(),
            ErrorKind::StateConflict
        );
    }
}
