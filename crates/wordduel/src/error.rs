//! Unified error type for the WordDuel bot.

use wordduel_protocol::CommandError;
use wordduel_room::TransitionError;
use wordduel_service::ServiceError;
use wordduel_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `wordduel` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WordDuelError {
    /// A command-parsing error (missing argument, unknown command).
    #[error(transparent)]
    Command(#[from] CommandError),

    /// A rejected game-state transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// A repository error (missing rows, lock timeout).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A service-level error (matchmaking, orchestration).
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// An I/O error from the liveness listener.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordduel_protocol::RoomId;
    use wordduel_room::GameState;

    #[test]
    fn test_from_command_error() {
        let err = CommandError::Unknown("/frobnicate".into());
        let top: WordDuelError = err.into();
        assert!(matches!(top, WordDuelError::Command(_)));
        assert!(top.to_string().contains("/frobnicate"));
    }

    #[test]
    fn test_from_transition_error() {
        let err = TransitionError::WrongState(GameState::Playing);
        let top: WordDuelError = err.into();
        assert!(matches!(top, WordDuelError::Transition(_)));
    }

    #[test]
    fn test_from_store_error() {
        let err = StoreError::RoomNotFound(RoomId(1));
        let top: WordDuelError = err.into();
        assert!(matches!(top, WordDuelError::Store(_)));
    }

    #[test]
    fn test_from_service_error() {
        let err = ServiceError::SelfChallenge;
        let top: WordDuelError = err.into();
        assert!(matches!(top, WordDuelError::Service(_)));
    }
}
