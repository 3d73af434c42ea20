//! The transition functions of the room state machine.
//!
//! Every function here takes the current [`Room`] snapshot plus an
//! action payload and returns either a new snapshot or a
//! [`TransitionError`] — never a partially-applied state. The service
//! layer runs these inside the store's per-room exclusive transaction,
//! which is what makes concurrent actions from both players resolve to
//! exactly one outcome.

use std::time::Instant;

use rand::Rng;
use wordduel_protocol::UserId;

use crate::{normalize, GameConfig, GameState, Room, Seat, TransitionError};

/// The result of a guess: whether it was correct, plus the new snapshot.
#[derive(Debug)]
pub struct GuessOutcome {
    pub correct: bool,
    pub room: Room,
}

fn seat_of(room: &Room, user: UserId) -> Result<Seat, TransitionError> {
    room.seat_of(user)
        .ok_or(TransitionError::NotOccupant(user, room.id))
}

/// Applies one player's start confirmation (WaitingStart gate).
///
/// Also the rematch entry point: the same gate is accepted on a
/// Finished room, which stays Finished until the second confirmation
/// arrives. At that point the room is reset — secrets, gates, turn,
/// and winner cleared, cumulative scores kept — and moves straight to
/// InputSecret, exactly as if both players had confirmed a fresh
/// WaitingStart. Keeping the room Finished until mutual consent means
/// the players' room back-references can be restored in the same
/// commit that reactivates it.
pub fn confirm_start(
    room: &Room,
    user: UserId,
    now: Instant,
) -> Result<Room, TransitionError> {
    if room.state != GameState::WaitingStart && room.state != GameState::Finished {
        return Err(TransitionError::WrongState(room.state));
    }
    let seat = seat_of(room, user)?;

    let mut next = room.clone();
    next.start_gate.confirm(seat);
    if next.start_gate.both() {
        if next.state == GameState::Finished {
            next.reset_for_rematch();
        }
        next.state = GameState::InputSecret;
        next.start_gate.clear();
    }
    next.last_action_at = now;
    Ok(next)
}

/// Stores the caller's secret word (verbatim — normalization happens
/// only at comparison time).
///
/// Rejects lengths outside `config.min_secret_chars..=max_secret_chars`
/// and any state other than InputSecret. Overwriting an earlier secret
/// before signalling done is allowed.
pub fn set_secret(
    room: &Room,
    user: UserId,
    word: &str,
    config: &GameConfig,
    now: Instant,
) -> Result<Room, TransitionError> {
    if room.state != GameState::InputSecret {
        return Err(TransitionError::WrongState(room.state));
    }
    let seat = seat_of(room, user)?;

    let len = word.chars().count();
    if len < config.min_secret_chars || len > config.max_secret_chars {
        return Err(TransitionError::InvalidSecretLength {
            len,
            min: config.min_secret_chars,
            max: config.max_secret_chars,
        });
    }

    let mut next = room.clone();
    next.set_word(seat, word.to_string());
    next.last_action_at = now;
    Ok(next)
}

/// Applies one player's "done entering my secret" confirmation
/// (InputSecret gate). Rejects callers who haven't stored a secret.
/// Both confirmations move the room to ReadyCheck.
pub fn confirm_secrets_done(
    room: &Room,
    user: UserId,
    now: Instant,
) -> Result<Room, TransitionError> {
    if room.state != GameState::InputSecret {
        return Err(TransitionError::WrongState(room.state));
    }
    let seat = seat_of(room, user)?;
    if room.word_of(seat).is_none() {
        return Err(TransitionError::SecretNotSet);
    }

    let mut next = room.clone();
    next.secrets_done_gate.confirm(seat);
    if next.secrets_done_gate.both() {
        next.state = GameState::ReadyCheck;
        next.secrets_done_gate.clear();
    }
    next.last_action_at = now;
    Ok(next)
}

/// Applies one player's readiness confirmation (ReadyCheck gate).
///
/// Both confirmations start play: the first turn goes to a uniformly
/// random player. `rand::rng()` is a CSPRNG, so the draw stays
/// unpredictable to players who have watched earlier rounds.
pub fn confirm_ready(
    room: &Room,
    user: UserId,
    now: Instant,
) -> Result<Room, TransitionError> {
    if room.state != GameState::ReadyCheck {
        return Err(TransitionError::WrongState(room.state));
    }
    let seat = seat_of(room, user)?;

    let mut next = room.clone();
    next.ready_gate.confirm(seat);
    if next.ready_gate.both() {
        let first = if rand::rng().random_bool(0.5) {
            Seat::One
        } else {
            Seat::Two
        };
        next.state = GameState::Playing;
        next.turn = Some(next.occupant(first));
        next.ready_gate.clear();
    }
    next.last_action_at = now;
    Ok(next)
}

/// Resolves a guess from the turn holder.
///
/// The guess and the opponent's stored secret are both normalized
/// before comparison. Correct: the room finishes with the guesser as
/// winner and their score incremented. Wrong: the turn passes to the
/// opponent. Guesses out of turn are rejected without touching the room.
pub fn submit_guess(
    room: &Room,
    user: UserId,
    guess: &str,
    now: Instant,
) -> Result<GuessOutcome, TransitionError> {
    if room.state != GameState::Playing {
        return Err(TransitionError::WrongState(room.state));
    }
    let seat = seat_of(room, user)?;
    if room.turn != Some(user) {
        return Err(TransitionError::NotYourTurn);
    }

    // The opponent's word is always present by the time we're Playing:
    // confirm_secrets_done refuses to pass the gate without one.
    let opponent_word = room.word_of(seat.other()).unwrap_or_default();
    let correct = normalize(guess) == normalize(opponent_word);

    let mut next = room.clone();
    if correct {
        next.state = GameState::Finished;
        next.winner = Some(user);
        next.add_score(seat);
        next.turn = None;
    } else {
        next.turn = Some(next.occupant(seat.other()));
    }
    next.last_action_at = now;
    Ok(GuessOutcome {
        correct,
        room: next,
    })
}

/// Voluntary early exit: the room finishes with the opponent as winner.
///
/// Forfeiting an already-Finished room is a tolerated no-op — the
/// snapshot comes back unchanged so retries can't double-apply.
pub fn forfeit(room: &Room, user: UserId, now: Instant) -> Result<Room, TransitionError> {
    let seat = seat_of(room, user)?;
    if room.state == GameState::Finished {
        return Ok(room.clone());
    }

    let mut next = room.clone();
    next.state = GameState::Finished;
    next.winner = Some(next.occupant(seat.other()));
    next.turn = None;
    next.last_action_at = now;
    Ok(next)
}

/// Forced expiry by the inactivity reaper: the room finishes with no
/// winner. Already-Finished rooms come back unchanged, which makes
/// repeated sweeps idempotent.
pub fn expire(room: &Room, now: Instant) -> Room {
    if room.state == GameState::Finished {
        return room.clone();
    }

    let mut next = room.clone();
    next.state = GameState::Finished;
    next.winner = None;
    next.turn = None;
    next.last_action_at = now;
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordduel_protocol::RoomId;

    const P1: UserId = UserId(10);
    const P2: UserId = UserId(20);

    fn room() -> Room {
        Room::new(RoomId(1), P1, P2, Instant::now())
    }

    fn config() -> GameConfig {
        GameConfig::default()
    }

    /// Drives a fresh room all the way to Playing.
    fn playing_room() -> Room {
        let now = Instant::now();
        let cfg = config();
        let r = room();
        let r = confirm_start(&r, P1, now).unwrap();
        let r = confirm_start(&r, P2, now).unwrap();
        let r = set_secret(&r, P1, "banana", &cfg, now).unwrap();
        let r = set_secret(&r, P2, "Ban-Ana ", &cfg, now).unwrap();
        let r = confirm_secrets_done(&r, P1, now).unwrap();
        let r = confirm_secrets_done(&r, P2, now).unwrap();
        let r = confirm_ready(&r, P1, now).unwrap();
        confirm_ready(&r, P2, now).unwrap()
    }

    #[test]
    fn test_confirm_start_requires_both() {
        let r = confirm_start(&room(), P1, Instant::now()).unwrap();
        assert_eq!(r.state, GameState::WaitingStart);
        let r = confirm_start(&r, P2, Instant::now()).unwrap();
        assert_eq!(r.state, GameState::InputSecret);
        // Gate cleared once passed.
        assert!(!r.start_gate.confirmed(Seat::One));
    }

    #[test]
    fn test_confirm_start_rejects_outsider() {
        let err = confirm_start(&room(), UserId(99), Instant::now()).unwrap_err();
        assert!(matches!(err, TransitionError::NotOccupant(..)));
    }

    #[test]
    fn test_set_secret_length_bounds() {
        let now = Instant::now();
        let cfg = config();
        let mut r = room();
        r.state = GameState::InputSecret;

        assert!(matches!(
            set_secret(&r, P1, "ab", &cfg, now),
            Err(TransitionError::InvalidSecretLength { len: 2, .. })
        ));
        assert!(matches!(
            set_secret(&r, P1, &"x".repeat(101), &cfg, now),
            Err(TransitionError::InvalidSecretLength { len: 101, .. })
        ));
        let r = set_secret(&r, P1, "abc", &cfg, now).unwrap();
        assert_eq!(r.player1_word.as_deref(), Some("abc"));
    }

    #[test]
    fn test_set_secret_wrong_state() {
        let err = set_secret(&room(), P1, "abc", &config(), Instant::now()).unwrap_err();
        assert!(matches!(
            err,
            TransitionError::WrongState(GameState::WaitingStart)
        ));
    }

    #[test]
    fn test_secrets_done_requires_stored_secret() {
        let now = Instant::now();
        let mut r = room();
        r.state = GameState::InputSecret;
        assert!(matches!(
            confirm_secrets_done(&r, P1, now),
            Err(TransitionError::SecretNotSet)
        ));
    }

    #[test]
    fn test_earlier_gate_does_not_leak_into_later_gate() {
        let now = Instant::now();
        let cfg = config();
        // Both confirm start; those confirmations must not count toward
        // the secrets-done gate.
        let r = confirm_start(&room(), P1, now).unwrap();
        let r = confirm_start(&r, P2, now).unwrap();
        let r = set_secret(&r, P1, "apple", &cfg, now).unwrap();
        let r = confirm_secrets_done(&r, P1, now).unwrap();
        // Only P1 signalled done — still InputSecret.
        assert_eq!(r.state, GameState::InputSecret);
    }

    #[test]
    fn test_ready_gate_assigns_turn_to_one_of_the_players() {
        let r = playing_room();
        assert_eq!(r.state, GameState::Playing);
        let turn = r.turn.unwrap();
        assert!(turn == P1 || turn == P2);
        assert!(!r.ready_gate.confirmed(Seat::One));
    }

    #[test]
    fn test_guess_out_of_turn_rejected_without_mutation() {
        let r = playing_room();
        let not_turn = r.opponent_of(r.turn.unwrap()).unwrap();
        let err = submit_guess(&r, not_turn, "banana", Instant::now()).unwrap_err();
        assert!(matches!(err, TransitionError::NotYourTurn));
        // Snapshot untouched by construction; turn unchanged.
        assert_eq!(r.state, GameState::Playing);
    }

    #[test]
    fn test_correct_guess_finishes_and_scores() {
        let r = playing_room();
        let turn = r.turn.unwrap();
        let seat = r.seat_of(turn).unwrap();
        // Both secrets normalize to "banana" in playing_room().
        let outcome = submit_guess(&r, turn, "  BANANA! ", Instant::now()).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.room.state, GameState::Finished);
        assert_eq!(outcome.room.winner, Some(turn));
        assert_eq!(outcome.room.score_of(seat), 1);
        assert_eq!(outcome.room.turn, None);
    }

    #[test]
    fn test_wrong_guess_passes_turn() {
        let r = playing_room();
        let turn = r.turn.unwrap();
        let opponent = r.opponent_of(turn).unwrap();
        let outcome = submit_guess(&r, turn, "kiwi", Instant::now()).unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.room.state, GameState::Playing);
        assert_eq!(outcome.room.turn, Some(opponent));
    }

    #[test]
    fn test_forfeit_awards_opponent_and_is_idempotent() {
        let r = playing_room();
        let r1 = forfeit(&r, P1, Instant::now()).unwrap();
        assert_eq!(r1.state, GameState::Finished);
        assert_eq!(r1.winner, Some(P2));
        // Re-forfeit of a finished room is a no-op.
        let r2 = forfeit(&r1, P1, Instant::now()).unwrap();
        assert_eq!(r2.winner, Some(P2));
        assert_eq!(r2.last_action_at, r1.last_action_at);
    }

    #[test]
    fn test_expire_has_no_winner_and_is_idempotent() {
        let r = playing_room();
        let r1 = expire(&r, Instant::now());
        assert_eq!(r1.state, GameState::Finished);
        assert_eq!(r1.winner, None);
        let r2 = expire(&r1, Instant::now());
        assert_eq!(r2.last_action_at, r1.last_action_at);
    }

    #[test]
    fn test_rematch_fires_on_second_confirmation_only() {
        let r = playing_room();
        let turn = r.turn.unwrap();
        let won = submit_guess(&r, turn, "banana", Instant::now())
            .unwrap()
            .room;
        assert_eq!(won.state, GameState::Finished);

        // One confirmation: the room stays Finished, winner intact.
        let r = confirm_start(&won, P1, Instant::now()).unwrap();
        assert_eq!(r.state, GameState::Finished);
        assert_eq!(r.winner, Some(turn));

        // Second confirmation: full reset except cumulative scores.
        let r = confirm_start(&r, P2, Instant::now()).unwrap();
        assert_eq!(r.state, GameState::InputSecret);
        assert_eq!(r.player1_word, None);
        assert_eq!(r.player2_word, None);
        assert_eq!(r.winner, None);
        assert_eq!(r.turn, None);
        assert!(!r.start_gate.confirmed(Seat::One));
        // One score was earned in the first round and survives.
        assert_eq!(r.player1_score + r.player2_score, 1);
    }
}
