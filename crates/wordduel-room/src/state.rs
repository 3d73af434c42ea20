//! Room snapshot, lifecycle state machine, and consensus gates.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use wordduel_protocol::{RoomId, UserId};

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The lifecycle state of a match.
///
/// Transitions are strictly ordered — no skipping states:
///
/// ```text
/// WaitingStart → InputSecret → ReadyCheck → Playing → Finished
/// ```
///
/// The only cycle is the rematch re-entry: a Finished room stays
/// Finished while start confirmations accumulate, and the second one
/// resets it straight to InputSecret (see
/// [`machine::confirm_start`](crate::machine::confirm_start)).
///
/// - **WaitingStart**: both players matched, waiting for both to
///   confirm the match should begin.
/// - **InputSecret**: each player submits a secret word and signals
///   they're done.
/// - **ReadyCheck**: final readiness gate before play.
/// - **Playing**: players alternate guesses; exactly one holds the turn.
/// - **Finished**: someone guessed correctly, forfeited, or the room
///   expired. The row survives for scores and rematch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    WaitingStart,
    InputSecret,
    ReadyCheck,
    Playing,
    Finished,
}

impl GameState {
    /// Returns `true` once the match is over.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Returns `true` if free-text chat is relayed to the opponent.
    pub fn allows_relay(&self) -> bool {
        matches!(self, Self::Playing | Self::Finished)
    }

    /// The next state in the forward order, if any.
    ///
    /// The rematch re-entry is deliberately not part of this order; it
    /// goes through an explicit reset.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::WaitingStart => Some(Self::InputSecret),
            Self::InputSecret => Some(Self::ReadyCheck),
            Self::ReadyCheck => Some(Self::Playing),
            Self::Playing => Some(Self::Finished),
            Self::Finished => None,
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingStart => write!(f, "WaitingStart"),
            Self::InputSecret => write!(f, "InputSecret"),
            Self::ReadyCheck => write!(f, "ReadyCheck"),
            Self::Playing => write!(f, "Playing"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Seat & Gate
// ---------------------------------------------------------------------------

/// Which side of the room a user occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Seat {
    One,
    Two,
}

impl Seat {
    /// The other seat.
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

/// A two-party consensus point: a state transition fires only once both
/// players have confirmed.
///
/// Each gating phase owns its own `Gate` so a confirmation from an
/// earlier phase can never leak into a later phase. A gate is cleared
/// when its transition fires and again on rematch reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    player1: bool,
    player2: bool,
}

impl Gate {
    /// Records a confirmation from one seat. Re-confirming is a no-op.
    pub fn confirm(&mut self, seat: Seat) {
        match seat {
            Seat::One => self.player1 = true,
            Seat::Two => self.player2 = true,
        }
    }

    /// Whether the given seat has confirmed.
    pub fn confirmed(&self, seat: Seat) -> bool {
        match seat {
            Seat::One => self.player1,
            Seat::Two => self.player2,
        }
    }

    /// Whether both players have confirmed.
    pub fn both(&self) -> bool {
        self.player1 && self.player2
    }

    /// Resets both confirmations.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// The match aggregate: one game between two players.
///
/// This is a plain value — transition functions clone it, mutate the
/// clone, and hand the new snapshot back. The store publishes committed
/// snapshots under the room's exclusive lock.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub player1: UserId,
    pub player2: UserId,
    pub state: GameState,
    /// Gate for WaitingStart → InputSecret.
    pub start_gate: Gate,
    /// Gate for InputSecret → ReadyCheck.
    pub secrets_done_gate: Gate,
    /// Gate for ReadyCheck → Playing.
    pub ready_gate: Gate,
    /// Secrets are stored verbatim; normalization happens only at
    /// comparison time.
    pub player1_word: Option<String>,
    pub player2_word: Option<String>,
    /// The player whose turn it is. `Some` exactly while Playing.
    pub turn: Option<UserId>,
    /// Cumulative scores — survive rematches in the same room.
    pub player1_score: u32,
    pub player2_score: u32,
    pub winner: Option<UserId>,
    /// Stamped on every state-affecting action; drives inactivity expiry.
    pub last_action_at: Instant,
}

impl Room {
    /// Creates a fresh room in WaitingStart.
    pub fn new(id: RoomId, player1: UserId, player2: UserId, now: Instant) -> Self {
        Self {
            id,
            player1,
            player2,
            state: GameState::WaitingStart,
            start_gate: Gate::default(),
            secrets_done_gate: Gate::default(),
            ready_gate: Gate::default(),
            player1_word: None,
            player2_word: None,
            turn: None,
            player1_score: 0,
            player2_score: 0,
            winner: None,
            last_action_at: now,
        }
    }

    /// The seat a user occupies, or `None` if they're not in this room.
    pub fn seat_of(&self, user: UserId) -> Option<Seat> {
        if user == self.player1 {
            Some(Seat::One)
        } else if user == self.player2 {
            Some(Seat::Two)
        } else {
            None
        }
    }

    /// The user sitting in a seat.
    pub fn occupant(&self, seat: Seat) -> UserId {
        match seat {
            Seat::One => self.player1,
            Seat::Two => self.player2,
        }
    }

    /// The opponent of a user, or `None` if they're not in this room.
    pub fn opponent_of(&self, user: UserId) -> Option<UserId> {
        self.seat_of(user).map(|s| self.occupant(s.other()))
    }

    /// The stored secret for a seat.
    pub fn word_of(&self, seat: Seat) -> Option<&str> {
        match seat {
            Seat::One => self.player1_word.as_deref(),
            Seat::Two => self.player2_word.as_deref(),
        }
    }

    /// Stores a secret for a seat (verbatim).
    pub fn set_word(&mut self, seat: Seat, word: String) {
        match seat {
            Seat::One => self.player1_word = Some(word),
            Seat::Two => self.player2_word = Some(word),
        }
    }

    /// The cumulative score for a seat.
    pub fn score_of(&self, seat: Seat) -> u32 {
        match seat {
            Seat::One => self.player1_score,
            Seat::Two => self.player2_score,
        }
    }

    /// Increments a seat's score by one.
    pub fn add_score(&mut self, seat: Seat) {
        match seat {
            Seat::One => self.player1_score += 1,
            Seat::Two => self.player2_score += 1,
        }
    }

    /// Resets the room for a rematch: back to WaitingStart with
    /// secrets, all three gates, turn, and winner cleared. Cumulative
    /// scores are kept.
    pub fn reset_for_rematch(&mut self) {
        self.state = GameState::WaitingStart;
        self.start_gate.clear();
        self.secrets_done_gate.clear();
        self.ready_gate.clear();
        self.player1_word = None;
        self.player2_word = None;
        self.turn = None;
        self.winner = None;
    }
}
