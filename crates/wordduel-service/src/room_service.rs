//! Transactional orchestration of the room state machine.
//!
//! Every public operation follows the same pattern:
//!
//! 1. open the store's exclusive transaction on the room (bounded wait)
//! 2. apply the pure transition to the snapshot
//! 3. stage the result — plus the user pointer clears whenever the room
//!    reached Finished — and commit
//! 4. fire best-effort notifications
//!
//! A rejected transition drops the transaction, so nothing is ever
//! half-applied; a retried action whose precondition already changed
//! simply re-fails with the same rejection instead of double-applying.

use std::sync::Arc;
use std::time::Instant;

use wordduel_protocol::{RoomId, UserId};
use wordduel_room::{machine, GameConfig, GameState, Room, Seat};
use wordduel_store::MemoryStore;

use crate::{Notifier, ServiceError};

/// The outcome handed back to the dispatcher after a guess.
#[derive(Debug)]
pub struct GuessResult {
    pub correct: bool,
    pub room: Room,
}

/// Runs game actions as locked read-modify-write transactions and
/// announces the resulting transitions to the players.
pub struct RoomService<N: Notifier> {
    store: MemoryStore,
    notifier: Arc<N>,
    config: GameConfig,
}

impl<N: Notifier> RoomService<N> {
    pub fn new(store: MemoryStore, notifier: Arc<N>, config: GameConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Applies one player's start confirmation. When the second
    /// confirmation arrives the room moves to InputSecret and both
    /// players are told to submit secrets.
    ///
    /// On the rematch path (the room was Finished) the firing
    /// confirmation also restores both players' room back-references;
    /// that commit fails if either player has joined another room
    /// since, leaving this room finished and untouched.
    pub async fn confirm_start(&self, room_id: RoomId, user: UserId) -> Result<Room, ServiceError> {
        let mut txn = self.store.begin(room_id).await?;
        let was_finished = txn.room().state.is_finished();
        let next = machine::confirm_start(txn.room(), user, Instant::now())?;
        let entered_input = next.state == GameState::InputSecret;
        txn.stage(next);
        if was_finished && entered_input {
            txn.stage_restore_pointers();
        }
        let room = txn.commit()?;

        if entered_input {
            tracing::info!(%room_id, rematch = was_finished, "both players confirmed start");
            self.notify_both(
                &room,
                "Both players are in! Store your secret word with /secret <word>.",
            );
        }
        Ok(room)
    }

    /// Stores the caller's secret word (verbatim).
    pub async fn set_secret(
        &self,
        room_id: RoomId,
        user: UserId,
        word: &str,
    ) -> Result<Room, ServiceError> {
        let mut txn = self.store.begin(room_id).await?;
        let next = machine::set_secret(txn.room(), user, word, &self.config, Instant::now())?;
        txn.stage(next);
        Ok(txn.commit()?)
    }

    /// Applies one player's "done entering my secret" confirmation.
    pub async fn confirm_secrets_done(
        &self,
        room_id: RoomId,
        user: UserId,
    ) -> Result<Room, ServiceError> {
        let mut txn = self.store.begin(room_id).await?;
        let next = machine::confirm_secrets_done(txn.room(), user, Instant::now())?;
        let entered_ready = next.state == GameState::ReadyCheck;
        txn.stage(next);
        let room = txn.commit()?;

        if entered_ready {
            self.notify_both(&room, "Both secrets are stored! Send /ready to start playing.");
        }
        Ok(room)
    }

    /// Applies one player's readiness confirmation. The second one
    /// starts play with a randomly drawn first turn.
    pub async fn confirm_ready(&self, room_id: RoomId, user: UserId) -> Result<Room, ServiceError> {
        let mut txn = self.store.begin(room_id).await?;
        let next = machine::confirm_ready(txn.room(), user, Instant::now())?;
        let started = next.state == GameState::Playing;
        txn.stage(next);
        let room = txn.commit()?;

        if started {
            // turn is Some exactly while Playing.
            if let Some(turn) = room.turn {
                tracing::info!(%room_id, turn_player = %turn, "game started");
                let text = format!(
                    "Game on! @{} guesses first — use /guess <text>.",
                    self.handle_of(turn)
                );
                self.notify_both(&room, &text);
            }
        }
        Ok(room)
    }

    /// Resolves a guess from the turn holder.
    ///
    /// A correct guess finishes the room (winner, score, both players'
    /// room pointers cleared in the same commit); a wrong one passes
    /// the turn and tells the opponent it's theirs.
    pub async fn submit_guess(
        &self,
        room_id: RoomId,
        user: UserId,
        guess: &str,
    ) -> Result<GuessResult, ServiceError> {
        let mut txn = self.store.begin(room_id).await?;
        let outcome = machine::submit_guess(txn.room(), user, guess, Instant::now())?;
        let correct = outcome.correct;
        txn.stage(outcome.room);
        if correct {
            txn.stage_clear_pointers();
        }
        let room = txn.commit()?;

        if correct {
            tracing::info!(%room_id, winner = %user, "game finished by correct guess");
            let text = format!(
                "@{} guessed \"{}\" and wins! Score: @{} {} — @{} {}. \
                 Send /begin for a rematch, or just chat.",
                self.handle_of(user),
                guess,
                self.handle_of(room.player1),
                room.score_of(Seat::One),
                self.handle_of(room.player2),
                room.score_of(Seat::Two),
            );
            self.notify_both(&room, &text);
        } else if let Some(next_turn) = room.turn {
            let text = format!(
                "Wrong guess by your opponent! Your turn, @{}.",
                self.handle_of(next_turn)
            );
            self.notify_user(next_turn, &text);
        }

        Ok(GuessResult { correct, room })
    }

    /// Voluntary exit: the room finishes with the opponent as winner
    /// and both pointers cleared. Forfeiting an already-finished room
    /// is a no-op.
    pub async fn forfeit(&self, user: UserId, room_id: RoomId) -> Result<Room, ServiceError> {
        let mut txn = self.store.begin(room_id).await?;
        let was_finished = txn.room().state.is_finished();
        let next = machine::forfeit(txn.room(), user, Instant::now())?;
        txn.stage(next);
        if !was_finished {
            txn.stage_clear_pointers();
        }
        let room = txn.commit()?;

        if !was_finished {
            tracing::info!(%room_id, forfeiter = %user, "game finished by forfeit");
            if let Some(winner) = room.winner {
                let text = format!("@{} left the game — you win!", self.handle_of(user));
                self.notify_user(winner, &text);
            }
        }
        Ok(room)
    }

    /// Forced expiry, used by the inactivity reaper. Returns `None`
    /// when the room was already finished (repeated sweeps are no-ops)
    /// or saw an action at or after `cutoff`. The sweep's idleness scan
    /// runs without the room lock, so idleness is re-checked here,
    /// under it — a player action committed between the scan and this
    /// transaction keeps the room alive.
    /// Notifications are best-effort and never roll back the commit.
    pub async fn expire_room(
        &self,
        room_id: RoomId,
        cutoff: Instant,
    ) -> Result<Option<Room>, ServiceError> {
        let mut txn = self.store.begin(room_id).await?;
        if txn.room().state.is_finished() || txn.room().last_action_at >= cutoff {
            return Ok(None);
        }
        let next = machine::expire(txn.room(), Instant::now());
        txn.stage(next);
        txn.stage_clear_pointers();
        let room = txn.commit()?;

        tracing::info!(%room_id, "room expired due to inactivity");
        let minutes = self.config.timeout_window.as_secs() / 60;
        let text = format!(
            "Game ended automatically after {minutes} minutes of inactivity."
        );
        self.notify_both(&room, &text);
        Ok(Some(room))
    }

    // -- notification helpers ----------------------------------------------

    /// Display handle for a user, falling back to the id if the record
    /// is somehow gone (notifications must not fail the operation).
    fn handle_of(&self, user: UserId) -> String {
        match self.store.find_user(user) {
            Ok(record) => record.handle,
            Err(_) => user.to_string(),
        }
    }

    /// Best-effort send to one player. A missing record or a failed
    /// send is logged and swallowed.
    fn notify_user(&self, user: UserId, text: &str) {
        match self.store.find_user(user) {
            Ok(record) => self.notifier.notify(record.external_id, text),
            Err(_) => {
                tracing::warn!(user_id = %user, "skipping notification, user record missing");
            }
        }
    }

    fn notify_both(&self, room: &Room, text: &str) {
        self.notify_user(room.player1, text);
        self.notify_user(room.player2, text);
    }
}
