//! Routing of inbound chat messages to the game services.
//!
//! One entry point, [`Dispatcher::dispatch`], per inbound message. The
//! flow is:
//!   1. Upsert the sender (first contact registers them)
//!   2. Parse the line into a [`Command`]
//!   3. Resolve which room the command applies to
//!   4. Call the service and turn the outcome into a reply
//!
//! Replies here go to the sender only; transition broadcasts to both
//! players come from the services themselves.

use std::sync::Arc;

use wordduel_protocol::{Command, ExternalId};
use wordduel_room::{GameConfig, GameState};
use wordduel_service::{
    CooldownMap, ErrorKind, MatchmakingService, Notifier, RoomService, ServiceError,
};
use wordduel_store::{MemoryStore, UserRecord};

const NOT_IN_GAME: &str = "You're not in a game. Challenge someone with /challenge <handle>.";

const WELCOME: &str = "Welcome to WordDuel! Challenge someone with /challenge <handle>. \
    In a game: /secret <word>, /done, /ready, /guess <text>, /forfeit. \
    After a game, /begin starts a rematch.";

/// Routes parsed commands to matchmaking and the room service, and
/// answers the sender.
pub struct Dispatcher<N: Notifier> {
    store: MemoryStore,
    rooms: Arc<RoomService<N>>,
    matchmaking: Arc<MatchmakingService<N>>,
    cooldowns: CooldownMap,
    notifier: Arc<N>,
}

impl<N: Notifier> Dispatcher<N> {
    pub fn new(
        store: MemoryStore,
        rooms: Arc<RoomService<N>>,
        matchmaking: Arc<MatchmakingService<N>>,
        notifier: Arc<N>,
        config: &GameConfig,
    ) -> Self {
        Self {
            store,
            rooms,
            matchmaking,
            cooldowns: CooldownMap::new(config.guess_cooldown),
            notifier,
        }
    }

    /// Handles one inbound message from the chat platform.
    ///
    /// Never fails: every rejection becomes a reply to the sender, so a
    /// bad message can't take down the inbound loop.
    pub async fn dispatch(&self, external_id: ExternalId, handle: &str, text: &str) {
        let user = self.store.upsert_user(external_id, handle);

        let command = match Command::parse(text) {
            Ok(command) => command,
            Err(e) => {
                self.reply(external_id, &e.to_string());
                return;
            }
        };
        tracing::debug!(user_id = %user.id, ?command, "dispatching");

        match command {
            Command::Start => {
                if user.current_room_id.is_some() {
                    self.reply(
                        external_id,
                        "You're already in a game. Finish it or leave with /forfeit.",
                    );
                } else {
                    self.reply(external_id, WELCOME);
                }
            }

            Command::Challenge { handle: target } => {
                match self.matchmaking.challenge(user.id, &target) {
                    Ok(()) => self.reply(external_id, &format!("Challenge sent to {target}.")),
                    Err(e) => self.report(&user, e),
                }
            }

            Command::Accept => {
                // Acceptance is announced to both players by the service.
                if let Err(e) = self.matchmaking.accept(user.id) {
                    self.report(&user, e);
                }
            }

            Command::Decline => match self.matchmaking.decline(user.id) {
                Ok(()) => self.reply(external_id, "Challenge declined."),
                Err(e) => self.report(&user, e),
            },

            Command::ConfirmStart => {
                // Rematch confirmations arrive after the pointers were
                // cleared at game end, hence the last-room fallback.
                let Some(room_id) = user.current_room_id.or(user.last_room_id) else {
                    self.reply(external_id, NOT_IN_GAME);
                    return;
                };
                match self.rooms.confirm_start(room_id, user.id).await {
                    Ok(room) if room.state != GameState::InputSecret => {
                        self.reply(external_id, "Got it. Waiting for your opponent to /begin.");
                    }
                    Ok(_) => {}
                    Err(e) => self.report(&user, e),
                }
            }

            Command::SetSecret { word } => {
                let Some(room_id) = user.current_room_id else {
                    self.reply(external_id, NOT_IN_GAME);
                    return;
                };
                match self.rooms.set_secret(room_id, user.id, &word).await {
                    Ok(_) => self.reply(
                        external_id,
                        "Secret stored. Send /done when you're happy with it.",
                    ),
                    Err(e) => self.report(&user, e),
                }
            }

            Command::ConfirmSecretsDone => {
                let Some(room_id) = user.current_room_id else {
                    self.reply(external_id, NOT_IN_GAME);
                    return;
                };
                match self.rooms.confirm_secrets_done(room_id, user.id).await {
                    Ok(room) if room.state == GameState::InputSecret => {
                        self.reply(external_id, "Waiting for your opponent to finish their secret.");
                    }
                    Ok(_) => {}
                    Err(e) => self.report(&user, e),
                }
            }

            Command::ConfirmReady => {
                let Some(room_id) = user.current_room_id else {
                    self.reply(external_id, NOT_IN_GAME);
                    return;
                };
                match self.rooms.confirm_ready(room_id, user.id).await {
                    Ok(room) if room.state == GameState::ReadyCheck => {
                        self.reply(external_id, "Waiting for your opponent to /ready up.");
                    }
                    Ok(_) => {}
                    Err(e) => self.report(&user, e),
                }
            }

            Command::Guess { text } => {
                let Some(room_id) = user.current_room_id else {
                    self.reply(external_id, NOT_IN_GAME);
                    return;
                };
                if !self.cooldowns.try_acquire(user.id) {
                    let secs = self.cooldowns.ttl().as_secs().max(1);
                    self.reply(
                        external_id,
                        &format!("Easy there! Wait {secs}s between guesses."),
                    );
                    return;
                }
                match self.rooms.submit_guess(room_id, user.id, &text).await {
                    // The win is broadcast by the service; only the
                    // miss needs a reply to the guesser.
                    Ok(result) if !result.correct => {
                        self.reply(external_id, "Not it. The turn passes to your opponent.");
                    }
                    Ok(_) => {}
                    Err(e) => self.report(&user, e),
                }
            }

            Command::Forfeit => {
                let Some(room_id) = user.current_room_id else {
                    self.reply(external_id, NOT_IN_GAME);
                    return;
                };
                match self.rooms.forfeit(user.id, room_id).await {
                    Ok(_) => self.reply(external_id, "You left the game."),
                    Err(e) => self.report(&user, e),
                }
            }

            Command::Relay { text } => self.relay(&user, &text).await,
        }
    }

    /// Passes free chat text to the opponent while the room allows it
    /// (during play and after the game). Anywhere else the text is
    /// dropped silently, like a remark in an empty lobby.
    async fn relay(&self, user: &UserRecord, text: &str) {
        if text.is_empty() {
            return;
        }
        let Some(room_id) = user.current_room_id.or(user.last_room_id) else {
            return;
        };
        let room = match self.store.find_room(room_id).await {
            Ok(room) => room,
            Err(_) => {
                self.store.clear_room_pointer(user.id);
                return;
            }
        };
        if !room.state.allows_relay() {
            tracing::debug!(user_id = %user.id, %room_id, state = %room.state, "relay suppressed");
            return;
        }
        let Some(opponent) = room.opponent_of(user.id) else {
            return;
        };
        if let Ok(record) = self.store.find_user(opponent) {
            self.notifier
                .notify(record.external_id, &format!("@{}: {text}", user.handle));
        }
    }

    fn reply(&self, to: ExternalId, text: &str) {
        self.notifier.notify(to, text);
    }

    /// Turns a service rejection into a reply, per its [`ErrorKind`]:
    /// validation and state conflicts verbatim, missing rooms after
    /// dropping the stale pointer, transient failures as a retry hint.
    fn report(&self, user: &UserRecord, err: ServiceError) {
        let text = match err.kind() {
            ErrorKind::Validation | ErrorKind::StateConflict => err.to_string(),
            ErrorKind::NotFound => match err {
                ServiceError::Store(_) => {
                    self.store.clear_room_pointer(user.id);
                    NOT_IN_GAME.to_string()
                }
                other => other.to_string(),
            },
            ErrorKind::Transient => {
                "The game is busy right now, try again in a moment.".to_string()
            }
        };
        tracing::debug!(user_id = %user.id, reply = %text, "rejection reported");
        self.notifier.notify(user.external_id, &text);
    }
}
