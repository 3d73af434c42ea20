//! Driving full duels through raw chat text, the way the platform
//! adapter would.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use wordduel::Dispatcher;
use wordduel_protocol::ExternalId;
use wordduel_room::{GameConfig, GameState};
use wordduel_service::{MatchmakingService, Notifier, RoomService};
use wordduel_store::MemoryStore;

const ALICE: ExternalId = ExternalId(1);
const BOB: ExternalId = ExternalId(2);

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(ExternalId, String)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, recipient: ExternalId, text: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((recipient, text.to_string()));
    }
}

impl RecordingNotifier {
    fn last_for(&self, recipient: ExternalId) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| *to == recipient)
            .map(|(_, text)| text.clone())
    }

    fn count_for(&self, recipient: ExternalId, needle: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, text)| *to == recipient && text.contains(needle))
            .count()
    }
}

struct Harness {
    store: MemoryStore,
    notifier: Arc<RecordingNotifier>,
    dispatcher: Dispatcher<RecordingNotifier>,
}

fn harness() -> Harness {
    harness_with(GameConfig {
        lock_timeout: Duration::from_millis(200),
        ..GameConfig::default()
    })
}

fn harness_with(config: GameConfig) -> Harness {
    let store = MemoryStore::new(config.lock_timeout);
    let notifier = Arc::new(RecordingNotifier::default());
    let rooms = Arc::new(RoomService::new(
        store.clone(),
        Arc::clone(&notifier),
        config.clone(),
    ));
    let matchmaking = Arc::new(MatchmakingService::new(
        store.clone(),
        Arc::clone(&notifier),
    ));
    let dispatcher = Dispatcher::new(
        store.clone(),
        rooms,
        matchmaking,
        Arc::clone(&notifier),
        &config,
    );
    Harness {
        store,
        notifier,
        dispatcher,
    }
}

impl Harness {
    async fn say(&self, who: ExternalId, text: &str) {
        let handle = if who == ALICE { "alice" } else { "bob" };
        self.dispatcher.dispatch(who, handle, text).await;
    }

    /// Whose turn it is, as an external id.
    async fn turn_holder(&self) -> ExternalId {
        let user = self.store.upsert_user(ALICE, "alice");
        let room_id = user.current_room_id.expect("alice not in a room");
        let room = self.store.find_room(room_id).await.unwrap();
        let turn = room.turn.expect("no turn holder");
        self.store.find_user(turn).unwrap().external_id
    }

    /// Runs the conversation up to Playing with both secrets "banana".
    async fn playing(&self) {
        self.say(ALICE, "/challenge @bob").await;
        self.say(BOB, "/accept").await;
        self.say(ALICE, "/begin").await;
        self.say(BOB, "/begin").await;
        self.say(ALICE, "/secret banana").await;
        self.say(BOB, "/secret Banana!").await;
        self.say(ALICE, "/done").await;
        self.say(BOB, "/done").await;
        self.say(ALICE, "/ready").await;
        self.say(BOB, "/ready").await;
    }
}

// =========================================================================
// Parsing and registration
// =========================================================================

#[tokio::test]
async fn test_start_replies_with_welcome() {
    let h = harness();
    h.say(ALICE, "/start").await;
    let reply = h.notifier.last_for(ALICE).unwrap();
    assert!(reply.contains("Welcome"));
    assert!(reply.contains("/challenge"));
    // The sender is registered as a side effect.
    assert!(h.store.find_user_by_handle("alice").is_some());
}

#[tokio::test]
async fn test_start_while_in_a_game_points_at_forfeit() {
    let h = harness();
    h.say(BOB, "/start").await;
    h.say(ALICE, "/challenge @bob").await;
    h.say(BOB, "/accept").await;

    h.say(ALICE, "/start").await;
    let reply = h.notifier.last_for(ALICE).unwrap();
    assert!(reply.contains("already in a game"));
    assert!(reply.contains("/forfeit"));
}

#[tokio::test]
async fn test_unknown_command_and_missing_argument_replies() {
    let h = harness();
    h.say(ALICE, "/frobnicate now").await;
    assert!(h
        .notifier
        .last_for(ALICE)
        .unwrap()
        .contains("unknown command"));

    h.say(ALICE, "/guess").await;
    assert!(h.notifier.last_for(ALICE).unwrap().contains("usage"));
}

#[tokio::test]
async fn test_room_commands_without_a_room_get_the_hint() {
    let h = harness();
    h.say(ALICE, "/guess banana").await;
    assert!(h
        .notifier
        .last_for(ALICE)
        .unwrap()
        .contains("not in a game"));
}

// =========================================================================
// A full duel over text
// =========================================================================

#[tokio::test]
async fn test_full_duel_from_challenge_to_win() {
    let h = harness();
    // Bob must have talked to the bot before he can be challenged.
    h.say(BOB, "/start").await;

    h.playing().await;
    assert_eq!(h.notifier.count_for(ALICE, "Game on!"), 1);
    assert_eq!(h.notifier.count_for(BOB, "Game on!"), 1);

    let turn = h.turn_holder().await;
    h.say(turn, "/guess banana").await;
    assert_eq!(h.notifier.count_for(ALICE, "and wins!"), 1);
    assert_eq!(h.notifier.count_for(BOB, "and wins!"), 1);
}

#[tokio::test]
async fn test_wrong_guess_reply_and_out_of_turn_hint() {
    let h = harness();
    h.say(BOB, "/start").await;
    h.playing().await;

    let turn = h.turn_holder().await;
    let other = if turn == ALICE { BOB } else { ALICE };

    h.say(other, "/guess banana").await;
    assert!(h.notifier.last_for(other).unwrap().contains("not your turn"));

    h.say(turn, "/guess pineapple").await;
    assert!(h.notifier.last_for(turn).unwrap().contains("Not it"));
}

#[tokio::test]
async fn test_guess_cooldown_blocks_rapid_fire() {
    let h = harness_with(GameConfig {
        guess_cooldown: Duration::from_secs(60),
        lock_timeout: Duration::from_millis(200),
        ..GameConfig::default()
    });
    h.say(BOB, "/start").await;
    h.playing().await;

    let turn = h.turn_holder().await;
    h.say(turn, "/guess pineapple").await;
    h.say(turn, "/guess mango").await;
    assert!(h.notifier.last_for(turn).unwrap().contains("Easy there"));
}

// =========================================================================
// Relay
// =========================================================================

#[tokio::test]
async fn test_relay_reaches_opponent_only_during_play_or_after() {
    let h = harness();
    h.say(BOB, "/start").await;
    h.say(ALICE, "/challenge @bob").await;
    h.say(BOB, "/accept").await;

    // WaitingStart: chat is dropped.
    h.say(ALICE, "psst, bob").await;
    assert_eq!(h.notifier.count_for(BOB, "psst"), 0);

    h.say(ALICE, "/begin").await;
    h.say(BOB, "/begin").await;
    h.say(ALICE, "/secret banana").await;
    h.say(BOB, "/secret cherry").await;
    h.say(ALICE, "/done").await;
    h.say(BOB, "/done").await;
    h.say(ALICE, "/ready").await;
    h.say(BOB, "/ready").await;

    h.say(ALICE, "good luck!").await;
    assert_eq!(h.notifier.count_for(BOB, "@alice: good luck!"), 1);

    // Finished rooms still allow banter.
    let turn = h.turn_holder().await;
    let secret = if turn == ALICE { "cherry" } else { "banana" };
    h.say(turn, &format!("/guess {secret}")).await;
    h.say(BOB, "rematch?").await;
    assert_eq!(h.notifier.count_for(ALICE, "@bob: rematch?"), 1);
}

// =========================================================================
// Rematch over text
// =========================================================================

#[tokio::test]
async fn test_begin_after_game_end_routes_to_the_finished_room() {
    let h = harness();
    h.say(BOB, "/start").await;
    h.playing().await;
    let turn = h.turn_holder().await;
    h.say(turn, "/guess banana").await;

    // Pointers are cleared, yet /begin still finds the room.
    h.say(ALICE, "/begin").await;
    assert!(h
        .notifier
        .last_for(ALICE)
        .unwrap()
        .contains("Waiting for your opponent"));

    h.say(BOB, "/begin").await;
    assert_eq!(h.notifier.count_for(ALICE, "Store your secret word"), 2);

    let room_id = h
        .store
        .find_user_by_handle("alice")
        .unwrap()
        .current_room_id
        .unwrap();
    let room = h.store.find_room(room_id).await.unwrap();
    assert_eq!(room.state, GameState::InputSecret);
    assert_eq!(room.player1_score + room.player2_score, 1);
}
