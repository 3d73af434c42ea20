//! Inactivity reaper behavior against a live store and room service.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use wordduel_protocol::{ExternalId, UserId};
use wordduel_room::{GameConfig, GameState};
use wordduel_service::{InactivityReaper, Notifier, RoomService};
use wordduel_store::MemoryStore;

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
    fn texts_containing(&self, needle: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, t)| t.contains(needle))
            .count()
    }
}

struct Harness {
    store: MemoryStore,
    notifier: Arc<RecordingNotifier>,
    service: Arc<RoomService<RecordingNotifier>>,
    config: GameConfig,
    alice: UserId,
    bob: UserId,
}

fn harness(timeout_window: Duration, sweep_interval: Duration) -> Harness {
    let config = GameConfig {
        timeout_window,
        sweep_interval,
        lock_timeout: Duration::from_millis(200),
        ..GameConfig::default()
    };
    let store = MemoryStore::new(config.lock_timeout);
    let notifier = Arc::new(RecordingNotifier::default());
    let service = Arc::new(RoomService::new(
        store.clone(),
        Arc::clone(&notifier),
        config.clone(),
    ));
    let alice = store.upsert_user(ExternalId(1), "alice").id;
    let bob = store.upsert_user(ExternalId(2), "bob").id;
    Harness {
        store,
        notifier,
        service,
        config,
        alice,
        bob,
    }
}

impl Harness {
    fn reaper(&self) -> InactivityReaper<RecordingNotifier> {
        InactivityReaper::new(
            self.store.clone(),
            Arc::clone(&self.service),
            self.config.clone(),
        )
    }
}

#[tokio::test]
async fn test_sweep_expires_idle_room_once() {
    let h = harness(Duration::from_millis(50), Duration::from_secs(60));
    let room = h.store.create_room(h.alice, h.bob).unwrap();
    let reaper = h.reaper();

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(reaper.sweep().await, 1);

    let expired = h.store.find_room(room.id).await.unwrap();
    assert_eq!(expired.state, GameState::Finished);
    assert_eq!(expired.winner, None);
    assert_eq!(h.store.find_user(h.alice).unwrap().current_room_id, None);
    assert_eq!(h.store.find_user(h.bob).unwrap().current_room_id, None);
    assert_eq!(h.notifier.texts_containing("ended automatically"), 2);

    // Already finished: the next sweep has nothing to do.
    assert_eq!(reaper.sweep().await, 0);
}

#[tokio::test]
async fn test_expiry_spares_room_that_acted_after_the_scan() {
    let h = harness(Duration::from_millis(50), Duration::from_secs(60));
    let room = h.store.create_room(h.alice, h.bob).unwrap();

    tokio::time::sleep(Duration::from_millis(80)).await;
    let cutoff = Instant::now() - Duration::from_millis(50);
    assert_eq!(h.store.rooms_idle_since(cutoff), vec![room.id]);

    // A player acts between the scan and the expiry transaction.
    h.service.confirm_start(room.id, h.alice).await.unwrap();

    // Idleness is re-checked under the room lock, so the stale scan
    // result must not kill the now-active room.
    let expired = h.service.expire_room(room.id, cutoff).await.unwrap();
    assert!(expired.is_none());
    let live = h.store.find_room(room.id).await.unwrap();
    assert_eq!(live.state, GameState::WaitingStart);
    assert_eq!(
        h.store.find_user(h.alice).unwrap().current_room_id,
        Some(room.id)
    );
    assert_eq!(h.notifier.texts_containing("ended automatically"), 0);
}

#[tokio::test]
async fn test_sweep_spares_recently_active_rooms() {
    let h = harness(Duration::from_secs(300), Duration::from_secs(60));
    h.store.create_room(h.alice, h.bob).unwrap();

    assert_eq!(h.reaper().sweep().await, 0);
    assert!(h.store.find_user(h.alice).unwrap().current_room_id.is_some());
}

#[tokio::test]
async fn test_started_reaper_sweeps_periodically_and_stops_cleanly() {
    let h = harness(Duration::from_millis(30), Duration::from_millis(30));
    let room = h.store.create_room(h.alice, h.bob).unwrap();

    let handle = h.reaper().start();
    tokio::time::sleep(Duration::from_millis(150)).await;
    handle.stop().await;

    let swept = h.store.find_room(room.id).await.unwrap();
    assert_eq!(swept.state, GameState::Finished);
}
