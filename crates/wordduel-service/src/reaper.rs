//! The inactivity reaper: force-finishes rooms nobody is playing in.
//!
//! An owned background task with an explicit start/stop lifecycle,
//! injected with the store and the room service rather than reaching
//! into process-wide state. Each sweep goes through the same per-room
//! locked transaction as live player actions, so a sweep and a
//! simultaneous guess on the same room serialize instead of corrupting
//! each other.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use wordduel_room::GameConfig;
use wordduel_store::MemoryStore;

use crate::{Notifier, RoomService};

/// Periodic sweep that expires rooms idle beyond the timeout window.
pub struct InactivityReaper<N: Notifier> {
    store: MemoryStore,
    service: Arc<RoomService<N>>,
    config: GameConfig,
}

impl<N: Notifier> InactivityReaper<N> {
    pub fn new(store: MemoryStore, service: Arc<RoomService<N>>, config: GameConfig) -> Self {
        Self {
            store,
            service,
            config,
        }
    }

    /// Runs one sweep: expire every room idle past the timeout window.
    /// Returns how many rooms were expired.
    ///
    /// Failures on individual rooms (say, a lock that stayed busy) are
    /// logged and skipped; the room gets another chance next sweep.
    /// Repeated sweeps over the same rooms are idempotent because
    /// expiry is a no-op on finished rooms.
    pub async fn sweep(&self) -> usize {
        let Some(cutoff) = Instant::now().checked_sub(self.config.timeout_window) else {
            // Process younger than the window; nothing can be idle yet.
            return 0;
        };

        let mut expired = 0;
        for room_id in self.store.rooms_idle_since(cutoff) {
            match self.service.expire_room(room_id, cutoff).await {
                Ok(Some(_)) => expired += 1,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(%room_id, error = %e, "expiry failed, retrying next sweep");
                }
            }
        }
        if expired > 0 {
            tracing::info!(expired, "reaper sweep finished");
        }
        expired
    }

    /// Starts the periodic sweep task and hands back its lifecycle
    /// handle. The first sweep happens one interval after start.
    pub fn start(self) -> ReaperHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let interval = self.config.sweep_interval;

        let task = tokio::spawn(async move {
            tracing::info!(interval = ?interval, window = ?self.config.timeout_window, "reaper started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // interval's first tick completes immediately; consume it so
            // the first sweep waits a full interval.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.sweep().await;
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("reaper stopping");
                        break;
                    }
                }
            }
        });

        ReaperHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle to a running reaper task.
pub struct ReaperHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Signals the reaper to stop and waits for the task to finish.
    /// An in-flight sweep completes first; its transactions are never
    /// cut off halfway.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }
}
