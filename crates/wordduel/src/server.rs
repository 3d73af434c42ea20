//! Server loop: inbound message fan-out, liveness endpoint, reaper
//! lifecycle, and graceful shutdown.
//!
//! The chat platform itself stays behind the [`Inbound`] channel and
//! the [`Notifier`] trait, so the whole game stack runs the same way
//! under a real transport and under tests.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use wordduel_protocol::ExternalId;
use wordduel_room::GameConfig;
use wordduel_service::{InactivityReaper, MatchmakingService, Notifier, RoomService};
use wordduel_store::MemoryStore;

use crate::{Dispatcher, WordDuelError};

/// One message from the chat platform: who sent it and what they said.
#[derive(Debug)]
pub struct Inbound {
    pub external_id: ExternalId,
    pub handle: String,
    pub text: String,
}

/// Server settings; the game tunables nest inside.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address for the `GET /healthz` liveness endpoint.
    pub health_addr: String,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            health_addr: "127.0.0.1:8080".to_string(),
            game: GameConfig::default(),
        }
    }
}

/// The assembled bot: store, services, dispatcher, and reaper, wired
/// to one notifier.
pub struct Server<N: Notifier> {
    config: ServerConfig,
    store: MemoryStore,
    dispatcher: Arc<Dispatcher<N>>,
    reaper: InactivityReaper<N>,
}

impl<N: Notifier> Server<N> {
    pub fn new(config: ServerConfig, notifier: Arc<N>) -> Self {
        let store = MemoryStore::new(config.game.lock_timeout);
        let rooms = Arc::new(RoomService::new(
            store.clone(),
            Arc::clone(&notifier),
            config.game.clone(),
        ));
        let matchmaking = Arc::new(MatchmakingService::new(
            store.clone(),
            Arc::clone(&notifier),
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            Arc::clone(&rooms),
            matchmaking,
            notifier,
            &config.game,
        ));
        let reaper = InactivityReaper::new(store.clone(), rooms, config.game.clone());

        Self {
            config,
            store,
            dispatcher,
            reaper,
        }
    }

    /// Runs the bot until the inbound channel closes or Ctrl-C.
    ///
    /// Each inbound message gets its own task; ordering within a room
    /// still holds because every game action serializes on the room
    /// lock. On shutdown every in-flight message task is drained to
    /// completion before the reaper stops, so nothing is cut off
    /// mid-transaction.
    pub async fn run(self, mut inbound: mpsc::Receiver<Inbound>) -> Result<(), WordDuelError> {
        let listener = TcpListener::bind(&self.config.health_addr).await?;
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "liveness endpoint listening");
        let router = health_router(self.store.clone());
        let health = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "liveness endpoint failed");
            }
        });

        let reaper = self.reaper.start();
        tracing::info!("server running");

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                message = inbound.recv() => {
                    let Some(message) = message else {
                        tracing::info!("inbound channel closed");
                        break;
                    };
                    let dispatcher = Arc::clone(&self.dispatcher);
                    tasks.spawn(async move {
                        dispatcher
                            .dispatch(message.external_id, &message.handle, &message.text)
                            .await;
                    });
                }
                // Reap completed message tasks as we go so the set
                // doesn't grow with the message count.
                Some(finished) = tasks.join_next() => {
                    if let Err(e) = finished {
                        tracing::error!(error = %e, "message task failed");
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("shutdown signal received");
                    break;
                }
            }
        }

        // Drain in-flight message tasks before taking anything down.
        while let Some(finished) = tasks.join_next().await {
            if let Err(e) = finished {
                tracing::error!(error = %e, "message task failed");
            }
        }

        reaper.stop().await;
        health.abort();
        tracing::info!("server stopped");
        Ok(())
    }
}

/// The liveness router, split out so tests can mount it directly.
pub fn health_router(store: MemoryStore) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .with_state(store)
}

async fn healthz(State(store): State<MemoryStore>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "rooms": store.room_count() }))
}
