//! # WordDuel
//!
//! A two-player "guess the secret word" duel, played through a chat
//! bot. This meta-crate wires the sub-crates together:
//!
//! - [`wordduel_protocol`] — ids and chat command parsing
//! - [`wordduel_room`] — the pure game state machine
//! - [`wordduel_store`] — in-memory repository with per-room
//!   transactions
//! - [`wordduel_service`] — matchmaking, game orchestration, the
//!   inactivity reaper
//!
//! # Key types
//!
//! - [`Dispatcher`] — routes inbound chat messages to the services
//! - [`Server`] + [`Inbound`] — the run loop with liveness endpoint
//! - [`WordDuelError`] — unified error wrapping every sub-crate's

mod dispatcher;
mod error;
mod server;

pub use dispatcher::Dispatcher;
pub use error::WordDuelError;
pub use server::{health_router, Inbound, Server, ServerConfig};

/// Installs the global tracing subscriber, honoring `RUST_LOG` and
/// defaulting to `info`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
