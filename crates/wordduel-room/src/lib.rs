//! Room state machine and pure game rules for WordDuel.
//!
//! Everything in this crate is side-effect free: transition functions
//! take a [`Room`] snapshot plus an action payload and return either a
//! new snapshot or a typed rejection. Locking, persistence, and
//! notifications live in the layers above.
//!
//! # Key types
//!
//! - [`Room`] — the match aggregate snapshot
//! - [`GameState`] — lifecycle state machine
//! - [`Gate`] — a two-party consensus point
//! - [`machine`] — the transition functions
//! - [`normalize`] — guess/secret canonicalization
//! - [`GameConfig`] — tunables (secret length, timeouts, cooldown)

mod config;
mod error;
pub mod machine;
mod normalize;
mod state;

pub use config::GameConfig;
pub use error::TransitionError;
pub use machine::GuessOutcome;
pub use normalize::normalize;
pub use state::{GameState, Gate, Room, Seat};
