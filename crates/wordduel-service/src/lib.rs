//! Game orchestration for WordDuel.
//!
//! [`RoomService`] runs every player action as one exclusive store
//! transaction — lock the room, apply the pure transition, commit,
//! then notify — which is what turns the pure state machine into a
//! linearizable one under concurrent actions. [`MatchmakingService`]
//! handles the challenge flow that creates rooms, and
//! [`InactivityReaper`] force-finishes rooms nobody is playing in.
//!
//! # Key types
//!
//! - [`RoomService`] — the transactional game operations
//! - [`MatchmakingService`] — challenge / accept / decline
//! - [`InactivityReaper`] + [`ReaperHandle`] — the expiry sweep task
//! - [`CooldownMap`] — per-user guess debounce
//! - [`Notifier`] — the fire-and-forget outbound channel

mod cooldown;
mod error;
mod matchmaking;
mod notify;
mod reaper;
mod room_service;

pub use cooldown::CooldownMap;
pub use error::{ErrorKind, ServiceError};
pub use matchmaking::MatchmakingService;
pub use notify::Notifier;
pub use reaper::{InactivityReaper, ReaperHandle};
pub use room_service::{GuessResult, RoomService};
