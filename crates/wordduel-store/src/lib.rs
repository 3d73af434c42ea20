//! User/room repository with per-room exclusive transactions.
//!
//! The durable engine behind this interface is out of scope; this crate
//! ships the single-instance in-memory implementation. The database
//! row lock is modeled by one `tokio::sync::Mutex` per room: every
//! state-changing operation acquires it (with a timeout) before reading
//! the snapshot and releases it only after the commit, which serializes
//! concurrent actions from both players — and from the reaper — on the
//! same room while leaving different rooms fully parallel.
//!
//! # Key types
//!
//! - [`MemoryStore`] — the repository
//! - [`RoomTxn`] — an open exclusive transaction on one room
//! - [`UserRecord`] — who the players are and where they sit

mod error;
mod memory;

pub use error::StoreError;
pub use memory::{MemoryStore, RoomTxn, UserRecord};
