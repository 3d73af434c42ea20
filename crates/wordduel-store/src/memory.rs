//! The in-memory, single-instance repository.
//!
//! # Concurrency note
//!
//! Two levels of locking with different jobs:
//!
//! - The user registry and the room index sit behind plain
//!   `std::sync::Mutex`es — critical sections are a few map operations,
//!   never held across an `.await`.
//! - Each room's state sits behind its own `tokio::sync::Mutex`. This
//!   is the unit of mutual exclusion for game transitions: a
//!   [`RoomTxn`] holds the owned guard from lock acquisition to commit,
//!   so per-room transitions are linearizable while different rooms
//!   proceed in parallel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use wordduel_protocol::{ExternalId, RoomId, UserId};
use wordduel_room::Room;

use crate::StoreError;

/// A stored user: platform identity plus the room back-references.
///
/// Created on first contact, mutated on room join/leave, never deleted.
/// Invariant: `current_room_id` is `Some` only while the user occupies
/// a non-finished room. `last_room_id` survives the clear at game end
/// so rematch confirmations and post-game chat can still find the
/// finished room.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub external_id: ExternalId,
    pub handle: String,
    pub current_room_id: Option<RoomId>,
    pub last_room_id: Option<RoomId>,
}

/// User registry with both lookup directions kept in sync.
#[derive(Default)]
struct Users {
    by_id: HashMap<UserId, UserRecord>,
    by_external: HashMap<ExternalId, UserId>,
}

struct Inner {
    users: Mutex<Users>,
    rooms: Mutex<HashMap<RoomId, Arc<AsyncMutex<Room>>>>,
    next_user_id: AtomicU64,
    next_room_id: AtomicU64,
    lock_timeout: Duration,
}

/// The repository the rest of the system programs against.
///
/// Cheap to clone — it's an `Arc` wrapper.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Creates an empty store. `lock_timeout` bounds how long any
    /// caller waits for a room's exclusive lock before getting
    /// [`StoreError::LockTimeout`] instead of hanging the dispatcher.
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                users: Mutex::new(Users::default()),
                rooms: Mutex::new(HashMap::new()),
                next_user_id: AtomicU64::new(1),
                next_room_id: AtomicU64::new(1),
                lock_timeout,
            }),
        }
    }

    // -- users --------------------------------------------------------------

    /// Finds or creates the user for a platform identity, refreshing
    /// their display handle on every contact.
    pub fn upsert_user(&self, external_id: ExternalId, handle: &str) -> UserRecord {
        let mut users = self.inner.users.lock().expect("users lock poisoned");
        if let Some(id) = users.by_external.get(&external_id).copied() {
            let record = users
                .by_id
                .get_mut(&id)
                .expect("external index points at a stored user");
            record.handle = handle.to_string();
            return record.clone();
        }

        let id = UserId(self.inner.next_user_id.fetch_add(1, Ordering::Relaxed));
        let record = UserRecord {
            id,
            external_id,
            handle: handle.to_string(),
            current_room_id: None,
            last_room_id: None,
        };
        users.by_external.insert(external_id, id);
        users.by_id.insert(id, record.clone());
        tracing::info!(user_id = %id, %external_id, "user created");
        record
    }

    /// Looks a user up by internal id.
    pub fn find_user(&self, id: UserId) -> Result<UserRecord, StoreError> {
        let users = self.inner.users.lock().expect("users lock poisoned");
        users
            .by_id
            .get(&id)
            .cloned()
            .ok_or(StoreError::UserNotFound(id))
    }

    /// Looks a user up by display handle, case-insensitively and with
    /// an optional leading `@` stripped.
    pub fn find_user_by_handle(&self, handle: &str) -> Option<UserRecord> {
        let wanted = handle.strip_prefix('@').unwrap_or(handle);
        let users = self.inner.users.lock().expect("users lock poisoned");
        users
            .by_id
            .values()
            .find(|u| u.handle.eq_ignore_ascii_case(wanted))
            .cloned()
    }

    /// Defensive cleanup: drops a user's room back-reference. Used when
    /// a `current_room_id` turns out to point at a room that is gone.
    pub fn clear_room_pointer(&self, user: UserId) {
        let mut users = self.inner.users.lock().expect("users lock poisoned");
        if let Some(record) = users.by_id.get_mut(&user) {
            if record.current_room_id.take().is_some() {
                tracing::debug!(user_id = %user, "cleared stale room pointer");
            }
        }
    }

    // -- rooms --------------------------------------------------------------

    /// Creates a room in WaitingStart and points both players at it, as
    /// one atomic step. Rejects if either player already occupies a
    /// room — the one-room-at-a-time invariant is enforced here, under
    /// the registry lock, so two racing accepts can't both succeed.
    pub fn create_room(&self, player1: UserId, player2: UserId) -> Result<Room, StoreError> {
        let mut users = self.inner.users.lock().expect("users lock poisoned");
        for id in [player1, player2] {
            let record = users.by_id.get(&id).ok_or(StoreError::UserNotFound(id))?;
            if let Some(occupied) = record.current_room_id {
                return Err(StoreError::AlreadyInRoom(id, occupied));
            }
        }

        let room_id = RoomId(self.inner.next_room_id.fetch_add(1, Ordering::Relaxed));
        let room = Room::new(room_id, player1, player2, Instant::now());

        self.inner
            .rooms
            .lock()
            .expect("rooms lock poisoned")
            .insert(room_id, Arc::new(AsyncMutex::new(room.clone())));
        for id in [player1, player2] {
            if let Some(record) = users.by_id.get_mut(&id) {
                record.current_room_id = Some(room_id);
                record.last_room_id = Some(room_id);
            }
        }

        tracing::info!(%room_id, %player1, %player2, "room created");
        Ok(room)
    }

    fn room_arc(&self, id: RoomId) -> Result<Arc<AsyncMutex<Room>>, StoreError> {
        self.inner
            .rooms
            .lock()
            .expect("rooms lock poisoned")
            .get(&id)
            .cloned()
            .ok_or(StoreError::RoomNotFound(id))
    }

    /// Reads a room snapshot. Takes the room lock briefly, so the
    /// snapshot is never torn, and honors the acquisition timeout.
    pub async fn find_room(&self, id: RoomId) -> Result<Room, StoreError> {
        let arc = self.room_arc(id)?;
        let guard = tokio::time::timeout(self.inner.lock_timeout, arc.lock())
            .await
            .map_err(|_| StoreError::LockTimeout(id))?;
        Ok(guard.clone())
    }

    /// Opens an exclusive transaction on a room.
    ///
    /// The returned [`RoomTxn`] holds the room's lock until it is
    /// dropped; `commit` publishes the staged snapshot, dropping
    /// without commit rolls everything back. Lock acquisition is
    /// bounded by the store's lock timeout.
    pub async fn begin(&self, id: RoomId) -> Result<RoomTxn, StoreError> {
        let arc = self.room_arc(id)?;
        let guard = tokio::time::timeout(self.inner.lock_timeout, arc.lock_owned())
            .await
            .map_err(|_| StoreError::LockTimeout(id))?;
        let working = guard.clone();
        Ok(RoomTxn {
            inner: Arc::clone(&self.inner),
            guard,
            working,
            pointers: None,
            committed: false,
        })
    }

    /// Rooms that are not finished and have seen no action since
    /// `cutoff` — the reaper's sweep query.
    ///
    /// Rooms whose lock is currently held are skipped: someone is
    /// acting on them this instant, so they are not idle. A room missed
    /// that way is picked up by the next sweep.
    pub fn rooms_idle_since(&self, cutoff: Instant) -> Vec<RoomId> {
        let rooms = self.inner.rooms.lock().expect("rooms lock poisoned");
        let mut idle = Vec::new();
        for (id, arc) in rooms.iter() {
            if let Ok(room) = arc.try_lock() {
                if !room.state.is_finished() && room.last_action_at < cutoff {
                    idle.push(*id);
                }
            }
        }
        idle
    }

    /// Number of rooms the store knows about (finished included).
    pub fn room_count(&self) -> usize {
        self.inner.rooms.lock().expect("rooms lock poisoned").len()
    }
}

/// Staged updates to the occupants' room back-references, applied
/// atomically with the room write at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointerUpdate {
    /// Drop both occupants' `current_room_id` (room reached Finished).
    Clear,
    /// Point both occupants back at this room (rematch reactivation).
    /// Fails the whole commit if either occupies a different room.
    Restore,
}

/// An open exclusive transaction on one room.
///
/// Mutations are staged on a working copy; nothing is visible to other
/// callers until [`commit`](Self::commit). Dropping the transaction
/// without committing discards every staged change — that is the
/// all-or-nothing guarantee the error contract relies on.
pub struct RoomTxn {
    inner: Arc<Inner>,
    guard: OwnedMutexGuard<Room>,
    working: Room,
    pointers: Option<PointerUpdate>,
    committed: bool,
}

impl std::fmt::Debug for RoomTxn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomTxn").finish_non_exhaustive()
    }
}

impl RoomTxn {
    /// The room as this transaction sees it (staged changes included).
    pub fn room(&self) -> &Room {
        &self.working
    }

    /// Stages a new snapshot to be published on commit.
    pub fn stage(&mut self, room: Room) {
        self.working = room;
    }

    /// Stages clearing both occupants' `current_room_id` on commit.
    /// Used whenever the room reaches Finished, so the room state and
    /// the user back-references change together.
    pub fn stage_clear_pointers(&mut self) {
        self.pointers = Some(PointerUpdate::Clear);
    }

    /// Stages pointing both occupants back at this room on commit.
    /// Used when a rematch reactivates a finished room; the commit
    /// fails with [`StoreError::AlreadyInRoom`] if either player joined
    /// a different room in the meantime.
    pub fn stage_restore_pointers(&mut self) {
        self.pointers = Some(PointerUpdate::Restore);
    }

    /// Publishes the staged snapshot and any staged pointer updates,
    /// then releases the room lock. Returns the committed snapshot.
    ///
    /// # Errors
    /// [`StoreError::AlreadyInRoom`] when a staged pointer restore
    /// conflicts with a room a player has since joined — in that case
    /// nothing at all is applied.
    pub fn commit(mut self) -> Result<Room, StoreError> {
        let room_id = self.working.id;
        let occupants = [self.working.player1, self.working.player2];

        if let Some(update) = self.pointers {
            let mut users = self.inner.users.lock().expect("users lock poisoned");
            if update == PointerUpdate::Restore {
                for user in occupants {
                    if let Some(record) = users.by_id.get(&user) {
                        if let Some(elsewhere) = record.current_room_id {
                            if elsewhere != room_id {
                                return Err(StoreError::AlreadyInRoom(user, elsewhere));
                            }
                        }
                    }
                }
            }
            for user in occupants {
                if let Some(record) = users.by_id.get_mut(&user) {
                    match update {
                        PointerUpdate::Clear => {
                            if record.current_room_id == Some(room_id) {
                                record.current_room_id = None;
                            }
                        }
                        PointerUpdate::Restore => {
                            record.current_room_id = Some(room_id);
                            record.last_room_id = Some(room_id);
                        }
                    }
                }
            }
        }

        *self.guard = self.working.clone();
        self.committed = true;
        tracing::debug!(%room_id, state = %self.working.state, "room transaction committed");
        Ok(self.working.clone())
    }
}

impl Drop for RoomTxn {
    fn drop(&mut self) {
        if !self.committed {
            tracing::debug!(room_id = %self.guard.id, "room transaction rolled back");
        }
    }
}
