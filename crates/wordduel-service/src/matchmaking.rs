//! The challenge flow that creates rooms.
//!
//! A challenge is an invitation held in memory until the target accepts
//! or declines. Acceptance re-validates that neither party joined
//! another room in the meantime and creates the room atomically — the
//! store enforces the one-room-at-a-time invariant under its registry
//! lock, so two racing accepts can't both succeed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use wordduel_protocol::UserId;
use wordduel_room::Room;
use wordduel_store::MemoryStore;

use crate::{Notifier, ServiceError};

/// Invitation/challenge flow: pairs consenting players into a room.
pub struct MatchmakingService<N: Notifier> {
    store: MemoryStore,
    notifier: Arc<N>,
    /// Pending invites, keyed by the challenged player. A newer
    /// challenge targeting the same player replaces the older one.
    invites: Mutex<HashMap<UserId, UserId>>,
}

impl<N: Notifier> MatchmakingService<N> {
    pub fn new(store: MemoryStore, notifier: Arc<N>) -> Self {
        Self {
            store,
            notifier,
            invites: Mutex::new(HashMap::new()),
        }
    }

    /// Issues a challenge from `challenger` to the player behind
    /// `target_handle`.
    ///
    /// # Errors
    /// - [`ServiceError::UnknownHandle`] — nobody with that handle
    /// - [`ServiceError::SelfChallenge`] — you can't play yourself
    /// - [`ServiceError::ChallengerBusy`] / [`ServiceError::TargetBusy`]
    ///   — one of the parties already occupies a room
    pub fn challenge(&self, challenger: UserId, target_handle: &str) -> Result<(), ServiceError> {
        let challenger_record = self.store.find_user(challenger)?;
        if challenger_record.current_room_id.is_some() {
            return Err(ServiceError::ChallengerBusy);
        }

        let target = self
            .store
            .find_user_by_handle(target_handle)
            .ok_or_else(|| ServiceError::UnknownHandle(target_handle.to_string()))?;
        if target.id == challenger {
            return Err(ServiceError::SelfChallenge);
        }
        if target.current_room_id.is_some() {
            return Err(ServiceError::TargetBusy);
        }

        self.invites
            .lock()
            .expect("invites lock poisoned")
            .insert(target.id, challenger);

        tracing::info!(challenger = %challenger, target = %target.id, "challenge issued");
        let text = format!(
            "@{} challenges you to a word duel! Reply /accept or /decline.",
            challenger_record.handle
        );
        self.notifier.notify(target.external_id, &text);
        Ok(())
    }

    /// Accepts the pending challenge against `target`, creating the
    /// room and pointing both players at it in one transaction.
    pub fn accept(&self, target: UserId) -> Result<Room, ServiceError> {
        let challenger = self
            .invites
            .lock()
            .expect("invites lock poisoned")
            .remove(&target)
            .ok_or(ServiceError::NoPendingChallenge)?;

        // Re-validate: either party may have joined another room since
        // the invite went out. create_room checks under its own lock.
        // On rejection the invite goes back (unless a newer one landed
        // meanwhile), so the target can retry once the party frees up.
        let room = match self.store.create_room(challenger, target) {
            Ok(room) => room,
            Err(e) => {
                self.invites
                    .lock()
                    .expect("invites lock poisoned")
                    .entry(target)
                    .or_insert(challenger);
                return Err(e.into());
            }
        };

        tracing::info!(room_id = %room.id, %challenger, %target, "challenge accepted");
        let text = "Challenge accepted! Send /begin when you're ready to start.";
        for user in [challenger, target] {
            if let Ok(record) = self.store.find_user(user) {
                self.notifier.notify(record.external_id, text);
            }
        }
        Ok(room)
    }

    /// Declines the pending challenge against `target` and tells the
    /// challenger. No state changes.
    pub fn decline(&self, target: UserId) -> Result<(), ServiceError> {
        let challenger = self
            .invites
            .lock()
            .expect("invites lock poisoned")
            .remove(&target)
            .ok_or(ServiceError::NoPendingChallenge)?;

        tracing::info!(%challenger, %target, "challenge declined");
        let target_handle = match self.store.find_user(target) {
            Ok(record) => record.handle,
            Err(_) => target.to_string(),
        };
        if let Ok(record) = self.store.find_user(challenger) {
            let text = format!("@{target_handle} declined your challenge.");
            self.notifier.notify(record.external_id, &text);
        }
        Ok(())
    }
}
