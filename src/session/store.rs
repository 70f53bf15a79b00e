// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! In-memory session store
//!
//! Sharded by user id. Updates for one user are atomic; concurrent updates
//! for the same user resolve last-write-wins. Closures passed to `update`
//! run under a shard lock and must not block.

use dashmap::DashMap;

use super::state::{FlowData, FlowState, Session};
use crate::store::UserId;

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<UserId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the user's session; a default session if none exists.
    pub fn get(&self, user: UserId) -> Session {
        self.sessions
            .get(&user)
            .map(|s| s.value().clone())
            .unwrap_or_default()
    }

    pub fn state(&self, user: UserId) -> FlowState {
        self.sessions
            .get(&user)
            .map(|s| s.state)
            .unwrap_or_default()
    }

    pub fn set_state(&self, user: UserId, state: FlowState) {
        self.sessions.entry(user).or_default().state = state;
    }

    /// Read-modify-write of the flow data
    pub fn update_data<F>(&self, user: UserId, f: F)
    where
        F: FnOnce(&mut FlowData),
    {
        let mut entry = self.sessions.entry(user).or_default();
        f(&mut entry.data);
    }

    /// Read-modify-write of the whole session, returning the closure's result
    pub fn update<F, R>(&self, user: UserId, f: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut entry = self.sessions.entry(user).or_default();
        f(entry.value_mut())
    }

    /// Overwrite the session, used when a new top-level flow starts
    pub fn replace(&self, user: UserId, session: Session) {
        self.sessions.insert(user, session);
    }

    /// Drop the session, returning what was there
    pub fn clear(&self, user: UserId) -> Session {
        self.sessions
            .remove(&user)
            .map(|(_, session)| session)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
