// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Process-wide operator state
//!
//! Created once at startup. Only operator commands mutate it; handlers read it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::context::Tone;
use crate::store::UserId;
use crate::transport::Sender;

/// A user on the block list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockTarget {
    Id(UserId),
    /// Lowercase, without the leading `@`
    Username(String),
}

impl BlockTarget {
    /// Parse `@username` or a numeric id
    pub fn parse(arg: &str) -> Option<Self> {
        let arg = arg.trim();
        if let Some(name) = arg.strip_prefix('@') {
            if name.is_empty() {
                return None;
            }
            return Some(BlockTarget::Username(name.to_lowercase()));
        }
        arg.parse().ok().map(BlockTarget::Id)
    }

    fn matches(&self, sender: &Sender) -> bool {
        match self {
            BlockTarget::Id(id) => *id == sender.id,
            BlockTarget::Username(name) => sender
                .username
                .as_deref()
                .is_some_and(|u| u.to_lowercase() == *name),
        }
    }
}

impl std::fmt::Display for BlockTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockTarget::Id(id) => write!(f, "ID:{}", id),
            BlockTarget::Username(name) => write!(f, "@{}", name),
        }
    }
}

#[derive(Debug, Default)]
pub struct AdminState {
    admin_id: Option<UserId>,
    rude_mode: AtomicBool,
    blocked: RwLock<HashSet<BlockTarget>>,
}

impl AdminState {
    pub fn new(admin_id: Option<UserId>) -> Self {
        Self {
            admin_id,
            ..Self::default()
        }
    }

    pub fn admin_id(&self) -> Option<UserId> {
        self.admin_id
    }

    pub fn is_admin(&self, user: UserId) -> bool {
        self.admin_id == Some(user)
    }

    pub fn rude_mode(&self) -> bool {
        self.rude_mode.load(Ordering::SeqCst)
    }

    /// Flip rude mode, returning the new value
    pub fn toggle_rude_mode(&self) -> bool {
        !self.rude_mode.fetch_xor(true, Ordering::SeqCst)
    }

    /// Tone for newly started dialogues
    pub fn tone(&self) -> Tone {
        if self.rude_mode() {
            Tone::Rude
        } else {
            Tone::Polite
        }
    }

    /// Returns false if the target was already blocked
    pub fn block(&self, target: BlockTarget) -> bool {
        match self.blocked.write() {
            Ok(mut set) => set.insert(target),
            Err(poisoned) => poisoned.into_inner().insert(target),
        }
    }

    pub fn is_blocked(&self, sender: &Sender) -> bool {
        // The operator cannot lock themselves out.
        if self.is_admin(sender.id) {
            return false;
        }
        let check = |set: &HashSet<BlockTarget>| set.iter().any(|t| t.matches(sender));
        match self.blocked.read() {
            Ok(set) => check(&set),
            Err(poisoned) => check(&poisoned.into_inner()),
        }
    }

    pub fn blocked_count(&self) -> usize {
        match self.blocked.read() {
            Ok(set) => set.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
