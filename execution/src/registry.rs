//! Scope ownership for live sessions.

use crate::{games::Expectation, session::Mailbox};
use arcade_types::{ChannelId, GameKind, ScopeKey};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard,
    },
};
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("scope {scope} already has a live session ({session_id})")]
pub struct ScopeBusy {
    pub scope: ScopeKey,
    pub session_id: u64,
}

/// Proof that the holder owns `scope` for `session_id`.
#[derive(Debug, PartialEq, Eq)]
pub struct Lease {
    pub scope: ScopeKey,
    pub session_id: u64,
}

/// Handles the router needs to reach a running session.
#[derive(Clone)]
pub struct LiveSession {
    pub session_id: u64,
    pub kind: GameKind,
    /// Channel the session was started in. Typed answers only count there.
    pub channel: ChannelId,
    pub mailbox: Mailbox,
    pub expected: watch::Receiver<Expectation>,
}

struct Slot {
    session_id: u64,
    kind: GameKind,
    live: Option<LiveSession>,
}

/// At most one session per scope key.
pub struct SessionRegistry {
    slots: Mutex<HashMap<ScopeKey, Slot>>,
    next_id: AtomicU64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<ScopeKey, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim `scope` for a new session, allocating its id.
    ///
    /// Ids are never reused, even for rejected attempts.
    pub fn try_acquire(&self, scope: ScopeKey, kind: GameKind) -> Result<Lease, ScopeBusy> {
        let mut slots = self.slots();
        if let Some(slot) = slots.get(&scope) {
            return Err(ScopeBusy {
                scope,
                session_id: slot.session_id,
            });
        }
        let session_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        slots.insert(
            scope,
            Slot {
                session_id,
                kind,
                live: None,
            },
        );
        Ok(Lease { scope, session_id })
    }

    /// Make a leased session reachable by the router.
    pub fn attach(&self, lease: &Lease, live: LiveSession) {
        if let Some(slot) = self.slots().get_mut(&lease.scope) {
            if slot.session_id == lease.session_id {
                slot.live = Some(live);
            }
        }
    }

    /// Free `scope` if it is still held by `session_id`. Idempotent.
    pub fn release(&self, scope: ScopeKey, session_id: u64) -> bool {
        let mut slots = self.slots();
        match slots.get(&scope) {
            Some(slot) if slot.session_id == session_id => {
                slots.remove(&scope);
                true
            }
            _ => false,
        }
    }

    pub fn lookup(&self, scope: ScopeKey) -> Option<LiveSession> {
        self.slots().get(&scope).and_then(|slot| slot.live.clone())
    }

    pub fn holder(&self, scope: ScopeKey) -> Option<(u64, GameKind)> {
        self.slots()
            .get(&scope)
            .map(|slot| (slot.session_id, slot.kind))
    }

    /// Number of held scopes.
    pub fn active(&self) -> usize {
        self.slots().len()
    }

    pub fn live_sessions(&self) -> Vec<LiveSession> {
        self.slots()
            .values()
            .filter_map(|slot| slot.live.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_types::{ChannelId, UserId};
    use std::sync::Arc;

    #[test]
    fn test_second_acquire_is_busy() {
        let registry = SessionRegistry::new();
        let scope = ScopeKey::User(UserId(1));
        let lease = registry.try_acquire(scope, GameKind::Memory).unwrap();
        assert_eq!(
            registry.try_acquire(scope, GameKind::Slots),
            Err(ScopeBusy {
                scope,
                session_id: lease.session_id
            })
        );
        assert!(registry
            .try_acquire(ScopeKey::Channel(ChannelId(1)), GameKind::Connect4)
            .is_ok());
        assert_eq!(registry.active(), 2);
    }

    #[test]
    fn test_release_is_idempotent_and_scoped_to_holder() {
        let registry = SessionRegistry::new();
        let scope = ScopeKey::User(UserId(1));
        let old = registry.try_acquire(scope, GameKind::Rps).unwrap();
        assert!(registry.release(scope, old.session_id));
        assert!(!registry.release(scope, old.session_id));

        let new = registry.try_acquire(scope, GameKind::Rps).unwrap();
        assert!(new.session_id > old.session_id);
        // A stale release must not free the newer session.
        assert!(!registry.release(scope, old.session_id));
        assert_eq!(registry.holder(scope), Some((new.session_id, GameKind::Rps)));
    }

    #[test]
    fn test_concurrent_acquire_admits_one() {
        let registry = Arc::new(SessionRegistry::new());
        let scope = ScopeKey::Channel(ChannelId(4));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.try_acquire(scope, GameKind::Connect4).is_ok())
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
    }
}
