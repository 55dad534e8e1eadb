//! Test doubles for the account store and for game evaluators.

use crate::{
    games::{Context, Expectation, Game, GameError, GameResult, Input},
    store::{AccountStore, MemoryStore, StoreError},
};
use arcade_types::{Account, Activity, GameKind, UserId};
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

/// Store whose writes fail on demand.
///
/// Reads always pass through. Each failed write leaves the inner store
/// untouched.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failures: AtomicU32,
    writes: AtomicU32,
    attempts: AtomicU32,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Arc<Self> {
        Arc::new(Self {
            inner,
            ..Self::default()
        })
    }

    /// Make the next `count` writes fail.
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Writes that landed.
    pub fn writes(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Writes attempted, failed or not.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(&self) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl AccountStore for FlakyStore {
    async fn get(&self, user: UserId) -> Result<Option<Account>, StoreError> {
        self.inner.get(user).await
    }

    async fn create(&self, user: UserId) -> Result<Account, StoreError> {
        self.inner.create(user).await
    }

    async fn update<T, F>(&self, user: UserId, mutator: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Account) -> T + Send,
        T: Send,
    {
        self.check()?;
        self.inner.update(user, mutator).await
    }

    async fn update_pair<T, F>(&self, first: UserId, second: UserId, mutator: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Account, &mut Account) -> T + Send,
        T: Send,
    {
        self.check()?;
        self.inner.update_pair(first, second, mutator).await
    }
}

/// Single-player game whose `begin` panics.
pub struct PanickingGame;

impl Game for PanickingGame {
    fn kind(&self) -> GameKind {
        GameKind::Dice
    }

    fn activity(&self) -> Activity {
        Activity::Dice
    }

    fn begin(&mut self, _ctx: &mut Context<'_>) -> GameResult {
        panic!("dice table on fire");
    }
}

/// Interactive game that waits for any button and panics on it.
pub struct FragileGame;

impl Game for FragileGame {
    fn kind(&self) -> GameKind {
        GameKind::Memory
    }

    fn activity(&self) -> Activity {
        Activity::Memory
    }

    fn begin(&mut self, ctx: &mut Context<'_>) -> GameResult {
        ctx.rearm(60_000);
        ctx.announce("Press anything.");
        GameResult::Continue
    }

    fn expected(&self, participants: &[UserId]) -> Expectation {
        Expectation::buttons(participants.to_vec())
    }

    fn on_input(
        &mut self,
        _ctx: &mut Context<'_>,
        _actor: UserId,
        _input: Input<'_>,
    ) -> Result<GameResult, GameError> {
        panic!("card table on fire");
    }
}
