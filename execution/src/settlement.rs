//! Exactly-once application of session outcomes.
//!
//! Each session owns a [`SettlementTicket`]. The first `settle` on a ticket
//! flips its flag and writes the outcome: one compound mutation per account,
//! or one atomic two-account update for head-to-head games. Store failures
//! are retried with jittered exponential backoff; if every attempt fails the
//! outcome is held and [`SettlementEngine::retry_held`] drives it later.
//! Later calls on a settled ticket return the stored receipt.

use crate::{
    backoff::{jittered_backoff, next_backoff},
    games::{GameResult, Progress},
    metrics::Metrics,
    store::{AccountStore, StoreError},
};
use arcade_types::{Account, Activity, UserId};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

/// How a session reached its outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Completed,
    TimedOut,
    /// A rule evaluator panicked or reported broken state.
    Faulted,
    /// Closed by engine shutdown before the game finished.
    Shutdown,
}

/// One account's share of an outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub user: UserId,
    pub delta: i64,
    pub stamp_cooldown: bool,
    pub progress: Option<Progress>,
}

impl Entry {
    fn new(user: UserId, delta: i64, stamp_cooldown: bool) -> Self {
        Self {
            user,
            delta,
            stamp_cooldown,
            progress: None,
        }
    }

    fn is_noop(&self) -> bool {
        self.delta == 0 && !self.stamp_cooldown && self.progress.is_none()
    }

    fn apply(&self, account: &mut Account, activity: Activity, at_ms: u64) {
        account.balance = account.balance.saturating_add(self.delta);
        if self.stamp_cooldown {
            account.cooldowns.stamp(activity, at_ms);
        }
        if let Some(progress) = self.progress {
            account.record_shift(progress.job, progress.streak, at_ms);
        }
    }
}

/// Terminal result of a session, ready to settle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub session_id: u64,
    pub activity: Activity,
    pub resolution: Resolution,
    pub entries: Vec<Entry>,
    pub at_ms: u64,
}

fn signed(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

impl Outcome {
    /// Translate a terminal game result into per-account entries.
    ///
    /// `participants[0]` is the single player for solo games. A faulted
    /// resolution always yields no entries.
    #[allow(clippy::too_many_arguments)]
    pub fn from_result(
        session_id: u64,
        activity: Activity,
        resolution: Resolution,
        result: &GameResult,
        participants: &[UserId],
        stake: u64,
        progress: Option<Progress>,
        at_ms: u64,
    ) -> Self {
        let player = participants.first().copied();
        let stake = signed(stake);
        let entries = match (resolution, result) {
            (Resolution::Faulted, _) => Vec::new(),
            (_, GameResult::Continue | GameResult::Void) => Vec::new(),
            (_, GameResult::Win(amount)) => player
                .map(|user| Entry::new(user, signed(*amount), true))
                .into_iter()
                .collect(),
            (_, GameResult::Loss) => player
                .map(|user| Entry::new(user, -stake, true))
                .into_iter()
                .collect(),
            (_, GameResult::Reward(amount)) => player
                .map(|user| Entry {
                    progress,
                    ..Entry::new(user, signed(*amount), true)
                })
                .into_iter()
                .collect(),
            (_, GameResult::Push | GameResult::Draw) => participants
                .iter()
                .map(|&user| Entry::new(user, 0, true))
                .collect(),
            (_, GameResult::Victory(winner)) => participants
                .iter()
                .enumerate()
                .map(|(index, &user)| {
                    let delta = if index == *winner { stake } else { -stake };
                    Entry::new(user, delta, true)
                })
                .collect(),
        };
        Self {
            session_id,
            activity,
            resolution,
            entries,
            at_ms,
        }
    }

    fn is_noop(&self) -> bool {
        self.entries.iter().all(Entry::is_noop)
    }
}

/// Record of a settled outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub session_id: u64,
    pub activity: Activity,
    pub resolution: Resolution,
    pub deltas: Vec<(UserId, i64)>,
    /// Balances after the write, empty when the store was not touched.
    pub balances: Vec<(UserId, i64)>,
    /// Whether the store was written.
    pub applied: bool,
    pub settled_at_ms: u64,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SettlementError {
    #[error("settlement of session {session_id} is pending after {attempts} attempts: {last}")]
    Pending {
        session_id: u64,
        attempts: u32,
        last: StoreError,
    },
}

/// Per-session settlement state.
#[derive(Debug)]
pub struct SettlementTicket {
    session_id: u64,
    settled: AtomicBool,
    receipt: OnceCell<Receipt>,
}

impl SettlementTicket {
    pub fn new(session_id: u64) -> Arc<Self> {
        Arc::new(Self {
            session_id,
            settled: AtomicBool::new(false),
            receipt: OnceCell::new(),
        })
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Set once settlement begins, whether or not the write has landed yet.
    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.get()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(2),
        }
    }
}

struct Held {
    ticket: Arc<SettlementTicket>,
    outcome: Outcome,
}

pub struct SettlementEngine<S: AccountStore> {
    store: Arc<S>,
    retry: RetryPolicy,
    metrics: Metrics,
    held: Mutex<Vec<Held>>,
}

impl<S: AccountStore> SettlementEngine<S> {
    pub fn new(store: Arc<S>, retry: RetryPolicy, metrics: Metrics) -> Self {
        Self {
            store,
            retry,
            metrics,
            held: Mutex::new(Vec::new()),
        }
    }

    fn held(&self) -> MutexGuard<'_, Vec<Held>> {
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sessions whose outcome is waiting for a retry.
    pub fn pending(&self) -> Vec<u64> {
        self.held().iter().map(|held| held.ticket.session_id).collect()
    }

    pub async fn settle(
        &self,
        ticket: &Arc<SettlementTicket>,
        outcome: Outcome,
    ) -> Result<Receipt, SettlementError> {
        if let Some(receipt) = ticket.receipt.get() {
            return Ok(receipt.clone());
        }
        let result = ticket
            .receipt
            .get_or_try_init(|| async {
                ticket.settled.store(true, Ordering::Release);
                self.apply_with_retry(&outcome).await
            })
            .await
            .cloned();
        if let Err(SettlementError::Pending { attempts, ref last, .. }) = result {
            error!(
                session = outcome.session_id,
                activity = %outcome.activity,
                attempts,
                error = %last,
                "settlement held"
            );
            self.hold(ticket, outcome);
        }
        result
    }

    fn hold(&self, ticket: &Arc<SettlementTicket>, outcome: Outcome) {
        let mut held = self.held();
        if held.iter().any(|h| h.ticket.session_id == ticket.session_id) {
            return;
        }
        held.push(Held {
            ticket: ticket.clone(),
            outcome,
        });
        self.metrics.held_settlements.set(held.len() as i64);
    }

    /// Re-drive every held outcome once. Returns the receipts that landed.
    pub async fn retry_held(&self) -> Vec<Receipt> {
        let drained: Vec<Held> = std::mem::take(&mut *self.held());
        self.metrics.held_settlements.set(0);
        let mut receipts = Vec::with_capacity(drained.len());
        for Held { ticket, outcome } in drained {
            if let Ok(receipt) = self.settle(&ticket, outcome).await {
                info!(session = receipt.session_id, "held settlement applied");
                receipts.push(receipt);
            }
        }
        receipts
    }

    async fn apply_with_retry(&self, outcome: &Outcome) -> Result<Receipt, SettlementError> {
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.apply(outcome).await {
                Ok(receipt) => {
                    self.metrics.settlements.inc();
                    info!(
                        session = outcome.session_id,
                        activity = %outcome.activity,
                        resolution = ?outcome.resolution,
                        deltas = ?receipt.deltas,
                        "settled"
                    );
                    return Ok(receipt);
                }
                Err(err) if attempt >= self.retry.attempts.max(1) => {
                    return Err(SettlementError::Pending {
                        session_id: outcome.session_id,
                        attempts: attempt,
                        last: err,
                    });
                }
                Err(err) => {
                    self.metrics.settlement_retries.inc();
                    let delay = jittered_backoff(&mut rand::thread_rng(), backoff);
                    warn!(
                        session = outcome.session_id,
                        attempt,
                        ?delay,
                        error = %err,
                        "settlement write failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    backoff = next_backoff(backoff, self.retry.max_backoff);
                }
            }
        }
    }

    async fn apply(&self, outcome: &Outcome) -> Result<Receipt, StoreError> {
        let deltas: Vec<(UserId, i64)> = outcome
            .entries
            .iter()
            .map(|entry| (entry.user, entry.delta))
            .collect();
        let mut receipt = Receipt {
            session_id: outcome.session_id,
            activity: outcome.activity,
            resolution: outcome.resolution,
            deltas,
            balances: Vec::new(),
            applied: false,
            settled_at_ms: outcome.at_ms,
        };
        if outcome.is_noop() {
            return Ok(receipt);
        }

        let (activity, at_ms) = (outcome.activity, outcome.at_ms);
        receipt.balances = match outcome.entries.as_slice() {
            [] => Vec::new(),
            [entry] => {
                let entry = entry.clone();
                let balance = self
                    .store
                    .update(entry.user, move |account| {
                        entry.apply(account, activity, at_ms);
                        account.balance
                    })
                    .await?;
                vec![(outcome.entries[0].user, balance)]
            }
            [first, second] => {
                let (a, b) = (first.clone(), second.clone());
                let (balance_a, balance_b) = self
                    .store
                    .update_pair(a.user, b.user, move |left, right| {
                        a.apply(left, activity, at_ms);
                        b.apply(right, activity, at_ms);
                        (left.balance, right.balance)
                    })
                    .await?;
                vec![(first.user, balance_a), (second.user, balance_b)]
            }
            entries => {
                // Sessions carry at most two participants.
                let mut balances = Vec::with_capacity(entries.len());
                for entry in entries {
                    let owned = entry.clone();
                    let balance = self
                        .store
                        .update(entry.user, move |account| {
                            owned.apply(account, activity, at_ms);
                            account.balance
                        })
                        .await?;
                    balances.push((entry.user, balance));
                }
                balances
            }
        };
        receipt.applied = true;
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use arcade_types::casino::JobKind;

    const ALICE: UserId = UserId(1);
    const BOB: UserId = UserId(2);

    fn engine(store: Arc<MemoryStore>) -> SettlementEngine<MemoryStore> {
        SettlementEngine::new(store, RetryPolicy::default(), Metrics::default())
    }

    fn outcome(result: GameResult, participants: &[UserId], stake: u64) -> Outcome {
        Outcome::from_result(
            7,
            Activity::CoinFlip,
            Resolution::Completed,
            &result,
            participants,
            stake,
            None,
            5_000,
        )
    }

    #[test]
    fn test_result_mapping() {
        let loss = outcome(GameResult::Loss, &[ALICE], 40);
        assert_eq!(loss.entries, vec![Entry::new(ALICE, -40, true)]);

        let push = outcome(GameResult::Push, &[ALICE], 40);
        assert_eq!(push.entries, vec![Entry::new(ALICE, 0, true)]);

        let victory = outcome(GameResult::Victory(1), &[ALICE, BOB], 40);
        assert_eq!(
            victory.entries,
            vec![Entry::new(ALICE, -40, true), Entry::new(BOB, 40, true)]
        );

        assert!(outcome(GameResult::Void, &[ALICE, BOB], 40).entries.is_empty());

        let faulted = Outcome::from_result(
            7,
            Activity::Minefield,
            Resolution::Faulted,
            &GameResult::Win(90),
            &[ALICE],
            40,
            None,
            0,
        );
        assert!(faulted.entries.is_empty());
    }

    #[tokio::test]
    async fn test_settle_applies_delta_and_cooldown() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store.clone());
        let ticket = SettlementTicket::new(7);

        let receipt = engine
            .settle(&ticket, outcome(GameResult::Win(25), &[ALICE], 25))
            .await
            .unwrap();
        assert!(receipt.applied);
        assert_eq!(receipt.balances, vec![(ALICE, 25)]);

        let account = store.get(ALICE).await.unwrap().unwrap();
        assert_eq!(account.cooldowns.last_played(Activity::CoinFlip), Some(5_000));
        assert!(ticket.is_settled());
    }

    #[tokio::test]
    async fn test_second_settle_returns_receipt() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store.clone());
        let ticket = SettlementTicket::new(7);

        let first = engine
            .settle(&ticket, outcome(GameResult::Win(25), &[ALICE], 25))
            .await
            .unwrap();
        let second = engine
            .settle(&ticket, outcome(GameResult::Win(999), &[ALICE], 25))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(store.get(ALICE).await.unwrap().unwrap().balance, 25);
    }

    #[tokio::test]
    async fn test_void_skips_store() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store.clone());
        let receipt = engine
            .settle(&SettlementTicket::new(7), outcome(GameResult::Void, &[ALICE, BOB], 25))
            .await
            .unwrap();
        assert!(!receipt.applied);
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_victory_moves_stake_between_players() {
        let store = Arc::new(MemoryStore::with_accounts([
            Account {
                balance: 100,
                ..Account::new(ALICE)
            },
            Account {
                balance: 100,
                ..Account::new(BOB)
            },
        ]));
        let engine = engine(store.clone());
        let receipt = engine
            .settle(&SettlementTicket::new(7), outcome(GameResult::Victory(0), &[ALICE, BOB], 30))
            .await
            .unwrap();
        assert_eq!(receipt.balances, vec![(ALICE, 130), (BOB, 70)]);
    }

    #[tokio::test]
    async fn test_reward_records_progress() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store.clone());
        let progress = Progress {
            job: JobKind::Chef,
            streak: 2,
        };
        let outcome = Outcome::from_result(
            9,
            Activity::Work(JobKind::Chef),
            Resolution::TimedOut,
            &GameResult::Reward(120),
            &[ALICE],
            0,
            Some(progress),
            3 * arcade_types::casino::DAY_MS,
        );
        engine.settle(&SettlementTicket::new(9), outcome).await.unwrap();

        let account = store.get(ALICE).await.unwrap().unwrap();
        assert_eq!(account.balance, 120);
        assert_eq!(account.hours_on(JobKind::Chef), 1);
        assert_eq!(account.job_streak.count, 2);
        assert_eq!(account.job_streak.last_worked_day, Some(3));
    }
}
