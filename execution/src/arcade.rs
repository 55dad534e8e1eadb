//! Command-layer surface: session admission and direct economy operations.
//!
//! Start requests pass their checks in a fixed order: parameters, account
//! loading, cooldowns, funds, then scope acquisition. Nothing is created
//! before the scope is acquired, and nothing is debited before settlement.

use crate::{
    clock::Clock,
    cooldown,
    games::{self, work::Shift, Game},
    metrics::Metrics,
    registry::{Lease, LiveSession, ScopeBusy, SessionRegistry},
    rng::{GameRng, Seed},
    router::{InputRouter, Routed},
    session::{Actor, Event, Mailbox, Services, Session, SessionHandle, Step},
    settlement::{Receipt, Resolution, RetryPolicy, SettlementEngine, SettlementTicket},
    shop::{Listing, Shop},
    store::{AccountStore, StoreError},
};
use arcade_types::{
    casino::{
        find_item, Interaction, JobKind, Prompt, DAILY_REWARD_MAX, DAILY_REWARD_MIN, DAY_MS,
        ERROR_BAD_PARAMS, ERROR_COOLDOWN_ACTIVE, ERROR_INSUFFICIENT_FUNDS, ERROR_INVALID_MOVE,
        ERROR_JOB_REQUIREMENTS, ERROR_NO_JOB, ERROR_OUT_OF_STOCK, ERROR_SCOPE_BUSY,
        ERROR_SELF_TRANSFER, ERROR_STORE, ERROR_UNKNOWN_ITEM,
    },
    Account, Activity, ChannelId, GameKind, ScopeKey, UserId,
};
use futures::channel::{mpsc, oneshot};
use rand::Rng;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, watch},
    task::JoinSet,
};
use tracing::{debug, info};

/// Precondition failure. No session exists after a rejection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("{user} must wait {remaining:?} before playing {activity} again")]
    Cooldown {
        user: UserId,
        activity: Activity,
        remaining: Duration,
    },
    #[error("{user} has {balance} but the stake is {needed}")]
    InsufficientFunds {
        user: UserId,
        needed: u64,
        balance: i64,
    },
    #[error(transparent)]
    ScopeBusy(#[from] ScopeBusy),
    #[error("bad parameters: {0}")]
    BadParams(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Rejection {
    pub fn code(&self) -> u8 {
        match self {
            Rejection::Cooldown { .. } => ERROR_COOLDOWN_ACTIVE,
            Rejection::InsufficientFunds { .. } => ERROR_INSUFFICIENT_FUNDS,
            Rejection::ScopeBusy(_) => ERROR_SCOPE_BUSY,
            Rejection::BadParams(_) => ERROR_BAD_PARAMS,
            Rejection::Store(_) => ERROR_STORE,
        }
    }
}

/// Failure of a direct economy operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EconomyError {
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("you cannot pay yourself")]
    SelfTransfer,
    #[error("balance {balance} does not cover {needed}")]
    InsufficientFunds { needed: u64, balance: i64 },
    #[error("try again in {remaining:?}")]
    Cooldown { remaining: Duration },
    #[error("you do not have a job")]
    NoJob,
    #[error("{job} needs a balance of {min_balance} and {hours_required} hours worked")]
    JobRequirements {
        job: JobKind,
        min_balance: i64,
        hours_required: u32,
    },
    #[error("the shop does not sell {0}")]
    UnknownItem(String),
    #[error("{0} is out of stock")]
    OutOfStock(String),
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EconomyError {
    pub fn code(&self) -> u8 {
        match self {
            EconomyError::InvalidAmount => ERROR_INVALID_MOVE,
            EconomyError::SelfTransfer => ERROR_SELF_TRANSFER,
            EconomyError::InsufficientFunds { .. } => ERROR_INSUFFICIENT_FUNDS,
            EconomyError::Cooldown { .. } => ERROR_COOLDOWN_ACTIVE,
            EconomyError::NoJob => ERROR_NO_JOB,
            EconomyError::JobRequirements { .. } => ERROR_JOB_REQUIREMENTS,
            EconomyError::UnknownItem(_) => ERROR_UNKNOWN_ITEM,
            EconomyError::OutOfStock(_) => ERROR_OUT_OF_STOCK,
            EconomyError::Rejected(rejection) => rejection.code(),
            EconomyError::Store(_) => ERROR_STORE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartRequest {
    pub kind: GameKind,
    pub scope: ScopeKey,
    pub channel: ChannelId,
    /// Player 0 first. Connect4 takes the challenger then the opponent.
    pub participants: Vec<UserId>,
    pub stake: u64,
    /// Game parameter such as the called side or the guessed number.
    pub choice: Option<String>,
}

impl StartRequest {
    /// A request scoped the way `kind` requires.
    pub fn new(kind: GameKind, channel: ChannelId, participants: Vec<UserId>, stake: u64) -> Self {
        let scope = match participants.first() {
            Some(&user) if !kind.channel_scoped() => ScopeKey::User(user),
            _ => ScopeKey::Channel(channel),
        };
        Self {
            kind,
            scope,
            channel,
            participants,
            stake,
            choice: None,
        }
    }

    pub fn with_choice(mut self, choice: impl Into<String>) -> Self {
        self.choice = Some(choice.into());
        self
    }

    fn validate(&self) -> Result<Box<dyn Game>, Rejection> {
        let bad = |reason: String| -> Result<Box<dyn Game>, Rejection> {
            Err(Rejection::BadParams(reason))
        };
        let roster = if self.kind == GameKind::Connect4 { 2 } else { 1 };
        if self.participants.len() != roster {
            return bad(format!("{} takes {roster} player(s)", self.kind));
        }
        if roster == 2 && self.participants[0] == self.participants[1] {
            return bad("you cannot play against yourself".to_string());
        }
        let expected_scope = if self.kind.channel_scoped() {
            ScopeKey::Channel(self.channel)
        } else {
            ScopeKey::User(self.participants[0])
        };
        if self.scope != expected_scope {
            return bad(format!("{} sessions are scoped to {expected_scope}", self.kind));
        }
        match self.kind.stake_range() {
            Some((min, max)) if !(min..=max).contains(&self.stake) => {
                return bad(format!("stake must be between {min} and {max}"));
            }
            None if self.stake != 0 => {
                return bad(format!("{} does not take a stake", self.kind));
            }
            _ => {}
        }
        games::build(self.kind, self.choice.as_deref()).map_err(Rejection::BadParams)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailyReward {
    pub amount: u64,
    pub balance: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub amount: u64,
    pub from_balance: i64,
    pub to_balance: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Purchase {
    pub item: &'static str,
    pub price: u64,
    pub balance: i64,
    /// Units of the item now in the buyer's inventory.
    pub owned: u32,
}

#[derive(Clone, Debug)]
pub struct ArcadeConfig {
    pub seed: Seed,
    pub mailbox_size: usize,
    pub prompt_buffer: usize,
    pub retry: RetryPolicy,
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        Self {
            seed: [0u8; 32],
            mailbox_size: 32,
            prompt_buffer: 256,
            retry: RetryPolicy::default(),
        }
    }
}

pub struct Arcade<S: AccountStore> {
    store: Arc<S>,
    services: Services<S>,
    router: InputRouter,
    shop: Shop,
    seed: Seed,
    mailbox_size: usize,
    tasks: Mutex<JoinSet<()>>,
}

impl<S: AccountStore> Arcade<S> {
    pub fn new(store: Arc<S>, config: ArcadeConfig, clock: Clock) -> Self {
        let metrics = Metrics::default();
        let registry = Arc::new(SessionRegistry::new());
        let settlement = Arc::new(SettlementEngine::new(
            store.clone(),
            config.retry,
            metrics.clone(),
        ));
        let (prompts, _) = broadcast::channel(config.prompt_buffer.max(1));
        Self {
            store,
            router: InputRouter::new(registry.clone()),
            shop: Shop::new(),
            services: Services {
                registry,
                settlement,
                prompts,
                clock,
                metrics,
            },
            seed: config.seed,
            mailbox_size: config.mailbox_size,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.services.metrics
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.services.registry
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Every prompt any session emits from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Prompt> {
        self.services.prompts.subscribe()
    }

    pub fn now_ms(&self) -> u64 {
        self.services.clock.now_ms()
    }

    pub async fn start_session(&self, request: StartRequest) -> Result<SessionHandle, Rejection> {
        let game = request.validate().map_err(|rejection| self.reject(&request, rejection))?;
        self.start_game(request, game).await
    }

    /// Admit and launch an already-built game.
    pub(crate) async fn start_game(
        &self,
        request: StartRequest,
        game: Box<dyn Game>,
    ) -> Result<SessionHandle, Rejection> {
        let lease = self
            .admit(&request, game.activity())
            .await
            .map_err(|rejection| self.reject(&request, rejection))?;
        Ok(self
            .launch(lease, request.channel, request.participants, request.stake, game)
            .await)
    }

    fn reject(&self, request: &StartRequest, rejection: Rejection) -> Rejection {
        self.services.metrics.rejections.inc();
        debug!(kind = %request.kind, scope = %request.scope, %rejection, "start rejected");
        rejection
    }

    async fn admit(&self, request: &StartRequest, activity: Activity) -> Result<Lease, Rejection> {
        let mut accounts = Vec::with_capacity(request.participants.len());
        for &user in &request.participants {
            accounts.push(self.store.load(user).await?);
        }

        let now_ms = self.now_ms();
        let window = Duration::from_millis(activity.cooldown_ms());
        for account in &accounts {
            let last = account.cooldowns.last_played(activity);
            if !cooldown::can_start(last, window, now_ms) {
                return Err(Rejection::Cooldown {
                    user: account.user_id,
                    activity,
                    remaining: cooldown::time_remaining(last, window, now_ms),
                });
            }
        }
        for account in &accounts {
            if !account.can_afford(request.stake) {
                return Err(Rejection::InsufficientFunds {
                    user: account.user_id,
                    needed: request.stake,
                    balance: account.balance,
                });
            }
        }

        Ok(self.services.registry.try_acquire(request.scope, request.kind)?)
    }

    /// Begin the game on an acquired scope. Single-decision games settle here.
    async fn launch(
        &self,
        lease: Lease,
        channel: ChannelId,
        participants: Vec<UserId>,
        stake: u64,
        game: Box<dyn Game>,
    ) -> SessionHandle {
        let services = &self.services;
        services.metrics.sessions_started.inc();
        services
            .metrics
            .active_sessions
            .set(services.registry.active() as i64);

        let now_ms = self.now_ms();
        let mut session = Session {
            id: lease.session_id,
            scope: lease.scope,
            channel,
            participants,
            stake,
            started_at_ms: now_ms,
            deadline_ms: now_ms,
            game,
            rng: GameRng::new(&self.seed, lease.session_id, 0),
            ticket: SettlementTicket::new(lease.session_id),
        };
        info!(
            session = session.id,
            scope = %session.scope,
            kind = %session.kind(),
            stake,
            "session started"
        );

        let (step, prompts) = session.drive(Event::Begin, now_ms, &services.prompts);
        let (receipt_tx, receipt_rx) = oneshot::channel();
        let terminal = match step {
            Step::Continue => None,
            Step::Terminal(result) => Some((Resolution::Completed, result)),
            Step::Faulted | Step::Rejected(_) => Some((Resolution::Faulted, games::GameResult::Void)),
        };

        match terminal {
            Some((resolution, result)) => {
                let receipt = session.finish(services, resolution, &result).await;
                let _ = receipt_tx.send(receipt);
            }
            None => {
                let (sender, receiver) = mpsc::channel(self.mailbox_size.max(1));
                let (expected_tx, expected_rx) =
                    watch::channel(session.game.expected(&session.participants));
                services.registry.attach(
                    &lease,
                    LiveSession {
                        session_id: session.id,
                        kind: session.kind(),
                        channel: session.channel,
                        mailbox: Mailbox::new(sender),
                        expected: expected_rx,
                    },
                );
                let actor = Actor::new(session, services.clone(), receiver, expected_tx, receipt_tx);
                let mut tasks = self.tasks.lock().unwrap_or_else(|p| p.into_inner());
                while tasks.try_join_next().is_some() {}
                tasks.spawn(actor.run());
            }
        }
        SessionHandle::new(lease.session_id, lease.scope, prompts, receipt_rx)
    }

    /// Deliver an interaction to the session expecting it.
    pub async fn route(&self, interaction: Interaction) -> Routed {
        self.router.route(interaction).await
    }

    pub async fn balance(&self, user: UserId) -> Result<Account, StoreError> {
        self.store.load(user).await
    }

    pub async fn claim_daily(&self, user: UserId) -> Result<DailyReward, EconomyError> {
        let amount = rand::thread_rng().gen_range(DAILY_REWARD_MIN..=DAILY_REWARD_MAX);
        let now_ms = self.now_ms();
        let window = Duration::from_millis(Activity::Daily.cooldown_ms());
        let reward = self
            .store
            .update(user, move |account| {
                let last = account.cooldowns.last_played(Activity::Daily);
                if !cooldown::can_start(last, window, now_ms) {
                    return Err(EconomyError::Cooldown {
                        remaining: cooldown::time_remaining(last, window, now_ms),
                    });
                }
                account.balance = account.balance.saturating_add(amount as i64);
                account.cooldowns.stamp(Activity::Daily, now_ms);
                Ok(DailyReward {
                    amount,
                    balance: account.balance,
                })
            })
            .await??;
        info!(user = %user, amount, "daily reward claimed");
        Ok(reward)
    }

    pub async fn transfer(&self, from: UserId, to: UserId, amount: u64) -> Result<Transfer, EconomyError> {
        if amount == 0 {
            return Err(EconomyError::InvalidAmount);
        }
        if from == to {
            return Err(EconomyError::SelfTransfer);
        }
        let signed = i64::try_from(amount).map_err(|_| EconomyError::InvalidAmount)?;
        let transfer = self
            .store
            .update_pair(from, to, move |sender, receiver| {
                if !sender.can_afford(amount) {
                    return Err(EconomyError::InsufficientFunds {
                        needed: amount,
                        balance: sender.balance,
                    });
                }
                sender.balance -= signed;
                receiver.balance = receiver.balance.saturating_add(signed);
                Ok(Transfer {
                    amount,
                    from_balance: sender.balance,
                    to_balance: receiver.balance,
                })
            })
            .await??;
        info!(from = %from, to = %to, amount, "transfer");
        Ok(transfer)
    }

    /// Catalog with remaining stock.
    pub fn shop(&self) -> Vec<Listing> {
        self.shop.listing()
    }

    /// Buy one unit of the catalog item named `item`.
    ///
    /// The price and the inventory entry are applied in one account update.
    /// A unit of limited stock is held while the update runs and returned if
    /// the purchase fails.
    pub async fn buy(&self, user: UserId, item: &str) -> Result<Purchase, EconomyError> {
        let item = find_item(item).ok_or_else(|| EconomyError::UnknownItem(item.trim().to_string()))?;
        let price = i64::try_from(item.price).map_err(|_| EconomyError::InvalidAmount)?;
        if !self.shop.take(item) {
            return Err(EconomyError::OutOfStock(item.name.to_string()));
        }
        let result = self
            .store
            .update(user, move |account| {
                if !account.can_afford(item.price) {
                    return Err(EconomyError::InsufficientFunds {
                        needed: item.price,
                        balance: account.balance,
                    });
                }
                account.balance -= price;
                let owned = account.inventory.entry(item.name.to_string()).or_insert(0);
                *owned = owned.saturating_add(1);
                Ok(Purchase {
                    item: item.name,
                    price: item.price,
                    balance: account.balance,
                    owned: *owned,
                })
            })
            .await
            .map_err(EconomyError::from)
            .and_then(|purchase| purchase);
        match result {
            Ok(purchase) => {
                info!(user = %user, item = item.name, price = item.price, "item bought");
                Ok(purchase)
            }
            Err(err) => {
                self.shop.restore(item);
                Err(err)
            }
        }
    }

    /// Take (or switch to) `job`. Switching resets the streak.
    pub async fn choose_job(&self, user: UserId, job: JobKind) -> Result<Account, EconomyError> {
        let account = self
            .store
            .update(user, move |account| {
                let definition = job.job();
                if !account.meets(definition) {
                    return Err(EconomyError::JobRequirements {
                        job,
                        min_balance: definition.min_balance,
                        hours_required: definition.hours_required,
                    });
                }
                if account.current_job != Some(job) {
                    account.current_job = Some(job);
                    account.job_streak.count = 0;
                }
                Ok(account.clone())
            })
            .await??;
        info!(user = %user, %job, "job chosen");
        Ok(account)
    }

    pub async fn quit_job(&self, user: UserId) -> Result<Account, EconomyError> {
        let account = self
            .store
            .update(user, |account| {
                if account.current_job.take().is_none() {
                    return Err(EconomyError::NoJob);
                }
                account.job_streak.count = 0;
                Ok(account.clone())
            })
            .await??;
        info!(user = %user, "job quit");
        Ok(account)
    }

    /// Start a shift of the user's current job.
    pub async fn start_work(&self, user: UserId, channel: ChannelId) -> Result<SessionHandle, EconomyError> {
        let account = self.store.load(user).await?;
        let job = account.current_job.ok_or(EconomyError::NoJob)?;
        let definition = job.job();
        if !account.meets(definition) {
            return Err(EconomyError::JobRequirements {
                job,
                min_balance: definition.min_balance,
                hours_required: definition.hours_required,
            });
        }

        let now_ms = self.now_ms();
        let activity = Activity::Work(job);
        let window = Duration::from_millis(activity.cooldown_ms());
        let last = account.cooldowns.last_played(activity);
        if !cooldown::can_start(last, window, now_ms) {
            self.services.metrics.rejections.inc();
            return Err(Rejection::Cooldown {
                user,
                activity,
                remaining: cooldown::time_remaining(last, window, now_ms),
            }
            .into());
        }

        let scope = ScopeKey::User(user);
        let lease = self
            .services
            .registry
            .try_acquire(scope, GameKind::Work)
            .map_err(|busy| {
                self.services.metrics.rejections.inc();
                Rejection::from(busy)
            })?;
        let streak = account.job_streak.next_for(now_ms / DAY_MS);
        let shift: Box<dyn Game> = Box::new(Shift::new(job, streak));
        Ok(self.launch(lease, channel, vec![user], 0, shift).await)
    }

    /// Re-drive settlements held after store failures.
    pub async fn retry_held(&self) -> Vec<Receipt> {
        self.services.settlement.retry_held().await
    }

    pub fn pending_settlements(&self) -> Vec<u64> {
        self.services.settlement.pending()
    }

    /// Close every live session through its deadline transition and wait for
    /// each to settle.
    pub async fn shutdown(&self) {
        let live = self.services.registry.live_sessions();
        info!(sessions = live.len(), "shutting down");
        for mut session in live {
            session.mailbox.close().await;
        }
        let mut tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(|p| p.into_inner()));
        while tasks.join_next().await.is_some() {}
    }
}
