//! Live game sessions.
//!
//! A [`Session`] owns one game value plus its roster, stake, rng and
//! deadline. Every event (begin, input, deadline, internal timer) goes
//! through [`Session::drive`], which runs the game inside `catch_unwind`
//! and publishes whatever the game wants shown. Interactive sessions run
//! as an [`Actor`] that serialises their events.

mod actor;
mod ingress;

pub(crate) use actor::Actor;
pub use ingress::{Mailbox, Message};

use crate::{
    clock::Clock,
    games::{Context, Game, GameError, GameResult, Input, Note},
    metrics::Metrics,
    registry::SessionRegistry,
    rng::GameRng,
    settlement::{Outcome, Receipt, Resolution, SettlementEngine, SettlementError, SettlementTicket},
    store::AccountStore,
};
use arcade_types::{casino::Prompt, Activity, ChannelId, GameKind, ScopeKey, UserId};
use futures::channel::oneshot;
use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Engine handles shared by every session.
pub(crate) struct Services<S: AccountStore> {
    pub registry: Arc<SessionRegistry>,
    pub settlement: Arc<SettlementEngine<S>>,
    pub prompts: broadcast::Sender<Prompt>,
    pub clock: Clock,
    pub metrics: Metrics,
}

impl<S: AccountStore> Clone for Services<S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            settlement: self.settlement.clone(),
            prompts: self.prompts.clone(),
            clock: self.clock,
            metrics: self.metrics.clone(),
        }
    }
}

pub(crate) enum Event<'a> {
    Begin,
    Input(UserId, Input<'a>),
    Deadline,
    /// The engine is closing the session before it finished.
    Shutdown,
    Timer,
}

pub(crate) enum Step {
    Continue,
    /// Input refused; the game state is unchanged.
    Rejected(GameError),
    Terminal(GameResult),
    Faulted,
}

pub(crate) struct Session {
    pub id: u64,
    pub scope: ScopeKey,
    pub channel: ChannelId,
    pub participants: Vec<UserId>,
    pub stake: u64,
    pub started_at_ms: u64,
    pub deadline_ms: u64,
    pub game: Box<dyn Game>,
    pub rng: GameRng,
    pub ticket: Arc<SettlementTicket>,
}

impl Session {
    pub fn kind(&self) -> GameKind {
        self.game.kind()
    }

    pub fn activity(&self) -> Activity {
        self.game.activity()
    }

    /// Feed one event to the game and publish its notes.
    pub fn drive(
        &mut self,
        event: Event<'_>,
        now_ms: u64,
        prompts: &broadcast::Sender<Prompt>,
    ) -> (Step, Vec<Prompt>) {
        let Self {
            id,
            participants,
            stake,
            started_at_ms,
            deadline_ms,
            game,
            rng,
            ..
        } = self;
        let caught = catch_unwind(AssertUnwindSafe(|| {
            let mut ctx = Context::new(
                *id,
                now_ms,
                *started_at_ms,
                *stake,
                participants,
                rng,
                *deadline_ms,
            );
            let result = match event {
                Event::Begin => Ok(game.begin(&mut ctx)),
                Event::Input(actor, input) => game.on_input(&mut ctx, actor, input),
                Event::Deadline => Ok(game.on_deadline(&mut ctx)),
                Event::Shutdown => Ok(game.on_shutdown(&mut ctx)),
                Event::Timer => Ok(game.on_timer(&mut ctx)),
            };
            (result, ctx.into_notes())
        }));

        let (step, notes) = match caught {
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                error!(session = self.id, kind = %self.kind(), reason = %reason, "game panicked");
                (Step::Faulted, Vec::new())
            }
            Ok((Err(GameError::InvalidState), _)) => {
                error!(session = self.id, kind = %self.kind(), "game reported invalid state");
                (Step::Faulted, Vec::new())
            }
            Ok((Err(err), (_, notes))) => (Step::Rejected(err), notes),
            Ok((Ok(result), (deadline, notes))) => {
                self.deadline_ms = deadline;
                let step = if result.is_terminal() {
                    Step::Terminal(result)
                } else {
                    Step::Continue
                };
                (step, notes)
            }
        };

        let expires = matches!(step, Step::Continue).then_some(self.deadline_ms);
        let published: Vec<Prompt> = notes
            .into_iter()
            .map(|note| self.prompt(note, expires))
            .collect();
        for prompt in &published {
            // No subscribers is fine: the caller also gets the prompts.
            let _ = prompts.send(prompt.clone());
        }
        (step, published)
    }

    fn prompt(&self, note: Note, expires_at_ms: Option<u64>) -> Prompt {
        Prompt {
            session: self.id,
            channel: self.channel,
            audience: note.audience,
            text: note.text,
            choices: note.choices,
            expires_at_ms,
        }
    }

    /// Settle the terminal result, then free the scope.
    pub async fn finish<S: AccountStore>(
        &self,
        services: &Services<S>,
        resolution: Resolution,
        result: &GameResult,
    ) -> Result<Receipt, SettlementError> {
        let now_ms = services.clock.now_ms();
        let outcome = Outcome::from_result(
            self.id,
            self.activity(),
            resolution,
            result,
            &self.participants,
            self.stake,
            self.game.progress(),
            now_ms,
        );
        if resolution == Resolution::Faulted {
            services.metrics.faults.inc();
        }
        let receipt = services.settlement.settle(&self.ticket, outcome).await;
        services.registry.release(self.scope, self.id);
        services
            .metrics
            .active_sessions
            .set(services.registry.active() as i64);
        info!(
            session = self.id,
            scope = %self.scope,
            kind = %self.kind(),
            ?resolution,
            "session closed"
        );
        receipt
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Settlement(#[from] SettlementError),
    #[error("session ended without reporting a receipt")]
    Abandoned,
}

/// Returned by a successful start.
pub struct SessionHandle {
    pub session_id: u64,
    pub scope: ScopeKey,
    /// Prompts emitted by `begin`.
    pub prompts: Vec<Prompt>,
    receipt: oneshot::Receiver<Result<Receipt, SettlementError>>,
}

impl SessionHandle {
    pub(crate) fn new(
        session_id: u64,
        scope: ScopeKey,
        prompts: Vec<Prompt>,
        receipt: oneshot::Receiver<Result<Receipt, SettlementError>>,
    ) -> Self {
        Self {
            session_id,
            scope,
            prompts,
            receipt,
        }
    }

    /// Wait for the session to settle.
    pub async fn receipt(self) -> Result<Receipt, SessionError> {
        match self.receipt.await {
            Ok(result) => Ok(result?),
            Err(oneshot::Canceled) => Err(SessionError::Abandoned),
        }
    }
}
