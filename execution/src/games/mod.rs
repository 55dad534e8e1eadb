//! Minigame state machines.
//!
//! Every game shares one shape: `begin` either resolves immediately
//! (single-decision wagers) or arms a deadline and awaits input. Inputs, the
//! deadline and the optional internal timer are all events fed to the same
//! game value by its session actor, one at a time.
//!
//! - Coin flip, dice, slots and number guess resolve in `begin`.
//! - Rock-paper-scissors and trivia await one answer.
//! - Minefield, memory and connect4 run multi-step boards.
//! - Work shifts run one timed minigame and carry job progression.
//! - The group quiz runs timed rounds that anyone in the channel may answer.

pub mod coinflip;
pub mod connect4;
pub mod dice;
pub mod guess;
pub mod memory;
pub mod minefield;
pub mod quiz;
pub mod rps;
pub mod slots;
pub mod trivia;
pub mod work;

use crate::rng::GameRng;
use arcade_types::casino::{Audience, Choice, InteractionKind, JobKind};
use arcade_types::{Activity, GameKind, UserId};
use thiserror::Error;

/// Result of feeding an event to a game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameResult {
    /// Still awaiting input.
    Continue,
    /// Single player won. Value is the net credit.
    Win(u64),
    /// Single player forfeits the stake.
    Loss,
    /// No balance change; the cooldown still applies.
    Push,
    /// Stake-free credit (trivia, work).
    Reward(u64),
    /// Two-player game won by the participant at this index. The loser pays the winner the stake.
    Victory(usize),
    /// Two-player game ended level. Both keep their stakes.
    Draw,
    /// Nothing to settle: no balance change and no cooldown.
    Void,
}

impl GameResult {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameResult::Continue)
    }
}

/// Input rejected by a game. The game state is unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("that input is not understood here")]
    InvalidPayload,
    #[error("that move is not allowed right now")]
    InvalidMove,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("that column is full")]
    ColumnFull,
    #[error("that cell is already revealed")]
    AlreadyRevealed,
    #[error("that card is already matched")]
    AlreadyMatched,
    #[error("you already answered this round")]
    AlreadyAnswered,
    #[error("this game is already over")]
    GameAlreadyComplete,
    /// Broken internal state. Treated as an engine fault, never as user error.
    #[error("invalid game state")]
    InvalidState,
}

/// Job progression recorded when a work shift settles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub job: JobKind,
    pub streak: u32,
}

/// Which inputs a live session accepts in its current sub-state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Expectation {
    pub actors: Vec<UserId>,
    /// Whether plain text messages (rather than buttons) are awaited.
    pub text: bool,
    /// Admit any actor, not just `actors`.
    pub open: bool,
}

impl Expectation {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn buttons(actors: Vec<UserId>) -> Self {
        Self {
            actors,
            ..Self::default()
        }
    }

    pub fn text(actors: Vec<UserId>) -> Self {
        Self {
            actors,
            text: true,
            open: false,
        }
    }

    /// Buttons from anyone in the session's channel.
    pub fn open_buttons() -> Self {
        Self {
            open: true,
            ..Self::default()
        }
    }

    pub fn admits(&self, actor: UserId, kind: InteractionKind) -> bool {
        let kind_ok = match kind {
            InteractionKind::Text => self.text,
            InteractionKind::Button => !self.text,
            InteractionKind::Command => false,
        };
        kind_ok && (self.open || self.actors.contains(&actor))
    }
}

/// Decoded game input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input<'a> {
    /// Button argument, with the kind prefix stripped.
    Button(&'a str),
    Text(&'a str),
}

/// Something a game wants shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub audience: Audience,
    pub text: String,
    pub choices: Vec<Choice>,
}

/// Per-event view of the session handed to a game.
pub struct Context<'a> {
    pub session_id: u64,
    pub now_ms: u64,
    pub started_at_ms: u64,
    pub stake: u64,
    pub participants: &'a [UserId],
    pub rng: &'a mut GameRng,
    deadline_ms: u64,
    notes: Vec<Note>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        session_id: u64,
        now_ms: u64,
        started_at_ms: u64,
        stake: u64,
        participants: &'a [UserId],
        rng: &'a mut GameRng,
        deadline_ms: u64,
    ) -> Self {
        Self {
            session_id,
            now_ms,
            started_at_ms,
            stake,
            participants,
            rng,
            deadline_ms,
            notes: Vec::new(),
        }
    }

    /// Participant at `index`, or `InvalidState` when the roster is short.
    pub fn participant(&self, index: usize) -> Result<UserId, GameError> {
        self.participants
            .get(index)
            .copied()
            .ok_or(GameError::InvalidState)
    }

    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }

    /// Move the deadline to `window_ms` from now.
    pub fn rearm(&mut self, window_ms: u64) {
        self.deadline_ms = self.now_ms.saturating_add(window_ms);
    }

    /// Show text to the whole channel.
    pub fn announce(&mut self, text: impl Into<String>) {
        self.present(text, Vec::new());
    }

    /// Show text with choices to the whole channel.
    pub fn present(&mut self, text: impl Into<String>, choices: Vec<Choice>) {
        self.notes.push(Note {
            audience: Audience::Channel,
            text: text.into(),
            choices,
        });
    }

    /// Show a transient notice to one user.
    pub fn whisper(&mut self, user: UserId, text: impl Into<String>) {
        self.notes.push(Note {
            audience: Audience::Private(user),
            text: text.into(),
            choices: Vec::new(),
        });
    }

    pub(crate) fn into_notes(self) -> (u64, Vec<Note>) {
        (self.deadline_ms, self.notes)
    }
}

/// A minigame state machine.
pub trait Game: Send + Sync {
    fn kind(&self) -> GameKind;

    /// Activity whose cooldown this game stamps.
    fn activity(&self) -> Activity;

    /// Emit the first prompt, or resolve immediately.
    fn begin(&mut self, ctx: &mut Context<'_>) -> GameResult;

    /// Inputs accepted in the current sub-state.
    fn expected(&self, _participants: &[UserId]) -> Expectation {
        Expectation::none()
    }

    fn on_input(
        &mut self,
        _ctx: &mut Context<'_>,
        _actor: UserId,
        _input: Input<'_>,
    ) -> Result<GameResult, GameError> {
        Err(GameError::GameAlreadyComplete)
    }

    /// Transition when the deadline passes. Must be terminal unless it rearms.
    fn on_deadline(&mut self, _ctx: &mut Context<'_>) -> GameResult {
        GameResult::Push
    }

    /// Terminal transition when the engine closes the session early.
    ///
    /// Games whose deadline only advances a round must override this.
    fn on_shutdown(&mut self, ctx: &mut Context<'_>) -> GameResult {
        self.on_deadline(ctx)
    }

    /// Pending internal timer (ms timestamp), if any.
    fn timer_at(&self) -> Option<u64> {
        None
    }

    fn on_timer(&mut self, _ctx: &mut Context<'_>) -> GameResult {
        GameResult::Continue
    }

    /// Job progression to record on settlement.
    fn progress(&self) -> Option<Progress> {
        None
    }
}

/// Build a game of `kind` from the player's `choice` parameter.
///
/// Work shifts are not built here; see [`work::Shift::new`].
pub fn build(kind: GameKind, choice: Option<&str>) -> Result<Box<dyn Game>, String> {
    let required = |what: &str| choice.ok_or_else(|| format!("{kind} requires {what}"));
    let game: Box<dyn Game> = match kind {
        GameKind::CoinFlip => {
            let call = required("a side")?
                .parse()
                .map_err(|_| "side must be heads or tails".to_string())?;
            Box::new(coinflip::CoinFlip::new(call))
        }
        GameKind::Dice => Box::new(dice::Dice),
        GameKind::Slots => Box::new(slots::Slots),
        GameKind::GuessNumber => {
            let guess = required("a number")?;
            Box::new(guess::GuessNumber::new(guess)?)
        }
        GameKind::Rps => Box::new(rps::Rps::new()),
        GameKind::Trivia => Box::new(trivia::Trivia::new()),
        GameKind::Minefield => Box::new(minefield::Minefield::new()),
        GameKind::Memory => Box::new(memory::Memory::new()),
        GameKind::Connect4 => Box::new(connect4::Connect4::new()),
        GameKind::GroupQuiz => {
            let set = required("a quiz set")?;
            Box::new(quiz::GroupQuiz::new(set)?)
        }
        GameKind::Work => return Err("work shifts are started by the shift command".to_string()),
    };
    Ok(game)
}

/// Net credit of `stake` scaled by a basis-point multiplier, floored.
pub(crate) fn scale_bps(amount: u64, bps: u64) -> u64 {
    let scaled = u128::from(amount) * u128::from(bps) / 10_000;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::rng::Seed;

    pub const SEED: Seed = [3u8; 32];

    /// Drives a game outside of an actor.
    pub struct Harness {
        pub game: Box<dyn Game>,
        pub rng: GameRng,
        pub participants: Vec<UserId>,
        pub stake: u64,
        pub started_at_ms: u64,
        pub now_ms: u64,
        pub deadline_ms: u64,
        pub notes: Vec<Note>,
    }

    impl Harness {
        pub fn new(game: Box<dyn Game>, participants: Vec<UserId>, stake: u64) -> Self {
            Self {
                game,
                rng: GameRng::new(&SEED, 1, 0),
                participants,
                stake,
                started_at_ms: 1_000_000,
                now_ms: 1_000_000,
                deadline_ms: 1_000_000,
                notes: Vec::new(),
            }
        }

        fn with_ctx<T>(&mut self, f: impl FnOnce(&mut dyn Game, &mut Context<'_>) -> T) -> T {
            let mut ctx = Context::new(
                1,
                self.now_ms,
                self.started_at_ms,
                self.stake,
                &self.participants,
                &mut self.rng,
                self.deadline_ms,
            );
            let out = f(self.game.as_mut(), &mut ctx);
            let (deadline, notes) = ctx.into_notes();
            self.deadline_ms = deadline;
            self.notes.extend(notes);
            out
        }

        pub fn begin(&mut self) -> GameResult {
            self.with_ctx(|game, ctx| game.begin(ctx))
        }

        pub fn press(&mut self, actor: UserId, arg: &str) -> Result<GameResult, GameError> {
            self.with_ctx(|game, ctx| game.on_input(ctx, actor, Input::Button(arg)))
        }

        pub fn type_text(&mut self, actor: UserId, text: &str) -> Result<GameResult, GameError> {
            self.with_ctx(|game, ctx| game.on_input(ctx, actor, Input::Text(text)))
        }

        pub fn expire(&mut self) -> GameResult {
            self.now_ms = self.deadline_ms;
            self.with_ctx(|game, ctx| game.on_deadline(ctx))
        }

        pub fn shut_down(&mut self) -> GameResult {
            self.with_ctx(|game, ctx| game.on_shutdown(ctx))
        }

        pub fn fire_timer(&mut self) -> GameResult {
            if let Some(at) = self.game.timer_at() {
                self.now_ms = self.now_ms.max(at);
            }
            self.with_ctx(|game, ctx| game.on_timer(ctx))
        }

        pub fn advance(&mut self, ms: u64) {
            self.now_ms += ms;
        }

        pub fn expected(&self) -> Expectation {
            self.game.expected(&self.participants)
        }
    }
}
