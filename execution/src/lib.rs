//! Arcade execution layer.
//!
//! This crate runs chat minigame sessions and settles their outcomes against
//! an [`AccountStore`]. The primary entrypoint is [`Arcade`].
//!
//! ## Session lifecycle
//! 1. A start request passes parameter, cooldown and funds checks, then
//!    acquires its scope (one live session per user or per channel).
//! 2. Single-decision games resolve during `begin` and settle before the
//!    start call returns. Interactive games run as an actor that receives
//!    routed interactions, its deadline and any internal timer, one event at
//!    a time.
//! 3. The terminal result settles exactly once, then the scope is released.
//!
//! ## Randomness
//! Game randomness comes from [`GameRng`], derived from the engine seed and the
//! session id, so a session replays identically for a given seed.
//!
//! ## Minimal flow (example)
//! ```rust,ignore
//! use arcade_execution::{Arcade, ArcadeConfig, Clock, MemoryStore, StartRequest};
//! use arcade_types::{ChannelId, GameKind, UserId};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let arcade = Arcade::new(Arc::new(MemoryStore::new()), ArcadeConfig::default(), Clock::system());
//! arcade.claim_daily(UserId(1)).await?;
//! let request = StartRequest::new(GameKind::CoinFlip, ChannelId(7), vec![UserId(1)], 50)
//!     .with_choice("heads");
//! let receipt = arcade.start_session(request).await?.receipt().await?;
//! println!("{:?}", receipt.deltas);
//! # Ok(())
//! # }
//! ```

pub mod arcade;
mod backoff;
pub mod clock;
pub mod content;
pub mod cooldown;
pub mod games;
pub mod metrics;
pub mod registry;
pub mod rng;
pub mod router;
pub mod session;
pub mod settlement;
pub mod shop;
pub mod store;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

#[cfg(test)]
mod idempotency_tests;

pub use arcade::{
    Arcade, ArcadeConfig, DailyReward, EconomyError, Purchase, Rejection, StartRequest, Transfer,
};
pub use clock::Clock;
pub use games::{Game, GameError, GameResult};
pub use metrics::Metrics;
pub use registry::{ScopeBusy, SessionRegistry};
pub use rng::{GameRng, Seed};
pub use router::Routed;
pub use session::{SessionError, SessionHandle};
pub use settlement::{Receipt, Resolution, RetryPolicy, SettlementError};
pub use shop::{Listing, Shop};
pub use store::{AccountStore, MemoryStore, StoreError};
