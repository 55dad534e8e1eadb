//! Shared types for the arcade minigame engine.

pub mod casino;

pub use casino::{Account, Activity, ChannelId, GameKind, ScopeKey, UserId};
