//! Arcade domain types.
//!
//! Defines account/activity/scope state, job and shop definitions, and constants used by the
//! execution layer and the node.

mod account;
mod activity;
mod constants;
mod interaction;
mod jobs;
mod scope;
mod shop;

pub use account::*;
pub use activity::*;
pub use constants::*;
pub use interaction::*;
pub use jobs::*;
pub use scope::*;
pub use shop::*;

#[cfg(test)]
mod tests;
