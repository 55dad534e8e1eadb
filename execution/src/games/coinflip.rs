//! Coin flip: call a side, one flip, even money.

use super::{Context, Game, GameError, GameResult};
use crate::rng::GameRng;
use arcade_types::{Activity, GameKind};
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Heads,
    Tails,
}

impl FromStr for Side {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heads" | "h" => Ok(Side::Heads),
            "tails" | "t" => Ok(Side::Tails),
            _ => Err(GameError::InvalidPayload),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Heads => f.write_str("heads"),
            Side::Tails => f.write_str("tails"),
        }
    }
}

pub fn flip(rng: &mut GameRng) -> Side {
    if rng.coin() {
        Side::Heads
    } else {
        Side::Tails
    }
}

pub fn resolve(call: Side, landed: Side, stake: u64) -> GameResult {
    if call == landed {
        GameResult::Win(stake)
    } else {
        GameResult::Loss
    }
}

pub struct CoinFlip {
    call: Side,
}

impl CoinFlip {
    pub fn new(call: Side) -> Self {
        Self { call }
    }
}

impl Game for CoinFlip {
    fn kind(&self) -> GameKind {
        GameKind::CoinFlip
    }

    fn activity(&self) -> Activity {
        Activity::CoinFlip
    }

    fn begin(&mut self, ctx: &mut Context<'_>) -> GameResult {
        let landed = flip(ctx.rng);
        let result = resolve(self.call, landed, ctx.stake);
        let verdict = if result == GameResult::Loss {
            format!("You lost {}.", ctx.stake)
        } else {
            format!("You win {}!", ctx.stake)
        };
        ctx.announce(format!(
            "You called {}. The coin landed on {landed}. {verdict}",
            self.call
        ));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::Harness;
    use arcade_types::UserId;

    #[test]
    fn test_parse_side() {
        assert_eq!("Heads".parse::<Side>(), Ok(Side::Heads));
        assert_eq!("t".parse::<Side>(), Ok(Side::Tails));
        assert!("edge".parse::<Side>().is_err());
    }

    #[test]
    fn test_even_money() {
        assert_eq!(resolve(Side::Heads, Side::Heads, 50), GameResult::Win(50));
        assert_eq!(resolve(Side::Heads, Side::Tails, 50), GameResult::Loss);
    }

    #[test]
    fn test_begin_resolves_immediately() {
        let mut harness = Harness::new(Box::new(CoinFlip::new(Side::Tails)), vec![UserId(1)], 20);
        let result = harness.begin();
        assert!(result.is_terminal());
        assert_eq!(harness.notes.len(), 1);
    }
}
