//! Two-dice roll against a fixed payout table.
//!
//! | Roll            | Net credit |
//! |-----------------|------------|
//! | Doubles         | 4x stake   |
//! | Total 7 or 11   | 3x stake   |
//! | Total 9-12      | 2x stake   |
//! | Anything else   | lose stake |

use super::{Context, Game, GameResult};
use arcade_types::{Activity, GameKind};

/// Net multiplier for a roll, or `None` on a losing roll.
pub fn multiplier(d1: u8, d2: u8) -> Option<u64> {
    let total = d1 + d2;
    if d1 == d2 {
        Some(4)
    } else if total == 7 || total == 11 {
        Some(3)
    } else if total >= 9 {
        Some(2)
    } else {
        None
    }
}

pub fn resolve(d1: u8, d2: u8, stake: u64) -> GameResult {
    match multiplier(d1, d2) {
        Some(m) => GameResult::Win(stake.saturating_mul(m)),
        None => GameResult::Loss,
    }
}

pub struct Dice;

impl Game for Dice {
    fn kind(&self) -> GameKind {
        GameKind::Dice
    }

    fn activity(&self) -> Activity {
        Activity::Dice
    }

    fn begin(&mut self, ctx: &mut Context<'_>) -> GameResult {
        let (d1, d2) = (ctx.rng.roll_die(), ctx.rng.roll_die());
        let result = resolve(d1, d2, ctx.stake);
        let verdict = match &result {
            GameResult::Win(amount) => format!("You won {amount}!"),
            _ => format!("You lost {}.", ctx.stake),
        };
        ctx.announce(format!("You rolled {d1} and {d2} ({}). {verdict}", d1 + d2));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubles_take_priority() {
        assert_eq!(multiplier(6, 6), Some(4));
        assert_eq!(multiplier(1, 1), Some(4));
    }

    #[test]
    fn test_lucky_and_high_rolls() {
        assert_eq!(multiplier(3, 4), Some(3));
        assert_eq!(multiplier(5, 6), Some(3));
        assert_eq!(multiplier(4, 5), Some(2));
        assert_eq!(multiplier(4, 6), Some(2));
    }

    #[test]
    fn test_low_roll_loses() {
        assert_eq!(multiplier(1, 2), None);
        assert_eq!(multiplier(2, 6), None);
        assert_eq!(resolve(1, 3, 10), GameResult::Loss);
        assert_eq!(resolve(3, 3, 10), GameResult::Win(40));
    }
}
