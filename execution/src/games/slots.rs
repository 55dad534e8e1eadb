//! Three-reel slots.

use super::{Context, Game, GameResult};
use arcade_types::{Activity, GameKind};

pub const SYMBOLS: [&str; 6] = ["🍒", "🍋", "🍊", "🍇", "💎", "7️⃣"];
const DIAMOND: u8 = 4;
const SEVEN: u8 = 5;

/// Net multiplier for three reels (indices into [`SYMBOLS`]), or `None` on no match.
pub fn multiplier(reels: [u8; 3]) -> Option<u64> {
    let [a, b, c] = reels;
    if a == b && b == c {
        Some(match a {
            SEVEN => 20,
            DIAMOND => 10,
            _ => 5,
        })
    } else if a == b || b == c || a == c {
        Some(2)
    } else {
        None
    }
}

pub struct Slots;

impl Game for Slots {
    fn kind(&self) -> GameKind {
        GameKind::Slots
    }

    fn activity(&self) -> Activity {
        Activity::Slots
    }

    fn begin(&mut self, ctx: &mut Context<'_>) -> GameResult {
        let reels = [(); 3].map(|_| ctx.rng.next_bounded(SYMBOLS.len() as u8));
        let shown: Vec<&str> = reels.iter().map(|&r| SYMBOLS[r as usize]).collect();
        let (result, verdict) = match multiplier(reels) {
            Some(m) => {
                let won = ctx.stake.saturating_mul(m);
                (GameResult::Win(won), format!("You won {won} ({m}x your bet)!"))
            }
            None => (GameResult::Loss, format!("You lost {}.", ctx.stake)),
        };
        ctx.announce(format!("{} {verdict}", shown.join(" | ")));
        result
    }
}
