//! Guess a number from 1 to 10.

use super::{Context, Game, GameResult};
use arcade_types::casino::GUESS_RANGE_MAX;
use arcade_types::{Activity, GameKind};

pub fn resolve(guess: u8, drawn: u8, stake: u64) -> GameResult {
    match guess.abs_diff(drawn) {
        0 => GameResult::Win(stake.saturating_mul(5)),
        1 => GameResult::Win(stake.saturating_mul(2)),
        _ => GameResult::Loss,
    }
}

pub struct GuessNumber {
    guess: u8,
}

impl GuessNumber {
    pub fn new(raw: &str) -> Result<Self, String> {
        let guess: u8 = raw
            .trim()
            .parse()
            .map_err(|_| format!("guess must be a number, got {raw:?}"))?;
        if !(1..=GUESS_RANGE_MAX).contains(&guess) {
            return Err(format!("guess must be between 1 and {GUESS_RANGE_MAX}"));
        }
        Ok(Self { guess })
    }
}

impl Game for GuessNumber {
    fn kind(&self) -> GameKind {
        GameKind::GuessNumber
    }

    fn activity(&self) -> Activity {
        Activity::GuessNumber
    }

    fn begin(&mut self, ctx: &mut Context<'_>) -> GameResult {
        let drawn = ctx.rng.next_bounded(GUESS_RANGE_MAX) + 1;
        let result = resolve(self.guess, drawn, ctx.stake);
        let verdict = match &result {
            GameResult::Win(amount) => format!("You won {amount}!"),
            _ => format!("You lost {}.", ctx.stake),
        };
        ctx.announce(format!(
            "You guessed {}, the number was {drawn}. {verdict}",
            self.guess
        ));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payout_buckets() {
        assert_eq!(resolve(4, 4, 10), GameResult::Win(50));
        assert_eq!(resolve(4, 5, 10), GameResult::Win(20));
        assert_eq!(resolve(5, 4, 10), GameResult::Win(20));
        assert_eq!(resolve(1, 10, 10), GameResult::Loss);
    }

    #[test]
    fn test_guess_must_be_in_range() {
        assert!(GuessNumber::new("0").is_err());
        assert!(GuessNumber::new("11").is_err());
        assert!(GuessNumber::new("seven").is_err());
        assert!(GuessNumber::new(" 7 ").is_ok());
    }
}
