//! Rock-paper-scissors against the house.

use super::{Context, Expectation, Game, GameError, GameResult, Input};
use arcade_types::casino::{Choice, RPS_WINDOW_MS};
use arcade_types::{Activity, GameKind, UserId};
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hand {
    Rock,
    Paper,
    Scissors,
}

impl Hand {
    pub const ALL: [Hand; 3] = [Hand::Rock, Hand::Paper, Hand::Scissors];

    fn beats(self, other: Hand) -> bool {
        matches!(
            (self, other),
            (Hand::Rock, Hand::Scissors) | (Hand::Paper, Hand::Rock) | (Hand::Scissors, Hand::Paper)
        )
    }
}

impl FromStr for Hand {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rock" => Ok(Hand::Rock),
            "paper" => Ok(Hand::Paper),
            "scissors" => Ok(Hand::Scissors),
            _ => Err(GameError::InvalidPayload),
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hand::Rock => f.write_str("rock"),
            Hand::Paper => f.write_str("paper"),
            Hand::Scissors => f.write_str("scissors"),
        }
    }
}

/// A win pays twice the stake, a tie returns it.
pub fn resolve(player: Hand, house: Hand, stake: u64) -> GameResult {
    if player == house {
        GameResult::Push
    } else if player.beats(house) {
        GameResult::Win(stake.saturating_mul(2))
    } else {
        GameResult::Loss
    }
}

#[derive(Default)]
pub struct Rps;

impl Rps {
    pub fn new() -> Self {
        Self
    }
}

impl Game for Rps {
    fn kind(&self) -> GameKind {
        GameKind::Rps
    }

    fn activity(&self) -> Activity {
        Activity::Rps
    }

    fn begin(&mut self, ctx: &mut Context<'_>) -> GameResult {
        ctx.rearm(RPS_WINDOW_MS);
        let choices = Hand::ALL
            .iter()
            .map(|hand| Choice::new(format!("rps:{hand}"), hand.to_string()))
            .collect();
        ctx.present("Rock, paper or scissors? You have 15 seconds.", choices);
        GameResult::Continue
    }

    fn expected(&self, participants: &[UserId]) -> Expectation {
        Expectation::buttons(participants.iter().take(1).copied().collect())
    }

    fn on_input(
        &mut self,
        ctx: &mut Context<'_>,
        _actor: UserId,
        input: Input<'_>,
    ) -> Result<GameResult, GameError> {
        let Input::Button(arg) = input else {
            return Err(GameError::InvalidPayload);
        };
        let player: Hand = arg.parse()?;
        let house = Hand::ALL[ctx.rng.pick(Hand::ALL.len())];
        let result = resolve(player, house, ctx.stake);
        let verdict = match &result {
            GameResult::Win(amount) => format!("You win {amount}!"),
            GameResult::Push => "Tie! You keep your bet.".to_string(),
            _ => format!("You lose {}.", ctx.stake),
        };
        ctx.announce(format!("You threw {player}, the house threw {house}. {verdict}"));
        Ok(result)
    }

    fn on_deadline(&mut self, ctx: &mut Context<'_>) -> GameResult {
        ctx.announce("No throw in time. The game is cancelled.");
        GameResult::Push
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::Harness;

    #[test]
    fn test_outcome_table() {
        assert_eq!(resolve(Hand::Rock, Hand::Scissors, 10), GameResult::Win(20));
        assert_eq!(resolve(Hand::Paper, Hand::Paper, 10), GameResult::Push);
        assert_eq!(resolve(Hand::Scissors, Hand::Rock, 10), GameResult::Loss);
    }

    #[test]
    fn test_bad_throw_is_rejected_without_resolving() {
        let mut harness = Harness::new(Box::new(Rps::new()), vec![UserId(1)], 10);
        assert_eq!(harness.begin(), GameResult::Continue);
        assert_eq!(harness.deadline_ms, harness.now_ms + RPS_WINDOW_MS);
        assert_eq!(
            harness.press(UserId(1), "lizard"),
            Err(GameError::InvalidPayload)
        );
        assert!(harness.press(UserId(1), "rock").unwrap().is_terminal());
    }

    #[test]
    fn test_timeout_is_push() {
        let mut harness = Harness::new(Box::new(Rps::new()), vec![UserId(1)], 10);
        harness.begin();
        assert_eq!(harness.expire(), GameResult::Push);
    }
}
