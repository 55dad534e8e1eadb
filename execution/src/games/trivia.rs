//! Stake-free trivia question.

use super::{Context, Expectation, Game, GameError, GameResult, Input};
use crate::content::{Question, TRIVIA};
use arcade_types::casino::{
    Choice, TRIVIA_CORRECT_BONUS, TRIVIA_PARTICIPATION_REWARD, TRIVIA_WINDOW_MS,
};
use arcade_types::{Activity, GameKind, UserId};

/// Parse a `<index>` answer against a question.
pub(crate) fn answer_index(arg: &str, question: &Question) -> Result<usize, GameError> {
    let index: usize = arg.parse().map_err(|_| GameError::InvalidPayload)?;
    if index >= question.choices.len() {
        return Err(GameError::InvalidPayload);
    }
    Ok(index)
}

pub(crate) fn choices(prefix: &str, question: &Question) -> Vec<Choice> {
    question
        .choices
        .iter()
        .enumerate()
        .map(|(index, label)| Choice::new(format!("{prefix}:{index}"), *label))
        .collect()
}

#[derive(Default)]
pub struct Trivia {
    question: Option<usize>,
}

impl Trivia {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Game for Trivia {
    fn kind(&self) -> GameKind {
        GameKind::Trivia
    }

    fn activity(&self) -> Activity {
        Activity::Trivia
    }

    fn begin(&mut self, ctx: &mut Context<'_>) -> GameResult {
        let index = ctx.rng.pick(TRIVIA.len());
        self.question = Some(index);
        let question = &TRIVIA[index];
        ctx.rearm(TRIVIA_WINDOW_MS);
        ctx.present(
            format!(
                "{}\nCorrect answer: +{}, wrong answer: +{}. You have 15 seconds.",
                question.text,
                TRIVIA_PARTICIPATION_REWARD + TRIVIA_CORRECT_BONUS,
                TRIVIA_PARTICIPATION_REWARD
            ),
            choices("trivia", question),
        );
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
        let question = TRIVIA
            .get(self.question.ok_or(GameError::InvalidState)?)
            .ok_or(GameError::InvalidState)?;
        let Input::Button(arg) = input else {
            return Err(GameError::InvalidPayload);
        };
        let index = answer_index(arg, question)?;
        if index == question.correct {
            let reward = TRIVIA_PARTICIPATION_REWARD + TRIVIA_CORRECT_BONUS;
            ctx.announce(format!("Correct! You earned {reward}."));
            Ok(GameResult::Reward(reward))
        } else {
            ctx.announce(format!(
                "Wrong! The answer was {}. You still earned {TRIVIA_PARTICIPATION_REWARD} for trying.",
                question.choices[question.correct]
            ));
            Ok(GameResult::Reward(TRIVIA_PARTICIPATION_REWARD))
        }
    }

    fn on_deadline(&mut self, ctx: &mut Context<'_>) -> GameResult {
        ctx.announce("Time's up! No reward this round.");
        GameResult::Push
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::Harness;

    fn started() -> (Harness, usize) {
        let mut harness = Harness::new(Box::new(Trivia::new()), vec![UserId(1)], 0);
        assert_eq!(harness.begin(), GameResult::Continue);
        let prompt = harness.notes.last().unwrap();
        let correct = TRIVIA
            .iter()
            .find(|q| prompt.text.starts_with(q.text))
            .unwrap()
            .correct;
        (harness, correct)
    }

    #[test]
    fn test_correct_answer_pays_bonus() {
        let (mut harness, correct) = started();
        let result = harness.press(UserId(1), &correct.to_string()).unwrap();
        assert_eq!(result, GameResult::Reward(150));
    }

    #[test]
    fn test_wrong_answer_pays_participation() {
        let (mut harness, correct) = started();
        let wrong = (correct + 1) % 4;
        let result = harness.press(UserId(1), &wrong.to_string()).unwrap();
        assert_eq!(result, GameResult::Reward(50));
    }

    #[test]
    fn test_out_of_range_answer_is_rejected() {
        let (mut harness, _) = started();
        assert_eq!(harness.press(UserId(1), "4"), Err(GameError::InvalidPayload));
        assert_eq!(harness.expire(), GameResult::Push);
    }
}
