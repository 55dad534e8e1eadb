//! Channel-wide quiz over a named set.
//!
//! Each round shows a clue with the answer shuffled among decoys drawn from
//! the same set. Anyone in the channel may answer once per round; the answer
//! and the users who got it are revealed when the round's window closes.
//! Nobody is paid and nothing is staked, so the quiz always settles `Void`.

use super::{Context, Expectation, Game, GameError, GameResult, Input};
use crate::content::{quiz_set, QuizSet};
use arcade_types::casino::{Choice, GROUP_QUIZ_CHOICES, GROUP_QUIZ_ROUND_MS};
use arcade_types::{Activity, GameKind, UserId};

pub struct GroupQuiz {
    set: &'static QuizSet,
    round: usize,
    choices: Vec<&'static str>,
    guesses: Vec<(UserId, usize)>,
}

impl GroupQuiz {
    pub fn new(set: &str) -> Result<Self, String> {
        let set = quiz_set(set).ok_or_else(|| format!("unknown quiz set {}", set.trim()))?;
        if set.entries.is_empty() {
            return Err(format!("quiz set {} is empty", set.name));
        }
        Ok(Self {
            set,
            round: 0,
            choices: Vec::new(),
            guesses: Vec::new(),
        })
    }

    fn finished(&self) -> bool {
        self.round >= self.set.entries.len()
    }

    fn start_round(&mut self, ctx: &mut Context<'_>) {
        let entry = &self.set.entries[self.round];
        let mut decoys: Vec<&'static str> = self
            .set
            .entries
            .iter()
            .map(|other| other.answer)
            .filter(|&answer| answer != entry.answer)
            .collect();
        ctx.rng.shuffle(&mut decoys);
        decoys.truncate(GROUP_QUIZ_CHOICES - 1);

        let mut choices = vec![entry.answer];
        choices.extend(decoys);
        ctx.rng.shuffle(&mut choices);
        self.choices = choices;
        self.guesses.clear();

        ctx.rearm(GROUP_QUIZ_ROUND_MS);
        ctx.present(
            format!(
                "Round {}/{}: {}\nGuess the title! The answer is revealed in {} seconds.",
                self.round + 1,
                self.set.entries.len(),
                entry.clue,
                GROUP_QUIZ_ROUND_MS / 1_000
            ),
            self.choices
                .iter()
                .enumerate()
                .map(|(index, label)| Choice::new(format!("quiz:{index}"), *label))
                .collect(),
        );
    }

    fn reveal(&self, ctx: &mut Context<'_>) -> Result<(), GameError> {
        let answer = self
            .set
            .entries
            .get(self.round)
            .ok_or(GameError::InvalidState)?
            .answer;
        let correct: Vec<String> = self
            .guesses
            .iter()
            .filter(|(_, index)| self.choices.get(*index) == Some(&answer))
            .map(|(user, _)| user.to_string())
            .collect();
        if correct.is_empty() {
            ctx.announce(format!(
                "Time's up! The answer was {answer}. No one got it right!"
            ));
        } else {
            ctx.announce(format!(
                "Time's up! The answer was {answer}. Correct: {}",
                correct.join(", ")
            ));
        }
        Ok(())
    }
}

impl Game for GroupQuiz {
    fn kind(&self) -> GameKind {
        GameKind::GroupQuiz
    }

    fn activity(&self) -> Activity {
        Activity::GroupQuiz
    }

    fn begin(&mut self, ctx: &mut Context<'_>) -> GameResult {
        ctx.announce(format!("Starting the quiz for {}!", self.set.name));
        self.start_round(ctx);
        GameResult::Continue
    }

    fn expected(&self, _participants: &[UserId]) -> Expectation {
        if self.finished() {
            Expectation::none()
        } else {
            Expectation::open_buttons()
        }
    }

    fn on_input(
        &mut self,
        ctx: &mut Context<'_>,
        actor: UserId,
        input: Input<'_>,
    ) -> Result<GameResult, GameError> {
        if self.finished() {
            return Err(GameError::GameAlreadyComplete);
        }
        let Input::Button(arg) = input else {
            return Err(GameError::InvalidPayload);
        };
        let index: usize = arg.parse().map_err(|_| GameError::InvalidPayload)?;
        if index >= self.choices.len() {
            return Err(GameError::InvalidPayload);
        }
        if self.guesses.iter().any(|(user, _)| *user == actor) {
            return Err(GameError::AlreadyAnswered);
        }
        self.guesses.push((actor, index));
        ctx.whisper(actor, "Your guess has been recorded!");
        Ok(GameResult::Continue)
    }

    fn on_deadline(&mut self, ctx: &mut Context<'_>) -> GameResult {
        if self.reveal(ctx).is_err() {
            return GameResult::Void;
        }
        self.round += 1;
        if self.finished() {
            ctx.announce("Quiz complete! Thanks for playing!");
            return GameResult::Void;
        }
        self.start_round(ctx);
        GameResult::Continue
    }

    fn on_shutdown(&mut self, ctx: &mut Context<'_>) -> GameResult {
        ctx.announce("The quiz was stopped.");
        GameResult::Void
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::Harness;
    use arcade_types::casino::Audience;

    const HOST: UserId = UserId(1);

    fn started(set: &str) -> Harness {
        let quiz = GroupQuiz::new(set).unwrap();
        let mut harness = Harness::new(Box::new(quiz), vec![HOST], 0);
        assert_eq!(harness.begin(), GameResult::Continue);
        harness
    }

    /// Index of the correct button in the latest round prompt.
    fn correct_index(harness: &Harness, set: &str) -> usize {
        let prompt = harness
            .notes
            .iter()
            .rev()
            .find(|note| !note.choices.is_empty())
            .unwrap();
        let entry = quiz_set(set)
            .unwrap()
            .entries
            .iter()
            .find(|entry| prompt.text.contains(entry.clue))
            .unwrap();
        prompt
            .choices
            .iter()
            .position(|choice| choice.label == entry.answer)
            .unwrap()
    }

    #[test]
    fn test_unknown_set_is_rejected() {
        assert!(GroupQuiz::new("set9").is_err());
        assert!(GroupQuiz::new(" SET2 ").is_ok());
    }

    #[test]
    fn test_round_offers_answer_among_distinct_decoys() {
        let harness = started("set1");
        let prompt = harness.notes.last().unwrap();
        assert!(prompt.text.starts_with("Round 1/5"));
        assert_eq!(prompt.choices.len(), GROUP_QUIZ_CHOICES);
        let mut labels: Vec<&str> = prompt.choices.iter().map(|c| c.label.as_str()).collect();
        assert!(labels.contains(&"Naruto"));
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), GROUP_QUIZ_CHOICES);
        assert_eq!(harness.deadline_ms, harness.now_ms + GROUP_QUIZ_ROUND_MS);
    }

    #[test]
    fn test_anyone_may_answer_once_per_round() {
        let mut harness = started("set1");
        assert!(harness.expected().open);
        assert!(harness
            .expected()
            .admits(UserId(42), arcade_types::casino::InteractionKind::Button));

        assert_eq!(harness.press(UserId(2), "0"), Ok(GameResult::Continue));
        assert_eq!(harness.press(UserId(2), "1"), Err(GameError::AlreadyAnswered));
        assert_eq!(harness.press(UserId(3), "1"), Ok(GameResult::Continue));
        assert_eq!(harness.press(UserId(4), "4"), Err(GameError::InvalidPayload));
        assert_eq!(
            harness.type_text(UserId(4), "Naruto"),
            Err(GameError::InvalidPayload)
        );
        assert!(harness
            .notes
            .iter()
            .any(|note| note.audience == Audience::Private(UserId(2))));
    }

    #[test]
    fn test_deadline_reveals_and_starts_next_round() {
        let mut harness = started("set1");
        let correct = correct_index(&harness, "set1");
        let wrong = (correct + 1) % GROUP_QUIZ_CHOICES;
        harness.press(UserId(2), &correct.to_string()).unwrap();
        harness.press(UserId(3), &wrong.to_string()).unwrap();

        assert_eq!(harness.expire(), GameResult::Continue);
        let reveal = harness
            .notes
            .iter()
            .find(|note| note.text.starts_with("Time's up!"))
            .unwrap();
        assert!(reveal.text.contains("Naruto"));
        assert!(reveal.text.contains(&UserId(2).to_string()));
        assert!(!reveal.text.contains(&UserId(3).to_string()));

        assert!(harness.notes.last().unwrap().text.starts_with("Round 2/5"));
        assert_eq!(harness.deadline_ms, harness.now_ms + GROUP_QUIZ_ROUND_MS);
        // Guesses reset with the round.
        assert_eq!(harness.press(UserId(2), "0"), Ok(GameResult::Continue));
    }

    #[test]
    fn test_last_round_ends_void() {
        let mut harness = started("set2");
        for _ in 0..3 {
            assert_eq!(harness.expire(), GameResult::Continue);
        }
        assert_eq!(harness.expire(), GameResult::Void);
        assert!(harness.notes.last().unwrap().text.contains("Quiz complete"));
        assert_eq!(harness.expected(), Expectation::none());
        assert_eq!(harness.press(UserId(2), "0"), Err(GameError::GameAlreadyComplete));
    }

    #[test]
    fn test_shutdown_stops_mid_round() {
        let mut harness = started("set3");
        harness.press(UserId(2), "0").unwrap();
        assert_eq!(harness.shut_down(), GameResult::Void);
    }
}
