//! Work shifts: one timed minigame whose score scales the shift's pay.
//!
//! Base pay is drawn from the job's range and multiplied by the streak
//! bonus when the shift begins. The minigame then applies a tier:
//!
//! | minigame | success          | miss / timeout |
//! |----------|------------------|----------------|
//! | typing   | 1.2x under 3s, else 1x | 0.5x     |
//! | trivia   | 1.2x             | 0.5x           |
//! | reaction | 1.4x             | 0.5x           |
//! | sequence | 1.3x             | 0.5x           |

use super::{scale_bps, Context, Expectation, Game, GameError, GameResult, Input, Progress};
use super::trivia;
use crate::content::{FOODS, TYPING_WORDS, WORK_TRIVIA};
use arcade_types::casino::{
    streak_bonus_bps, Choice, JobKind, WorkGame, WORK_REACTION_WINDOW_MS, WORK_SEQUENCE_LENGTH,
    WORK_SEQUENCE_SHOW_MS, WORK_SEQUENCE_WINDOW_MS, WORK_TRIVIA_WINDOW_MS, WORK_TYPING_FAST_MS,
    WORK_TYPING_WINDOW_MS,
};
use arcade_types::{Activity, GameKind, UserId};

const FAST_TYPING_BPS: u64 = 12_000;
const TYPING_BPS: u64 = 10_000;
const TRIVIA_BPS: u64 = 12_000;
const REACTION_BPS: u64 = 14_000;
const SEQUENCE_BPS: u64 = 13_000;
const MISS_BPS: u64 = 5_000;

enum Minigame {
    Typing {
        word: &'static str,
    },
    Trivia {
        question: usize,
    },
    Reaction,
    Sequence {
        sequence: [usize; WORK_SEQUENCE_LENGTH],
        picked: Vec<usize>,
        /// Set while the sequence is on screen.
        show_until: Option<u64>,
    },
}

pub struct Shift {
    job: JobKind,
    streak: u32,
    pay: u64,
    minigame: Option<Minigame>,
}

impl Shift {
    /// A shift for `job`, counted as day `streak` of the user's streak.
    pub fn new(job: JobKind, streak: u32) -> Self {
        Self {
            job,
            streak,
            pay: 0,
            minigame: None,
        }
    }
}

fn finish(ctx: &mut Context<'_>, job: JobKind, pay: u64, bps: u64, verdict: &str) -> GameResult {
    let earned = scale_bps(pay, bps);
    ctx.announce(format!("{verdict} You earned {earned} as a {}.", job.job().display));
    GameResult::Reward(earned)
}

impl Game for Shift {
    fn kind(&self) -> GameKind {
        GameKind::Work
    }

    fn activity(&self) -> Activity {
        Activity::Work(self.job)
    }

    fn begin(&mut self, ctx: &mut Context<'_>) -> GameResult {
        let job = self.job.job();
        let (lo, hi) = job.base_pay;
        self.pay = scale_bps(ctx.rng.range_inclusive(lo, hi), streak_bonus_bps(self.streak));

        let kind = match job.minigame {
            WorkGame::Random => WorkGame::CONCRETE[ctx.rng.pick(WorkGame::CONCRETE.len())],
            kind => kind,
        };
        let minigame = match kind {
            WorkGame::Typing => {
                let word = TYPING_WORDS[ctx.rng.pick(TYPING_WORDS.len())];
                ctx.rearm(WORK_TYPING_WINDOW_MS);
                ctx.announce(format!("Type the word: `{word}`\nYou have 10 seconds!"));
                Minigame::Typing { word }
            }
            WorkGame::Trivia => {
                let question = ctx.rng.pick(WORK_TRIVIA.len());
                ctx.rearm(WORK_TRIVIA_WINDOW_MS);
                let q = &WORK_TRIVIA[question];
                ctx.present(
                    format!("Trivia: {}\nYou have 15 seconds!", q.text),
                    trivia::choices("work", q),
                );
                Minigame::Trivia { question }
            }
            WorkGame::Reaction => {
                ctx.rearm(WORK_REACTION_WINDOW_MS);
                ctx.present(
                    "A donation just came in! Click the button ASAP!",
                    vec![Choice::new("work:claim", "Claim donation!")],
                );
                Minigame::Reaction
            }
            WorkGame::Sequence | WorkGame::Random => {
                let sequence = [(); WORK_SEQUENCE_LENGTH].map(|_| ctx.rng.pick(FOODS.len()));
                let shown: Vec<&str> = sequence.iter().map(|&i| FOODS[i]).collect();
                ctx.rearm(WORK_SEQUENCE_SHOW_MS + WORK_SEQUENCE_WINDOW_MS);
                ctx.announce(format!(
                    "Memorize this sequence: {}\nYou have 6 seconds...",
                    shown.join(" ")
                ));
                Minigame::Sequence {
                    sequence,
                    picked: Vec::with_capacity(WORK_SEQUENCE_LENGTH),
                    show_until: Some(ctx.now_ms.saturating_add(WORK_SEQUENCE_SHOW_MS)),
                }
            }
        };
        self.minigame = Some(minigame);
        GameResult::Continue
    }

    fn expected(&self, participants: &[UserId]) -> Expectation {
        let worker: Vec<UserId> = participants.iter().take(1).copied().collect();
        match &self.minigame {
            Some(Minigame::Typing { .. }) => Expectation::text(worker),
            Some(Minigame::Sequence {
                show_until: Some(_),
                ..
            })
            | None => Expectation::none(),
            Some(_) => Expectation::buttons(worker),
        }
    }

    fn on_input(
        &mut self,
        ctx: &mut Context<'_>,
        _actor: UserId,
        input: Input<'_>,
    ) -> Result<GameResult, GameError> {
        let (job, pay) = (self.job, self.pay);
        let minigame = self.minigame.as_mut().ok_or(GameError::InvalidState)?;
        match (minigame, input) {
            (Minigame::Typing { word }, Input::Text(text)) => {
                if !text.trim().eq_ignore_ascii_case(*word) {
                    return Ok(GameResult::Continue);
                }
                let elapsed = ctx.now_ms.saturating_sub(ctx.started_at_ms);
                if elapsed < WORK_TYPING_FAST_MS {
                    Ok(finish(ctx, job, pay, FAST_TYPING_BPS, "Lightning fast!"))
                } else {
                    Ok(finish(ctx, job, pay, TYPING_BPS, "Success!"))
                }
            }
            (Minigame::Trivia { question }, Input::Button(arg)) => {
                let q = WORK_TRIVIA.get(*question).ok_or(GameError::InvalidState)?;
                if trivia::answer_index(arg, q)? == q.correct {
                    Ok(finish(ctx, job, pay, TRIVIA_BPS, "Correct!"))
                } else {
                    Ok(finish(ctx, job, pay, MISS_BPS, "Wrong."))
                }
            }
            (Minigame::Reaction, Input::Button("claim")) => {
                Ok(finish(ctx, job, pay, REACTION_BPS, "Claimed!"))
            }
            (
                Minigame::Sequence {
                    sequence,
                    picked,
                    show_until: None,
                },
                Input::Button(arg),
            ) => {
                let index: usize = arg
                    .strip_prefix("food:")
                    .and_then(|i| i.parse().ok())
                    .filter(|&i| i < FOODS.len())
                    .ok_or(GameError::InvalidPayload)?;
                let worker = ctx.participant(0)?;
                picked.push(index);
                ctx.whisper(worker, format!("You picked {}", FOODS[index]));
                if picked.len() < WORK_SEQUENCE_LENGTH {
                    return Ok(GameResult::Continue);
                }
                if picked.as_slice() == sequence.as_slice() {
                    Ok(finish(ctx, job, pay, SEQUENCE_BPS, "Correct order!"))
                } else {
                    let answer: Vec<&str> = sequence.iter().map(|&i| FOODS[i]).collect();
                    let verdict = format!("Wrong order. The sequence was {}.", answer.join(" "));
                    Ok(finish(ctx, job, pay, MISS_BPS, &verdict))
                }
            }
            (Minigame::Sequence { .. }, _) => Err(GameError::InvalidMove),
            _ => Err(GameError::InvalidPayload),
        }
    }

    fn on_deadline(&mut self, ctx: &mut Context<'_>) -> GameResult {
        finish(ctx, self.job, self.pay, MISS_BPS, "Too slow!")
    }

    fn timer_at(&self) -> Option<u64> {
        match &self.minigame {
            Some(Minigame::Sequence { show_until, .. }) => *show_until,
            _ => None,
        }
    }

    fn on_timer(&mut self, ctx: &mut Context<'_>) -> GameResult {
        if let Some(Minigame::Sequence { show_until, .. }) = self.minigame.as_mut() {
            *show_until = None;
            ctx.rearm(WORK_SEQUENCE_WINDOW_MS);
            let choices = FOODS
                .iter()
                .enumerate()
                .map(|(i, food)| Choice::new(format!("work:food:{i}"), *food))
                .collect();
            ctx.present("Pick the sequence in order! You have 30 seconds.", choices);
        }
        GameResult::Continue
    }

    fn progress(&self) -> Option<Progress> {
        Some(Progress {
            job: self.job,
            streak: self.streak,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::{Harness, SEED};
    use crate::rng::GameRng;

    const WORKER: UserId = UserId(9);

    /// Pay drawn by a harness shift: the first rng draw is the base pay.
    fn drawn_pay(job: JobKind, streak: u32) -> u64 {
        let (lo, hi) = job.job().base_pay;
        let base = GameRng::new(&SEED, 1, 0).range_inclusive(lo, hi);
        scale_bps(base, streak_bonus_bps(streak))
    }

    fn started(job: JobKind, streak: u32) -> Harness {
        let mut harness = Harness::new(Box::new(Shift::new(job, streak)), vec![WORKER], 0);
        assert_eq!(harness.begin(), GameResult::Continue);
        harness
    }

    fn prompt_word(harness: &Harness) -> String {
        let text = &harness.notes[0].text;
        let start = text.find('`').unwrap() + 1;
        let end = start + text[start..].find('`').unwrap();
        text[start..end].to_string()
    }

    fn reward(result: GameResult) -> u64 {
        match result {
            GameResult::Reward(amount) => amount,
            other => panic!("expected a reward, got {other:?}"),
        }
    }

    #[test]
    fn test_streak_scales_base_pay() {
        for streak in [0, 1, 5, 10, 14] {
            let mut harness = started(JobKind::Programmer, streak);
            let expected = scale_bps(drawn_pay(JobKind::Programmer, streak), MISS_BPS);
            assert_eq!(harness.expire(), GameResult::Reward(expected), "streak {streak}");
        }
        assert_eq!(drawn_pay(JobKind::Cashier, 14), drawn_pay(JobKind::Cashier, 10));
        assert!(drawn_pay(JobKind::Cashier, 5) > drawn_pay(JobKind::Cashier, 0));
    }

    #[test]
    fn test_fast_typing_earns_top_tier() {
        let mut harness = started(JobKind::Cashier, 0);
        assert_eq!(harness.expected(), Expectation::text(vec![WORKER]));
        let word = prompt_word(&harness);
        let pay = drawn_pay(JobKind::Cashier, 0);

        assert_eq!(harness.type_text(WORKER, "not it"), Ok(GameResult::Continue));
        harness.advance(WORK_TYPING_FAST_MS - 1);
        let earned = reward(harness.type_text(WORKER, &word.to_uppercase()).unwrap());
        assert_eq!(earned, scale_bps(pay, FAST_TYPING_BPS));
    }

    #[test]
    fn test_slow_typing_earns_base() {
        let mut harness = started(JobKind::Chef, 0);
        let word = prompt_word(&harness);
        let pay = drawn_pay(JobKind::Chef, 0);
        harness.advance(WORK_TYPING_FAST_MS);
        assert_eq!(harness.type_text(WORKER, &word), Ok(GameResult::Reward(pay)));
    }

    #[test]
    fn test_trivia_tiers() {
        let mut harness = started(JobKind::Programmer, 0);
        let pay = drawn_pay(JobKind::Programmer, 0);
        // Work trivia always lists the right answer first.
        assert_eq!(
            harness.press(WORKER, "0"),
            Ok(GameResult::Reward(scale_bps(pay, TRIVIA_BPS)))
        );

        let mut harness = started(JobKind::Programmer, 0);
        assert_eq!(
            harness.press(WORKER, "2"),
            Ok(GameResult::Reward(scale_bps(pay, MISS_BPS)))
        );
    }

    #[test]
    fn test_timeout_pays_half() {
        let mut harness = started(JobKind::Programmer, 3);
        let pay = drawn_pay(JobKind::Programmer, 3);
        assert_eq!(harness.expire(), GameResult::Reward(scale_bps(pay, MISS_BPS)));
        assert_eq!(
            harness.game.progress(),
            Some(Progress {
                job: JobKind::Programmer,
                streak: 3
            })
        );
    }

    #[test]
    fn test_sequence_reveals_buttons_after_show() {
        let mut shift = Shift::new(JobKind::Athlete, 0);
        shift.pay = 1_000;
        let sequence = [4, 0, 2];
        shift.minigame = Some(Minigame::Sequence {
            sequence,
            picked: Vec::new(),
            show_until: Some(1_000_000 + WORK_SEQUENCE_SHOW_MS),
        });
        let mut harness = Harness::new(Box::new(shift), vec![WORKER], 0);
        assert_eq!(harness.expected(), Expectation::none());
        assert_eq!(harness.press(WORKER, "food:4"), Err(GameError::InvalidMove));

        assert_eq!(harness.fire_timer(), GameResult::Continue);
        assert_eq!(harness.deadline_ms, harness.now_ms + WORK_SEQUENCE_WINDOW_MS);
        assert_eq!(harness.expected(), Expectation::buttons(vec![WORKER]));

        for food in &sequence[..2] {
            assert_eq!(harness.press(WORKER, &format!("food:{food}")), Ok(GameResult::Continue));
        }
        assert_eq!(harness.press(WORKER, "food:2"), Ok(GameResult::Reward(1_300)));
    }

    #[test]
    fn test_wrong_sequence_pays_half() {
        let mut shift = Shift::new(JobKind::Athlete, 0);
        shift.pay = 1_000;
        shift.minigame = Some(Minigame::Sequence {
            sequence: [1, 1, 1],
            picked: Vec::new(),
            show_until: None,
        });
        let mut harness = Harness::new(Box::new(shift), vec![WORKER], 0);
        harness.press(WORKER, "food:1").unwrap();
        harness.press(WORKER, "food:3").unwrap();
        assert_eq!(harness.press(WORKER, "food:1"), Ok(GameResult::Reward(500)));
    }

    #[test]
    fn test_reaction_claim() {
        let mut shift = Shift::new(JobKind::Athlete, 0);
        shift.pay = 100;
        shift.minigame = Some(Minigame::Reaction);
        let mut harness = Harness::new(Box::new(shift), vec![WORKER], 0);
        assert_eq!(harness.press(WORKER, "nope"), Err(GameError::InvalidPayload));
        assert_eq!(harness.press(WORKER, "claim"), Ok(GameResult::Reward(140)));
    }
}
