//! Memory: flip cards two at a time to find every pair.

use super::{scale_bps, Context, Expectation, Game, GameError, GameResult, Input};
use crate::rng::GameRng;
use arcade_types::casino::{
    Choice, MEMORY_FAST_FINISH_MS, MEMORY_GRID, MEMORY_HIDE_DELAY_MS, MEMORY_PAIRS,
    MEMORY_TIMEOUT_MS,
};
use arcade_types::{Activity, GameKind, UserId};

pub const CARDS: usize = MEMORY_GRID * MEMORY_GRID;
const FACES: [&str; MEMORY_PAIRS] = ["🍎", "🍌", "🍇", "🍓", "🍒", "🍑", "🍍", "🥝"];
const HIDDEN: &str = "❓";

/// Payout multiplier in basis points for finishing in `moves` after `elapsed_ms`.
pub fn payout_bps(moves: u32, elapsed_ms: u64) -> u64 {
    let efficiency = match moves {
        0..=8 => 10_000,
        9..=11 => 5_000,
        _ => 0,
    };
    let speed = if elapsed_ms < MEMORY_FAST_FINISH_MS { 5_000 } else { 0 };
    20_000 + efficiency + speed
}

/// Shuffled deck holding each face exactly twice.
pub fn deal(rng: &mut GameRng) -> [u8; CARDS] {
    let mut deck = [0u8; CARDS];
    for (slot, card) in deck.iter_mut().enumerate() {
        *card = (slot / 2) as u8;
    }
    rng.shuffle(&mut deck);
    deck
}

pub struct Memory {
    deck: Option<[u8; CARDS]>,
    matched: [bool; CARDS],
    first: Option<usize>,
    /// Mismatched pair left face up until `hide_at`.
    shown: Option<(usize, usize)>,
    hide_at: Option<u64>,
    moves: u32,
    pairs: usize,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Self {
            deck: None,
            matched: [false; CARDS],
            first: None,
            shown: None,
            hide_at: None,
            moves: 0,
            pairs: 0,
        }
    }

    pub fn with_deck(deck: [u8; CARDS]) -> Self {
        Self {
            deck: Some(deck),
            ..Self::new()
        }
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    fn face_up(&self, card: usize) -> bool {
        self.matched[card]
            || self.first == Some(card)
            || matches!(self.shown, Some((a, b)) if a == card || b == card)
    }

    fn board(&self, deck: &[u8; CARDS]) -> (String, Vec<Choice>) {
        let mut text = String::new();
        let mut choices = Vec::new();
        for card in 0..CARDS {
            let glyph = if self.face_up(card) {
                FACES[deck[card] as usize % MEMORY_PAIRS]
            } else {
                HIDDEN
            };
            text.push_str(glyph);
            if card % MEMORY_GRID == MEMORY_GRID - 1 {
                text.push('\n');
            }
            if !self.face_up(card) {
                choices.push(Choice::new(format!("memory:{card}"), HIDDEN));
            }
        }
        text.push_str(&format!("Pairs {}/{MEMORY_PAIRS}, moves {}", self.pairs, self.moves));
        (text, choices)
    }

    fn show_board(&self, ctx: &mut Context<'_>, deck: &[u8; CARDS]) {
        let (text, choices) = self.board(deck);
        ctx.present(text, choices);
    }
}

impl Game for Memory {
    fn kind(&self) -> GameKind {
        GameKind::Memory
    }

    fn activity(&self) -> Activity {
        Activity::Memory
    }

    fn begin(&mut self, ctx: &mut Context<'_>) -> GameResult {
        let deck = *self.deck.get_or_insert_with(|| deal(ctx.rng));
        ctx.rearm(MEMORY_TIMEOUT_MS);
        self.show_board(ctx, &deck);
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
        let deck = self.deck.ok_or(GameError::InvalidState)?;
        let Input::Button(arg) = input else {
            return Err(GameError::InvalidPayload);
        };
        let card: usize = arg.parse().map_err(|_| GameError::InvalidPayload)?;
        if card >= CARDS {
            return Err(GameError::InvalidPayload);
        }
        // Flips during the hide delay are dropped.
        if self.hide_at.is_some() {
            return Ok(GameResult::Continue);
        }
        if self.matched[card] {
            return Err(GameError::AlreadyMatched);
        }
        if self.face_up(card) {
            return Err(GameError::AlreadyRevealed);
        }

        let Some(first) = self.first.take() else {
            self.first = Some(card);
            self.show_board(ctx, &deck);
            return Ok(GameResult::Continue);
        };

        self.moves += 1;
        if deck[first] == deck[card] {
            self.matched[first] = true;
            self.matched[card] = true;
            self.pairs += 1;
            if self.pairs == MEMORY_PAIRS {
                let elapsed = ctx.now_ms.saturating_sub(ctx.started_at_ms);
                let payout = scale_bps(ctx.stake, payout_bps(self.moves, elapsed));
                ctx.announce(format!(
                    "All pairs found in {} moves and {}s. You win {payout}!",
                    self.moves,
                    elapsed / 1_000
                ));
                return Ok(GameResult::Win(payout));
            }
        } else {
            self.shown = Some((first, card));
            self.hide_at = Some(ctx.now_ms.saturating_add(MEMORY_HIDE_DELAY_MS));
        }
        self.show_board(ctx, &deck);
        Ok(GameResult::Continue)
    }

    fn on_deadline(&mut self, ctx: &mut Context<'_>) -> GameResult {
        ctx.announce(format!(
            "Time's up with {}/{MEMORY_PAIRS} pairs. You lose {}.",
            self.pairs, ctx.stake
        ));
        GameResult::Loss
    }

    fn timer_at(&self) -> Option<u64> {
        self.hide_at
    }

    fn on_timer(&mut self, ctx: &mut Context<'_>) -> GameResult {
        self.hide_at = None;
        self.shown = None;
        if let Some(deck) = self.deck {
            self.show_board(ctx, &deck);
        }
        GameResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::{Harness, SEED};

    const PLAYER: UserId = UserId(1);

    /// Pairs sit side by side: cards 2k and 2k+1 match.
    fn ordered() -> [u8; CARDS] {
        let mut deck = [0u8; CARDS];
        for (slot, card) in deck.iter_mut().enumerate() {
            *card = (slot / 2) as u8;
        }
        deck
    }

    fn harness(stake: u64) -> Harness {
        let mut harness = Harness::new(Box::new(Memory::with_deck(ordered())), vec![PLAYER], stake);
        assert_eq!(harness.begin(), GameResult::Continue);
        harness
    }

    fn flip(harness: &mut Harness, card: usize) -> Result<GameResult, GameError> {
        harness.press(PLAYER, &card.to_string())
    }

    #[test]
    fn test_deal_holds_each_face_twice() {
        for session in 0..10 {
            let deck = deal(&mut GameRng::new(&SEED, session, 0));
            let mut counts = [0u8; MEMORY_PAIRS];
            for card in deck {
                counts[card as usize] += 1;
            }
            assert!(counts.iter().all(|&c| c == 2), "{deck:?}");
        }
    }

    #[test]
    fn test_perfect_fast_game_pays_top_multiplier() {
        let mut harness = harness(100);
        let mut last = Ok(GameResult::Continue);
        for pair in 0..MEMORY_PAIRS {
            assert_eq!(flip(&mut harness, pair * 2), Ok(GameResult::Continue));
            harness.advance(1_000);
            last = flip(&mut harness, pair * 2 + 1);
        }
        // 8 moves in 8s: 2x + 1x + 0.5x.
        assert_eq!(last, Ok(GameResult::Win(350)));
    }

    #[test]
    fn test_slow_sloppy_game_pays_base() {
        assert_eq!(payout_bps(12, MEMORY_FAST_FINISH_MS), 20_000);
        assert_eq!(payout_bps(11, MEMORY_FAST_FINISH_MS - 1), 30_000);
        assert_eq!(payout_bps(8, MEMORY_FAST_FINISH_MS), 30_000);
    }

    #[test]
    fn test_mismatch_hides_after_delay() {
        let mut harness = harness(100);
        flip(&mut harness, 0).unwrap();
        flip(&mut harness, 2).unwrap();
        assert_eq!(harness.game.timer_at(), Some(harness.now_ms + MEMORY_HIDE_DELAY_MS));

        // Third flip during the delay is dropped.
        assert_eq!(flip(&mut harness, 1), Ok(GameResult::Continue));
        assert_eq!(harness.fire_timer(), GameResult::Continue);
        assert_eq!(harness.game.timer_at(), None);

        // Card 1 is still hidden and can now be turned.
        assert_eq!(flip(&mut harness, 1), Ok(GameResult::Continue));
        assert_eq!(flip(&mut harness, 0), Ok(GameResult::Continue));
    }

    #[test]
    fn test_matched_pair_cannot_be_rematched() {
        let mut harness = harness(100);
        flip(&mut harness, 0).unwrap();
        flip(&mut harness, 1).unwrap();
        assert_eq!(flip(&mut harness, 0), Err(GameError::AlreadyMatched));
        assert_eq!(flip(&mut harness, 1), Err(GameError::AlreadyMatched));

        flip(&mut harness, 2).unwrap();
        assert_eq!(flip(&mut harness, 2), Err(GameError::AlreadyRevealed));
    }

    #[test]
    fn test_deadline_loses() {
        let mut harness = harness(100);
        flip(&mut harness, 0).unwrap();
        flip(&mut harness, 1).unwrap();
        assert_eq!(harness.expire(), GameResult::Loss);
    }
}
