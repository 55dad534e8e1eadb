//! Minefield: reveal safe cells to grow a cash-out multiplier.
//!
//! Cells are numbered row-major, `0..ROWS * COLS`. Payload arguments are a
//! cell index or `cashout`.

use super::{scale_bps, Context, Expectation, Game, GameError, GameResult, Input};
use crate::rng::GameRng;
use arcade_types::casino::{
    Choice, MINEFIELD_COLS, MINEFIELD_INCREMENT_BPS, MINEFIELD_MINES, MINEFIELD_ROWS,
    MINEFIELD_TIMEOUT_MS,
};
use arcade_types::{Activity, GameKind, UserId};

pub const CELLS: usize = MINEFIELD_ROWS * MINEFIELD_COLS;
pub const SAFE_CELLS: usize = CELLS - MINEFIELD_MINES;

/// Net credit for cashing out after `safe` safe reveals: `floor(stake * (1 + safe * 0.3))`.
pub fn cash_out_payout(stake: u64, safe: usize) -> u64 {
    let bps = 10_000 + (safe as u64).saturating_mul(MINEFIELD_INCREMENT_BPS);
    scale_bps(stake, bps)
}

/// Place `MINEFIELD_MINES` mines uniformly without replacement.
pub fn place_mines(rng: &mut GameRng) -> [bool; CELLS] {
    let mut cells: Vec<usize> = (0..CELLS).collect();
    rng.shuffle(&mut cells);
    let mut mines = [false; CELLS];
    for &cell in cells.iter().take(MINEFIELD_MINES) {
        mines[cell] = true;
    }
    mines
}

pub struct Minefield {
    mines: Option<[bool; CELLS]>,
    revealed: [bool; CELLS],
    safe: usize,
}

impl Default for Minefield {
    fn default() -> Self {
        Self::new()
    }
}

impl Minefield {
    pub fn new() -> Self {
        Self {
            mines: None,
            revealed: [false; CELLS],
            safe: 0,
        }
    }

    /// A board with a fixed mine layout.
    pub fn with_layout(mines: [bool; CELLS]) -> Self {
        Self {
            mines: Some(mines),
            ..Self::new()
        }
    }

    pub fn safe_count(&self) -> usize {
        self.safe
    }

    fn choices(&self) -> Vec<Choice> {
        let mut choices: Vec<Choice> = (0..CELLS)
            .filter(|&cell| !self.revealed[cell])
            .map(|cell| {
                let (row, col) = (cell / MINEFIELD_COLS, cell % MINEFIELD_COLS);
                Choice::new(format!("mine:{cell}"), format!("{}{}", (b'A' + row as u8) as char, col + 1))
            })
            .collect();
        if self.safe > 0 {
            choices.push(Choice::new("mine:cashout", "Cash out"));
        }
        choices
    }

    fn render(&self, mines: &[bool; CELLS], show_mines: bool) -> String {
        let mut out = String::with_capacity(CELLS * 4);
        for row in 0..MINEFIELD_ROWS {
            for col in 0..MINEFIELD_COLS {
                let cell = row * MINEFIELD_COLS + col;
                let glyph = if mines[cell] && show_mines {
                    "💣"
                } else if self.revealed[cell] {
                    "💎"
                } else {
                    "⬜"
                };
                out.push_str(glyph);
            }
            out.push('\n');
        }
        out
    }
}

impl Game for Minefield {
    fn kind(&self) -> GameKind {
        GameKind::Minefield
    }

    fn activity(&self) -> Activity {
        Activity::Minefield
    }

    fn begin(&mut self, ctx: &mut Context<'_>) -> GameResult {
        let mines = *self.mines.get_or_insert_with(|| place_mines(ctx.rng));
        ctx.rearm(MINEFIELD_TIMEOUT_MS);
        ctx.present(
            format!(
                "{MINEFIELD_MINES} mines are hidden. Each safe cell adds 0.3x.\n{}",
                self.render(&mines, false)
            ),
            self.choices(),
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
        let mines = self.mines.ok_or(GameError::InvalidState)?;
        let Input::Button(arg) = input else {
            return Err(GameError::InvalidPayload);
        };

        if arg == "cashout" {
            if self.safe == 0 {
                return Err(GameError::InvalidMove);
            }
            let payout = cash_out_payout(ctx.stake, self.safe);
            ctx.announce(format!("Cashed out after {} safe cells for {payout}.", self.safe));
            return Ok(GameResult::Win(payout));
        }

        let cell: usize = arg.parse().map_err(|_| GameError::InvalidPayload)?;
        if cell >= CELLS {
            return Err(GameError::InvalidPayload);
        }
        if self.revealed[cell] {
            return Err(GameError::AlreadyRevealed);
        }

        if mines[cell] {
            ctx.announce(format!(
                "Boom! You hit a mine and lost {}.\n{}",
                ctx.stake,
                self.render(&mines, true)
            ));
            return Ok(GameResult::Loss);
        }

        self.revealed[cell] = true;
        self.safe += 1;
        let payout = cash_out_payout(ctx.stake, self.safe);
        if self.safe == SAFE_CELLS {
            ctx.announce(format!("Board cleared! You win {payout}.\n{}", self.render(&mines, true)));
            return Ok(GameResult::Win(payout));
        }
        ctx.present(
            format!(
                "Safe! {} found, cash out now for {payout}.\n{}",
                self.safe,
                self.render(&mines, false)
            ),
            self.choices(),
        );
        Ok(GameResult::Continue)
    }

    fn on_deadline(&mut self, ctx: &mut Context<'_>) -> GameResult {
        if self.safe == 0 {
            ctx.announce("Time's up. Nothing was revealed, your bet is returned.");
            return GameResult::Push;
        }
        let payout = cash_out_payout(ctx.stake, self.safe);
        ctx.announce(format!("Time's up. Your {} safe cells cash out for {payout}.", self.safe));
        GameResult::Win(payout)
    }
}
