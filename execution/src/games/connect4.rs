//! Two-player Connect 4 with a challenge handshake.
//!
//! Participant 0 is the challenger and moves first once participant 1
//! accepts. Board rows are stored top-down.

use super::{Context, Expectation, Game, GameError, GameResult, Input};
use arcade_types::casino::{
    Choice, CONNECT4_CHALLENGE_TIMEOUT_MS, CONNECT4_COLS, CONNECT4_GAME_TIMEOUT_MS, CONNECT4_ROWS,
};
use arcade_types::{Activity, GameKind, UserId};

const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// 6x7 grid. A cell holds 0 when empty, otherwise the player index plus one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Board {
    cells: [[u8; CONNECT4_COLS]; CONNECT4_ROWS],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row][col]
    }

    pub fn column_full(&self, col: usize) -> bool {
        self.cells[0][col] != 0
    }

    /// Drop a piece for `player` into `col`, returning the row it lands on.
    pub fn drop_piece(&mut self, col: usize, player: usize) -> Result<usize, GameError> {
        if col >= CONNECT4_COLS {
            return Err(GameError::InvalidPayload);
        }
        let row = (0..CONNECT4_ROWS)
            .rev()
            .find(|&row| self.cells[row][col] == 0)
            .ok_or(GameError::ColumnFull)?;
        self.cells[row][col] = player as u8 + 1;
        Ok(row)
    }

    /// Whether the piece at (`row`, `col`) completes a line of four.
    pub fn check_win(&self, row: usize, col: usize) -> bool {
        let piece = self.cells[row][col];
        if piece == 0 {
            return false;
        }
        DIRECTIONS.iter().any(|&(dr, dc)| {
            1 + self.run(row, col, dr, dc, piece) + self.run(row, col, -dr, -dc, piece) >= 4
        })
    }

    fn run(&self, row: usize, col: usize, dr: isize, dc: isize, piece: u8) -> usize {
        let mut count = 0;
        let (mut r, mut c) = (row as isize + dr, col as isize + dc);
        while (0..CONNECT4_ROWS as isize).contains(&r)
            && (0..CONNECT4_COLS as isize).contains(&c)
            && self.cells[r as usize][c as usize] == piece
        {
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }

    pub fn is_full(&self) -> bool {
        (0..CONNECT4_COLS).all(|col| self.column_full(col))
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for row in &self.cells {
            for &cell in row {
                out.push_str(match cell {
                    0 => "⚪",
                    1 => "🔴",
                    _ => "🟡",
                });
            }
            out.push('\n');
        }
        out.push_str("1️⃣2️⃣3️⃣4️⃣5️⃣6️⃣7️⃣");
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Challenge,
    Playing { current: usize },
}

pub struct Connect4 {
    board: Board,
    phase: Phase,
}

impl Default for Connect4 {
    fn default() -> Self {
        Self::new()
    }
}

impl Connect4 {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            phase: Phase::Challenge,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    fn column_choices(&self) -> Vec<Choice> {
        (0..CONNECT4_COLS)
            .filter(|&col| !self.board.column_full(col))
            .map(|col| Choice::new(format!("c4:{col}"), (col + 1).to_string()))
            .collect()
    }

    fn play(
        &mut self,
        ctx: &mut Context<'_>,
        actor: UserId,
        current: usize,
        arg: &str,
    ) -> Result<GameResult, GameError> {
        if ctx.participant(current)? != actor {
            return Err(GameError::NotYourTurn);
        }
        let col: usize = arg.parse().map_err(|_| GameError::InvalidPayload)?;
        let row = self.board.drop_piece(col, current)?;

        if self.board.check_win(row, col) {
            ctx.announce(format!(
                "{}\nPlayer {} connects four and wins {}!",
                self.board.render(),
                ctx.participant(current)?,
                ctx.stake
            ));
            return Ok(GameResult::Victory(current));
        }
        if self.board.is_full() {
            ctx.announce(format!("{}\nThe board is full. It's a draw.", self.board.render()));
            return Ok(GameResult::Draw);
        }

        let next = 1 - current;
        self.phase = Phase::Playing { current: next };
        let next_player = ctx.participant(next)?;
        ctx.present(
            format!("{}\nPlayer {next_player}'s turn.", self.board.render()),
            self.column_choices(),
        );
        Ok(GameResult::Continue)
    }
}

impl Game for Connect4 {
    fn kind(&self) -> GameKind {
        GameKind::Connect4
    }

    fn activity(&self) -> Activity {
        Activity::Connect4
    }

    fn begin(&mut self, ctx: &mut Context<'_>) -> GameResult {
        let (Ok(challenger), Ok(opponent)) = (ctx.participant(0), ctx.participant(1)) else {
            ctx.announce("Connect 4 needs two players.");
            return GameResult::Void;
        };
        ctx.rearm(CONNECT4_CHALLENGE_TIMEOUT_MS);
        ctx.present(
            format!(
                "Player {challenger} challenges player {opponent} to Connect 4 for {}. Accept within 60 seconds.",
                ctx.stake
            ),
            vec![
                Choice::new("c4:accept", "Accept"),
                Choice::new("c4:decline", "Decline"),
            ],
        );
        GameResult::Continue
    }

    fn expected(&self, participants: &[UserId]) -> Expectation {
        let index = match self.phase {
            Phase::Challenge => 1,
            Phase::Playing { current } => current,
        };
        Expectation::buttons(participants.get(index).copied().into_iter().collect())
    }

    fn on_input(
        &mut self,
        ctx: &mut Context<'_>,
        actor: UserId,
        input: Input<'_>,
    ) -> Result<GameResult, GameError> {
        let Input::Button(arg) = input else {
            return Err(GameError::InvalidPayload);
        };
        match self.phase {
            Phase::Challenge => {
                if ctx.participant(1)? != actor {
                    return Err(GameError::NotYourTurn);
                }
                match arg {
                    "accept" => {
                        self.phase = Phase::Playing { current: 0 };
                        ctx.rearm(CONNECT4_GAME_TIMEOUT_MS);
                        let first = ctx.participant(0)?;
                        ctx.present(
                            format!("{}\nChallenge accepted! Player {first} goes first.", self.board.render()),
                            self.column_choices(),
                        );
                        Ok(GameResult::Continue)
                    }
                    "decline" => {
                        ctx.announce("Challenge declined.");
                        Ok(GameResult::Void)
                    }
                    _ => Err(GameError::InvalidPayload),
                }
            }
            Phase::Playing { current } => self.play(ctx, actor, current, arg),
        }
    }

    fn on_deadline(&mut self, ctx: &mut Context<'_>) -> GameResult {
        match self.phase {
            Phase::Challenge => {
                ctx.announce("The challenge was not accepted in time.");
                GameResult::Void
            }
            Phase::Playing { current } => {
                ctx.announce("Move timed out. The player who stalled forfeits.");
                GameResult::Victory(1 - current)
            }
        }
    }
}
