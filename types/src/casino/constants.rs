/// One second in milliseconds.
pub const SECOND_MS: u64 = 1_000;

/// One minute in milliseconds.
pub const MINUTE_MS: u64 = 60 * SECOND_MS;

/// One hour in milliseconds.
pub const HOUR_MS: u64 = 60 * MINUTE_MS;

/// One day in milliseconds. Job streaks count calendar days of this length.
pub const DAY_MS: u64 = 24 * HOUR_MS;

/// Maximum length of an inbound interaction payload.
pub const MAX_PAYLOAD_LENGTH: usize = 256;

// Coin flip
pub const COINFLIP_COOLDOWN_MS: u64 = 20 * SECOND_MS;
pub const COINFLIP_MIN_BET: u64 = 1;
pub const COINFLIP_MAX_BET: u64 = u32::MAX as u64;

// Dice
pub const DICE_COOLDOWN_MS: u64 = 30 * SECOND_MS;
pub const DICE_MIN_BET: u64 = 10;
pub const DICE_MAX_BET: u64 = 500;

// Slots
pub const SLOTS_COOLDOWN_MS: u64 = 40 * SECOND_MS;
pub const SLOTS_MIN_BET: u64 = 10;
pub const SLOTS_MAX_BET: u64 = 500;

// Number guess
pub const GUESS_COOLDOWN_MS: u64 = 45 * SECOND_MS;
pub const GUESS_MIN_BET: u64 = 10;
pub const GUESS_MAX_BET: u64 = 1_000;
pub const GUESS_RANGE_MAX: u8 = 10;

// Rock-paper-scissors
pub const RPS_COOLDOWN_MS: u64 = 20 * SECOND_MS;
pub const RPS_MIN_BET: u64 = 10;
pub const RPS_MAX_BET: u64 = 300;
pub const RPS_WINDOW_MS: u64 = 15 * SECOND_MS;

// Trivia
pub const TRIVIA_COOLDOWN_MS: u64 = 60 * SECOND_MS;
pub const TRIVIA_WINDOW_MS: u64 = 15 * SECOND_MS;
/// Paid for any answer, right or wrong.
pub const TRIVIA_PARTICIPATION_REWARD: u64 = 50;
/// Paid on top of the participation reward for a correct answer.
pub const TRIVIA_CORRECT_BONUS: u64 = 100;

// Minefield
pub const MINEFIELD_COOLDOWN_MS: u64 = 60 * SECOND_MS;
pub const MINEFIELD_MIN_BET: u64 = 10;
pub const MINEFIELD_MAX_BET: u64 = 500;
pub const MINEFIELD_ROWS: usize = 4;
pub const MINEFIELD_COLS: usize = 5;
pub const MINEFIELD_MINES: usize = 4;
/// Multiplier growth per safe cell, in basis points (0.3x).
pub const MINEFIELD_INCREMENT_BPS: u64 = 3_000;
pub const MINEFIELD_TIMEOUT_MS: u64 = 300 * SECOND_MS;

// Memory
pub const MEMORY_COOLDOWN_MS: u64 = 50 * SECOND_MS;
pub const MEMORY_MIN_BET: u64 = 10;
pub const MEMORY_MAX_BET: u64 = 300;
pub const MEMORY_GRID: usize = 4;
pub const MEMORY_PAIRS: usize = MEMORY_GRID * MEMORY_GRID / 2;
pub const MEMORY_TIMEOUT_MS: u64 = 120 * SECOND_MS;
pub const MEMORY_HIDE_DELAY_MS: u64 = 1_500;
/// Finishing under this elapsed time earns the speed bonus.
pub const MEMORY_FAST_FINISH_MS: u64 = 60 * SECOND_MS;

// Connect 4
pub const CONNECT4_COOLDOWN_MS: u64 = 30 * SECOND_MS;
pub const CONNECT4_MIN_BET: u64 = 10;
pub const CONNECT4_MAX_BET: u64 = 500;
pub const CONNECT4_ROWS: usize = 6;
pub const CONNECT4_COLS: usize = 7;
pub const CONNECT4_CHALLENGE_TIMEOUT_MS: u64 = 60 * SECOND_MS;
pub const CONNECT4_GAME_TIMEOUT_MS: u64 = 180 * SECOND_MS;

// Group quiz
/// The quiz only locks its channel; players are never held back.
pub const GROUP_QUIZ_COOLDOWN_MS: u64 = 0;
pub const GROUP_QUIZ_ROUND_MS: u64 = 30 * SECOND_MS;
/// Buttons per round: the answer plus decoys from the same set.
pub const GROUP_QUIZ_CHOICES: usize = 4;

// Daily reward
pub const DAILY_COOLDOWN_MS: u64 = DAY_MS;
pub const DAILY_REWARD_MIN: u64 = 100;
pub const DAILY_REWARD_MAX: u64 = 300;

// Work minigames
pub const WORK_TYPING_WINDOW_MS: u64 = 10 * SECOND_MS;
pub const WORK_TYPING_FAST_MS: u64 = 3 * SECOND_MS;
pub const WORK_TRIVIA_WINDOW_MS: u64 = 15 * SECOND_MS;
pub const WORK_REACTION_WINDOW_MS: u64 = 7 * SECOND_MS;
pub const WORK_SEQUENCE_SHOW_MS: u64 = 6 * SECOND_MS;
pub const WORK_SEQUENCE_WINDOW_MS: u64 = 30 * SECOND_MS;
pub const WORK_SEQUENCE_LENGTH: usize = 3;
/// Streak days beyond this do not raise the bonus further.
pub const WORK_STREAK_CAP: u32 = 10;

/// Error codes surfaced to the chat client.
pub const ERROR_COOLDOWN_ACTIVE: u8 = 1;
pub const ERROR_INSUFFICIENT_FUNDS: u8 = 2;
pub const ERROR_SCOPE_BUSY: u8 = 3;
pub const ERROR_BAD_PARAMS: u8 = 4;
pub const ERROR_NO_SESSION: u8 = 5;
pub const ERROR_NOT_EXPECTED: u8 = 6;
pub const ERROR_INVALID_MOVE: u8 = 7;
pub const ERROR_SELF_TRANSFER: u8 = 8;
pub const ERROR_NO_JOB: u8 = 9;
pub const ERROR_JOB_REQUIREMENTS: u8 = 10;
pub const ERROR_PAYOUT_PENDING: u8 = 11;
pub const ERROR_STORE: u8 = 12;
pub const ERROR_RATE_LIMITED: u8 = 13;
pub const ERROR_UNKNOWN_ITEM: u8 = 14;
pub const ERROR_OUT_OF_STOCK: u8 = 15;
