//! Tunable defaults applied when a config file omits the field.

pub const DEFAULT_MAILBOX_SIZE: usize = 32;
pub const DEFAULT_PROMPT_BUFFER: usize = 1_024;
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 16 * 1024;
pub const DEFAULT_WS_SEND_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_SETTLEMENT_ATTEMPTS: u32 = 5;
pub const DEFAULT_SETTLEMENT_BACKOFF_MS: u64 = 50;
pub const DEFAULT_SETTLEMENT_MAX_BACKOFF_MS: u64 = 2_000;
pub const DEFAULT_RETRY_HELD_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_INPUT_RATE_PER_SECOND: u32 = 5;
pub const DEFAULT_INPUT_BURST: u32 = 10;
