use arcade_execution::{ArcadeConfig, RetryPolicy, Seed};
use commonware_utils::from_hex_formatted;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};
use thiserror::Error;
use tracing::Level;

pub mod defaults;
pub mod gateway;
pub mod store;

/// Configuration for the arcade node.
#[derive(Deserialize, Serialize)]
pub struct Config {
    /// Hex-encoded 32-byte server seed. A fresh seed is drawn when omitted.
    #[serde(default)]
    pub seed: Option<String>,

    pub port: u16,
    pub metrics_port: u16,
    /// SQLite database holding accounts.
    pub data_file: String,
    pub worker_threads: usize,
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,

    // Tunables (defaults live in `defaults`).
    #[serde(default = "default_mailbox_size")]
    pub mailbox_size: usize,
    #[serde(default = "default_prompt_buffer")]
    pub prompt_buffer: usize,
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
    #[serde(default = "default_ws_send_timeout_ms")]
    pub ws_send_timeout_ms: u64,
    #[serde(default = "default_settlement_attempts")]
    pub settlement_attempts: u32,
    #[serde(default = "default_settlement_backoff_ms")]
    pub settlement_backoff_ms: u64,
    #[serde(default = "default_settlement_max_backoff_ms")]
    pub settlement_max_backoff_ms: u64,
    #[serde(default = "default_retry_held_interval_ms")]
    pub retry_held_interval_ms: u64,
    #[serde(default = "default_input_rate_per_second")]
    pub input_rate_per_second: u32,
    #[serde(default = "default_input_burst")]
    pub input_burst: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("seed must be 64 hex characters")]
    InvalidSeed,
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("{field} must not exceed {limit} (got {value})")]
    InvalidRange {
        field: &'static str,
        value: u64,
        limit: u64,
    },
    #[error("port and metrics_port must be different (port={port}, metrics_port={metrics_port})")]
    PortConflict { port: u16, metrics_port: u16 },
}

pub struct ValidatedConfig {
    pub seed: Seed,
    pub port: u16,
    pub metrics_port: u16,
    pub data_file: PathBuf,
    pub worker_threads: NonZeroUsize,
    pub log_level: Level,
    pub json_logs: bool,
    pub mailbox_size: NonZeroUsize,
    pub prompt_buffer: NonZeroUsize,
    pub outbound_buffer: NonZeroUsize,
    pub max_message_bytes: NonZeroUsize,
    pub ws_send_timeout: Duration,
    pub retry: RetryPolicy,
    pub retry_held_interval: Duration,
    pub input_rate_per_second: NonZeroU32,
    pub input_burst: NonZeroU32,
}

impl ValidatedConfig {
    pub fn arcade_config(&self) -> ArcadeConfig {
        ArcadeConfig {
            seed: self.seed,
            mailbox_size: self.mailbox_size.get(),
            prompt_buffer: self.prompt_buffer.get(),
            retry: self.retry,
        }
    }
}

struct RedactedConfig<'a>(&'a Config);

impl fmt::Debug for RedactedConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cfg = self.0;
        let seed = cfg.seed.as_ref().map(|_| "<redacted>");
        f.debug_struct("Config")
            .field("seed", &seed)
            .field("port", &cfg.port)
            .field("metrics_port", &cfg.metrics_port)
            .field("data_file", &cfg.data_file)
            .field("worker_threads", &cfg.worker_threads)
            .field("log_level", &cfg.log_level)
            .field("json_logs", &cfg.json_logs)
            .field("mailbox_size", &cfg.mailbox_size)
            .field("prompt_buffer", &cfg.prompt_buffer)
            .field("outbound_buffer", &cfg.outbound_buffer)
            .field("max_message_bytes", &cfg.max_message_bytes)
            .field("ws_send_timeout_ms", &cfg.ws_send_timeout_ms)
            .field("settlement_attempts", &cfg.settlement_attempts)
            .field("settlement_backoff_ms", &cfg.settlement_backoff_ms)
            .field("settlement_max_backoff_ms", &cfg.settlement_max_backoff_ms)
            .field("retry_held_interval_ms", &cfg.retry_held_interval_ms)
            .field("input_rate_per_second", &cfg.input_rate_per_second)
            .field("input_burst", &cfg.input_burst)
            .finish()
    }
}

fn default_mailbox_size() -> usize {
    defaults::DEFAULT_MAILBOX_SIZE
}

fn default_prompt_buffer() -> usize {
    defaults::DEFAULT_PROMPT_BUFFER
}

fn default_outbound_buffer() -> usize {
    defaults::DEFAULT_OUTBOUND_BUFFER
}

fn default_max_message_bytes() -> usize {
    defaults::DEFAULT_MAX_MESSAGE_BYTES
}

fn default_ws_send_timeout_ms() -> u64 {
    defaults::DEFAULT_WS_SEND_TIMEOUT_MS
}

fn default_settlement_attempts() -> u32 {
    defaults::DEFAULT_SETTLEMENT_ATTEMPTS
}

fn default_settlement_backoff_ms() -> u64 {
    defaults::DEFAULT_SETTLEMENT_BACKOFF_MS
}

fn default_settlement_max_backoff_ms() -> u64 {
    defaults::DEFAULT_SETTLEMENT_MAX_BACKOFF_MS
}

fn default_retry_held_interval_ms() -> u64 {
    defaults::DEFAULT_RETRY_HELD_INTERVAL_MS
}

fn default_input_rate_per_second() -> u32 {
    defaults::DEFAULT_INPUT_RATE_PER_SECOND
}

fn default_input_burst() -> u32 {
    defaults::DEFAULT_INPUT_BURST
}

fn ensure_nonzero_u64(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidNonZero { field, value });
    }
    Ok(())
}

fn nonzero_usize(field: &'static str, value: usize) -> Result<NonZeroUsize, ConfigError> {
    NonZeroUsize::new(value).ok_or(ConfigError::InvalidNonZero {
        field,
        value: value as u64,
    })
}

fn nonzero_u32(field: &'static str, value: u32) -> Result<NonZeroU32, ConfigError> {
    NonZeroU32::new(value).ok_or(ConfigError::InvalidNonZero {
        field,
        value: u64::from(value),
    })
}

/// Parse a 64-character hex string (optionally `0x` prefixed) into a seed.
pub fn parse_seed(value: &str) -> Result<Seed, ConfigError> {
    let bytes = from_hex_formatted(value).ok_or(ConfigError::InvalidSeed)?;
    if bytes.len() != 32 {
        return Err(ConfigError::InvalidSeed);
    }
    bytes.try_into().map_err(|_| ConfigError::InvalidSeed)
}

impl Config {
    pub fn redacted_debug(&self) -> impl fmt::Debug + '_ {
        RedactedConfig(self)
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let worker_threads = nonzero_usize("worker_threads", self.worker_threads)?;
        let mailbox_size = nonzero_usize("mailbox_size", self.mailbox_size)?;
        let prompt_buffer = nonzero_usize("prompt_buffer", self.prompt_buffer)?;
        let outbound_buffer = nonzero_usize("outbound_buffer", self.outbound_buffer)?;
        let max_message_bytes = nonzero_usize("max_message_bytes", self.max_message_bytes)?;
        ensure_nonzero_u64("ws_send_timeout_ms", self.ws_send_timeout_ms)?;
        ensure_nonzero_u64("settlement_attempts", u64::from(self.settlement_attempts))?;
        ensure_nonzero_u64("settlement_backoff_ms", self.settlement_backoff_ms)?;
        ensure_nonzero_u64("retry_held_interval_ms", self.retry_held_interval_ms)?;
        if self.settlement_max_backoff_ms < self.settlement_backoff_ms {
            return Err(ConfigError::InvalidRange {
                field: "settlement_backoff_ms",
                value: self.settlement_backoff_ms,
                limit: self.settlement_max_backoff_ms,
            });
        }
        let input_rate_per_second =
            nonzero_u32("input_rate_per_second", self.input_rate_per_second)?;
        let input_burst = nonzero_u32("input_burst", self.input_burst)?;

        if self.port == self.metrics_port {
            return Err(ConfigError::PortConflict {
                port: self.port,
                metrics_port: self.metrics_port,
            });
        }

        let seed = match &self.seed {
            Some(value) => parse_seed(value)?,
            None => rand::random(),
        };

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        Ok(ValidatedConfig {
            seed,
            port: self.port,
            metrics_port: self.metrics_port,
            data_file: PathBuf::from(self.data_file),
            worker_threads,
            log_level,
            json_logs: self.json_logs,
            mailbox_size,
            prompt_buffer,
            outbound_buffer,
            max_message_bytes,
            ws_send_timeout: Duration::from_millis(self.ws_send_timeout_ms),
            retry: RetryPolicy {
                attempts: self.settlement_attempts,
                initial_backoff: Duration::from_millis(self.settlement_backoff_ms),
                max_backoff: Duration::from_millis(self.settlement_max_backoff_ms),
            },
            retry_held_interval: Duration::from_millis(self.retry_held_interval_ms),
            input_rate_per_second,
            input_burst,
        })
    }
}
