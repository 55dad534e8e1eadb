use super::{HOUR_MS, MINUTE_MS};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Jobs a user can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Cashier,
    Programmer,
    Chef,
    Athlete,
}

/// Minigame played for one work shift.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkGame {
    Typing,
    Trivia,
    Reaction,
    Sequence,
    /// One of the concrete minigames, drawn per shift.
    Random,
}

impl WorkGame {
    /// Minigames a [`WorkGame::Random`] shift draws from.
    pub const CONCRETE: [WorkGame; 4] = [
        WorkGame::Typing,
        WorkGame::Trivia,
        WorkGame::Reaction,
        WorkGame::Sequence,
    ];
}

/// Static definition of a job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pub kind: JobKind,
    pub display: &'static str,
    pub description: &'static str,
    /// Balance required to take (and keep working) the job.
    pub min_balance: i64,
    /// Hours worked across all jobs required to take (and keep working) it.
    pub hours_required: u32,
    /// Inclusive base pay range per shift.
    pub base_pay: (u64, u64),
    pub cooldown_ms: u64,
    pub minigame: WorkGame,
}

pub const JOBS: [Job; 4] = [
    Job {
        kind: JobKind::Cashier,
        display: "Cashier",
        description: "Ring up customers at the register.",
        min_balance: 0,
        hours_required: 0,
        base_pay: (100, 200),
        cooldown_ms: HOUR_MS,
        minigame: WorkGame::Typing,
    },
    Job {
        kind: JobKind::Programmer,
        display: "Programmer",
        description: "Answer a quick technical question.",
        min_balance: 500,
        hours_required: 10,
        base_pay: (300, 600),
        cooldown_ms: 2 * HOUR_MS,
        minigame: WorkGame::Trivia,
    },
    Job {
        kind: JobKind::Chef,
        display: "Chef",
        description: "Call out orders in the kitchen.",
        min_balance: 250,
        hours_required: 5,
        base_pay: (200, 400),
        cooldown_ms: 90 * MINUTE_MS,
        minigame: WorkGame::Typing,
    },
    Job {
        kind: JobKind::Athlete,
        display: "Athlete",
        description: "Train with a different drill every shift.",
        min_balance: 750,
        hours_required: 20,
        base_pay: (500, 1_000),
        cooldown_ms: 3 * HOUR_MS,
        minigame: WorkGame::Random,
    },
];

impl JobKind {
    pub const ALL: [JobKind; 4] = [
        JobKind::Cashier,
        JobKind::Programmer,
        JobKind::Chef,
        JobKind::Athlete,
    ];

    pub fn job(self) -> &'static Job {
        match self {
            JobKind::Cashier => &JOBS[0],
            JobKind::Programmer => &JOBS[1],
            JobKind::Chef => &JOBS[2],
            JobKind::Athlete => &JOBS[3],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Cashier => "cashier",
            JobKind::Programmer => "programmer",
            JobKind::Chef => "chef",
            JobKind::Athlete => "athlete",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown job: {0}")]
pub struct UnknownJob(pub String);

impl FromStr for JobKind {
    type Err = UnknownJob;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownJob(s.to_string()))
    }
}

/// Streak multiplier in basis points: `1 + min(streak, cap) * 0.1`.
pub fn streak_bonus_bps(streak: u32) -> u64 {
    10_000 + u64::from(streak.min(super::WORK_STREAK_CAP)) * 1_000
}
