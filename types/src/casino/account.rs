use super::{Cooldowns, Job, JobKind, UserId, DAY_MS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Consecutive-day work streak.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStreak {
    pub count: u32,
    /// Day index (`ms / DAY_MS`) of the last shift.
    pub last_worked_day: Option<u64>,
}

impl JobStreak {
    /// Streak a shift worked on `today` counts toward.
    ///
    /// Working the day after the last shift extends the streak, working again on
    /// the same day keeps it, and any gap restarts it at one.
    pub fn next_for(&self, today: u64) -> u32 {
        match self.last_worked_day {
            Some(day) if day == today => self.count,
            Some(day) if day.saturating_add(1) == today => self.count.saturating_add(1),
            _ => 1,
        }
    }
}

/// Per-user economic state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub user_id: UserId,
    pub balance: i64,
    #[serde(default)]
    pub cooldowns: Cooldowns,
    #[serde(default)]
    pub inventory: BTreeMap<String, u32>,
    #[serde(default)]
    pub current_job: Option<JobKind>,
    #[serde(default)]
    pub hours_worked: BTreeMap<JobKind, u32>,
    #[serde(default)]
    pub job_streak: JobStreak,
}

impl Account {
    /// A fresh account with zeroed defaults.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: 0,
            cooldowns: Cooldowns::default(),
            inventory: BTreeMap::new(),
            current_job: None,
            hours_worked: BTreeMap::new(),
            job_streak: JobStreak::default(),
        }
    }

    pub fn hours_on(&self, job: JobKind) -> u32 {
        self.hours_worked.get(&job).copied().unwrap_or(0)
    }

    /// Hours worked across every job.
    pub fn total_hours(&self) -> u32 {
        self.hours_worked.values().fold(0u32, |sum, h| sum.saturating_add(*h))
    }

    /// Whether the account qualifies for `job`.
    pub fn meets(&self, job: &Job) -> bool {
        self.balance >= job.min_balance && self.total_hours() >= job.hours_required
    }

    /// Whether the balance covers `amount`.
    pub fn can_afford(&self, amount: u64) -> bool {
        i128::from(self.balance) >= i128::from(amount)
    }

    /// Record a completed shift at `now_ms` with the given streak.
    pub fn record_shift(&mut self, job: JobKind, streak: u32, now_ms: u64) {
        let hours = self.hours_worked.entry(job).or_insert(0);
        *hours = hours.saturating_add(1);
        self.job_streak = JobStreak {
            count: streak,
            last_worked_day: Some(now_ms / DAY_MS),
        };
    }
}
