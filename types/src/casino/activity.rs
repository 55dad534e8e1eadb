use super::*;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::BTreeMap, fmt, str::FromStr};
use thiserror::Error;

/// Every activity that carries a cooldown.
///
/// Work shifts are keyed per job so switching jobs does not reset the clock of
/// the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Activity {
    CoinFlip,
    Dice,
    Slots,
    GuessNumber,
    Rps,
    Trivia,
    Minefield,
    Memory,
    Connect4,
    GroupQuiz,
    Daily,
    Work(JobKind),
}

impl Activity {
    pub fn cooldown_ms(self) -> u64 {
        match self {
            Activity::CoinFlip => COINFLIP_COOLDOWN_MS,
            Activity::Dice => DICE_COOLDOWN_MS,
            Activity::Slots => SLOTS_COOLDOWN_MS,
            Activity::GuessNumber => GUESS_COOLDOWN_MS,
            Activity::Rps => RPS_COOLDOWN_MS,
            Activity::Trivia => TRIVIA_COOLDOWN_MS,
            Activity::Minefield => MINEFIELD_COOLDOWN_MS,
            Activity::Memory => MEMORY_COOLDOWN_MS,
            Activity::Connect4 => CONNECT4_COOLDOWN_MS,
            Activity::GroupQuiz => GROUP_QUIZ_COOLDOWN_MS,
            Activity::Daily => DAILY_COOLDOWN_MS,
            Activity::Work(job) => job.job().cooldown_ms,
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::CoinFlip => f.write_str("coinflip"),
            Activity::Dice => f.write_str("dice"),
            Activity::Slots => f.write_str("slots"),
            Activity::GuessNumber => f.write_str("guessnumber"),
            Activity::Rps => f.write_str("rps"),
            Activity::Trivia => f.write_str("trivia"),
            Activity::Minefield => f.write_str("minefield"),
            Activity::Memory => f.write_str("memory"),
            Activity::Connect4 => f.write_str("connect4"),
            Activity::GroupQuiz => f.write_str("groupquiz"),
            Activity::Daily => f.write_str("daily"),
            Activity::Work(job) => write!(f, "work:{job}"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown activity: {0}")]
pub struct UnknownActivity(pub String);

impl FromStr for Activity {
    type Err = UnknownActivity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let activity = match s {
            "coinflip" => Activity::CoinFlip,
            "dice" => Activity::Dice,
            "slots" => Activity::Slots,
            "guessnumber" => Activity::GuessNumber,
            "rps" => Activity::Rps,
            "trivia" => Activity::Trivia,
            "minefield" => Activity::Minefield,
            "memory" => Activity::Memory,
            "connect4" => Activity::Connect4,
            "groupquiz" => Activity::GroupQuiz,
            "daily" => Activity::Daily,
            other => {
                let job = other
                    .strip_prefix("work:")
                    .and_then(|job| job.parse::<JobKind>().ok())
                    .ok_or_else(|| UnknownActivity(other.to_string()))?;
                Activity::Work(job)
            }
        };
        Ok(activity)
    }
}

impl Serialize for Activity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Activity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

/// Last-played timestamps (ms since the Unix epoch) per activity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cooldowns(BTreeMap<Activity, u64>);

impl Cooldowns {
    pub fn last_played(&self, activity: Activity) -> Option<u64> {
        self.0.get(&activity).copied()
    }

    pub fn stamp(&mut self, activity: Activity, at_ms: u64) {
        self.0.insert(activity, at_ms);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Activity, u64)> + '_ {
        self.0.iter().map(|(activity, at)| (*activity, *at))
    }
}

/// Session kinds the engine can start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    CoinFlip,
    Dice,
    Slots,
    GuessNumber,
    Rps,
    Trivia,
    Minefield,
    Memory,
    Connect4,
    GroupQuiz,
    Work,
}

impl GameKind {
    /// Payload prefix of button interactions addressed to this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            GameKind::CoinFlip => "coin",
            GameKind::Dice => "dice",
            GameKind::Slots => "slots",
            GameKind::GuessNumber => "guess",
            GameKind::Rps => "rps",
            GameKind::Trivia => "trivia",
            GameKind::Minefield => "mine",
            GameKind::Memory => "memory",
            GameKind::Connect4 => "c4",
            GameKind::GroupQuiz => "quiz",
            GameKind::Work => "work",
        }
    }

    /// Inclusive stake limits, or `None` for stake-free kinds.
    pub fn stake_range(self) -> Option<(u64, u64)> {
        match self {
            GameKind::CoinFlip => Some((COINFLIP_MIN_BET, COINFLIP_MAX_BET)),
            GameKind::Dice => Some((DICE_MIN_BET, DICE_MAX_BET)),
            GameKind::Slots => Some((SLOTS_MIN_BET, SLOTS_MAX_BET)),
            GameKind::GuessNumber => Some((GUESS_MIN_BET, GUESS_MAX_BET)),
            GameKind::Rps => Some((RPS_MIN_BET, RPS_MAX_BET)),
            GameKind::Minefield => Some((MINEFIELD_MIN_BET, MINEFIELD_MAX_BET)),
            GameKind::Memory => Some((MEMORY_MIN_BET, MEMORY_MAX_BET)),
            GameKind::Connect4 => Some((CONNECT4_MIN_BET, CONNECT4_MAX_BET)),
            GameKind::Trivia | GameKind::GroupQuiz | GameKind::Work => None,
        }
    }

    /// Whether sessions of this kind are shared by a channel.
    pub fn channel_scoped(self) -> bool {
        matches!(self, GameKind::Connect4 | GameKind::GroupQuiz)
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameKind::CoinFlip => "coinflip",
            GameKind::Dice => "dice",
            GameKind::Slots => "slots",
            GameKind::GuessNumber => "guessnumber",
            GameKind::Rps => "rps",
            GameKind::Trivia => "trivia",
            GameKind::Minefield => "minefield",
            GameKind::Memory => "memory",
            GameKind::Connect4 => "connect4",
            GameKind::GroupQuiz => "groupquiz",
            GameKind::Work => "work",
        };
        f.write_str(name)
    }
}
