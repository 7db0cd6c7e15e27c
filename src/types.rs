//! Core types for the market resolver

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome code printed as `recommendation: pN`.
///
/// The codes carry no meaning of their own; every question file decides
/// which code stands for "Yes", "No", 50-50 or "too early".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "p1")]
    P1,
    #[serde(rename = "p2")]
    P2,
    #[serde(rename = "p3")]
    P3,
    #[serde(rename = "p4")]
    P4,
    #[serde(rename = "p5")]
    P5,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::P1 => "p1",
            Recommendation::P2 => "p2",
            Recommendation::P3 => "p3",
            Recommendation::P4 => "p4",
            Recommendation::P5 => "p5",
        }
    }
}

impl Default for Recommendation {
    /// `p4` is what most questions use for "too early / could not fetch"
    fn default() -> Self {
        Recommendation::P4
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Recommendation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "p1" => Ok(Recommendation::P1),
            "p2" => Ok(Recommendation::P2),
            "p3" => Ok(Recommendation::P3),
            "p4" => Ok(Recommendation::P4),
            "p5" => Ok(Recommendation::P5),
            other => anyhow::bail!("Unknown recommendation code: {}", other),
        }
    }
}

/// Result of resolving one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub question_id: String,
    pub recommendation: Recommendation,
    /// Human-readable reason, e.g. "low 94850.10 <= 95000 at 2025-06-12T14:00Z"
    pub detail: String,
    /// True when the data could not be fetched and the fallback code was used
    pub fell_back: bool,
}

impl Resolution {
    /// A resolution that could not be decided from data
    pub fn fallback(question_id: impl Into<String>, recommendation: Recommendation, detail: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            recommendation,
            detail: detail.into(),
            fell_back: true,
        }
    }

    /// The single line written to stdout
    pub fn output_line(&self) -> String {
        format!("recommendation: {}", self.recommendation)
    }
}

/// One OHLCV price bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    /// A flat bar for sources that only report a spot price
    pub fn spot(price: Decimal, at: DateTime<Utc>) -> Self {
        Self {
            open_time: at,
            close_time: at,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: Decimal::ZERO,
        }
    }
}

/// Game status as reported by SportsData.io
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Final,
    FinalOvertime,
    FinalShootout,
    Suspended,
    Delayed,
    Postponed,
    Canceled,
    Forfeit,
    NotNecessary,
    Unknown(String),
}

impl GameStatus {
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            GameStatus::Final | GameStatus::FinalOvertime | GameStatus::FinalShootout
        )
    }
}

impl From<&str> for GameStatus {
    fn from(s: &str) -> Self {
        match s {
            "Scheduled" => GameStatus::Scheduled,
            "InProgress" => GameStatus::InProgress,
            "Final" => GameStatus::Final,
            "F/OT" => GameStatus::FinalOvertime,
            "F/SO" => GameStatus::FinalShootout,
            "Suspended" => GameStatus::Suspended,
            "Delayed" => GameStatus::Delayed,
            "Postponed" => GameStatus::Postponed,
            "Canceled" | "Cancelled" => GameStatus::Canceled,
            "Forfeit" => GameStatus::Forfeit,
            "NotNecessary" => GameStatus::NotNecessary,
            other => GameStatus::Unknown(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for GameStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(GameStatus::from(s.as_str()))
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Scheduled => write!(f, "Scheduled"),
            GameStatus::InProgress => write!(f, "InProgress"),
            GameStatus::Final => write!(f, "Final"),
            GameStatus::FinalOvertime => write!(f, "F/OT"),
            GameStatus::FinalShootout => write!(f, "F/SO"),
            GameStatus::Suspended => write!(f, "Suspended"),
            GameStatus::Delayed => write!(f, "Delayed"),
            GameStatus::Postponed => write!(f, "Postponed"),
            GameStatus::Canceled => write!(f, "Canceled"),
            GameStatus::Forfeit => write!(f, "Forfeit"),
            GameStatus::NotNecessary => write!(f, "NotNecessary"),
            GameStatus::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// A game record from the scores feed
#[derive(Debug, Clone)]
pub struct Game {
    pub game_id: String,
    pub status: GameStatus,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
}

impl Game {
    /// Whether this game is between the two teams, in either home/away order
    pub fn involves(&self, team_a: &str, team_b: &str) -> bool {
        let home = self.home_team.eq_ignore_ascii_case(team_a) && self.away_team.eq_ignore_ascii_case(team_b);
        let swapped = self.home_team.eq_ignore_ascii_case(team_b) && self.away_team.eq_ignore_ascii_case(team_a);
        home || swapped
    }
}

/// One player's box score line
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerStatLine {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Team", default)]
    pub team: Option<String>,
    #[serde(flatten)]
    pub stats: serde_json::Map<String, serde_json::Value>,
}

impl PlayerStatLine {
    /// Look up a numeric stat by its feed field name ("Points", "Rebounds", ...)
    pub fn stat(&self, name: &str) -> Option<Decimal> {
        self.stats
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| decimal_from_json(v))
    }
}

/// Numeric JSON value (number or numeric string) as a Decimal
pub(crate) fn decimal_from_json(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Daily hashprice observation
#[derive(Debug, Clone, PartialEq)]
pub struct HashpricePoint {
    pub timestamp: DateTime<Utc>,
    /// USD earned per PH/s per day
    pub usd_per_ph_day: Decimal,
}

impl HashpricePoint {
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}
