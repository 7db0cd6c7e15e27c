//! Question files
//!
//! A question file holds everything a one-off resolution script used to
//! hard-code: what to fetch, how to compare, and which `pN` code each
//! outcome maps to.
//!
//! ```json
//! {
//!   "id": "btc-dip-95k-june",
//!   "title": "Will Bitcoin dip to $95,000 in June?",
//!   "fallback": "p4",
//!   "rule": {
//!     "kind": "price_threshold",
//!     "market": { "source": "binance", "symbol": "BTCUSDT", "interval": "1m" },
//!     "window": { "start": "2025-06-01 00:00", "end": "2025-07-01 00:00" },
//!     "trigger": "touch_at_or_below",
//!     "threshold": "$95,000",
//!     "outcomes": { "yes": "p2", "no": "p1", "too_early": "p4" }
//!   }
//! }
//! ```

use crate::rules::{GameWinnerRule, HashpriceRule, PlayerStatRule, PriceDirectionRule, PriceThresholdRule};
use crate::types::Recommendation;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub rule: Rule,
    /// Code printed when the data cannot be fetched or is missing
    #[serde(default)]
    pub fallback: Recommendation,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    PriceThreshold(PriceThresholdRule),
    PriceDirection(PriceDirectionRule),
    GameWinner(GameWinnerRule),
    PlayerStat(PlayerStatRule),
    Hashprice(HashpriceRule),
}

impl Rule {
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::PriceThreshold(_) => "price_threshold",
            Rule::PriceDirection(_) => "price_direction",
            Rule::GameWinner(_) => "game_winner",
            Rule::PlayerStat(_) => "player_stat",
            Rule::Hashprice(_) => "hashprice",
        }
    }
}

impl Question {
    /// Read and validate a question file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read question file {}", path.display()))?;

        let question: Question = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse question file {}", path.display()))?;

        question
            .validate()
            .with_context(|| format!("Invalid question {}", question.id))?;

        Ok(question)
    }

    /// All `*.json` question files in `dir`, sorted by file name
    pub fn discover(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().map(|ext| ext == "json").unwrap_or(false))
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Checks that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            bail!("question id is empty");
        }

        match &self.rule {
            Rule::PriceThreshold(rule) => rule.market.validate(),
            Rule::PriceDirection(rule) => rule.validate(),
            Rule::GameWinner(rule) => rule.validate(),
            Rule::PlayerStat(rule) => rule.validate(),
            Rule::Hashprice(_) => Ok(()),
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }

    /// Id reported for a file that could not be loaded: its file stem
    pub fn id_from_path(path: &Path) -> String {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}
