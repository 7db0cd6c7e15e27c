//! Player stat over/under rule

use super::game::validate_teams;
use super::{Amount, RuleError, Verdict};
use crate::sources::League;
use crate::types::{Game, GameStatus, PlayerStatLine, Recommendation};
use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::Deserialize;

/// Codes for a player prop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StatOutcomes {
    pub over: Recommendation,
    pub under: Recommendation,
    pub fifty_fifty: Recommendation,
    #[serde(default)]
    pub too_early: Recommendation,
}

/// "Will Jayson Tatum score more than 27.5 points vs LAL?"
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerStatRule {
    pub league: League,
    pub date: NaiveDate,
    pub home: String,
    pub away: String,
    /// Player name as printed in the box score
    pub player: String,
    /// Box score field, e.g. "Points", "Rebounds", "HomeRuns"
    pub stat: String,
    pub line: Amount,
    pub outcomes: StatOutcomes,
    /// Code when the player has no minutes; defaults to `fifty_fifty`
    #[serde(default)]
    pub did_not_play: Option<Recommendation>,
}

impl PlayerStatRule {
    pub fn validate(&self) -> Result<()> {
        validate_teams(&self.home, &self.away)?;
        if self.player.trim().is_empty() || self.stat.trim().is_empty() {
            bail!("player and stat must be set");
        }
        if !self.league.has_box_scores() {
            bail!("{} box scores are not supported", self.league);
        }
        Ok(())
    }

    /// Box score lines are only consulted once `game` is final
    pub fn evaluate(&self, game: &Game, lines: &[PlayerStatLine]) -> Result<Verdict, RuleError> {
        let outcomes = &self.outcomes;

        match &game.status {
            GameStatus::Canceled | GameStatus::NotNecessary | GameStatus::Forfeit => {
                return Ok(Verdict::new(outcomes.fifty_fifty, format!("game {}", game.status)))
            }
            s if !s.is_final() => {
                return Ok(Verdict::new(outcomes.too_early, format!("game status {}", s)))
            }
            _ => {}
        }

        let line = lines
            .iter()
            .find(|l| l.name.trim().eq_ignore_ascii_case(self.player.trim()));

        let line = match line {
            Some(l) if !did_not_play(l) => l,
            _ => {
                return Ok(Verdict::new(
                    self.did_not_play.unwrap_or(outcomes.fifty_fifty),
                    format!("{} did not play", self.player),
                ))
            }
        };

        let value = line
            .stat(&self.stat)
            .ok_or_else(|| RuleError::NoData(format!("{} has no {} stat", self.player, self.stat)))?;

        let who = match &line.team {
            Some(team) => format!("{} ({})", line.name, team),
            None => line.name.clone(),
        };

        if value > self.line.value() {
            Ok(Verdict::new(
                outcomes.over,
                format!("{} {} {} > {}", who, value.normalize(), self.stat, self.line),
            ))
        } else {
            Ok(Verdict::new(
                outcomes.under,
                format!("{} {} {} <= {}", who, value.normalize(), self.stat, self.line),
            ))
        }
    }
}

/// Box scores list inactive players with zero minutes
fn did_not_play(line: &PlayerStatLine) -> bool {
    line.stat("Minutes").is_some_and(|m| m.is_zero())
        && line.stat("Games").map_or(true, |g| g.is_zero())
}
