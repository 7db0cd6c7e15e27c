//! Game winner rule

use super::{RuleError, Verdict};
use crate::sources::League;
use crate::types::{Game, GameStatus, Recommendation};
use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::cmp::Ordering;

/// Codes for a two-team game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GameOutcomes {
    pub home: Recommendation,
    pub away: Recommendation,
    /// Canceled games and ties
    pub fifty_fifty: Recommendation,
    #[serde(default)]
    pub too_early: Recommendation,
}

/// "Lakers vs. Celtics": which team wins the game on `date`
#[derive(Debug, Clone, Deserialize)]
pub struct GameWinnerRule {
    pub league: League,
    pub date: NaiveDate,
    /// Team keys as used by the feed ("LAL", "BOS")
    pub home: String,
    pub away: String,
    pub outcomes: GameOutcomes,
    /// Code for a postponed game; defaults to `too_early`
    #[serde(default)]
    pub postponed: Option<Recommendation>,
}

impl GameWinnerRule {
    pub fn validate(&self) -> Result<()> {
        validate_teams(&self.home, &self.away)
    }

    pub fn evaluate(&self, games: &[Game]) -> Result<Verdict, RuleError> {
        let game = find_game(games, &self.home, &self.away).ok_or_else(|| {
            RuleError::NoData(format!(
                "no {} game {} vs {} on {}",
                self.league, self.home, self.away, self.date
            ))
        })?;

        let outcomes = &self.outcomes;
        let status = &game.status;

        match status {
            s if s.is_final() => self.decide_by_score(game),
            GameStatus::Forfeit => match self.decide_by_score(game) {
                Ok(verdict) => Ok(verdict),
                Err(_) => Ok(Verdict::new(outcomes.fifty_fifty, "forfeit without a score")),
            },
            GameStatus::Canceled | GameStatus::NotNecessary => {
                Ok(Verdict::new(outcomes.fifty_fifty, format!("game {}", status)))
            }
            GameStatus::Postponed => Ok(Verdict::new(
                self.postponed.unwrap_or(outcomes.too_early),
                "game postponed",
            )),
            _ => Ok(Verdict::new(outcomes.too_early, format!("game status {}", status))),
        }
    }

    /// Winner is decided by team, not by the feed's home/away slot
    fn decide_by_score(&self, game: &Game) -> Result<Verdict, RuleError> {
        let (home_score, away_score) = match (game.home_score, game.away_score) {
            (Some(h), Some(a)) => (h, a),
            _ => {
                return Err(RuleError::NoData(format!(
                    "game {} is {} but has no score",
                    game.game_id, game.status
                )))
            }
        };

        let score = format!(
            "{} {} - {} {} ({})",
            game.home_team, home_score, away_score, game.away_team, game.status
        );

        let winner = match home_score.cmp(&away_score) {
            Ordering::Greater => &game.home_team,
            Ordering::Less => &game.away_team,
            Ordering::Equal => return Ok(Verdict::new(self.outcomes.fifty_fifty, format!("tie: {}", score))),
        };

        if winner.eq_ignore_ascii_case(&self.home) {
            Ok(Verdict::new(self.outcomes.home, format!("{} won: {}", self.home, score)))
        } else {
            Ok(Verdict::new(self.outcomes.away, format!("{} won: {}", self.away, score)))
        }
    }
}

/// The game between two teams, in either home/away order. A doubleheader
/// resolves on the first game listed.
pub fn find_game<'a>(games: &'a [Game], team_a: &str, team_b: &str) -> Option<&'a Game> {
    games.iter().find(|g| g.involves(team_a, team_b))
}

pub(crate) fn validate_teams(home: &str, away: &str) -> Result<()> {
    if home.trim().is_empty() || away.trim().is_empty() {
        bail!("both teams must be set");
    }
    if home.eq_ignore_ascii_case(away) {
        bail!("a team cannot play itself: {}", home);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(status: GameStatus, home: &str, away: &str, scores: Option<(i64, i64)>) -> Game {
        Game {
            game_id: "1".to_string(),
            status,
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_score: scores.map(|s| s.0),
            away_score: scores.map(|s| s.1),
        }
    }

    fn rule() -> GameWinnerRule {
        GameWinnerRule {
            league: League::Nba,
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            home: "LAL".to_string(),
            away: "BOS".to_string(),
            outcomes: GameOutcomes {
                home: Recommendation::P2,
                away: Recommendation::P1,
                fifty_fifty: Recommendation::P3,
                too_early: Recommendation::P4,
            },
            postponed: None,
        }
    }

    #[test]
    fn test_final_home_win() {
        let games = vec![
            game(GameStatus::Final, "NYK", "MIA", Some((99, 100))),
            game(GameStatus::Final, "LAL", "BOS", Some((112, 104))),
        ];
        let verdict = rule().evaluate(&games).unwrap();
        assert_eq!(verdict.recommendation, Recommendation::P2);
        assert!(verdict.detail.contains("LAL 112 - 104 BOS"));
    }

    #[test]
    fn test_overtime_away_win() {
        let games = vec![game(GameStatus::FinalOvertime, "LAL", "BOS", Some((118, 120)))];
        assert_eq!(rule().evaluate(&games).unwrap().recommendation, Recommendation::P1);
    }

    #[test]
    fn test_swapped_home_away_maps_by_team() {
        // Feed lists BOS at home; LAL still maps to the "home" code
        let games = vec![game(GameStatus::Final, "BOS", "LAL", Some((90, 101)))];
        assert_eq!(rule().evaluate(&games).unwrap().recommendation, Recommendation::P2);
    }

    #[test]
    fn test_canceled_is_fifty_fifty() {
        let games = vec![game(GameStatus::Canceled, "LAL", "BOS", None)];
        assert_eq!(rule().evaluate(&games).unwrap().recommendation, Recommendation::P3);
    }

    #[test]
    fn test_tie_is_fifty_fifty() {
        let games = vec![game(GameStatus::Final, "LAL", "BOS", Some((20, 20)))];
        assert_eq!(rule().evaluate(&games).unwrap().recommendation, Recommendation::P3);
    }

    #[test]
    fn test_postponed_uses_override() {
        let games = vec![game(GameStatus::Postponed, "LAL", "BOS", None)];
        assert_eq!(rule().evaluate(&games).unwrap().recommendation, Recommendation::P4);

        let mut with_override = rule();
        with_override.postponed = Some(Recommendation::P3);
        assert_eq!(with_override.evaluate(&games).unwrap().recommendation, Recommendation::P3);
    }

    #[test]
    fn test_in_progress_is_too_early() {
        let games = vec![game(GameStatus::InProgress, "LAL", "BOS", Some((50, 48)))];
        assert_eq!(rule().evaluate(&games).unwrap().recommendation, Recommendation::P4);
    }

    #[test]
    fn test_missing_game_is_no_data() {
        let games = vec![game(GameStatus::Final, "NYK", "MIA", Some((99, 100)))];
        assert!(matches!(rule().evaluate(&games), Err(RuleError::NoData(_))));
    }

    #[test]
    fn test_final_without_scores_is_no_data() {
        let games = vec![game(GameStatus::Final, "LAL", "BOS", None)];
        assert!(rule().evaluate(&games).is_err());
    }

    #[test]
    fn test_validate_teams() {
        assert!(validate_teams("LAL", "BOS").is_ok());
        assert!(validate_teams("LAL", "lal").is_err());
        assert!(validate_teams("", "BOS").is_err());
    }
}
