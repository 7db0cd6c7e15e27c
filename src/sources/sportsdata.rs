//! SportsData.io scores and box score client

use super::errors::FetchError;
use super::http::{Endpoint, FallbackClient};
use crate::config::Config;
use crate::types::{Game, GameStatus, PlayerStatLine};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// Leagues the scores feed is queried for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum League {
    Nba,
    Wnba,
    Nfl,
    Mlb,
    Nhl,
    Cbb,
    Cfb,
}

impl League {
    fn path_segment(&self) -> &'static str {
        match self {
            League::Nba => "nba",
            League::Wnba => "wnba",
            League::Nfl => "nfl",
            League::Mlb => "mlb",
            League::Nhl => "nhl",
            League::Cbb => "cbb",
            League::Cfb => "cfb",
        }
    }

    /// Path of the games-by-date endpoint; NFL names it ScoresByDate
    pub fn games_by_date_path(&self, date: NaiveDate) -> String {
        let endpoint = match self {
            League::Nfl => "ScoresByDate",
            _ => "GamesByDate",
        };
        format!(
            "/v3/{}/scores/json/{}/{}",
            self.path_segment(),
            endpoint,
            sportsdata_date(date)
        )
    }

    /// Whether the feed has a per-game box score endpoint for this league
    pub fn has_box_scores(&self) -> bool {
        !matches!(self, League::Nfl | League::Cfb)
    }

    pub fn player_stats_path(&self, game_id: &str) -> String {
        format!(
            "/v3/{}/stats/json/PlayerGameStatsByGame/{}",
            self.path_segment(),
            urlencoding::encode(game_id)
        )
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment().to_uppercase())
    }
}

/// SportsData.io date format, e.g. `2024-OCT-22`
pub fn sportsdata_date(date: NaiveDate) -> String {
    date.format("%Y-%b-%d").to_string().to_uppercase()
}

/// Raw game/score record; field names differ between leagues
#[derive(Debug, Deserialize)]
struct RawGame {
    #[serde(rename = "GameID", default)]
    game_id: Option<i64>,
    #[serde(rename = "ScoreID", default)]
    score_id: Option<i64>,
    #[serde(rename = "GameKey", default)]
    game_key: Option<String>,
    #[serde(rename = "Status", default)]
    status: Option<String>,
    #[serde(rename = "HomeTeam", default)]
    home_team: Option<String>,
    #[serde(rename = "AwayTeam", default)]
    away_team: Option<String>,
    #[serde(rename = "HomeTeamScore", default)]
    home_team_score: Option<i64>,
    #[serde(rename = "AwayTeamScore", default)]
    away_team_score: Option<i64>,
    /// NFL
    #[serde(rename = "HomeScore", default)]
    home_score: Option<i64>,
    #[serde(rename = "AwayScore", default)]
    away_score: Option<i64>,
    /// MLB
    #[serde(rename = "HomeTeamRuns", default)]
    home_team_runs: Option<i64>,
    #[serde(rename = "AwayTeamRuns", default)]
    away_team_runs: Option<i64>,
}

impl From<RawGame> for Game {
    fn from(raw: RawGame) -> Self {
        let game_id = raw
            .game_id
            .or(raw.score_id)
            .map(|id| id.to_string())
            .or(raw.game_key)
            .unwrap_or_default();

        Game {
            game_id,
            status: raw
                .status
                .as_deref()
                .map(GameStatus::from)
                .unwrap_or(GameStatus::Scheduled),
            home_team: raw.home_team.unwrap_or_default(),
            away_team: raw.away_team.unwrap_or_default(),
            home_score: raw.home_team_score.or(raw.home_score).or(raw.home_team_runs),
            away_score: raw.away_team_score.or(raw.away_score).or(raw.away_team_runs),
        }
    }
}

pub struct SportsDataClient {
    http: FallbackClient,
    endpoint: Endpoint,
    api_key: Option<String>,
}

impl SportsDataClient {
    pub fn new(http: FallbackClient, config: &Config) -> Self {
        Self {
            http,
            endpoint: Endpoint::new(
                "sportsdata",
                &config.sportsdata_api_url,
                config.proxy_for("sportsdata"),
            ),
            api_key: config.sportsdata_api_key.clone(),
        }
    }

    fn key_query(&self) -> Result<Vec<(&'static str, String)>, FetchError> {
        let key = self
            .api_key
            .clone()
            .ok_or(FetchError::MissingApiKey("SPORTSDATA_API_KEY"))?;
        Ok(vec![("key", key)])
    }

    /// All games of `league` on `date`
    pub async fn games_by_date(&self, league: League, date: NaiveDate) -> Result<Vec<Game>, FetchError> {
        let query = self.key_query()?;
        let raw: Vec<RawGame> = self
            .http
            .get_json(&self.endpoint, &league.games_by_date_path(date), &query, &[])
            .await?;

        debug!("Fetched {} {} games for {}", raw.len(), league, date);
        Ok(raw.into_iter().map(Game::from).collect())
    }

    /// Box score lines for one game
    pub async fn player_stats(&self, league: League, game_id: &str) -> Result<Vec<PlayerStatLine>, FetchError> {
        if !league.has_box_scores() {
            return Err(FetchError::NotFound(format!("{} box scores", league)));
        }

        let query = self.key_query()?;
        self.http
            .get_json(&self.endpoint, &league.player_stats_path(game_id), &query, &[])
            .await
    }
}
