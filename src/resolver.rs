//! Question resolver
//!
//! Fetches the data a question needs, hands it to the rule, and turns any
//! failure into the question's fallback code. `resolve` never returns an
//! error: a resolution run always ends with exactly one recommendation.

use crate::config::Config;
use crate::question::{Question, Rule};
use crate::rules::game::find_game;
use crate::rules::price::PriceSeries;
use crate::rules::{PriceMarket, PriceSourceKind, RuleError, Verdict};
use crate::sources::{
    BinanceClient, DexscreenerClient, FallbackClient, FetchError, HashrateIndexClient, HyperliquidClient,
    SportsDataClient,
};
use crate::types::{Candle, Recommendation, Resolution};
use crate::window::TimeWindow;
use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Rule(#[from] RuleError),
}

pub struct Resolver {
    binance: BinanceClient,
    hyperliquid: HyperliquidClient,
    dexscreener: DexscreenerClient,
    sportsdata: SportsDataClient,
    hashrate: HashrateIndexClient,
}

impl Resolver {
    pub fn new(config: &Config) -> Result<Self> {
        let http = FallbackClient::new(config.http_timeout)?;

        Ok(Self {
            binance: BinanceClient::new(http.clone(), config),
            hyperliquid: HyperliquidClient::new(http.clone(), config),
            dexscreener: DexscreenerClient::new(http.clone(), config),
            sportsdata: SportsDataClient::new(http.clone(), config),
            hashrate: HashrateIndexClient::new(http, config),
        })
    }

    /// Resolve one question as of now
    pub async fn resolve(&self, question: &Question) -> Resolution {
        self.resolve_at(question, Utc::now()).await
    }

    /// Resolve one question as of `now`
    pub async fn resolve_at(&self, question: &Question, now: DateTime<Utc>) -> Resolution {
        debug!("Resolving {} ({})", question.id, question.rule.kind());

        match self.evaluate(question, now).await {
            Ok(verdict) => {
                info!(
                    "{} -> {} | {}",
                    question.id, verdict.recommendation, verdict.detail
                );
                Resolution {
                    question_id: question.id.clone(),
                    recommendation: verdict.recommendation,
                    detail: verdict.detail,
                    fell_back: false,
                }
            }
            Err(e) => {
                error!(
                    "{} could not be resolved, using fallback {}: {}",
                    question.id, question.fallback, e
                );
                Resolution::fallback(question.id.clone(), question.fallback, e.to_string())
            }
        }
    }

    /// Load and resolve one question file. A file that cannot be loaded
    /// resolves to the default code under its file stem.
    pub async fn resolve_file(&self, path: &Path) -> Resolution {
        self.resolve_file_at(path, Utc::now()).await
    }

    async fn resolve_file_at(&self, path: &Path, now: DateTime<Utc>) -> Resolution {
        match Question::load(path) {
            Ok(question) => self.resolve_at(&question, now).await,
            Err(e) => {
                error!("{:#}", e);
                Resolution::fallback(Question::id_from_path(path), Recommendation::default(), format!("{:#}", e))
            }
        }
    }

    /// Resolve question files with up to `concurrency` in flight; one
    /// resolution per path, in path order
    pub async fn resolve_files(&self, paths: &[PathBuf], concurrency: usize) -> Vec<Resolution> {
        let now = Utc::now();
        stream::iter(paths)
            .map(|path| self.resolve_file_at(path, now))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    /// Resolve independent questions with up to `concurrency` in flight.
    /// Output order matches input order.
    pub async fn resolve_all(&self, questions: &[Question], concurrency: usize) -> Vec<Resolution> {
        let now = Utc::now();
        stream::iter(questions)
            .map(|q| self.resolve_at(q, now))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    async fn evaluate(&self, question: &Question, now: DateTime<Utc>) -> Result<Verdict, ResolveError> {
        match &question.rule {
            Rule::PriceThreshold(rule) => {
                if !rule.window.has_started(now) {
                    return Ok(rule.evaluate(&PriceSeries::default(), now)?);
                }
                let series = self.price_series(&rule.market, &rule.window, now).await?;
                Ok(rule.evaluate(&series, now)?)
            }
            Rule::PriceDirection(rule) => {
                if !rule.window.has_ended(now) {
                    return Ok(rule.evaluate(&PriceSeries::default(), now)?);
                }
                let series = self.price_series(&rule.market, &rule.window, now).await?;
                Ok(rule.evaluate(&series, now)?)
            }
            Rule::GameWinner(rule) => {
                let games = self.sportsdata.games_by_date(rule.league, rule.date).await?;
                Ok(rule.evaluate(&games)?)
            }
            Rule::PlayerStat(rule) => {
                let games = self.sportsdata.games_by_date(rule.league, rule.date).await?;
                let game = find_game(&games, &rule.home, &rule.away).ok_or_else(|| {
                    RuleError::NoData(format!(
                        "no {} game {} vs {} on {}",
                        rule.league, rule.home, rule.away, rule.date
                    ))
                })?;

                let lines = if game.status.is_final() {
                    self.sportsdata.player_stats(rule.league, &game.game_id).await?
                } else {
                    Vec::new()
                };
                Ok(rule.evaluate(game, &lines)?)
            }
            Rule::Hashprice(rule) => {
                let points = self.hashrate.daily_hashprice().await?;
                Ok(rule.evaluate(&points, now)?)
            }
        }
    }

    /// Candles covering `window`, or a single spot observation
    async fn price_series(
        &self,
        market: &PriceMarket,
        window: &TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<PriceSeries, FetchError> {
        // No point asking for candles that do not exist yet
        let end = window.end.min(now);

        match (market.source, market.interval.as_deref()) {
            (PriceSourceKind::Binance, Some(interval)) => {
                let candles = self.binance.klines(&market.symbol, interval, window.start, end).await?;
                Ok(PriceSeries::from_candles(candles))
            }
            (PriceSourceKind::Binance, None) => {
                let price = self.binance.ticker_price(&market.symbol).await?;
                Ok(PriceSeries::from_spot(Candle::spot(price, now)))
            }
            (PriceSourceKind::Hyperliquid, Some(interval)) => {
                let candles = self.hyperliquid.candles(&market.symbol, interval, window.start, end).await?;
                Ok(PriceSeries::from_candles(candles))
            }
            (PriceSourceKind::Hyperliquid, None) => {
                let price = self.hyperliquid.mid_price(&market.symbol).await?;
                Ok(PriceSeries::from_spot(Candle::spot(price, now)))
            }
            (PriceSourceKind::Dexscreener, _) => {
                let chain = market.chain.as_deref().unwrap_or_default();
                let price = self.dexscreener.pair_price_usd(chain, &market.symbol).await?;
                Ok(PriceSeries::from_spot(Candle::spot(price, now)))
            }
        }
    }
}

/// Fallback resolutions for files that cannot be resolved at all, e.g.
/// when the configuration is broken
pub fn unresolved_files(paths: &[PathBuf], reason: &str) -> Vec<Resolution> {
    paths
        .iter()
        .map(|path| match Question::load(path) {
            Ok(question) => Resolution::fallback(question.id, question.fallback, reason),
            Err(_) => Resolution::fallback(Question::id_from_path(path), Recommendation::default(), reason),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Every endpoint points at a closed local port
    fn offline_config() -> Config {
        let dead = "http://127.0.0.1:9".to_string();
        Config {
            proxy_base_url: Some(format!("{}/relay", dead)),
            binance_api_url: dead.clone(),
            hyperliquid_api_url: dead.clone(),
            dexscreener_api_url: dead.clone(),
            sportsdata_api_url: dead.clone(),
            hashrate_index_api_url: dead,
            sportsdata_api_key: Some("test".to_string()),
            hashrate_index_api_key: Some("test".to_string()),
            http_timeout: Duration::from_secs(2),
            ..Default::default()
        }
    }

    fn question(json: &str) -> Question {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_unreachable_source_uses_fallback() {
        let resolver = Resolver::new(&offline_config()).unwrap();
        let q = question(
            r#"{
                "id": "nba-game",
                "fallback": "p3",
                "rule": {
                    "kind": "game_winner", "league": "nba", "date": "2025-01-15",
                    "home": "LAL", "away": "BOS",
                    "outcomes": { "home": "p2", "away": "p1", "fifty_fifty": "p3" }
                }
            }"#,
        );

        let resolution = resolver.resolve(&q).await;
        assert!(resolution.fell_back);
        assert_eq!(resolution.output_line(), "recommendation: p3");
    }

    #[tokio::test]
    async fn test_future_window_resolves_without_network() {
        let resolver = Resolver::new(&offline_config()).unwrap();
        let q = question(
            r#"{
                "id": "btc-future",
                "rule": {
                    "kind": "price_threshold",
                    "market": { "source": "binance", "symbol": "BTCUSDT", "interval": "1h" },
                    "window": { "start": "2099-01-01 00:00", "end": "2099-02-01 00:00" },
                    "trigger": "touch_at_or_above",
                    "threshold": "1m",
                    "outcomes": { "yes": "p2", "no": "p1", "too_early": "p5" }
                }
            }"#,
        );

        let resolution = resolver.resolve(&q).await;
        assert!(!resolution.fell_back);
        assert_eq!(resolution.output_line(), "recommendation: p5");
    }

    #[tokio::test]
    async fn test_resolve_all_keeps_order() {
        let resolver = Resolver::new(&offline_config()).unwrap();
        let questions: Vec<Question> = ["a", "b", "c"]
            .iter()
            .map(|id| {
                question(&format!(
                    r#"{{"id": "{}", "fallback": "p1", "rule": {{
                        "kind": "hashprice", "date": "2025-03-02", "comparator": "above",
                        "threshold": 50, "outcomes": {{ "yes": "p2", "no": "p1" }} }} }}"#,
                    id
                ))
            })
            .collect();

        let resolutions = resolver.resolve_all(&questions, 2).await;
        let ids: Vec<&str> = resolutions.iter().map(|r| r.question_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(resolutions.iter().all(|r| r.fell_back));
    }

    const FUTURE_QUESTION: &str = r#"{
        "id": "btc-future",
        "fallback": "p3",
        "rule": {
            "kind": "price_threshold",
            "market": { "source": "binance", "symbol": "BTCUSDT", "interval": "1h" },
            "window": { "start": "2099-01-01 00:00", "end": "2099-02-01 00:00" },
            "trigger": "touch_at_or_above",
            "threshold": "1m",
            "outcomes": { "yes": "p2", "no": "p1", "too_early": "p5" }
        }
    }"#;

    #[tokio::test]
    async fn test_missing_file_resolves_to_default_code() {
        let resolver = Resolver::new(&offline_config()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let resolution = resolver.resolve_file(&dir.path().join("gone.json")).await;

        assert!(resolution.fell_back);
        assert_eq!(resolution.question_id, "gone");
        assert_eq!(resolution.output_line(), "recommendation: p4");
    }

    #[tokio::test]
    async fn test_resolve_files_yields_one_line_per_file() {
        let resolver = Resolver::new(&offline_config()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a-broken.json"), r#"{"id": "broken", "rule": {"#).unwrap();
        std::fs::write(dir.path().join("b-future.json"), FUTURE_QUESTION).unwrap();

        let paths = Question::discover(dir.path()).unwrap();
        let resolutions = resolver.resolve_files(&paths, 4).await;

        let lines: Vec<String> = resolutions
            .iter()
            .map(|r| format!("{} {}", r.question_id, r.output_line()))
            .collect();
        assert_eq!(
            lines,
            vec!["a-broken recommendation: p4", "btc-future recommendation: p5"]
        );
    }

    #[test]
    fn test_unresolved_files_keep_question_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a-broken.json"), "not json").unwrap();
        std::fs::write(dir.path().join("b-future.json"), FUTURE_QUESTION).unwrap();
        let paths = Question::discover(dir.path()).unwrap();

        let resolutions = unresolved_files(&paths, "bad config");

        assert_eq!(resolutions.len(), 2);
        assert_eq!(resolutions[0].question_id, "a-broken");
        assert_eq!(resolutions[0].recommendation, Recommendation::P4);
        assert_eq!(resolutions[1].question_id, "btc-future");
        assert_eq!(resolutions[1].recommendation, Recommendation::P3);
        assert!(resolutions.iter().all(|r| r.fell_back && r.detail == "bad config"));
    }
}
