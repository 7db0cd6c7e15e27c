//! Hyperliquid info API client

use super::errors::FetchError;
use super::http::{Endpoint, FallbackClient};
use crate::config::{Config, HyperliquidApi};
use crate::types::Candle;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

/// Candle as returned by `candleSnapshot`
#[derive(Debug, Deserialize)]
struct HlCandle {
    /// Open time (ms)
    t: i64,
    /// Close time (ms)
    #[serde(rename = "T")]
    close_t: i64,
    o: String,
    h: String,
    l: String,
    c: String,
    v: String,
}

impl TryFrom<HlCandle> for Candle {
    type Error = FetchError;

    fn try_from(raw: HlCandle) -> Result<Self, Self::Error> {
        let time = |ms: i64| {
            Utc.timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| FetchError::Decode(format!("bad candle timestamp: {}", ms)))
        };
        let price = |s: &str| Decimal::from_str(s).map_err(|e| FetchError::Decode(format!("{}: {}", s, e)));

        Ok(Candle {
            open_time: time(raw.t)?,
            close_time: time(raw.close_t)?,
            open: price(&raw.o)?,
            high: price(&raw.h)?,
            low: price(&raw.l)?,
            close: price(&raw.c)?,
            volume: price(&raw.v)?,
        })
    }
}

pub struct HyperliquidClient {
    http: FallbackClient,
    endpoint: Endpoint,
}

impl HyperliquidClient {
    pub fn new(http: FallbackClient, config: &Config) -> Self {
        Self {
            http,
            endpoint: Endpoint::new(
                "hyperliquid",
                &config.hyperliquid_api_url,
                config.proxy_for("hyperliquid"),
            ),
        }
    }

    /// Candles for `coin` (e.g. "BTC") between `start` and `end`
    pub async fn candles(
        &self,
        coin: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, FetchError> {
        let body = json!({
            "type": "candleSnapshot",
            "req": {
                "coin": coin,
                "interval": interval,
                "startTime": start.timestamp_millis(),
                "endTime": end.timestamp_millis(),
            }
        });

        let raw: Vec<HlCandle> = self
            .http
            .post_json(&self.endpoint, HyperliquidApi::INFO_PATH, &body)
            .await?;

        debug!("Fetched {} Hyperliquid candles for {}", raw.len(), coin);

        let mut candles = raw
            .into_iter()
            .map(Candle::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        candles.sort_by_key(|c| c.open_time);
        Ok(candles)
    }

    /// Current mid price for `coin`
    pub async fn mid_price(&self, coin: &str) -> Result<Decimal, FetchError> {
        let mids: HashMap<String, String> = self
            .http
            .post_json(&self.endpoint, HyperliquidApi::INFO_PATH, &json!({ "type": "allMids" }))
            .await?;

        let mid = mids
            .get(coin)
            .ok_or_else(|| FetchError::NotFound(format!("no mid price for {}", coin)))?;

        Decimal::from_str(mid).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
