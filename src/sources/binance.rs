//! Binance klines and ticker client

use super::errors::FetchError;
use super::http::{Endpoint, FallbackClient};
use crate::config::{BinanceApi, Config};
use crate::types::Candle;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, warn};

/// Safety cap on kline pages per request window
const MAX_PAGES: usize = 100;

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: String,
}

pub struct BinanceClient {
    http: FallbackClient,
    endpoint: Endpoint,
}

impl BinanceClient {
    pub fn new(http: FallbackClient, config: &Config) -> Self {
        Self {
            http,
            endpoint: Endpoint::new("binance", &config.binance_api_url, config.proxy_for("binance")),
        }
    }

    /// Fetch every kline opening in `[start, end]`, paging 1000 at a time
    pub async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, FetchError> {
        let mut candles: Vec<Candle> = Vec::new();
        let mut cursor = start.timestamp_millis();
        let end_ms = end.timestamp_millis();

        for page in 0..MAX_PAGES {
            let query = vec![
                ("symbol", symbol.to_uppercase()),
                ("interval", interval.to_string()),
                ("startTime", cursor.to_string()),
                ("endTime", end_ms.to_string()),
                ("limit", BinanceApi::KLINES_LIMIT.to_string()),
            ];

            let rows: Vec<Vec<Value>> = self
                .http
                .get_json(&self.endpoint, BinanceApi::KLINES_PATH, &query, &[])
                .await?;

            let batch_size = rows.len();
            debug!("Fetched {} klines for {} (page {})", batch_size, symbol, page + 1);

            for row in &rows {
                candles.push(parse_kline(row)?);
            }

            if batch_size < BinanceApi::KLINES_LIMIT {
                return Ok(candles);
            }

            match candles.last() {
                Some(last) => cursor = last.close_time.timestamp_millis() + 1,
                None => return Ok(candles),
            }

            if cursor > end_ms {
                return Ok(candles);
            }
        }

        warn!("Reached page limit of {} while fetching {} klines", MAX_PAGES, symbol);
        Ok(candles)
    }

    /// Latest traded price
    pub async fn ticker_price(&self, symbol: &str) -> Result<Decimal, FetchError> {
        let query = vec![("symbol", symbol.to_uppercase())];
        let ticker: TickerPrice = self
            .http
            .get_json(&self.endpoint, BinanceApi::TICKER_PRICE_PATH, &query, &[])
            .await?;

        Decimal::from_str(&ticker.price).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Parse one kline row:
/// `[openTime, "open", "high", "low", "close", "volume", closeTime, ...]`
fn parse_kline(row: &[Value]) -> Result<Candle, FetchError> {
    if row.len() < 7 {
        return Err(FetchError::Decode(format!("kline row has {} fields", row.len())));
    }

    let millis = |v: &Value| -> Result<DateTime<Utc>, FetchError> {
        v.as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| FetchError::Decode(format!("bad kline timestamp: {}", v)))
    };
    let price = |v: &Value| -> Result<Decimal, FetchError> {
        crate::types::decimal_from_json(v)
            .ok_or_else(|| FetchError::Decode(format!("bad kline price: {}", v)))
    };

    Ok(Candle {
        open_time: millis(&row[0])?,
        open: price(&row[1])?,
        high: price(&row[2])?,
        low: price(&row[3])?,
        close: price(&row[4])?,
        volume: price(&row[5])?,
        close_time: millis(&row[6])?,
    })
}
