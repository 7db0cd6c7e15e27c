//! Hashrate Index hashprice client

use super::errors::FetchError;
use super::http::{Endpoint, FallbackClient};
use crate::config::{Config, HashrateIndexApi};
use crate::types::{decimal_from_json, HashpricePoint};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct HashpriceResponse {
    #[serde(default)]
    data: Vec<RawHashprice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHashprice {
    timestamp: String,
    #[serde(alias = "hashprice", alias = "price")]
    usd_hashprice: Value,
}

impl TryFrom<RawHashprice> for HashpricePoint {
    type Error = FetchError;

    fn try_from(raw: RawHashprice) -> Result<Self, Self::Error> {
        let timestamp = parse_timestamp(&raw.timestamp)
            .ok_or_else(|| FetchError::Decode(format!("bad hashprice timestamp: {}", raw.timestamp)))?;
        let usd_per_ph_day = decimal_from_json(&raw.usd_hashprice)
            .ok_or_else(|| FetchError::Decode(format!("bad hashprice value: {}", raw.usd_hashprice)))?;

        Ok(HashpricePoint {
            timestamp,
            usd_per_ph_day,
        })
    }
}

/// Accepts full RFC 3339 timestamps or bare dates
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

pub struct HashrateIndexClient {
    http: FallbackClient,
    endpoint: Endpoint,
    api_key: Option<String>,
}

impl HashrateIndexClient {
    pub fn new(http: FallbackClient, config: &Config) -> Self {
        Self {
            http,
            endpoint: Endpoint::new(
                "hashrateindex",
                &config.hashrate_index_api_url,
                config.proxy_for("hashrateindex"),
            ),
            api_key: config.hashrate_index_api_key.clone(),
        }
    }

    /// Daily USD hashprice for the last three months
    pub async fn daily_hashprice(&self) -> Result<Vec<HashpricePoint>, FetchError> {
        let key = self
            .api_key
            .clone()
            .ok_or(FetchError::MissingApiKey("HASHRATE_INDEX_API_KEY"))?;

        let query = vec![
            ("bucket", "1D".to_string()),
            ("currency", "USD".to_string()),
            ("span", "3M".to_string()),
        ];

        let response: HashpriceResponse = self
            .http
            .get_json(&self.endpoint, HashrateIndexApi::HASHPRICE_PATH, &query, &[("X-Hi-Api-Key", key)])
            .await?;

        let mut points = response
            .data
            .into_iter()
            .map(HashpricePoint::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }
}
