//! Dexscreener pair price client

use super::errors::FetchError;
use super::http::{Endpoint, FallbackClient};
use crate::config::{Config, DexscreenerApi};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairsResponse {
    #[serde(default)]
    pairs: Option<Vec<DexPair>>,
    #[serde(default)]
    pair: Option<DexPair>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DexPair {
    #[serde(default)]
    pair_address: Option<String>,
    #[serde(default)]
    price_usd: Option<String>,
}

pub struct DexscreenerClient {
    http: FallbackClient,
    endpoint: Endpoint,
}

impl DexscreenerClient {
    pub fn new(http: FallbackClient, config: &Config) -> Self {
        Self {
            http,
            endpoint: Endpoint::new(
                "dexscreener",
                &config.dexscreener_api_url,
                config.proxy_for("dexscreener"),
            ),
        }
    }

    /// USD price of a pair on `chain_id`
    pub async fn pair_price_usd(&self, chain_id: &str, pair_address: &str) -> Result<Decimal, FetchError> {
        let response: PairsResponse = self
            .http
            .get_json(&self.endpoint, &DexscreenerApi::pair_path(chain_id, pair_address), &[], &[])
            .await?;

        price_from_response(response, pair_address)
    }
}

fn price_from_response(response: PairsResponse, pair_address: &str) -> Result<Decimal, FetchError> {
    let pairs: Vec<DexPair> = response
        .pairs
        .unwrap_or_default()
        .into_iter()
        .chain(response.pair)
        .collect();

    // Prefer the exact pair; the endpoint sometimes returns related pairs too
    let pair = pairs
        .iter()
        .find(|p| {
            p.pair_address
                .as_deref()
                .map(|a| a.eq_ignore_ascii_case(pair_address))
                .unwrap_or(false)
        })
        .or_else(|| pairs.first())
        .ok_or_else(|| FetchError::NotFound(format!("pair {}", pair_address)))?;

    let price = pair
        .price_usd
        .as_deref()
        .ok_or_else(|| FetchError::NotFound(format!("priceUsd for pair {}", pair_address)))?;

    Decimal::from_str(price).map_err(|e| FetchError::Decode(e.to_string()))
}
