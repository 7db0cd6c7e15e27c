//! Configuration management for the market resolver

use anyhow::Result;
use std::env;
use std::time::Duration;

/// Resolver configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Relay tried before every primary endpoint (optional)
    pub proxy_base_url: Option<String>,

    /// Primary API base URLs
    pub binance_api_url: String,
    pub hyperliquid_api_url: String,
    pub dexscreener_api_url: String,
    pub sportsdata_api_url: String,
    pub hashrate_index_api_url: String,

    /// SportsData.io subscription key
    pub sportsdata_api_key: Option<String>,

    /// Hashrate Index API key
    pub hashrate_index_api_key: Option<String>,

    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,

    /// Path to SQLite database holding the resolution history
    pub database_path: String,

    /// Whether resolutions are written to the history database
    pub record_history: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_base_url: None,
            binance_api_url: BinanceApi::BASE_URL.to_string(),
            hyperliquid_api_url: HyperliquidApi::BASE_URL.to_string(),
            dexscreener_api_url: DexscreenerApi::BASE_URL.to_string(),
            sportsdata_api_url: SportsDataApi::BASE_URL.to_string(),
            hashrate_index_api_url: HashrateIndexApi::BASE_URL.to_string(),
            sportsdata_api_key: None,
            hashrate_index_api_key: None,
            http_timeout: Duration::from_secs(10),
            database_path: "resolutions.db".to_string(),
            record_history: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let proxy_base_url = non_empty("PROXY_BASE_URL").map(|url| url.trim_end_matches('/').to_string());

        let binance_api_url = non_empty("BINANCE_API_URL").unwrap_or(defaults.binance_api_url);
        let hyperliquid_api_url = non_empty("HYPERLIQUID_API_URL").unwrap_or(defaults.hyperliquid_api_url);
        let dexscreener_api_url = non_empty("DEXSCREENER_API_URL").unwrap_or(defaults.dexscreener_api_url);
        let sportsdata_api_url = non_empty("SPORTSDATA_API_URL").unwrap_or(defaults.sportsdata_api_url);
        let hashrate_index_api_url =
            non_empty("HASHRATE_INDEX_API_URL").unwrap_or(defaults.hashrate_index_api_url);

        let sportsdata_api_key = non_empty("SPORTSDATA_API_KEY");
        let hashrate_index_api_key = non_empty("HASHRATE_INDEX_API_KEY");

        let http_timeout = env::var("HTTP_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        let database_path = env::var("DATABASE_PATH").unwrap_or(defaults.database_path);

        let record_history = env::var("RECORD_HISTORY")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true);

        if http_timeout.is_zero() {
            anyhow::bail!("HTTP_TIMEOUT_SECONDS must be greater than zero");
        }

        Ok(Self {
            proxy_base_url,
            binance_api_url,
            hyperliquid_api_url,
            dexscreener_api_url,
            sportsdata_api_url,
            hashrate_index_api_url,
            sportsdata_api_key,
            hashrate_index_api_key,
            http_timeout,
            database_path,
            record_history,
        })
    }

    /// Proxy URL for one source, e.g. `https://relay.example/binance`
    pub fn proxy_for(&self, source: &str) -> Option<String> {
        self.proxy_base_url
            .as_ref()
            .map(|base| format!("{}/{}", base, source))
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// Binance REST API
pub struct BinanceApi;

impl BinanceApi {
    pub const BASE_URL: &'static str = "https://api.binance.com";
    pub const KLINES_PATH: &'static str = "/api/v3/klines";
    pub const TICKER_PRICE_PATH: &'static str = "/api/v3/ticker/price";
    /// Max klines Binance returns per request
    pub const KLINES_LIMIT: usize = 1000;
}

/// Hyperliquid info API
pub struct HyperliquidApi;

impl HyperliquidApi {
    pub const BASE_URL: &'static str = "https://api.hyperliquid.xyz";
    pub const INFO_PATH: &'static str = "/info";
}

/// Dexscreener REST API
pub struct DexscreenerApi;

impl DexscreenerApi {
    pub const BASE_URL: &'static str = "https://api.dexscreener.com";

    pub fn pair_path(chain_id: &str, pair_address: &str) -> String {
        format!(
            "/latest/dex/pairs/{}/{}",
            urlencoding::encode(chain_id),
            urlencoding::encode(pair_address)
        )
    }
}

/// SportsData.io REST API
pub struct SportsDataApi;

impl SportsDataApi {
    pub const BASE_URL: &'static str = "https://api.sportsdata.io";
}

/// Hashrate Index API
pub struct HashrateIndexApi;

impl HashrateIndexApi {
    pub const BASE_URL: &'static str = "https://api.hashrateindex.com";
    pub const HASHPRICE_PATH: &'static str = "/v1/hashrateindex/hashprice";
}
