//! Upstream data sources
//!
//! Each client wraps one third-party API behind the shared
//! [`FallbackClient`], which tries the proxy relay before the primary URL.

pub mod binance;
pub mod dexscreener;
pub mod errors;
pub mod hashrate;
pub mod http;
pub mod hyperliquid;
pub mod sportsdata;

pub use binance::BinanceClient;
pub use dexscreener::DexscreenerClient;
pub use errors::FetchError;
pub use hashrate::HashrateIndexClient;
pub use http::{Endpoint, FallbackClient};
pub use hyperliquid::HyperliquidClient;
pub use sportsdata::{League, SportsDataClient};
