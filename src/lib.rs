//! Market Resolver Library
//!
//! Resolves prediction market questions from public data feeds and prints
//! a single `recommendation: pN` line per question.
//!
//! A question file declares the data to fetch (Binance or Hyperliquid
//! candles, a Dexscreener pair price, a SportsData.io game or box score,
//! the Hashrate Index hashprice), a comparison rule, and which `pN` code
//! each outcome maps to. Every request tries the proxy relay first and the
//! primary API second; when both fail the question's fallback code is used.

pub mod config;
pub mod db;
pub mod question;
pub mod resolver;
pub mod rules;
pub mod sources;
pub mod types;
pub mod window;

pub use config::Config;
pub use db::Database;
pub use question::{Question, Rule};
pub use resolver::Resolver;
pub use types::{Candle, Game, GameStatus, Recommendation, Resolution};
