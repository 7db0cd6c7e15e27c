//! Price rules: threshold touches, closing prices and up/down windows

use super::{Amount, BinaryOutcomes, Comparator, RuleError, Verdict};
use crate::types::{Candle, Recommendation};
use crate::window::TimeWindow;
use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// How long after the window end a spot reading may still settle a close
pub const SPOT_CLOSE_TOLERANCE_MINUTES: i64 = 60;

/// Exchange/aggregator the prices come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSourceKind {
    Binance,
    Hyperliquid,
    Dexscreener,
}

/// What to fetch: `BTCUSDT` on Binance, `BTC` on Hyperliquid, a pair
/// address on Dexscreener
#[derive(Debug, Clone, Deserialize)]
pub struct PriceMarket {
    pub source: PriceSourceKind,
    pub symbol: String,
    /// Candle interval ("1m", "1h", ...); absent means spot price
    #[serde(default)]
    pub interval: Option<String>,
    /// Dexscreener chain id ("solana", "ethereum", ...)
    #[serde(default)]
    pub chain: Option<String>,
}

impl PriceMarket {
    /// Spot markets yield a single observation taken at fetch time
    pub fn is_spot(&self) -> bool {
        self.source == PriceSourceKind::Dexscreener || self.interval.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            bail!("price market symbol is empty");
        }
        if self.source == PriceSourceKind::Dexscreener && self.chain.is_none() {
            bail!("dexscreener markets need a chain");
        }
        Ok(())
    }
}

/// Price observations for one market
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    pub candles: Vec<Candle>,
    pub spot: bool,
}

impl PriceSeries {
    pub fn from_candles(mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.open_time);
        Self { candles, spot: false }
    }

    pub fn from_spot(candle: Candle) -> Self {
        Self {
            candles: vec![candle],
            spot: true,
        }
    }

    /// Observations taken inside the window
    fn within<'a>(&'a self, window: &TimeWindow) -> impl Iterator<Item = &'a Candle> + 'a {
        let window = *window;
        self.candles.iter().filter(move |c| window.contains(c.open_time))
    }

    /// The bar whose close settles the window. For spot series this is the
    /// observation itself, and only while it was taken close to the end.
    fn closing_candle(&self, window: &TimeWindow) -> Option<&Candle> {
        if self.spot {
            let latest = window.end + Duration::minutes(SPOT_CLOSE_TOLERANCE_MINUTES);
            return self
                .candles
                .last()
                .filter(|c| c.open_time >= window.end && c.open_time <= latest);
        }
        self.within(window).last()
    }

    fn opening_candle(&self, window: &TimeWindow) -> Option<&Candle> {
        if self.spot {
            return None;
        }
        self.within(window).next()
    }
}

/// How the threshold is tested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Any low inside the window at or below the threshold ("dip to")
    TouchAtOrBelow,
    /// Any high inside the window at or above the threshold ("reach")
    TouchAtOrAbove,
    CloseAbove,
    CloseBelow,
    CloseAtOrAbove,
    CloseAtOrBelow,
}

impl Trigger {
    pub fn is_touch(&self) -> bool {
        matches!(self, Trigger::TouchAtOrBelow | Trigger::TouchAtOrAbove)
    }

    pub fn comparator(&self) -> Comparator {
        match self {
            Trigger::TouchAtOrBelow | Trigger::CloseAtOrBelow => Comparator::AtOrBelow,
            Trigger::TouchAtOrAbove | Trigger::CloseAtOrAbove => Comparator::AtOrAbove,
            Trigger::CloseAbove => Comparator::Above,
            Trigger::CloseBelow => Comparator::Below,
        }
    }
}

/// "Will BTC dip to $95,000 in June?", "Will SOL close above $150 on Friday?"
#[derive(Debug, Clone, Deserialize)]
pub struct PriceThresholdRule {
    pub market: PriceMarket,
    pub window: TimeWindow,
    pub trigger: Trigger,
    pub threshold: Amount,
    pub outcomes: BinaryOutcomes,
}

impl PriceThresholdRule {
    pub fn evaluate(&self, series: &PriceSeries, now: DateTime<Utc>) -> Result<Verdict, RuleError> {
        let threshold = self.threshold.value();
        let cmp = self.trigger.comparator();

        if !self.window.has_started(now) {
            return Ok(Verdict::new(
                self.outcomes.too_early,
                format!("window opens at {}", self.window.start),
            ));
        }

        if self.trigger.is_touch() {
            let (field, extreme) = match self.trigger {
                Trigger::TouchAtOrBelow => ("low", series.within(&self.window).map(|c| c.low).min()),
                _ => ("high", series.within(&self.window).map(|c| c.high).max()),
            };

            let touch = series.within(&self.window).find(|c| {
                let value = if field == "low" { c.low } else { c.high };
                cmp.holds(value, threshold)
            });

            if let Some(candle) = touch {
                let value = if field == "low" { candle.low } else { candle.high };
                return Ok(Verdict::new(
                    self.outcomes.yes,
                    format!(
                        "{} {} {} {} at {}",
                        field,
                        value,
                        cmp.symbol(),
                        self.threshold,
                        candle.open_time
                    ),
                ));
            }

            if !self.window.has_ended(now) {
                return Ok(Verdict::new(
                    self.outcomes.too_early,
                    format!("no touch of {} yet, window closes at {}", self.threshold, self.window.end),
                ));
            }

            let extreme = extreme.ok_or_else(|| {
                RuleError::NoData(format!("no {} candles inside the window", self.market.symbol))
            })?;

            return Ok(Verdict::new(
                self.outcomes.no,
                format!("window {} {} never reached {}", field, extreme, self.threshold),
            ));
        }

        if !self.window.has_ended(now) {
            return Ok(Verdict::new(
                self.outcomes.too_early,
                format!("window closes at {}", self.window.end),
            ));
        }

        let closing = series.closing_candle(&self.window).ok_or_else(|| {
            if series.spot {
                RuleError::NoData(format!(
                    "spot price for {} was not taken within {}m of the close at {}",
                    self.market.symbol, SPOT_CLOSE_TOLERANCE_MINUTES, self.window.end
                ))
            } else {
                RuleError::NoData(format!("no closing price for {}", self.market.symbol))
            }
        })?;

        let (outcome, word) = if cmp.holds(closing.close, threshold) {
            (self.outcomes.yes, "meets")
        } else {
            (self.outcomes.no, "misses")
        };

        Ok(Verdict::new(
            outcome,
            format!(
                "close {} {} {} {} (observed {})",
                closing.close,
                word,
                cmp.symbol(),
                self.threshold,
                closing.close_time
            ),
        ))
    }
}

/// Codes for an "Up or Down" question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DirectionOutcomes {
    pub up: Recommendation,
    pub down: Recommendation,
    #[serde(default)]
    pub too_early: Recommendation,
}

/// "Bitcoin Up or Down on June 30?": close at the end vs open at the start.
/// A flat window counts as up.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceDirectionRule {
    pub market: PriceMarket,
    pub window: TimeWindow,
    pub outcomes: DirectionOutcomes,
}

impl PriceDirectionRule {
    pub fn validate(&self) -> Result<()> {
        self.market.validate()?;
        if self.market.is_spot() {
            bail!("up/down questions need candles, set an interval on a binance or hyperliquid market");
        }
        Ok(())
    }

    pub fn evaluate(&self, series: &PriceSeries, now: DateTime<Utc>) -> Result<Verdict, RuleError> {
        if !self.window.has_ended(now) {
            return Ok(Verdict::new(
                self.outcomes.too_early,
                format!("window closes at {}", self.window.end),
            ));
        }

        let opening = series.opening_candle(&self.window).ok_or_else(|| {
            RuleError::NoData(format!("no opening candle for {}", self.market.symbol))
        })?;
        let closing = series.closing_candle(&self.window).ok_or_else(|| {
            RuleError::NoData(format!("no closing candle for {}", self.market.symbol))
        })?;

        if closing.close >= opening.open {
            Ok(Verdict::new(
                self.outcomes.up,
                format!("close {} >= open {}", closing.close, opening.open),
            ))
        } else {
            Ok(Verdict::new(
                self.outcomes.down,
                format!("close {} < open {}", closing.close, opening.open),
            ))
        }
    }
}
