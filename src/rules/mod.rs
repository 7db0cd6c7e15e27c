//! Resolution rules
//!
//! Every rule kind is a pure function from fetched data (and the current
//! time) to a [`Verdict`]. Fetching happens in the resolver; nothing in
//! here touches the network.

pub mod game;
pub mod hashprice;
pub mod player;
pub mod price;

pub use game::{GameOutcomes, GameWinnerRule};
pub use hashprice::HashpriceRule;
pub use player::{PlayerStatRule, StatOutcomes};
pub use price::{PriceDirectionRule, PriceMarket, PriceSourceKind, PriceThresholdRule, Trigger};

use crate::types::Recommendation;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// A decided outcome and why
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub recommendation: Recommendation,
    pub detail: String,
}

impl Verdict {
    pub fn new(recommendation: Recommendation, detail: impl Into<String>) -> Self {
        Self {
            recommendation,
            detail: detail.into(),
        }
    }
}

/// The fetched data cannot decide the question
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuleError {
    #[error("no data: {0}")]
    NoData(String),
}

/// Codes for a yes/no question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BinaryOutcomes {
    pub yes: Recommendation,
    pub no: Recommendation,
    #[serde(default)]
    pub too_early: Recommendation,
}

/// Numeric comparison against a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Above,
    Below,
    AtOrAbove,
    AtOrBelow,
}

impl Comparator {
    pub fn holds(&self, value: Decimal, threshold: Decimal) -> bool {
        match self {
            Comparator::Above => value > threshold,
            Comparator::Below => value < threshold,
            Comparator::AtOrAbove => value >= threshold,
            Comparator::AtOrBelow => value <= threshold,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Above => ">",
            Comparator::Below => "<",
            Comparator::AtOrAbove => ">=",
            Comparator::AtOrBelow => "<=",
        }
    }
}

/// A threshold written as a number or a literal like `"$95,000"` or `"1.2m"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount(pub Decimal);

impl Amount {
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

fn amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\$?\s*(-?[0-9][0-9,]*(?:\.[0-9]+)?|-?\.[0-9]+)\s*([kKmMbB])?$")
            .expect("amount pattern is valid")
    })
}

impl FromStr for Amount {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = amount_pattern()
            .captures(s.trim())
            .ok_or_else(|| anyhow::anyhow!("not an amount: '{}'", s))?;

        let digits = caps[1].replace(',', "");
        let base = Decimal::from_str(&digits)?;
        let multiplier = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
            Some(suffix) if suffix == "k" => Decimal::from(1_000),
            Some(suffix) if suffix == "m" => Decimal::from(1_000_000),
            Some(suffix) if suffix == "b" => Decimal::from(1_000_000_000),
            _ => Decimal::ONE,
        };

        Ok(Amount(base * multiplier))
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawAmount {
            Integer(i64),
            Float(f64),
            Text(String),
        }

        match RawAmount::deserialize(deserializer)? {
            RawAmount::Integer(i) => Ok(Amount(Decimal::from(i))),
            RawAmount::Float(f) => Decimal::from_str(&f.to_string())
                .map(Amount)
                .map_err(serde::de::Error::custom),
            RawAmount::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_literals() {
        assert_eq!("$95,000".parse::<Amount>().unwrap().value(), dec!(95000));
        assert_eq!("95k".parse::<Amount>().unwrap().value(), dec!(95000));
        assert_eq!("1.2m".parse::<Amount>().unwrap().value(), dec!(1200000));
        assert_eq!("0.00421".parse::<Amount>().unwrap().value(), dec!(0.00421));
        assert_eq!("$ 3,250.50".parse::<Amount>().unwrap().value(), dec!(3250.50));
        assert!("ninety".parse::<Amount>().is_err());
        assert!("95kk".parse::<Amount>().is_err());
    }

    #[test]
    fn test_amount_from_json() {
        let amounts: Vec<Amount> = serde_json::from_str(r#"[95000, 27.5, "$100k"]"#).unwrap();
        assert_eq!(amounts[0].value(), dec!(95000));
        assert_eq!(amounts[1].value(), dec!(27.5));
        assert_eq!(amounts[2].value(), dec!(100000));
    }

    #[test]
    fn test_comparators() {
        assert!(Comparator::AtOrBelow.holds(dec!(95000), dec!(95000)));
        assert!(!Comparator::Below.holds(dec!(95000), dec!(95000)));
        assert!(Comparator::Above.holds(dec!(1.01), dec!(1)));
        assert!(!Comparator::AtOrAbove.holds(dec!(0.99), dec!(1)));
    }
}
