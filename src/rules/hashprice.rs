//! Hashprice threshold rule

use super::{Amount, BinaryOutcomes, Comparator, RuleError, Verdict};
use crate::types::HashpricePoint;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

/// "Will hashprice be above $50/PH/day on March 31?"
#[derive(Debug, Clone, Deserialize)]
pub struct HashpriceRule {
    /// UTC day whose daily print settles the question
    pub date: NaiveDate,
    pub comparator: Comparator,
    pub threshold: Amount,
    pub outcomes: BinaryOutcomes,
}

impl HashpriceRule {
    pub fn evaluate(&self, points: &[HashpricePoint], now: DateTime<Utc>) -> Result<Verdict, RuleError> {
        let print = points.iter().filter(|p| p.day() == self.date).last();

        let Some(print) = print else {
            if now.date_naive() <= self.date {
                return Ok(Verdict::new(
                    self.outcomes.too_early,
                    format!("no hashprice print for {} yet", self.date),
                ));
            }
            return Err(RuleError::NoData(format!("no hashprice print for {}", self.date)));
        };

        let value = print.usd_per_ph_day;
        let outcome = if self.comparator.holds(value, self.threshold.value()) {
            self.outcomes.yes
        } else {
            self.outcomes.no
        };

        Ok(Verdict::new(
            outcome,
            format!(
                "hashprice {} on {} vs {} {}",
                value,
                self.date,
                self.comparator.symbol(),
                self.threshold
            ),
        ))
    }
}
