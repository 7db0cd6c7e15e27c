//! Resolution windows
//!
//! Question files give wall-clock times in a named timezone ("2025-06-30
//! 12:00" in America/New_York); everything downstream works in UTC.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Window as written in a question file
#[derive(Debug, Clone, Deserialize)]
pub struct WindowSpec {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// A half-open `[start, end)` interval in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "WindowSpec")]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            bail!("window start {} is not before end {}", start, end);
        }
        Ok(Self { start, end })
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.start
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now >= self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

impl TryFrom<WindowSpec> for TimeWindow {
    type Error = anyhow::Error;

    fn try_from(spec: WindowSpec) -> Result<Self> {
        let tz = parse_timezone(spec.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE))?;
        let start = parse_instant(&spec.start, tz).context("invalid window start")?;
        let end = parse_instant(&spec.end, tz).context("invalid window end")?;
        TimeWindow::new(start, end)
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("unknown timezone {}: {}", name, e))
}

/// Parse an RFC 3339 instant, or a local `YYYY-MM-DD HH:MM[:SS]` in `tz`
pub fn parse_instant(s: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Ok(instant.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .with_context(|| format!("expected 'YYYY-MM-DD HH:MM' or RFC 3339, got '{}'", s))?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Ok(t.with_timezone(&Utc)),
        // DST fall-back: the wall-clock time happens twice, take the first
        LocalResult::Ambiguous(first, _) => Ok(first.with_timezone(&Utc)),
        LocalResult::None => bail!("{} does not exist in {} (DST gap)", s, tz),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(start: &str, end: &str, tz: Option<&str>) -> WindowSpec {
        WindowSpec {
            start: start.to_string(),
            end: end.to_string(),
            timezone: tz.map(str::to_string),
        }
    }

    #[test]
    fn test_eastern_noon_to_utc() {
        let window = TimeWindow::try_from(spec("2025-06-30 12:00", "2025-07-01 12:00", None)).unwrap();
        assert_eq!(window.start.to_rfc3339(), "2025-06-30T16:00:00+00:00");
        assert_eq!(window.end.to_rfc3339(), "2025-07-01T16:00:00+00:00");
    }

    #[test]
    fn test_rfc3339_passthrough() {
        let window = TimeWindow::try_from(spec(
            "2025-01-01T00:00:00Z",
            "2025-01-02T00:00:00+01:00",
            Some("UTC"),
        ))
        .unwrap();
        assert_eq!(window.end.to_rfc3339(), "2025-01-01T23:00:00+00:00");
    }

    #[test]
    fn test_rejects_inverted_window() {
        assert!(TimeWindow::try_from(spec("2025-06-02 00:00", "2025-06-01 00:00", None)).is_err());
    }

    #[test]
    fn test_rejects_dst_gap_and_unknown_zone() {
        // 02:30 on 2025-03-09 does not exist in New York
        assert!(TimeWindow::try_from(spec("2025-03-09 02:30", "2025-03-10 00:00", None)).is_err());
        assert!(TimeWindow::try_from(spec("2025-03-09 00:00", "2025-03-10 00:00", Some("Mars/Olympus"))).is_err());
    }

    #[test]
    fn test_ambiguous_time_takes_first_instant() {
        // 01:30 on 2025-11-02 happens twice in New York; first is EDT (UTC-4)
        let tz = parse_timezone(DEFAULT_TIMEZONE).unwrap();
        let instant = parse_instant("2025-11-02 01:30", tz).unwrap();
        assert_eq!(instant.to_rfc3339(), "2025-11-02T05:30:00+00:00");
    }

    #[test]
    fn test_window_deserializes_from_question_json() {
        let window: TimeWindow = serde_json::from_str(
            r#"{"start": "2025-06-01 00:00", "end": "2025-06-01 01:00", "timezone": "UTC"}"#,
        )
        .unwrap();
        assert!(window.contains(window.start));
        assert!(!window.contains(window.end));
    }
}
