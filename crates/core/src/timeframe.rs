//! Simulation timeframe value object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reporting granularity of a simulation timeframe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Weekly,
}

/// Half-open time window a simulation forecasts over.
///
/// Compared by value; a timeframe has no identity of its own.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timeframe {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub granularity: Granularity,
}

impl Timeframe {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, granularity: Granularity) -> Self {
        Self {
            start,
            end,
            granularity,
        }
    }

    /// Whole days covered by the window (negative if `end < start`).
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Stable textual form used in cache fingerprints.
    pub fn fingerprint_component(&self) -> String {
        let granularity = match self.granularity {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
        };
        format!(
            "{}..{}@{granularity}",
            self.start.to_rfc3339(),
            self.end.to_rfc3339()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn duration_days_counts_whole_days() {
        let tf = Timeframe::new(utc(2026, 1, 1), utc(2026, 1, 31), Granularity::Daily);
        assert_eq!(tf.duration_days(), 30);
    }

    #[test]
    fn inverted_window_has_negative_duration() {
        let tf = Timeframe::new(utc(2026, 2, 1), utc(2026, 1, 1), Granularity::Weekly);
        assert!(tf.duration_days() < 0);
    }

    #[test]
    fn fingerprint_component_is_deterministic() {
        let a = Timeframe::new(utc(2026, 1, 1), utc(2026, 2, 1), Granularity::Daily);
        let b = Timeframe::new(utc(2026, 1, 1), utc(2026, 2, 1), Granularity::Daily);
        assert_eq!(a.fingerprint_component(), b.fingerprint_component());

        let c = Timeframe::new(utc(2026, 1, 1), utc(2026, 2, 1), Granularity::Weekly);
        assert_ne!(a.fingerprint_component(), c.fingerprint_component());
    }
}
