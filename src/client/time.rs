use serde::Serialize;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// A lookback window ending now, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

impl TimeRange {
    pub fn last_hours(hours: f64) -> Self {
        Self::ending_at(chrono::Utc::now().timestamp_millis(), hours)
    }

    pub fn ending_at(now_ms: i64, hours: f64) -> Self {
        let width = (hours * MS_PER_HOUR).round() as i64;
        Self {
            from: now_ms - width,
            to: now_ms,
        }
    }

    /// The APM entity endpoints take epoch seconds.
    pub fn as_seconds(&self) -> (i64, i64) {
        (self.from / 1000, self.to / 1000)
    }
}
