//! Clock abstraction for determinism.

use chrono::{DateTime, SubsecRound, Utc};

/// Abstraction over system time for deterministic behavior.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Truncates a timestamp to the microsecond precision of `TIMESTAMPTZ`, so a
/// stored event reads back exactly as it was assigned.
#[must_use]
pub fn storage_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_storage_precision_drops_nanoseconds() {
        let at = Utc
            .with_ymd_and_hms(2026, 1, 15, 10, 0, 0)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();

        assert_eq!(storage_precision(at).nanosecond(), 123_456_000);
    }
}
