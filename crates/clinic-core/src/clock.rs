//! Injected clock for time-dependent derivations and rules.
//!
//! Appointment-date validation and admission duration both depend on "now";
//! routing every read through [`Clock`] lets tests pin the current instant.

use chrono::{DateTime, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a fixed instant (for tests).
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Build from an RFC 3339 timestamp. Panics on a malformed literal.
    pub fn at(rfc3339: &str) -> Self {
        Self(
            DateTime::parse_from_rfc3339(rfc3339)
                .expect("valid RFC 3339 literal")
                .with_timezone(&Utc),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_returns_pinned_instant() {
        let clock = FixedClock::at("2024-03-01T12:00:00Z");
        assert_eq!(clock.now().to_rfc3339(), "2024-03-01T12:00:00+00:00");
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
