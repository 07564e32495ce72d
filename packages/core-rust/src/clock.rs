//! Clock abstraction for time-dependent components.
//!
//! The TTL cache computes absolute expiry instants from "now". Injecting the
//! clock behind a trait keeps expiry deterministic under test: a stepping
//! clock can move logical time past an entry's TTL without sleeping.

use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over the system clock for dependency injection.
///
/// Allows deterministic testing by replacing the real clock with a manual
/// one. The default implementation ([`SystemClock`]) delegates to
/// `std::time::SystemTime`.
pub trait ClockSource {
    /// Returns the current time as milliseconds since the Unix epoch.
    fn now(&self) -> i64;
}

/// Default clock source that reads the real system time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before Unix epoch")
            .as_millis() as i64
    }
}
