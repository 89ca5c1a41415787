//! Reference clock: owns the pipeline's notion of "today".
//!
//! RULE: The core never reads the system clock. Every "now" in generation
//! and feature derivation is the `as_of` date carried here, so a run is
//! reproducible on any day.

use crate::rng::RandomSource;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferenceClock {
    pub as_of: NaiveDate,
}

impl ReferenceClock {
    pub fn new(as_of: NaiveDate) -> Self {
        Self { as_of }
    }

    pub fn today(&self) -> NaiveDate {
        self.as_of
    }

    /// Window from `days` before `as_of` up to `as_of`, both ends included.
    pub fn trailing_window(&self, days: i64) -> DateWindow {
        DateWindow::new(self.as_of - Duration::days(days), self.as_of)
    }

    /// Whole days from `date` to `as_of` (negative if `date` is later).
    pub fn days_since(&self, date: NaiveDate) -> i64 {
        (self.as_of - date).num_days()
    }
}

impl Default for ReferenceClock {
    fn default() -> Self {
        Self::new(default_as_of())
    }
}

/// Fixed reference date used when no config overrides it.
pub fn default_as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap_or(NaiveDate::MIN)
}

/// Closed date interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// An inverted pair collapses to the single day `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Uniform day in the window.
    pub fn sample(&self, rng: &mut RandomSource) -> NaiveDate {
        let offset = rng.next_u64_below(self.len_days() as u64) as i64;
        self.start + Duration::days(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_window_ends_on_as_of() {
        let clock = ReferenceClock::default();
        let window = clock.trailing_window(730);
        assert_eq!(window.end, clock.today());
        assert_eq!(window.len_days(), 731);
    }

    #[test]
    fn samples_stay_inside_window() {
        let clock = ReferenceClock::default();
        let window = clock.trailing_window(10);
        let mut rng = RandomSource::new(5);
        for _ in 0..500 {
            assert!(window.contains(window.sample(&mut rng)));
        }
    }

    #[test]
    fn inverted_window_collapses() {
        let d = default_as_of();
        let window = DateWindow::new(d, d - Duration::days(3));
        assert_eq!(window.len_days(), 1);
    }
}
