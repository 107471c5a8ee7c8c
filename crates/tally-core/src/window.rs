//! Time windows, the bounded intervals every pipeline stage operates on.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A half-open interval `[start, end)` over call timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
  pub start: DateTime<Utc>,
  pub end:   DateTime<Utc>,
}

impl TimeWindow {
  /// Returns an error if `start` is after `end`. An empty window
  /// (`start == end`) is valid and matches nothing.
  pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
    if start > end {
      return Err(Error::WindowInverted { start, end });
    }
    Ok(Self { start, end })
  }

  /// The window ending at `now` and covering the preceding `hours` hours.
  pub fn last_hours(now: DateTime<Utc>, hours: u32) -> Self {
    Self { start: now - Duration::hours(i64::from(hours)), end: now }
  }

  /// Whether `at` falls inside `[start, end)`.
  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.start <= at && at < self.end
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
  }

  #[test]
  fn window_is_half_open() {
    let w = TimeWindow::new(at(0), at(6)).unwrap();
    assert!(w.contains(at(0)));
    assert!(w.contains(at(5)));
    assert!(!w.contains(at(6)));
  }

  #[test]
  fn inverted_window_is_rejected() {
    let err = TimeWindow::new(at(6), at(0)).unwrap_err();
    assert!(matches!(err, Error::WindowInverted { .. }));
  }

  #[test]
  fn last_hours_ends_at_now() {
    let w = TimeWindow::last_hours(at(12), 6);
    assert_eq!(w.start, at(6));
    assert_eq!(w.end, at(12));
  }
}
