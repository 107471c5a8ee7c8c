//! Per-record validation between extract and transform.
//!
//! The legacy store enforces almost nothing, so the rules live here. A
//! blocking fault excludes the record from loading; a warning is recorded
//! against the job and the record still loads.

use tally_core::{call::RawCall, job::Severity};

/// One rule violation on one raw record.
#[derive(Debug, Clone)]
pub struct Fault {
  pub field:    &'static str,
  pub message:  String,
  pub severity: Severity,
}

impl Fault {
  /// Whether the record must be excluded from loading.
  pub fn is_blocking(&self) -> bool { self.severity != Severity::Warning }
}

/// Check one raw record.
pub fn check(raw: &RawCall) -> Vec<Fault> {
  let mut faults = Vec::new();

  if raw.call_id.trim().is_empty() {
    faults.push(Fault {
      field:    "call_id",
      message:  "call id is empty".to_string(),
      severity: Severity::Critical,
    });
  }
  if raw.client_id.trim().is_empty() {
    faults.push(Fault {
      field:    "client_id",
      message:  "client id is empty".to_string(),
      severity: Severity::Critical,
    });
  }

  for (field, value) in [
    ("duration_seconds", raw.duration_seconds),
    ("queue_seconds", raw.queue_seconds),
    ("talk_seconds", raw.talk_seconds),
    ("hold_seconds", raw.hold_seconds),
    ("transfer_count", raw.transfer_count),
  ] {
    if let Some(v) = value
      && v < 0
    {
      faults.push(Fault {
        field,
        message: format!("{field} is negative: {v}"),
        severity: Severity::Error,
      });
    }
  }

  // Satisfaction is a 1-5 survey score. Anything else is suspicious but
  // not worth dropping the call over.
  if let Some(score) = raw.satisfaction
    && !(1..=5).contains(&score)
  {
    faults.push(Fault {
      field:    "satisfaction",
      message:  format!("satisfaction score {score} outside 1..=5"),
      severity: Severity::Warning,
    });
  }

  faults
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  fn bare() -> RawCall {
    RawCall::minimal(
      "call-1",
      "cl-1",
      Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
  }

  #[test]
  fn minimal_record_is_clean() {
    assert!(check(&bare()).is_empty());
  }

  #[test]
  fn negative_duration_is_blocking() {
    let raw = RawCall { duration_seconds: Some(-5), ..bare() };
    let faults = check(&raw);
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].field, "duration_seconds");
    assert!(faults[0].is_blocking());
  }

  #[test]
  fn empty_ids_are_critical() {
    let raw = RawCall { call_id: "  ".into(), client_id: "".into(), ..bare() };
    let faults = check(&raw);
    assert_eq!(faults.len(), 2);
    assert!(faults.iter().all(|f| f.severity == Severity::Critical));
  }

  #[test]
  fn out_of_range_satisfaction_is_a_warning() {
    let raw = RawCall { satisfaction: Some(9), ..bare() };
    let faults = check(&raw);
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].severity, Severity::Warning);
    assert!(!faults[0].is_blocking());
  }

  #[test]
  fn in_range_satisfaction_is_clean() {
    let raw = RawCall { satisfaction: Some(5), ..bare() };
    assert!(check(&raw).is_empty());
  }

  #[test]
  fn multiple_violations_all_reported() {
    let raw = RawCall {
      duration_seconds: Some(-1),
      talk_seconds: Some(-2),
      ..bare()
    };
    let fields: Vec<_> = check(&raw).iter().map(|f| f.field).collect();
    assert_eq!(fields, ["duration_seconds", "talk_seconds"]);
  }
}
