//! The transformer, a pure mapping from legacy rows to analytics rows.
//!
//! Required fields pass through verbatim; absent optional fields fall back to
//! the [`defaults`] table. No record is ever dropped here and nothing raises:
//! a shape anomaly in the legacy data is recovered by defaulting, never
//! surfaced as an error.

use crate::call::{CallRecord, RawCall};

/// Defaults applied when an optional legacy field is absent.
pub mod defaults {
  pub const DURATION_SECONDS: i64 = 0;
  pub const CALL_TYPE: &str = "unknown";
  pub const RESULT: &str = "unknown";
  pub const QUEUE_SECONDS: i64 = 0;
  pub const TALK_SECONDS: i64 = 0;
  pub const HOLD_SECONDS: i64 = 0;
  pub const TRANSFER_COUNT: i64 = 0;

  /// The empty JSON object stored in the metadata column.
  pub fn metadata() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
  }
}

/// Map one raw legacy record to its normalized form.
pub fn normalize(raw: RawCall) -> CallRecord {
  CallRecord {
    call_id:          raw.call_id,
    client_id:        raw.client_id,
    call_date:        raw.call_date,
    duration_seconds: raw
      .duration_seconds
      .unwrap_or(defaults::DURATION_SECONDS),
    call_type:        raw
      .call_type
      .unwrap_or_else(|| defaults::CALL_TYPE.to_owned()),
    result:           raw.result.unwrap_or_else(|| defaults::RESULT.to_owned()),
    center_id:        raw.center_id,
    service_id:       raw.service_id,
    agent_id:         raw.agent_id,
    queue_seconds:    raw.queue_seconds.unwrap_or(defaults::QUEUE_SECONDS),
    talk_seconds:     raw.talk_seconds.unwrap_or(defaults::TALK_SECONDS),
    hold_seconds:     raw.hold_seconds.unwrap_or(defaults::HOLD_SECONDS),
    transfer_count:   raw.transfer_count.unwrap_or(defaults::TRANSFER_COUNT),
    satisfaction:     raw.satisfaction,
    metadata:         raw.extra.unwrap_or_else(defaults::metadata),
  }
}

/// Map a batch of raw records; order is preserved, nothing is dropped.
pub fn normalize_batch(raws: Vec<RawCall>) -> Vec<CallRecord> {
  raws.into_iter().map(normalize).collect()
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use serde_json::json;

  use super::*;

  fn bare_raw() -> RawCall {
    RawCall::minimal(
      "c-1",
      "cl-1",
      Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap(),
    )
  }

  #[test]
  fn missing_optional_fields_are_fully_defaulted() {
    let record = normalize(bare_raw());
    assert_eq!(record.call_id, "c-1");
    assert_eq!(record.client_id, "cl-1");
    assert_eq!(record.duration_seconds, 0);
    assert_eq!(record.call_type, "unknown");
    assert_eq!(record.result, "unknown");
    assert_eq!(record.center_id, None);
    assert_eq!(record.service_id, None);
    assert_eq!(record.agent_id, None);
    assert_eq!(record.queue_seconds, 0);
    assert_eq!(record.talk_seconds, 0);
    assert_eq!(record.hold_seconds, 0);
    assert_eq!(record.transfer_count, 0);
    assert_eq!(record.satisfaction, None);
    assert_eq!(record.metadata, json!({}));
  }

  #[test]
  fn populated_fields_pass_through_verbatim() {
    let raw = RawCall {
      duration_seconds: Some(245),
      call_type: Some("inbound".into()),
      result: Some("answered".into()),
      center_id: Some("19028031".into()),
      service_id: Some("svc-9".into()),
      agent_id: Some("agent-7".into()),
      queue_seconds: Some(12),
      talk_seconds: Some(200),
      hold_seconds: Some(33),
      transfer_count: Some(1),
      satisfaction: Some(4),
      extra: Some(json!({"ivr_node": "menu-3"})),
      ..bare_raw()
    };

    let record = normalize(raw);
    assert_eq!(record.duration_seconds, 245);
    assert_eq!(record.call_type, "inbound");
    assert_eq!(record.result, "answered");
    assert_eq!(record.center_id.as_deref(), Some("19028031"));
    assert_eq!(record.agent_id.as_deref(), Some("agent-7"));
    assert_eq!(record.satisfaction, Some(4));
    assert_eq!(record.metadata, json!({"ivr_node": "menu-3"}));
  }

  #[test]
  fn normalize_is_deterministic() {
    let raw = bare_raw();
    assert_eq!(normalize(raw.clone()), normalize(raw));
  }

  #[test]
  fn batch_preserves_order_and_drops_nothing() {
    let mut second = bare_raw();
    second.call_id = "c-2".into();
    let records = normalize_batch(vec![bare_raw(), second]);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].call_id, "c-1");
    assert_eq!(records[1].call_id, "c-2");
  }
}
