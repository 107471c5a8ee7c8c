//! Call records in the raw legacy shape and the normalized analytics
//! shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::routing::{Entity, Namespace};

// ─── Legacy (read-only) ──────────────────────────────────────────────────────

/// One call event as found in the legacy IVR store.
///
/// The required columns (call id, client id, timestamp) are non-optional
/// here; every other column is nullable in the legacy schema and `Option`
/// here. Instances are only ever hydrated from the read-only connection,
/// never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCall {
  pub call_id:          String,
  pub client_id:        String,
  pub call_date:        DateTime<Utc>,
  pub duration_seconds: Option<i64>,
  pub call_type:        Option<String>,
  pub result:           Option<String>,
  pub center_id:        Option<String>,
  pub service_id:       Option<String>,
  pub agent_id:         Option<String>,
  pub queue_seconds:    Option<i64>,
  pub talk_seconds:     Option<i64>,
  pub hold_seconds:     Option<i64>,
  pub transfer_count:   Option<i64>,
  pub satisfaction:     Option<i64>,
  /// Free-form extra data some IVR versions attach to a call.
  pub extra:            Option<serde_json::Value>,
}

impl RawCall {
  /// A record carrying only the required legacy columns.
  pub fn minimal(
    call_id: impl Into<String>,
    client_id: impl Into<String>,
    call_date: DateTime<Utc>,
  ) -> Self {
    Self {
      call_id: call_id.into(),
      client_id: client_id.into(),
      call_date,
      duration_seconds: None,
      call_type: None,
      result: None,
      center_id: None,
      service_id: None,
      agent_id: None,
      queue_seconds: None,
      talk_seconds: None,
      hold_seconds: None,
      transfer_count: None,
      satisfaction: None,
      extra: None,
    }
  }
}

impl Entity for RawCall {
  const NAME: &'static str = "tally_core::call::RawCall";
  const NAMESPACE: Namespace = Namespace::IvrLegacy;
}

/// A client as found in the legacy IVR store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawClient {
  pub client_id: String,
  pub full_name: String,
}

impl Entity for RawClient {
  const NAME: &'static str = "tally_core::call::RawClient";
  const NAMESPACE: Namespace = Namespace::IvrLegacy;
}

// ─── Normalized ──────────────────────────────────────────────────────────────

/// One normalized call row in the analytics store.
///
/// Produced by [`crate::transform::normalize`], persisted by the loader.
/// Immutable once loaded: the call id is unique, and reloading a window skips
/// rows whose id already exists rather than updating them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
  pub call_id:          String,
  pub client_id:        String,
  pub call_date:        DateTime<Utc>,
  pub duration_seconds: i64,
  pub call_type:        String,
  pub result:           String,
  pub center_id:        Option<String>,
  pub service_id:       Option<String>,
  pub agent_id:         Option<String>,
  pub queue_seconds:    i64,
  pub talk_seconds:     i64,
  pub hold_seconds:     i64,
  pub transfer_count:   i64,
  pub satisfaction:     Option<i64>,
  pub metadata:         serde_json::Value,
}

impl Entity for CallRecord {
  const NAME: &'static str = "tally_core::call::CallRecord";
  const NAMESPACE: Namespace = Namespace::Analytics;
}
