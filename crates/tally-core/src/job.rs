//! The run ledger: one job row per ETL cycle, plus validation faults.
//!
//! Jobs are the only mutable analytics state, and only through the `mark_*`
//! transitions on the store. Faults are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  routing::{Entity, Namespace},
  window::TimeWindow,
};

// ─── Job ─────────────────────────────────────────────────────────────────────

/// Lifecycle state of an ETL job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
  Pending,
  Running,
  Completed,
  Failed,
}

impl JobStatus {
  /// The discriminant string stored in the `status` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Running => "running",
      Self::Completed => "completed",
      Self::Failed => "failed",
    }
  }
}

/// Per-stage record counts for one run.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct RunCounts {
  /// Raw records fetched from the legacy store for the window.
  pub extracted:   u64,
  /// Records surviving the center filter and validation.
  pub transformed: u64,
  /// Rows actually inserted by the loader.
  pub loaded:      u64,
  /// Rows skipped by conflict-ignore (call id already present).
  pub skipped:     u64,
  /// Records excluded by validation faults.
  pub failed:      u64,
}

/// One ETL cycle as recorded in the analytics store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtlJob {
  pub job_id:        Uuid,
  pub job_name:      String,
  pub status:        JobStatus,
  /// The window this run covered.
  pub window:        TimeWindow,
  pub created_at:    DateTime<Utc>,
  pub started_at:    Option<DateTime<Utc>>,
  pub completed_at:  Option<DateTime<Utc>>,
  pub counts:        RunCounts,
  pub error_message: Option<String>,
}

impl EtlJob {
  /// Wall-clock execution time, once the job has both endpoints.
  pub fn execution_seconds(&self) -> Option<f64> {
    match (self.started_at, self.completed_at) {
      (Some(started), Some(completed)) => {
        Some((completed - started).num_milliseconds() as f64 / 1000.0)
      }
      _ => None,
    }
  }

  /// Loaded records as a fraction of extracted, once anything was extracted.
  pub fn success_rate(&self) -> Option<f64> {
    (self.counts.extracted > 0)
      .then(|| self.counts.loaded as f64 / self.counts.extracted as f64)
  }
}

impl Entity for EtlJob {
  const NAME: &'static str = "tally_core::job::EtlJob";
  const NAMESPACE: Namespace = Namespace::Analytics;
}

// ─── Faults ──────────────────────────────────────────────────────────────────

/// Severity scale for validation faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
  Warning,
  Error,
  Critical,
}

impl Severity {
  /// The discriminant string stored in the `severity` column.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::Warning => "warning",
      Self::Error => "error",
      Self::Critical => "critical",
    }
  }
}

/// A per-record validation failure, persisted against its job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFault {
  pub fault_id:   Uuid,
  pub job_id:     Uuid,
  /// The offending call id, when the record had one.
  pub call_id:    Option<String>,
  /// The field that failed, when attributable to a single field.
  pub field:      Option<String>,
  pub message:    String,
  /// The raw record as JSON, for diagnosis.
  pub record:     serde_json::Value,
  pub severity:   Severity,
  pub created_at: DateTime<Utc>,
}

impl Entity for ValidationFault {
  const NAME: &'static str = "tally_core::job::ValidationFault";
  const NAMESPACE: Namespace = Namespace::Analytics;
}

/// Input to [`crate::store::AnalyticsStore::record_faults`].
/// Identifier and timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewFault {
  pub job_id:   Uuid,
  pub call_id:  Option<String>,
  pub field:    Option<String>,
  pub message:  String,
  pub record:   serde_json::Value,
  pub severity: Severity,
}
