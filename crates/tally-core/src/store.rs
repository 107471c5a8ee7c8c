//! The `AnalyticsStore` trait, the writable analytics side.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! Higher layers (`tally-etl`, `tally-cli`) depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  call::CallRecord,
  job::{EtlJob, NewFault, RunCounts, ValidationFault},
  window::TimeWindow,
};

/// Abstraction over the analytics store backend.
///
/// Call rows are append-only with conflict-skip semantics. Job rows are the
/// only mutable state, and only through the `mark_*` transitions. All methods
/// return `Send` futures.
pub trait AnalyticsStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Calls ─────────────────────────────────────────────────────────────

  /// Insert `records` in one atomic transaction, skipping rows whose call id
  /// already exists. Returns the number of rows actually inserted; the
  /// remainder were conflict-skipped.
  fn load_calls(
    &self,
    records: Vec<CallRecord>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// The record with `call_id`, if loaded. Returns `None` if not found.
  fn get_call<'a>(
    &'a self,
    call_id: &'a str,
  ) -> impl Future<Output = Result<Option<CallRecord>, Self::Error>> + Send + 'a;

  /// All records whose timestamp falls in `window`, ordered by timestamp.
  fn list_calls(
    &self,
    window: TimeWindow,
  ) -> impl Future<Output = Result<Vec<CallRecord>, Self::Error>> + Send + '_;

  /// Delete records whose timestamp is strictly before `cutoff`.
  /// Returns the deleted count.
  fn purge_calls_before(
    &self,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Job ledger ────────────────────────────────────────────────────────

  /// Create a pending job row covering `window`.
  /// Identifier and creation timestamp are assigned by the store.
  fn create_job<'a>(
    &'a self,
    job_name: &'a str,
    window: TimeWindow,
  ) -> impl Future<Output = Result<EtlJob, Self::Error>> + Send + 'a;

  /// Transition a job to running, stamping `started_at`.
  fn mark_job_running(
    &self,
    job_id: Uuid,
  ) -> impl Future<Output = Result<EtlJob, Self::Error>> + Send + '_;

  /// Transition a job to completed with its final counts, stamping
  /// `completed_at`.
  fn mark_job_completed(
    &self,
    job_id: Uuid,
    counts: RunCounts,
  ) -> impl Future<Output = Result<EtlJob, Self::Error>> + Send + '_;

  /// Transition a job to failed with an error message, stamping
  /// `completed_at`.
  fn mark_job_failed<'a>(
    &'a self,
    job_id: Uuid,
    message: &'a str,
  ) -> impl Future<Output = Result<EtlJob, Self::Error>> + Send + 'a;

  /// The job with `job_id`. Returns `None` if not found.
  fn get_job(
    &self,
    job_id: Uuid,
  ) -> impl Future<Output = Result<Option<EtlJob>, Self::Error>> + Send + '_;

  /// The most recent jobs, newest first.
  fn recent_jobs(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<EtlJob>, Self::Error>> + Send + '_;

  // ── Faults ────────────────────────────────────────────────────────────

  /// Persist validation faults. Identifiers and timestamps are assigned by
  /// the store.
  fn record_faults(
    &self,
    faults: Vec<NewFault>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All faults recorded for `job_id`, oldest first.
  fn faults_for_job(
    &self,
    job_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ValidationFault>, Self::Error>> + Send + '_;
}
