//! The pipeline: extract, validate, transform, load, plus the run ledger.

use chrono::{Duration, Utc};
use serde_json::Value;
use tally_core::{
  call::RawCall,
  job::{EtlJob, NewFault, RunCounts},
  source::CallSource,
  store::AnalyticsStore,
  transform,
  window::TimeWindow,
};
use uuid::Uuid;

use crate::{
  Error, Result, config::PipelineConfig, extract::Extractor, validate,
};

/// One extraction unit: a legacy source, an analytics store, and the
/// configured knobs.
pub struct Pipeline<S, A> {
  extractor: Extractor<S>,
  store:     A,
  config:    PipelineConfig,
}

impl<S, A> Pipeline<S, A>
where
  S: CallSource,
  A: AnalyticsStore,
{
  pub fn new(source: S, store: A, config: PipelineConfig) -> Self {
    Self { extractor: Extractor::new(source), store, config }
  }

  pub fn config(&self) -> &PipelineConfig { &self.config }

  /// Run one cycle over the window ending now and reaching back the
  /// configured frequency.
  pub async fn run_once(&self) -> Result<EtlJob> {
    let window =
      TimeWindow::last_hours(Utc::now(), self.config.frequency_hours);
    self.run_window(window).await
  }

  /// Run one cycle over `window`: open a job row, extract, filter, validate,
  /// transform, load, and complete the job with its counts.
  ///
  /// Rerunning an overlapping window is safe: loading skips call ids that
  /// already exist. Any stage failure marks the job failed and propagates.
  pub async fn run_window(&self, window: TimeWindow) -> Result<EtlJob> {
    let job = self
      .store
      .create_job(&self.config.job_name, window)
      .await
      .map_err(|e| Error::Ledger(e.into()))?;
    let job = self
      .store
      .mark_job_running(job.job_id)
      .await
      .map_err(|e| Error::Ledger(e.into()))?;

    tracing::info!(
      job_id = %job.job_id,
      start = %window.start,
      end = %window.end,
      "starting extraction run"
    );

    match self.stages(job.job_id, window).await {
      Ok(counts) => {
        let job = self
          .store
          .mark_job_completed(job.job_id, counts)
          .await
          .map_err(|e| Error::Ledger(e.into()))?;
        tracing::info!(
          job_id = %job.job_id,
          extracted = counts.extracted,
          transformed = counts.transformed,
          loaded = counts.loaded,
          skipped = counts.skipped,
          failed = counts.failed,
          "extraction run completed"
        );
        Ok(job)
      }
      Err(error) => {
        self.fail_job(job.job_id, &error).await;
        Err(error)
      }
    }
  }

  /// Delete normalized calls older than the configured retention.
  /// Returns the deleted count.
  pub async fn purge_expired(&self) -> Result<u64> {
    let cutoff =
      Utc::now() - Duration::days(i64::from(self.config.retention_days));
    self
      .store
      .purge_calls_before(cutoff)
      .await
      .map_err(|e| Error::Store(e.into()))
  }

  /// The fallible middle of a run. Ledger transitions stay in
  /// [`Self::run_window`] so a failure here can still be recorded there.
  async fn stages(&self, job_id: Uuid, window: TimeWindow) -> Result<RunCounts> {
    let raws = self
      .extractor
      .extract(window)
      .await
      .map_err(|e| Error::Extract(e.into()))?;
    let extracted = raws.len() as u64;

    let eligible: Vec<RawCall> =
      raws.into_iter().filter(|raw| self.center_allowed(raw)).collect();

    let (clean, faults, failed) = split_by_validity(job_id, eligible);
    if !faults.is_empty() {
      self
        .store
        .record_faults(faults)
        .await
        .map_err(|e| Error::Ledger(e.into()))?;
    }

    let records = transform::normalize_batch(clean);
    let transformed = records.len() as u64;

    let mut loaded = 0u64;
    let chunk_size = self.config.batch_size.max(1);
    for chunk in records.chunks(chunk_size) {
      loaded += self
        .store
        .load_calls(chunk.to_vec())
        .await
        .map_err(|e| Error::Store(e.into()))?;
    }

    Ok(RunCounts {
      extracted,
      transformed,
      loaded,
      skipped: transformed - loaded,
      failed,
    })
  }

  fn center_allowed(&self, raw: &RawCall) -> bool {
    if self.config.allowed_centers.is_empty() {
      return true;
    }
    raw
      .center_id
      .as_ref()
      .is_some_and(|id| self.config.allowed_centers.contains(id))
  }

  async fn fail_job(&self, job_id: Uuid, error: &Error) {
    let message = error.to_string();
    if let Err(ledger_error) = self.store.mark_job_failed(job_id, &message).await
    {
      tracing::warn!(
        job_id = %job_id,
        error = %ledger_error,
        "could not record job failure"
      );
    }
  }
}

/// Split a batch into loadable records and the faults to persist.
/// Returns `(clean, faults, blocked)` where `blocked` counts records
/// excluded by a blocking fault.
fn split_by_validity(
  job_id: Uuid,
  raws: Vec<RawCall>,
) -> (Vec<RawCall>, Vec<NewFault>, u64) {
  let mut clean = Vec::with_capacity(raws.len());
  let mut out = Vec::new();
  let mut blocked = 0u64;

  for raw in raws {
    let faults = validate::check(&raw);
    if faults.is_empty() {
      clean.push(raw);
      continue;
    }

    let record = serde_json::to_value(&raw).unwrap_or(Value::Null);
    let blocking = faults.iter().any(validate::Fault::is_blocking);
    for fault in faults {
      out.push(NewFault {
        job_id,
        call_id: (!raw.call_id.is_empty()).then(|| raw.call_id.clone()),
        field: Some(fault.field.to_string()),
        message: fault.message,
        record: record.clone(),
        severity: fault.severity,
      });
    }

    if blocking {
      blocked += 1;
    } else {
      clean.push(raw);
    }
  }

  (clean, out, blocked)
}
