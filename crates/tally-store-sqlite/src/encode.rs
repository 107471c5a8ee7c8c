//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. The metadata and raw-record
//! fields are stored as compact JSON. UUIDs are stored as hyphenated
//! lowercase strings. Enum discriminants come from the core types and are
//! decoded here with exhaustive matches.

use chrono::{DateTime, Utc};
use tally_core::{
  call::{CallRecord, RawCall},
  job::{EtlJob, JobStatus, NewFault, RunCounts, Severity, ValidationFault},
  window::TimeWindow,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JobStatus ───────────────────────────────────────────────────────────────

pub fn decode_job_status(s: &str) -> Result<JobStatus> {
  match s {
    "pending" => Ok(JobStatus::Pending),
    "running" => Ok(JobStatus::Running),
    "completed" => Ok(JobStatus::Completed),
    "failed" => Ok(JobStatus::Failed),
    other => Err(Error::Decode(format!("unknown job status: {other:?}"))),
  }
}

// ─── Severity ────────────────────────────────────────────────────────────────

pub fn decode_severity(s: &str) -> Result<Severity> {
  match s {
    "warning" => Ok(Severity::Warning),
    "error" => Ok(Severity::Error),
    "critical" => Ok(Severity::Critical),
    other => Err(Error::Decode(format!("unknown severity: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a legacy `calls` row.
pub struct LegacyCallRow {
  pub call_id:          String,
  pub client_id:        String,
  pub call_date:        String,
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
  pub extra_json:       Option<String>,
}

impl LegacyCallRow {
  pub fn into_raw_call(self) -> Result<RawCall> {
    let extra = self
      .extra_json
      .as_deref()
      .map(serde_json::from_str)
      .transpose()?;

    Ok(RawCall {
      call_id: self.call_id,
      client_id: self.client_id,
      call_date: decode_dt(&self.call_date)?,
      duration_seconds: self.duration_seconds,
      call_type: self.call_type,
      result: self.result,
      center_id: self.center_id,
      service_id: self.service_id,
      agent_id: self.agent_id,
      queue_seconds: self.queue_seconds,
      talk_seconds: self.talk_seconds,
      hold_seconds: self.hold_seconds,
      transfer_count: self.transfer_count,
      satisfaction: self.satisfaction,
      extra,
    })
  }
}

/// Raw strings read directly from a `call_records` row.
pub struct CallRecordRow {
  pub call_id:          String,
  pub client_id:        String,
  pub call_date:        String,
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
  pub metadata:         String,
}

impl CallRecordRow {
  /// Owned column values for the insert statement, in schema order.
  pub fn from_record(record: &CallRecord) -> Self {
    Self {
      call_id:          record.call_id.clone(),
      client_id:        record.client_id.clone(),
      call_date:        encode_dt(record.call_date),
      duration_seconds: record.duration_seconds,
      call_type:        record.call_type.clone(),
      result:           record.result.clone(),
      center_id:        record.center_id.clone(),
      service_id:       record.service_id.clone(),
      agent_id:         record.agent_id.clone(),
      queue_seconds:    record.queue_seconds,
      talk_seconds:     record.talk_seconds,
      hold_seconds:     record.hold_seconds,
      transfer_count:   record.transfer_count,
      satisfaction:     record.satisfaction,
      metadata:         record.metadata.to_string(),
    }
  }

  pub fn into_record(self) -> Result<CallRecord> {
    Ok(CallRecord {
      call_id: self.call_id,
      client_id: self.client_id,
      call_date: decode_dt(&self.call_date)?,
      duration_seconds: self.duration_seconds,
      call_type: self.call_type,
      result: self.result,
      center_id: self.center_id,
      service_id: self.service_id,
      agent_id: self.agent_id,
      queue_seconds: self.queue_seconds,
      talk_seconds: self.talk_seconds,
      hold_seconds: self.hold_seconds,
      transfer_count: self.transfer_count,
      satisfaction: self.satisfaction,
      metadata: serde_json::from_str(&self.metadata)?,
    })
  }
}

/// Raw strings read directly from an `etl_jobs` row.
pub struct JobRow {
  pub job_id:        String,
  pub job_name:      String,
  pub status:        String,
  pub window_start:  String,
  pub window_end:    String,
  pub created_at:    String,
  pub started_at:    Option<String>,
  pub completed_at:  Option<String>,
  pub extracted:     i64,
  pub transformed:   i64,
  pub loaded:        i64,
  pub skipped:       i64,
  pub failed:        i64,
  pub error_message: Option<String>,
}

impl JobRow {
  pub fn into_job(self) -> Result<EtlJob> {
    Ok(EtlJob {
      job_id:        decode_uuid(&self.job_id)?,
      job_name:      self.job_name,
      status:        decode_job_status(&self.status)?,
      window:        TimeWindow {
        start: decode_dt(&self.window_start)?,
        end:   decode_dt(&self.window_end)?,
      },
      created_at:    decode_dt(&self.created_at)?,
      started_at:    self.started_at.as_deref().map(decode_dt).transpose()?,
      completed_at:  self.completed_at.as_deref().map(decode_dt).transpose()?,
      counts:        RunCounts {
        extracted:   self.extracted as u64,
        transformed: self.transformed as u64,
        loaded:      self.loaded as u64,
        skipped:     self.skipped as u64,
        failed:      self.failed as u64,
      },
      error_message: self.error_message,
    })
  }
}

/// Raw strings read directly from an `etl_job_faults` row.
pub struct FaultRow {
  pub fault_id:    String,
  pub job_id:      String,
  pub call_id:     Option<String>,
  pub field:       Option<String>,
  pub message:     String,
  pub record_json: String,
  pub severity:    String,
  pub created_at:  String,
}

impl FaultRow {
  /// Owned column values for the insert statement; the store assigns the
  /// identifier and timestamp here.
  pub fn from_new(fault: NewFault, created_at: String) -> Self {
    Self {
      fault_id: encode_uuid(Uuid::new_v4()),
      job_id: encode_uuid(fault.job_id),
      call_id: fault.call_id,
      field: fault.field,
      message: fault.message,
      record_json: fault.record.to_string(),
      severity: fault.severity.discriminant().to_owned(),
      created_at,
    }
  }

  pub fn into_fault(self) -> Result<ValidationFault> {
    Ok(ValidationFault {
      fault_id:   decode_uuid(&self.fault_id)?,
      job_id:     decode_uuid(&self.job_id)?,
      call_id:    self.call_id,
      field:      self.field,
      message:    self.message,
      record:     serde_json::from_str(&self.record_json)?,
      severity:   decode_severity(&self.severity)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
