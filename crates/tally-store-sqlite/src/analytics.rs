//! [`AnalyticsDb`], the SQLite implementation of [`AnalyticsStore`].

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use tally_core::{
  call::CallRecord,
  job::{EtlJob, JobStatus, NewFault, RunCounts, ValidationFault},
  store::AnalyticsStore,
  window::TimeWindow,
};

use crate::{
  DbRouter, Error, Result,
  encode::{CallRecordRow, FaultRow, JobRow, encode_dt, encode_uuid},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The analytics store, served by the router's primary connection.
///
/// Cloning is cheap; the underlying connections are reference-counted.
#[derive(Clone)]
pub struct AnalyticsDb {
  router: DbRouter,
}

impl AnalyticsDb {
  pub fn new(router: DbRouter) -> Self { Self { router } }

  async fn fetch_job(&self, job_id: Uuid) -> Result<Option<EtlJob>> {
    let id_str = encode_uuid(job_id);

    let row: Option<JobRow> = self
      .router
      .read::<EtlJob>()
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT job_id, job_name, status, window_start, window_end,
                      created_at, started_at, completed_at,
                      records_extracted, records_transformed, records_loaded,
                      records_skipped, records_failed, error_message
               FROM etl_jobs WHERE job_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(JobRow {
                  job_id:        row.get(0)?,
                  job_name:      row.get(1)?,
                  status:        row.get(2)?,
                  window_start:  row.get(3)?,
                  window_end:    row.get(4)?,
                  created_at:    row.get(5)?,
                  started_at:    row.get(6)?,
                  completed_at:  row.get(7)?,
                  extracted:     row.get(8)?,
                  transformed:   row.get(9)?,
                  loaded:        row.get(10)?,
                  skipped:       row.get(11)?,
                  failed:        row.get(12)?,
                  error_message: row.get(13)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    row.map(JobRow::into_job).transpose()
  }

  async fn require_job(&self, job_id: Uuid) -> Result<EtlJob> {
    self.fetch_job(job_id).await?.ok_or(Error::JobNotFound(job_id))
  }
}

// ─── AnalyticsStore impl ─────────────────────────────────────────────────────

impl AnalyticsStore for AnalyticsDb {
  type Error = Error;

  // ── Calls ───────────────────────────────────────────────────────────────

  async fn load_calls(&self, records: Vec<CallRecord>) -> Result<u64> {
    let rows: Vec<CallRecordRow> =
      records.iter().map(CallRecordRow::from_record).collect();

    let inserted = self
      .router
      .write::<CallRecord>()?
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0u64;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO call_records (
               call_id, client_id, call_date, duration_seconds, call_type,
               result, center_id, service_id, agent_id, queue_seconds,
               talk_seconds, hold_seconds, transfer_count, satisfaction,
               metadata
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                       ?13, ?14, ?15)",
          )?;
          for row in &rows {
            inserted += stmt.execute(rusqlite::params![
              row.call_id,
              row.client_id,
              row.call_date,
              row.duration_seconds,
              row.call_type,
              row.result,
              row.center_id,
              row.service_id,
              row.agent_id,
              row.queue_seconds,
              row.talk_seconds,
              row.hold_seconds,
              row.transfer_count,
              row.satisfaction,
              row.metadata,
            ])? as u64;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    Ok(inserted)
  }

  async fn get_call(&self, call_id: &str) -> Result<Option<CallRecord>> {
    let id = call_id.to_owned();

    let row: Option<CallRecordRow> = self
      .router
      .read::<CallRecord>()
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT call_id, client_id, call_date, duration_seconds,
                      call_type, result, center_id, service_id, agent_id,
                      queue_seconds, talk_seconds, hold_seconds,
                      transfer_count, satisfaction, metadata
               FROM call_records WHERE call_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(CallRecordRow {
                  call_id:          row.get(0)?,
                  client_id:        row.get(1)?,
                  call_date:        row.get(2)?,
                  duration_seconds: row.get(3)?,
                  call_type:        row.get(4)?,
                  result:           row.get(5)?,
                  center_id:        row.get(6)?,
                  service_id:       row.get(7)?,
                  agent_id:         row.get(8)?,
                  queue_seconds:    row.get(9)?,
                  talk_seconds:     row.get(10)?,
                  hold_seconds:     row.get(11)?,
                  transfer_count:   row.get(12)?,
                  satisfaction:     row.get(13)?,
                  metadata:         row.get(14)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    row.map(CallRecordRow::into_record).transpose()
  }

  async fn list_calls(&self, window: TimeWindow) -> Result<Vec<CallRecord>> {
    let start_str = encode_dt(window.start);
    let end_str   = encode_dt(window.end);

    let rows: Vec<CallRecordRow> = self
      .router
      .read::<CallRecord>()
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT call_id, client_id, call_date, duration_seconds,
                  call_type, result, center_id, service_id, agent_id,
                  queue_seconds, talk_seconds, hold_seconds,
                  transfer_count, satisfaction, metadata
           FROM call_records
           WHERE call_date >= ?1 AND call_date < ?2
           ORDER BY call_date",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![start_str, end_str], |row| {
            Ok(CallRecordRow {
              call_id:          row.get(0)?,
              client_id:        row.get(1)?,
              call_date:        row.get(2)?,
              duration_seconds: row.get(3)?,
              call_type:        row.get(4)?,
              result:           row.get(5)?,
              center_id:        row.get(6)?,
              service_id:       row.get(7)?,
              agent_id:         row.get(8)?,
              queue_seconds:    row.get(9)?,
              talk_seconds:     row.get(10)?,
              hold_seconds:     row.get(11)?,
              transfer_count:   row.get(12)?,
              satisfaction:     row.get(13)?,
              metadata:         row.get(14)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    rows.into_iter().map(CallRecordRow::into_record).collect()
  }

  async fn purge_calls_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
    let cutoff_str = encode_dt(cutoff);

    let deleted = self
      .router
      .write::<CallRecord>()?
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM call_records WHERE call_date < ?1",
          rusqlite::params![cutoff_str],
        )?)
      })
      .await?;

    Ok(deleted as u64)
  }

  // ── Job ledger ──────────────────────────────────────────────────────────

  async fn create_job(
    &self,
    job_name: &str,
    window: TimeWindow,
  ) -> Result<EtlJob> {
    let job = EtlJob {
      job_id:        Uuid::new_v4(),
      job_name:      job_name.to_owned(),
      status:        JobStatus::Pending,
      window,
      created_at:    Utc::now(),
      started_at:    None,
      completed_at:  None,
      counts:        RunCounts::default(),
      error_message: None,
    };

    let id_str     = encode_uuid(job.job_id);
    let name       = job.job_name.clone();
    let status_str = job.status.discriminant().to_owned();
    let start_str  = encode_dt(job.window.start);
    let end_str    = encode_dt(job.window.end);
    let at_str     = encode_dt(job.created_at);

    self
      .router
      .write::<EtlJob>()?
      .call(move |conn| {
        conn.execute(
          "INSERT INTO etl_jobs (
             job_id, job_name, status, window_start, window_end, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str, name, status_str, start_str, end_str, at_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(job)
  }

  async fn mark_job_running(&self, job_id: Uuid) -> Result<EtlJob> {
    let id_str     = encode_uuid(job_id);
    let status_str = JobStatus::Running.discriminant().to_owned();
    let at_str     = encode_dt(Utc::now());

    let affected = self
      .router
      .write::<EtlJob>()?
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE etl_jobs SET status = ?2, started_at = ?3
           WHERE job_id = ?1",
          rusqlite::params![id_str, status_str, at_str],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(Error::JobNotFound(job_id));
    }
    self.require_job(job_id).await
  }

  async fn mark_job_completed(
    &self,
    job_id: Uuid,
    counts: RunCounts,
  ) -> Result<EtlJob> {
    let id_str     = encode_uuid(job_id);
    let status_str = JobStatus::Completed.discriminant().to_owned();
    let at_str     = encode_dt(Utc::now());

    let affected = self
      .router
      .write::<EtlJob>()?
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE etl_jobs SET
             status = ?2, completed_at = ?3,
             records_extracted = ?4, records_transformed = ?5,
             records_loaded = ?6, records_skipped = ?7, records_failed = ?8
           WHERE job_id = ?1",
          rusqlite::params![
            id_str,
            status_str,
            at_str,
            counts.extracted as i64,
            counts.transformed as i64,
            counts.loaded as i64,
            counts.skipped as i64,
            counts.failed as i64,
          ],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(Error::JobNotFound(job_id));
    }
    self.require_job(job_id).await
  }

  async fn mark_job_failed(
    &self,
    job_id: Uuid,
    message: &str,
  ) -> Result<EtlJob> {
    let id_str     = encode_uuid(job_id);
    let status_str = JobStatus::Failed.discriminant().to_owned();
    let at_str     = encode_dt(Utc::now());
    let message    = message.to_owned();

    let affected = self
      .router
      .write::<EtlJob>()?
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE etl_jobs SET status = ?2, completed_at = ?3,
             error_message = ?4
           WHERE job_id = ?1",
          rusqlite::params![id_str, status_str, at_str, message],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(Error::JobNotFound(job_id));
    }
    self.require_job(job_id).await
  }

  async fn get_job(&self, job_id: Uuid) -> Result<Option<EtlJob>> {
    self.fetch_job(job_id).await
  }

  async fn recent_jobs(&self, limit: usize) -> Result<Vec<EtlJob>> {
    let limit_val = limit as i64;

    let rows: Vec<JobRow> = self
      .router
      .read::<EtlJob>()
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT job_id, job_name, status, window_start, window_end,
                  created_at, started_at, completed_at,
                  records_extracted, records_transformed, records_loaded,
                  records_skipped, records_failed, error_message
           FROM etl_jobs
           ORDER BY created_at DESC
           LIMIT ?1",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![limit_val], |row| {
            Ok(JobRow {
              job_id:        row.get(0)?,
              job_name:      row.get(1)?,
              status:        row.get(2)?,
              window_start:  row.get(3)?,
              window_end:    row.get(4)?,
              created_at:    row.get(5)?,
              started_at:    row.get(6)?,
              completed_at:  row.get(7)?,
              extracted:     row.get(8)?,
              transformed:   row.get(9)?,
              loaded:        row.get(10)?,
              skipped:       row.get(11)?,
              failed:        row.get(12)?,
              error_message: row.get(13)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    rows.into_iter().map(JobRow::into_job).collect()
  }

  // ── Faults ──────────────────────────────────────────────────────────────

  async fn record_faults(&self, faults: Vec<NewFault>) -> Result<()> {
    let now_str = encode_dt(Utc::now());
    let rows: Vec<FaultRow> = faults
      .into_iter()
      .map(|fault| FaultRow::from_new(fault, now_str.clone()))
      .collect();

    self
      .router
      .write::<ValidationFault>()?
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO etl_job_faults (
               fault_id, job_id, call_id, field, message, record_json,
               severity, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          )?;
          for row in &rows {
            stmt.execute(rusqlite::params![
              row.fault_id,
              row.job_id,
              row.call_id,
              row.field,
              row.message,
              row.record_json,
              row.severity,
              row.created_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn faults_for_job(&self, job_id: Uuid) -> Result<Vec<ValidationFault>> {
    let id_str = encode_uuid(job_id);

    let rows: Vec<FaultRow> = self
      .router
      .read::<ValidationFault>()
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT fault_id, job_id, call_id, field, message, record_json,
                  severity, created_at
           FROM etl_job_faults
           WHERE job_id = ?1
           ORDER BY created_at",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(FaultRow {
              fault_id:    row.get(0)?,
              job_id:      row.get(1)?,
              call_id:     row.get(2)?,
              field:       row.get(3)?,
              message:     row.get(4)?,
              record_json: row.get(5)?,
              severity:    row.get(6)?,
              created_at:  row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    rows.into_iter().map(FaultRow::into_fault).collect()
  }
}
