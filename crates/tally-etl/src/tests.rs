//! End-to-end pipeline tests over real SQLite files.
//!
//! The legacy fixture is seeded with plain rusqlite before the router opens
//! it read-only, the same way the external IVR system owns that schema.

use std::{path::PathBuf, time::Duration};

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use tally_core::{
  call::RawCall,
  job::{JobStatus, RunCounts, Severity},
  store::AnalyticsStore,
  window::TimeWindow,
};
use tally_store_sqlite::{AnalyticsDb, DbRouter, IvrDb};

use crate::{Error, Pipeline, PipelineConfig, Scheduler};

const LEGACY_FIXTURE_SCHEMA: &str = "
CREATE TABLE calls (
    call_id          TEXT PRIMARY KEY,
    client_id        TEXT NOT NULL,
    call_date        TEXT NOT NULL,
    duration_seconds INTEGER,
    call_type        TEXT,
    result           TEXT,
    center_id        TEXT,
    service_id       TEXT,
    agent_id         TEXT,
    queue_seconds    INTEGER,
    talk_seconds     INTEGER,
    hold_seconds     INTEGER,
    transfer_count   INTEGER,
    satisfaction     INTEGER,
    extra_json       TEXT
);
CREATE TABLE clients (
    client_id TEXT PRIMARY KEY,
    full_name TEXT NOT NULL
);
";

fn at(hour: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
}

fn bare(call_id: &str, call_date: DateTime<Utc>) -> RawCall {
  RawCall::minimal(call_id, "cl-1", call_date)
}

fn full(call_id: &str, call_date: DateTime<Utc>) -> RawCall {
  RawCall {
    duration_seconds: Some(245),
    call_type: Some("inbound".into()),
    result: Some("answered".into()),
    center_id: Some("center-a".into()),
    service_id: Some("svc-9".into()),
    agent_id: Some("agent-7".into()),
    queue_seconds: Some(12),
    talk_seconds: Some(200),
    hold_seconds: Some(33),
    transfer_count: Some(1),
    satisfaction: Some(4),
    extra: Some(json!({"ivr_node": "menu-3"})),
    ..bare(call_id, call_date)
  }
}

struct Fixture {
  pipeline:    Pipeline<IvrDb, AnalyticsDb>,
  store:       AnalyticsDb,
  legacy_path: PathBuf,
  // Keeps the database files alive for the duration of the test.
  _dir:        tempfile::TempDir,
}

async fn fixture(raws: &[RawCall], config: PipelineConfig) -> Fixture {
  let dir = tempfile::tempdir().unwrap();
  let legacy_path = dir.path().join("ivr.db");

  {
    let conn = rusqlite::Connection::open(&legacy_path).unwrap();
    conn.execute_batch(LEGACY_FIXTURE_SCHEMA).unwrap();
    for raw in raws {
      conn
        .execute(
          "INSERT INTO calls (
             call_id, client_id, call_date, duration_seconds, call_type,
             result, center_id, service_id, agent_id, queue_seconds,
             talk_seconds, hold_seconds, transfer_count, satisfaction,
             extra_json
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                     ?13, ?14, ?15)",
          rusqlite::params![
            raw.call_id,
            raw.client_id,
            raw.call_date.to_rfc3339(),
            raw.duration_seconds,
            raw.call_type,
            raw.result,
            raw.center_id,
            raw.service_id,
            raw.agent_id,
            raw.queue_seconds,
            raw.talk_seconds,
            raw.hold_seconds,
            raw.transfer_count,
            raw.satisfaction,
            raw.extra.as_ref().map(|v| v.to_string()),
          ],
        )
        .unwrap();
    }
  }

  let router = DbRouter::open(dir.path().join("analytics.db"), &legacy_path)
    .await
    .unwrap();
  let store = AnalyticsDb::new(router.clone());
  let pipeline = Pipeline::new(IvrDb::new(router), store.clone(), config);

  Fixture { pipeline, store, legacy_path, _dir: dir }
}

// ─── Runs ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_run_loads_every_call_and_defaults_missing_fields() {
  let raws =
    vec![full("call-1", at(1)), bare("call-2", at(4)), bare("call-3", at(5))];
  let f = fixture(&raws, PipelineConfig::default()).await;

  let job = f
    .pipeline
    .run_window(TimeWindow::new(at(0), at(6)).unwrap())
    .await
    .unwrap();

  assert_eq!(job.status, JobStatus::Completed);
  assert_eq!(job.counts, RunCounts {
    extracted:   3,
    transformed: 3,
    loaded:      3,
    skipped:     0,
    failed:      0,
  });

  let populated = f.store.get_call("call-1").await.unwrap().unwrap();
  assert_eq!(populated.duration_seconds, 245);
  assert_eq!(populated.call_type, "inbound");
  assert_eq!(populated.satisfaction, Some(4));
  assert_eq!(populated.metadata, json!({"ivr_node": "menu-3"}));

  let defaulted = f.store.get_call("call-2").await.unwrap().unwrap();
  assert_eq!(defaulted.duration_seconds, 0);
  assert_eq!(defaulted.call_type, "unknown");
  assert_eq!(defaulted.result, "unknown");
  assert_eq!(defaulted.queue_seconds, 0);
  assert_eq!(defaulted.transfer_count, 0);
  assert_eq!(defaulted.center_id, None);
  assert_eq!(defaulted.satisfaction, None);
  assert_eq!(defaulted.metadata, json!({}));
}

#[tokio::test]
async fn rerunning_an_overlapping_window_skips_loaded_ids() {
  let raws =
    vec![full("call-1", at(1)), bare("call-2", at(4)), bare("call-3", at(5))];
  let f = fixture(&raws, PipelineConfig::default()).await;

  f.pipeline
    .run_window(TimeWindow::new(at(0), at(6)).unwrap())
    .await
    .unwrap();
  let second = f
    .pipeline
    .run_window(TimeWindow::new(at(3), at(9)).unwrap())
    .await
    .unwrap();

  assert_eq!(second.counts, RunCounts {
    extracted:   2,
    transformed: 2,
    loaded:      0,
    skipped:     2,
    failed:      0,
  });

  let all = f
    .store
    .list_calls(TimeWindow::new(at(0), at(12)).unwrap())
    .await
    .unwrap();
  assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn validation_faults_exclude_records_and_are_recorded() {
  let raws = vec![
    bare("call-1", at(1)),
    RawCall { duration_seconds: Some(-5), ..bare("call-2", at(2)) },
    RawCall { satisfaction: Some(9), ..bare("call-3", at(3)) },
  ];
  let f = fixture(&raws, PipelineConfig::default()).await;

  let job = f
    .pipeline
    .run_window(TimeWindow::new(at(0), at(6)).unwrap())
    .await
    .unwrap();

  assert_eq!(job.counts, RunCounts {
    extracted:   3,
    transformed: 2,
    loaded:      2,
    skipped:     0,
    failed:      1,
  });

  // The blocked record never reaches the store; the warned one does,
  // value preserved.
  assert!(f.store.get_call("call-2").await.unwrap().is_none());
  let warned = f.store.get_call("call-3").await.unwrap().unwrap();
  assert_eq!(warned.satisfaction, Some(9));

  let faults = f.store.faults_for_job(job.job_id).await.unwrap();
  assert_eq!(faults.len(), 2);

  let blocking = faults
    .iter()
    .find(|fault| fault.field.as_deref() == Some("duration_seconds"))
    .unwrap();
  assert_eq!(blocking.call_id.as_deref(), Some("call-2"));
  assert_eq!(blocking.severity, Severity::Error);

  let warning = faults
    .iter()
    .find(|fault| fault.field.as_deref() == Some("satisfaction"))
    .unwrap();
  assert_eq!(warning.call_id.as_deref(), Some("call-3"));
  assert_eq!(warning.severity, Severity::Warning);
}

#[tokio::test]
async fn center_filter_drops_other_centers() {
  let raws = vec![
    RawCall { center_id: Some("center-a".into()), ..bare("call-1", at(1)) },
    RawCall { center_id: Some("center-b".into()), ..bare("call-2", at(2)) },
    bare("call-3", at(3)),
  ];
  let config = PipelineConfig {
    allowed_centers: vec!["center-a".to_string()],
    ..PipelineConfig::default()
  };
  let f = fixture(&raws, config).await;

  let job = f
    .pipeline
    .run_window(TimeWindow::new(at(0), at(6)).unwrap())
    .await
    .unwrap();

  // Filtered records count as extracted but neither failed nor transformed.
  assert_eq!(job.counts, RunCounts {
    extracted:   3,
    transformed: 1,
    loaded:      1,
    skipped:     0,
    failed:      0,
  });
  assert!(f.store.get_call("call-1").await.unwrap().is_some());
  assert!(f.store.get_call("call-2").await.unwrap().is_none());
  assert!(f.store.get_call("call-3").await.unwrap().is_none());
}

#[tokio::test]
async fn extract_failure_marks_the_job_failed() {
  let f = fixture(&[bare("call-1", at(1))], PipelineConfig::default()).await;

  {
    let conn = rusqlite::Connection::open(&f.legacy_path).unwrap();
    conn.execute_batch("DROP TABLE calls").unwrap();
  }

  let err = f
    .pipeline
    .run_window(TimeWindow::new(at(0), at(6)).unwrap())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Extract(_)));

  let jobs = f.store.recent_jobs(1).await.unwrap();
  assert_eq!(jobs[0].status, JobStatus::Failed);
  assert!(jobs[0].error_message.is_some());
}

#[tokio::test]
async fn run_once_covers_the_configured_frequency() {
  let f = fixture(&[], PipelineConfig::default()).await;

  let job = f.pipeline.run_once().await.unwrap();

  assert_eq!(job.status, JobStatus::Completed);
  assert_eq!(job.window.end - job.window.start, chrono::Duration::hours(6));
  assert_eq!(job.counts, RunCounts::default());
}

// ─── Retention ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn purge_expired_deletes_beyond_retention() {
  let recent = Utc::now() - chrono::Duration::hours(2);
  let raws = vec![bare("call-old", at(1)), bare("call-new", recent)];
  let config =
    PipelineConfig { retention_days: 1, ..PipelineConfig::default() };
  let f = fixture(&raws, config).await;

  f.pipeline
    .run_window(TimeWindow::new(at(0), Utc::now()).unwrap())
    .await
    .unwrap();

  let deleted = f.pipeline.purge_expired().await.unwrap();
  assert_eq!(deleted, 1);
  assert!(f.store.get_call("call-old").await.unwrap().is_none());
  assert!(f.store.get_call("call-new").await.unwrap().is_some());
}

// ─── Scheduler ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn scheduler_runs_immediately_and_stops_cleanly() {
  let recent = Utc::now() - chrono::Duration::hours(1);
  let f =
    fixture(&[bare("call-1", recent)], PipelineConfig::default()).await;
  let store = f.store.clone();

  let scheduler = Scheduler::start(f.pipeline, Duration::from_millis(25));
  tokio::time::sleep(Duration::from_millis(120)).await;
  scheduler.stop().await;

  let jobs = store.recent_jobs(64).await.unwrap();
  assert!(!jobs.is_empty());
  assert!(jobs.iter().all(|job| job.status == JobStatus::Completed));

  // The loop is joined; no further jobs can appear.
  let settled = jobs.len();
  tokio::time::sleep(Duration::from_millis(60)).await;
  assert_eq!(store.recent_jobs(64).await.unwrap().len(), settled);

  assert!(store.get_call("call-1").await.unwrap().is_some());
}
