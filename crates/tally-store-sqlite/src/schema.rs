//! SQL schema for the Tally analytics store.
//!
//! Only the analytics namespace has DDL here. The legacy IVR schema is owned
//! by the external system and is never created or migrated by this codebase;
//! the routing policy enforces that at [`crate::DbRouter::apply_migration`].

use tally_core::routing::Namespace;

/// A schema migration owned by this codebase.
pub struct Migration {
  /// The namespace whose tables this DDL manages.
  pub namespace: Namespace,
  pub ddl:       &'static str,
}

/// Every migration this codebase owns. The legacy IVR namespace deliberately
/// has no entry.
pub const MIGRATIONS: &[Migration] = &[Migration {
  namespace: Namespace::Analytics,
  ddl:       ANALYTICS_SCHEMA,
}];

/// Analytics DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const ANALYTICS_SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Normalized call analytics. Rows are immutable once loaded; reloading a
-- window skips existing call ids, it never updates them.
CREATE TABLE IF NOT EXISTS call_records (
    call_id          TEXT PRIMARY KEY,
    client_id        TEXT NOT NULL,
    call_date        TEXT NOT NULL,    -- ISO 8601 UTC
    duration_seconds INTEGER NOT NULL DEFAULT 0,
    call_type        TEXT NOT NULL DEFAULT 'unknown',
    result           TEXT NOT NULL DEFAULT 'unknown',
    center_id        TEXT,
    service_id       TEXT,
    agent_id         TEXT,
    queue_seconds    INTEGER NOT NULL DEFAULT 0,
    talk_seconds     INTEGER NOT NULL DEFAULT 0,
    hold_seconds     INTEGER NOT NULL DEFAULT 0,
    transfer_count   INTEGER NOT NULL DEFAULT 0,
    satisfaction     INTEGER,
    metadata         TEXT NOT NULL DEFAULT '{}'   -- JSON object
);

-- One row per ETL cycle. Status transitions go pending -> running ->
-- completed | failed; counts are written once, at completion.
CREATE TABLE IF NOT EXISTS etl_jobs (
    job_id              TEXT PRIMARY KEY,
    job_name            TEXT NOT NULL,
    status              TEXT NOT NULL DEFAULT 'pending',
    window_start        TEXT NOT NULL,
    window_end          TEXT NOT NULL,
    created_at          TEXT NOT NULL,
    started_at          TEXT,
    completed_at        TEXT,
    records_extracted   INTEGER NOT NULL DEFAULT 0,
    records_transformed INTEGER NOT NULL DEFAULT 0,
    records_loaded      INTEGER NOT NULL DEFAULT 0,
    records_skipped     INTEGER NOT NULL DEFAULT 0,
    records_failed      INTEGER NOT NULL DEFAULT 0,
    error_message       TEXT
);

-- Validation faults are strictly append-only.
CREATE TABLE IF NOT EXISTS etl_job_faults (
    fault_id    TEXT PRIMARY KEY,
    job_id      TEXT NOT NULL REFERENCES etl_jobs(job_id),
    call_id     TEXT,
    field       TEXT,
    message     TEXT NOT NULL,
    record_json TEXT NOT NULL DEFAULT '{}',
    severity    TEXT NOT NULL DEFAULT 'error',
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS call_records_date_idx   ON call_records(call_date);
CREATE INDEX IF NOT EXISTS call_records_client_idx ON call_records(client_id);
CREATE INDEX IF NOT EXISTS etl_jobs_created_idx    ON etl_jobs(created_at);
CREATE INDEX IF NOT EXISTS job_faults_job_idx      ON etl_job_faults(job_id);

PRAGMA user_version = 1;
";
