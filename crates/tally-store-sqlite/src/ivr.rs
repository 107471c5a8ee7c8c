//! [`IvrDb`], the SQLite implementation of [`CallSource`].
//!
//! All queries go through the router's legacy connection. The trait exposes
//! no write operations, the routing policy denies any attempt typed against
//! the legacy namespace, and the connection itself is opened read-only.

use rusqlite::OptionalExtension as _;

use tally_core::{
  call::{RawCall, RawClient},
  source::CallSource,
  window::TimeWindow,
};

use crate::{
  DbRouter, Error, Result,
  encode::{LegacyCallRow, encode_dt},
};

/// Read-only adapter over the legacy IVR store.
///
/// Cloning is cheap; the underlying connections are reference-counted.
#[derive(Clone)]
pub struct IvrDb {
  router: DbRouter,
}

impl IvrDb {
  pub fn new(router: DbRouter) -> Self { Self { router } }
}

impl CallSource for IvrDb {
  type Error = Error;

  async fn fetch_calls(&self, window: TimeWindow) -> Result<Vec<RawCall>> {
    let start_str = encode_dt(window.start);
    let end_str   = encode_dt(window.end);

    let rows: Vec<LegacyCallRow> = self
      .router
      .read::<RawCall>()
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT call_id, client_id, call_date, duration_seconds,
                  call_type, result, center_id, service_id, agent_id,
                  queue_seconds, talk_seconds, hold_seconds,
                  transfer_count, satisfaction, extra_json
           FROM calls
           WHERE call_date >= ?1 AND call_date < ?2
           ORDER BY call_date",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![start_str, end_str], |row| {
            Ok(LegacyCallRow {
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
              extra_json:       row.get(14)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    rows.into_iter().map(LegacyCallRow::into_raw_call).collect()
  }

  async fn fetch_client(&self, client_id: &str) -> Result<RawClient> {
    let id = client_id.to_owned();

    let row: Option<(String, String)> = self
      .router
      .read::<RawClient>()
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT client_id, full_name FROM clients WHERE client_id = ?1",
              rusqlite::params![id],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    row
      .map(|(client_id, full_name)| RawClient { client_id, full_name })
      .ok_or_else(|| Error::ClientNotFound(client_id.to_owned()))
  }
}
