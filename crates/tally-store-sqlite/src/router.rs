//! [`DbRouter`]: the two physical connections and the policy between them.
//!
//! Every store in this crate reaches its connection through the router, so
//! the routing policy in [`tally_core::routing`] is applied on every access.
//! The legacy connection is additionally opened with SQLite's read-only flag;
//! the typed write ban is the contract surface, the flag backs it at the
//! engine level.

use std::path::Path;

use rusqlite::OpenFlags;
use tally_core::routing::{self, DatabaseAlias, Entity};

use crate::{Result, schema};

/// Owns the primary (analytics, read-write) and legacy (IVR, read-only)
/// connections and routes entity access between them.
///
/// Cloning is cheap; the inner connections are reference-counted.
#[derive(Clone)]
pub struct DbRouter {
  primary: tokio_rusqlite::Connection,
  legacy:  tokio_rusqlite::Connection,
}

impl DbRouter {
  /// Open (or create) the analytics store at `primary` and attach the legacy
  /// IVR store at `legacy` read-only, then run the analytics migrations.
  ///
  /// The legacy file must already exist: it is owned by the external IVR
  /// system and is never created here.
  pub async fn open(
    primary: impl AsRef<Path>,
    legacy: impl AsRef<Path>,
  ) -> Result<Self> {
    let primary = tokio_rusqlite::Connection::open(primary).await?;
    let legacy = tokio_rusqlite::Connection::open_with_flags(
      legacy,
      OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .await?;

    let router = Self { primary, legacy };
    router.migrate().await?;
    Ok(router)
  }

  /// The connection that serves reads for `E`.
  pub fn read<E: Entity>(&self) -> &tokio_rusqlite::Connection {
    self.connection(routing::read_alias(E::NAMESPACE))
  }

  /// The connection that serves writes for `E`.
  ///
  /// Fails before touching any connection when `E` lives in the legacy
  /// namespace; the error names the entity.
  pub fn write<E: Entity>(&self) -> Result<&tokio_rusqlite::Connection> {
    let alias = routing::write_alias(E::NAME, E::NAMESPACE)?;
    Ok(self.connection(alias))
  }

  /// Apply one migration to `target`, subject to the routing policy.
  ///
  /// Refused for any migration aimed at the legacy connection, and for the
  /// legacy namespace on any connection.
  pub async fn apply_migration(
    &self,
    target: DatabaseAlias,
    migration: &schema::Migration,
  ) -> Result<()> {
    if !routing::migration_allowed(target, migration.namespace) {
      return Err(crate::Error::MigrationRefused {
        target,
        namespace: migration.namespace,
      });
    }

    let ddl = migration.ddl;
    self
      .connection(target)
      .call(move |conn| {
        conn.execute_batch(ddl)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Apply every registered migration to the primary connection.
  pub async fn migrate(&self) -> Result<()> {
    for migration in schema::MIGRATIONS {
      self.apply_migration(DatabaseAlias::Primary, migration).await?;
    }
    Ok(())
  }

  fn connection(&self, alias: DatabaseAlias) -> &tokio_rusqlite::Connection {
    match alias {
      DatabaseAlias::Primary => &self.primary,
      DatabaseAlias::LegacyReadOnly => &self.legacy,
    }
  }
}
