//! Data-store routing policy.
//!
//! Every persisted entity type declares the namespace it belongs to; the
//! policy functions here decide which physical connection serves a read or a
//! write, whether two records may be related, and where schema migrations may
//! run. The write ban on the legacy namespace is the load-bearing invariant:
//! the IVR store is owned by an external system and must never receive writes
//! from this codebase, regardless of caller or call site.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Tags ────────────────────────────────────────────────────────────────────

/// The physical database connections the router manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseAlias {
  /// The analytics store this system owns; read-write.
  Primary,
  /// The legacy IVR store; a dedicated read-only connection.
  LegacyReadOnly,
}

/// The schema namespace an entity type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
  /// Tables owned by this system: normalized calls, the job ledger.
  Analytics,
  /// Tables owned by the external IVR system.
  IvrLegacy,
}

/// Where a hydrated record came from, for relation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
  Primary,
  LegacyReadOnly,
  /// Not yet persisted, or never stamped with an origin.
  Unset,
  /// Hydrated from a connection this router does not manage.
  Foreign,
}

// ─── Entity affinity ─────────────────────────────────────────────────────────

/// Declared data-store affinity of a persisted entity type.
///
/// The namespace is a compile-time constant on the type, not a runtime label,
/// so routing decisions are exhaustive matches with no string comparison.
pub trait Entity {
  const NAMESPACE: Namespace;
  /// Fully-qualified type name, used verbatim in router diagnostics.
  const NAME: &'static str;
}

// ─── Policy ──────────────────────────────────────────────────────────────────

/// The connection that serves reads for `ns`.
pub fn read_alias(ns: Namespace) -> DatabaseAlias {
  match ns {
    Namespace::Analytics => DatabaseAlias::Primary,
    Namespace::IvrLegacy => DatabaseAlias::LegacyReadOnly,
  }
}

/// The connection that serves writes for the entity named `name` in `ns`.
///
/// Writes against the legacy namespace always fail, before any I/O reaches a
/// connection. The error names the offending entity so the call site is
/// identifiable from the message alone.
pub fn write_alias(name: &'static str, ns: Namespace) -> Result<DatabaseAlias> {
  match ns {
    Namespace::Analytics => Ok(DatabaseAlias::Primary),
    Namespace::IvrLegacy => Err(Error::LegacyWriteDenied(name)),
  }
}

/// Whether records of origins `a` and `b` may be related.
///
/// `Some(true)` when both sides come from connections this router manages (or
/// are not yet persisted); `None` when either side is foreign, and the router
/// has no opinion and the caller's default applies.
pub fn relation_allowed(a: Origin, b: Origin) -> Option<bool> {
  match (a, b) {
    (Origin::Foreign, _) | (_, Origin::Foreign) => None,
    _ => Some(true),
  }
}

/// Whether the schema for `ns` may be migrated on the connection `target`.
///
/// The legacy namespace is never migrated by this codebase (its schema is
/// owned externally), and no namespace ever migrates on the read-only
/// connection.
pub fn migration_allowed(target: DatabaseAlias, ns: Namespace) -> bool {
  match (target, ns) {
    (DatabaseAlias::LegacyReadOnly, _) => false,
    (DatabaseAlias::Primary, Namespace::IvrLegacy) => false,
    (DatabaseAlias::Primary, Namespace::Analytics) => true,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::call::{CallRecord, RawCall};

  #[test]
  fn legacy_reads_use_the_read_only_alias() {
    assert_eq!(
      read_alias(Namespace::IvrLegacy),
      DatabaseAlias::LegacyReadOnly
    );
    assert_eq!(read_alias(Namespace::Analytics), DatabaseAlias::Primary);
  }

  #[test]
  fn analytics_writes_use_the_primary_alias() {
    let alias = write_alias(CallRecord::NAME, CallRecord::NAMESPACE).unwrap();
    assert_eq!(alias, DatabaseAlias::Primary);
  }

  #[test]
  fn legacy_writes_are_denied_and_name_the_entity() {
    let err = write_alias(RawCall::NAME, RawCall::NAMESPACE).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("CRITICAL RESTRICTION VIOLATED"));
    assert!(msg.contains("tally_core::call::RawCall"));
  }

  #[test]
  fn relations_among_managed_origins_are_allowed() {
    let managed =
      [Origin::Primary, Origin::LegacyReadOnly, Origin::Unset];
    for a in managed {
      for b in managed {
        assert_eq!(relation_allowed(a, b), Some(true));
      }
    }
  }

  #[test]
  fn relations_involving_foreign_origins_yield_no_opinion() {
    assert_eq!(relation_allowed(Origin::Foreign, Origin::Primary), None);
    assert_eq!(relation_allowed(Origin::Unset, Origin::Foreign), None);
    assert_eq!(relation_allowed(Origin::Foreign, Origin::Foreign), None);
  }

  #[test]
  fn migrations_never_touch_the_legacy_connection_or_namespace() {
    assert!(!migration_allowed(
      DatabaseAlias::LegacyReadOnly,
      Namespace::Analytics
    ));
    assert!(!migration_allowed(
      DatabaseAlias::LegacyReadOnly,
      Namespace::IvrLegacy
    ));
    assert!(!migration_allowed(DatabaseAlias::Primary, Namespace::IvrLegacy));
    assert!(migration_allowed(DatabaseAlias::Primary, Namespace::Analytics));
  }
}
