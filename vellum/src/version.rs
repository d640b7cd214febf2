use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vellum_store::{OnError, Outcome, Statement, Store, StoreError, Transaction};

use crate::error::{MigrateError, Result};

/// Version reported for a ledger on which no migration was ever applied.
///
/// Lower than every real version, so a fresh ledger starts at version 0.
pub const NO_VERSION: i32 = -1;

/// Ledger table holding one [`MigrationRecord`] per applied step.
pub const MIGRATION_TABLE: &str = "Migration";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    pub version: i32,
    pub applied_at: DateTime<Utc>,
    pub active: bool,
}

impl MigrationRecord {
    pub fn none() -> Self {
        Self {
            version: NO_VERSION,
            applied_at: DateTime::<Utc>::MIN_UTC,
            active: false,
        }
    }
}

/// Reads and appends migration state rows; nothing else writes to
/// [`MIGRATION_TABLE`].
#[derive(Clone)]
pub struct VersionLedger {
    store: Store,
}

impl VersionLedger {
    pub fn new(store: &Store) -> Self {
        Self {
            store: store.clone(),
        }
    }

    /// Creates the migration table when the ledger does not list it yet.
    ///
    /// [`VersionLedger::record_version`] calls it when an insert fails, so
    /// nothing is written before the first step is applied.
    pub async fn ensure_table(&self) -> Result<()> {
        if self
            .store
            .table_names()
            .await?
            .iter()
            .any(|name| name == MIGRATION_TABLE)
        {
            return Ok(());
        }

        // A table that exists but is still propagating is not listed yet, so
        // "already exists" is not a failure here.
        let outcomes = self
            .store
            .execute(
                Transaction::single(Statement::sql(format!("CREATE TABLE {MIGRATION_TABLE}")))
                    .on_error(OnError::Continue),
            )
            .await?;

        match outcomes.first() {
            Some(Outcome::Failed(reason)) => {
                tracing::debug!(reason = %reason, "migration table not created")
            }
            _ => tracing::info!("created {MIGRATION_TABLE} table"),
        }

        Ok(())
    }

    /// Every record ever written, in ledger order. Empty until the
    /// migration table exists.
    pub async fn list_versions(&self) -> Result<Vec<MigrationRecord>> {
        match self.store.select::<MigrationRecord>(MIGRATION_TABLE).await {
            Ok(records) => Ok(records),
            Err(e @ StoreError::Execution { .. }) => {
                let names = self.store.table_names().await?;

                if names.iter().any(|name| name == MIGRATION_TABLE) {
                    Err(e.into())
                } else {
                    Ok(vec![])
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn record_version(&self, version: i32) -> Result<MigrationRecord> {
        let record = MigrationRecord {
            version,
            applied_at: Utc::now(),
            active: true,
        };

        // The migration table is created on the first write only, unless a
        // migration file created it already.
        if let Err(e) = self.store.insert(MIGRATION_TABLE, &record).await {
            if !matches!(e, StoreError::Execution { .. }) {
                return Err(MigrateError::Execution { version, source: e });
            }

            self.ensure_table().await?;
            self.store
                .insert(MIGRATION_TABLE, &record)
                .await
                .map_err(|source| MigrateError::Execution { version, source })?;
        }

        Ok(record)
    }

    /// The most recently applied record, which is not necessarily the one
    /// with the highest version. Ties go to the record listed last.
    pub fn current_version(records: &[MigrationRecord]) -> MigrationRecord {
        let current = records
            .iter()
            .max_by_key(|record| record.applied_at)
            .copied()
            .unwrap_or_else(MigrationRecord::none);

        tracing::debug!(version = current.version, "most recent version");

        current
    }
}
