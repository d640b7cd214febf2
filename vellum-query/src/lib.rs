#![forbid(unsafe_code)]
mod error;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use vellum_store::{Revision, RevisionMetadata, Statement, Store};

pub use error::{QueryError, Result};

/// Number of revisions in a table's history that carry a `dataHash`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionSummary {
    #[serde(rename = "countHashes")]
    pub count: u64,
}

impl RedactionSummary {
    pub fn has_redaction(&self) -> bool {
        self.count > 0
    }
}

/// Read-only access to the revision history of ledger tables.
#[derive(Clone)]
pub struct History {
    store: Store,
}

impl History {
    pub fn new(store: &Store) -> Self {
        Self {
            store: store.clone(),
        }
    }

    /// Every recorded version of a document, oldest first.
    pub async fn list_versions(
        &self,
        table: impl Into<String>,
        document_id: impl Into<String>,
    ) -> Result<Vec<RevisionMetadata>> {
        let revisions = self
            .revisions(Statement::History {
                table: table.into(),
                document_id: Some(document_id.into()),
                version: None,
            })
            .await?;

        let mut versions: Vec<RevisionMetadata> =
            revisions.into_iter().map(|r| r.metadata).collect();
        versions.sort_by_key(|m| m.version);

        Ok(versions)
    }

    /// The revision recorded at exactly `version`, if there is one.
    pub async fn revision_at(
        &self,
        table: impl Into<String>,
        document_id: impl Into<String>,
        version: i32,
    ) -> Result<Option<Revision>> {
        let revisions = self
            .revisions(Statement::History {
                table: table.into(),
                document_id: Some(document_id.into()),
                version: Some(version),
            })
            .await?;

        Ok(revisions.into_iter().next())
    }

    /// Reconstructs a document as it was at `version`.
    ///
    /// Returns `Ok(None)` when the revision does not exist and
    /// [`QueryError::Redacted`] when it exists but was redacted.
    pub async fn read_at<D: DeserializeOwned>(
        &self,
        table: impl Into<String>,
        document_id: impl Into<String>,
        version: i32,
    ) -> Result<Option<D>> {
        let document_id = document_id.into();

        let Some(revision) = self.revision_at(table, &document_id, version).await? else {
            return Ok(None);
        };

        if revision.is_redacted() {
            return Err(QueryError::Redacted {
                id: document_id,
                version,
            });
        }

        match revision.data {
            Some(data) => Ok(Some(serde_json::from_value(data)?)),
            None => Ok(None),
        }
    }

    pub async fn redaction_summary(&self, table: impl Into<String>) -> Result<RedactionSummary> {
        let table = table.into();
        let rows = self
            .store
            .run(Statement::CountDataHashes {
                table: table.to_owned(),
            })
            .await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or(QueryError::MissingAggregate(table))?;

        Ok(serde_json::from_value(row)?)
    }

    /// Whether any revision in the table's lifetime was ever redacted.
    pub async fn has_redaction(&self, table: impl Into<String>) -> Result<bool> {
        let table = table.into();
        let summary = self.redaction_summary(&table).await?;

        tracing::debug!(table = %table, count = summary.count, "redaction summary");

        Ok(summary.has_redaction())
    }

    async fn revisions(&self, statement: Statement) -> Result<Vec<Revision>> {
        let rows = self.store.run(statement).await?;

        rows.into_iter()
            .map(|row: Value| serde_json::from_value(row).map_err(QueryError::from))
            .collect()
    }
}
