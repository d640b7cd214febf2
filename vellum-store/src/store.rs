use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    engine::{Engine, Outcome, Transaction},
    error::Result,
    statement::Statement,
};

/// Cheap, cloneable handle over a ledger engine.
///
/// Both the history queries and the migrator are built on top of a `Store`.
#[derive(Clone)]
pub struct Store {
    pub(crate) engine: Box<dyn Engine>,
}

impl Store {
    pub fn new<E: Engine + 'static>(engine: E) -> Self {
        Self {
            engine: Box::new(engine),
        }
    }

    pub async fn execute(&self, transaction: Transaction) -> Result<Vec<Outcome>> {
        for statement in transaction.statements.iter() {
            statement.validate()?;
        }

        tracing::debug!(
            statements = transaction.statements.len(),
            on_error = ?transaction.on_error,
            "executing transaction"
        );

        self.engine.execute(transaction).await
    }

    /// Runs a single statement in its own transaction and returns its rows.
    pub async fn run(&self, statement: Statement) -> Result<Vec<Value>> {
        let outcomes = self.execute(Transaction::single(statement)).await?;

        Ok(outcomes
            .into_iter()
            .next()
            .map(Outcome::rows)
            .unwrap_or_default())
    }

    pub async fn select<D: DeserializeOwned>(&self, table: impl Into<String>) -> Result<Vec<D>> {
        let rows = self
            .run(Statement::Select {
                table: table.into(),
            })
            .await?;

        let mut documents = Vec::with_capacity(rows.len());

        for row in rows {
            documents.push(serde_json::from_value(row)?);
        }

        Ok(documents)
    }

    /// Inserts a document and returns the id the ledger assigned to it.
    pub async fn insert<D: Serialize>(
        &self,
        table: impl Into<String>,
        document: &D,
    ) -> Result<String> {
        let rows = self
            .run(Statement::Insert {
                table: table.into(),
                document: serde_json::to_value(document)?,
            })
            .await?;

        rows.first()
            .and_then(|row| row.get("documentId"))
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
            .ok_or_else(|| anyhow::anyhow!("insert returned no document id").into())
    }

    pub async fn update<D: Serialize>(
        &self,
        table: impl Into<String>,
        document_id: impl Into<String>,
        document: &D,
    ) -> Result<()> {
        self.run(Statement::Update {
            table: table.into(),
            document_id: document_id.into(),
            document: serde_json::to_value(document)?,
        })
        .await?;

        Ok(())
    }

    pub async fn redact(
        &self,
        table: impl Into<String>,
        document_id: impl Into<String>,
        version: i32,
    ) -> Result<()> {
        self.run(Statement::Redact {
            table: table.into(),
            document_id: document_id.into(),
            version,
        })
        .await?;

        Ok(())
    }

    pub async fn table_names(&self) -> Result<Vec<String>> {
        self.engine.table_names().await
    }

    pub async fn shutdown(&self) {
        self.engine.shutdown().await
    }
}
