use serde_json::Value;
use std::fmt;

use crate::{error::Result, StoreError};

/// A unit of work submitted to a ledger transaction.
///
/// `Sql` carries raw statement text exactly as read from a migration file.
/// Every other variant is structured so that table names are checked by
/// [`Statement::validate`] and values travel as bound parameters instead of
/// being spliced into the text.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Sql(String),
    Insert {
        table: String,
        document: Value,
    },
    Update {
        table: String,
        document_id: String,
        document: Value,
    },
    Redact {
        table: String,
        document_id: String,
        version: i32,
    },
    Select {
        table: String,
    },
    History {
        table: String,
        document_id: Option<String>,
        version: Option<i32>,
    },
    CountDataHashes {
        table: String,
    },
}

impl Statement {
    pub fn sql(text: impl Into<String>) -> Self {
        Self::Sql(text.into())
    }

    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Sql(_) => None,
            Self::Insert { table, .. }
            | Self::Update { table, .. }
            | Self::Redact { table, .. }
            | Self::Select { table }
            | Self::History { table, .. }
            | Self::CountDataHashes { table } => Some(table),
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Self::Select { .. } | Self::History { .. } | Self::CountDataHashes { .. }
        )
    }

    /// Rejects table names that are not plain identifiers.
    pub fn validate(&self) -> Result<()> {
        match self.table() {
            Some(table) if !is_identifier(table) => {
                Err(StoreError::InvalidIdentifier(table.to_owned()))
            }
            _ => Ok(()),
        }
    }

    /// Values bound to the `?` placeholders of the rendered text, in order.
    pub fn params(&self) -> Vec<Value> {
        match self {
            Self::Sql(_) | Self::Select { .. } | Self::CountDataHashes { .. } => vec![],
            Self::Insert { document, .. } => vec![document.clone()],
            Self::Update {
                document_id,
                document,
                ..
            } => vec![document.clone(), Value::from(document_id.as_str())],
            Self::Redact {
                table,
                document_id,
                version,
            } => vec![
                Value::from(table.as_str()),
                Value::from(document_id.as_str()),
                Value::from(*version),
            ],
            Self::History {
                document_id,
                version,
                ..
            } => {
                let mut params = Vec::new();
                if let Some(document_id) = document_id {
                    params.push(Value::from(document_id.as_str()));
                }
                if let Some(version) = version {
                    params.push(Value::from(*version));
                }
                params
            }
        }
    }

    /// Name of the table a raw `CREATE TABLE <name>` statement creates.
    pub fn created_table(&self) -> Option<&str> {
        let Self::Sql(text) = self else {
            return None;
        };

        let mut tokens = text.trim().trim_end_matches(';').split_whitespace();

        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(create), Some(table), Some(name))
                if create.eq_ignore_ascii_case("create") && table.eq_ignore_ascii_case("table") =>
            {
                Some(name)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql(text) => f.write_str(text),
            Self::Insert { table, .. } => write!(f, "INSERT INTO {table} ?"),
            Self::Update { table, .. } => {
                write!(f, "UPDATE {table} AS d BY did SET d = ? WHERE did = ?")
            }
            Self::Redact { .. } => f.write_str("EXEC redact_revision ?, ?, ?"),
            Self::Select { table } => write!(f, "SELECT * FROM {table}"),
            Self::History {
                table,
                document_id,
                version,
            } => {
                write!(f, "SELECT * FROM history({table}) AS h")?;

                match (document_id, version) {
                    (Some(_), Some(_)) => {
                        f.write_str(" WHERE h.metadata.id = ? AND h.metadata.version = ?")
                    }
                    (Some(_), None) => f.write_str(" WHERE h.metadata.id = ?"),
                    (None, Some(_)) => f.write_str(" WHERE h.metadata.version = ?"),
                    (None, None) => Ok(()),
                }
            }
            Self::CountDataHashes { table } => write!(
                f,
                "SELECT count(h.dataHash) AS countHashes FROM history({table}) AS h"
            ),
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
