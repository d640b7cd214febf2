use serde::Deserialize;

use crate::{error::Result, StoreError};

/// Connection settings handed to a ledger engine when it is built.
///
/// Nothing is read from the process environment; callers load this value
/// however they like (it deserializes from any serde format) and pass it in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Name of the ledger every transaction runs against.
    pub ledger: String,
}

impl LedgerConfig {
    pub fn new(ledger: impl Into<String>) -> Self {
        Self {
            ledger: ledger.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ledger.is_empty() {
            return Err(StoreError::Config("ledger name is empty".to_owned()));
        }

        let valid = self
            .ledger
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if !valid {
            return Err(StoreError::Config(format!(
                "ledger name `{}` contains invalid characters",
                self.ledger
            )));
        }

        Ok(())
    }
}
