#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("config `{0}`")]
    Config(String),

    #[error("statement `{statement}` failed: {reason}")]
    Execution { statement: String, reason: String },

    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),

    #[error("ledger engine is shut down")]
    Closed,

    #[error("serde_json `{0}`")]
    SerdeJson(#[from] serde_json::Error),

    #[error("{0}`")]
    Any(#[from] anyhow::Error),
}

impl StoreError {
    pub fn execution(statement: impl ToString, reason: impl Into<String>) -> Self {
        Self::Execution {
            statement: statement.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
