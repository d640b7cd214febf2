/// Error type representing possible failures of a history query.
///
/// Queries are never retried at this layer: the ledger engine already retries
/// conflicting transactions, so anything reaching the caller is final.
///
/// # Example
///
/// ```rust
/// use vellum_query::QueryError;
///
/// fn describe(error: QueryError) -> String {
///     match error {
///         QueryError::Deserialize(e) => format!("malformed row: {e}"),
///         QueryError::MissingAggregate(table) => format!("no count for {table}"),
///         QueryError::Redacted { id, version } => format!("{id}@{version} is redacted"),
///         QueryError::Store(e) => format!("ledger: {e}"),
///     }
/// }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    /// A row returned by the ledger does not have the expected shape.
    #[error("deserialize: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// An aggregate query returned no row.
    #[error("aggregate over history({0}) returned no row")]
    MissingAggregate(String),

    /// The revision exists but its content was withheld by a redaction.
    #[error("revision {version} of {id} is redacted")]
    Redacted { id: String, version: i32 },

    /// The ledger rejected the query.
    #[error("store: {0}")]
    Store(#[from] vellum_store::StoreError),
}

pub type Result<T> = std::result::Result<T, QueryError>;
