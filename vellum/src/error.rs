use std::path::PathBuf;
use vellum_query::QueryError;
use vellum_store::StoreError;

use crate::direction::Direction;

#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("config `{0}`")]
    Config(String),

    #[error("target version {0} is invalid, the lowest target is -1")]
    InvalidTarget(i32),

    #[error("{direction} migration {version} not found at {}", .path.display())]
    NotFound {
        direction: Direction,
        version: i32,
        path: PathBuf,
    },

    #[error("io `{0}`")]
    Io(#[from] std::io::Error),

    #[error("statement {position} of {direction} migration {version} is not permitted: `{statement}`")]
    Validation {
        direction: Direction,
        version: i32,
        position: usize,
        statement: String,
    },

    #[error("migration {version} failed: {source}")]
    Execution { version: i32, source: StoreError },

    #[error("tables {tables:?} created by migration {version} are not ready")]
    NotReady { version: i32, tables: Vec<String> },

    #[error("query `{0}`")]
    Query(#[from] QueryError),

    #[error("store `{0}`")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, MigrateError>;
