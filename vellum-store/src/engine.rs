use async_trait::async_trait;
use dyn_clone::DynClone;
use serde_json::Value;

use crate::{error::Result, statement::Statement};

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "memory")]
pub use memory::*;

/// What a transaction does when one of its statements fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnError {
    /// Roll the whole transaction back and return the failure.
    #[default]
    Abort,
    /// Record the failure and keep going; the surviving statements commit.
    Continue,
}

/// Statements executed atomically by [`Engine::execute`].
///
/// A transaction is plain data: an engine may run it more than once when it
/// retries after an optimistic-concurrency conflict.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    pub statements: Vec<Statement>,
    pub on_error: OnError,
}

impl Transaction {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            statements,
            ..Self::default()
        }
    }

    pub fn single(statement: Statement) -> Self {
        Self::new(vec![statement])
    }

    pub fn on_error(mut self, value: OnError) -> Self {
        self.on_error = value;
        self
    }
}

/// Result of one statement, in the order the statements were submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rows(Vec<Value>),
    Failed(String),
}

impl Outcome {
    pub fn rows(self) -> Vec<Value> {
        match self {
            Outcome::Rows(rows) => rows,
            Outcome::Failed(_) => vec![],
        }
    }
}

#[async_trait]
pub trait Engine: DynClone + Send + Sync {
    async fn execute(&self, transaction: Transaction) -> Result<Vec<Outcome>>;

    /// Tables that are active and ready to be queried.
    async fn table_names(&self) -> Result<Vec<String>>;

    async fn shutdown(&self);
}

dyn_clone::clone_trait_object!(Engine);
