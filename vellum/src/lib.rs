#![forbid(unsafe_code)]

mod config;
mod direction;
mod error;
mod migrator;
mod propagation;
mod source;
mod validator;
mod version;

pub use config::*;
pub use direction::*;
pub use error::*;
pub use migrator::*;
pub use propagation::*;
pub use source::*;
pub use validator::*;
pub use version::*;

pub use vellum_query::{History, QueryError, RedactionSummary};
pub use vellum_store::{
    Engine, LedgerConfig, OnError, Outcome, Revision, RevisionMetadata, Statement, Store,
    StoreError, Transaction,
};

#[cfg(feature = "memory")]
pub use vellum_store::Memory;
