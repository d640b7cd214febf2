#![forbid(unsafe_code)]

mod config;
mod engine;
mod error;
mod revision;
mod statement;
mod store;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use revision::*;
pub use statement::*;
pub use store::*;
