use async_trait::async_trait;
use dyn_clone::DynClone;
use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{
    direction::Direction,
    error::{MigrateError, Result},
};

/// Supplies the statements that move a ledger exactly one version step.
#[async_trait]
pub trait MigrationSource: DynClone + Send + Sync {
    /// Statements of `{direction}/{version}-migration.sql`, one per line.
    ///
    /// Loading the same file twice yields the same statements.
    async fn load(&self, direction: Direction, version: i32) -> Result<Vec<String>>;
}

dyn_clone::clone_trait_object!(MigrationSource);

/// `{direction}/{version}-migration.sql`
pub fn file_name(direction: Direction, version: i32) -> PathBuf {
    Path::new(&direction.to_string()).join(format!("{version}-migration.sql"))
}

/// One statement per non-blank line.
pub fn statements(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Migration files laid out on disk under a root directory.
#[derive(Debug, Clone)]
pub struct Directory {
    root: PathBuf,
}

impl Directory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, direction: Direction, version: i32) -> PathBuf {
        self.root.join(file_name(direction, version))
    }
}

#[async_trait]
impl MigrationSource for Directory {
    async fn load(&self, direction: Direction, version: i32) -> Result<Vec<String>> {
        let path = self.path(direction, version);

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(statements(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(MigrateError::NotFound {
                direction,
                version,
                path,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

/// Migration files held in memory, for programs that embed their migrations.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<(Direction, i32), String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, direction: Direction, version: i32, content: impl Into<String>) -> Self {
        self.files.insert((direction, version), content.into());
        self
    }

    pub fn up(self, version: i32, content: impl Into<String>) -> Self {
        self.file(Direction::Up, version, content)
    }

    pub fn down(self, version: i32, content: impl Into<String>) -> Self {
        self.file(Direction::Down, version, content)
    }
}

#[async_trait]
impl MigrationSource for MemorySource {
    async fn load(&self, direction: Direction, version: i32) -> Result<Vec<String>> {
        match self.files.get(&(direction, version)) {
            Some(content) => Ok(statements(content)),
            None => Err(MigrateError::NotFound {
                direction,
                version,
                path: file_name(direction, version),
            }),
        }
    }
}
