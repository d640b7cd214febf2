//! Configuration of the migrator.

use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

use crate::{
    error::{MigrateError, Result},
    propagation::Propagation,
};

/// Default root directory holding the `up/` and `down/` migration folders.
pub const MIGRATIONS_PATH: &str = "migrations";

/// How a downward step treats its statements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownPolicy {
    /// Submit without validation, log failing statements and keep going.
    #[default]
    BestEffort,
    /// Validate and abort like an upward step.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MigratorConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub propagation: Propagation,
    #[serde(default)]
    pub down_policy: DownPolicy,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(MIGRATIONS_PATH),
            propagation: Propagation::default(),
            down_policy: DownPolicy::default(),
        }
    }
}

impl MigratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.propagation.max_attempts == 0 {
            return Err(MigrateError::Config(
                "propagation.max_attempts must be at least 1".to_owned(),
            ));
        }

        Ok(())
    }
}

/// Configuration builder for customizing the migrator
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: MigratorConfig,
}

impl ConfigBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            config: MigratorConfig {
                path: path.into(),
                ..Default::default()
            },
        }
    }

    /// Set the fixed wait after each version step
    pub fn delay(mut self, delay: Duration) -> Self {
        self.config.propagation.delay = delay;
        self
    }

    /// Set the readiness poll interval and the maximum number of polls
    pub fn poll(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.config.propagation.interval = interval;
        self.config.propagation.max_attempts = max_attempts;
        self
    }

    pub fn down_policy(mut self, policy: DownPolicy) -> Self {
        self.config.down_policy = policy;
        self
    }

    pub fn build(self) -> MigratorConfig {
        self.config
    }
}
