use backoff::backoff::Constant;
use serde::Deserialize;
use std::{
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};
use vellum_store::Store;

use crate::error::{MigrateError, Result};

/// Fixed wait after each version step before the next one starts.
pub const PROPAGATION_DELAY: Duration = Duration::from_secs(1);

/// Interval between two readiness polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Readiness polls before a step is declared stuck.
pub const POLL_ATTEMPTS: u32 = 10;

/// How long to wait for tables created by a step to become usable.
///
/// The applier sleeps `delay`, then polls the ledger's table list every
/// `interval` until each created table shows up, at most `max_attempts` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Propagation {
    pub delay: Duration,
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for Propagation {
    fn default() -> Self {
        Self {
            delay: PROPAGATION_DELAY,
            interval: POLL_INTERVAL,
            max_attempts: POLL_ATTEMPTS,
        }
    }
}

impl Propagation {
    pub async fn wait(&self, store: &Store, version: i32, tables: &[String]) -> Result<()> {
        tokio::time::sleep(self.delay).await;

        if tables.is_empty() {
            return Ok(());
        }

        let attempts = AtomicU32::new(0);
        let attempts = &attempts;
        let max_attempts = self.max_attempts;

        backoff::future::retry(Constant::new(self.interval), move || async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let names = match store.table_names().await {
                Ok(names) => names,
                Err(e) => return Err(backoff::Error::permanent(MigrateError::from(e))),
            };

            let pending: Vec<String> = tables
                .iter()
                .filter(|table| !names.contains(table))
                .cloned()
                .collect();

            if pending.is_empty() {
                return Ok(());
            }

            tracing::debug!(version, attempt, ?pending, "waiting for tables");

            let err = MigrateError::NotReady {
                version,
                tables: pending,
            };

            if attempt >= max_attempts {
                Err(backoff::Error::permanent(err))
            } else {
                Err(backoff::Error::transient(err))
            }
        })
        .await
    }
}
