use vellum_store::{OnError, Outcome, Statement, Store, Transaction};

use crate::{
    config::{DownPolicy, MigratorConfig},
    direction::Direction,
    error::{MigrateError, Result},
    source::{Directory, MigrationSource},
    validator::is_permitted,
    version::{VersionLedger, NO_VERSION},
};

/// What a call to [`Migrator::migrate_to`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub from: i32,
    pub to: i32,
    /// `None` when the ledger was already at the target version.
    pub direction: Option<Direction>,
    /// Versions whose migration file was applied, in application order.
    pub steps: Vec<i32>,
}

/// Moves a ledger's schema between versions, one step at a time.
#[derive(Clone)]
pub struct Migrator {
    store: Store,
    versions: VersionLedger,
    source: Box<dyn MigrationSource>,
    config: MigratorConfig,
}

impl Migrator {
    pub fn new(store: &Store, config: MigratorConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            store: store.clone(),
            versions: VersionLedger::new(store),
            source: Box::new(Directory::new(config.path.to_owned())),
            config,
        })
    }

    /// Replaces the on-disk migration directory with another source.
    pub fn source<S: MigrationSource + 'static>(mut self, source: S) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn versions(&self) -> &VersionLedger {
        &self.versions
    }

    pub async fn migrate_to(&self, target: i32) -> Result<Report> {
        if target < NO_VERSION {
            return Err(MigrateError::InvalidTarget(target));
        }

        let records = self.versions.list_versions().await?;
        let current = VersionLedger::current_version(&records);

        let Some(direction) = Direction::resolve(current.version, target) else {
            tracing::info!("ledger is already at version {target}");

            return Ok(Report {
                from: current.version,
                to: target,
                direction: None,
                steps: vec![],
            });
        };

        tracing::info!("migrations from {} to {target}", current.version);

        let steps = match direction {
            Direction::Up => self.up(current.version, target).await?,
            Direction::Down => self.down(current.version, target).await?,
        };

        Ok(Report {
            from: current.version,
            to: target,
            direction: Some(direction),
            steps,
        })
    }

    /// Applies `up/{v}` for every `v` in `current + 1..=target`.
    ///
    /// A step commits all of its statements or none of them. The first
    /// failure stops the run; steps recorded before it stay applied.
    pub async fn up(&self, current: i32, target: i32) -> Result<Vec<i32>> {
        let mut steps = Vec::new();

        for version in current + 1..=target {
            let statements = self.load_validated(Direction::Up, version).await?;
            let created = created_tables(&statements);

            self.store
                .execute(Transaction::new(statements))
                .await
                .map_err(|source| {
                    tracing::error!(version, error = %source, "up migration failed");
                    MigrateError::Execution { version, source }
                })?;

            // The step is committed, so it is recorded even when its tables
            // never showed up; a retry then starts from the next step.
            let ready = self
                .config
                .propagation
                .wait(&self.store, version, &created)
                .await;
            self.versions.record_version(version).await?;
            ready?;

            tracing::info!("migration {version}-{} executed", Direction::Up);
            steps.push(version);
        }

        Ok(steps)
    }

    /// Applies `down/{v}` for every `v` from `current` down to `target + 1`,
    /// recording `v - 1` after each step.
    ///
    /// With [`DownPolicy::BestEffort`] statements are not validated and a
    /// failing statement is logged without stopping the step or the run.
    pub async fn down(&self, current: i32, target: i32) -> Result<Vec<i32>> {
        let mut steps = Vec::new();

        for version in (target + 1..=current).rev() {
            let statements = match self.config.down_policy {
                DownPolicy::Strict => self.load_validated(Direction::Down, version).await?,
                DownPolicy::BestEffort => self
                    .source
                    .load(Direction::Down, version)
                    .await?
                    .into_iter()
                    .map(Statement::Sql)
                    .collect(),
            };
            let created = created_tables(&statements);

            match self.config.down_policy {
                DownPolicy::Strict => {
                    self.store
                        .execute(Transaction::new(statements))
                        .await
                        .map_err(|source| MigrateError::Execution { version, source })?;
                }
                DownPolicy::BestEffort => {
                    self.execute_best_effort(version, statements).await;
                }
            }

            // Recorded even when not ready, as on the way up.
            let ready = self
                .config
                .propagation
                .wait(&self.store, version, &created)
                .await;
            self.versions.record_version(version - 1).await?;
            ready?;

            tracing::info!("migration {version}-{} executed", Direction::Down);
            steps.push(version);
        }

        Ok(steps)
    }

    async fn execute_best_effort(&self, version: i32, statements: Vec<Statement>) {
        let transaction = Transaction::new(statements.clone()).on_error(OnError::Continue);

        let outcomes = match self.store.execute(transaction).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                tracing::error!(version, error = %e, "down migration failed");
                return;
            }
        };

        for (statement, outcome) in statements.iter().zip(outcomes) {
            if let Outcome::Failed(reason) = outcome {
                tracing::error!(version, %statement, reason = %reason, "down statement failed");
            }
        }
    }

    async fn load_validated(&self, direction: Direction, version: i32) -> Result<Vec<Statement>> {
        let lines = self.source.load(direction, version).await?;
        let mut statements = Vec::with_capacity(lines.len());

        for (pos, line) in lines.into_iter().enumerate() {
            tracing::debug!(version, sql = %line, "{direction} statement");

            if !is_permitted(&line) {
                tracing::error!(version, sql = %line, "invalid sql");

                return Err(MigrateError::Validation {
                    direction,
                    version,
                    position: pos + 1,
                    statement: line,
                });
            }

            statements.push(Statement::Sql(line));
        }

        Ok(statements)
    }
}

fn created_tables(statements: &[Statement]) -> Vec<String> {
    statements
        .iter()
        .filter_map(Statement::created_table)
        .map(ToOwned::to_owned)
        .collect()
}
