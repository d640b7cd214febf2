#![allow(dead_code)]

use std::time::Duration;
use vellum::{ConfigBuilder, DownPolicy, Migrator, MigratorConfig};
use vellum_store::{LedgerConfig, Memory, Store};

pub const FIXTURES: &str = "./tests/fixtures/migrations";
pub const DELAY: Duration = Duration::from_millis(5);

pub fn config() -> MigratorConfig {
    ConfigBuilder::new(FIXTURES)
        .delay(DELAY)
        .poll(Duration::from_millis(1), 5)
        .build()
}

pub fn strict_config() -> MigratorConfig {
    ConfigBuilder::new(FIXTURES)
        .delay(DELAY)
        .poll(Duration::from_millis(1), 5)
        .down_policy(DownPolicy::Strict)
        .build()
}

pub fn create_memory(name: &str) -> Memory {
    Memory::new(&LedgerConfig::new(name)).unwrap()
}

pub fn create_migrator(store: &Store) -> Migrator {
    Migrator::new(store, config()).unwrap()
}

pub async fn versions(migrator: &Migrator) -> Vec<i32> {
    migrator
        .versions()
        .list_versions()
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.version)
        .collect()
}

pub async fn tables(store: &Store) -> Vec<String> {
    let mut names = store.table_names().await.unwrap();
    names.sort();
    names
}
