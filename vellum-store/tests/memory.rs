#![allow(clippy::needless_return)]
mod store;

use vellum_store::{LedgerConfig, Memory, Statement, Store, StoreError};

async fn get_store() -> Store {
    let store = Memory::new(&LedgerConfig::new("vellum-test"))
        .unwrap()
        .store();
    store::init(&store).await.unwrap();
    store
}

#[tokio_shared_rt::test]
async fn select() {
    let store = get_store().await;
    store::test_select(&store).await.unwrap();
}

#[tokio_shared_rt::test]
async fn abort() {
    let store = get_store().await;
    store::test_abort(&store).await.unwrap();
}

#[tokio_shared_rt::test]
async fn continue_on_error() {
    let store = get_store().await;
    store::test_continue(&store).await.unwrap();
}

#[tokio_shared_rt::test]
async fn history() {
    let store = get_store().await;
    store::test_history(&store).await.unwrap();
}

#[tokio_shared_rt::test]
async fn redact() {
    let store = get_store().await;
    store::test_redact(&store).await.unwrap();
}

#[tokio_shared_rt::test]
async fn invalid_identifier() {
    let store = get_store().await;
    store::test_invalid_identifier(&store).await.unwrap();
}

#[tokio_shared_rt::test]
async fn concurrency() {
    let store = get_store().await;
    store::test_concurrency(&store).await.unwrap();
}

#[tokio::test]
async fn propagation_lag() {
    let memory = Memory::new(&LedgerConfig::new("lag"))
        .unwrap()
        .with_propagation_lag(2);
    let store = memory.store();

    store.run(Statement::sql("CREATE TABLE Person")).await.unwrap();

    assert!(store.table_names().await.unwrap().is_empty());
    assert!(store.table_names().await.unwrap().is_empty());
    assert_eq!(store.table_names().await.unwrap(), vec!["Person".to_owned()]);
}

#[tokio::test]
async fn drop_and_recreate() {
    let store = get_store().await;

    store.run(Statement::sql("DROP TABLE Person;")).await.unwrap();
    assert!(store.table_names().await.unwrap().is_empty());

    let err = store.select::<serde_json::Value>("Person").await.unwrap_err();
    assert!(err.to_string().contains("dropped"));

    store.run(Statement::sql("create table Person")).await.unwrap();
    assert_eq!(store.table_names().await.unwrap(), vec!["Person".to_owned()]);
}

#[tokio::test]
async fn unsupported_statement() {
    let store = get_store().await;

    let err = store
        .run(Statement::sql("SELECT * FROM Person"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("unsupported statement"));
}

#[tokio::test]
async fn raw_insert() {
    let store = get_store().await;

    let rows = store
        .run(Statement::sql(
            "INSERT INTO Person << {'first_name': 'John', 'last_name': 'Doe', 'gov_id': 'A1'}, {'first_name': 'Jane', 'last_name': 'Doe', 'gov_id': 'A2'} >>",
        ))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.get("documentId").is_some()));

    store
        .run(Statement::sql(
            r#"insert into Person value {"first_name": "Ann", "last_name": "Lee", "gov_id": "A3"};"#,
        ))
        .await
        .unwrap();

    let people = store.select::<store::Person>("Person").await.unwrap();
    assert_eq!(
        people.iter().map(|p| p.first_name.as_str()).collect::<Vec<_>>(),
        vec!["John", "Jane", "Ann"]
    );

    for sql in [
        "INSERT INTO Person",
        "INSERT INTO Person << 1, 2 >>",
        "INSERT INTO Person << >>",
        "INSERT INTO Missing VALUE {'a': 1}",
        "INSERT INTO `Person` VALUE {'a': 1}",
    ] {
        assert!(store.run(Statement::sql(sql)).await.is_err(), "{sql}");
    }
}

#[tokio::test]
async fn writes() {
    let memory = Memory::new(&LedgerConfig::new("writes")).unwrap();
    let store = memory.store();

    store::init(&store).await.unwrap();
    store.select::<serde_json::Value>("Person").await.unwrap();

    assert_eq!(memory.writes(), 2);
}

#[tokio::test]
async fn shutdown() {
    let store = get_store().await;

    store.shutdown().await;

    let err = store.select::<serde_json::Value>("Person").await.unwrap_err();
    assert!(matches!(err, StoreError::Closed));
}

#[test]
fn ledger_config() {
    assert!(LedgerConfig::new("vellum-ledger_1").validate().is_ok());
    assert!(matches!(
        LedgerConfig::new("").validate(),
        Err(StoreError::Config(_))
    ));
    assert!(matches!(
        Memory::new(&LedgerConfig::new("bad name")),
        Err(StoreError::Config(_))
    ));

    let config: LedgerConfig = serde_json::from_str(r#"{ "ledger": "from-json" }"#).unwrap();
    assert_eq!(config, LedgerConfig::new("from-json"));
}
