use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use vellum_store::{OnError, Outcome, Revision, Statement, Store, StoreError, Transaction};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub gov_id: String,
}

pub fn john() -> Person {
    Person {
        first_name: "John".to_owned(),
        last_name: "Doe".to_owned(),
        gov_id: "LEWISR261LL".to_owned(),
    }
}

pub async fn init(store: &Store) -> anyhow::Result<()> {
    store
        .execute(Transaction::new(vec![
            Statement::sql("CREATE TABLE Person"),
            Statement::sql("CREATE INDEX ON Person (gov_id)"),
        ]))
        .await?;

    Ok(())
}

pub async fn test_select(store: &Store) -> anyhow::Result<()> {
    let id = store.insert("Person", &john()).await?;

    assert!(!id.is_empty());

    let people = store.select::<Person>("Person").await?;

    assert_eq!(people, vec![john()]);

    Ok(())
}

pub async fn test_abort(store: &Store) -> anyhow::Result<()> {
    let err = store
        .execute(Transaction::new(vec![
            Statement::sql("CREATE TABLE Vehicle"),
            Statement::Insert {
                table: "Missing".to_owned(),
                document: json!({ "vin": "1N4AL11D75C109151" }),
            },
        ]))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Execution { .. }));
    assert!(!store.table_names().await?.contains(&"Vehicle".to_owned()));

    Ok(())
}

pub async fn test_continue(store: &Store) -> anyhow::Result<()> {
    let outcomes = store
        .execute(
            Transaction::new(vec![
                Statement::sql("DROP TABLE Missing"),
                Statement::sql("CREATE TABLE Vehicle"),
            ])
            .on_error(OnError::Continue),
        )
        .await?;

    assert!(matches!(outcomes[0], Outcome::Failed(_)));
    assert!(matches!(outcomes[1], Outcome::Rows(_)));
    assert!(store.table_names().await?.contains(&"Vehicle".to_owned()));

    Ok(())
}

pub async fn test_history(store: &Store) -> anyhow::Result<()> {
    let id = store.insert("Person", &john()).await?;

    store
        .update(
            "Person",
            &id,
            &Person {
                last_name: "Dupont".to_owned(),
                ..john()
            },
        )
        .await?;

    let rows = store
        .run(Statement::History {
            table: "Person".to_owned(),
            document_id: Some(id.to_owned()),
            version: None,
        })
        .await?;

    let revisions = rows
        .into_iter()
        .map(serde_json::from_value::<Revision>)
        .collect::<Result<Vec<_>, _>>()?;

    assert_eq!(revisions.len(), 2);
    assert_eq!(revisions[0].metadata.version, 0);
    assert_eq!(revisions[1].metadata.version, 1);
    assert_eq!(revisions[0].to_data::<Person>()?, Some(john()));
    assert_ne!(revisions[0].hash, revisions[1].hash);

    let people = store.select::<Person>("Person").await?;

    assert_eq!(people.len(), 1);
    assert_eq!(people[0].last_name, "Dupont");

    Ok(())
}

pub async fn test_redact(store: &Store) -> anyhow::Result<()> {
    let id = store.insert("Person", &john()).await?;

    let err = store.redact("Person", &id, 0).await.unwrap_err();

    assert!(err.to_string().contains("latest"));

    store
        .update(
            "Person",
            &id,
            &Person {
                gov_id: "REDACTED".to_owned(),
                ..john()
            },
        )
        .await?;
    store.redact("Person", &id, 0).await?;

    let rows = store
        .run(Statement::CountDataHashes {
            table: "Person".to_owned(),
        })
        .await?;

    assert_eq!(rows, vec![json!({ "countHashes": 1 })]);

    let rows = store
        .run(Statement::History {
            table: "Person".to_owned(),
            document_id: Some(id.to_owned()),
            version: Some(0),
        })
        .await?;
    let revision: Revision = serde_json::from_value(rows[0].clone())?;

    assert!(revision.is_redacted());
    assert_eq!(revision.data, None);

    Ok(())
}

pub async fn test_invalid_identifier(store: &Store) -> anyhow::Result<()> {
    let err = store
        .run(Statement::CountDataHashes {
            table: "Person) WHERE 1=1 --".to_owned(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::InvalidIdentifier(_)));

    Ok(())
}

pub async fn test_concurrency(store: &Store) -> anyhow::Result<()> {
    let results = join_all(vec![
        store.insert("Person", &john()),
        store.insert("Person", &john()),
        store.insert("Person", &john()),
    ])
    .await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(store.select::<Person>("Person").await?.len(), 3);

    Ok(())
}
