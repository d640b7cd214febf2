use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};
use uuid::Uuid;

use crate::{
    config::LedgerConfig,
    engine::{Engine, OnError, Outcome, Transaction},
    error::{Result, StoreError},
    revision::Revision,
    statement::{is_identifier, Statement},
    store::Store,
};

type Applied = std::result::Result<Vec<Value>, String>;

/// Ledger engine keeping every table and its full revision history in memory.
///
/// Each transaction runs against a staged copy of the ledger which replaces
/// the live one only when the transaction commits.
#[derive(Debug, Clone)]
pub struct Memory {
    name: String,
    state: Arc<RwLock<Ledger>>,
    writes: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
    propagation_lag: u32,
}

impl Memory {
    pub fn new(config: &LedgerConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            name: config.ledger.to_owned(),
            state: Arc::default(),
            writes: Arc::default(),
            closed: Arc::default(),
            propagation_lag: 0,
        })
    }

    /// Keeps a newly created table out of [`Engine::table_names`] for the
    /// given number of calls.
    pub fn with_propagation_lag(mut self, polls: u32) -> Self {
        self.propagation_lag = polls;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of mutating statements handed to this engine, committed or not.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn store(&self) -> Store {
        Store::new(self.clone())
    }
}

#[async_trait]
impl Engine for Memory {
    async fn execute(&self, transaction: Transaction) -> Result<Vec<Outcome>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }

        let mut ledger = self.state.write();
        let mut staged = ledger.clone();
        let mut outcomes = Vec::with_capacity(transaction.statements.len());

        for statement in transaction.statements.iter() {
            if !statement.is_read() {
                self.writes.fetch_add(1, Ordering::SeqCst);
            }

            match staged.apply(statement, self.propagation_lag) {
                Ok(rows) => outcomes.push(Outcome::Rows(rows)),
                Err(reason) => match transaction.on_error {
                    OnError::Abort => return Err(StoreError::execution(statement, reason)),
                    OnError::Continue => outcomes.push(Outcome::Failed(reason)),
                },
            }
        }

        *ledger = staged;

        Ok(outcomes)
    }

    async fn table_names(&self) -> Result<Vec<String>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }

        let mut ledger = self.state.write();
        let mut names = Vec::new();

        for (name, table) in ledger.tables.iter_mut() {
            if !table.active {
                continue;
            }

            if table.hidden_polls > 0 {
                table.hidden_polls -= 1;
                continue;
            }

            names.push(name.to_owned());
        }

        Ok(names)
    }

    async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Default)]
struct Ledger {
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Clone, Default)]
struct Table {
    active: bool,
    hidden_polls: u32,
    indexes: Vec<String>,
    revisions: Vec<Revision>,
}

impl Table {
    fn latest(&self, document_id: &str) -> Option<&Revision> {
        self.revisions
            .iter()
            .rev()
            .find(|r| r.metadata.id == document_id)
    }

    fn current(&self) -> Vec<Value> {
        let mut ids: Vec<&str> = Vec::new();

        for revision in self.revisions.iter() {
            if !ids.contains(&revision.metadata.id.as_str()) {
                ids.push(&revision.metadata.id);
            }
        }

        ids.into_iter()
            .filter_map(|id| self.latest(id).and_then(|r| r.data.clone()))
            .collect()
    }
}

impl Ledger {
    fn apply(&mut self, statement: &Statement, propagation_lag: u32) -> Applied {
        match statement {
            Statement::Sql(text) => self.apply_sql(parse_sql(text)?, propagation_lag),
            Statement::Insert { table, document } => {
                let id = self.insert(table, document.clone())?;

                Ok(vec![json!({ "documentId": id })])
            }
            Statement::Update {
                table,
                document_id,
                document,
            } => {
                let table = self.active_mut(table)?;
                let version = match table.latest(document_id) {
                    Some(revision) => revision.metadata.version + 1,
                    None => return Err(format!("document {document_id} not found")),
                };

                table.revisions.push(Revision::new(
                    document_id.to_owned(),
                    version,
                    document.clone(),
                ));

                Ok(vec![json!({ "documentId": document_id })])
            }
            Statement::Redact {
                table,
                document_id,
                version,
            } => {
                let table = self.existing_mut(table)?;
                let latest = table
                    .latest(document_id)
                    .map(|r| r.metadata.version)
                    .ok_or_else(|| format!("document {document_id} not found"))?;

                if latest == *version {
                    return Err(format!(
                        "revision {version} of {document_id} is the latest and cannot be redacted"
                    ));
                }

                let revision = table
                    .revisions
                    .iter_mut()
                    .find(|r| r.metadata.id == *document_id && r.metadata.version == *version)
                    .ok_or_else(|| format!("revision {version} of {document_id} not found"))?;

                if revision.is_redacted() {
                    return Err(format!(
                        "revision {version} of {document_id} is already redacted"
                    ));
                }

                revision.redact();

                Ok(vec![json!({ "documentId": document_id, "version": version })])
            }
            Statement::Select { table } => Ok(self.active(table)?.current()),
            Statement::History {
                table,
                document_id,
                version,
            } => {
                let table = self.existing(table)?;
                let mut rows = Vec::new();

                for revision in table.revisions.iter() {
                    if document_id
                        .as_ref()
                        .is_some_and(|id| *id != revision.metadata.id)
                    {
                        continue;
                    }

                    if version.is_some_and(|v| v != revision.metadata.version) {
                        continue;
                    }

                    rows.push(serde_json::to_value(revision).map_err(|e| e.to_string())?);
                }

                Ok(rows)
            }
            Statement::CountDataHashes { table } => {
                let count = self
                    .existing(table)?
                    .revisions
                    .iter()
                    .filter(|r| r.is_redacted())
                    .count();

                Ok(vec![json!({ "countHashes": count })])
            }
        }
    }

    fn insert(&mut self, name: &str, document: Value) -> std::result::Result<String, String> {
        let table = self.active_mut(name)?;
        let id = Uuid::new_v4().simple().to_string();

        table
            .revisions
            .push(Revision::new(id.to_owned(), 0, document));

        Ok(id)
    }

    fn apply_sql(&mut self, command: Command<'_>, propagation_lag: u32) -> Applied {
        match command {
            Command::Insert { table, documents } => {
                let mut rows = Vec::with_capacity(documents.len());

                for document in documents {
                    let id = self.insert(table, document)?;
                    rows.push(json!({ "documentId": id }));
                }

                Ok(rows)
            }
            Command::CreateTable(name) => {
                let table = self.tables.entry(name.to_owned()).or_default();

                if table.active {
                    return Err(format!("table {name} already exists"));
                }

                table.active = true;
                table.hidden_polls = propagation_lag;
                table.indexes.clear();

                Ok(vec![json!({ "tableName": name })])
            }
            Command::DropTable(name) => {
                self.active_mut(name)?.active = false;

                Ok(vec![json!({ "tableName": name })])
            }
            Command::UndropTable(name) => {
                let table = self.existing_mut(name)?;

                if table.active {
                    return Err(format!("table {name} is not dropped"));
                }

                table.active = true;

                Ok(vec![json!({ "tableName": name })])
            }
            Command::CreateIndex { table: name, field } => {
                let table = self.active_mut(name)?;

                if table.indexes.iter().any(|i| i == field) {
                    return Err(format!("index on {name} ({field}) already exists"));
                }

                table.indexes.push(field.to_owned());

                Ok(vec![json!({ "tableName": name, "field": field })])
            }
            Command::DropIndex { table: name, field } => {
                let table = self.active_mut(name)?;
                let len = table.indexes.len();

                table.indexes.retain(|i| i != field);

                if table.indexes.len() == len {
                    return Err(format!("index on {name} ({field}) not found"));
                }

                Ok(vec![json!({ "tableName": name, "field": field })])
            }
        }
    }

    fn existing(&self, name: &str) -> std::result::Result<&Table, String> {
        self.tables
            .get(name)
            .ok_or_else(|| format!("table {name} not found"))
    }

    fn existing_mut(&mut self, name: &str) -> std::result::Result<&mut Table, String> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| format!("table {name} not found"))
    }

    fn active(&self, name: &str) -> std::result::Result<&Table, String> {
        match self.existing(name)? {
            table if table.active => Ok(table),
            _ => Err(format!("table {name} is dropped")),
        }
    }

    fn active_mut(&mut self, name: &str) -> std::result::Result<&mut Table, String> {
        match self.existing_mut(name)? {
            table if table.active => Ok(table),
            _ => Err(format!("table {name} is dropped")),
        }
    }
}

/// Raw statements the in-memory ledger understands.
#[derive(Debug, PartialEq)]
enum Command<'a> {
    CreateTable(&'a str),
    DropTable(&'a str),
    UndropTable(&'a str),
    CreateIndex { table: &'a str, field: &'a str },
    DropIndex { table: &'a str, field: &'a str },
    Insert { table: &'a str, documents: Vec<Value> },
}

fn parse_sql(text: &str) -> std::result::Result<Command<'_>, String> {
    let text = text.trim().trim_end_matches(';').trim_end();
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let keyword = |pos: usize, expected: &str| {
        tokens
            .get(pos)
            .is_some_and(|t| t.eq_ignore_ascii_case(expected))
    };

    let command = if keyword(0, "insert") && keyword(1, "into") {
        parse_insert(text)?
    } else if tokens.len() == 3 && keyword(1, "table") {
        let name = tokens[2];

        if keyword(0, "create") {
            Command::CreateTable(name)
        } else if keyword(0, "drop") {
            Command::DropTable(name)
        } else if keyword(0, "undrop") {
            Command::UndropTable(name)
        } else {
            return Err(format!("unsupported statement `{text}`"));
        }
    } else if keyword(0, "create") && keyword(1, "index") && keyword(2, "on") {
        let (head, field) = text
            .split_once('(')
            .ok_or_else(|| format!("missing indexed field in `{text}`"))?;
        let table = head.split_whitespace().nth(3).unwrap_or_default();
        let field = field.trim_end_matches(')').trim();

        Command::CreateIndex { table, field }
    } else if tokens.len() == 5 && keyword(0, "drop") && keyword(1, "index") && keyword(3, "on") {
        Command::DropIndex {
            table: tokens[4],
            field: tokens[2].trim_matches('"'),
        }
    } else {
        return Err(format!("unsupported statement `{text}`"));
    };

    let names = match &command {
        Command::CreateTable(name) | Command::DropTable(name) | Command::UndropTable(name) => {
            vec![*name]
        }
        Command::CreateIndex { table, field } | Command::DropIndex { table, field } => {
            vec![*table, *field]
        }
        Command::Insert { table, .. } => vec![*table],
    };

    match names.into_iter().find(|name| !is_identifier(name)) {
        Some(name) => Err(format!("invalid identifier `{name}`")),
        None => Ok(command),
    }
}

/// `INSERT INTO t VALUE {...}` or `INSERT INTO t << {...}, {...} >>`.
fn parse_insert(text: &str) -> std::result::Result<Command<'_>, String> {
    let mut rest = text;
    let mut words = [""; 3];

    for word in words.iter_mut() {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        *word = &rest[..end];
        rest = &rest[end..];
    }

    let table = words[2];
    let rest = rest.trim();

    let documents = if let Some(bag) = rest
        .strip_prefix("<<")
        .and_then(|bag| bag.strip_suffix(">>"))
    {
        match parse_document(&format!("[{bag}]"))? {
            Value::Array(documents) => documents,
            _ => return Err(format!("invalid documents in `{text}`")),
        }
    } else if rest
        .get(..5)
        .is_some_and(|keyword| keyword.eq_ignore_ascii_case("value"))
    {
        vec![parse_document(&rest[5..])?]
    } else {
        return Err(format!("missing documents in `{text}`"));
    };

    if documents.is_empty() || !documents.iter().all(Value::is_object) {
        return Err(format!("invalid documents in `{text}`"));
    }

    Ok(Command::Insert { table, documents })
}

/// JSON, or PartiQL literals written with single quotes.
fn parse_document(text: &str) -> std::result::Result<Value, String> {
    serde_json::from_str(text)
        .or_else(|_| serde_json::from_str(&text.replace('\'', "\"")))
        .map_err(|e| format!("invalid document `{}`: {e}", text.trim()))
}
