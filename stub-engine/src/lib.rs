//! # Stub Engine
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide an in-process
//! [`Transport`] implementation for integration testing the client and the fixture
//! conversion tooling. It answers a handful of schema and search commands from an
//! in-memory table store and wraps every result in the legacy positional envelope.
//! It is not intended for production use.
use grnc_core::params::{FlatParams, ParamValue};
use grnc_core::transport::{BoxError, Transport};
use serde_json::{Value, json};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
struct Table {
    key_type: Option<String>,
    columns: Vec<String>,
    rows: Vec<serde_json::Map<String, Value>>,
}

/// An in-memory engine stub.
///
/// Every call is recorded, so tests can assert on the exact wire mapping the client
/// produced.
#[derive(Debug, Clone, Default)]
pub struct StubEngine {
    tables: HashMap<String, Table>,
    calls: Vec<(String, Vec<(String, String)>)>,
}

impl StubEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `(command, params)` pairs received so far, params rendered as wire tokens.
    pub fn calls(&self) -> &[(String, Vec<(String, String)>)] {
        &self.calls
    }

    pub fn last_call(&self) -> Option<&(String, Vec<(String, String)>)> {
        self.calls.last()
    }

    fn handle(&mut self, command: &str, params: &FlatParams) -> Result<Value, BoxError> {
        let body = match command {
            "status" => json!({
                "alloc_count": 0,
                "version": "14.0.0",
                "n_queries": self.calls.len(),
            }),
            "table_create" => {
                let name = require(params, "name")?;
                self.tables.insert(
                    name.clone(),
                    Table {
                        key_type: params.get("key_type").map(ParamValue::to_wire_string),
                        ..Table::default()
                    },
                );
                Value::Bool(true)
            }
            "column_create" => {
                let table = require(params, "table")?;
                let name = require(params, "name")?;
                let table = self
                    .tables
                    .get_mut(&table)
                    .ok_or_else(|| format!("no such table: {table}"))?;
                table.columns.push(name);
                Value::Bool(true)
            }
            "load" => {
                let table = require(params, "table")?;
                let values = require(params, "values")?;
                let rows: Vec<serde_json::Map<String, Value>> = serde_json::from_str(&values)?;
                let table = self
                    .tables
                    .get_mut(&table)
                    .ok_or_else(|| format!("no such table: {table}"))?;
                let loaded = rows.len();
                table.rows.extend(rows);
                Value::Number(loaded.into())
            }
            "select" => {
                let name = require(params, "table")?;
                let table = self
                    .tables
                    .get(&name)
                    .ok_or_else(|| format!("no such table: {name}"))?;
                select_body(table)
            }
            other => return Err(format!("stub engine does not implement '{other}'").into()),
        };
        Ok(json!([[0, 0.0, 0.0], body]))
    }
}

impl Transport for StubEngine {
    async fn execute(&mut self, command: &str, params: &FlatParams) -> Result<Value, BoxError> {
        self.calls.push((
            command.to_string(),
            params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_wire_string()))
                .collect(),
        ));
        self.handle(command, params)
    }
}

fn require(params: &FlatParams, key: &str) -> Result<String, BoxError> {
    params
        .get(key)
        .map(ParamValue::to_wire_string)
        .ok_or_else(|| format!("missing required parameter: {key}").into())
}

// Renders rows in the engine's select shape: [[[n_hits], [[col, type], ...], rows...]].
fn select_body(table: &Table) -> Value {
    let mut columns = vec!["_id".to_string()];
    if table.key_type.is_some() {
        columns.push("_key".to_string());
    }
    columns.extend(table.columns.iter().cloned());

    let header: Vec<Value> = columns
        .iter()
        .map(|name| json!([name, column_type(name)]))
        .collect();

    let rows: Vec<Value> = table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let mut out = vec![json!(index as u64 + 1)];
            for column in &columns[1..] {
                out.push(row.get(column).cloned().unwrap_or(Value::Null));
            }
            Value::Array(out)
        })
        .collect();

    let mut result = vec![json!([table.rows.len()]), Value::Array(header)];
    result.extend(rows);
    json!([result])
}

fn column_type(name: &str) -> &'static str {
    match name {
        "_id" => "UInt32",
        _ => "ShortText",
    }
}
