pub mod cluster;
pub mod distributed;
pub mod error;
pub mod ingest;
pub mod merge;
pub mod query;

use std::collections::BTreeMap;

pub use cluster::{RandomSelector, Shard, ShardCursor, ShardSelector};
pub use distributed::{Coordinator, ShardStatus};
pub use error::{ScatterError, ScatterResult};
pub use merge::ResultWindow;
pub use query::{Filter, Order, Projection};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Int(i32),
    Int64(i64),
    Text(String),
    Bool(bool),
    Absent,
}

static ABSENT: Value = Value::Absent;

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Int64(_) => "int64",
            Value::Text(_) => "text",
            Value::Bool(_) => "bool",
            Value::Absent => "absent",
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    // Total order used by field-based comparators. Absent sorts after every
    // present value; Int and Int64 compare numerically; remaining mixed-kind
    // pairs fall back to the kind rank so the order stays total.
    pub fn sort_cmp(&self, other: &Value) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Value::Absent, Value::Absent) => Ordering::Equal,
            (Value::Absent, _) => Ordering::Greater,
            (_, Value::Absent) => Ordering::Less,
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Int(a), Value::Int64(b)) => i64::from(*a).cmp(b),
            (Value::Int64(a), Value::Int(b)) => a.cmp(&i64::from(*b)),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Int(_) | Value::Int64(_) => 0,
            Value::Text(_) => 1,
            Value::Bool(_) => 2,
            Value::Absent => 3,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&ABSENT)
    }

    pub fn int(&self, name: &str) -> ScatterResult<i32> {
        match self.get(name) {
            Value::Int(v) => Ok(*v),
            other => Err(self.mismatch(name, "int", other)),
        }
    }

    pub fn int64(&self, name: &str) -> ScatterResult<i64> {
        match self.get(name) {
            Value::Int64(v) => Ok(*v),
            other => Err(self.mismatch(name, "int64", other)),
        }
    }

    pub fn text(&self, name: &str) -> ScatterResult<&str> {
        match self.get(name) {
            Value::Text(v) => Ok(v.as_str()),
            other => Err(self.mismatch(name, "text", other)),
        }
    }

    pub fn boolean(&self, name: &str) -> ScatterResult<bool> {
        match self.get(name) {
            Value::Bool(v) => Ok(*v),
            other => Err(self.mismatch(name, "bool", other)),
        }
    }

    fn mismatch(&self, field: &str, expected: &'static str, actual: &Value) -> ScatterError {
        ScatterError::TypeMismatch {
            field: field.to_string(),
            expected,
            actual: actual.kind(),
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub shard_count: usize,
    pub replication_factor: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            shard_count: 4,
            replication_factor: 2,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(shard_count_str) = std::env::var("SHARD_COUNT") {
            if let Ok(shard_count) = shard_count_str.parse() {
                config.shard_count = shard_count;
            }
        }

        if let Ok(repl_factor_str) = std::env::var("REPLICATION_FACTOR") {
            if let Ok(repl_factor) = repl_factor_str.parse() {
                config.replication_factor = repl_factor;
            }
        }

        config
    }
}
