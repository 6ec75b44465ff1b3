//! Input and output record types

use crate::error::EngineError;
use serde::Serialize;
use serde_json::{Map, Value};

/// One upstream record: field name to string value, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRecord {
    fields: Map<String, Value>,
}

impl InputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON object; non-string values keep their JSON text
    pub fn from_json(value: Value) -> Result<Self, EngineError> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(EngineError::Input(format!(
                "input records must be JSON objects, got {}",
                json_type(&other)
            ))),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), Value::String(value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter_map(|(name, value)| value.as_str().map(|v| (name.as_str(), v)))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for InputRecord {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let fields = iter
            .into_iter()
            .map(|(name, value)| {
                let text = match value {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (name.into(), Value::String(text))
            })
            .collect();
        Self { fields }
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for InputRecord {
    fn from(pairs: Vec<(K, V)>) -> Self {
        let mut record = InputRecord::new();
        for (name, value) in pairs {
            record.insert(name, value);
        }
        record
    }
}

/// One output record: column name to scalar value, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OutputRecord {
    columns: Map<String, Value>,
}

impl OutputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a record from the fields of the input it enriches
    pub fn from_input(input: Option<&InputRecord>) -> Self {
        let mut record = Self::new();
        if let Some(input) = input {
            for (name, value) in input.iter() {
                record.insert(name, value);
            }
        }
        record
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.insert(column.into(), value.into());
    }

    /// Merge columns, later values replacing earlier ones of the same name
    pub fn extend(&mut self, columns: Map<String, Value>) {
        for (column, value) in columns {
            self.columns.insert(column, value);
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.columns
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
