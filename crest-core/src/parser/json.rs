//! JSON bodies

use super::{pad_rows, parse_error, ParsedRow, ResponseFormat};
use crate::error::EngineError;
use serde_json::{Map, Value};

/// Column holding the key of each entry of a dict-of-objects body
pub const PARENT_KEY_COLUMN: &str = "json_parent_key";

pub(crate) fn parse_rows(body: &str, json_path: Option<&str>) -> Result<Vec<ParsedRow>, EngineError> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| parse_error(ResponseFormat::Json, e.to_string(), body))?;

    let located = match json_path {
        Some(path) => locate(&document, path)?,
        None => &document,
    };

    Ok(pad_rows(rows_from_value(located)))
}

/// Follow a dot-separated path; numeric segments also index arrays
pub(crate) fn locate<'a>(document: &'a Value, path: &str) -> Result<&'a Value, EngineError> {
    let mut current = document;

    for segment in path.split('.') {
        let path_error = |reason: &str| EngineError::JsonPath {
            path: path.to_string(),
            segment: segment.to_string(),
            reason: reason.to_string(),
        };

        current = match current {
            Value::Object(map) => map.get(segment).ok_or_else(|| path_error("was not found"))?,
            Value::Array(items) => {
                let index: usize = segment
                    .parse()
                    .map_err(|_| path_error("is not an array index"))?;
                items
                    .get(index)
                    .ok_or_else(|| path_error("is out of bounds"))?
            }
            _ => return Err(path_error("cannot be applied to a scalar value")),
        };
    }

    Ok(current)
}

fn rows_from_value(value: &Value) -> Vec<ParsedRow> {
    match value {
        Value::Array(items) => items.iter().map(row_from_item).collect(),
        Value::Object(map) if map.is_empty() => Vec::new(),
        Value::Object(map) if map.values().all(Value::is_object) => map
            .iter()
            .map(|(key, entry)| {
                let mut row = ParsedRow::new();
                row.insert(PARENT_KEY_COLUMN.to_string(), Value::String(key.clone()));
                if let Value::Object(fields) = entry {
                    flatten_into(&mut row, None, fields);
                }
                row
            })
            .collect(),
        Value::Object(map) => {
            let mut row = ParsedRow::new();
            flatten_into(&mut row, None, map);
            vec![row]
        }
        _ => Vec::new(),
    }
}

fn row_from_item(item: &Value) -> ParsedRow {
    let mut row = ParsedRow::new();
    match item {
        Value::Object(fields) => flatten_into(&mut row, None, fields),
        other => {
            row.insert("value".to_string(), cell(other));
        }
    }
    row
}

/// Nested objects become `parent.child` columns
fn flatten_into(row: &mut ParsedRow, prefix: Option<&str>, fields: &Map<String, Value>) {
    for (key, value) in fields {
        let column = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };

        match value {
            Value::Object(nested) if !nested.is_empty() => flatten_into(row, Some(&column), nested),
            other => {
                row.insert(column, cell(other));
            }
        }
    }
}

/// Scalars pass through; arrays and empty objects become compact JSON text
fn cell(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        scalar => scalar.clone(),
    }
}
