use serde_json::{Map, Value};

use mocksmith_generate::Dataset;

use crate::errors::FormatError;
use crate::options::FormatOptions;

/// Row-major JSON array of objects.
pub fn render_json(dataset: &Dataset, options: &FormatOptions) -> Result<String, FormatError> {
    let records: Vec<Value> = dataset
        .rows()
        .into_iter()
        .map(|row| {
            let row: Map<String, Value> = if options.exclude_null {
                row.into_iter().filter(|(_, value)| !value.is_null()).collect()
            } else {
                row
            };
            if options.is_nested {
                Value::Object(un_flatten(row, &options.key_separator))
            } else {
                Value::Object(row)
            }
        })
        .collect();
    Ok(serde_json::to_string(&records)?)
}

/// Expand separator-joined keys into nested objects.
///
/// `{"a.b": 1, "a.c": 2, "d": 3}` becomes `{"a": {"b": 1, "c": 2}, "d": 3}`.
/// Later keys win when a leaf and a group share a name.
pub fn un_flatten(data: Map<String, Value>, separator: &str) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in data {
        insert_path(&mut out, &key, value, separator);
    }
    out
}

fn insert_path(target: &mut Map<String, Value>, key: &str, value: Value, separator: &str) {
    let split = if separator.is_empty() {
        None
    } else {
        key.split_once(separator)
    };
    let Some((head, rest)) = split else {
        target.insert(key.to_string(), value);
        return;
    };

    let entry = target
        .entry(head.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Value::Object(child) = entry {
        insert_path(child, rest, value, separator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn un_flatten_groups_by_first_segment() {
        let flat = object(json!({"a.b": 1, "a.c": 2, "d": 3}));
        assert_eq!(
            Value::Object(un_flatten(flat, ".")),
            json!({"a": {"b": 1, "c": 2}, "d": 3})
        );
    }

    #[test]
    fn un_flatten_recurses_and_honours_the_separator() {
        let flat = object(json!({"a__b__c": 1, "a.b": 2}));
        assert_eq!(
            Value::Object(un_flatten(flat, "__")),
            json!({"a": {"b": {"c": 1}}, "a.b": 2})
        );
        let flat = object(json!({"a.b": 1}));
        assert_eq!(Value::Object(un_flatten(flat, "")), json!({"a.b": 1}));
    }
}
