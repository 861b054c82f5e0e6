use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Column-oriented generation result in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: IndexMap<String, Vec<Value>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a column; a replaced column keeps its position.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Value>) {
        self.columns.insert(name.into(), values);
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Vec<Value>> {
        self.columns.shift_remove(name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows, taken from the longest column.
    pub fn len(&self) -> usize {
        self.columns.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, column: &str, row: usize) -> Option<&Value> {
        self.columns.get(column).and_then(|values| values.get(row))
    }

    /// Overwrite one cell; returns false when the cell does not exist.
    pub fn set(&mut self, column: &str, row: usize, value: Value) -> bool {
        match self.columns.get_mut(column).and_then(|values| values.get_mut(row)) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Row-major view of one row; missing cells read as `null`.
    pub fn row(&self, row: usize) -> Map<String, Value> {
        self.columns
            .iter()
            .map(|(name, values)| (name.clone(), values.get(row).cloned().unwrap_or(Value::Null)))
            .collect()
    }

    pub fn rows(&self) -> Vec<Map<String, Value>> {
        (0..self.len()).map(|row| self.row(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_follow_declaration_order() {
        let mut dataset = Dataset::new();
        dataset.insert_column("foo", vec![json!("a"), json!("b")]);
        dataset.insert_column("bar", vec![json!(1), json!(2)]);

        let row = dataset.row(1);
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["foo", "bar"]);
        assert_eq!(row["foo"], json!("b"));
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn removing_keeps_remaining_order() {
        let mut dataset = Dataset::new();
        for name in ["a", "b", "c"] {
            dataset.insert_column(name, vec![Value::Null]);
        }
        dataset.remove_column("b");
        assert_eq!(dataset.column_names().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(!dataset.set("b", 0, json!(1)));
        assert!(dataset.set("c", 0, json!(1)));
        assert_eq!(dataset.get("c", 0), Some(&json!(1)));
    }
}
