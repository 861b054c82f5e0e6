use serde_json::Value;

use mocksmith_generate::Dataset;

/// Table used when the schema names none.
pub const DEFAULT_TABLE_NAME: &str = "EXAMPLE_DATA";

/// One `INSERT` statement per row, joined by newlines.
pub fn render_sql(dataset: &Dataset, table: &str, size: usize) -> String {
    let fields = dataset.column_names().collect::<Vec<_>>().join(", ");
    (0..size)
        .map(|row| {
            let values = dataset
                .columns()
                .map(|(_, values)| values.get(row).map(sql_literal).unwrap_or_else(|| "NULL".to_string()))
                .collect::<Vec<_>>()
                .join(", ");
            format!("INSERT INTO {table} ({fields}) VALUES ({values});")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => quote(text),
        nested => quote(&nested.to_string()),
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
