use serde_json::Value;

use mocksmith_generate::Dataset;

use crate::errors::FormatError;
use crate::options::FormatOptions;

/// Render the dataset as delimited text, one line per row.
pub fn render_delimited(dataset: &Dataset, options: &FormatOptions) -> Result<String, FormatError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter_byte())
        .quote(options.quote_byte())
        .terminator(csv::Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(Vec::new());

    if options.include_header {
        writer.write_record(dataset.column_names())?;
    }
    for row in 0..dataset.len() {
        let record: Vec<String> = dataset
            .columns()
            .map(|(_, values)| values.get(row).map(cell).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Text of one cell; nulls are empty and nested values compact JSON.
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        nested => nested.to_string(),
    }
}
