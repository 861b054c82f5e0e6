use std::time::Instant;

use chrono::Local;
use indexmap::IndexMap;
use tracing::{debug, info};

use mocksmith_core::{RequestParams, Schema, Settings};
use mocksmith_generate::{Dataset, GenerationContext, GeneratorRegistry};

use crate::delimited::render_delimited;
use crate::errors::FormatError;
use crate::json::render_json;
use crate::options::FormatOptions;
use crate::response::choose_response;
use crate::sql::{DEFAULT_TABLE_NAME, render_sql};
use crate::template::{DEFAULT_ROOT_NODE, render_template, xml_template};

/// A rendered payload together with its response metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub payload: String,
    pub status_code: u16,
    pub content_type: String,
    /// Response headers in emission order, including `Content-Type`.
    pub headers: IndexMap<String, String>,
    pub file_name: String,
}

impl Rendered {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Render `dataset` the way `schema` asks for.
///
/// Truncated columns are removed, one response is drawn, and the payload is
/// either the response's literal data or the dataset in the effective format.
pub fn format_output(
    mut dataset: Dataset,
    schema: &Schema,
    size: usize,
    params: &RequestParams,
    settings: &Settings,
    registry: &'static GeneratorRegistry,
    ctx: &mut GenerationContext,
) -> Result<Rendered, FormatError> {
    let start = Instant::now();
    let options = FormatOptions::resolve(schema, params, settings);
    let format = options.file_format.as_str();

    for name in schema.truncated_columns() {
        dataset.remove_column(name);
    }

    let response = choose_response(&schema.responses, &settings.responses, ctx.rng());
    debug!(
        status_code = response.status_code,
        has_data = response.data.is_some(),
        "response selected"
    );

    let (payload, default_content_type) = if let Some(data) = &response.data {
        (data.clone(), "text/plain".to_string())
    } else {
        match format {
            "csv" | "tsv" => (render_delimited(&dataset, &options)?, "text/csv".to_string()),
            "json" => (render_json(&dataset, &options)?, "application/json".to_string()),
            "sql" => {
                let table = schema.table_name.as_deref().unwrap_or(DEFAULT_TABLE_NAME);
                let rows = size.min(dataset.len());
                (render_sql(&dataset, table, rows), "application/sql".to_string())
            }
            _ if format == "xml" || schema.template.is_some() => {
                let template = match &schema.template {
                    Some(template) => template.clone(),
                    None => auto_xml_template(schema, &options),
                };
                let payload =
                    render_template(&template, &dataset, &options, params, registry, ctx)?;
                let content_type = if format == "xml" {
                    "application/xml".to_string()
                } else {
                    format!("text/{format}")
                };
                (payload, content_type)
            }
            other => return Err(FormatError::UnsupportedFormat(other.to_string())),
        }
    };

    let content_type = response.content_type.clone().unwrap_or(default_content_type);
    let file_name = file_name(schema, format);

    let mut headers = IndexMap::new();
    headers.insert("Content-Type".to_string(), content_type.clone());
    headers.insert(
        "Content-Disposition".to_string(),
        format!("attachment; filename={file_name}"),
    );
    for (name, value) in &response.headers {
        merge_header(&mut headers, name, value);
    }

    info!(
        schema = %schema.schema,
        format,
        status_code = response.status_code,
        bytes = payload.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "output rendered"
    );

    Ok(Rendered {
        payload,
        status_code: response.status_code,
        content_type,
        headers,
        file_name,
    })
}

fn auto_xml_template(schema: &Schema, options: &FormatOptions) -> String {
    let columns = schema
        .columns
        .iter()
        .filter(|column| !column.truncate)
        .map(|column| column.name.as_str());
    let root = schema.root_node.as_deref().unwrap_or(DEFAULT_ROOT_NODE);
    let separator = options.is_nested.then_some(options.key_separator.as_str());
    xml_template(columns, root, separator)
}

/// `<file_name or schema_{}>` with `{}` replaced by a minute timestamp, plus the format extension.
pub fn file_name(schema: &Schema, format: &str) -> String {
    let stamp = Local::now().format("%Y%m%d%H%M").to_string();
    let pattern = schema
        .file_name
        .clone()
        .unwrap_or_else(|| format!("{}_{{}}", schema.schema));
    format!("{}.{format}", pattern.replace("{}", &stamp))
}

fn merge_header(headers: &mut IndexMap<String, String>, name: &str, value: &str) {
    let existing = headers
        .keys()
        .find(|key| key.eq_ignore_ascii_case(name))
        .cloned();
    match existing {
        Some(key) => {
            headers.insert(key, value.to_string());
        }
        None => {
            headers.insert(name.to_string(), value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_headers_override_case_insensitively() {
        let mut headers = IndexMap::new();
        headers.insert("Content-Type".to_string(), "text/csv".to_string());
        merge_header(&mut headers, "content-type", "text/plain");
        merge_header(&mut headers, "X-Trace", "1");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Content-Type"], "text/plain");
        assert_eq!(headers["X-Trace"], "1");
    }

    #[test]
    fn file_name_defaults_to_schema_name() {
        let schema = Schema {
            schema: "people".to_string(),
            ..Schema::default()
        };
        let name = file_name(&schema, "csv");
        assert!(name.starts_with("people_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "people_".len() + 12 + ".csv".len());
    }
}
