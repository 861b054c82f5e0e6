use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::validation::{
    IssueSeverity, ValidationIssue, ValidationReport, validate_schema, validate_schema_document,
};

/// Generator bound to columns that do not declare a `type`.
pub const DEFAULT_GENERATOR: &str = "empty";

/// Contract for one generated dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    /// Unique schema name.
    #[schemars(length(min = 3, max = 64))]
    pub schema: String,
    /// Target row count when the request does not override it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1))]
    pub num_rows: Option<u64>,
    /// Output format (`csv`, `tsv`, `json`, `sql`, `xml` or any templated format).
    pub file_format: String,
    /// File naming template; `{}` is replaced with a minute-granularity timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(min = 3, max = 64))]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_header: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_null: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_nested: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_separator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_character: Option<String>,
    /// Raw output template rendered instead of a built-in format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Root element of auto-derived XML templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_node: Option<String>,
    /// Target table of SQL output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<Response>,
}

/// Generator binding for one output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub name: String,
    /// Registry identifier of the generator.
    #[serde(rename = "type", default = "default_generator")]
    pub generator: String,
    /// Keyword arguments handed to the generator on every draw.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Map<String, Value>,
    /// strftime-style format for date and time values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Probability that a row holds `null` instead of a generated value.
    #[serde(default, skip_serializing_if = "is_zero")]
    #[schemars(range(min = 0, max = 1))]
    pub percent_empty: f64,
    /// Compute the column but drop it from the rendered output.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncate: bool,
    /// Post-processing expression evaluated once per row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, generator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generator: generator.into(),
            ..Self::default()
        }
    }

    pub fn with_args(mut self, args: Value) -> Self {
        if let Value::Object(map) = args {
            self.args = map;
        }
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }
}

impl Default for Column {
    fn default() -> Self {
        Self {
            name: String::new(),
            generator: default_generator(),
            args: Map::new(),
            format: None,
            percent_empty: 0.0,
            truncate: false,
            function: None,
            description: None,
        }
    }
}

/// One weighted candidate response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Response {
    #[serde(default = "default_status_code")]
    #[schemars(range(min = 100, max = 599))]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Literal payload; when present no formatting happens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default = "default_weight")]
    #[schemars(range(min = 1))]
    pub weight: u32,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status_code: default_status_code(),
            headers: IndexMap::new(),
            content_type: None,
            data: None,
            weight: default_weight(),
        }
    }
}

impl Schema {
    /// Decode and validate a raw schema document.
    pub fn from_document(document: &Value) -> Result<Self> {
        if !document.is_object() {
            return Err(Error::SchemaType(format!(
                "'{document}' is not a document, must be a dict"
            )));
        }

        let structural = validate_schema_document(document);
        if !structural.is_ok() {
            return Err(Error::InvalidSchema(structural));
        }

        let schema: Schema = serde_json::from_value(document.clone()).map_err(|err| {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "invalid_schema_json",
                "/",
                err.to_string(),
                None,
            ));
            Error::InvalidSchema(report)
        })?;

        let report = validate_schema(&schema);
        for warning in &report.warnings {
            tracing::warn!(
                schema = %schema.schema,
                code = %warning.code,
                path = %warning.path,
                "{}",
                warning.message
            );
        }
        if !report.is_ok() {
            return Err(Error::InvalidSchema(report));
        }

        Ok(schema)
    }

    /// Columns carrying a post-processing expression, in declaration order.
    pub fn function_columns(&self) -> impl Iterator<Item = (&Column, &str)> {
        self.columns
            .iter()
            .filter_map(|column| column.function.as_deref().map(|function| (column, function)))
    }

    /// Names of columns dropped from the rendered output.
    pub fn truncated_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|column| column.truncate)
            .map(|column| column.name.as_str())
            .collect()
    }
}

fn default_generator() -> String {
    DEFAULT_GENERATOR.to_string()
}

fn default_status_code() -> u16 {
    200
}

fn default_weight() -> u32 {
    1
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}
