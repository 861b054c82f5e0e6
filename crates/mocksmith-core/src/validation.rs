use std::collections::BTreeSet;

use jsonschema::JSONSchema;
use schemars::schema_for;
use serde::Serialize;
use serde_json::Value;

use crate::schema::Schema;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Structured validation issue with location and hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(
        severity: IssueSeverity,
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            path: path.into(),
            message: message.into(),
            hint,
        }
    }
}

/// Aggregated validation report with errors and warnings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// One-line rendering of every error, `path: message` joined by `; `.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|issue| format!("{}: {}", issue.path, issue.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// JSON Schema describing the schema document contract.
pub fn schema_json_schema() -> Value {
    serde_json::to_value(schema_for!(Schema)).unwrap_or(Value::Null)
}

/// Validate a raw schema document against the document JSON Schema.
pub fn validate_schema_document(document: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();
    let contract = schema_json_schema();

    let compiled = match JSONSchema::compile(&contract) {
        Ok(compiled) => compiled,
        Err(err) => {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_validation_error",
                "/",
                err.to_string(),
                None,
            ));
            return report;
        }
    };

    if let Err(errors) = compiled.validate(document) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    report
}

/// Validate internal consistency of a decoded schema.
///
/// This checks:
/// - at least one column is declared and every column is named
/// - null probabilities lie in `[0, 1]`
/// - response status codes and weights are in range
/// - duplicate column names (reported as warnings)
pub fn validate_schema(schema: &Schema) -> ValidationReport {
    let mut report = ValidationReport::default();

    if schema.columns.is_empty() {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "no_columns",
            "/columns",
            "schema must declare at least one column",
            None,
        ));
    }

    let mut seen = BTreeSet::new();
    for (index, column) in schema.columns.iter().enumerate() {
        let path = format!("/columns/{index}");
        if column.name.trim().is_empty() {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "missing_column_name",
                format!("{path}/name"),
                "column name must not be empty",
                None,
            ));
        } else if !seen.insert(column.name.as_str()) {
            report.push_warning(ValidationIssue::new(
                IssueSeverity::Warning,
                "duplicate_column_name",
                format!("{path}/name"),
                format!("duplicate column name '{}'", column.name),
                Some("later columns replace earlier ones in the generated dataset".to_string()),
            ));
        }

        if !(0.0..=1.0).contains(&column.percent_empty) {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "percent_empty_out_of_range",
                format!("{path}/percent_empty"),
                format!(
                    "percent_empty must be between 0 and 1, got {}",
                    column.percent_empty
                ),
                None,
            ));
        }
    }

    for (index, response) in schema.responses.iter().enumerate() {
        let path = format!("/responses/{index}");
        if !(100..=599).contains(&response.status_code) {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "status_code_out_of_range",
                format!("{path}/status_code"),
                format!(
                    "status_code must be between 100 and 599, got {}",
                    response.status_code
                ),
                None,
            ));
        }
        if response.weight < 1 {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "weight_out_of_range",
                format!("{path}/weight"),
                "weight must be >= 1",
                None,
            ));
        }
    }

    report
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;

    #[test]
    fn summary_joins_errors() {
        let mut report = ValidationReport::default();
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "a",
            "/columns",
            "first",
            None,
        ));
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "b",
            "/num_rows",
            "second",
            None,
        ));
        assert_eq!(report.summary(), "/columns: first; /num_rows: second");
    }

    #[test]
    fn duplicate_columns_are_warnings() {
        let schema = Schema {
            schema: "dupes".to_string(),
            file_format: "csv".to_string(),
            columns: vec![Column::new("a", "empty"), Column::new("a", "empty")],
            ..Schema::default()
        };
        let report = validate_schema(&schema);
        assert!(report.is_ok());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].path, "/columns/1/name");
    }
}
