use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use mocksmith_core::ValidationReport;

/// Key used for issues that are not tied to a document path.
pub const VALIDATION_EXCEPTION: &str = "validation exception";

/// Structured error body returned to request collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDocument {
    #[serde(rename = "_status")]
    pub status: String,
    #[serde(rename = "_issues", skip_serializing_if = "Option::is_none")]
    pub issues: Option<IndexMap<String, String>>,
    #[serde(rename = "_error")]
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

impl ErrorDocument {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: "ERR".to_string(),
            issues: None,
            error: ErrorBody {
                code: 400,
                message: message.into(),
            },
        }
    }

    /// A 422 document with a single `validation exception` issue.
    pub fn unprocessable(message: impl Into<String>) -> Self {
        let message = message.into();
        let mut issues = IndexMap::new();
        issues.insert(VALIDATION_EXCEPTION.to_string(), message.clone());
        Self {
            status: "ERR".to_string(),
            issues: Some(issues),
            error: ErrorBody { code: 422, message },
        }
    }

    /// A 422 document listing every error of `report` by path.
    pub fn validation(report: &ValidationReport) -> Self {
        let mut issues: IndexMap<String, String> = IndexMap::new();
        for issue in &report.errors {
            issues
                .entry(issue.path.clone())
                .and_modify(|existing| {
                    existing.push_str("; ");
                    existing.push_str(&issue.message);
                })
                .or_insert_with(|| issue.message.clone());
        }
        Self {
            status: "ERR".to_string(),
            issues: Some(issues),
            error: ErrorBody {
                code: 422,
                message: report.summary(),
            },
        }
    }

    pub fn code(&self) -> u16 {
        self.error.code
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bad_request_has_no_issues() {
        assert_eq!(
            ErrorDocument::bad_request("boom").to_json(),
            json!({"_status": "ERR", "_error": {"code": 400, "message": "boom"}})
        );
    }

    #[test]
    fn unprocessable_reports_a_validation_exception() {
        let document = ErrorDocument::unprocessable("nope");
        assert_eq!(document.code(), 422);
        assert_eq!(
            document.to_json()["_issues"],
            json!({"validation exception": "nope"})
        );
    }
}
