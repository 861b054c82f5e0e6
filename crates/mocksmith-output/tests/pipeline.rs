use serde_json::{Value, json};

use mocksmith_core::{RequestParams, Settings};
use mocksmith_output::{PipelineError, run};

fn document() -> Value {
    json!({
        "schema": "accounts",
        "num_rows": 5,
        "file_format": "json",
        "columns": [
            {"name": "id", "type": "random_int", "args": {"min": 1, "max": 100}},
            {"name": "first", "type": "first_name"},
            {"name": "tier", "type": "random_element", "args": {"elements": ["gold", "silver"]}},
            {"name": "label", "type": "empty", "function": "concat(field['tier'].upper(), '-', str(field['id']))"},
            {"name": "secret", "type": "uuid4", "truncate": true}
        ]
    })
}

fn seeded(seed: &str) -> RequestParams {
    [("seed", seed)].into_iter().collect()
}

#[test]
fn seeded_runs_are_reproducible() {
    let settings = Settings::default();
    let first = run(&document(), &seeded("1234"), &settings).expect("first run");
    let second = run(&document(), &seeded("1234"), &settings).expect("second run");
    assert_eq!(first.payload, second.payload);

    let other = run(&document(), &seeded("4321"), &settings).expect("other run");
    assert_ne!(first.payload, other.payload);
}

#[test]
fn rows_are_generated_evaluated_and_rendered() {
    let rendered = run(&document(), &seeded("7"), &Settings::default()).expect("run");
    let rows: Vec<Value> = serde_json::from_str(&rendered.payload).expect("json");
    assert_eq!(rows.len(), 5);
    for row in rows {
        let id = row["id"].as_i64().expect("id");
        assert!((1..=100).contains(&id));
        let tier = row["tier"].as_str().expect("tier");
        assert_eq!(row["label"], json!(format!("{}-{id}", tier.to_uppercase())));
        assert!(row.get("secret").is_none());
    }
    assert_eq!(rendered.status_code, 200);
}

#[test]
fn request_parameters_override_rows_and_format() {
    let params: RequestParams = [("seed", "7"), ("num_rows", "2"), ("file_format", "csv")]
        .into_iter()
        .collect();
    let rendered = run(&document(), &params, &Settings::default()).expect("run");
    let lines: Vec<&str> = rendered.payload.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "id,first,tier,label");
}

#[test]
fn non_object_documents_are_unprocessable() {
    let err = run(&json!([1, 2]), &RequestParams::new(), &Settings::default())
        .expect_err("array document");
    assert_eq!(err.status_code(), 422);
    let body = err.document().to_json();
    assert_eq!(body["_status"], json!("ERR"));
    assert_eq!(
        body["_issues"]["validation exception"],
        json!("'[1,2]' is not a document, must be a dict")
    );
}

#[test]
fn invalid_documents_list_their_issues() {
    let err = run(
        &json!({"schema": "accounts", "file_format": "csv", "columns": []}),
        &RequestParams::new(),
        &Settings::default(),
    )
    .expect_err("no columns");
    assert!(matches!(err, PipelineError::Schema(_)));
    assert_eq!(err.status_code(), 422);
    assert!(err.document().issues.is_some_and(|issues| !issues.is_empty()));
}

#[test]
fn unknown_generators_are_bad_requests() {
    let mut document = document();
    document["columns"][1]["type"] = json!("no_such_generator");
    let err = run(&document, &seeded("1"), &Settings::default()).expect_err("unknown generator");
    assert_eq!(err.status_code(), 400);
    let body = err.document().to_json();
    assert_eq!(body["_error"]["code"], json!(400));
    assert!(body.get("_issues").is_none());
    assert_eq!(
        body["_error"]["message"],
        json!("Exception at column first, 'no_such_generator' is not a valid data type")
    );
}

#[test]
fn unsafe_expressions_are_bad_requests() {
    let mut document = document();
    document["columns"][3]["function"] = json!("__import__('os')");
    let err = run(&document, &seeded("1"), &Settings::default()).expect_err("unsafe");
    assert!(matches!(err, PipelineError::Expression(_)));
    assert_eq!(err.status_code(), 400);
    assert_eq!(
        err.to_string(),
        "Column(s) label does not contain supported functions"
    );
}

#[test]
fn unsupported_formats_are_unprocessable() {
    let params: RequestParams = [("file_format", "yaml")].into_iter().collect();
    let err = run(&document(), &params, &Settings::default()).expect_err("yaml");
    assert_eq!(err.status_code(), 422);
    assert_eq!(
        err.document().to_json()["_issues"]["validation exception"],
        json!("You must provide a template for file format 'yaml'.")
    );
}
