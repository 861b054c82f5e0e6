use mocksmith_core::{Column, Error, Response, Schema, schema_json_schema};
use serde_json::json;

fn sample_document() -> serde_json::Value {
    json!({
        "schema": "mock_example",
        "num_rows": 10,
        "file_format": "csv",
        "file_name": "mock_{}_example",
        "columns": [
            {"name": "foo", "type": "random_element", "args": {"elements": ["this"]}},
            {"name": "bar", "type": "random_element", "args": {"elements": ["that"]}}
        ]
    })
}

#[test]
fn decodes_a_valid_document() {
    let schema = Schema::from_document(&sample_document()).expect("valid schema");
    assert_eq!(schema.schema, "mock_example");
    assert_eq!(schema.num_rows, Some(10));
    assert_eq!(schema.columns.len(), 2);
    assert_eq!(schema.columns[0].generator, "random_element");
    assert!(schema.responses.is_empty());
}

#[test]
fn column_type_defaults_to_empty() {
    let mut document = sample_document();
    document["columns"] = json!([{"name": "blank"}]);
    let schema = Schema::from_document(&document).expect("valid schema");
    assert_eq!(schema.columns[0].generator, "empty");
    assert_eq!(schema.columns[0].percent_empty, 0.0);
}

#[test]
fn rejects_non_object_documents() {
    let result = Schema::from_document(&json!(["not", "a", "dict"]));
    match result {
        Err(Error::SchemaType(message)) => assert!(message.contains("must be a dict")),
        other => panic!("expected schema type error, got {other:?}"),
    }
}

#[test]
fn rejects_out_of_range_fields() {
    let mut document = sample_document();
    document["columns"][0]["percent_empty"] = json!(1.5);
    document["responses"] = json!([{"status_code": 700}]);

    let Err(Error::InvalidSchema(report)) = Schema::from_document(&document) else {
        panic!("expected invalid schema");
    };
    let paths: Vec<&str> = report.errors.iter().map(|issue| issue.path.as_str()).collect();
    assert!(paths.contains(&"/columns/0/percent_empty"), "{paths:?}");
    assert!(paths.contains(&"/responses/0/status_code"), "{paths:?}");
}

#[test]
fn rejects_missing_required_fields() {
    let document = json!({"schema": "mock_example", "columns": []});
    assert!(matches!(
        Schema::from_document(&document),
        Err(Error::InvalidSchema(_))
    ));
}

#[test]
fn rejects_empty_column_list() {
    let mut document = sample_document();
    document["columns"] = json!([]);
    let Err(Error::InvalidSchema(report)) = Schema::from_document(&document) else {
        panic!("expected invalid schema");
    };
    assert_eq!(report.errors[0].code, "no_columns");
}

#[test]
fn serializes_only_declared_fields() {
    let schema = Schema {
        schema: "people".to_string(),
        file_format: "json".to_string(),
        columns: vec![Column::new("name", "name")],
        responses: vec![Response::default()],
        ..Schema::default()
    };

    let json = serde_json::to_string(&schema).expect("serialize schema");
    assert_eq!(
        json,
        r#"{"schema":"people","file_format":"json","columns":[{"name":"name","type":"name"}],"responses":[{"status_code":200,"weight":1}]}"#
    );
}

#[test]
fn json_schema_names_every_top_level_field() {
    let contract = schema_json_schema();
    let properties = contract["properties"].as_object().expect("properties");
    for field in ["schema", "num_rows", "file_format", "columns", "responses", "template"] {
        assert!(properties.contains_key(field), "missing {field}");
    }
}
