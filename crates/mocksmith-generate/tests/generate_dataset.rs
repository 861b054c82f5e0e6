use serde_json::{Value, json};

use mocksmith_core::{Column, Schema};
use mocksmith_generate::{Dataset, GenerationContext, GenerationError, GeneratorRegistry, generate};

fn schema(columns: Vec<Column>) -> Schema {
    Schema {
        schema: "mock_example".to_string(),
        file_format: "csv".to_string(),
        columns,
        ..Schema::default()
    }
}

fn nullable(name: &str, generator: &str, percent_empty: f64) -> Column {
    Column {
        percent_empty,
        ..Column::new(name, generator)
    }
}

fn run(schema: &Schema, size: usize, seed: u64) -> Result<Dataset, GenerationError> {
    generate(
        schema,
        size,
        GeneratorRegistry::shared(),
        &GenerationContext::new(seed),
    )
}

#[test]
fn every_column_has_requested_length() {
    let schema = schema(vec![
        Column::new("name", "name"),
        Column::new("id", "uuid4"),
        Column::new("blank", "empty"),
        nullable("maybe", "random_int", 0.5),
    ]);
    for size in [0, 1, 17, 250] {
        let dataset = run(&schema, size, 3).expect("generate");
        assert_eq!(dataset.width(), 4);
        for (name, values) in dataset.columns() {
            assert_eq!(values.len(), size, "column {name}");
        }
    }
}

#[test]
fn zero_percent_empty_never_nulls() {
    let schema = schema(vec![
        Column::new("name", "name"),
        Column::new("price", "price"),
    ]);
    let dataset = run(&schema, 500, 4).expect("generate");
    for (_, values) in dataset.columns() {
        assert!(values.iter().all(|value| !value.is_null()));
    }
}

#[test]
fn full_percent_empty_always_nulls() {
    let schema = schema(vec![nullable("gone", "name", 1.0)]);
    let dataset = run(&schema, 200, 5).expect("generate");
    assert!(dataset.column("gone").expect("column").iter().all(Value::is_null));
}

#[test]
fn partial_percent_empty_is_approximate() {
    let schema = schema(vec![nullable("half", "random_digit", 0.5)]);
    let dataset = run(&schema, 2000, 6).expect("generate");
    let nulls = dataset
        .column("half")
        .expect("column")
        .iter()
        .filter(|value| value.is_null())
        .count();
    assert!((800..=1200).contains(&nulls), "nulls = {nulls}");
}

#[test]
fn columns_keep_declaration_order() {
    let schema = schema(vec![
        Column::new("zeta", "empty"),
        Column::new("alpha", "empty"),
        Column::new("mid", "empty"),
    ]);
    let dataset = run(&schema, 1, 7).expect("generate");
    assert_eq!(
        dataset.column_names().collect::<Vec<_>>(),
        vec!["zeta", "alpha", "mid"]
    );
}

#[test]
fn unknown_type_names_column_and_type() {
    let schema = schema(vec![Column::new("broken", "not_a_type")]);
    let err = run(&schema, 3, 8).expect_err("unknown generator");
    assert!(matches!(err, GenerationError::UnknownGenerator { .. }));
    let message = err.to_string();
    assert!(message.contains("broken"), "{message}");
    assert!(message.contains("not_a_type"), "{message}");
}

#[test]
fn invalid_arguments_carry_column() {
    let schema = schema(vec![
        Column::new("weights", "weighted_choice").with_args(json!({"weights": 3})),
    ]);
    let err = run(&schema, 3, 9).expect_err("invalid argument");
    assert!(matches!(
        err.root(),
        GenerationError::InvalidArgument(_)
    ));
    assert!(err.to_string().contains("weights"));
}

#[test]
fn column_format_applies_to_dates() {
    let schema = schema(vec![Column {
        format: Some("%Y".to_string()),
        ..Column::new("born", "date_object")
    }]);
    let dataset = run(&schema, 20, 10).expect("generate");
    for value in dataset.column("born").expect("column") {
        let year = value.as_str().expect("formatted");
        assert_eq!(year.len(), 4, "{year}");
        assert!(year.chars().all(|ch| ch.is_ascii_digit()));
    }
}

#[test]
fn same_seed_same_dataset() {
    let schema = schema(vec![
        Column::new("name", "name"),
        Column::new("amount", "price").with_args(json!({"minimum": 1, "maximum": 50})),
        nullable("code", "bothify", 0.3),
    ]);
    let first = run(&schema, 40, 11).expect("generate");
    let second = run(&schema, 40, 11).expect("generate");
    let other = run(&schema, 40, 12).expect("generate");
    assert_eq!(first, second);
    assert_ne!(first, other);
}
