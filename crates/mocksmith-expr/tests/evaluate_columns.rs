use serde_json::json;

use mocksmith_core::{Column, RequestParams};
use mocksmith_expr::{ErrorKind, ExprError, evaluate};
use mocksmith_generate::{Dataset, GenerationContext, GeneratorRegistry};

fn dataset() -> Dataset {
    let mut dataset = Dataset::new();
    dataset.insert_column("first", vec![json!("ada"), json!("alan")]);
    dataset.insert_column("last", vec![json!("lovelace"), json!("turing")]);
    dataset.insert_column("full", vec![json!(null), json!(null)]);
    dataset.insert_column("shout", vec![json!(null), json!(null)]);
    dataset
}

fn run(columns: &[Column]) -> Result<Dataset, ExprError> {
    let registry = GeneratorRegistry::shared();
    let mut ctx = GenerationContext::new(11);
    evaluate(columns, dataset(), 2, &RequestParams::new(), registry, &mut ctx)
}

#[test]
fn later_columns_see_values_computed_earlier_in_the_row() {
    let columns = vec![
        Column::new("first", "first_name"),
        Column::new("last", "last_name"),
        Column::new("full", "empty").with_function("concat(field['first'], ' ', field['last'])"),
        Column::new("shout", "empty").with_function("field['full'].upper()"),
    ];
    let dataset = run(&columns).expect("evaluate");

    assert_eq!(
        dataset.column("full").expect("full"),
        &[json!("ada lovelace"), json!("alan turing")]
    );
    assert_eq!(
        dataset.column("shout").expect("shout"),
        &[json!("ADA LOVELACE"), json!("ALAN TURING")]
    );
    assert_eq!(dataset.column("first").expect("first")[0], json!("ada"));
}

#[test]
fn this_is_the_column_own_value() {
    let columns = vec![Column::new("first", "first_name").with_function("this.title()")];
    let dataset = run(&columns).expect("evaluate");
    assert_eq!(dataset.column("first").expect("first"), &[json!("Ada"), json!("Alan")]);
}

#[test]
fn unsafe_columns_fail_as_one_batch() {
    let columns = vec![
        Column::new("first", "first_name").with_function("this.upper()"),
        Column::new("last", "last_name").with_function("__import__('os')"),
        Column::new("full", "empty").with_function("open('/etc/passwd')"),
    ];
    let err = run(&columns).expect_err("unsafe");
    assert!(matches!(&err, ExprError::Unsafe { columns } if columns == &["last", "full"]));
    assert_eq!(
        err.to_string(),
        "Column(s) last, full does not contain supported functions"
    );
}

#[test]
fn syntax_errors_name_the_column() {
    let columns = vec![Column::new("full", "empty").with_function("concat(field['first']")];
    let err = run(&columns).expect_err("syntax");
    assert_eq!(err.column(), Some("full"));
    assert!(
        err.to_string()
            .starts_with("Exception for column 'full', function has invalid syntax")
    );
}

#[test]
fn overly_deep_expressions_are_syntax_errors() {
    for function in [
        format!("1{}", "+1".repeat(2040)),
        format!("[[0]]{}", "[0]".repeat(1300)),
    ] {
        assert!(mocksmith_expr::is_safe(&function));
        let columns = vec![Column::new("full", "empty").with_function(function)];
        let err = run(&columns).expect_err("too deep");
        assert!(matches!(err, ExprError::Syntax { .. }), "{err}");
        assert_eq!(err.column(), Some("full"));
        assert!(err.to_string().contains("nested deeper than"), "{err}");
    }
}

#[test]
fn runtime_errors_are_decorated_with_the_column() {
    let columns = vec![Column::new("full", "empty").with_function("1 / 0")];
    let err = run(&columns).expect_err("runtime");
    assert_eq!(err.kind(), Some(ErrorKind::ZeroDivision));
    assert_eq!(err.to_string(), "Exception for column 'full', division by zero");
}

#[test]
fn results_are_normalized_with_the_column_format() {
    let mut column = Column::new("full", "empty").with_function("date(2021, 3, 4)");
    column.format = Some("%d/%m/%Y".to_string());
    let dataset = run(&[column]).expect("evaluate");
    assert_eq!(dataset.column("full").expect("full")[1], json!("04/03/2021"));

    let column = Column::new("full", "empty").with_function("parse_timedelta('1 day, 00:00:01')");
    let dataset = run(&[column]).expect("evaluate");
    assert_eq!(dataset.column("full").expect("full")[0], json!("1 day, 0:00:01"));
}

#[test]
fn datasets_without_functions_pass_through() {
    let columns = vec![Column::new("first", "first_name")];
    assert_eq!(run(&columns).expect("evaluate"), dataset());
}

#[test]
fn seeded_fake_calls_are_reproducible() {
    let columns = vec![Column::new("full", "empty").with_function("fake.name()")];
    let registry = GeneratorRegistry::shared();
    let params = RequestParams::new();
    let draw = || {
        let mut ctx = GenerationContext::new(99);
        evaluate(&columns, dataset(), 2, &params, registry, &mut ctx).expect("evaluate")
    };
    assert_eq!(draw(), draw());
}
