use chrono::{NaiveDate, TimeDelta};
use indexmap::IndexMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::{Value as Json, json};

use mocksmith_core::RequestParams;
use mocksmith_expr::{
    ErrorKind, EvalError, Evaluator, Locals, Value, is_safe, parse, parse_timedelta,
};
use mocksmith_generate::GeneratorRegistry;

fn run(expression: &str, this: Json, field: Json) -> Result<Value, EvalError> {
    let params: RequestParams = [("name", "ada"), ("count", "3")].into_iter().collect();
    run_with(expression, this, field, &params)
}

fn run_with(
    expression: &str,
    this: Json,
    field: Json,
    params: &RequestParams,
) -> Result<Value, EvalError> {
    assert!(is_safe(expression), "{expression} should be whitelisted");
    let expr = parse(expression).expect("parse");
    let registry = GeneratorRegistry::shared();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let now = NaiveDate::from_ymd_opt(2024, 6, 15)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("valid clock");
    let mut evaluator = Evaluator::with_clock(registry, params, &mut rng, now);

    let this = Value::from_json(&this);
    let field: IndexMap<String, Value> = match Value::from_json(&field) {
        Value::Dict(entries) => entries,
        _ => IndexMap::new(),
    };
    evaluator.eval(&expr, &Locals { this: &this, field: &field })
}

fn eval(expression: &str) -> Value {
    run(expression, json!("hello world"), json!({"foo": "a", "bar": "b", "n": 4}))
        .expect("evaluate")
}

#[test]
fn whitelist_examples() {
    assert!(is_safe("this.upper()"));
    assert!(is_safe("field['foo'] + field['bar']"));
    assert!(is_safe("fake.price(minimum=1, maximum=2)"));
    assert!(!is_safe("__import__('os')"));
    assert!(!is_safe("this.__class__"));
    assert!(!is_safe("globals()"));
    assert!(!is_safe("getattr(this, 'x')"));
}

#[test]
fn string_helpers() {
    assert_eq!(eval("this.upper()"), Value::str("HELLO WORLD"));
    assert_eq!(eval("title(this)"), Value::str("Hello World"));
    assert_eq!(eval("field['foo'] + field['bar']"), Value::str("ab"));
    assert_eq!(eval("concat(field['foo'], '-', field['bar'])"), Value::str("a-b"));
    assert_eq!(eval("this.replace('world', 'there')"), Value::str("hello there"));
    assert_eq!(eval("join(split(this, ' '), '_')"), Value::str("hello_world"));
    assert_eq!(eval("this[0:5]"), Value::str("hello"));
    assert_eq!(eval("this[-5:]"), Value::str("world"));
    assert_eq!(eval("upper(field['n'])"), Value::str("4"));
}

#[test]
fn arithmetic_and_logic() {
    assert_eq!(eval("field['n'] * 2 + 1"), Value::Int(9));
    assert_eq!(eval("field['n'] / 8"), Value::Float(0.5));
    assert_eq!(eval("2 ** 10"), Value::Int(1024));
    assert_eq!(eval("-field['n'] // 3"), Value::Int(-2));
    assert_eq!(eval("sum(range(4))"), Value::Int(6));
    assert_eq!(eval("1 < field['n'] <= 4"), Value::Bool(true));
    assert_eq!(eval("'big' if field['n'] > 3 else 'small'"), Value::str("big"));
    assert_eq!(eval("field['missing'] if 'missing' in field else 'none'"), Value::str("none"));
    assert_eq!(eval("None or 'fallback'"), Value::str("fallback"));
    assert_eq!(eval("not this"), Value::Bool(false));
    assert_eq!(eval("isinstance(this, (int, str))"), Value::Bool(true));
    assert_eq!(eval("len(this)"), Value::Int(11));
    assert_eq!(eval("round(2.25, 1)"), Value::Float(2.2));
}

#[test]
fn request_parameters() {
    assert_eq!(eval("param.get('name')"), Value::str("ada"));
    assert_eq!(eval("param.get('other', 'x')"), Value::str("x"));
    assert_eq!(eval("request_param('count')"), Value::str("3"));
    assert_eq!(eval("request_param('other')"), Value::None);
    assert_eq!(eval("int(param['count']) + 1"), Value::Int(4));
}

#[test]
fn date_helpers() {
    assert_eq!(
        eval("format_date(parse_date('2020-02-29', '%Y-%m-%d'), '%d/%m/%Y')"),
        Value::str("29/02/2020")
    );
    assert_eq!(eval("year(date(2001, 2, 3))"), Value::Int(2001));
    assert_eq!(eval("age(date(2000, 6, 16))"), Value::Int(23));
    assert_eq!(eval("epoch(date(1970, 1, 2))"), Value::Float(86_400.0));
    assert_eq!(eval("day(this)"), Value::str("hello world"));
    assert_eq!(
        eval("str(datetime(2020, 1, 1, 10) + parse_timedelta('1 day, 02:00:00'))"),
        Value::str("2020-01-02 12:00:00")
    );
    assert_eq!(eval("year(now())"), Value::Int(2024));
}

#[test]
fn timedelta_parsing() {
    let parsed = parse_timedelta(&Value::str("+2 days, 03:04:05")).expect("parse");
    assert_eq!(
        parsed,
        TimeDelta::days(2) + TimeDelta::hours(3) + TimeDelta::minutes(4) + TimeDelta::seconds(5)
    );
    let parsed = parse_timedelta(&Value::str("-1 day, 23:00:00")).expect("parse");
    assert_eq!(parsed, -TimeDelta::hours(1));
    assert_eq!(
        parse_timedelta(&Value::str("12:30:00")).expect("parse"),
        TimeDelta::minutes(750)
    );

    let err = parse_timedelta(&Value::str("soon")).expect_err("garbage");
    assert_eq!(err.kind, ErrorKind::Type);
    let err = parse_timedelta(&Value::Int(5)).expect_err("not a string");
    assert_eq!(err.kind, ErrorKind::Type);
}

#[test]
fn fake_handle_reaches_the_registry() {
    for _ in 0..20 {
        let Value::Float(price) = eval("fake.price(minimum=1, maximum=2)") else {
            panic!("price should be a float");
        };
        assert!((1.0..=2.0).contains(&price));
    }
    assert_eq!(eval("fake.empty()"), Value::str(""));
    assert_eq!(
        eval("fake.random_element(['x'])"),
        Value::str("x"),
        "positional arguments bind in declared order"
    );

    let err = run("fake.not_a_generator()", json!(null), json!({})).expect_err("unknown");
    assert_eq!(err.kind, ErrorKind::Generation);
    let err = run("fake.price(cost=1)", json!(null), json!({})).expect_err("bad kwarg");
    assert!(err.message.contains("unexpected keyword argument 'cost'"));
}

#[test]
fn runtime_failures_keep_their_kind() {
    let cases = [
        ("1 / 0", ErrorKind::ZeroDivision),
        ("field['missing']", ErrorKind::Key),
        ("this[100]", ErrorKind::Index),
        ("age(this)", ErrorKind::Type),
        ("this + 1", ErrorKind::Type),
        ("int('abc')", ErrorKind::Value),
        ("2 ** 100", ErrorKind::Overflow),
    ];
    for (expression, kind) in cases {
        let err = run(expression, json!("text"), json!({})).expect_err(expression);
        assert_eq!(err.kind, kind, "{expression}");
    }
}
