use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::{Map, Value, json};

use mocksmith_generate::{GeneratedValue, GenerationError, GeneratorRegistry};

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn empty_always_returns_empty_string() {
    let registry = GeneratorRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    for _ in 0..10 {
        let value = registry
            .generate("empty", &Map::new(), &mut rng)
            .expect("empty");
        assert_eq!(value, GeneratedValue::text(""));
    }
}

#[test]
fn regex_matches_expression() {
    let registry = GeneratorRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let pattern = regex::Regex::new(r"^[A-Z]{3}-\d{4}$").expect("pattern");
    for _ in 0..50 {
        let value = registry
            .generate(
                "regex",
                &args(json!({"expression": r"[A-Z]{3}-\d{4}"})),
                &mut rng,
            )
            .expect("regex");
        let text = value.as_str().expect("text");
        assert!(pattern.is_match(text), "{text}");
    }
}

#[test]
fn regex_degrades_to_empty_pattern() {
    let registry = GeneratorRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let value = registry
        .generate("regex", &args(json!({"expression": 42})), &mut rng)
        .expect("regex");
    assert_eq!(value, GeneratedValue::text(""));

    let value = registry
        .generate("regex", &Map::new(), &mut rng)
        .expect("regex");
    assert_eq!(value, GeneratedValue::text(""));
}

#[test]
fn price_stays_in_range_with_two_decimals() {
    let registry = GeneratorRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    for _ in 0..200 {
        let value = registry
            .generate("price", &args(json!({"minimum": 1, "maximum": 2})), &mut rng)
            .expect("price");
        let price = value.as_f64().expect("float");
        assert!((1.0..=2.0).contains(&price), "{price}");
        assert_eq!((price * 100.0).round() / 100.0, price);
    }
}

#[test]
fn price_ignores_non_numeric_bounds() {
    let registry = GeneratorRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    for _ in 0..100 {
        let value = registry
            .generate(
                "price",
                &args(json!({"minimum": "cheap", "maximum": 10})),
                &mut rng,
            )
            .expect("price");
        let price = value.as_f64().expect("float");
        assert!((0.0..=10.0).contains(&price), "{price}");
    }
}

#[test]
fn weighted_choice_defaults_to_abc() {
    let registry = GeneratorRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    for _ in 0..100 {
        let value = registry
            .generate("weighted_choice", &Map::new(), &mut rng)
            .expect("weighted choice");
        let text = value.as_str().expect("text");
        assert!(["a", "b", "c"].contains(&text), "{text}");
    }
}

#[test]
fn weighted_choice_follows_weights() {
    let registry = GeneratorRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let args = args(json!({"elements": ["rare", "common"], "weights": [1, 99]}));
    let common = (0..2000)
        .filter(|_| {
            registry
                .generate("weighted_choice", &args, &mut rng)
                .expect("weighted choice")
                == GeneratedValue::text("common")
        })
        .count();
    assert!(common > 1900, "common drawn {common} times");
}

#[test]
fn weighted_choice_rejects_non_lists() {
    let registry = GeneratorRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let result = registry.generate(
        "weighted_choice",
        &args(json!({"elements": "abc"})),
        &mut rng,
    );
    assert!(matches!(result, Err(GenerationError::InvalidArgument(_))));
}

#[test]
fn weighted_choice_with_empty_list_returns_nothing() {
    let registry = GeneratorRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let value = registry
        .generate(
            "weighted_choice",
            &args(json!({"elements": [], "weights": [1]})),
            &mut rng,
        )
        .expect("weighted choice");
    assert!(value.is_null());
}

#[test]
fn unexpected_keyword_arguments_fail() {
    let registry = GeneratorRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(10);
    let result = registry.generate("name", &args(json!({"locale": "fr"})), &mut rng);
    assert!(matches!(result, Err(GenerationError::InvalidArgument(_))));
}

#[test]
fn unknown_generators_fail_closed() {
    let registry = GeneratorRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let result = registry.generate("__import__", &Map::new(), &mut rng);
    assert!(matches!(
        result,
        Err(GenerationError::UnknownGenerator { .. })
    ));
}
