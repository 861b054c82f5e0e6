use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::{Map, json};

use mocksmith_generate::{GeneratorRegistry, catalog};

#[test]
fn generator_ids_are_sorted_and_unique() {
    let registry = GeneratorRegistry::new();
    let ids = registry.generator_ids();
    let mut sorted = ids.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(ids, sorted);
}

#[test]
fn catalog_lists_custom_generators_with_examples() {
    let registry = GeneratorRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let entries = catalog(&registry, &mut rng);

    for method in ["empty", "regex", "price", "weighted_choice"] {
        let entry = entries
            .iter()
            .find(|entry| entry.method == method)
            .unwrap_or_else(|| panic!("missing {method}"));
        assert_eq!(entry.module, "");
        assert_eq!(entry.examples.as_ref().map(Vec::len), Some(2), "{method}");
    }

    let price = entries
        .iter()
        .find(|entry| entry.method == "price")
        .expect("price");
    assert_eq!(price.display, "Price");
    assert_eq!(price.args["minimum"].default, json!(0));
    assert_eq!(price.args["maximum"].default, json!(999999));

    let weighted = entries
        .iter()
        .find(|entry| entry.method == "weighted_choice")
        .expect("weighted_choice");
    assert_eq!(weighted.display, "Weighted Choice");
    assert_eq!(weighted.args["elements"].name, "elements");
}

#[test]
fn binary_has_no_examples() {
    let registry = GeneratorRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let entries = catalog(&registry, &mut rng);
    let binary = entries
        .iter()
        .find(|entry| entry.method == "binary")
        .expect("binary");
    assert!(binary.examples.is_none());
    assert_eq!(binary.module, "misc");
}

#[test]
fn every_generator_produces_an_example_with_defaults() {
    let registry = GeneratorRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    for generator in registry.generators() {
        if !generator.has_examples() {
            continue;
        }
        let result = generator.generate(&Map::new(), &mut rng);
        assert!(result.is_ok(), "{} failed: {:?}", generator.id(), result.err());
    }
}

#[test]
fn catalog_serializes_as_documented() {
    let registry = GeneratorRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let entries = catalog(&registry, &mut rng);
    let empty = entries
        .iter()
        .find(|entry| entry.method == "empty")
        .expect("empty");
    let json = serde_json::to_value(empty).expect("serialize");
    assert_eq!(
        json,
        json!({
            "module": "",
            "method": "empty",
            "display": "Empty",
            "doc": "Returns an empty string.",
            "examples": ["", ""],
            "args": {}
        })
    );
}
