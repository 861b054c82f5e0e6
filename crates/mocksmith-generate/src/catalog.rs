use indexmap::IndexMap;
use rand::RngCore;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::generators::{Generator, GeneratorRegistry};
use crate::value::normalize;

const EXAMPLE_COUNT: usize = 2;

/// Documentation record for one generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub module: String,
    pub method: String,
    pub display: String,
    pub doc: String,
    pub examples: Option<Vec<Value>>,
    pub args: IndexMap<String, CatalogArg>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogArg {
    pub name: String,
    pub default: Value,
}

/// Describe every registered generator, sorted by method name.
pub fn catalog(registry: &GeneratorRegistry, rng: &mut dyn RngCore) -> Vec<CatalogEntry> {
    registry
        .generators()
        .map(|generator| catalog_entry(generator, rng))
        .collect()
}

pub fn catalog_entry(generator: &dyn Generator, rng: &mut dyn RngCore) -> CatalogEntry {
    let examples = generator.has_examples().then(|| {
        (0..EXAMPLE_COUNT)
            .map(|_| example(generator, rng))
            .collect::<Vec<_>>()
    });
    let args = generator
        .params()
        .iter()
        .map(|spec| {
            (
                spec.key.to_string(),
                CatalogArg {
                    name: spec.key.to_string(),
                    default: spec.default_value(),
                },
            )
        })
        .collect();

    CatalogEntry {
        module: generator.module().to_string(),
        method: generator.id().to_string(),
        display: display_name(generator.id()),
        doc: generator.doc().to_string(),
        examples,
        args,
    }
}

/// One default-argument draw; failures render as `null`.
fn example(generator: &dyn Generator, rng: &mut dyn RngCore) -> Value {
    generator
        .generate(&Map::new(), rng)
        .and_then(|value| normalize(&value, None))
        .unwrap_or(Value::Null)
}

/// `day_of_week` becomes `Day Of Week`.
pub fn display_name(method: &str) -> String {
    let mut out = String::with_capacity(method.len());
    let mut previous_is_letter = false;
    for ch in method.replace('_', " ").chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_are_title_cased() {
        assert_eq!(display_name("day_of_week"), "Day Of Week");
        assert_eq!(display_name("ipv4"), "Ipv4");
        assert_eq!(display_name("iso8601"), "Iso8601");
        assert_eq!(display_name("empty"), "Empty");
    }
}
