use std::collections::BTreeMap;
use std::sync::OnceLock;

use rand::{Rng, RngCore};
use serde_json::{Map, Value};

use crate::errors::GenerationError;
use crate::params::ParamSpec;
use crate::value::GeneratedValue;

pub mod base;
pub mod custom;
pub mod date_time;
pub mod faker;
pub mod lorem;
pub mod misc;
pub mod python;

/// A named provider producing one random value per call.
pub trait Generator: Send + Sync {
    fn id(&self) -> &'static str;

    /// Provider module the generator belongs to; empty for custom providers.
    fn module(&self) -> &'static str;

    fn doc(&self) -> &'static str;

    fn params(&self) -> &'static [ParamSpec] {
        &[]
    }

    /// Whether the catalog renders example outputs for this generator.
    fn has_examples(&self) -> bool {
        true
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError>;
}

/// Static registration table mapping generator ids to providers.
pub struct GeneratorRegistry {
    generators: BTreeMap<&'static str, Box<dyn Generator>>,
}

impl GeneratorRegistry {
    /// Registry with every built-in provider.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        custom::register(&mut registry);
        faker::register(&mut registry);
        lorem::register(&mut registry);
        date_time::register(&mut registry);
        python::register(&mut registry);
        misc::register(&mut registry);
        base::register(&mut registry);
        registry
    }

    pub fn empty() -> Self {
        Self {
            generators: BTreeMap::new(),
        }
    }

    /// Process-wide registry of built-in providers.
    pub fn shared() -> &'static GeneratorRegistry {
        static SHARED: OnceLock<GeneratorRegistry> = OnceLock::new();
        SHARED.get_or_init(GeneratorRegistry::new)
    }

    pub fn register_generator(&mut self, generator: Box<dyn Generator>) {
        self.generators.insert(generator.id(), generator);
    }

    pub fn generator(&self, id: &str) -> Option<&dyn Generator> {
        self.generators.get(id).map(|generator| generator.as_ref())
    }

    /// Look up a generator, failing closed on unknown ids.
    pub fn resolve(&self, id: &str) -> Result<&dyn Generator, GenerationError> {
        self.generator(id)
            .ok_or_else(|| GenerationError::UnknownGenerator {
                generator: id.to_string(),
                column: None,
            })
    }

    pub fn generator_ids(&self) -> Vec<&'static str> {
        self.generators.keys().copied().collect()
    }

    pub fn generators(&self) -> impl Iterator<Item = &dyn Generator> {
        self.generators.values().map(|generator| generator.as_ref())
    }

    pub fn generate(
        &self,
        id: &str,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        self.resolve(id)?.generate(args, rng)
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick an index with probability proportional to its weight.
///
/// Returns `None` when there is nothing to pick from or no positive weight.
pub fn weighted_index(weights: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
    let total: f64 = weights.iter().filter(|weight| **weight > 0.0).sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }

    let mut roll = rng.random_range(0.0..total);
    let mut last = None;
    for (index, weight) in weights.iter().enumerate() {
        if *weight <= 0.0 {
            continue;
        }
        if roll < *weight {
            return Some(index);
        }
        roll -= weight;
        last = Some(index);
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn zero_weights_are_never_drawn() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(weighted_index(&[0.0, 3.0, 0.0], &mut rng), Some(1));
        }
        assert_eq!(weighted_index(&[], &mut rng), None);
        assert_eq!(weighted_index(&[0.0, 0.0], &mut rng), None);
    }
}
