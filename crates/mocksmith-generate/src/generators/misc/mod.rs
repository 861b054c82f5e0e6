use rand::{Rng, RngCore};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::errors::GenerationError;
use crate::generators::{Generator, GeneratorRegistry};
use crate::params::{ParamKind, ParamSpec, validate_params};
use crate::value::GeneratedValue;

const DEFAULT_BINARY_LENGTH: u64 = 1_048_576;

const BOOLEAN_PARAMS: &[ParamSpec] =
    &[ParamSpec::new("chance_of_getting_true", ParamKind::Int, "50")];
const BINARY_PARAMS: &[ParamSpec] = &[ParamSpec::new("length", ParamKind::Int, "1048576")];
const SHA256_PARAMS: &[ParamSpec] = &[ParamSpec::new("raw_output", ParamKind::Bool, "false")];

pub fn register(registry: &mut GeneratorRegistry) {
    registry.register_generator(Box::new(BooleanGenerator));
    registry.register_generator(Box::new(Uuid4Generator));
    registry.register_generator(Box::new(BinaryGenerator));
    registry.register_generator(Box::new(Sha256Generator));
}

struct BooleanGenerator;

impl Generator for BooleanGenerator {
    fn id(&self) -> &'static str {
        "boolean"
    }

    fn module(&self) -> &'static str {
        "misc"
    }

    fn doc(&self) -> &'static str {
        "True with a `chance_of_getting_true` percent probability."
    }

    fn params(&self) -> &'static [ParamSpec] {
        BOOLEAN_PARAMS
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, BOOLEAN_PARAMS, "boolean")?;
        let chance = params.get_i64("chance_of_getting_true").unwrap_or(50);
        if !(0..=100).contains(&chance) {
            return Err(GenerationError::InvalidArgument(
                "boolean(): chance_of_getting_true must be between 0 and 100".to_string(),
            ));
        }
        Ok(GeneratedValue::Bool(rng.random_range(1..=100) <= chance))
    }
}

struct Uuid4Generator;

impl Generator for Uuid4Generator {
    fn id(&self) -> &'static str {
        "uuid4"
    }

    fn module(&self) -> &'static str {
        "misc"
    }

    fn doc(&self) -> &'static str {
        "Random version 4 UUID."
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        validate_params(args, &[], "uuid4")?;
        Ok(GeneratedValue::Text(random_uuid(rng)))
    }
}

pub(crate) fn random_uuid(rng: &mut dyn RngCore) -> String {
    let bytes: [u8; 16] = rng.random();
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

struct BinaryGenerator;

impl Generator for BinaryGenerator {
    fn id(&self) -> &'static str {
        "binary"
    }

    fn module(&self) -> &'static str {
        "misc"
    }

    fn doc(&self) -> &'static str {
        "Random bytes of the given `length`."
    }

    fn params(&self) -> &'static [ParamSpec] {
        BINARY_PARAMS
    }

    fn has_examples(&self) -> bool {
        false
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, BINARY_PARAMS, "binary")?;
        let length = match params.get("length") {
            None => DEFAULT_BINARY_LENGTH,
            Some(_) => params.get_u64("length").ok_or_else(|| {
                GenerationError::InvalidArgument("binary(): length must be >= 0".to_string())
            })?,
        };
        let mut bytes = vec![0_u8; length as usize];
        rng.fill_bytes(&mut bytes);
        Ok(GeneratedValue::Bytes(bytes))
    }
}

struct Sha256Generator;

impl Generator for Sha256Generator {
    fn id(&self) -> &'static str {
        "sha256"
    }

    fn module(&self) -> &'static str {
        "misc"
    }

    fn doc(&self) -> &'static str {
        "SHA-256 digest of random bytes, hex encoded unless `raw_output`."
    }

    fn params(&self) -> &'static [ParamSpec] {
        SHA256_PARAMS
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, SHA256_PARAMS, "sha256")?;
        let seed: [u8; 32] = rng.random();
        let digest = Sha256::digest(seed);
        if params.get_bool("raw_output").unwrap_or(false) {
            Ok(GeneratedValue::Bytes(digest.to_vec()))
        } else {
            Ok(GeneratedValue::Text(hex::encode(digest)))
        }
    }
}
