use rand::{Rng, RngCore};
use rand_regex::Regex as RandRegex;
use serde_json::{Map, Value, json};

use crate::errors::GenerationError;
use crate::generators::{Generator, GeneratorRegistry, weighted_index};
use crate::params::{ParamKind, ParamSpec, validate_params};
use crate::value::GeneratedValue;

const DEFAULT_MAX_REPEAT: u32 = 32;
const DEFAULT_PRICE_MIN: f64 = 0.0;
const DEFAULT_PRICE_MAX: f64 = 999_999.0;

const REGEX_PARAMS: &[ParamSpec] = &[ParamSpec::new("expression", ParamKind::Any, "\"\"")];
const PRICE_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("minimum", ParamKind::Any, "0"),
    ParamSpec::new("maximum", ParamKind::Any, "999999"),
];
const WEIGHTED_CHOICE_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("elements", ParamKind::Any, "null"),
    ParamSpec::new("weights", ParamKind::Any, "null"),
];

pub fn register(registry: &mut GeneratorRegistry) {
    registry.register_generator(Box::new(EmptyGenerator));
    registry.register_generator(Box::new(RegexGenerator));
    registry.register_generator(Box::new(PriceGenerator));
    registry.register_generator(Box::new(WeightedChoiceGenerator));
}

struct EmptyGenerator;

impl Generator for EmptyGenerator {
    fn id(&self) -> &'static str {
        "empty"
    }

    fn module(&self) -> &'static str {
        ""
    }

    fn doc(&self) -> &'static str {
        "Returns an empty string."
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        _rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        validate_params(args, &[], "empty")?;
        Ok(GeneratedValue::text(""))
    }
}

struct RegexGenerator;

impl Generator for RegexGenerator {
    fn id(&self) -> &'static str {
        "regex"
    }

    fn module(&self) -> &'static str {
        ""
    }

    fn doc(&self) -> &'static str {
        "Returns a string matching the regular expression `expression`."
    }

    fn params(&self) -> &'static [ParamSpec] {
        REGEX_PARAMS
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, REGEX_PARAMS, "regex")?;
        // Non-string expressions degrade to the empty pattern.
        let expression = params.get_str("expression").unwrap_or("");
        let regex = RandRegex::compile(expression, DEFAULT_MAX_REPEAT).map_err(|err| {
            GenerationError::provider("regex", format!("invalid regex pattern: {err}"))
        })?;
        let value: String = rng.sample(regex);
        Ok(GeneratedValue::Text(value))
    }
}

struct PriceGenerator;

impl Generator for PriceGenerator {
    fn id(&self) -> &'static str {
        "price"
    }

    fn module(&self) -> &'static str {
        ""
    }

    fn doc(&self) -> &'static str {
        "Returns a random price between `minimum` and `maximum`, rounded to two decimals."
    }

    fn params(&self) -> &'static [ParamSpec] {
        PRICE_PARAMS
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, PRICE_PARAMS, "price")?;
        let minimum = bound(params.get("minimum"), DEFAULT_PRICE_MIN);
        let maximum = bound(params.get("maximum"), DEFAULT_PRICE_MAX);
        let (low, high) = if minimum <= maximum {
            (minimum, maximum)
        } else {
            (maximum, minimum)
        };
        let value = rng.random_range(low..=high);
        Ok(GeneratedValue::Float((value * 100.0).round() / 100.0))
    }
}

fn bound(value: Option<&Value>, default: f64) -> f64 {
    value
        .filter(|value| value.is_number())
        .and_then(Value::as_f64)
        .filter(|value| value.is_finite())
        .unwrap_or(default)
}

struct WeightedChoiceGenerator;

impl Generator for WeightedChoiceGenerator {
    fn id(&self) -> &'static str {
        "weighted_choice"
    }

    fn module(&self) -> &'static str {
        ""
    }

    fn doc(&self) -> &'static str {
        "Returns one of `elements`, drawn with the matching `weights`."
    }

    fn params(&self) -> &'static [ParamSpec] {
        WEIGHTED_CHOICE_PARAMS
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, WEIGHTED_CHOICE_PARAMS, "weighted_choice")?;
        let default_elements = json!(["a", "b", "c"]);
        let default_weights = json!([1, 2, 3]);
        let elements = params.get("elements").unwrap_or(&default_elements);
        let weights = params.get("weights").unwrap_or(&default_weights);

        let (Some(elements), Some(weights)) = (elements.as_array(), weights.as_array()) else {
            return Err(GenerationError::InvalidArgument(
                "`elements` and `weights` must both be lists".to_string(),
            ));
        };
        if elements.is_empty() || weights.is_empty() {
            return Ok(GeneratedValue::Null);
        }
        if elements.len() != weights.len() {
            return Err(GenerationError::InvalidArgument(
                "the number of weights does not match the number of elements".to_string(),
            ));
        }

        let weights = weights
            .iter()
            .map(|weight| weight.as_f64().filter(|weight| *weight >= 0.0))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                GenerationError::InvalidArgument(
                    "`weights` must hold non-negative numbers".to_string(),
                )
            })?;
        let index = weighted_index(&weights, rng).ok_or_else(|| {
            GenerationError::InvalidArgument("total of weights must be greater than zero".to_string())
        })?;
        Ok(GeneratedValue::from(&elements[index]))
    }
}
