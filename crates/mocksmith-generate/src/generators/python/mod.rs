use rand::{Rng, RngCore};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::errors::GenerationError;
use crate::generators::base::random_letters;
use crate::generators::{Generator, GeneratorRegistry};
use crate::params::{ParamKind, ParamMap, ParamSpec, int_range, validate_params};
use crate::value::GeneratedValue;

const MAX_DIGITS: i64 = 18;

const PYINT_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("min_value", ParamKind::Int, "0"),
    ParamSpec::new("max_value", ParamKind::Int, "9999"),
    ParamSpec::new("step", ParamKind::Int, "1"),
];
const PYNUMBER_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("left_digits", ParamKind::Int, "null"),
    ParamSpec::new("right_digits", ParamKind::Int, "null"),
    ParamSpec::new("positive", ParamKind::Bool, "false"),
    ParamSpec::new("min_value", ParamKind::Float, "null"),
    ParamSpec::new("max_value", ParamKind::Float, "null"),
];
const PYSTR_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("min_chars", ParamKind::Int, "null"),
    ParamSpec::new("max_chars", ParamKind::Int, "20"),
];
const PYLIST_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("nb_elements", ParamKind::Int, "10"),
    ParamSpec::new("variable_nb_elements", ParamKind::Bool, "true"),
];

pub fn register(registry: &mut GeneratorRegistry) {
    registry.register_generator(Box::new(PyIntGenerator));
    registry.register_generator(Box::new(PyNumberGenerator { decimal: false }));
    registry.register_generator(Box::new(PyNumberGenerator { decimal: true }));
    registry.register_generator(Box::new(PyBoolGenerator));
    registry.register_generator(Box::new(PyStrGenerator));
    registry.register_generator(Box::new(PyListGenerator));
}

struct PyIntGenerator;

impl Generator for PyIntGenerator {
    fn id(&self) -> &'static str {
        "pyint"
    }

    fn module(&self) -> &'static str {
        "python"
    }

    fn doc(&self) -> &'static str {
        "Random integer between `min_value` and `max_value` in increments of `step`."
    }

    fn params(&self) -> &'static [ParamSpec] {
        PYINT_PARAMS
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, PYINT_PARAMS, "pyint")?;
        let (min, max) = int_range(&params, "pyint", ("min_value", "max_value"), (0, 9999))?;
        let step = params.get_i64("step").unwrap_or(1);
        stepped_int(rng, min, max, step, "pyint").map(GeneratedValue::Int)
    }
}

/// Draw from `min..=max` restricted to `min + k * step`.
pub(crate) fn stepped_int(
    rng: &mut dyn RngCore,
    min: i64,
    max: i64,
    step: i64,
    ctx: &str,
) -> Result<i64, GenerationError> {
    if step <= 0 {
        return Err(GenerationError::InvalidArgument(format!(
            "{ctx}(): step must be > 0"
        )));
    }
    let slots = (max - min) / step;
    Ok(min + rng.random_range(0..=slots) * step)
}

/// `pyfloat` and `pydecimal`, which share their argument surface.
struct PyNumberGenerator {
    decimal: bool,
}

impl Generator for PyNumberGenerator {
    fn id(&self) -> &'static str {
        if self.decimal { "pydecimal" } else { "pyfloat" }
    }

    fn module(&self) -> &'static str {
        "python"
    }

    fn doc(&self) -> &'static str {
        if self.decimal {
            "Random decimal with optional digit counts, sign and bounds."
        } else {
            "Random float with optional digit counts, sign and bounds."
        }
    }

    fn params(&self) -> &'static [ParamSpec] {
        PYNUMBER_PARAMS
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let ctx = self.id();
        let params = validate_params(args, PYNUMBER_PARAMS, ctx)?;
        let (mantissa, scale) = number_parts(&params, ctx, rng)?;
        let decimal = Decimal::new(mantissa, scale);
        if self.decimal {
            Ok(GeneratedValue::Decimal(decimal))
        } else {
            Ok(GeneratedValue::Float(
                mantissa as f64 / 10f64.powi(scale as i32),
            ))
        }
    }
}

fn number_parts(
    params: &ParamMap<'_>,
    ctx: &str,
    rng: &mut dyn RngCore,
) -> Result<(i64, u32), GenerationError> {
    let right_digits = match params.get_i64("right_digits") {
        Some(digits) if !(0..=MAX_DIGITS).contains(&digits) => {
            return Err(GenerationError::InvalidArgument(format!(
                "{ctx}(): right_digits must be between 0 and {MAX_DIGITS}"
            )));
        }
        Some(digits) => digits,
        None => rng.random_range(0..=6),
    };
    let scale = right_digits as u32;
    let factor = 10i64.pow(scale);

    if params.get("min_value").is_some() || params.get("max_value").is_some() {
        let min = params.get_f64("min_value").unwrap_or(0.0);
        let max = params.get_f64("max_value").unwrap_or(min + 1_000_000.0);
        if min > max {
            return Err(GenerationError::InvalidArgument(format!(
                "{ctx}(): min_value must be <= max_value"
            )));
        }
        let value: f64 = rng.random_range(min..=max);
        let mantissa = (value * factor as f64).round();
        if !mantissa.is_finite() || mantissa.abs() >= i64::MAX as f64 {
            return Err(GenerationError::InvalidArgument(format!(
                "{ctx}(): bounds are too large"
            )));
        }
        return Ok((mantissa as i64, scale));
    }

    let left_digits = match params.get_i64("left_digits") {
        Some(digits) if digits < 0 => {
            return Err(GenerationError::InvalidArgument(format!(
                "{ctx}(): left_digits must be >= 0"
            )));
        }
        Some(digits) => digits,
        None => rng.random_range(1..=6),
    };
    if left_digits + right_digits > MAX_DIGITS {
        return Err(GenerationError::InvalidArgument(format!(
            "{ctx}(): at most {MAX_DIGITS} digits are supported"
        )));
    }
    if left_digits + right_digits == 0 {
        return Err(GenerationError::InvalidArgument(format!(
            "{ctx}(): left_digits and right_digits cannot both be 0"
        )));
    }

    let upper = 10i64.pow((left_digits + right_digits) as u32) - 1;
    let mut mantissa = rng.random_range(0..=upper);
    let positive = params.get_bool("positive").unwrap_or(false);
    if positive && mantissa == 0 {
        mantissa = 1;
    }
    if !positive && rng.random_bool(0.5) {
        mantissa = -mantissa;
    }
    Ok((mantissa, scale))
}

struct PyBoolGenerator;

impl Generator for PyBoolGenerator {
    fn id(&self) -> &'static str {
        "pybool"
    }

    fn module(&self) -> &'static str {
        "python"
    }

    fn doc(&self) -> &'static str {
        "Random boolean."
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        validate_params(args, &[], "pybool")?;
        Ok(GeneratedValue::Bool(rng.random_bool(0.5)))
    }
}

struct PyStrGenerator;

impl Generator for PyStrGenerator {
    fn id(&self) -> &'static str {
        "pystr"
    }

    fn module(&self) -> &'static str {
        "python"
    }

    fn doc(&self) -> &'static str {
        "Random string of ASCII letters between `min_chars` and `max_chars` long."
    }

    fn params(&self) -> &'static [ParamSpec] {
        PYSTR_PARAMS
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, PYSTR_PARAMS, "pystr")?;
        let max = params.get_i64("max_chars").unwrap_or(20);
        let min = params.get_i64("min_chars").unwrap_or(max);
        if min < 0 || min > max {
            return Err(GenerationError::InvalidArgument(
                "pystr(): expected 0 <= min_chars <= max_chars".to_string(),
            ));
        }
        let length = rng.random_range(min..=max) as usize;
        Ok(GeneratedValue::Text(random_letters(rng, length)))
    }
}

struct PyListGenerator;

impl Generator for PyListGenerator {
    fn id(&self) -> &'static str {
        "pylist"
    }

    fn module(&self) -> &'static str {
        "python"
    }

    fn doc(&self) -> &'static str {
        "List of about `nb_elements` random integers, strings and floats."
    }

    fn params(&self) -> &'static [ParamSpec] {
        PYLIST_PARAMS
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, PYLIST_PARAMS, "pylist")?;
        let nb = params.get_i64("nb_elements").unwrap_or(10).max(0);
        let count = if params.get_bool("variable_nb_elements").unwrap_or(true) && nb > 0 {
            let low = (nb * 6 / 10).max(1);
            let high = (nb * 14 / 10).max(low);
            rng.random_range(low..=high)
        } else {
            nb
        };

        let items = (0..count)
            .map(|_| match rng.random_range(0..3) {
                0 => GeneratedValue::Int(rng.random_range(0..=9999)),
                1 => {
                    let length = rng.random_range(1..=20);
                    GeneratedValue::Text(random_letters(rng, length))
                }
                _ => GeneratedValue::Float(
                    (rng.random_range(-10_000.0..10_000.0_f64) * 100.0).round() / 100.0,
                ),
            })
            .collect();
        Ok(GeneratedValue::List(items))
    }
}
