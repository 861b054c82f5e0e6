use rand::{Rng, RngCore};
use serde_json::{Map, Value, json};

use crate::errors::GenerationError;
use crate::generators::python::stepped_int;
use crate::generators::{Generator, GeneratorRegistry};
use crate::params::{ParamKind, ParamSpec, int_range, validate_params};
use crate::value::GeneratedValue;

const ASCII_LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

const RANDOM_INT_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("min", ParamKind::Int, "0"),
    ParamSpec::new("max", ParamKind::Int, "9999"),
    ParamSpec::new("step", ParamKind::Int, "1"),
];
const RANDOM_ELEMENT_PARAMS: &[ParamSpec] =
    &[ParamSpec::new("elements", ParamKind::List, "[\"a\", \"b\", \"c\"]")];
const NUMERIFY_PARAMS: &[ParamSpec] = &[ParamSpec::new("text", ParamKind::String, "\"###\"")];
const LEXIFY_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("text", ParamKind::String, "\"????\""),
    ParamSpec::new(
        "letters",
        ParamKind::String,
        "\"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ\"",
    ),
];
const BOTHIFY_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("text", ParamKind::String, "\"## ??\""),
    ParamSpec::new(
        "letters",
        ParamKind::String,
        "\"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ\"",
    ),
];

pub fn register(registry: &mut GeneratorRegistry) {
    registry.register_generator(Box::new(RandomIntGenerator));
    registry.register_generator(Box::new(RandomDigitGenerator));
    registry.register_generator(Box::new(RandomElementGenerator));
    registry.register_generator(Box::new(RandomLetterGenerator));
    registry.register_generator(Box::new(TemplateGenerator {
        id: "numerify",
        doc: "Replaces `#` with digits, `%` with non-zero digits, `!` and `@` with an optional digit.",
        specs: NUMERIFY_PARAMS,
        default_text: "###",
        digits: true,
        letters: false,
    }));
    registry.register_generator(Box::new(TemplateGenerator {
        id: "lexify",
        doc: "Replaces `?` with a random letter from `letters`.",
        specs: LEXIFY_PARAMS,
        default_text: "????",
        digits: false,
        letters: true,
    }));
    registry.register_generator(Box::new(TemplateGenerator {
        id: "bothify",
        doc: "Applies both numerify and lexify to `text`.",
        specs: BOTHIFY_PARAMS,
        default_text: "## ??",
        digits: true,
        letters: true,
    }));
}

struct RandomIntGenerator;

impl Generator for RandomIntGenerator {
    fn id(&self) -> &'static str {
        "random_int"
    }

    fn module(&self) -> &'static str {
        "base"
    }

    fn doc(&self) -> &'static str {
        "Random integer between `min` and `max` inclusive, in increments of `step`."
    }

    fn params(&self) -> &'static [ParamSpec] {
        RANDOM_INT_PARAMS
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, RANDOM_INT_PARAMS, "random_int")?;
        let (min, max) = int_range(&params, "random_int", ("min", "max"), (0, 9999))?;
        let step = params.get_i64("step").unwrap_or(1);
        stepped_int(rng, min, max, step, "random_int").map(GeneratedValue::Int)
    }
}

struct RandomDigitGenerator;

impl Generator for RandomDigitGenerator {
    fn id(&self) -> &'static str {
        "random_digit"
    }

    fn module(&self) -> &'static str {
        "base"
    }

    fn doc(&self) -> &'static str {
        "Random digit between 0 and 9."
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        validate_params(args, &[], "random_digit")?;
        Ok(GeneratedValue::Int(rng.random_range(0..=9)))
    }
}

struct RandomElementGenerator;

impl Generator for RandomElementGenerator {
    fn id(&self) -> &'static str {
        "random_element"
    }

    fn module(&self) -> &'static str {
        "base"
    }

    fn doc(&self) -> &'static str {
        "Uniformly drawn member of `elements`."
    }

    fn params(&self) -> &'static [ParamSpec] {
        RANDOM_ELEMENT_PARAMS
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, RANDOM_ELEMENT_PARAMS, "random_element")?;
        let default_elements = json!(["a", "b", "c"]);
        let elements = params
            .get_list("elements")
            .or_else(|| default_elements.as_array())
            .filter(|elements| !elements.is_empty())
            .ok_or_else(|| {
                GenerationError::InvalidArgument(
                    "random_element(): elements must not be empty".to_string(),
                )
            })?;
        let index = rng.random_range(0..elements.len());
        Ok(GeneratedValue::from(&elements[index]))
    }
}

struct RandomLetterGenerator;

impl Generator for RandomLetterGenerator {
    fn id(&self) -> &'static str {
        "random_letter"
    }

    fn module(&self) -> &'static str {
        "base"
    }

    fn doc(&self) -> &'static str {
        "Random ASCII letter."
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        validate_params(args, &[], "random_letter")?;
        Ok(GeneratedValue::Text(random_letters(rng, 1)))
    }
}

/// `numerify`, `lexify` and `bothify` placeholder substitution.
struct TemplateGenerator {
    id: &'static str,
    doc: &'static str,
    specs: &'static [ParamSpec],
    default_text: &'static str,
    digits: bool,
    letters: bool,
}

impl Generator for TemplateGenerator {
    fn id(&self) -> &'static str {
        self.id
    }

    fn module(&self) -> &'static str {
        "base"
    }

    fn doc(&self) -> &'static str {
        self.doc
    }

    fn params(&self) -> &'static [ParamSpec] {
        self.specs
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, self.specs, self.id)?;
        let text = params.get_str("text").unwrap_or(self.default_text);
        let letters: Vec<char> = params
            .get_str("letters")
            .unwrap_or(ASCII_LETTERS)
            .chars()
            .collect();
        if self.letters && letters.is_empty() && text.contains('?') {
            return Err(GenerationError::InvalidArgument(format!(
                "{}(): letters must not be empty",
                self.id
            )));
        }

        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '#' if self.digits => out.push(digit(rng, 0)),
                '%' if self.digits => out.push(digit(rng, 1)),
                '!' if self.digits => {
                    if rng.random_bool(0.5) {
                        out.push(digit(rng, 0));
                    }
                }
                '@' if self.digits => {
                    if rng.random_bool(0.5) {
                        out.push(digit(rng, 1));
                    }
                }
                '?' if self.letters => out.push(letters[rng.random_range(0..letters.len())]),
                other => out.push(other),
            }
        }
        Ok(GeneratedValue::Text(out))
    }
}

fn digit(rng: &mut dyn RngCore, low: u32) -> char {
    char::from_digit(rng.random_range(low..=9), 10).unwrap_or('0')
}

/// Random string of `length` ASCII letters.
pub(crate) fn random_letters(rng: &mut dyn RngCore, length: usize) -> String {
    let letters = ASCII_LETTERS.as_bytes();
    (0..length)
        .map(|_| letters[rng.random_range(0..letters.len())] as char)
        .collect()
}
