use fake::Fake;
use fake::faker::lorem::en::{Paragraph, Sentence, Word, Words};
use rand::RngCore;
use serde_json::{Map, Value};

use crate::errors::GenerationError;
use crate::generators::{Generator, GeneratorRegistry};
use crate::params::{ParamKind, ParamSpec, validate_params};
use crate::value::GeneratedValue;

const WORDS_PARAMS: &[ParamSpec] = &[ParamSpec::new("nb", ParamKind::Int, "3")];
const SENTENCE_PARAMS: &[ParamSpec] = &[ParamSpec::new("nb_words", ParamKind::Int, "6")];
const PARAGRAPH_PARAMS: &[ParamSpec] = &[ParamSpec::new("nb_sentences", ParamKind::Int, "3")];
const TEXT_PARAMS: &[ParamSpec] = &[ParamSpec::new("max_nb_chars", ParamKind::Int, "200")];

const MIN_TEXT_CHARS: i64 = 5;

pub fn register(registry: &mut GeneratorRegistry) {
    registry.register_generator(Box::new(WordGenerator));
    registry.register_generator(Box::new(CountedLoremGenerator {
        id: "words",
        doc: "List of `nb` lorem words.",
        specs: WORDS_PARAMS,
        default: 3,
    }));
    registry.register_generator(Box::new(CountedLoremGenerator {
        id: "sentence",
        doc: "Lorem sentence of about `nb_words` words.",
        specs: SENTENCE_PARAMS,
        default: 6,
    }));
    registry.register_generator(Box::new(CountedLoremGenerator {
        id: "paragraph",
        doc: "Lorem paragraph of about `nb_sentences` sentences.",
        specs: PARAGRAPH_PARAMS,
        default: 3,
    }));
    registry.register_generator(Box::new(TextGenerator));
}

struct WordGenerator;

impl Generator for WordGenerator {
    fn id(&self) -> &'static str {
        "word"
    }

    fn module(&self) -> &'static str {
        "lorem"
    }

    fn doc(&self) -> &'static str {
        "Single lorem word."
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        validate_params(args, &[], "word")?;
        let value: String = Word().fake_with_rng(rng);
        Ok(GeneratedValue::Text(value))
    }
}

/// Lorem generators parameterised by a single positive count.
struct CountedLoremGenerator {
    id: &'static str,
    doc: &'static str,
    specs: &'static [ParamSpec],
    default: usize,
}

impl Generator for CountedLoremGenerator {
    fn id(&self) -> &'static str {
        self.id
    }

    fn module(&self) -> &'static str {
        "lorem"
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
        let key = self.specs[0].key;
        let count = match params.get_i64(key) {
            None => self.default,
            Some(count) if count >= 0 => count as usize,
            Some(_) => {
                return Err(GenerationError::InvalidArgument(format!(
                    "{}(): {key} must be >= 0",
                    self.id
                )));
            }
        };

        let value = match self.id {
            "words" => {
                let words: Vec<String> = Words(count..count + 1).fake_with_rng(rng);
                GeneratedValue::List(words.into_iter().map(GeneratedValue::Text).collect())
            }
            "sentence" => {
                let sentence: String = Sentence(count.max(1)..count.max(1) + 1).fake_with_rng(rng);
                GeneratedValue::Text(sentence)
            }
            _ => {
                let paragraph: String =
                    Paragraph(count.max(1)..count.max(1) + 1).fake_with_rng(rng);
                GeneratedValue::Text(paragraph)
            }
        };
        Ok(value)
    }
}

struct TextGenerator;

impl Generator for TextGenerator {
    fn id(&self) -> &'static str {
        "text"
    }

    fn module(&self) -> &'static str {
        "lorem"
    }

    fn doc(&self) -> &'static str {
        "Lorem text of at most `max_nb_chars` characters."
    }

    fn params(&self) -> &'static [ParamSpec] {
        TEXT_PARAMS
    }

    fn generate(
        &self,
        args: &Map<String, Value>,
        rng: &mut dyn RngCore,
    ) -> Result<GeneratedValue, GenerationError> {
        let params = validate_params(args, TEXT_PARAMS, "text")?;
        let max_chars = params.get_i64("max_nb_chars").unwrap_or(200);
        if max_chars < MIN_TEXT_CHARS {
            return Err(GenerationError::InvalidArgument(format!(
                "text(): can only generate text of at least {MIN_TEXT_CHARS} characters"
            )));
        }
        let max_chars = max_chars as usize;

        let mut text = String::new();
        loop {
            let sentence: String = Sentence(3..10).fake_with_rng(rng);
            let needed = if text.is_empty() {
                sentence.chars().count()
            } else {
                text.chars().count() + 1 + sentence.chars().count()
            };
            if needed > max_chars {
                break;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&sentence);
        }

        if text.is_empty() {
            let word: String = Word().fake_with_rng(rng);
            text = word.chars().take(max_chars - 1).collect();
            text.push('.');
        }
        Ok(GeneratedValue::Text(text))
    }
}
