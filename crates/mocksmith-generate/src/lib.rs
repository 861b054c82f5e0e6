//! Column-driven synthetic data generation for mocksmith.
//!
//! A [`Schema`](mocksmith_core::Schema) is turned into a column-oriented
//! [`Dataset`] by drawing from the providers of a [`GeneratorRegistry`], with
//! all randomness owned by a per-call [`GenerationContext`].

pub mod catalog;
pub mod context;
pub mod dataset;
pub mod engine;
pub mod errors;
pub mod generators;
pub mod params;
pub mod value;

pub use catalog::{CatalogArg, CatalogEntry, catalog};
pub use context::{GenerationContext, hash_seed, parse_seed};
pub use dataset::Dataset;
pub use engine::{generate, generate_column};
pub use errors::GenerationError;
pub use generators::{Generator, GeneratorRegistry, weighted_index};
pub use value::{GeneratedValue, Temporal, format_duration, normalize, strftime};
