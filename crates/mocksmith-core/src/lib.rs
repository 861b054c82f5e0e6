//! Core contracts and helpers for Mocksmith.
//!
//! This crate defines the schema document types, global settings, request
//! parameters and the validation helpers shared by the generation, expression
//! and output crates.

pub mod error;
pub mod params;
pub mod schema;
pub mod settings;
pub mod validation;

pub use error::{Error, Result};
pub use params::{RequestParams, to_boolean};
pub use schema::{Column, DEFAULT_GENERATOR, Response, Schema};
pub use settings::Settings;
pub use validation::{
    IssueSeverity, ValidationIssue, ValidationReport, schema_json_schema, validate_schema,
    validate_schema_document,
};
