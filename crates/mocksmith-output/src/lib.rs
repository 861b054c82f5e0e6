//! Rendering of generated datasets for mocksmith.
//!
//! [`format_output`] turns a [`Dataset`](mocksmith_generate::Dataset) into a
//! payload (CSV, TSV, JSON, SQL, XML or a `tera` template) plus the response
//! metadata drawn from the schema's weighted responses. [`pipeline::run`]
//! drives the whole flow from a raw schema document.

pub mod delimited;
pub mod error_document;
pub mod errors;
pub mod format;
pub mod json;
pub mod options;
pub mod pipeline;
pub mod response;
pub mod sql;
pub mod template;

pub use error_document::{ErrorBody, ErrorDocument};
pub use errors::FormatError;
pub use format::{Rendered, format_output};
pub use json::un_flatten;
pub use options::FormatOptions;
pub use pipeline::{PipelineError, resolve_size, run, run_schema};
pub use response::choose_response;
