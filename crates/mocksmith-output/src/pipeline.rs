//! End-to-end flow: decode, generate, evaluate, render.

use std::time::Instant;

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use mocksmith_core::{RequestParams, Schema, Settings};
use mocksmith_expr::{ExprError, evaluate};
use mocksmith_generate::{GenerationContext, GenerationError, GeneratorRegistry, generate};

use crate::error_document::ErrorDocument;
use crate::errors::FormatError;
use crate::format::{Rendered, format_output};

/// Any failure of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schema(#[from] mocksmith_core::Error),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Expression(#[from] ExprError),
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl PipelineError {
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::Schema(
                mocksmith_core::Error::SchemaType(_) | mocksmith_core::Error::InvalidSchema(_),
            ) => 422,
            PipelineError::Format(_) => 422,
            _ => 400,
        }
    }

    /// Structured body for this error.
    pub fn document(&self) -> ErrorDocument {
        match self {
            PipelineError::Schema(mocksmith_core::Error::InvalidSchema(report)) => {
                ErrorDocument::validation(report)
            }
            err if err.status_code() == 422 => ErrorDocument::unprocessable(err.to_string()),
            err => ErrorDocument::bad_request(err.to_string()),
        }
    }
}

/// Row count: the numeric `num_rows` parameter, then the schema, then settings.
pub fn resolve_size(schema: &Schema, params: &RequestParams, settings: &Settings) -> usize {
    let rows = params
        .num_rows()
        .or(schema.num_rows)
        .unwrap_or(settings.size);
    usize::try_from(rows).unwrap_or(usize::MAX)
}

/// Run the whole pipeline over a raw schema document.
pub fn run(
    document: &Value,
    params: &RequestParams,
    settings: &Settings,
) -> Result<Rendered, PipelineError> {
    let schema = Schema::from_document(document).inspect_err(|err| {
        error!(error = %err, "schema rejected");
    })?;
    let mut ctx = GenerationContext::from_params(params);
    run_schema(&schema, params, settings, GeneratorRegistry::shared(), &mut ctx)
}

/// Run generation, evaluation and rendering for an already decoded schema.
pub fn run_schema(
    schema: &Schema,
    params: &RequestParams,
    settings: &Settings,
    registry: &'static GeneratorRegistry,
    ctx: &mut GenerationContext,
) -> Result<Rendered, PipelineError> {
    let start = Instant::now();
    let size = resolve_size(schema, params, settings);
    info!(schema = %schema.schema, size, seed = ctx.seed(), "pipeline started");

    let dataset = generate(schema, size, registry, ctx)?;
    let dataset = evaluate(&schema.columns, dataset, size, params, registry, ctx)?;
    let rendered = format_output(dataset, schema, size, params, settings, registry, ctx)?;

    info!(
        schema = %schema.schema,
        status_code = rendered.status_code,
        duration_ms = start.elapsed().as_millis() as u64,
        "pipeline completed"
    );
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_prefers_request_then_schema_then_settings() {
        let settings = Settings::default();
        let mut schema = Schema::default();
        assert_eq!(resolve_size(&schema, &RequestParams::new(), &settings), 1000);

        schema.num_rows = Some(5);
        assert_eq!(resolve_size(&schema, &RequestParams::new(), &settings), 5);

        let params: RequestParams = [("num_rows", "3")].into_iter().collect();
        assert_eq!(resolve_size(&schema, &params, &settings), 3);

        let params: RequestParams = [("num_rows", "many")].into_iter().collect();
        assert_eq!(resolve_size(&schema, &params, &settings), 5);
    }
}
