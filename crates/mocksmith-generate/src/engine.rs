use std::time::Instant;

use rand::{Rng, RngCore};
use serde_json::Value;
use tracing::{debug, info};

use mocksmith_core::{Column, Schema};

use crate::context::GenerationContext;
use crate::dataset::Dataset;
use crate::errors::GenerationError;
use crate::generators::GeneratorRegistry;
use crate::value::normalize;

/// Generate `size` rows for every column of `schema`.
///
/// Each cell is either `null` (drawn against the column's `percent_empty`) or
/// the normalized output of the column's generator.
pub fn generate(
    schema: &Schema,
    size: usize,
    registry: &GeneratorRegistry,
    ctx: &GenerationContext,
) -> Result<Dataset, GenerationError> {
    let start = Instant::now();
    info!(
        schema = %schema.schema,
        columns = schema.columns.len(),
        size,
        seed = ctx.seed(),
        "generation started"
    );

    let mut dataset = Dataset::new();
    for column in &schema.columns {
        let mut rng = ctx.column_rng(&column.name);
        let values = generate_column(column, size, registry, &mut rng)
            .map_err(|err| err.in_column(&column.name))?;
        debug!(
            column = %column.name,
            generator = %column.generator,
            nulls = values.iter().filter(|value| value.is_null()).count(),
            "column generated"
        );
        dataset.insert_column(column.name.clone(), values);
    }

    info!(
        schema = %schema.schema,
        columns = dataset.width(),
        rows = size,
        duration_ms = start.elapsed().as_millis() as u64,
        "generation completed"
    );
    Ok(dataset)
}

/// Draw `size` values for one column.
pub fn generate_column(
    column: &Column,
    size: usize,
    registry: &GeneratorRegistry,
    rng: &mut dyn RngCore,
) -> Result<Vec<Value>, GenerationError> {
    let generator = registry.resolve(&column.generator)?;
    let format = column.format.as_deref();
    let percent_empty = column.percent_empty;

    let mut values = Vec::with_capacity(size);
    for _ in 0..size {
        let draw: f64 = rng.random();
        if percent_empty > 0.0 && draw <= percent_empty {
            values.push(Value::Null);
            continue;
        }
        let value = generator.generate(&column.args, rng)?;
        values.push(normalize(&value, format)?);
    }
    Ok(values)
}
