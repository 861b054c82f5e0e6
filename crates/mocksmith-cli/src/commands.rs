use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use mocksmith_core::{
    Error as CoreError, RequestParams, Schema, Settings, ValidationIssue, validate_schema,
};
use mocksmith_expr::{is_safe, parse};
use mocksmith_generate::{GenerationContext, GeneratorRegistry, catalog};
use mocksmith_output::run;

use crate::{CliError, GenerateArgs, SettingsArgs, TypesArgs, ValidateArgs};

pub fn generate(args: GenerateArgs) -> Result<(), CliError> {
    let document = read_document(&args.schema)?;
    let settings = load_settings(args.config.as_deref())?;

    let mut params: RequestParams = args.params.into_iter().collect();
    if let Some(rows) = args.rows {
        params.insert("num_rows", rows.to_string());
    }
    if let Some(seed) = args.seed {
        params.insert("seed", seed);
    }

    let rendered = run(&document, &params, &settings)?;

    match &args.out {
        Some(path) => {
            fs::write(path, rendered.payload.as_bytes())?;
            info!(path = %path.display(), bytes = rendered.payload.len(), "payload written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.payload.as_bytes())?;
            stdout.flush()?;
        }
    }

    eprintln!("status: {}", rendered.status_code);
    for (name, value) in &rendered.headers {
        eprintln!("{name}: {value}");
    }
    Ok(())
}

pub fn types(args: TypesArgs) -> Result<(), CliError> {
    let mut ctx = GenerationContext::from_entropy();
    let entries: Vec<_> = catalog(GeneratorRegistry::shared(), ctx.rng())
        .into_iter()
        .filter(|entry| {
            args.module
                .as_deref()
                .is_none_or(|module| entry.module == module)
        })
        .collect();
    print_json(&entries)
}

#[derive(Debug, Serialize)]
struct ValidationOutput {
    valid: bool,
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
    functions: Vec<FunctionVerdict>,
}

#[derive(Debug, Serialize)]
struct FunctionVerdict {
    column: String,
    function: String,
    safe: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    syntax_error: Option<String>,
}

pub fn validate(args: ValidateArgs) -> Result<(), CliError> {
    let document = read_document(&args.schema)?;
    let output = match Schema::from_document(&document) {
        Ok(schema) => {
            let report = validate_schema(&schema);
            let functions: Vec<FunctionVerdict> = schema
                .function_columns()
                .map(|(column, function)| verdict(&column.name, function))
                .collect();
            ValidationOutput {
                valid: functions
                    .iter()
                    .all(|verdict| verdict.safe && verdict.syntax_error.is_none()),
                errors: report.errors,
                warnings: report.warnings,
                functions,
            }
        }
        Err(CoreError::InvalidSchema(report)) => ValidationOutput {
            valid: false,
            errors: report.errors,
            warnings: report.warnings,
            functions: Vec::new(),
        },
        Err(err) => return Err(err.into()),
    };

    print_json(&output)?;
    if output.valid {
        Ok(())
    } else {
        Err(CliError::Rejected)
    }
}

fn verdict(column: &str, function: &str) -> FunctionVerdict {
    let safe = is_safe(function);
    let syntax_error = if safe {
        parse(function).err().map(|err| err.to_string())
    } else {
        None
    };
    FunctionVerdict {
        column: column.to_string(),
        function: function.to_string(),
        safe,
        syntax_error,
    }
}

pub fn settings(args: SettingsArgs) -> Result<(), CliError> {
    let settings = load_settings(args.config.as_deref())?;
    print!("{}", settings.to_toml()?);
    Ok(())
}

fn read_document(path: &Path) -> Result<Value, CliError> {
    let content = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn load_settings(path: Option<&Path>) -> Result<Settings, CliError> {
    match path {
        Some(path) => Ok(Settings::load(path)?),
        None => Ok(Settings::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsafe_functions_are_not_parsed() {
        let unsafe_verdict = verdict("a", "__import__('os')");
        assert!(!unsafe_verdict.safe);
        assert!(unsafe_verdict.syntax_error.is_none());

        let broken = verdict("b", "upper(this");
        assert!(broken.safe);
        assert!(broken.syntax_error.is_some());

        let fine = verdict("c", "this.upper()");
        assert!(fine.safe && fine.syntax_error.is_none());
    }
}
