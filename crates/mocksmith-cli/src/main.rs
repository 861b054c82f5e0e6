mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use mocksmith_core::Error as CoreError;
use mocksmith_output::{ErrorDocument, PipelineError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write output: {0}")]
    Write(#[from] std::io::Error),
    #[error("'{path}' is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("schema failed validation")]
    Rejected,
    #[error("logging error: {0}")]
    Logging(String),
}

impl CliError {
    fn document(&self) -> ErrorDocument {
        match self {
            CliError::Pipeline(err) => err.document(),
            CliError::Core(CoreError::InvalidSchema(report)) => ErrorDocument::validation(report),
            CliError::Core(err @ CoreError::SchemaType(_)) => {
                ErrorDocument::unprocessable(err.to_string())
            }
            CliError::Rejected => ErrorDocument::unprocessable(self.to_string()),
            other => ErrorDocument::bad_request(other.to_string()),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "mocksmith", version, about = "Schema-driven mock data generator")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
    /// Log filter, e.g. `info` or `mocksmith_expr=debug`; overrides RUST_LOG.
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate and render a dataset from a schema document.
    Generate(GenerateArgs),
    /// List the available generators as JSON.
    Types(TypesArgs),
    /// Validate a schema document and its column functions.
    Validate(ValidateArgs),
    /// Print the effective settings as TOML.
    Settings(SettingsArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Path to the schema JSON document.
    schema: PathBuf,
    /// Number of rows; overrides the schema.
    #[arg(long)]
    rows: Option<u64>,
    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<String>,
    /// Request parameter as KEY=VALUE; repeatable.
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(String, String)>,
    /// Settings file (TOML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the payload here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TypesArgs {
    /// Only list generators of this module.
    #[arg(long)]
    module: Option<String>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the schema JSON document.
    schema: PathBuf,
}

#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// Settings file (TOML).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = logging::init_logging(cli.log_json, cli.log_level.as_deref()) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Command::Generate(args) => commands::generate(args),
        Command::Types(args) => commands::types(args),
        Command::Validate(args) => commands::validate(args),
        Command::Settings(args) => commands::settings(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            let document = err.document().to_json();
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&document).unwrap_or_else(|_| err.to_string())
            );
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_split_on_the_first_equals_sign() {
        assert_eq!(
            parse_param("q=a=b"),
            Ok(("q".to_string(), "a=b".to_string()))
        );
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn generate_flags_parse() {
        let cli = Cli::parse_from([
            "mocksmith",
            "--log-json",
            "generate",
            "schema.json",
            "--rows",
            "3",
            "--param",
            "file_format=json",
            "--param",
            "exclude_null=true",
        ]);
        assert!(cli.log_json);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.rows, Some(3));
        assert_eq!(args.params.len(), 2);
        assert_eq!(args.params[0], ("file_format".to_string(), "json".to_string()));
    }

    #[test]
    fn rejected_schemas_are_unprocessable() {
        assert_eq!(CliError::Rejected.document().code(), 422);
        assert_eq!(
            CliError::Logging("x".to_string()).document().code(),
            400
        );
    }
}
