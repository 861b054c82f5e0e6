use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::Response;

/// Global defaults applied beneath schema fields and request overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub file_format: String,
    pub include_header: bool,
    pub exclude_null: bool,
    pub delimiter: String,
    pub quote_character: String,
    pub key_separator: String,
    pub is_nested: bool,
    /// Row count used when neither the request nor the schema set one.
    pub size: u64,
    /// Responses used when a schema declares none.
    pub responses: Vec<Response>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            file_format: "csv".to_string(),
            include_header: true,
            exclude_null: false,
            delimiter: ",".to_string(),
            quote_character: "\"".to_string(),
            key_separator: ".".to_string(),
            is_nested: false,
            size: 1000,
            responses: vec![Response::default()],
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, falling back to defaults when absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(content).map_err(|err| Error::Settings(err.to_string()))?;
        Ok(settings.with_default_responses())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| Error::Settings(err.to_string()))
    }

    fn with_default_responses(mut self) -> Self {
        if self.responses.is_empty() {
            self.responses = vec![Response::default()];
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let settings = Settings::from_toml("file_format = \"json\"\nsize = 5\n").expect("parse");
        assert_eq!(settings.file_format, "json");
        assert_eq!(settings.size, 5);
        assert_eq!(settings.delimiter, ",");
        assert_eq!(settings.responses, vec![Response::default()]);
    }

    #[test]
    fn toml_round_trip() {
        let settings = Settings::default();
        let encoded = settings.to_toml().expect("encode");
        let decoded = Settings::from_toml(&encoded).expect("decode");
        assert_eq!(settings, decoded);
    }

    #[test]
    fn invalid_toml_is_reported() {
        let result = Settings::from_toml("size = \"many\"");
        assert!(matches!(result, Err(Error::Settings(_))));
    }
}
