use mocksmith_core::{RequestParams, Schema, Settings, to_boolean};

/// Effective rendering options for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    pub file_format: String,
    pub include_header: bool,
    pub exclude_null: bool,
    pub delimiter: String,
    pub quote_character: String,
    pub key_separator: String,
    pub is_nested: bool,
}

impl FormatOptions {
    /// Request parameters override schema fields, which override settings.
    pub fn resolve(schema: &Schema, params: &RequestParams, settings: &Settings) -> Self {
        let text = |key: &str, from_schema: &Option<String>, fallback: &str| {
            params
                .get(key)
                .map(str::to_string)
                .or_else(|| from_schema.clone())
                .unwrap_or_else(|| fallback.to_string())
        };
        let flag = |key: &str, from_schema: Option<bool>, fallback: bool| {
            params.get(key).map(to_boolean).or(from_schema).unwrap_or(fallback)
        };

        Self {
            file_format: params
                .get("file_format")
                .unwrap_or(schema.file_format.as_str())
                .to_string(),
            include_header: flag("include_header", schema.include_header, settings.include_header),
            exclude_null: flag("exclude_null", schema.exclude_null, settings.exclude_null),
            delimiter: text("delimiter", &schema.delimiter, &settings.delimiter),
            quote_character: text(
                "quote_character",
                &schema.quote_character,
                &settings.quote_character,
            ),
            key_separator: text("key_separator", &schema.key_separator, &settings.key_separator),
            is_nested: flag("is_nested", schema.is_nested, settings.is_nested),
        }
    }

    /// Single-byte delimiter; tab for `tsv` and comma otherwise when unusable.
    pub fn delimiter_byte(&self) -> u8 {
        match self.delimiter.as_bytes() {
            [byte] => *byte,
            _ if self.file_format == "tsv" => b'\t',
            _ => b',',
        }
    }

    pub fn quote_byte(&self) -> u8 {
        match self.quote_character.as_bytes() {
            [byte] => *byte,
            _ => b'"',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema {
            schema: "people".to_string(),
            file_format: "csv".to_string(),
            delimiter: Some(";".to_string()),
            include_header: Some(false),
            ..Schema::default()
        }
    }

    #[test]
    fn layers_request_over_schema_over_settings() {
        let settings = Settings::default();
        let params: RequestParams = [("include_header", "yes"), ("file_format", "tsv")]
            .into_iter()
            .collect();
        let options = FormatOptions::resolve(&schema(), &params, &settings);

        assert_eq!(options.file_format, "tsv");
        assert!(options.include_header);
        assert_eq!(options.delimiter, ";");
        assert_eq!(options.key_separator, ".");
        assert!(!options.exclude_null);
    }

    #[test]
    fn unusable_delimiters_fall_back_by_format() {
        let mut options =
            FormatOptions::resolve(&schema(), &RequestParams::new(), &Settings::default());
        options.delimiter = "::".to_string();
        assert_eq!(options.delimiter_byte(), b',');
        options.file_format = "tsv".to_string();
        assert_eq!(options.delimiter_byte(), b'\t');
        options.delimiter = "|".to_string();
        assert_eq!(options.delimiter_byte(), b'|');
    }
}
