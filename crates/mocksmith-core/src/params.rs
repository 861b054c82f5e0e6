use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// External request parameters forwarded into generation and rendering.
///
/// Keys and values are opaque strings; the order of insertion is kept so
/// templates and expressions see parameters as the caller supplied them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParams(IndexMap<String, String>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Boolean override using [`to_boolean`] semantics.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(to_boolean)
    }

    /// Row count override; only all-digit values count.
    pub fn num_rows(&self) -> Option<u64> {
        self.get("num_rows")
            .filter(|value| !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit()))
            .and_then(|value| value.parse().ok())
    }

    pub fn seed(&self) -> Option<&str> {
        self.get("seed")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Interpret a request value as a boolean flag.
pub fn to_boolean(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "t" | "yes" | "y" | "1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_flags() {
        for value in ["true", "T", "yes", "Y", "1", " True "] {
            assert!(to_boolean(value), "{value} should be true");
        }
        for value in ["false", "0", "no", "", "maybe"] {
            assert!(!to_boolean(value), "{value} should be false");
        }
    }

    #[test]
    fn num_rows_requires_digits() {
        let params: RequestParams = [("num_rows", "25")].into_iter().collect();
        assert_eq!(params.num_rows(), Some(25));

        let params: RequestParams = [("num_rows", "-3")].into_iter().collect();
        assert_eq!(params.num_rows(), None);

        let params: RequestParams = [("num_rows", "ten")].into_iter().collect();
        assert_eq!(params.num_rows(), None);
    }
}
