use serde_json::{Map, Value};

use crate::errors::GenerationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    Int,
    Float,
    String,
    List,
    /// Accepted as-is; the generator interprets it.
    Any,
}

/// Declared keyword argument of a generator.
///
/// `default` is a JSON literal describing the value used when the argument is
/// omitted; it only feeds the catalog.
#[derive(Clone, Copy, Debug)]
pub struct ParamSpec {
    pub key: &'static str,
    pub kind: ParamKind,
    pub default: &'static str,
}

impl ParamSpec {
    pub const fn new(key: &'static str, kind: ParamKind, default: &'static str) -> Self {
        Self { key, kind, default }
    }

    pub fn default_value(&self) -> Value {
        serde_json::from_str(self.default).unwrap_or(Value::Null)
    }
}

pub struct ParamMap<'a> {
    map: &'a Map<String, Value>,
}

/// Check keyword arguments against the declared parameters of `ctx`.
///
/// Explicit `null` arguments count as omitted.
pub fn validate_params<'a>(
    args: &'a Map<String, Value>,
    specs: &[ParamSpec],
    ctx: &str,
) -> Result<ParamMap<'a>, GenerationError> {
    for (key, value) in args {
        let Some(spec) = specs.iter().find(|spec| spec.key == key.as_str()) else {
            return Err(GenerationError::InvalidArgument(format!(
                "{ctx}() got an unexpected keyword argument '{key}'"
            )));
        };
        validate_kind(ctx, key, spec.kind, value)?;
    }
    Ok(ParamMap { map: args })
}

impl<'a> ParamMap<'a> {
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|value| !value.is_null())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_list(&self, key: &str) -> Option<&'a Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }
}

fn validate_kind(ctx: &str, key: &str, kind: ParamKind, value: &Value) -> Result<(), GenerationError> {
    let valid = value.is_null()
        || match kind {
            ParamKind::Bool => value.is_boolean(),
            ParamKind::Int => value.as_i64().is_some(),
            ParamKind::Float => value.as_f64().is_some(),
            ParamKind::String => value.is_string(),
            ParamKind::List => value.is_array(),
            ParamKind::Any => true,
        };

    if valid {
        Ok(())
    } else {
        Err(GenerationError::InvalidArgument(format!(
            "{ctx}(): invalid value for argument '{key}'"
        )))
    }
}

/// Resolve an inclusive integer range, rejecting inverted bounds.
pub fn int_range(
    params: &ParamMap<'_>,
    ctx: &str,
    keys: (&str, &str),
    defaults: (i64, i64),
) -> Result<(i64, i64), GenerationError> {
    let min = params.get_i64(keys.0).unwrap_or(defaults.0);
    let max = params.get_i64(keys.1).unwrap_or(defaults.1);
    if min > max {
        return Err(GenerationError::InvalidArgument(format!(
            "{ctx}(): {} must be <= {}",
            keys.0, keys.1
        )));
    }
    Ok((min, max))
}
