use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use indexmap::IndexMap;
use mocksmith_generate::{GeneratedValue, format_duration};
use serde_json::Number;

use crate::functions::Builtin;

/// Runtime value of the expression language.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Dict(IndexMap<String, Value>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    TimeDelta(TimeDelta),
    Builtin(Builtin),
}

impl Value {
    pub fn str(value: impl Into<String>) -> Self {
        Value::Str(value.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Date(_) => "datetime.date",
            Value::DateTime(_) => "datetime.datetime",
            Value::Time(_) => "datetime.time",
            Value::TimeDelta(_) => "datetime.timedelta",
            Value::Builtin(builtin) if builtin.is_type() => "type",
            Value::Builtin(_) => "builtin_function_or_method",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(value) => *value,
            Value::Int(value) => *value != 0,
            Value::Float(value) => *value != 0.0,
            Value::Str(value) => !value.is_empty(),
            Value::List(items) | Value::Tuple(items) => !items.is_empty(),
            Value::Dict(entries) => !entries.is_empty(),
            Value::TimeDelta(delta) => !delta.is_zero(),
            Value::Date(_) | Value::DateTime(_) | Value::Time(_) | Value::Builtin(_) => true,
        }
    }

    /// Integer view of ints and bools.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Bool(value) => Some(i64::from(*value)),
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Float view of any number.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            other => other.as_int().map(|value| value as f64),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Int(_) | Value::Float(_))
    }

    /// Quoted rendering used inside containers.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(value) => quote(value),
            Value::Date(value) => format!(
                "datetime.date({}, {}, {})",
                value.format("%Y"),
                value.format("%-m"),
                value.format("%-d")
            ),
            other => other.to_string(),
        }
    }

    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(value) => Value::Bool(*value),
            serde_json::Value::Number(number) => number
                .as_i64()
                .map(Value::Int)
                .or_else(|| number.as_f64().map(Value::Float))
                .unwrap_or(Value::None),
            serde_json::Value::String(value) => Value::Str(value.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(map) => Value::Dict(
                map.iter()
                    .map(|(key, value)| (key.clone(), Self::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// JSON view used for generator keyword arguments.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::None => serde_json::Value::Null,
            Value::Bool(value) => serde_json::Value::Bool(*value),
            Value::Int(value) => serde_json::Value::Number((*value).into()),
            Value::Float(value) => Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(value) => serde_json::Value::String(value.clone()),
            Value::List(items) | Value::Tuple(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Dict(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            other => serde_json::Value::String(other.to_string()),
        }
    }

    /// Equality with numeric cross-type comparison.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.equals(b))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, value)| b.get(key).is_some_and(|other| value.equals(other)))
            }
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::TimeDelta(a), Value::TimeDelta(b)) => a == b,
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => match (a.as_int(), b.as_int()) {
                (Some(a), Some(b)) => a == b,
                _ => a.as_float() == b.as_float(),
            },
            _ => false,
        }
    }

    /// Ordering for `<`-style comparisons; `None` when the types do not order.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                for (a, b) in a.iter().zip(b) {
                    if !a.equals(b) {
                        return a.compare(b);
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
            (Value::TimeDelta(a), Value::TimeDelta(b)) => Some(a.cmp(b)),
            (a, b) if a.is_number() && b.is_number() => match (a.as_int(), b.as_int()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => a.as_float()?.partial_cmp(&b.as_float()?),
            },
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<GeneratedValue> for Value {
    fn from(value: GeneratedValue) -> Self {
        match value {
            GeneratedValue::Null => Value::None,
            GeneratedValue::Bool(value) => Value::Bool(value),
            GeneratedValue::Int(value) => Value::Int(value),
            GeneratedValue::Float(_) | GeneratedValue::Decimal(_) => {
                value.as_f64().map(Value::Float).unwrap_or(Value::None)
            }
            GeneratedValue::Text(value) => Value::Str(value),
            GeneratedValue::Bytes(bytes) => Value::Str(String::from_utf8_lossy(&bytes).into_owned()),
            GeneratedValue::Date(value) => Value::Date(value),
            GeneratedValue::Time(value) => Value::Time(value),
            GeneratedValue::Timestamp(value) => Value::DateTime(value),
            GeneratedValue::Duration(value) => Value::TimeDelta(value),
            GeneratedValue::List(items) => Value::List(items.into_iter().map(Value::from).collect()),
            GeneratedValue::Map(entries) => Value::Dict(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for GeneratedValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::None => GeneratedValue::Null,
            Value::Bool(value) => GeneratedValue::Bool(*value),
            Value::Int(value) => GeneratedValue::Int(*value),
            Value::Float(value) => GeneratedValue::Float(*value),
            Value::Str(value) => GeneratedValue::Text(value.clone()),
            Value::List(items) | Value::Tuple(items) => {
                GeneratedValue::List(items.iter().map(GeneratedValue::from).collect())
            }
            Value::Dict(entries) => GeneratedValue::Map(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), GeneratedValue::from(value)))
                    .collect(),
            ),
            Value::Date(value) => GeneratedValue::Date(*value),
            Value::DateTime(value) => GeneratedValue::Timestamp(*value),
            Value::Time(value) => GeneratedValue::Time(*value),
            Value::TimeDelta(value) => GeneratedValue::Duration(*value),
            Value::Builtin(_) => GeneratedValue::Text(value.to_string()),
        }
    }
}

/// `str()` rendering.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => f.write_str(&format_float(*value)),
            Value::Str(value) => f.write_str(value),
            Value::List(items) => write!(f, "[{}]", join_repr(items)),
            Value::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0].repr()),
            Value::Tuple(items) => write!(f, "({})", join_repr(items)),
            Value::Dict(entries) => {
                let body = entries
                    .iter()
                    .map(|(key, value)| format!("{}: {}", quote(key), value.repr()))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{body}}}")
            }
            Value::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            Value::DateTime(value) => {
                if value.nanosecond() == 0 {
                    write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S"))
                } else {
                    write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S%.6f"))
                }
            }
            Value::Time(value) => {
                if value.nanosecond() == 0 {
                    write!(f, "{}", value.format("%H:%M:%S"))
                } else {
                    write!(f, "{}", value.format("%H:%M:%S%.6f"))
                }
            }
            Value::TimeDelta(value) => f.write_str(&format_duration(*value)),
            Value::Builtin(builtin) if builtin.is_type() => write!(f, "<class '{}'>", builtin.name()),
            Value::Builtin(builtin) => write!(f, "<built-in function {}>", builtin.name()),
        }
    }
}

fn join_repr(items: &[Value]) -> String {
    items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
}

fn quote(value: &str) -> String {
    if value.contains('\'') && !value.contains('"') {
        format!("\"{value}\"")
    } else {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

/// Shortest float rendering, always keeping a fractional part for integral values.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        (if value > 0.0 { "inf" } else { "-inf" }).to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
