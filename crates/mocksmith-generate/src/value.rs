use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Number, Value};

use crate::errors::GenerationError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const MICROS_PER_DAY: i128 = 86_400_000_000;

/// Native value produced by one generator draw.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Duration(TimeDelta),
    List(Vec<GeneratedValue>),
    Map(IndexMap<String, GeneratedValue>),
}

impl GeneratedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, GeneratedValue::Null)
    }

    pub fn text(value: impl Into<String>) -> Self {
        GeneratedValue::Text(value.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GeneratedValue::Int(value) => Some(*value as f64),
            GeneratedValue::Float(value) => Some(*value),
            GeneratedValue::Decimal(value) => value.to_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            GeneratedValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GeneratedValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl From<&Value> for GeneratedValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => GeneratedValue::Null,
            Value::Bool(value) => GeneratedValue::Bool(*value),
            Value::Number(number) => number
                .as_i64()
                .map(GeneratedValue::Int)
                .or_else(|| number.as_f64().map(GeneratedValue::Float))
                .unwrap_or(GeneratedValue::Null),
            Value::String(value) => GeneratedValue::Text(value.clone()),
            Value::Array(items) => GeneratedValue::List(items.iter().map(Self::from).collect()),
            Value::Object(map) => GeneratedValue::Map(
                map.iter()
                    .map(|(key, value)| (key.clone(), Self::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Convert a generated value into its JSON-safe representation.
///
/// Dates, times and timestamps honour `format` (strftime syntax) when given.
pub fn normalize(value: &GeneratedValue, format: Option<&str>) -> Result<Value, GenerationError> {
    let normalized = match value {
        GeneratedValue::Null => Value::Null,
        GeneratedValue::Bool(value) => Value::Bool(*value),
        GeneratedValue::Int(value) => Value::Number((*value).into()),
        GeneratedValue::Float(value) => float_value(*value),
        GeneratedValue::Decimal(value) => value.to_f64().map(float_value).unwrap_or(Value::Null),
        GeneratedValue::Text(value) => Value::String(value.clone()),
        GeneratedValue::Bytes(bytes) => Value::String(decode_lossless(bytes)),
        GeneratedValue::Date(value) => {
            Value::String(strftime(Temporal::Date(*value), format.unwrap_or(DATE_FORMAT))?)
        }
        GeneratedValue::Time(value) => {
            Value::String(strftime(Temporal::Time(*value), format.unwrap_or(TIME_FORMAT))?)
        }
        GeneratedValue::Timestamp(value) => Value::String(strftime(
            Temporal::Timestamp(*value),
            format.unwrap_or(TIMESTAMP_FORMAT),
        )?),
        GeneratedValue::Duration(value) => Value::String(format_duration(*value)),
        GeneratedValue::List(items) => Value::Array(
            items
                .iter()
                .map(|item| normalize(item, format))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        GeneratedValue::Map(entries) => {
            let mut map = Map::new();
            for (key, item) in entries {
                map.insert(key.clone(), normalize(item, format)?);
            }
            Value::Object(map)
        }
    };
    Ok(normalized)
}

/// Date/time value accepted by [`strftime`].
#[derive(Debug, Clone, Copy)]
pub enum Temporal {
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

/// Render a date/time value with a strftime format, rejecting invalid formats.
pub fn strftime(value: Temporal, format: &str) -> Result<String, GenerationError> {
    let items = StrftimeItems::new(format);
    if items.clone().any(|item| matches!(item, Item::Error)) {
        return Err(GenerationError::InvalidArgument(format!(
            "invalid format string '{format}'"
        )));
    }

    let mut out = String::new();
    let written = match value {
        Temporal::Date(value) => write!(out, "{}", value.format_with_items(items)),
        Temporal::Time(value) => write!(out, "{}", value.format_with_items(items)),
        Temporal::Timestamp(value) => write!(out, "{}", value.format_with_items(items)),
    };
    written.map_err(|_| {
        GenerationError::InvalidArgument(format!(
            "format string '{format}' does not apply to this value"
        ))
    })?;
    Ok(out)
}

/// Render a duration as `[-]N day(s), H:MM:SS[.ffffff]`.
pub fn format_duration(delta: TimeDelta) -> String {
    let total = i128::from(delta.num_seconds()) * 1_000_000
        + i128::from(delta.subsec_nanos() / 1_000);
    let days = total.div_euclid(MICROS_PER_DAY);
    let rem = total.rem_euclid(MICROS_PER_DAY);

    let micros = rem % 1_000_000;
    let seconds = (rem / 1_000_000) % 60;
    let minutes = (rem / 60_000_000) % 60;
    let hours = rem / 3_600_000_000;

    let mut out = String::new();
    if days != 0 {
        let plural = if days.abs() == 1 { "" } else { "s" };
        out.push_str(&format!("{days} day{plural}, "));
    }
    out.push_str(&format!("{hours}:{minutes:02}:{seconds:02}"));
    if micros != 0 {
        out.push_str(&format!(".{micros:06}"));
    }
    out
}

fn float_value(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

fn decode_lossless(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_render_like_timedeltas() {
        assert_eq!(format_duration(TimeDelta::seconds(3723)), "1:02:03");
        assert_eq!(
            format_duration(TimeDelta::days(2) + TimeDelta::seconds(5)),
            "2 days, 0:00:05"
        );
        assert_eq!(format_duration(TimeDelta::seconds(-1)), "-1 day, 23:59:59");
        assert_eq!(
            format_duration(TimeDelta::milliseconds(1500)),
            "0:00:01.500000"
        );
    }

    #[test]
    fn invalid_bytes_are_dropped() {
        let value = GeneratedValue::Bytes(vec![b'o', 0xff, b'k']);
        assert_eq!(normalize(&value, None).expect("normalize"), Value::from("ok"));
    }

    #[test]
    fn dates_use_column_format() {
        let date = NaiveDate::from_ymd_opt(2020, 3, 9).expect("date");
        let value = GeneratedValue::Date(date);
        assert_eq!(
            normalize(&value, None).expect("iso"),
            Value::from("2020-03-09")
        );
        assert_eq!(
            normalize(&value, Some("%d/%m/%Y")).expect("custom"),
            Value::from("09/03/2020")
        );
        assert!(matches!(
            normalize(&value, Some("%H:%M")),
            Err(GenerationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(
            normalize(&GeneratedValue::Float(f64::NAN), None).expect("nan"),
            Value::Null
        );
    }
}
