use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use regex::Regex;

use mocksmith_core::RequestParams;
use mocksmith_generate::{Temporal, hash_seed, strftime};

use crate::ast::BinOp;
use crate::errors::{ErrorKind, EvalError};
use crate::ops::{self, midnight};
use crate::value::Value;

/// Longest list `range()` will materialize.
const MAX_RANGE_LEN: i64 = 1_000_000;

/// Approved global functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Abs,
    Age,
    Bool,
    Concat,
    Date,
    Datetime,
    Day,
    Epoch,
    Float,
    FormatDate,
    Hash,
    Int,
    Isinstance,
    Join,
    Len,
    List,
    Lower,
    Month,
    Now,
    ParseDate,
    ParseTimedelta,
    Pow,
    Range,
    Replace,
    RequestParam,
    Round,
    Split,
    Str,
    Strip,
    Sum,
    Time,
    Title,
    Tuple,
    Upper,
    Year,
}

const BUILTINS: &[(&str, Builtin)] = &[
    ("abs", Builtin::Abs),
    ("age", Builtin::Age),
    ("bool", Builtin::Bool),
    ("concat", Builtin::Concat),
    ("date", Builtin::Date),
    ("datetime", Builtin::Datetime),
    ("day", Builtin::Day),
    ("epoch", Builtin::Epoch),
    ("float", Builtin::Float),
    ("format_date", Builtin::FormatDate),
    ("hash", Builtin::Hash),
    ("int", Builtin::Int),
    ("isinstance", Builtin::Isinstance),
    ("join", Builtin::Join),
    ("len", Builtin::Len),
    ("list", Builtin::List),
    ("lower", Builtin::Lower),
    ("month", Builtin::Month),
    ("now", Builtin::Now),
    ("parse_date", Builtin::ParseDate),
    ("parse_timedelta", Builtin::ParseTimedelta),
    ("pow", Builtin::Pow),
    ("range", Builtin::Range),
    ("replace", Builtin::Replace),
    ("request_param", Builtin::RequestParam),
    ("round", Builtin::Round),
    ("split", Builtin::Split),
    ("str", Builtin::Str),
    ("strip", Builtin::Strip),
    ("sum", Builtin::Sum),
    ("time", Builtin::Time),
    ("title", Builtin::Title),
    ("tuple", Builtin::Tuple),
    ("upper", Builtin::Upper),
    ("year", Builtin::Year),
];

/// Ambient state a builtin may read.
#[derive(Debug, Clone, Copy)]
pub struct CallScope<'a> {
    pub params: &'a RequestParams,
    /// Wall clock captured once per evaluation run.
    pub now: NaiveDateTime,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        BUILTINS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, builtin)| *builtin)
    }

    pub fn name(self) -> &'static str {
        BUILTINS
            .iter()
            .find(|(_, builtin)| *builtin == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        BUILTINS.iter().map(|(name, _)| *name)
    }

    /// Builtins that double as types for `isinstance`.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            Builtin::Bool
                | Builtin::Int
                | Builtin::Float
                | Builtin::Str
                | Builtin::List
                | Builtin::Tuple
                | Builtin::Date
                | Builtin::Datetime
        )
    }

    /// Parameter names and the number of required leading parameters.
    fn signature(self) -> (&'static [&'static str], usize) {
        match self {
            Builtin::Abs => (&["x"], 1),
            Builtin::Age => (&["date"], 1),
            Builtin::Bool | Builtin::Int | Builtin::Float => (&["x"], 0),
            Builtin::Str => (&["object"], 0),
            Builtin::Date => (&["year", "month", "day"], 3),
            Builtin::Datetime => (
                &["year", "month", "day", "hour", "minute", "second", "microsecond"],
                3,
            ),
            Builtin::Day | Builtin::Month | Builtin::Year | Builtin::Time | Builtin::Epoch => {
                (&["date"], 1)
            }
            Builtin::FormatDate => (&["date", "format"], 2),
            Builtin::Hash => (&["object"], 1),
            Builtin::Isinstance => (&["obj", "class_or_tuple"], 2),
            Builtin::Join => (&["items", "delimiter"], 2),
            Builtin::Len => (&["obj"], 1),
            Builtin::List | Builtin::Tuple => (&["iterable"], 0),
            Builtin::Lower | Builtin::Upper | Builtin::Title | Builtin::Strip => (&["s"], 1),
            Builtin::Now => (&[], 0),
            Builtin::ParseDate => (&["string", "format"], 2),
            Builtin::ParseTimedelta => (&["string"], 1),
            Builtin::Pow => (&["base", "exp", "mod"], 2),
            Builtin::Replace => (&["s", "old", "new"], 3),
            Builtin::RequestParam => (&["name"], 1),
            Builtin::Round => (&["number", "ndigits"], 1),
            Builtin::Split => (&["s", "sep"], 1),
            Builtin::Sum => (&["iterable", "start"], 1),
            Builtin::Concat | Builtin::Range => (&[], 0),
        }
    }

    pub fn call(
        self,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        scope: &CallScope<'_>,
    ) -> Result<Value, EvalError> {
        match self {
            Builtin::Concat => {
                no_kwargs(self, &kwargs)?;
                return concat(&args);
            }
            Builtin::Range => {
                no_kwargs(self, &kwargs)?;
                return range(&args);
            }
            _ => {}
        }

        let mut args = Args::bind(self, args, kwargs)?;
        match self {
            Builtin::Abs => abs(&args.take()),
            Builtin::Age => age(&args.take(), scope.now.date()),
            Builtin::Bool => Ok(Value::Bool(args.take_opt().is_some_and(|value| value.truthy()))),
            Builtin::Int => to_int(args.take_opt()),
            Builtin::Float => to_float(args.take_opt()),
            Builtin::Str => Ok(Value::Str(
                args.take_opt().map(|value| value.to_string()).unwrap_or_default(),
            )),
            Builtin::Round => round(&args.take(), args.take_opt()),
            Builtin::Pow => {
                let base = args.take();
                let exponent = args.take();
                match args.take_opt() {
                    Some(modulus) if !matches!(modulus, Value::None) => {
                        modular_pow(&base, &exponent, &modulus)
                    }
                    _ => ops::power(&base, &exponent),
                }
            }
            Builtin::Sum => sum(&args.take(), args.take_opt()),
            Builtin::Len => len(&args.take()),
            Builtin::Upper => Ok(Value::Str(args.take().to_string().to_uppercase())),
            Builtin::Lower => Ok(Value::Str(args.take().to_string().to_lowercase())),
            Builtin::Title => Ok(Value::Str(title_case(&args.take().to_string()))),
            Builtin::Strip => Ok(Value::Str(args.take().to_string().trim().to_string())),
            Builtin::Replace => {
                let text = args.take().to_string();
                let old = expect_str(self, 2, args.take())?;
                let new = expect_str(self, 3, args.take())?;
                Ok(Value::Str(text.replace(&old, &new)))
            }
            Builtin::Split => split(args.take(), args.take_opt()),
            Builtin::Join => join(&args.take(), &args.take()),
            Builtin::Day => Ok(date_part(args.take(), |date| date.day() as i64)),
            Builtin::Month => Ok(date_part(args.take(), |date| date.month() as i64)),
            Builtin::Year => Ok(date_part(args.take(), |date| date.year() as i64)),
            Builtin::Time => Ok(match args.take() {
                Value::DateTime(moment) => Value::Time(moment.time()),
                other => other,
            }),
            Builtin::Epoch => Ok(match args.take() {
                Value::DateTime(moment) => Value::Float(timestamp(moment)),
                Value::Date(date) => Value::Float(timestamp(midnight(date))),
                other => other,
            }),
            Builtin::Now => Ok(Value::DateTime(scope.now)),
            Builtin::Date => {
                let year = int_arg(&args.take())?;
                let month = int_arg(&args.take())?;
                let day = int_arg(&args.take())?;
                make_date(year, month, day).map(Value::Date)
            }
            Builtin::Datetime => {
                let date = make_date(
                    int_arg(&args.take())?,
                    int_arg(&args.take())?,
                    int_arg(&args.take())?,
                )?;
                let mut parts = [0_i64; 4];
                for part in &mut parts {
                    if let Some(value) = args.take_opt() {
                        *part = int_arg(&value)?;
                    }
                }
                let [hour, minute, second, micro] = parts.map(|part| u32::try_from(part).ok());
                let time = match (hour, minute, second, micro) {
                    (Some(h), Some(m), Some(s), Some(us)) if us < 1_000_000 => {
                        NaiveTime::from_hms_micro_opt(h, m, s, us)
                    }
                    _ => None,
                }
                .ok_or_else(|| EvalError::value_error("time component out of range"))?;
                Ok(Value::DateTime(date.and_time(time)))
            }
            Builtin::FormatDate => format_date(args.take(), args.take()),
            Builtin::ParseDate => parse_date(&args.take(), &args.take()),
            Builtin::ParseTimedelta => parse_timedelta(&args.take()).map(Value::TimeDelta),
            Builtin::Hash => hash(&args.take()),
            Builtin::Isinstance => isinstance(&args.take(), &args.take()),
            Builtin::List => iterate(args.take_opt()).map(Value::List),
            Builtin::Tuple => iterate(args.take_opt()).map(Value::Tuple),
            Builtin::RequestParam => Ok(scope
                .params
                .get(&args.take().to_string())
                .map(Value::str)
                .unwrap_or(Value::None)),
            Builtin::Concat | Builtin::Range => Ok(Value::None),
        }
    }
}

/// Arguments bound to a builtin's parameter list, consumed in order.
struct Args {
    slots: std::vec::IntoIter<Option<Value>>,
}

impl Args {
    fn bind(
        builtin: Builtin,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Self, EvalError> {
        let (names, required) = builtin.signature();
        let name = builtin.name();
        if args.len() > names.len() {
            return Err(EvalError::type_error(format!(
                "{name}() takes at most {} arguments ({} given)",
                names.len(),
                args.len()
            )));
        }

        let mut slots: Vec<Option<Value>> = vec![None; names.len()];
        for (slot, value) in slots.iter_mut().zip(args) {
            *slot = Some(value);
        }
        for (key, value) in kwargs {
            let position = names.iter().position(|candidate| *candidate == key).ok_or_else(|| {
                EvalError::type_error(format!(
                    "{name}() got an unexpected keyword argument '{key}'"
                ))
            })?;
            if slots[position].is_some() {
                return Err(EvalError::type_error(format!(
                    "{name}() got multiple values for argument '{key}'"
                )));
            }
            slots[position] = Some(value);
        }
        if let Some(missing) = slots[..required].iter().position(Option::is_none) {
            return Err(EvalError::type_error(format!(
                "{name}() missing required argument '{}'",
                names[missing]
            )));
        }
        Ok(Self {
            slots: slots.into_iter(),
        })
    }

    fn take_opt(&mut self) -> Option<Value> {
        self.slots.next().flatten()
    }

    /// Next required argument; binding guarantees it is present.
    fn take(&mut self) -> Value {
        self.take_opt().unwrap_or(Value::None)
    }
}

fn no_kwargs(builtin: Builtin, kwargs: &[(String, Value)]) -> Result<(), EvalError> {
    if kwargs.is_empty() {
        return Ok(());
    }
    Err(EvalError::type_error(format!(
        "{}() takes no keyword arguments",
        builtin.name()
    )))
}

fn expect_str(builtin: Builtin, position: usize, value: Value) -> Result<String, EvalError> {
    match value {
        Value::Str(text) => Ok(text),
        other => Err(EvalError::type_error(format!(
            "{}() argument {position} must be str, not {}",
            builtin.name(),
            other.type_name()
        ))),
    }
}

fn int_arg(value: &Value) -> Result<i64, EvalError> {
    value.as_int().ok_or_else(|| {
        EvalError::type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            value.type_name()
        ))
    })
}

fn abs(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Float(number) => Ok(Value::Float(number.abs())),
        Value::TimeDelta(delta) => Ok(Value::TimeDelta(delta.abs())),
        other => match other.as_int() {
            Some(number) => number
                .checked_abs()
                .map(Value::Int)
                .ok_or_else(EvalError::overflow),
            None => Err(EvalError::type_error(format!(
                "bad operand type for abs(): '{}'",
                other.type_name()
            ))),
        },
    }
}

/// Whole years elapsed between `date` and `today`.
fn age(value: &Value, today: NaiveDate) -> Result<Value, EvalError> {
    let date = match value {
        Value::Date(date) => *date,
        Value::DateTime(moment) => moment.date(),
        _ => {
            return Err(EvalError::type_error(
                "Error: 'date' must be of type `datetime.datetime` or `datetime.date`",
            ));
        }
    };
    let before_birthday = (today.month(), today.day()) < (date.month(), date.day());
    let years = today.year() - date.year() - i32::from(before_birthday);
    Ok(Value::Int(i64::from(years)))
}

fn to_int(value: Option<Value>) -> Result<Value, EvalError> {
    match value {
        None => Ok(Value::Int(0)),
        Some(Value::Float(number)) => float_to_int(number).map(Value::Int),
        Some(Value::Str(text)) => text
            .trim()
            .replace('_', "")
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| {
                EvalError::value_error(format!(
                    "invalid literal for int() with base 10: {}",
                    Value::Str(text.clone()).repr()
                ))
            }),
        Some(other) => other.as_int().map(Value::Int).ok_or_else(|| {
            EvalError::type_error(format!(
                "int() argument must be a string, a bytes-like object or a real number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

fn float_to_int(number: f64) -> Result<i64, EvalError> {
    if number.is_nan() {
        return Err(EvalError::value_error("cannot convert float NaN to integer"));
    }
    if number.is_infinite() {
        return Err(EvalError::new(
            ErrorKind::Overflow,
            "cannot convert float infinity to integer",
        ));
    }
    let truncated = number.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(EvalError::overflow());
    }
    Ok(truncated as i64)
}

fn to_float(value: Option<Value>) -> Result<Value, EvalError> {
    match value {
        None => Ok(Value::Float(0.0)),
        Some(Value::Str(text)) => text.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            EvalError::value_error(format!(
                "could not convert string to float: {}",
                Value::Str(text.clone()).repr()
            ))
        }),
        Some(other) => other.as_float().map(Value::Float).ok_or_else(|| {
            EvalError::type_error(format!(
                "float() argument must be a string or a real number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

/// Round half to even; integral results without `ndigits`.
fn round(number: &Value, ndigits: Option<Value>) -> Result<Value, EvalError> {
    if !number.is_number() {
        return Err(EvalError::type_error(format!(
            "type {} doesn't define __round__ method",
            number.type_name()
        )));
    }
    let digits = match ndigits {
        None | Some(Value::None) => None,
        Some(value) => Some(int_arg(&value)?),
    };

    match (number, digits) {
        (Value::Float(value), None) => float_to_int(value.round_ties_even()).map(Value::Int),
        (Value::Float(value), Some(digits)) => {
            let digits = i32::try_from(digits.clamp(-400, 400)).unwrap_or(0);
            let factor = 10_f64.powi(digits);
            let rounded = (value * factor).round_ties_even() / factor;
            Ok(Value::Float(if rounded.is_finite() { rounded } else { *value }))
        }
        (other, Some(digits)) if digits < 0 => {
            let value = other.as_int().unwrap_or(0);
            let factor = 10_f64.powi(i32::try_from(-digits).unwrap_or(i32::MAX).min(400));
            let rounded = ((value as f64) / factor).round_ties_even() * factor;
            float_to_int(rounded).map(Value::Int)
        }
        (other, _) => Ok(Value::Int(other.as_int().unwrap_or(0))),
    }
}

fn modular_pow(base: &Value, exponent: &Value, modulus: &Value) -> Result<Value, EvalError> {
    let (Some(base), Some(exponent), Some(modulus)) =
        (base.as_int(), exponent.as_int(), modulus.as_int())
    else {
        return Err(EvalError::type_error(
            "pow() 3rd argument not allowed unless all arguments are integers",
        ));
    };
    if modulus == 0 {
        return Err(EvalError::value_error("pow() 3rd argument cannot be 0"));
    }
    if exponent < 0 {
        return Err(EvalError::value_error(
            "base is not invertible for the given modulus",
        ));
    }

    let modulus = i128::from(modulus);
    let mut result: i128 = 1;
    let mut base = i128::from(base).rem_euclid(modulus.abs());
    let mut exponent = exponent;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = (result * base).rem_euclid(modulus.abs());
        }
        base = (base * base).rem_euclid(modulus.abs());
        exponent >>= 1;
    }
    result = result.rem_euclid(modulus.abs());
    if modulus < 0 && result != 0 {
        result += modulus;
    }
    i64::try_from(result)
        .map(Value::Int)
        .map_err(|_| EvalError::overflow())
}

fn sum(iterable: &Value, start: Option<Value>) -> Result<Value, EvalError> {
    let start = start.unwrap_or(Value::Int(0));
    if matches!(start, Value::Str(_)) {
        return Err(EvalError::type_error(
            "sum() can't sum strings [use ''.join(seq) instead]",
        ));
    }
    iterate(Some(iterable.clone()))?
        .iter()
        .try_fold(start, |total, item| ops::binary(BinOp::Add, &total, item))
}

fn len(value: &Value) -> Result<Value, EvalError> {
    let count = match value {
        Value::Str(text) => text.chars().count(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        Value::Dict(entries) => entries.len(),
        other => {
            return Err(EvalError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )));
        }
    };
    i64::try_from(count)
        .map(Value::Int)
        .map_err(|_| EvalError::overflow())
}

/// Capitalize each run of letters.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    out
}

/// Non-strings pass through unchanged.
fn split(value: Value, separator: Option<Value>) -> Result<Value, EvalError> {
    let Value::Str(text) = value else {
        return Ok(value);
    };
    let parts: Vec<Value> = match separator {
        None | Some(Value::None) => text.split_whitespace().map(Value::str).collect(),
        Some(Value::Str(separator)) if separator.is_empty() => {
            return Err(EvalError::value_error("empty separator"));
        }
        Some(Value::Str(separator)) => text.split(separator.as_str()).map(Value::str).collect(),
        Some(other) => {
            return Err(EvalError::type_error(format!(
                "must be str or None, not {}",
                other.type_name()
            )));
        }
    };
    Ok(Value::List(parts))
}

/// Empty string unless given a sequence and a string delimiter.
fn join(items: &Value, delimiter: &Value) -> Result<Value, EvalError> {
    match (items, delimiter) {
        (Value::List(items) | Value::Tuple(items), Value::Str(delimiter)) => {
            Ok(Value::Str(join_strings(items)?.join(delimiter)))
        }
        _ => Ok(Value::str("")),
    }
}

fn concat(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Str(join_strings(args)?.concat()))
}

fn join_strings(items: &[Value]) -> Result<Vec<&str>, EvalError> {
    items
        .iter()
        .enumerate()
        .map(|(position, item)| match item {
            Value::Str(text) => Ok(text.as_str()),
            other => Err(EvalError::type_error(format!(
                "sequence item {position}: expected str instance, {} found",
                other.type_name()
            ))),
        })
        .collect()
}

fn date_part(value: Value, part: impl Fn(NaiveDate) -> i64) -> Value {
    match value {
        Value::Date(date) => Value::Int(part(date)),
        Value::DateTime(moment) => Value::Int(part(moment.date())),
        other => other,
    }
}

/// Seconds since the epoch, treating naive values as UTC.
fn timestamp(moment: NaiveDateTime) -> f64 {
    moment.and_utc().timestamp_micros() as f64 / 1_000_000.0
}

fn make_date(year: i64, month: i64, day: i64) -> Result<NaiveDate, EvalError> {
    let year = i32::try_from(year).ok();
    let month = u32::try_from(month).ok();
    let day = u32::try_from(day).ok();
    match (year, month, day) {
        (Some(year), Some(month), Some(day)) => NaiveDate::from_ymd_opt(year, month, day),
        _ => None,
    }
    .ok_or_else(|| EvalError::value_error("date components out of range"))
}

fn format_date(value: Value, format: Value) -> Result<Value, EvalError> {
    let temporal = match value {
        Value::Date(date) => Temporal::Date(date),
        Value::DateTime(moment) => Temporal::Timestamp(moment),
        Value::Time(time) => Temporal::Time(time),
        other => {
            return Err(EvalError::type_error(format!(
                "format_date() argument 1 must be a date, datetime or time, not '{}'",
                other.type_name()
            )));
        }
    };
    let format = expect_str(Builtin::FormatDate, 2, format)?;
    strftime(temporal, &format)
        .map(Value::Str)
        .map_err(|err| EvalError::value_error(err.to_string()))
}

/// Missing date parts default to 1900-01-01, missing time parts to midnight.
fn parse_date(text: &Value, format: &Value) -> Result<Value, EvalError> {
    let (Value::Str(text), Value::Str(format)) = (text, format) else {
        let offender = if matches!(text, Value::Str(_)) { format } else { text };
        return Err(EvalError::type_error(format!(
            "strptime() argument must be str, not {}",
            offender.type_name()
        )));
    };
    let parsed = NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| NaiveDate::parse_from_str(text, format).ok().map(midnight))
        .or_else(|| {
            let time = NaiveTime::parse_from_str(text, format).ok()?;
            NaiveDate::from_ymd_opt(1900, 1, 1).map(|date| date.and_time(time))
        });
    parsed.map(Value::DateTime).ok_or_else(|| {
        EvalError::value_error(format!(
            "time data '{text}' does not match format '{format}'"
        ))
    })
}

fn timedelta_pattern() -> Result<&'static Regex, EvalError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"(?:(?P<days>[+-]?\d+) days?, )?(?P<time>\d{1,2}:\d{1,2}:\d{1,2})")
        })
        .as_ref()
        .map_err(|err| EvalError::value_error(err.to_string()))
}

/// Parse `[±N day[s], ]H:MM:SS`.
pub fn parse_timedelta(value: &Value) -> Result<TimeDelta, EvalError> {
    let Value::Str(text) = value else {
        return Err(EvalError::type_error(format!(
            "expected string or bytes-like object, got '{}'",
            value.type_name()
        )));
    };
    let invalid = || EvalError::type_error(format!("Error: '{text}' is not a valid timedelta string"));
    let captures = timedelta_pattern()?.captures(text).ok_or_else(invalid)?;

    let days = match captures.name("days") {
        Some(days) => days.as_str().parse::<i64>().map_err(|_| invalid())?,
        None => 0,
    };
    let clock = captures.name("time").map(|time| time.as_str()).unwrap_or_default();
    let time = NaiveTime::parse_from_str(clock, "%H:%M:%S").map_err(|_| {
        EvalError::value_error(format!(
            "time data '{clock}' does not match format '%H:%M:%S'"
        ))
    })?;

    let seconds = i64::from(time.num_seconds_from_midnight());
    days.checked_mul(86_400)
        .and_then(|day_seconds| day_seconds.checked_add(seconds))
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(EvalError::overflow)
}

/// Deterministic FNV-1a over a canonical rendering.
fn hash(value: &Value) -> Result<Value, EvalError> {
    let key = hash_key(value)?;
    Ok(Value::Int(hash_seed(0, &key) as i64))
}

fn hash_key(value: &Value) -> Result<String, EvalError> {
    match value {
        Value::List(_) | Value::Dict(_) => Err(EvalError::type_error(format!(
            "unhashable type: '{}'",
            value.type_name()
        ))),
        Value::Tuple(items) => {
            let keys = items.iter().map(hash_key).collect::<Result<Vec<_>, _>>()?;
            Ok(format!("tuple:({})", keys.join(",")))
        }
        Value::Float(number) if number.fract() == 0.0 && number.abs() < 9.0e18 => {
            Ok(format!("int:{}", *number as i64))
        }
        other => match other.as_int() {
            Some(number) => Ok(format!("int:{number}")),
            None => Ok(format!("{}:{}", other.type_name(), other.repr())),
        },
    }
}

fn isinstance(value: &Value, class: &Value) -> Result<Value, EvalError> {
    let classes: Vec<&Value> = match class {
        Value::Tuple(items) => items.iter().collect(),
        other => vec![other],
    };
    let mut matched = false;
    for class in classes {
        let Value::Builtin(builtin) = class else {
            return Err(invalid_class());
        };
        if !builtin.is_type() {
            return Err(invalid_class());
        }
        matched |= instance_of(value, *builtin);
    }
    Ok(Value::Bool(matched))
}

fn invalid_class() -> EvalError {
    EvalError::type_error("isinstance() arg 2 must be a type, a tuple of types, or a union")
}

fn instance_of(value: &Value, class: Builtin) -> bool {
    match class {
        Builtin::Bool => matches!(value, Value::Bool(_)),
        Builtin::Int => matches!(value, Value::Int(_) | Value::Bool(_)),
        Builtin::Float => matches!(value, Value::Float(_)),
        Builtin::Str => matches!(value, Value::Str(_)),
        Builtin::List => matches!(value, Value::List(_)),
        Builtin::Tuple => matches!(value, Value::Tuple(_)),
        Builtin::Date => matches!(value, Value::Date(_) | Value::DateTime(_)),
        Builtin::Datetime => matches!(value, Value::DateTime(_)),
        _ => false,
    }
}

/// Items of an iterable value; absent means empty.
fn iterate(value: Option<Value>) -> Result<Vec<Value>, EvalError> {
    match value {
        None => Ok(Vec::new()),
        Some(Value::List(items) | Value::Tuple(items)) => Ok(items),
        Some(Value::Str(text)) => Ok(text.chars().map(|ch| Value::Str(ch.to_string())).collect()),
        Some(Value::Dict(entries)) => Ok(entries.into_keys().map(Value::Str).collect()),
        Some(other) => Err(EvalError::type_error(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}

fn range(args: &[Value]) -> Result<Value, EvalError> {
    let bounds = args.iter().map(int_arg).collect::<Result<Vec<_>, _>>()?;
    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        [] => {
            return Err(EvalError::type_error("range expected at least 1 argument, got 0"));
        }
        more => {
            return Err(EvalError::type_error(format!(
                "range expected at most 3 arguments, got {}",
                more.len()
            )));
        }
    };
    if step == 0 {
        return Err(EvalError::value_error("range() arg 3 must not be zero"));
    }

    let span = if step > 0 {
        i128::from(stop) - i128::from(start)
    } else {
        i128::from(start) - i128::from(stop)
    };
    let step_size = i128::from(step).abs();
    let count = if span <= 0 { 0 } else { (span + step_size - 1) / step_size };
    if count > i128::from(MAX_RANGE_LEN) {
        return Err(EvalError::new(ErrorKind::Overflow, "range() result is too large"));
    }

    let items = (0..count)
        .map(|index| Value::Int((i128::from(start) + index * i128::from(step)) as i64))
        .collect();
    Ok(Value::List(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(builtin: Builtin, args: Vec<Value>) -> Result<Value, EvalError> {
        let params = RequestParams::new();
        let now = NaiveDate::from_ymd_opt(2024, 6, 15)
            .map(midnight)
            .expect("valid date");
        builtin.call(args, Vec::new(), &CallScope { params: &params, now })
    }

    #[test]
    fn every_builtin_round_trips_its_name() {
        for name in Builtin::names() {
            let builtin = Builtin::from_name(name).expect("registered");
            assert_eq!(builtin.name(), name);
        }
        assert_eq!(Builtin::names().count(), 35);
    }

    #[test]
    fn age_counts_completed_years() {
        let born = |y, m, d| Value::Date(NaiveDate::from_ymd_opt(y, m, d).expect("valid"));
        assert_eq!(call(Builtin::Age, vec![born(2000, 6, 15)]), Ok(Value::Int(24)));
        assert_eq!(call(Builtin::Age, vec![born(2000, 6, 16)]), Ok(Value::Int(23)));
        let err = call(Builtin::Age, vec![Value::str("2000-01-01")]).expect_err("not a date");
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn date_accessors_pass_through_other_values() {
        assert_eq!(call(Builtin::Year, vec![Value::str("x")]), Ok(Value::str("x")));
        assert_eq!(call(Builtin::Time, vec![Value::Int(3)]), Ok(Value::Int(3)));
    }

    #[test]
    fn round_uses_bankers_rounding() {
        assert_eq!(call(Builtin::Round, vec![Value::Float(2.5)]), Ok(Value::Int(2)));
        assert_eq!(call(Builtin::Round, vec![Value::Float(3.5)]), Ok(Value::Int(4)));
        assert_eq!(
            call(Builtin::Round, vec![Value::Float(1.234), Value::Int(2)]),
            Ok(Value::Float(1.23))
        );
        assert_eq!(
            call(Builtin::Round, vec![Value::Int(1250), Value::Int(-2)]),
            Ok(Value::Int(1200))
        );
    }

    #[test]
    fn join_and_split_follow_their_fallbacks() {
        let items = Value::List(vec![Value::str("a"), Value::str("b")]);
        assert_eq!(call(Builtin::Join, vec![items.clone(), Value::str("-")]), Ok(Value::str("a-b")));
        assert_eq!(call(Builtin::Join, vec![items, Value::Int(1)]), Ok(Value::str("")));
        assert_eq!(call(Builtin::Split, vec![Value::Int(5), Value::str(",")]), Ok(Value::Int(5)));
        assert_eq!(
            call(Builtin::Split, vec![Value::str("a,b"), Value::str(",")]),
            Ok(Value::List(vec![Value::str("a"), Value::str("b")]))
        );
    }

    #[test]
    fn modular_pow_matches_signs() {
        assert_eq!(
            call(Builtin::Pow, vec![Value::Int(3), Value::Int(4), Value::Int(5)]),
            Ok(Value::Int(1))
        );
        assert_eq!(
            call(Builtin::Pow, vec![Value::Int(3), Value::Int(3), Value::Int(-5)]),
            Ok(Value::Int(-3))
        );
    }

    #[test]
    fn range_matches_python() {
        let ints = |values: &[i64]| Value::List(values.iter().copied().map(Value::Int).collect());
        assert_eq!(call(Builtin::Range, vec![Value::Int(3)]), Ok(ints(&[0, 1, 2])));
        assert_eq!(
            call(Builtin::Range, vec![Value::Int(5), Value::Int(0), Value::Int(-2)]),
            Ok(ints(&[5, 3, 1]))
        );
        assert!(call(Builtin::Range, vec![Value::Int(1), Value::Int(2), Value::Int(0)]).is_err());
    }

    #[test]
    fn hash_is_stable_and_numeric_equal_values_agree() {
        let first = call(Builtin::Hash, vec![Value::str("abc")]);
        assert_eq!(first, call(Builtin::Hash, vec![Value::str("abc")]));
        assert_eq!(
            call(Builtin::Hash, vec![Value::Int(1)]),
            call(Builtin::Hash, vec![Value::Float(1.0)])
        );
        assert!(call(Builtin::Hash, vec![Value::List(vec![])]).is_err());
    }

    #[test]
    fn unexpected_keywords_are_type_errors() {
        let params = RequestParams::new();
        let scope = CallScope {
            params: &params,
            now: NaiveDateTime::default(),
        };
        let err = Builtin::Upper
            .call(vec![], vec![("x".to_string(), Value::Int(1))], &scope)
            .expect_err("unknown keyword");
        assert_eq!(err.kind, ErrorKind::Type);
        assert!(err.message.contains("unexpected keyword argument 'x'"));
    }
}
