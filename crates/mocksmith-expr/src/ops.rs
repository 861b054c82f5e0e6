use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::ast::{BinOp, CmpOp, UnaryOp};
use crate::errors::{ErrorKind, EvalError};
use crate::value::Value;

/// Longest string or sequence that repetition may produce.
const MAX_REPEAT_LEN: usize = 10_000_000;

pub fn binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Add => add(left, right),
        BinOp::Sub => sub(left, right),
        BinOp::Mul => mul(left, right),
        BinOp::Div => div(left, right),
        BinOp::FloorDiv => floor_div(left, right),
        BinOp::Mod => modulo(left, right),
        BinOp::Pow => power(left, right),
    }
}

fn symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::FloorDiv => "//",
        BinOp::Mod => "%",
        BinOp::Pow => "** or pow()",
    }
}

fn unsupported(op: BinOp, left: &Value, right: &Value) -> EvalError {
    EvalError::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        symbol(op),
        left.type_name(),
        right.type_name()
    ))
}

fn out_of_range() -> EvalError {
    EvalError::new(ErrorKind::Overflow, "date value out of range")
}

fn add(left: &Value, right: &Value) -> Result<Value, EvalError> {
    let value = match (left, right) {
        (Value::Str(a), Value::Str(b)) => Value::Str(format!("{a}{b}")),
        (Value::List(a), Value::List(b)) => Value::List(a.iter().chain(b).cloned().collect()),
        (Value::Tuple(a), Value::Tuple(b)) => Value::Tuple(a.iter().chain(b).cloned().collect()),
        (Value::DateTime(moment), Value::TimeDelta(delta))
        | (Value::TimeDelta(delta), Value::DateTime(moment)) => Value::DateTime(
            moment
                .checked_add_signed(*delta)
                .ok_or_else(out_of_range)?,
        ),
        (Value::Date(date), Value::TimeDelta(delta))
        | (Value::TimeDelta(delta), Value::Date(date)) => Value::Date(shift_date(*date, *delta)?),
        (Value::TimeDelta(a), Value::TimeDelta(b)) => {
            Value::TimeDelta(a.checked_add(b).ok_or_else(EvalError::overflow)?)
        }
        (a, b) => numeric(BinOp::Add, a, b, i64::checked_add, |a, b| a + b)?,
    };
    Ok(value)
}

fn sub(left: &Value, right: &Value) -> Result<Value, EvalError> {
    let value = match (left, right) {
        (Value::DateTime(a), Value::DateTime(b)) => Value::TimeDelta(a.signed_duration_since(*b)),
        (Value::Date(a), Value::Date(b)) => Value::TimeDelta(a.signed_duration_since(*b)),
        (Value::DateTime(moment), Value::TimeDelta(delta)) => Value::DateTime(
            moment
                .checked_sub_signed(*delta)
                .ok_or_else(out_of_range)?,
        ),
        (Value::Date(date), Value::TimeDelta(delta)) => Value::Date(shift_date(*date, -*delta)?),
        (Value::TimeDelta(a), Value::TimeDelta(b)) => {
            Value::TimeDelta(a.checked_sub(b).ok_or_else(EvalError::overflow)?)
        }
        (a, b) => numeric(BinOp::Sub, a, b, i64::checked_sub, |a, b| a - b)?,
    };
    Ok(value)
}

fn mul(left: &Value, right: &Value) -> Result<Value, EvalError> {
    let value = match (left, right) {
        (Value::Str(text), count) | (count, Value::Str(text)) if is_int(count) => {
            Value::Str(text.repeat(repeat_count(text.chars().count(), count)?))
        }
        (Value::List(items), count) | (count, Value::List(items)) if is_int(count) => {
            Value::List(repeat_items(items, count)?)
        }
        (Value::Tuple(items), count) | (count, Value::Tuple(items)) if is_int(count) => {
            Value::Tuple(repeat_items(items, count)?)
        }
        (Value::TimeDelta(delta), count) | (count, Value::TimeDelta(delta)) if is_int(count) => {
            let factor = count
                .as_int()
                .and_then(|count| i32::try_from(count).ok())
                .ok_or_else(EvalError::overflow)?;
            Value::TimeDelta(delta.checked_mul(factor).ok_or_else(EvalError::overflow)?)
        }
        (a, b) => numeric(BinOp::Mul, a, b, i64::checked_mul, |a, b| a * b)?,
    };
    Ok(value)
}

fn div(left: &Value, right: &Value) -> Result<Value, EvalError> {
    let (Some(a), Some(b)) = (left.as_float(), right.as_float()) else {
        return Err(unsupported(BinOp::Div, left, right));
    };
    if b == 0.0 {
        return Err(EvalError::zero_division("division by zero"));
    }
    Ok(Value::Float(a / b))
}

fn floor_div(left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        if b == 0 {
            return Err(EvalError::zero_division("integer division or modulo by zero"));
        }
        let quotient = a.checked_div(b).ok_or_else(EvalError::overflow)?;
        let floored = if a % b != 0 && ((a < 0) != (b < 0)) {
            quotient - 1
        } else {
            quotient
        };
        return Ok(Value::Int(floored));
    }
    let (Some(a), Some(b)) = (left.as_float(), right.as_float()) else {
        return Err(unsupported(BinOp::FloorDiv, left, right));
    };
    if b == 0.0 {
        return Err(EvalError::zero_division("float floor division by zero"));
    }
    Ok(Value::Float((a / b).floor()))
}

fn modulo(left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        if b == 0 {
            return Err(EvalError::zero_division("integer division or modulo by zero"));
        }
        let remainder = a.checked_rem(b).ok_or_else(EvalError::overflow)?;
        let adjusted = if remainder != 0 && ((remainder < 0) != (b < 0)) {
            remainder + b
        } else {
            remainder
        };
        return Ok(Value::Int(adjusted));
    }
    let (Some(a), Some(b)) = (left.as_float(), right.as_float()) else {
        return Err(unsupported(BinOp::Mod, left, right));
    };
    if b == 0.0 {
        return Err(EvalError::zero_division("float modulo"));
    }
    let remainder = a % b;
    let adjusted = if remainder != 0.0 && ((remainder < 0.0) != (b < 0.0)) {
        remainder + b
    } else {
        remainder
    };
    Ok(Value::Float(adjusted))
}

/// `**` and two-argument `pow()`.
pub fn power(base: &Value, exponent: &Value) -> Result<Value, EvalError> {
    if let (Some(a), Some(b)) = (base.as_int(), exponent.as_int()) {
        if b >= 0 {
            let exponent = u32::try_from(b).map_err(|_| EvalError::overflow())?;
            return a
                .checked_pow(exponent)
                .map(Value::Int)
                .ok_or_else(EvalError::overflow);
        }
        if a == 0 {
            return Err(EvalError::zero_division(
                "0.0 cannot be raised to a negative power",
            ));
        }
        return Ok(Value::Float((a as f64).powf(b as f64)));
    }
    let (Some(a), Some(b)) = (base.as_float(), exponent.as_float()) else {
        return Err(unsupported(BinOp::Pow, base, exponent));
    };
    if a == 0.0 && b < 0.0 {
        return Err(EvalError::zero_division(
            "0.0 cannot be raised to a negative power",
        ));
    }
    let result = a.powf(b);
    if result.is_nan() && !a.is_nan() && !b.is_nan() {
        return Err(EvalError::value_error("math domain error"));
    }
    Ok(Value::Float(result))
}

fn numeric(
    op: BinOp,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return int_op(a, b).map(Value::Int).ok_or_else(EvalError::overflow);
    }
    match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
        _ => Err(unsupported(op, left, right)),
    }
}

fn is_int(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Bool(_))
}

fn repeat_count(unit: usize, count: &Value) -> Result<usize, EvalError> {
    let count = usize::try_from(count.as_int().unwrap_or(0).max(0)).map_err(|_| EvalError::overflow())?;
    if unit.saturating_mul(count) > MAX_REPEAT_LEN {
        return Err(EvalError::new(ErrorKind::Overflow, "repeated value is too long"));
    }
    Ok(count)
}

fn repeat_items(items: &[Value], count: &Value) -> Result<Vec<Value>, EvalError> {
    let count = repeat_count(items.len(), count)?;
    Ok(items
        .iter()
        .cloned()
        .cycle()
        .take(items.len() * count)
        .collect())
}

/// Date arithmetic only uses whole days of the delta.
fn shift_date(date: NaiveDate, delta: TimeDelta) -> Result<NaiveDate, EvalError> {
    let days = delta.num_seconds().div_euclid(86_400);
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(out_of_range)
}

pub fn unary(op: UnaryOp, operand: &Value) -> Result<Value, EvalError> {
    let value = match (op, operand) {
        (UnaryOp::Neg, Value::Float(value)) => Value::Float(-value),
        (UnaryOp::Pos, Value::Float(value)) => Value::Float(*value),
        (UnaryOp::Neg, Value::TimeDelta(delta)) => Value::TimeDelta(-*delta),
        (UnaryOp::Pos, Value::TimeDelta(delta)) => Value::TimeDelta(*delta),
        (UnaryOp::Neg, value) if is_int(value) => Value::Int(
            value
                .as_int()
                .and_then(i64::checked_neg)
                .ok_or_else(EvalError::overflow)?,
        ),
        (UnaryOp::Pos, value) if is_int(value) => Value::Int(value.as_int().unwrap_or(0)),
        (op, value) => {
            let symbol = if op == UnaryOp::Neg { "-" } else { "+" };
            return Err(EvalError::type_error(format!(
                "bad operand type for unary {symbol}: '{}'",
                value.type_name()
            )));
        }
    };
    Ok(value)
}

pub fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    let symbol = match op {
        CmpOp::Eq => return Ok(left.equals(right)),
        CmpOp::NotEq => return Ok(!left.equals(right)),
        CmpOp::In => return contains(right, left),
        CmpOp::NotIn => return contains(right, left).map(|found| !found),
        CmpOp::Is => return Ok(identical(left, right)),
        CmpOp::IsNot => return Ok(!identical(left, right)),
        CmpOp::Lt => "<",
        CmpOp::Le => "<=",
        CmpOp::Gt => ">",
        CmpOp::Ge => ">=",
    };
    let ordering = left.compare(right).ok_or_else(|| {
        EvalError::type_error(format!(
            "'{symbol}' not supported between instances of '{}' and '{}'",
            left.type_name(),
            right.type_name()
        ))
    })?;
    Ok(match op {
        CmpOp::Lt => ordering.is_lt(),
        CmpOp::Le => ordering.is_le(),
        CmpOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    })
}

/// Identity holds for the singletons only.
fn identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Builtin(a), Value::Builtin(b)) => a == b,
        _ => false,
    }
}

pub fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match container {
        Value::Str(text) => match item {
            Value::Str(needle) => Ok(text.contains(needle.as_str())),
            other => Err(EvalError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) | Value::Tuple(items) => Ok(items.iter().any(|value| value.equals(item))),
        Value::Dict(entries) => Ok(match item {
            Value::Str(key) => entries.contains_key(key),
            _ => false,
        }),
        other => Err(EvalError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

/// `value[index]`.
pub fn index(value: &Value, index: &Value) -> Result<Value, EvalError> {
    match value {
        Value::List(items) | Value::Tuple(items) => {
            let position = sequence_position(value, items.len(), index)?;
            Ok(items[position].clone())
        }
        Value::Str(text) => {
            let chars: Vec<char> = text.chars().collect();
            let position = sequence_position(value, chars.len(), index)?;
            Ok(Value::Str(chars[position].to_string()))
        }
        Value::Dict(entries) => {
            let found = match index {
                Value::Str(key) => entries.get(key),
                _ => None,
            };
            found
                .cloned()
                .ok_or_else(|| EvalError::new(ErrorKind::Key, index.repr()))
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn sequence_position(value: &Value, len: usize, index: &Value) -> Result<usize, EvalError> {
    let kind = match value {
        Value::Str(_) => "string",
        other => other.type_name(),
    };
    let raw = index.as_int().ok_or_else(|| {
        EvalError::type_error(format!(
            "{kind} indices must be integers or slices, not {}",
            index.type_name()
        ))
    })?;
    let len = i64::try_from(len).map_err(|_| EvalError::overflow())?;
    let position = if raw < 0 { raw + len } else { raw };
    if position < 0 || position >= len {
        return Err(EvalError::new(
            ErrorKind::Index,
            format!("{kind} index out of range"),
        ));
    }
    usize::try_from(position).map_err(|_| EvalError::overflow())
}

/// `value[lower:upper]` with clamped bounds.
pub fn slice(value: &Value, lower: Option<&Value>, upper: Option<&Value>) -> Result<Value, EvalError> {
    let len = match value {
        Value::List(items) | Value::Tuple(items) => items.len(),
        Value::Str(text) => text.chars().count(),
        other => {
            return Err(EvalError::type_error(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            )));
        }
    };
    let start = slice_bound(lower, len, 0)?;
    let end = slice_bound(upper, len, len)?.max(start);
    Ok(match value {
        Value::List(items) => Value::List(items[start..end].to_vec()),
        Value::Tuple(items) => Value::Tuple(items[start..end].to_vec()),
        Value::Str(text) => Value::Str(text.chars().skip(start).take(end - start).collect()),
        _ => Value::None,
    })
}

fn slice_bound(bound: Option<&Value>, len: usize, default: usize) -> Result<usize, EvalError> {
    let raw = match bound {
        None | Some(Value::None) => return Ok(default),
        Some(value) => value.as_int().ok_or_else(|| {
            EvalError::type_error(
                "slice indices must be integers or None or have an __index__ method",
            )
        })?,
    };
    let len = i64::try_from(len).map_err(|_| EvalError::overflow())?;
    let position = if raw < 0 { (raw + len).max(0) } else { raw.min(len) };
    usize::try_from(position).map_err(|_| EvalError::overflow())
}

/// Naive datetime at midnight of `date`.
pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_division_and_modulo_round_towards_negative_infinity() {
        assert_eq!(binary(BinOp::FloorDiv, &Value::Int(-7), &Value::Int(2)), Ok(Value::Int(-4)));
        assert_eq!(binary(BinOp::Mod, &Value::Int(-7), &Value::Int(2)), Ok(Value::Int(1)));
        assert_eq!(binary(BinOp::Mod, &Value::Int(7), &Value::Int(-2)), Ok(Value::Int(-1)));
        assert_eq!(
            binary(BinOp::Div, &Value::Int(1), &Value::Int(0)).map_err(|err| err.kind),
            Err(ErrorKind::ZeroDivision)
        );
    }

    #[test]
    fn integer_overflow_is_reported() {
        let result = binary(BinOp::Add, &Value::Int(i64::MAX), &Value::Int(1));
        assert_eq!(result.map_err(|err| err.kind), Err(ErrorKind::Overflow));
    }

    #[test]
    fn negative_indices_and_clamped_slices() {
        let text = Value::str("hello");
        assert_eq!(index(&text, &Value::Int(-1)), Ok(Value::str("o")));
        assert_eq!(
            slice(&text, Some(&Value::Int(1)), Some(&Value::Int(100))),
            Ok(Value::str("ello"))
        );
        assert_eq!(slice(&text, Some(&Value::Int(4)), Some(&Value::Int(2))), Ok(Value::str("")));
        assert_eq!(
            index(&Value::List(vec![]), &Value::Int(0)).map_err(|err| err.kind),
            Err(ErrorKind::Index)
        );
    }

    #[test]
    fn strings_repeat_and_concatenate() {
        assert_eq!(
            binary(BinOp::Mul, &Value::str("ab"), &Value::Int(3)),
            Ok(Value::str("ababab"))
        );
        assert_eq!(
            binary(BinOp::Add, &Value::str("a"), &Value::str("b")),
            Ok(Value::str("ab"))
        );
        assert!(binary(BinOp::Add, &Value::str("a"), &Value::Int(1)).is_err());
    }
}
