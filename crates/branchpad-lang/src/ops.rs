//! Operators over Pad values
//!
//! Booleans behave as the integers 0 and 1 in arithmetic. Integer
//! arithmetic is checked; results outside `i64` raise `OverflowError`.

use crate::ast::{BinOp, CmpOp, UnOp};
use crate::error::{PadError, PadResult};
use branchpad_core::Value;
use im::Vector;
use std::cmp::Ordering;

/// A value viewed as a number
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    pub(crate) fn into_value(self) -> Value {
        match self {
            Self::Int(i) => Value::Int(i),
            Self::Float(f) => Value::Float(f),
        }
    }
}

pub(crate) fn as_num(value: &Value) -> Option<Num> {
    match value {
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

fn overflow() -> PadError {
    PadError::Overflow("integer result out of range".to_string())
}

fn unsupported(op: &str, lhs: &Value, rhs: &Value) -> PadError {
    PadError::Type(format!(
        "unsupported operand type(s) for {op}: '{}' and '{}'",
        lhs.type_name(),
        rhs.type_name()
    ))
}

/// Python-style floor division on integers
fn floor_div(a: i64, b: i64) -> PadResult<i64> {
    let q = a.checked_div(b).ok_or_else(overflow)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

/// Python-style modulo on integers: the result takes the divisor's sign
fn floor_mod(a: i64, b: i64) -> PadResult<i64> {
    let r = a.checked_rem(b).ok_or_else(overflow)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

fn repeat<T: Clone>(items: &[T], times: i64, max_len: usize) -> PadResult<Vec<T>> {
    let times = usize::try_from(times.max(0)).map_err(|_| overflow())?;
    let len = items.len().checked_mul(times).ok_or_else(overflow)?;
    if len > max_len {
        return Err(PadError::Memory(format!(
            "repeated sequence of {len} items exceeds the limit of {max_len}"
        )));
    }
    let mut out = Vec::with_capacity(len);
    for _ in 0..times {
        out.extend_from_slice(items);
    }
    Ok(out)
}

fn repeat_count(n: &Value) -> i64 {
    match as_num(n) {
        Some(Num::Int(i)) => i,
        _ => 0,
    }
}

fn numeric(op: BinOp, a: Num, b: Num) -> PadResult<Value> {
    if let (Num::Int(x), Num::Int(y)) = (a, b) {
        let result = match op {
            BinOp::Add => x.checked_add(y).ok_or_else(overflow)?,
            BinOp::Sub => x.checked_sub(y).ok_or_else(overflow)?,
            BinOp::Mul => x.checked_mul(y).ok_or_else(overflow)?,
            BinOp::Div => {
                if y == 0 {
                    return Err(PadError::ZeroDivision("division by zero".to_string()));
                }
                return Ok(Value::Float(a.as_f64() / b.as_f64()));
            }
            BinOp::FloorDiv => {
                if y == 0 {
                    return Err(PadError::ZeroDivision(
                        "integer division or modulo by zero".to_string(),
                    ));
                }
                floor_div(x, y)?
            }
            BinOp::Mod => {
                if y == 0 {
                    return Err(PadError::ZeroDivision(
                        "integer modulo by zero".to_string(),
                    ));
                }
                floor_mod(x, y)?
            }
        };
        return Ok(Value::Int(result));
    }

    let (x, y) = (a.as_f64(), b.as_f64());
    let result = match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div => {
            if y == 0.0 {
                return Err(PadError::ZeroDivision("float division by zero".to_string()));
            }
            x / y
        }
        BinOp::FloorDiv => {
            if y == 0.0 {
                return Err(PadError::ZeroDivision(
                    "float floor division by zero".to_string(),
                ));
            }
            (x / y).floor()
        }
        BinOp::Mod => {
            if y == 0.0 {
                return Err(PadError::ZeroDivision("float modulo".to_string()));
            }
            x - y * (x / y).floor()
        }
    };
    Ok(Value::Float(result))
}

/// Apply a binary arithmetic operator
///
/// Repetition (`"ab" * n`, `[x] * n`) may build at most `max_len` items.
pub(crate) fn binary(op: BinOp, lhs: &Value, rhs: &Value, max_len: usize) -> PadResult<Value> {
    if let (Some(a), Some(b)) = (as_num(lhs), as_num(rhs)) {
        return numeric(op, a, b);
    }
    match (op, lhs, rhs) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            let mut joined = a.clone();
            joined.append(b.clone());
            Ok(Value::List(joined))
        }
        (BinOp::Mul, Value::Str(s), n) | (BinOp::Mul, n, Value::Str(s))
            if matches!(n, Value::Int(_) | Value::Bool(_)) =>
        {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::Str(repeat(&chars, repeat_count(n), max_len)?.into_iter().collect()))
        }
        (BinOp::Mul, Value::List(items), n) | (BinOp::Mul, n, Value::List(items))
            if matches!(n, Value::Int(_) | Value::Bool(_)) =>
        {
            let items: Vec<Value> = items.iter().cloned().collect();
            Ok(Value::List(repeat(&items, repeat_count(n), max_len)?.into_iter().collect()))
        }
        _ => Err(unsupported(op.symbol(), lhs, rhs)),
    }
}

/// Apply a unary operator
pub(crate) fn unary(op: UnOp, operand: &Value) -> PadResult<Value> {
    match op {
        UnOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnOp::Pos => match as_num(operand) {
            Some(n) => Ok(n.into_value()),
            None => Err(PadError::Type(format!(
                "bad operand type for unary +: '{}'",
                operand.type_name()
            ))),
        },
        UnOp::Neg => match as_num(operand) {
            Some(Num::Int(i)) => i.checked_neg().map(Value::Int).ok_or_else(overflow),
            Some(Num::Float(f)) => Ok(Value::Float(-f)),
            None => Err(PadError::Type(format!(
                "bad operand type for unary -: '{}'",
                operand.type_name()
            ))),
        },
    }
}

/// Structural equality; numbers compare by value across int and float
pub(crate) fn equals(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| equals(x, y))
        }
        _ => match (as_num(lhs), as_num(rhs)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
            (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
            _ => lhs == rhs,
        },
    }
}

/// Ordering for `<`-style comparisons; `None` for unordered floats
pub(crate) fn ordering(op: CmpOp, lhs: &Value, rhs: &Value) -> PadResult<Option<Ordering>> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                if equals(x, y) {
                    continue;
                }
                return ordering(op, x, y);
            }
            Ok(Some(a.len().cmp(&b.len())))
        }
        _ => match (as_num(lhs), as_num(rhs)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(Some(a.cmp(&b))),
            (Some(a), Some(b)) => Ok(a.as_f64().partial_cmp(&b.as_f64())),
            _ => Err(PadError::Type(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                op.symbol(),
                lhs.type_name(),
                rhs.type_name()
            ))),
        },
    }
}

/// Evaluate one comparison
pub(crate) fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> PadResult<bool> {
    Ok(match op {
        CmpOp::Eq => equals(lhs, rhs),
        CmpOp::Ne => !equals(lhs, rhs),
        CmpOp::Lt => ordering(op, lhs, rhs)?.is_some_and(Ordering::is_lt),
        CmpOp::Le => ordering(op, lhs, rhs)?.is_some_and(Ordering::is_le),
        CmpOp::Gt => ordering(op, lhs, rhs)?.is_some_and(Ordering::is_gt),
        CmpOp::Ge => ordering(op, lhs, rhs)?.is_some_and(Ordering::is_ge),
    })
}

/// `object[index]` for lists and strings, negative indices count from the end
pub(crate) fn index(object: &Value, index: &Value) -> PadResult<Value> {
    let Some(Num::Int(i)) = as_num(index) else {
        return Err(PadError::Type(format!(
            "indices must be integers, not {}",
            index.type_name()
        )));
    };
    let resolve = |len: usize| -> Option<usize> {
        let len = i64::try_from(len).ok()?;
        let pos = if i < 0 { len + i } else { i };
        (0..len).contains(&pos).then(|| usize::try_from(pos).ok()).flatten()
    };
    match object {
        Value::List(items) => resolve(items.len())
            .and_then(|pos| items.get(pos).cloned())
            .ok_or_else(|| PadError::Index("list index out of range".to_string())),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            resolve(chars.len())
                .map(|pos| Value::Str(chars[pos].to_string()))
                .ok_or_else(|| PadError::Index("string index out of range".to_string()))
        }
        other => Err(PadError::Type(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Build a list value
pub(crate) fn list(items: impl IntoIterator<Item = Value>) -> Value {
    Value::List(items.into_iter().collect::<Vector<Value>>())
}
