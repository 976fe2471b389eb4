//! The operator value algebra.
//!
//! Pure helpers over [`Value`] pairs backing the symbolic builtin words:
//! - Arithmetic: +, -, *, /, //, %, **, ++, --, negate
//! - Bitwise: ~, &, |, ^, <<, >>
//! - Comparison: ==, !=, <, <=, >, >=
//!
//! Arithmetic follows the source language's conventions: ints and floats
//! promote, `+` concatenates strings/lists/tuples, `*` repeats strings and
//! lists by an integer count, `/` always yields a float, `//` floors, and
//! `%` takes the sign of the divisor.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::value::Value;

fn incompatible(op: &str, left: &Value, right: &Value) -> Error {
    Error::type_mismatch(
        format!("compatible types for {op}"),
        format!("{} and {}", left.type_name(), right.type_name()),
    )
}

fn number(op: &str, value: &Value) -> Result<f64> {
    value
        .as_float()
        .ok_or_else(|| Error::type_mismatch(format!("number for {op}"), value.type_name()))
}

fn integer(op: &str, value: &Value) -> Result<i64> {
    value
        .as_int()
        .ok_or_else(|| Error::type_mismatch(format!("integer for {op}"), value.type_name()))
}

/// Integer/float promoting binary helper.
fn numeric_binop(
    op: &str,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
        _ => Ok(Value::Float(float_op(number(op, left)?, number(op, right)?))),
    }
}

fn int_binop(op: &str, left: &Value, right: &Value, f: fn(i64, i64) -> i64) -> Result<Value> {
    Ok(Value::Int(f(integer(op, left)?, integer(op, right)?)))
}

pub fn add(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        (Value::Tuple(a), Value::Tuple(b)) => {
            let mut items = a.as_ref().clone();
            items.extend(b.iter().cloned());
            Ok(Value::Tuple(Rc::new(items)))
        }
        _ if left.as_float().is_some() && right.as_float().is_some() => {
            numeric_binop("+", left, right, |a, b| a.wrapping_add(b), |a, b| a + b)
        }
        _ => Err(incompatible("+", left, right)),
    }
}

pub fn sub(left: &Value, right: &Value) -> Result<Value> {
    if left.as_float().is_none() || right.as_float().is_none() {
        return Err(incompatible("-", left, right));
    }
    numeric_binop("-", left, right, |a, b| a.wrapping_sub(b), |a, b| a - b)
}

pub fn mul(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
            Ok(Value::Str(if *n <= 0 {
                String::new()
            } else {
                s.repeat(*n as usize)
            }))
        }
        (Value::List(l), Value::Int(n)) | (Value::Int(n), Value::List(l)) => {
            let mut items = Vec::new();
            for _ in 0..(*n).max(0) {
                items.extend(l.borrow().iter().cloned());
            }
            Ok(Value::list(items))
        }
        _ if left.as_float().is_some() && right.as_float().is_some() => {
            numeric_binop("*", left, right, |a, b| a.wrapping_mul(b), |a, b| a * b)
        }
        _ => Err(incompatible("*", left, right)),
    }
}

pub fn div(left: &Value, right: &Value) -> Result<Value> {
    let a = number("/", left)?;
    let b = number("/", right)?;
    if b == 0.0 {
        return Err(Error::DivisionByZero);
    }
    Ok(Value::Float(a / b))
}

pub fn floor_div(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Int(_), Value::Int(0)) => Err(Error::DivisionByZero),
        (Value::Int(a), Value::Int(b)) => {
            let q = a.wrapping_div(*b);
            let r = a.wrapping_rem(*b);
            let q = if r != 0 && (r < 0) != (*b < 0) { q - 1 } else { q };
            Ok(Value::Int(q))
        }
        _ => {
            let a = number("//", left)?;
            let b = number("//", right)?;
            if b == 0.0 {
                return Err(Error::DivisionByZero);
            }
            Ok(Value::Float((a / b).floor()))
        }
    }
}

pub fn modulo(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Int(_), Value::Int(0)) => Err(Error::DivisionByZero),
        (Value::Int(a), Value::Int(b)) => {
            Ok(Value::Int(a.wrapping_rem(*b).wrapping_add(*b).wrapping_rem(*b)))
        }
        _ => {
            let a = number("%", left)?;
            let b = number("%", right)?;
            if b == 0.0 {
                return Err(Error::DivisionByZero);
            }
            Ok(Value::Float(a - b * (a / b).floor()))
        }
    }
}

pub fn pow(left: &Value, right: &Value) -> Result<Value> {
    let a = number("**", left)?;
    let b = number("**", right)?;
    let result = a.powf(b);
    // Integer bases and exponents narrow back to Int when the result is
    // integral and in range.
    if matches!(left, Value::Int(_))
        && matches!(right, Value::Int(_))
        && result.fract() == 0.0
        && result >= i64::MIN as f64
        && result <= i64::MAX as f64
    {
        Ok(Value::Int(result as i64))
    } else {
        Ok(Value::Float(result))
    }
}

pub fn negate(value: &Value) -> Result<Value> {
    match value {
        Value::Int(i) => Ok(Value::Int(-i)),
        Value::Float(f) => Ok(Value::Float(-f)),
        Value::Bool(b) => Ok(Value::Int(-i64::from(*b))),
        _ => Err(Error::type_mismatch("number", value.type_name())),
    }
}

pub fn increment(value: &Value) -> Result<Value> {
    match value {
        Value::Int(i) => Ok(Value::Int(i.wrapping_add(1))),
        Value::Float(f) => Ok(Value::Float(f + 1.0)),
        _ => Err(Error::type_mismatch("number", value.type_name())),
    }
}

pub fn decrement(value: &Value) -> Result<Value> {
    match value {
        Value::Int(i) => Ok(Value::Int(i.wrapping_sub(1))),
        Value::Float(f) => Ok(Value::Float(f - 1.0)),
        _ => Err(Error::type_mismatch("number", value.type_name())),
    }
}

pub fn bit_not(value: &Value) -> Result<Value> {
    Ok(Value::Int(!integer("~", value)?))
}

pub fn bit_and(left: &Value, right: &Value) -> Result<Value> {
    int_binop("&", left, right, |a, b| a & b)
}

pub fn bit_or(left: &Value, right: &Value) -> Result<Value> {
    int_binop("|", left, right, |a, b| a | b)
}

pub fn bit_xor(left: &Value, right: &Value) -> Result<Value> {
    int_binop("^", left, right, |a, b| a ^ b)
}

pub fn shl(left: &Value, right: &Value) -> Result<Value> {
    int_binop("<<", left, right, |a, b| a.wrapping_shl(b as u32))
}

pub fn shr(left: &Value, right: &Value) -> Result<Value> {
    int_binop(">>", left, right, |a, b| a.wrapping_shr(b as u32))
}

/// Total-order comparison for the orderable subset: numbers with numbers,
/// strings with strings, lists/tuples lexicographically.
pub fn compare(left: &Value, right: &Value) -> Result<Ordering> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::List(a), Value::List(b)) => compare_seq(&a.borrow(), &b.borrow()),
        (Value::Tuple(a), Value::Tuple(b)) => compare_seq(a, b),
        _ => {
            let (Some(a), Some(b)) = (left.as_float(), right.as_float()) else {
                return Err(Error::type_mismatch(
                    "comparable types",
                    format!("{} and {}", left.type_name(), right.type_name()),
                ));
            };
            a.partial_cmp(&b).ok_or_else(|| {
                Error::type_mismatch("comparable numbers", "NaN".to_string())
            })
        }
    }
}

fn compare_seq(a: &[Value], b: &[Value]) -> Result<Ordering> {
    for (x, y) in a.iter().zip(b.iter()) {
        if x == y {
            continue;
        }
        return compare(x, y);
    }
    Ok(a.len().cmp(&b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_div_floors_toward_negative_infinity() {
        assert_eq!(
            floor_div(&Value::Int(-7), &Value::Int(2)).unwrap(),
            Value::Int(-4)
        );
        assert_eq!(
            floor_div(&Value::Int(7), &Value::Int(2)).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            floor_div(&Value::Int(-7), &Value::Int(-2)).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn modulo_takes_the_divisor_sign() {
        assert_eq!(
            modulo(&Value::Int(-7), &Value::Int(2)).unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            modulo(&Value::Int(7), &Value::Int(-2)).unwrap(),
            Value::Int(-1)
        );
    }

    #[test]
    fn pow_narrows_back_to_int() {
        assert_eq!(pow(&Value::Int(2), &Value::Int(8)).unwrap(), Value::Int(256));
        assert_eq!(
            pow(&Value::Int(2), &Value::Int(-1)).unwrap(),
            Value::Float(0.5)
        );
    }

    #[test]
    fn add_concatenates_sequences() {
        let result = add(
            &Value::list(vec![Value::Int(1)]),
            &Value::list(vec![Value::Int(2)]),
        )
        .unwrap();
        assert_eq!(result, Value::list(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(
            add(&Value::from("ab"), &Value::from("cd")).unwrap(),
            Value::from("abcd")
        );
    }

    #[test]
    fn comparisons_are_lexicographic_for_sequences() {
        let a = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::list(vec![Value::Int(1), Value::Int(3)]);
        assert_eq!(compare(&a, &b).unwrap(), Ordering::Less);
    }
}
