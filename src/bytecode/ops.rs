//! Operator semantics for the arithmetic, bitwise, comparison and logical
//! opcodes. Each function takes its operands by value and returns the result
//! the VM pushes.

use std::cmp::Ordering;

use crate::bytecode::vm::VmResult;
use crate::error::RuntimeError;
use crate::value::{cmp_int_float, is_integral_float, Value};

/// Operand pair after numeric promotion.
enum Numbers {
    Ints(i64, i64),
    Floats(f64, f64),
}

fn numbers(a: &Value, b: &Value) -> Option<Numbers> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(Numbers::Ints(*x, *y)),
        (Value::Float(x), Value::Float(y)) => Some(Numbers::Floats(*x, *y)),
        (Value::Int(x), Value::Float(y)) => Some(Numbers::Floats(*x as f64, *y)),
        (Value::Float(x), Value::Int(y)) => Some(Numbers::Floats(*x, *y as f64)),
        _ => None,
    }
}

fn unsupported(op: &str, a: &Value, b: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "unsupported operand types for {}: '{}' and '{}'",
        op,
        a.type_name(),
        b.type_name()
    ))
}

fn bad_unary(op: &str, value: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "bad operand type for unary {}: '{}'",
        op,
        value.type_name()
    ))
}

pub fn add(a: Value, b: Value) -> VmResult<Value> {
    if let (Value::Str(x), Value::Str(y)) = (&a, &b) {
        let mut joined = String::with_capacity(x.len() + y.len());
        joined.push_str(x);
        joined.push_str(y);
        return Ok(Value::Str(joined));
    }
    match numbers(&a, &b) {
        Some(Numbers::Ints(x, y)) => Ok(Value::Int(x.wrapping_add(y))),
        Some(Numbers::Floats(x, y)) => Ok(Value::Float(x + y)),
        None => Err(unsupported("+", &a, &b)),
    }
}

pub fn subtract(a: Value, b: Value) -> VmResult<Value> {
    match numbers(&a, &b) {
        Some(Numbers::Ints(x, y)) => Ok(Value::Int(x.wrapping_sub(y))),
        Some(Numbers::Floats(x, y)) => Ok(Value::Float(x - y)),
        None => Err(unsupported("-", &a, &b)),
    }
}

pub fn multiply(a: Value, b: Value) -> VmResult<Value> {
    match numbers(&a, &b) {
        Some(Numbers::Ints(x, y)) => Ok(Value::Int(x.wrapping_mul(y))),
        Some(Numbers::Floats(x, y)) => Ok(Value::Float(x * y)),
        None => Err(unsupported("*", &a, &b)),
    }
}

/// True division; always produces a float.
pub fn divide(a: Value, b: Value) -> VmResult<Value> {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => Ok(Value::Float(x / y)),
        _ => Err(unsupported("/", &a, &b)),
    }
}

/// Floor division; always produces an int.
pub fn idivide(a: Value, b: Value) -> VmResult<Value> {
    match numbers(&a, &b) {
        Some(Numbers::Ints(_, 0)) => Err(RuntimeError::DivisionByZero),
        Some(Numbers::Ints(x, y)) => {
            let quotient = x.wrapping_div(y);
            if x.wrapping_rem(y) != 0 && ((x < 0) != (y < 0)) {
                Ok(Value::Int(quotient - 1))
            } else {
                Ok(Value::Int(quotient))
            }
        }
        Some(Numbers::Floats(_, y)) if y == 0.0 => Err(RuntimeError::DivisionByZero),
        Some(Numbers::Floats(x, y)) => {
            let quotient = (x / y).floor();
            is_integral_float(quotient).map(Value::Int).ok_or_else(|| {
                RuntimeError::type_error(format!(
                    "result of \\ is not representable as int: {}",
                    quotient
                ))
            })
        }
        None => Err(unsupported("\\", &a, &b)),
    }
}

/// Floored modulo: the result takes the sign of the divisor.
pub fn modulo(a: Value, b: Value) -> VmResult<Value> {
    match numbers(&a, &b) {
        Some(Numbers::Ints(_, 0)) => Err(RuntimeError::DivisionByZero),
        Some(Numbers::Ints(x, y)) => {
            let rem = x.wrapping_rem(y);
            if rem != 0 && ((rem < 0) != (y < 0)) {
                Ok(Value::Int(rem + y))
            } else {
                Ok(Value::Int(rem))
            }
        }
        Some(Numbers::Floats(x, y)) => {
            let rem = x % y;
            if rem != 0.0 && ((rem < 0.0) != (y < 0.0)) {
                Ok(Value::Float(rem + y))
            } else {
                Ok(Value::Float(rem))
            }
        }
        None => Err(unsupported("%", &a, &b)),
    }
}

pub fn exponentiate(a: Value, b: Value) -> VmResult<Value> {
    match numbers(&a, &b) {
        Some(Numbers::Ints(x, y)) => {
            let exact = u32::try_from(y).ok().and_then(|exp| x.checked_pow(exp));
            match exact {
                Some(n) => Ok(Value::Int(n)),
                None => Ok(Value::Float((x as f64).powf(y as f64))),
            }
        }
        Some(Numbers::Floats(x, y)) => Ok(Value::Float(x.powf(y))),
        None => Err(unsupported("**", &a, &b)),
    }
}

fn integers(op: &str, a: &Value, b: &Value) -> VmResult<(i64, i64)> {
    match (a.as_integer(), b.as_integer()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(unsupported(op, a, b)),
    }
}

fn shift_count(op: &str, count: i64) -> VmResult<u32> {
    if (0..64).contains(&count) {
        Ok(count as u32)
    } else {
        Err(RuntimeError::invalid_operand(format!(
            "shift count {} out of range for {}",
            count, op
        )))
    }
}

pub fn shift_left(a: Value, b: Value) -> VmResult<Value> {
    let (x, y) = integers("<<", &a, &b)?;
    Ok(Value::Int(x << shift_count("<<", y)?))
}

/// Arithmetic right shift.
pub fn shift_right(a: Value, b: Value) -> VmResult<Value> {
    let (x, y) = integers(">>", &a, &b)?;
    Ok(Value::Int(x >> shift_count(">>", y)?))
}

pub fn bitwise_and(a: Value, b: Value) -> VmResult<Value> {
    let (x, y) = integers("&", &a, &b)?;
    Ok(Value::Int(x & y))
}

pub fn bitwise_xor(a: Value, b: Value) -> VmResult<Value> {
    let (x, y) = integers("^", &a, &b)?;
    Ok(Value::Int(x ^ y))
}

pub fn bitwise_or(a: Value, b: Value) -> VmResult<Value> {
    let (x, y) = integers("|", &a, &b)?;
    Ok(Value::Int(x | y))
}

/// Ordering used by `LE`/`LT`/`GE`/`GT`. `None` when a float operand is NaN.
pub fn compare(op: &str, a: &Value, b: &Value) -> VmResult<Option<Ordering>> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Some(x.cmp(y))),
        (Value::Int(x), Value::Float(y)) => Ok(cmp_int_float(*x, *y)),
        (Value::Float(x), Value::Int(y)) => Ok(cmp_int_float(*y, *x).map(Ordering::reverse)),
        (Value::Str(x), Value::Str(y)) => Ok(Some(x.cmp(y))),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(x.partial_cmp(&y)),
            _ => Err(RuntimeError::type_error(format!(
                "'{}' not supported between '{}' and '{}'",
                op,
                a.type_name(),
                b.type_name()
            ))),
        },
    }
}

pub fn less_equal(a: Value, b: Value) -> VmResult<Value> {
    let ord = compare("<=", &a, &b)?;
    Ok(Value::Bool(matches!(ord, Some(Ordering::Less | Ordering::Equal))))
}

pub fn less(a: Value, b: Value) -> VmResult<Value> {
    let ord = compare("<", &a, &b)?;
    Ok(Value::Bool(ord == Some(Ordering::Less)))
}

pub fn greater_equal(a: Value, b: Value) -> VmResult<Value> {
    let ord = compare(">=", &a, &b)?;
    Ok(Value::Bool(matches!(ord, Some(Ordering::Greater | Ordering::Equal))))
}

pub fn greater(a: Value, b: Value) -> VmResult<Value> {
    let ord = compare(">", &a, &b)?;
    Ok(Value::Bool(ord == Some(Ordering::Greater)))
}

pub fn negate(value: Value) -> VmResult<Value> {
    match value {
        Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
        Value::Float(n) => Ok(Value::Float(-n)),
        other => Err(bad_unary("-", &other)),
    }
}

pub fn bitwise_not(value: Value) -> VmResult<Value> {
    match value.as_integer() {
        Some(n) => Ok(Value::Int(!n)),
        None => Err(bad_unary("~", &value)),
    }
}
