//! Runtime and literal values.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::bytecode::vm::Vm;

/// Signature of a native (builtin) function body.
///
/// Natives receive the VM they are running on together with their
/// arguments, already popped off the data stack in call order.
pub type NativeFn = dyn Fn(&mut Vm, Vec<Value>) -> Result<Value, String> + Send + Sync;

/// A named native function.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub arity: Option<usize>, // None means variadic
    pub func: Arc<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, arity: Option<usize>, func: F) -> Self
    where
        F: Fn(&mut Vm, Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            func: Arc::new(func),
        }
    }

    /// Whether two handles refer to the same native body.
    pub fn ptr_eq(&self, other: &NativeFunction) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.func) as *const (),
            Arc::as_ptr(&other.func) as *const (),
        )
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

/// Discriminant of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Float,
    Int,
    Str,
    Bool,
    Null,
    Builtin,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Float => "float",
            ValueType::Int => "int",
            ValueType::Str => "str",
            ValueType::Bool => "bool",
            ValueType::Null => "null",
            ValueType::Builtin => "function",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tagged value.
#[derive(Debug, Clone)]
pub enum Value {
    Float(f64),
    Int(i64),
    Str(String),
    Bool(bool),
    Null,
    /// A native function bound in a scope.
    Builtin(NativeFunction),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Float(_) => ValueType::Float,
            Value::Int(_) => ValueType::Int,
            Value::Str(_) => ValueType::Str,
            Value::Bool(_) => ValueType::Bool,
            Value::Null => ValueType::Null,
            Value::Builtin(_) => ValueType::Builtin,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Int(0) => false,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::Str(s) if s.is_empty() => false,
            _ => true,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Numeric view of the value, promoting integers to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view of the value. Floats qualify only when they hold an
    /// exactly integral value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) => is_integral_float(*f),
            _ => None,
        }
    }

    /// Equality used by the `EQ`/`NOT_EQ` opcodes: numbers compare across
    /// int/float, everything else by type and payload.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) => cmp_int_float(*a, *b) == Some(Ordering::Equal),
            (Value::Float(a), Value::Int(b)) => cmp_int_float(*b, *a) == Some(Ordering::Equal),
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Builtin(a), Value::Builtin(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(n) => f.write_str(ryu::Buffer::new().format(*n)),
            Value::Int(n) => f.write_str(itoa::Buffer::new().format(*n)),
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => f.write_str("null"),
            Value::Builtin(native) => write!(f, "<builtin {}>", native.name),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<NativeFunction> for Value {
    fn from(native: NativeFunction) -> Self {
        Value::Builtin(native)
    }
}

/// Check whether a float holds an exact integer and return that integer.
///
/// Non-finite values, values with a fractional part and values outside the
/// `i64` range are rejected.
pub fn is_integral_float(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; i64::MAX is not.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if !f.is_finite() || f.fract() != 0.0 || f < -LIMIT || f >= LIMIT {
        return None;
    }
    Some(f as i64)
}

/// Exact ordering of an integer against a float, without rounding the
/// integer to `f64`. `None` when `f` is NaN.
pub fn cmp_int_float(i: i64, f: f64) -> Option<Ordering> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return None;
    }
    if f >= LIMIT {
        return Some(Ordering::Less);
    }
    if f < -LIMIT {
        return Some(Ordering::Greater);
    }
    // In range, so the floor converts to i64 without loss.
    let floor = f.floor();
    match i.cmp(&(floor as i64)) {
        Ordering::Equal if floor != f => Some(Ordering::Less),
        ord => Some(ord),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_float() {
        assert_eq!(is_integral_float(4.0), Some(4));
        assert_eq!(is_integral_float(-17.0), Some(-17));
        assert_eq!(is_integral_float(0.5), None);
        assert_eq!(is_integral_float(f64::NAN), None);
        assert_eq!(is_integral_float(f64::INFINITY), None);
        assert_eq!(is_integral_float(1e19), None);
        assert_eq!(is_integral_float(-9_223_372_036_854_775_808.0), Some(i64::MIN));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int(11).to_string(), "11");
        assert_eq!(Value::Float(3.5).to_string(), "3.5");
        assert_eq!(Value::Float(11.0).to_string(), "11.0");
        assert_eq!(Value::Str("hi".into()).to_string(), "hi");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "null");
        let native = NativeFunction::new("len", Some(1), |_, _| Ok(Value::Null));
        assert_eq!(Value::Builtin(native).to_string(), "<builtin len>");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(Value::Str("0".into()).is_truthy());
    }

    #[test]
    fn test_equality_is_strict_but_loose_eq_crosses_numbers() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert!(Value::Int(1).loose_eq(&Value::Float(1.0)));
        assert!(!Value::Int(1).loose_eq(&Value::Str("1".into())));

        let a = NativeFunction::new("f", None, |_, _| Ok(Value::Null));
        let b = NativeFunction::new("f", None, |_, _| Ok(Value::Null));
        assert_eq!(Value::Builtin(a.clone()), Value::Builtin(a.clone()));
        assert_ne!(Value::Builtin(a), Value::Builtin(b));
    }

    #[test]
    fn test_int_float_comparison_is_exact() {
        // 2^53 + 1 has no f64 representation and must not equal 2^53.
        let big = Value::Int(9_007_199_254_740_993);
        assert!(!big.loose_eq(&Value::Float(9_007_199_254_740_992.0)));
        assert!(Value::Int(9_007_199_254_740_992).loose_eq(&Value::Float(9_007_199_254_740_992.0)));

        // i64::MAX rounds up to 2^63 as a float.
        assert!(!Value::Int(i64::MAX).loose_eq(&Value::Float(9.223372036854776e18)));
        assert_eq!(cmp_int_float(i64::MAX, 9.223372036854776e18), Some(Ordering::Less));
        assert_eq!(cmp_int_float(i64::MIN, -9.223372036854776e18), Some(Ordering::Equal));

        assert_eq!(cmp_int_float(2, 2.5), Some(Ordering::Less));
        assert_eq!(cmp_int_float(-2, -2.5), Some(Ordering::Greater));
        assert_eq!(cmp_int_float(-3, -2.5), Some(Ordering::Less));
        assert_eq!(cmp_int_float(0, f64::INFINITY), Some(Ordering::Less));
        assert_eq!(cmp_int_float(0, f64::NEG_INFINITY), Some(Ordering::Greater));
        assert_eq!(cmp_int_float(0, f64::NAN), None);
    }

    #[test]
    fn test_value_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Value>();
    }
}
