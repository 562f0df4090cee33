//! Registry of builtin methods keyed by primitive type and method name.
//!
//! The registry only stores natives; their implementations live with the
//! embedder (standard library, host application).

use indexmap::IndexMap;

use crate::value::{NativeFunction, Value, ValueType};
use crate::bytecode::vm::Vm;

type Methods = IndexMap<String, NativeFunction, ahash::RandomState>;

/// Builtin methods for each primitive type.
#[derive(Debug, Clone, Default)]
pub struct Prototypes {
    types: IndexMap<ValueType, Methods, ahash::RandomState>,
}

impl Prototypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a native as a method of `value_type` under the native's name.
    /// A later registration with the same name replaces the earlier one.
    pub fn register(&mut self, value_type: ValueType, native: NativeFunction) {
        self.types
            .entry(value_type)
            .or_default()
            .insert(native.name.clone(), native);
    }

    /// Register a closure as a method. The receiver is the first argument
    /// and counts towards `arity`.
    pub fn register_fn<F>(
        &mut self,
        value_type: ValueType,
        name: impl Into<String>,
        arity: Option<usize>,
        func: F,
    ) where
        F: Fn(&mut Vm, Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.register(value_type, NativeFunction::new(name, arity, func));
    }

    /// Look up a method; `None` when the type has no method of that name.
    pub fn get(&self, value_type: ValueType, method: &str) -> Option<&NativeFunction> {
        self.types.get(&value_type)?.get(method)
    }

    /// Method names registered for a type, in registration order.
    pub fn methods(&self, value_type: ValueType) -> Vec<&str> {
        self.types
            .get(&value_type)
            .map(|methods| methods.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_type_and_name() {
        let mut prototypes = Prototypes::new();
        prototypes.register_fn(ValueType::Str, "len", Some(1), |_, args| match &args[0] {
            Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
            other => Err(format!("expected str, got {}", other.type_name())),
        });

        assert!(prototypes.get(ValueType::Str, "len").is_some());
        assert!(prototypes.get(ValueType::Str, "upper").is_none());
        assert!(prototypes.get(ValueType::Int, "len").is_none());
    }

    #[test]
    fn test_methods_listing() {
        let mut prototypes = Prototypes::new();
        prototypes.register_fn(ValueType::Int, "abs", Some(1), |_, _| Ok(Value::Null));
        prototypes.register_fn(ValueType::Int, "bits", Some(1), |_, _| Ok(Value::Null));
        assert_eq!(prototypes.methods(ValueType::Int), vec!["abs", "bits"]);
        assert!(prototypes.methods(ValueType::Float).is_empty());
    }
}
