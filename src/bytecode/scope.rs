//! Name-resolution scopes for `LOAD_NAME`.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::Value;

type Bindings = IndexMap<String, Value, ahash::RandomState>;

/// A set of name bindings with an optional enclosing scope.
///
/// Lookups start in the innermost scope and walk outwards; the first
/// binding found wins, so inner bindings shadow outer ones.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    values: Bindings,
    enclosing: Option<Rc<RefCell<Scope>>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Scope>>) -> Self {
        Self {
            values: Bindings::default(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap the scope for sharing between a VM and its embedder.
    pub fn shared(self) -> Rc<RefCell<Scope>> {
        Rc::new(RefCell::new(self))
    }

    /// Define (or redefine) a name in this scope.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Get a name's value, searching up the scope chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        if let Some(ref enclosing) = self.enclosing {
            return enclosing.borrow().get(name);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_outwards() {
        let globals = Scope::new().shared();
        globals.borrow_mut().define("x", Value::Int(1));
        globals.borrow_mut().define("y", Value::Int(2));

        let mut local = Scope::with_enclosing(globals.clone());
        local.define("x", Value::Int(10));

        assert_eq!(local.get("x"), Some(Value::Int(10)));
        assert_eq!(local.get("y"), Some(Value::Int(2)));
        assert_eq!(local.get("z"), None);
        assert_eq!(globals.borrow().get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn test_redefine_replaces_binding() {
        let mut scope = Scope::new();
        scope.define("x", Value::Int(1));
        scope.define("x", Value::from("one"));
        assert_eq!(scope.get("x"), Some(Value::from("one")));
    }
}
