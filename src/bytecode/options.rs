//! VM configuration.

use std::env;

/// Default initial capacity of the data stack.
pub const DEFAULT_STACK_CAPACITY: usize = 256;

/// Options controlling a [`Vm`](crate::bytecode::Vm).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmOptions {
    /// Initial capacity of the data stack. The stack grows past it as needed.
    pub stack_capacity: usize,
    /// Dump the data stack to stderr after every instruction.
    pub trace_stack: bool,
}

impl Default for VmOptions {
    fn default() -> Self {
        Self {
            stack_capacity: DEFAULT_STACK_CAPACITY,
            trace_stack: false,
        }
    }
}

impl VmOptions {
    /// Read options from the environment, falling back to defaults.
    ///
    /// - `MSCRIPT_STACK_CAPACITY`: initial data stack capacity
    /// - `MSCRIPT_TRACE_STACK`: enable stack tracing (disable with `0` or `false`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let stack_capacity = lookup("MSCRIPT_STACK_CAPACITY")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.stack_capacity);
        let trace_stack = lookup("MSCRIPT_TRACE_STACK")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(defaults.trace_stack);
        Self {
            stack_capacity,
            trace_stack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn options_from(pairs: &[(&str, &str)]) -> VmOptions {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        VmOptions::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        assert_eq!(options_from(&[]), VmOptions::default());
    }

    #[test]
    fn test_environment_overrides() {
        let options = options_from(&[
            ("MSCRIPT_STACK_CAPACITY", "1024"),
            ("MSCRIPT_TRACE_STACK", "1"),
        ]);
        assert_eq!(options.stack_capacity, 1024);
        assert!(options.trace_stack);

        let options = options_from(&[
            ("MSCRIPT_STACK_CAPACITY", "lots"),
            ("MSCRIPT_TRACE_STACK", "false"),
        ]);
        assert_eq!(options.stack_capacity, DEFAULT_STACK_CAPACITY);
        assert!(!options.trace_stack);
    }
}
