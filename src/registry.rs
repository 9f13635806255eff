//! Process-wide registry of interpreter/processor factories (§9 "Global
//! state"): initialised lazily, write-once per key, thread-safe lookups.
//! Grounded on the teacher's `once_cell::sync::Lazy` static jump table in
//! `operations.rs`, generalized from a fixed `HashMap<u8, Operation>` to a
//! `Mutex`-guarded map keyed by an arbitrary variant name, since factories
//! are registered at runtime rather than built once at compile time.

use crate::gas::Gas;
use crate::interpreter::Interpreter;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;

/// Builds a fresh [`Interpreter`] for a given gas limit. A process may
/// register more than one variant (e.g. a metered vs. unmetered build) and
/// select between them by name.
pub type InterpreterFactory = fn(u64) -> Interpreter;

fn default_interpreter_factory(gas_limit: u64) -> Interpreter {
    Interpreter::new(Gas::new(gas_limit))
}

static INTERPRETER_FACTORIES: Lazy<Mutex<HashMap<String, InterpreterFactory>>> =
    Lazy::new(|| {
        let mut map = HashMap::new();
        map.insert("default".to_string(), default_interpreter_factory as InterpreterFactory);
        Mutex::new(map)
    });

/// Registers `factory` under `key`. Fails if `key` is already taken —
/// registration is write-once (§9).
pub fn register_interpreter(key: &str, factory: InterpreterFactory) -> Result<(), RegistryError> {
    let mut table = INTERPRETER_FACTORIES.lock().expect("registry mutex poisoned");
    if table.contains_key(key) {
        return Err(RegistryError::AlreadyRegistered(key.to_string()));
    }
    table.insert(key.to_string(), factory);
    Ok(())
}

/// Looks up the interpreter factory registered under `key`.
pub fn interpreter_factory(key: &str) -> Option<InterpreterFactory> {
    INTERPRETER_FACTORIES
        .lock()
        .expect("registry mutex poisoned")
        .get(key)
        .copied()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("a factory is already registered under {0:?}")]
    AlreadyRegistered(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alt_interpreter_factory(gas_limit: u64) -> Interpreter {
        Interpreter::new(Gas::new(gas_limit))
    }

    #[test]
    fn default_factory_is_registered_at_startup() {
        assert!(interpreter_factory("default").is_some());
    }

    #[test]
    fn re_registering_the_same_key_fails() {
        let key = "conformance-test-duplicate-key";
        register_interpreter(key, alt_interpreter_factory).unwrap();
        let second = register_interpreter(key, alt_interpreter_factory);
        assert!(matches!(second, Err(RegistryError::AlreadyRegistered(_))));
    }

    #[test]
    fn unknown_key_looks_up_to_nothing() {
        assert!(interpreter_factory("does-not-exist").is_none());
    }
}
