//! The dictionary: fully-qualified name → callable.
//!
//! Seeded with the builtin table at construction; afterwards only word
//! definitions, first-binding variables, imports, and host registration add
//! entries. Compile-time lookups are direct; run-time lookups happen only
//! through late-bound names.

use std::collections::HashMap;

use crate::builtins;
use crate::value::Callable;

#[derive(Debug, Clone)]
pub struct Dictionary {
    entries: HashMap<String, Callable>,
}

impl Dictionary {
    /// A dictionary holding exactly the builtin table.
    pub fn with_builtins() -> Self {
        let mut entries = HashMap::new();
        for def in builtins::TABLE {
            entries.insert(def.name.to_string(), Callable::Builtin(def));
        }
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Callable> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, callable: Callable) {
        self.entries.insert(name.into(), callable);
    }

    /// Iterate over all bound names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Names present here but absent from the builtin table. Used by the
    /// import loader to decide what crosses the module boundary.
    pub(crate) fn non_builtin_names(&self) -> Vec<String> {
        self.entries
            .keys()
            .filter(|k| !builtins::TABLE.iter().any(|def| def.name == k.as_str()))
            .cloned()
            .collect()
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::with_builtins()
    }
}
