//! The Binding Resolver (§4.4): classifies a free name reference and
//! produces the corresponding IR leaf, consulting the fixed resolution
//! order (local slots, captured cells, injected sources, builtin table,
//! globals).

use indexmap::IndexMap;
use qir_bytecode::HostCode;
use qir_core::Scalar;

/// One of the five outcomes §4.4 allows for a resolved name. Cases 1
/// (`Identifier`) and 2 (`Value`) for locals/cells are handled directly by
/// the interpreter's `LOAD_FAST`/`LOAD_DEREF` opcodes and never reach the
/// resolver; the resolver only classifies names that reach `LOAD_GLOBAL`.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A previously registered collection source: `employees` maps to
    /// `Operator(SCAN, Identifier("employees"))`.
    Source(String),
    /// A user-defined function, to be recursively translated.
    UserFunction(HostCode),
    /// A recognized builtin.
    Builtin { module: String, symbol: String },
    /// A plain global constant.
    Global(Scalar),
}

/// The injected table of known collection sources, user functions, and
/// globals consulted by `LOAD_GLOBAL`, plus the builtin table §4.3's
/// instruction semantics require.
#[derive(Debug, Clone)]
pub struct SourceTable {
    sources: Vec<String>,
    user_functions: IndexMap<String, HostCode>,
    globals: IndexMap<String, Scalar>,
    builtins: IndexMap<String, (String, String)>,
}

impl SourceTable {
    /// A fresh table pre-populated with the fixed `operator.*` builtin
    /// table §4.3 requires plus the `builtins.*` names the comprehension
    /// pattern and its originating lineage rely on.
    #[must_use]
    pub fn new() -> Self {
        let mut builtins = IndexMap::new();
        for symbol in ["add", "sub", "mul", "truediv", "floordiv", "mod", "pow", "and_", "or_", "not_"] {
            builtins.insert(symbol.to_owned(), ("operator".to_owned(), symbol.to_owned()));
        }
        for symbol in ["lt", "le", "eq", "ne", "ge", "gt"] {
            builtins.insert(symbol.to_owned(), ("operator".to_owned(), symbol.to_owned()));
        }
        for symbol in [
            "len", "abs", "str", "int", "float", "list", "dict", "sum", "min", "max", "sorted",
        ] {
            builtins.insert(symbol.to_owned(), ("builtins".to_owned(), symbol.to_owned()));
        }
        Self {
            sources: Vec::new(),
            user_functions: IndexMap::new(),
            globals: IndexMap::new(),
            builtins,
        }
    }

    /// Registers `name` as a known collection source.
    #[must_use]
    pub fn with_source(mut self, name: impl Into<String>) -> Self {
        self.sources.push(name.into());
        self
    }

    /// Registers `name` as a user-defined function, translated recursively
    /// whenever referenced.
    #[must_use]
    pub fn with_user_function(mut self, name: impl Into<String>, code: HostCode) -> Self {
        self.user_functions.insert(name.into(), code);
        self
    }

    /// Registers `name` as a plain global constant.
    #[must_use]
    pub fn with_global(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.globals.insert(name.into(), value.into());
        self
    }

    /// Overrides or extends the builtin table.
    #[must_use]
    pub fn with_builtin(mut self, name: impl Into<String>, module: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.builtins.insert(name.into(), (module.into(), symbol.into()));
        self
    }

    /// Resolves `name` in the fixed order: injected source, user function,
    /// builtin table, globals. Returns `None` if nothing matches
    /// (`UnresolvedName` at the call site).
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Resolution> {
        if self.sources.iter().any(|source| source == name) {
            return Some(Resolution::Source(name.to_owned()));
        }
        if let Some(code) = self.user_functions.get(name) {
            return Some(Resolution::UserFunction(code.clone()));
        }
        if let Some((module, symbol)) = self.builtins.get(name) {
            return Some(Resolution::Builtin {
                module: module.clone(),
                symbol: symbol.clone(),
            });
        }
        if let Some(value) = self.globals.get(name) {
            return Some(Resolution::Global(value.clone()));
        }
        None
    }
}

impl Default for SourceTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn source_resolves_before_builtin_shadowing() {
        let sources = SourceTable::new().with_source("list");
        assert!(matches!(sources.resolve("list"), Some(Resolution::Source(name)) if name == "list"));
    }

    #[test]
    fn builtin_table_covers_comparisons() {
        let sources = SourceTable::new();
        let Some(Resolution::Builtin { module, symbol }) = sources.resolve("lt") else {
            panic!("expected a builtin resolution");
        };
        assert_eq!((module.as_str(), symbol.as_str()), ("operator", "lt"));
    }

    #[test]
    fn unregistered_name_is_unresolved() {
        assert!(SourceTable::new().resolve("mystery").is_none());
    }
}
