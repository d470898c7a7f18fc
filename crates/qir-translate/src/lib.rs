//! Lifts a host function's normalized bytecode into a QIR expression: the
//! Symbolic Interpreter (§4.3) and Binding Resolver (§4.4), exposed through
//! one entry point, [`translate`].
//!
//! ```
//! use qir_bytecode::{BinaryKind, BytecodeSource, HostCodeBuilder, Opcode};
//! use qir_translate::{translate, SourceTable};
//!
//! // lambda: 1 + 2
//! let mut builder = HostCodeBuilder::new(Vec::<String>::new());
//! let one = builder.add_const(1_i32);
//! let two = builder.add_const(2_i32);
//! builder.emit(Opcode::LoadConst(one));
//! builder.emit(Opcode::LoadConst(two));
//! builder.emit(Opcode::BinaryOp(BinaryKind::Add));
//! builder.emit(Opcode::ReturnValue);
//! let code = builder.build();
//!
//! let expr = translate(&code, &SourceTable::new()).unwrap();
//! ```

mod error;
mod interpreter;
mod limits;
mod resolver;
mod tracer;

use std::collections::HashMap;
use std::sync::RwLock;

use qir_bytecode::BytecodeSource;
use qir_core::{Expr, Scalar};

pub use error::TranslationError;
pub use limits::{Bounded, LimitTracker, NoLimit, TranslationLimits};
pub use resolver::{Resolution, SourceTable};
pub use tracer::{NoopTracer, Pattern, RecordingTracer, Tracer};

use interpreter::Ctx;

/// Translates `function` into a QIR expression, consulting `sources` for
/// every free name. No limit is enforced and every hook is a no-op; use
/// [`Translator`] to configure either.
pub fn translate(function: &dyn BytecodeSource, sources: &SourceTable) -> Result<Expr, TranslationError> {
    Translator::new().translate(function, sources)
}

/// Identifies one translated call for the optional memoization cache: the
/// function's identity (its decoded `HostCode`, compared structurally) plus
/// the ordered snapshot of its captured free variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    code_fingerprint: String,
    closure_snapshot: Vec<HashableScalar>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum HashableScalar {
    Null,
    Number(i32),
    Bits(u64),
    Str(String),
    Bool(bool),
}

impl From<&Scalar> for HashableScalar {
    fn from(value: &Scalar) -> Self {
        match value {
            Scalar::Null => Self::Null,
            Scalar::Number(n) => Self::Number(*n),
            Scalar::Double(d) => Self::Bits(d.to_bits()),
            Scalar::Str(s) => Self::Str(s.clone()),
            Scalar::Bool(b) => Self::Bool(*b),
        }
    }
}

/// Owns the optional translation cache and the tracer/limit configuration
/// for repeated `translate` calls, per §3.3's "optional cache keyed by
/// (function identity, captured-value snapshot)".
///
/// Holds no other mutable state: every `translate` call is a bounded, pure
/// computation over its own arguments (§5).
pub struct Translator {
    limits: Option<TranslationLimits>,
    cache: Option<RwLock<HashMap<CacheKey, Expr>>>,
}

impl Translator {
    /// No instruction limit, no memoization cache.
    #[must_use]
    pub fn new() -> Self {
        Self { limits: None, cache: None }
    }

    /// Enforces `limits` on every translation.
    #[must_use]
    pub fn with_limits(mut self, limits: TranslationLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Enables the memoization cache.
    #[must_use]
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(RwLock::new(HashMap::new()));
        self
    }

    /// Translates `function`, consulting the cache first if enabled.
    pub fn translate(&self, function: &dyn BytecodeSource, sources: &SourceTable) -> Result<Expr, TranslationError> {
        let code = function.decode()?;
        let cache_key = self.cache.as_ref().map(|_| CacheKey {
            code_fingerprint: format!("{code:?}"),
            closure_snapshot: code.free_vars.values().map(HashableScalar::from).collect(),
        });

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Some(hit) = cache.read().ok().and_then(|guard| guard.get(key).cloned()) {
                return Ok(hit);
            }
        }

        let mut noop = NoopTracer;
        let mut no_limit = NoLimit;
        let mut bounded;
        let budget: &mut dyn LimitTracker = match self.limits {
            Some(limits) => {
                bounded = Bounded::new(limits);
                &mut bounded
            }
            None => &mut no_limit,
        };
        let mut ctx = Ctx { sources, tracer: &mut noop, budget };
        let expr = interpreter::translate_function(&code, &mut ctx)?;

        if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
            if let Ok(mut guard) = cache.write() {
                guard.insert(key, expr.clone());
            }
        }
        Ok(expr)
    }

    /// Translates `function`, routing every hook through `tracer`.
    pub fn translate_traced(
        &self,
        function: &dyn BytecodeSource,
        sources: &SourceTable,
        tracer: &mut dyn Tracer,
    ) -> Result<Expr, TranslationError> {
        let code = function.decode()?;
        let mut no_limit = NoLimit;
        let mut bounded;
        let budget: &mut dyn LimitTracker = match self.limits {
            Some(limits) => {
                bounded = Bounded::new(limits);
                &mut bounded
            }
            None => &mut no_limit,
        };
        let mut ctx = Ctx { sources, tracer, budget };
        interpreter::translate_function(&code, &mut ctx)
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use qir_bytecode::{BinaryKind, HostCodeBuilder, Opcode};
    use qir_core::Expr;

    use super::*;

    #[test]
    fn translator_cache_returns_structurally_equal_result() {
        let mut builder = HostCodeBuilder::new(Vec::<String>::new());
        let one = builder.add_const(1_i32);
        builder.emit(Opcode::LoadConst(one));
        builder.emit(Opcode::LoadConst(one));
        builder.emit(Opcode::BinaryOp(BinaryKind::Add));
        builder.emit(Opcode::ReturnValue);
        let code = builder.build();

        let translator = Translator::new().with_cache();
        let sources = SourceTable::new();
        let first = translator.translate(&code, &sources).unwrap();
        let second = translator.translate(&code, &sources).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn exceeding_the_instruction_limit_fails() {
        let mut builder = HostCodeBuilder::new(Vec::<String>::new());
        let one = builder.add_const(1_i32);
        builder.emit(Opcode::LoadConst(one));
        builder.emit(Opcode::LoadConst(one));
        builder.emit(Opcode::BinaryOp(BinaryKind::Add));
        builder.emit(Opcode::ReturnValue);
        let code = builder.build();

        let translator = Translator::new().with_limits(TranslationLimits::bounded(2));
        let err = translator.translate(&code, &SourceTable::new()).unwrap_err();
        assert!(matches!(err, TranslationError::LimitExceeded { .. }));
    }

    #[test]
    fn exceeding_the_stack_depth_limit_fails() {
        let mut builder = HostCodeBuilder::new(Vec::<String>::new());
        let one = builder.add_const(1_i32);
        builder.emit(Opcode::LoadConst(one));
        builder.emit(Opcode::ReturnValue);
        let code = builder.build();

        let limits = TranslationLimits::default().with_max_stack_depth(0);
        let translator = Translator::new().with_limits(limits);
        let err = translator.translate(&code, &SourceTable::new()).unwrap_err();
        assert!(matches!(err, TranslationError::StackDepthExceeded { limit: 0, depth: 1 }));
    }

    #[test]
    fn unregistered_name_fails_with_unresolved_name() {
        let mut builder = HostCodeBuilder::new(Vec::<String>::new());
        let name = builder.name_index("mystery");
        builder.emit(Opcode::LoadGlobal(name));
        builder.emit(Opcode::ReturnValue);
        let code = builder.build();

        let err = translate(&code, &SourceTable::new()).unwrap_err();
        assert_eq!(err, TranslationError::UnresolvedName { name: "mystery".to_owned(), offset: 0 });
    }

    #[test]
    fn doc_example_type_checks() {
        let _: fn(&dyn qir_bytecode::BytecodeSource, &SourceTable) -> Result<Expr, TranslationError> = translate;
    }
}
