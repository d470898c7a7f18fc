//! Observability hooks for the Symbolic Interpreter: a trait the
//! interpreter is generic over, with a `NoopTracer` default that
//! monomorphizes away and a `RecordingTracer` for assertions in tests.

use qir_core::Expr;

/// A recognized control-flow shape, reported to the tracer when lifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Pattern {
    Ternary,
    ShortCircuitAnd,
    ShortCircuitOr,
    Comprehension,
}

/// Hook points fired while translating one function body.
pub trait Tracer {
    /// An instruction is about to be dispatched.
    fn on_instruction(&mut self, offset: u32) {
        let _ = offset;
    }

    /// An expression was pushed onto the symbolic stack.
    fn on_push(&mut self, expr: &Expr) {
        let _ = expr;
    }

    /// An expression was popped off the symbolic stack.
    fn on_pop(&mut self, expr: &Expr) {
        let _ = expr;
    }

    /// A name reference was resolved to `resolved`.
    fn on_resolved(&mut self, name: &str, resolved: &Expr) {
        let _ = (name, resolved);
    }

    /// A control-flow pattern was recognized and lifted starting at `offset`.
    fn on_pattern_recognized(&mut self, pattern: Pattern, offset: u32) {
        let _ = (pattern, offset);
    }
}

/// Default tracer: every hook is a no-op, optimized away by the compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}

/// Records every hook invocation, for assertions in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    pub instructions: Vec<u32>,
    pub pushes: Vec<Expr>,
    pub pops: Vec<Expr>,
    pub resolved: Vec<(String, Expr)>,
    pub patterns: Vec<(Pattern, u32)>,
}

impl Tracer for RecordingTracer {
    fn on_instruction(&mut self, offset: u32) {
        self.instructions.push(offset);
    }

    fn on_push(&mut self, expr: &Expr) {
        self.pushes.push(expr.clone());
    }

    fn on_pop(&mut self, expr: &Expr) {
        self.pops.push(expr.clone());
    }

    fn on_resolved(&mut self, name: &str, resolved: &Expr) {
        self.resolved.push((name.to_owned(), resolved.clone()));
    }

    fn on_pattern_recognized(&mut self, pattern: Pattern, offset: u32) {
        self.patterns.push((pattern, offset));
    }
}
