//! The remote evaluator contract (§6.2): `qir-translate` only produces QIR,
//! it never runs it — execution is the external collaborator's job. This
//! module defines the seam it plugs into, plus one reference implementation
//! for tests and local dry-runs.

use qir_core::Expr;

/// A failure reported by an [`Evaluator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The evaluator does not support some construct in the given term.
    Unsupported(String),
    /// The remote side reported a failure; `message` is its own diagnostic.
    Remote(String),
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported(what) => write!(f, "evaluator does not support: {what}"),
            Self::Remote(message) => write!(f, "remote evaluator error: {message}"),
        }
    }
}

impl std::error::Error for EvalError {}

/// Evaluates a QIR term, somewhere outside this crate's control.
///
/// `qir-transport` ships this contract and one reference implementation;
/// the actual remote evaluator is the external collaborator named in §1/§6.2
/// and is out of scope here.
pub trait Evaluator {
    /// Evaluates `expr`, returning the resulting term.
    fn evaluate(&self, expr: &Expr) -> Result<Expr, EvalError>;
}

/// Returns its input unchanged. Useful for tests and for exercising the
/// transport/wire path without a real backing evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoEvaluator;

impl Evaluator for EchoEvaluator {
    fn evaluate(&self, expr: &Expr) -> Result<Expr, EvalError> {
        Ok(expr.clone())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn echo_evaluator_returns_input_unchanged() {
        let expr = Expr::scan("employees");
        assert_eq!(EchoEvaluator.evaluate(&expr).unwrap(), expr);
    }
}
