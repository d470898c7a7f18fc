//! The external-collaborator boundary (§6): wire serialization for shipping
//! QIR off-process, and the `Evaluator` contract the receiving side
//! implements.
//!
//! This crate carries no translation logic — it only moves [`Expr`] trees
//! across a boundary and names the seam a remote evaluator plugs into.

mod evaluator;
mod wire;

pub use evaluator::{EchoEvaluator, EvalError, Evaluator};
pub use qir_core::{Expr, OperatorType, Scalar};
pub use wire::{from_json, from_postcard, to_json, to_postcard, WireError};
