//! The query intermediate representation (QIR): an algebraic expression
//! type, its wire-compatible serialization, and a structural validator.
//!
//! This crate is pure data: it has no notion of a host language, bytecode,
//! or evaluation. [`qir-translate`](../qir_translate/index.html) builds
//! [`Expr`] trees; [`qir-transport`](../qir_transport/index.html) ships them
//! to a remote evaluator.

mod expr;
mod operator;
mod scalar;
mod validate;

pub use expr::{Expr, IrError, ListCell, TupleCell};
pub use operator::OperatorType;
pub use scalar::Scalar;
pub use validate::{validate, ValidationError};
