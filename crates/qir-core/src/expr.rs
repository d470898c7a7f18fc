use serde::{Deserialize, Serialize};

use crate::{OperatorType, Scalar};

/// One cons cell of a [`Expr::ListConstr`] chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListCell {
    pub head: Box<Expr>,
    pub tail: Box<Expr>,
}

/// One cons cell of a [`Expr::TupleConstr`] chain: a record is a cons-list
/// of (key, value) pairs ordered by insertion (§3.2 List/tuple duality).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleCell {
    pub key: Box<Expr>,
    pub value: Box<Expr>,
    pub tail: Box<Expr>,
}

/// A QIR expression: the algebraic type of §3.1.
///
/// Variant order is part of the wire contract — the schema's `Expression`
/// union numbers these cases 1..12 in this declaration order. Do not
/// reorder variants without also bumping the schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Literal constant.
    Value(Scalar),
    /// Occurrence of a bound variable.
    Identifier(String),
    /// Single-argument function; multi-argument functions are curried.
    Lambda { param: String, body: Box<Expr> },
    /// Function application.
    Application(Box<Expr>, Box<Expr>),
    /// Eager ternary.
    Conditional {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// Cons-list constructor; `None` is nil.
    ListConstr(Option<ListCell>),
    /// Cons-list destructor. `on_cons` is curried over (head, tail).
    ListDestr {
        scrutinee: Box<Expr>,
        on_nil: Box<Expr>,
        on_cons: Box<Expr>,
    },
    /// Record as a cons-list of (key, value) pairs; `None` is nil.
    TupleConstr(Option<TupleCell>),
    /// Field projection by key.
    TupleDestr { scrutinee: Box<Expr>, key: Box<Expr> },
    /// Relational-algebra operator. Unused operand slots are `None`.
    Operator {
        op: OperatorType,
        operands: [Option<Box<Expr>>; 3],
    },
    /// Reference to a known external function.
    Builtin { module: String, symbol: String },
    /// Column reference inside a row variable (e.g. `e.name`).
    Reference { source: String, field: String },
}

/// Raised by the constructor helpers when a caller tries to build a
/// structurally invalid term (§3.2 invariants).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    /// An operator operand that must be a `Lambda` (per
    /// [`OperatorType::operand_must_be_lambda`]) was something else.
    OperandMustBeLambda { op: OperatorType, index: usize },
    /// The wrong number of operands was supplied for the operator's arity.
    WrongArity {
        op: OperatorType,
        expected: usize,
        got: usize,
    },
}

impl std::fmt::Display for IrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OperandMustBeLambda { op, index } => {
                write!(f, "{op} operand {index} must be a Lambda")
            }
            Self::WrongArity { op, expected, got } => {
                write!(f, "{op} expects {expected} operand(s), got {got}")
            }
        }
    }
}

impl std::error::Error for IrError {}

impl Expr {
    /// Nil list constructor.
    #[must_use]
    pub fn nil_list() -> Self {
        Self::ListConstr(None)
    }

    /// Cons onto a list.
    #[must_use]
    pub fn cons(head: Expr, tail: Expr) -> Self {
        Self::ListConstr(Some(ListCell {
            head: Box::new(head),
            tail: Box::new(tail),
        }))
    }

    /// Nil tuple (empty record) constructor.
    #[must_use]
    pub fn nil_tuple() -> Self {
        Self::TupleConstr(None)
    }

    /// Prepend a (key, value) pair onto a tuple chain.
    #[must_use]
    pub fn tuple_cons(key: Expr, value: Expr, tail: Expr) -> Self {
        Self::TupleConstr(Some(TupleCell {
            key: Box::new(key),
            value: Box::new(value),
            tail: Box::new(tail),
        }))
    }

    /// Builds an `Operator` node, checking the §3.2 arity and lambda-shape
    /// invariants for `op` before constructing the node.
    pub fn operator(op: OperatorType, operands: Vec<Expr>) -> Result<Self, IrError> {
        let expected = op.arity();
        if operands.len() != expected {
            return Err(IrError::WrongArity {
                op,
                expected,
                got: operands.len(),
            });
        }
        for (index, operand) in operands.iter().enumerate() {
            if op.operand_must_be_lambda(index) && !matches!(operand, Expr::Lambda { .. }) {
                return Err(IrError::OperandMustBeLambda { op, index });
            }
        }
        let mut slots: [Option<Box<Expr>>; 3] = [None, None, None];
        for (slot, operand) in slots.iter_mut().zip(operands) {
            *slot = Some(Box::new(operand));
        }
        Ok(Self::Operator { op, operands: slots })
    }

    /// `Operator(SCAN, Identifier(name))`.
    #[must_use]
    pub fn scan(source_name: &str) -> Self {
        Self::operator(OperatorType::Scan, vec![Self::Identifier(source_name.to_owned())])
            .expect("SCAN operand is always a valid Identifier")
    }

    /// `Operator(SELECT, input, predicate)`; `predicate` must be a `Lambda`.
    pub fn select(input: Expr, predicate: Expr) -> Result<Self, IrError> {
        Self::operator(OperatorType::Select, vec![input, predicate])
    }

    /// `Operator(PROJECT, input, projection)`; `projection` must be a `Lambda`.
    pub fn project(input: Expr, projection: Expr) -> Result<Self, IrError> {
        Self::operator(OperatorType::Project, vec![input, projection])
    }

    /// `Operator(JOIN, left, right, predicate)`; `predicate` must be a `Lambda`.
    pub fn join(left: Expr, right: Expr, predicate: Expr) -> Result<Self, IrError> {
        Self::operator(OperatorType::Join, vec![left, right, predicate])
    }

    /// Curries `CALL k` into `k` nested `Application` nodes, left-associating
    /// argument-by-argument, per §4.3/§9 ("Currying of multi-argument calls").
    #[must_use]
    pub fn apply_all(callee: Expr, args: impl IntoIterator<Item = Expr>) -> Self {
        args.into_iter()
            .fold(callee, |f, arg| Self::Application(Box::new(f), Box::new(arg)))
    }

    /// True if this node is a `Lambda`.
    #[must_use]
    pub fn is_lambda(&self) -> bool {
        matches!(self, Self::Lambda { .. })
    }
}
