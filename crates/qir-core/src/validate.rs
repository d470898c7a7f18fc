use std::collections::HashSet;

use crate::{Expr, OperatorType};

/// A structural well-formedness violation caught by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An `Identifier` that is neither bound by an enclosing `Lambda` nor
    /// present in the caller-supplied set of allowed free names.
    UnboundIdentifier(String),
    /// An `Operator` node whose operand count doesn't match its arity.
    WrongArity {
        op: OperatorType,
        expected: usize,
        got: usize,
    },
    /// An `Operator` operand that should be a `Lambda` (per §3.2) isn't.
    OperandMustBeLambda { op: OperatorType, index: usize },
    /// A required operand slot was absent.
    MissingOperand { op: OperatorType, index: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnboundIdentifier(name) => write!(f, "identifier `{name}` is neither bound nor an injected source"),
            Self::WrongArity { op, expected, got } => {
                write!(f, "{op} expects {expected} operand(s), got {got}")
            }
            Self::OperandMustBeLambda { op, index } => write!(f, "{op} operand {index} must be a Lambda"),
            Self::MissingOperand { op, index } => write!(f, "{op} operand {index} is missing"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Checks the §3.2 invariants of a QIR term.
///
/// `allowed_free` names the injected source/global names that may legally
/// appear unbound (e.g. collection sources, user function names resolved to
/// their own translated bodies but still referenced by name in error
/// messages). Any other free `Identifier` is a well-formedness violation.
pub fn validate(expr: &Expr, allowed_free: &HashSet<String>) -> Result<(), ValidationError> {
    let mut bound = HashSet::new();
    walk(expr, &mut bound, allowed_free)
}

fn walk(expr: &Expr, bound: &mut HashSet<String>, allowed_free: &HashSet<String>) -> Result<(), ValidationError> {
    match expr {
        Expr::Value(_) | Expr::Builtin { .. } => Ok(()),
        Expr::Identifier(name) => {
            if bound.contains(name) || allowed_free.contains(name) {
                Ok(())
            } else {
                Err(ValidationError::UnboundIdentifier(name.clone()))
            }
        }
        Expr::Lambda { param, body } => {
            let inserted = bound.insert(param.clone());
            let result = walk(body, bound, allowed_free);
            if inserted {
                bound.remove(param);
            }
            result
        }
        Expr::Application(f, arg) => {
            walk(f, bound, allowed_free)?;
            walk(arg, bound, allowed_free)
        }
        Expr::Conditional {
            cond,
            then_branch,
            else_branch,
        } => {
            walk(cond, bound, allowed_free)?;
            walk(then_branch, bound, allowed_free)?;
            walk(else_branch, bound, allowed_free)
        }
        Expr::ListConstr(None) | Expr::TupleConstr(None) => Ok(()),
        Expr::ListConstr(Some(cell)) => {
            walk(&cell.head, bound, allowed_free)?;
            walk(&cell.tail, bound, allowed_free)
        }
        Expr::TupleConstr(Some(cell)) => {
            walk(&cell.key, bound, allowed_free)?;
            walk(&cell.value, bound, allowed_free)?;
            walk(&cell.tail, bound, allowed_free)
        }
        Expr::ListDestr {
            scrutinee,
            on_nil,
            on_cons,
        } => {
            walk(scrutinee, bound, allowed_free)?;
            walk(on_nil, bound, allowed_free)?;
            walk(on_cons, bound, allowed_free)
        }
        Expr::TupleDestr { scrutinee, key } => {
            walk(scrutinee, bound, allowed_free)?;
            walk(key, bound, allowed_free)
        }
        Expr::Reference { .. } => Ok(()),
        Expr::Operator { op, operands } => {
            let expected = op.arity();
            for index in 0..expected {
                match &operands[index] {
                    Some(operand) => {
                        if op.operand_must_be_lambda(index) && !operand.is_lambda() {
                            return Err(ValidationError::OperandMustBeLambda { op: *op, index });
                        }
                        walk(operand, bound, allowed_free)?;
                    }
                    None => return Err(ValidationError::MissingOperand { op: *op, index }),
                }
            }
            let got = operands.iter().filter(|o| o.is_some()).count();
            if got != expected {
                return Err(ValidationError::WrongArity { op: *op, expected, got });
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::Scalar;

    #[test]
    fn bound_identifier_under_lambda_is_valid() {
        let expr = Expr::Lambda {
            param: "x".to_owned(),
            body: Box::new(Expr::Identifier("x".to_owned())),
        };
        assert!(validate(&expr, &HashSet::new()).is_ok());
    }

    #[test]
    fn unbound_identifier_is_rejected() {
        let expr = Expr::Identifier("mystery".to_owned());
        assert_eq!(
            validate(&expr, &HashSet::new()),
            Err(ValidationError::UnboundIdentifier("mystery".to_owned()))
        );
    }

    #[test]
    fn injected_source_name_is_allowed_free() {
        let expr = Expr::scan("employees");
        let allowed: HashSet<String> = ["employees".to_owned()].into_iter().collect();
        assert!(validate(&expr, &allowed).is_ok());
    }

    #[test]
    fn lambda_param_out_of_scope_after_body() {
        // `x` is bound only inside the lambda; referencing it afterwards is unbound.
        let expr = Expr::Application(
            Box::new(Expr::Lambda {
                param: "x".to_owned(),
                body: Box::new(Expr::Value(Scalar::Number(1))),
            }),
            Box::new(Expr::Identifier("x".to_owned())),
        );
        assert_eq!(
            validate(&expr, &HashSet::new()),
            Err(ValidationError::UnboundIdentifier("x".to_owned()))
        );
    }

    #[test]
    fn operator_with_missing_slot_is_rejected() {
        let expr = Expr::Operator {
            op: OperatorType::Select,
            operands: [Some(Box::new(Expr::scan("e"))), None, None],
        };
        let allowed: HashSet<String> = ["e".to_owned()].into_iter().collect();
        assert_eq!(
            validate(&expr, &allowed),
            Err(ValidationError::MissingOperand {
                op: OperatorType::Select,
                index: 1
            })
        );
    }
}
