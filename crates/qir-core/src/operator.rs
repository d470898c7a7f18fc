use serde::{Deserialize, Serialize};

/// Relational-algebra operator tag carried by [`crate::Expr::Operator`].
///
/// Discriminants are the wire codes from the schema's `OperatorType`
/// enumeration and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorType {
    Scan = 1,
    Select = 2,
    Project = 3,
    Sort = 4,
    Limit = 5,
    Group = 6,
    Join = 7,
}

impl OperatorType {
    /// Number of operands this operator takes, per §3.2's arity invariant.
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Self::Scan => 1,
            Self::Select | Self::Project | Self::Sort | Self::Limit | Self::Group => 2,
            Self::Join => 3,
        }
    }

    /// Whether the operand at `index` (0-based) must be a `Lambda`, per §3.2.
    ///
    /// SCAN's sole operand is an `Identifier`, never a lambda. Every other
    /// operator's second (and JOIN's third) operand is a predicate or
    /// projection lambda.
    #[must_use]
    pub fn operand_must_be_lambda(self, index: usize) -> bool {
        match self {
            Self::Scan => false,
            Self::Select | Self::Project | Self::Sort | Self::Limit | Self::Group => index == 1,
            Self::Join => index == 2,
        }
    }
}
