use qir_bytecode::AdapterError;

/// The closed error taxonomy of §7. Every failure mode the translator can
/// produce is one of these variants; none are recovered internally.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// The function handed to `translate` is not a decodable function at all.
    NotIntrospectable { reason: String },
    /// A reached opcode has no QIR mapping.
    UnsupportedOpcode { text: String, offset: u32 },
    /// A jump pattern was not recognized as ternary, short-circuit, or
    /// comprehension.
    UnsupportedControlFlow { offset: u32 },
    /// The symbolic stack underflowed; a bug in the adapter or a corrupt
    /// instruction stream.
    StackUnderflow { offset: u32 },
    /// A jump target does not land on any instruction.
    UnbalancedJump { offset: u32 },
    /// A free name matched no local, capture, source, or builtin.
    UnresolvedName { name: String, offset: u32 },
    /// The instruction-count guard (§5) was exceeded.
    LimitExceeded { limit: usize, count: usize },
    /// The nested-interpretation depth guard (§5) was exceeded.
    StackDepthExceeded { limit: usize, depth: usize },
}

impl std::fmt::Display for TranslationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotIntrospectable { reason } => write!(f, "not introspectable: {reason}"),
            Self::UnsupportedOpcode { text, offset } => {
                write!(f, "unsupported opcode `{text}` at offset {offset}")
            }
            Self::UnsupportedControlFlow { offset } => {
                write!(f, "unrecognized control-flow jump pattern at offset {offset}")
            }
            Self::StackUnderflow { offset } => {
                write!(f, "symbolic stack underflow at offset {offset}")
            }
            Self::UnbalancedJump { offset } => {
                write!(f, "jump at offset {offset} targets no instruction")
            }
            Self::UnresolvedName { name, offset } => {
                write!(f, "unresolved name `{name}` at offset {offset}")
            }
            Self::LimitExceeded { limit, count } => {
                write!(f, "translation limit exceeded: {count} instructions processed (limit {limit})")
            }
            Self::StackDepthExceeded { limit, depth } => {
                write!(f, "nested-interpretation depth exceeded: {depth} deep (limit {limit})")
            }
        }
    }
}

impl std::error::Error for TranslationError {}

impl From<AdapterError> for TranslationError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::NotIntrospectable { reason } => Self::NotIntrospectable { reason },
            AdapterError::UnsupportedOpcode { text, offset } => Self::UnsupportedOpcode { text, offset },
        }
    }
}
