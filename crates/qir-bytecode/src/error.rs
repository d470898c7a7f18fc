use serde::{Deserialize, Serialize};

use crate::Opcode;

/// Failure modes of the Bytecode Adapter (§4.2 Failure clause).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdapterError {
    /// The input is not a decodable function at all.
    NotIntrospectable { reason: String },
    /// The instruction stream contains an `Unsupported` opcode within the
    /// body actually reached by translation.
    UnsupportedOpcode { text: String, offset: u32 },
}

impl AdapterError {
    /// Builds `UnsupportedOpcode` from an [`Opcode::Unsupported`] found at `offset`.
    ///
    /// # Panics
    /// Panics if `op` is not `Opcode::Unsupported`.
    #[must_use]
    pub fn from_unsupported(op: &Opcode, offset: u32) -> Self {
        match op {
            Opcode::Unsupported(text) => Self::UnsupportedOpcode {
                text: text.clone(),
                offset,
            },
            _ => panic!("from_unsupported called with a supported opcode"),
        }
    }
}

impl std::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotIntrospectable { reason } => write!(f, "not introspectable: {reason}"),
            Self::UnsupportedOpcode { text, offset } => {
                write!(f, "unsupported opcode `{text}` at offset {offset}")
            }
        }
    }
}

impl std::error::Error for AdapterError {}
