use indexmap::IndexMap;
use qir_core::Scalar;
use serde::{Deserialize, Serialize};

use crate::{AdapterError, Opcode};

/// One decoded instruction: an opcode plus the offset it was found at.
///
/// The offset is a monotonically increasing key used as a jump target — it
/// need not be a CPython-style byte offset, only stable within one
/// [`HostCode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: Opcode,
    pub offset: u32,
}

/// The normalized output of the Bytecode Adapter (§4.2): everything the
/// Symbolic Interpreter needs to execute one function's body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HostCode {
    /// Ordered instruction stream.
    pub instructions: Vec<Instruction>,
    /// Constant pool, indexed by `LoadConst`'s operand.
    pub constants: Vec<Scalar>,
    /// Local-slot names, indexed by `LoadFast`/`StoreFast`'s operand. The
    /// first `param_count` entries are the function's parameters in order.
    pub local_names: Vec<String>,
    /// Global/attribute name pool, indexed by `LoadGlobal`/`LoadAttr`'s operand.
    pub names: Vec<String>,
    /// Free-variable cells (the closure), in capture order, indexed by
    /// `LoadDeref`'s operand. The value is the snapshot at translation time.
    pub free_vars: IndexMap<String, Scalar>,
    /// Nested function code objects, indexed by `MakeFunction`'s operand.
    pub code_objects: Vec<HostCode>,
    /// Number of leading `local_names` entries that are parameters.
    pub param_count: usize,
}

impl HostCode {
    /// Name of the instruction at `offset`, or `None` if no instruction has
    /// that offset (a malformed jump target).
    #[must_use]
    pub fn index_of_offset(&self, offset: u32) -> Option<usize> {
        self.instructions.iter().position(|instr| instr.offset == offset)
    }

    /// The parameter names, in declaration order.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.local_names[..self.param_count]
    }
}

/// The pluggable host-specific decoder contract of §4.2/§9.
///
/// A concrete implementation hides the host's own opcode numbering and
/// produces a [`HostCode`]. This crate ships no live decoder for any real
/// host language runtime — only [`crate::builder::HostCodeBuilder`], used to
/// construct normalized instruction streams directly (for tests, demos, and
/// as the target shape a real decoder must produce). A production host
/// binding (e.g. one that reads a live function's compiled bytecode) is a
/// separate adapter crate implementing this trait.
pub trait BytecodeSource {
    fn decode(&self) -> Result<HostCode, AdapterError>;
}

impl BytecodeSource for HostCode {
    fn decode(&self) -> Result<HostCode, AdapterError> {
        Ok(self.clone())
    }
}
