//! The Bytecode Adapter (§4.2): a host-independent instruction shape and
//! the contract a host-specific decoder must satisfy.
//!
//! The adapter's whole job is to hide the host's own opcode numbering
//! behind [`Opcode`] and deliver a self-contained [`HostCode`]: the
//! instruction stream plus the constant pool, local-name table,
//! free-variable cells, and name pool the Symbolic Interpreter consults for
//! every instruction.

mod builder;
mod error;
mod hostcode;
mod opcode;

pub use builder::{HostCodeBuilder, PatchPoint};
pub use error::AdapterError;
pub use hostcode::{BytecodeSource, HostCode, Instruction};
pub use opcode::{BinaryKind, CompareKind, Opcode};
