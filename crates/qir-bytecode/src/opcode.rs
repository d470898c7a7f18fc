use serde::{Deserialize, Serialize};

/// The six comparison relations recognized by `COMPARE_OP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareKind {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl CompareKind {
    /// The `operator` module symbol this relation maps to, per §4.3.
    #[must_use]
    pub fn builtin_symbol(self) -> &'static str {
        match self {
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Ge => "ge",
            Self::Gt => "gt",
        }
    }
}

/// Arithmetic and bitwise/logical-token relations recognized by `BINARY_OP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryKind {
    Add,
    Sub,
    Mul,
    TrueDiv,
    FloorDiv,
    Mod,
    Pow,
    And,
    Or,
}

impl BinaryKind {
    /// The fixed table mapping a binary token to its `operator` module symbol.
    #[must_use]
    pub fn builtin_symbol(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::TrueDiv => "truediv",
            Self::FloorDiv => "floordiv",
            Self::Mod => "mod",
            Self::Pow => "pow",
            Self::And => "and_",
            Self::Or => "or_",
        }
    }
}

/// A normalized, host-independent opcode.
///
/// The Bytecode Adapter's job (§4.2) is to produce a sequence of these from
/// whatever opcode numbering the host actually uses. Operands are carried
/// inline rather than as a separate tag+payload pair, since each opcode has
/// exactly one operand shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Opcode {
    /// Push the constant at this index in the constant pool.
    LoadConst(u32),
    /// Push the current symbolic binding of this local slot.
    LoadFast(u32),
    /// Push the literal captured in this closure cell (evaluated now).
    LoadDeref(u32),
    /// Consult the Binding Resolver for this name-pool entry.
    LoadGlobal(u32),
    /// Pop `x`, push the attribute access `x.<name>`.
    LoadAttr(u32),
    /// Pop the top of stack into this local slot.
    StoreFast(u32),
    /// Pop `right, left`; apply the named comparison.
    CompareOp(CompareKind),
    /// Pop `right, left`; apply the named arithmetic/logical token.
    BinaryOp(BinaryKind),
    /// Logical negation of the top of stack.
    UnaryNot,
    /// Pop `k` values, build a list in source order.
    BuildList(u32),
    /// Pop `k` values, build a tuple in source order.
    BuildTuple(u32),
    /// Pop `k` key/value pairs, build a map preserving source order.
    BuildMap(u32),
    /// Comprehension accumulator: append to the list `depth` frames down.
    ListAppend(u32),
    /// Comprehension accumulator: insert a key/value pair `depth` frames down.
    MapAdd(u32),
    /// Pop `k` arguments and one callee; apply (curried).
    Call(u32),
    /// Build a closure over the nested code object at this pool index.
    MakeFunction(u32),
    /// Terminate interpretation; the top of stack is the result.
    ReturnValue,
    /// Unconditional jump to the instruction index `target`.
    Jump(u32),
    /// Conditional jump if the top of stack is truthy.
    JumpIfTrue { target: u32, pop: bool },
    /// Conditional jump if the top of stack is falsy.
    JumpIfFalse { target: u32, pop: bool },
    /// Advance the iterator on top of stack, or jump to `target` if exhausted.
    ForIter { target: u32 },
    /// Pop an iterable, push an iterator over it.
    GetIter,
    /// An opcode the adapter could not map to the normalized set.
    Unsupported(String),
}
