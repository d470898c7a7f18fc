use indexmap::IndexMap;
use qir_core::Scalar;

use crate::{HostCode, Instruction, Opcode};

/// A patch point returned by [`HostCodeBuilder::emit_jump_if_false`] /
/// [`HostCodeBuilder::emit_jump_if_true`] / [`HostCodeBuilder::emit_jump`],
/// to be resolved later with [`HostCodeBuilder::patch_to_here`] once the
/// jump target is known.
///
/// Mirrors the forward-jump-then-patch idiom used by bytecode emitters: the
/// target is unknown at emission time (the jump is usually forward, over
/// code not yet built), so the builder emits a placeholder and records where
/// to come back and fix it up.
#[derive(Debug, Clone, Copy)]
pub struct PatchPoint(usize);

/// Builds a [`HostCode`] by emitting normalized instructions directly.
///
/// Used by tests, the CLI demo, and as the target shape any real
/// host-specific bytecode decoder must produce.
#[derive(Debug, Default)]
pub struct HostCodeBuilder {
    instructions: Vec<Instruction>,
    constants: Vec<Scalar>,
    local_names: Vec<String>,
    names: Vec<String>,
    free_vars: IndexMap<String, Scalar>,
    code_objects: Vec<HostCode>,
    param_count: usize,
}

impl HostCodeBuilder {
    /// Starts a new function with the given parameter names, seeded as the
    /// first local slots per §4.3 ("seeded by the function parameters as
    /// `Identifier` leaves").
    #[must_use]
    pub fn new(params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let local_names: Vec<String> = params.into_iter().map(Into::into).collect();
        let param_count = local_names.len();
        Self {
            local_names,
            param_count,
            ..Self::default()
        }
    }

    /// Emits an instruction, returning its offset (here, its index in the
    /// instruction stream — stable within this builder's output).
    pub fn emit(&mut self, op: Opcode) -> u32 {
        let offset = self.instructions.len() as u32;
        self.instructions.push(Instruction { op, offset });
        offset
    }

    /// Emits `Jump` with a placeholder target, to be resolved by [`Self::patch_to_here`].
    pub fn emit_jump(&mut self) -> PatchPoint {
        let index = self.instructions.len();
        self.emit(Opcode::Jump(u32::MAX));
        PatchPoint(index)
    }

    /// Emits `JumpIfFalse` with a placeholder target.
    pub fn emit_jump_if_false(&mut self, pop: bool) -> PatchPoint {
        let index = self.instructions.len();
        self.emit(Opcode::JumpIfFalse { target: u32::MAX, pop });
        PatchPoint(index)
    }

    /// Emits `JumpIfTrue` with a placeholder target.
    pub fn emit_jump_if_true(&mut self, pop: bool) -> PatchPoint {
        let index = self.instructions.len();
        self.emit(Opcode::JumpIfTrue { target: u32::MAX, pop });
        PatchPoint(index)
    }

    /// Emits `ForIter` with a placeholder exhaustion target.
    pub fn emit_for_iter(&mut self) -> PatchPoint {
        let index = self.instructions.len();
        self.emit(Opcode::ForIter { target: u32::MAX });
        PatchPoint(index)
    }

    /// Resolves a previously emitted jump/`ForIter` placeholder to jump to
    /// the instruction about to be emitted next.
    pub fn patch_to_here(&mut self, patch: PatchPoint) {
        let target = self.instructions.len() as u32;
        self.patch_to(patch, target);
    }

    /// Resolves a previously emitted jump/`ForIter` placeholder to an
    /// explicit target offset.
    pub fn patch_to(&mut self, patch: PatchPoint, target: u32) {
        let instr = &mut self.instructions[patch.0];
        instr.op = match &instr.op {
            Opcode::Jump(_) => Opcode::Jump(target),
            Opcode::JumpIfFalse { pop, .. } => Opcode::JumpIfFalse { target, pop: *pop },
            Opcode::JumpIfTrue { pop, .. } => Opcode::JumpIfTrue { target, pop: *pop },
            Opcode::ForIter { .. } => Opcode::ForIter { target },
            other => panic!("patch_to called on non-jump opcode {other:?}"),
        };
    }

    /// Interns a constant, returning its pool index.
    pub fn add_const(&mut self, value: impl Into<Scalar>) -> u32 {
        self.constants.push(value.into());
        (self.constants.len() - 1) as u32
    }

    /// Gets or creates a local slot for `name`, returning its index.
    pub fn local_slot(&mut self, name: impl Into<String>) -> u32 {
        let name = name.into();
        if let Some(index) = self.local_names.iter().position(|n| n == &name) {
            return index as u32;
        }
        self.local_names.push(name);
        (self.local_names.len() - 1) as u32
    }

    /// Gets or creates a name-pool entry (for `LoadGlobal`/`LoadAttr`).
    pub fn name_index(&mut self, name: impl Into<String>) -> u32 {
        let name = name.into();
        if let Some(index) = self.names.iter().position(|n| n == &name) {
            return index as u32;
        }
        self.names.push(name);
        (self.names.len() - 1) as u32
    }

    /// Registers a free-variable cell with its captured value snapshot.
    pub fn free_var(&mut self, name: impl Into<String>, value: impl Into<Scalar>) -> u32 {
        let (index, _) = self.free_vars.insert_full(name.into(), value.into());
        index as u32
    }

    /// Registers a nested function's code object (for `MakeFunction`).
    pub fn nested_function(&mut self, code: HostCode) -> u32 {
        self.code_objects.push(code);
        (self.code_objects.len() - 1) as u32
    }

    /// Finishes building and returns the assembled [`HostCode`].
    #[must_use]
    pub fn build(self) -> HostCode {
        HostCode {
            instructions: self.instructions,
            constants: self.constants,
            local_names: self.local_names,
            names: self.names,
            free_vars: self.free_vars,
            code_objects: self.code_objects,
            param_count: self.param_count,
        }
    }
}
