//! The Symbolic Interpreter (§4.3): executes a normalized instruction stream
//! over a stack of QIR expressions, reconstructing control flow by
//! structural recognition of jump patterns rather than general symbolic
//! branch execution.

use std::collections::HashMap;

use qir_bytecode::{BytecodeSource, HostCode, Opcode};
use qir_core::{Expr, Scalar};

use crate::error::TranslationError;
use crate::limits::LimitTracker;
use crate::resolver::{Resolution, SourceTable};
use crate::tracer::{Pattern, Tracer};

/// Everything threaded through recursive interpretation: the injected
/// sources, and the tracer/limit-guard pair shared across the whole
/// translation (including isolated sub-interpretations of branch arms and
/// nested functions, so the instruction budget is global, not per-call).
pub struct Ctx<'a> {
    pub sources: &'a SourceTable,
    pub tracer: &'a mut dyn Tracer,
    pub budget: &'a mut dyn LimitTracker,
}

/// A local slot's current symbolic binding. `is_row` marks bindings
/// introduced as a comprehension's loop variable — only these are eligible
/// for `LOAD_ATTR`'s `Reference` form (§4.3).
#[derive(Debug, Clone)]
struct Binding {
    expr: Expr,
    is_row: bool,
}

/// A symbolic stack slot. Most opcodes operate on `Expr`; `MAKE_FUNCTION`
/// pushes a `Closure`, resolved only by a following `CALL`.
#[derive(Debug, Clone)]
enum StackValue {
    Expr(Expr),
    Closure(u32),
}

fn index_of(code: &HostCode, offset: u32, at: u32) -> Result<usize, TranslationError> {
    code.index_of_offset(offset).ok_or(TranslationError::UnbalancedJump { offset: at })
}

fn pool_get<'a, T>(pool: &'a [T], index: u32, offset: u32) -> Result<&'a T, TranslationError> {
    pool.get(index as usize).ok_or(TranslationError::StackUnderflow { offset })
}

fn pop(stack: &mut Vec<StackValue>, offset: u32) -> Result<StackValue, TranslationError> {
    stack.pop().ok_or(TranslationError::StackUnderflow { offset })
}

fn pop_expr(stack: &mut Vec<StackValue>, tracer: &mut dyn Tracer, offset: u32) -> Result<Expr, TranslationError> {
    match pop(stack, offset)? {
        StackValue::Expr(expr) => {
            tracer.on_pop(&expr);
            Ok(expr)
        }
        StackValue::Closure(_) => Err(TranslationError::UnsupportedControlFlow { offset }),
    }
}

fn push_expr(stack: &mut Vec<StackValue>, tracer: &mut dyn Tracer, expr: Expr) {
    tracer.on_push(&expr);
    stack.push(StackValue::Expr(expr));
}

/// Translates a top-level function: parameters are bound to fresh
/// `Identifier` leaves and the result is wrapped in one `Lambda` per
/// parameter (outermost first), per the currying convention.
pub(crate) fn translate_function(code: &HostCode, ctx: &mut Ctx<'_>) -> Result<Expr, TranslationError> {
    let params = code.param_names().to_vec();
    let mut locals = HashMap::new();
    for name in &params {
        locals.insert(name.clone(), Binding { expr: Expr::Identifier(name.clone()), is_row: false });
    }
    ctx.budget.enter_frame()?;
    let body = exec_one(code, 0, code.instructions.len(), &locals, ctx);
    ctx.budget.exit_frame();
    let body = body?;
    Ok(params
        .into_iter()
        .rev()
        .fold(body, |acc, param| Expr::Lambda { param, body: Box::new(acc) }))
}

/// Interprets `code` with its parameters substituted directly for `args`
/// (no `Lambda` wrapper) — the inlining behavior §4.3 describes for
/// `MAKE_FUNCTION` immediately followed by `CALL`.
fn interpret_inline(code: &HostCode, args: Vec<Expr>, ctx: &mut Ctx<'_>) -> Result<Expr, TranslationError> {
    let params = code.param_names();
    if params.len() != args.len() {
        return Err(TranslationError::UnsupportedControlFlow { offset: 0 });
    }
    let mut locals = HashMap::new();
    for (name, arg) in params.iter().zip(args) {
        locals.insert(name.clone(), Binding { expr: arg, is_row: false });
    }
    ctx.budget.enter_frame()?;
    let result = exec_one(code, 0, code.instructions.len(), &locals, ctx);
    ctx.budget.exit_frame();
    result
}

/// Runs `[start, end)` and returns the single expression left on top of the
/// stack — either because `RETURN_VALUE` fired, or because execution ran
/// off the end of the range.
fn exec_one(
    code: &HostCode,
    start: usize,
    end: usize,
    locals: &HashMap<String, Binding>,
    ctx: &mut Ctx<'_>,
) -> Result<Expr, TranslationError> {
    let (mut stack, last_offset) = exec_range(code, start, end, locals, ctx)?;
    stack.pop().ok_or(TranslationError::StackUnderflow { offset: last_offset })
}

/// Runs `[start, end)` over a private clone of `locals`, returning whatever
/// remains on the stack and the offset of the last instruction processed
/// (used for error reporting when the stack is empty).
fn exec_range(
    code: &HostCode,
    start: usize,
    end: usize,
    locals: &HashMap<String, Binding>,
    ctx: &mut Ctx<'_>,
) -> Result<(Vec<Expr>, u32), TranslationError> {
    let mut locals = locals.clone();
    let mut stack: Vec<StackValue> = Vec::new();
    let mut pos = start;
    let mut last_offset = 0;
    while pos < end {
        ctx.budget.tick()?;
        let instr_offset = code.instructions[pos].offset;
        last_offset = instr_offset;
        ctx.tracer.on_instruction(instr_offset);
        let op = code.instructions[pos].op.clone();
        match op {
            Opcode::LoadConst(idx) => {
                let value = pool_get(&code.constants, idx, instr_offset)?.clone();
                push_expr(&mut stack, ctx.tracer, Expr::Value(value));
                pos += 1;
            }
            Opcode::LoadFast(idx) => {
                let name = pool_get(&code.local_names, idx, instr_offset)?.clone();
                let binding = locals
                    .get(&name)
                    .ok_or_else(|| TranslationError::UnresolvedName { name: name.clone(), offset: instr_offset })?;
                push_expr(&mut stack, ctx.tracer, binding.expr.clone());
                pos += 1;
            }
            Opcode::LoadDeref(idx) => {
                let (_, value) = code
                    .free_vars
                    .get_index(idx as usize)
                    .ok_or(TranslationError::StackUnderflow { offset: instr_offset })?;
                push_expr(&mut stack, ctx.tracer, Expr::Value(value.clone()));
                pos += 1;
            }
            Opcode::LoadGlobal(idx) => {
                let name = pool_get(&code.names, idx, instr_offset)?.clone();
                let resolved = resolve_name(&name, instr_offset, ctx)?;
                ctx.tracer.on_resolved(&name, &resolved);
                push_expr(&mut stack, ctx.tracer, resolved);
                pos += 1;
            }
            Opcode::LoadAttr(idx) => {
                let field = pool_get(&code.names, idx, instr_offset)?.clone();
                let x = pop_expr(&mut stack, ctx.tracer, instr_offset)?;
                let result = match x {
                    Expr::Identifier(name) if locals.get(&name).is_some_and(|b| b.is_row) => {
                        Expr::Reference { source: name, field }
                    }
                    other => {
                        Expr::TupleDestr { scrutinee: Box::new(other), key: Box::new(Expr::Value(Scalar::Str(field))) }
                    }
                };
                push_expr(&mut stack, ctx.tracer, result);
                pos += 1;
            }
            Opcode::StoreFast(idx) => {
                let name = pool_get(&code.local_names, idx, instr_offset)?.clone();
                let value = pop_expr(&mut stack, ctx.tracer, instr_offset)?;
                locals.insert(name, Binding { expr: value, is_row: false });
                pos += 1;
            }
            Opcode::CompareOp(kind) => {
                let right = pop_expr(&mut stack, ctx.tracer, instr_offset)?;
                let left = pop_expr(&mut stack, ctx.tracer, instr_offset)?;
                let builtin = Expr::Builtin { module: "operator".to_owned(), symbol: kind.builtin_symbol().to_owned() };
                push_expr(&mut stack, ctx.tracer, Expr::apply_all(builtin, [left, right]));
                pos += 1;
            }
            Opcode::BinaryOp(kind) => {
                let right = pop_expr(&mut stack, ctx.tracer, instr_offset)?;
                let left = pop_expr(&mut stack, ctx.tracer, instr_offset)?;
                let builtin = Expr::Builtin { module: "operator".to_owned(), symbol: kind.builtin_symbol().to_owned() };
                push_expr(&mut stack, ctx.tracer, Expr::apply_all(builtin, [left, right]));
                pos += 1;
            }
            Opcode::UnaryNot => {
                let value = pop_expr(&mut stack, ctx.tracer, instr_offset)?;
                let builtin = Expr::Builtin { module: "operator".to_owned(), symbol: "not_".to_owned() };
                push_expr(&mut stack, ctx.tracer, Expr::apply_all(builtin, [value]));
                pos += 1;
            }
            Opcode::BuildList(count) | Opcode::BuildTuple(count) => {
                let mut acc = Expr::nil_list();
                for _ in 0..count {
                    let value = pop_expr(&mut stack, ctx.tracer, instr_offset)?;
                    acc = Expr::cons(value, acc);
                }
                push_expr(&mut stack, ctx.tracer, acc);
                pos += 1;
            }
            Opcode::BuildMap(count) => {
                let mut acc = Expr::nil_tuple();
                for _ in 0..count {
                    let value = pop_expr(&mut stack, ctx.tracer, instr_offset)?;
                    let key = pop_expr(&mut stack, ctx.tracer, instr_offset)?;
                    acc = Expr::tuple_cons(key, value, acc);
                }
                push_expr(&mut stack, ctx.tracer, acc);
                pos += 1;
            }
            Opcode::ListAppend(_) | Opcode::MapAdd(_) => {
                return Err(TranslationError::UnsupportedControlFlow { offset: instr_offset });
            }
            Opcode::Call(nargs) => {
                let mut args = Vec::with_capacity(nargs as usize);
                for _ in 0..nargs {
                    args.push(pop_expr(&mut stack, ctx.tracer, instr_offset)?);
                }
                args.reverse();
                match pop(&mut stack, instr_offset)? {
                    StackValue::Closure(idx) => {
                        let nested = pool_get(&code.code_objects, idx, instr_offset)?.clone();
                        let result = interpret_inline(&nested, args, ctx)?;
                        push_expr(&mut stack, ctx.tracer, result);
                    }
                    StackValue::Expr(callee) => {
                        ctx.tracer.on_pop(&callee);
                        push_expr(&mut stack, ctx.tracer, Expr::apply_all(callee, args));
                    }
                }
                pos += 1;
            }
            Opcode::MakeFunction(idx) => {
                stack.push(StackValue::Closure(idx));
                pos += 1;
            }
            Opcode::ReturnValue => {
                let value = pop_expr(&mut stack, ctx.tracer, instr_offset)?;
                return Ok((vec![value], instr_offset));
            }
            Opcode::Jump(target) => {
                pos = index_of(code, target, instr_offset)?;
            }
            Opcode::JumpIfFalse { target, pop: pop_flag } => {
                let cond = pop_expr(&mut stack, ctx.tracer, instr_offset)?;
                let target_idx = index_of(code, target, instr_offset)?;
                if pop_flag {
                    let (then_expr, else_expr, after_idx) =
                        lift_ternary(code, pos, target_idx, instr_offset, &locals, ctx)?;
                    ctx.tracer.on_pattern_recognized(Pattern::Ternary, instr_offset);
                    push_expr(
                        &mut stack,
                        ctx.tracer,
                        Expr::Conditional {
                            cond: Box::new(cond),
                            then_branch: Box::new(then_expr),
                            else_branch: Box::new(else_expr),
                        },
                    );
                    pos = after_idx;
                } else {
                    let rhs = exec_one(code, pos + 1, target_idx, &locals, ctx)?;
                    ctx.tracer.on_pattern_recognized(Pattern::ShortCircuitAnd, instr_offset);
                    push_expr(
                        &mut stack,
                        ctx.tracer,
                        Expr::Conditional {
                            cond: Box::new(cond.clone()),
                            then_branch: Box::new(rhs),
                            else_branch: Box::new(cond),
                        },
                    );
                    pos = target_idx;
                }
            }
            Opcode::JumpIfTrue { target, pop: pop_flag } => {
                let cond = pop_expr(&mut stack, ctx.tracer, instr_offset)?;
                if pop_flag {
                    return Err(TranslationError::UnsupportedControlFlow { offset: instr_offset });
                }
                let target_idx = index_of(code, target, instr_offset)?;
                let rhs = exec_one(code, pos + 1, target_idx, &locals, ctx)?;
                ctx.tracer.on_pattern_recognized(Pattern::ShortCircuitOr, instr_offset);
                push_expr(
                    &mut stack,
                    ctx.tracer,
                    Expr::Conditional {
                        cond: Box::new(cond.clone()),
                        then_branch: Box::new(cond),
                        else_branch: Box::new(rhs),
                    },
                );
                pos = target_idx;
            }
            Opcode::ForIter { target } => {
                let input = pop_expr(&mut stack, ctx.tracer, instr_offset)?;
                let (result, next_pos) = lift_for_clause(code, pos, target, instr_offset, input, &locals, ctx)?;
                ctx.tracer.on_pattern_recognized(Pattern::Comprehension, instr_offset);
                push_expr(&mut stack, ctx.tracer, result);
                pos = next_pos;
            }
            Opcode::GetIter => {
                pos += 1;
            }
            Opcode::Unsupported(text) => {
                return Err(TranslationError::UnsupportedOpcode { text, offset: instr_offset });
            }
        }
    }
    let values = stack
        .into_iter()
        .map(|sv| match sv {
            StackValue::Expr(expr) => Ok(expr),
            StackValue::Closure(_) => Err(TranslationError::UnsupportedControlFlow { offset: last_offset }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((values, last_offset))
}

fn resolve_name(name: &str, offset: u32, ctx: &mut Ctx<'_>) -> Result<Expr, TranslationError> {
    match ctx.sources.resolve(name) {
        Some(Resolution::Source(source)) => Ok(Expr::scan(&source)),
        Some(Resolution::UserFunction(code)) => translate_function(&code, ctx),
        Some(Resolution::Builtin { module, symbol }) => Ok(Expr::Builtin { module, symbol }),
        Some(Resolution::Global(value)) => Ok(Expr::Value(value)),
        None => Err(TranslationError::UnresolvedName { name: name.to_owned(), offset }),
    }
}

/// Recognizes the ternary shape: `JUMP_IF_FALSE(target)` whose target is
/// immediately preceded by an unconditional `JUMP(after)` ending the `then`
/// arm, with `[target, after)` forming the `else` arm.
fn lift_ternary(
    code: &HostCode,
    jump_pos: usize,
    target_idx: usize,
    at: u32,
    locals: &HashMap<String, Binding>,
    ctx: &mut Ctx<'_>,
) -> Result<(Expr, Expr, usize), TranslationError> {
    if target_idx == 0 {
        return Err(TranslationError::UnsupportedControlFlow { offset: at });
    }
    let Opcode::Jump(after) = code.instructions[target_idx - 1].op else {
        return Err(TranslationError::UnsupportedControlFlow { offset: at });
    };
    let after_idx = index_of(code, after, at)?;
    let then_expr = exec_one(code, jump_pos + 1, target_idx - 1, locals, ctx)?;
    let else_expr = exec_one(code, target_idx, after_idx, locals, ctx)?;
    Ok((then_expr, else_expr, after_idx))
}

enum Marker {
    Guard,
    Nested,
    Append,
    MapAdd,
}

/// Scans forward from `cursor` for the next instruction structurally
/// relevant to the comprehension pattern: a guard's loop-continuing
/// `JUMP_IF_FALSE`, a nested `for` clause's `FOR_ITER`, or the terminal
/// `LIST_APPEND`/`MAP_ADD`.
fn next_marker(code: &HostCode, cursor: usize, for_iter_pos: usize) -> Option<(usize, Marker)> {
    let mut pos = cursor;
    while pos < code.instructions.len() {
        match &code.instructions[pos].op {
            Opcode::JumpIfFalse { target, pop: true } => {
                if code.index_of_offset(*target) == Some(for_iter_pos) {
                    return Some((pos, Marker::Guard));
                }
                pos += 1;
            }
            Opcode::ForIter { .. } => return Some((pos, Marker::Nested)),
            Opcode::ListAppend(_) => return Some((pos, Marker::Append)),
            Opcode::MapAdd(_) => return Some((pos, Marker::MapAdd)),
            _ => pos += 1,
        }
    }
    None
}

/// Lifts the comprehension pattern rooted at the `FOR_ITER` at `for_iter_pos`
/// into a SELECT/PROJECT combinator tree (§4.3 Comprehensions), returning
/// the tree and the instruction index where control resumes after the loop.
fn lift_for_clause(
    code: &HostCode,
    for_iter_pos: usize,
    exhaustion_target: u32,
    at: u32,
    input: Expr,
    locals: &HashMap<String, Binding>,
    ctx: &mut Ctx<'_>,
) -> Result<(Expr, usize), TranslationError> {
    let exhaustion_idx = index_of(code, exhaustion_target, at)?;
    let Some(Opcode::StoreFast(loopvar_slot)) = code.instructions.get(for_iter_pos + 1).map(|i| i.op.clone()) else {
        return Err(TranslationError::UnsupportedControlFlow { offset: at });
    };
    let loopvar = pool_get(&code.local_names, loopvar_slot, at)?.clone();
    let mut locals = locals.clone();
    locals.insert(loopvar.clone(), Binding { expr: Expr::Identifier(loopvar.clone()), is_row: true });

    let mut running_input = input;
    let mut cursor = for_iter_pos + 2;
    loop {
        let Some((marker_pos, marker)) = next_marker(code, cursor, for_iter_pos) else {
            return Err(TranslationError::UnsupportedControlFlow { offset: at });
        };
        match marker {
            Marker::Guard => {
                let predicate = exec_one(code, cursor, marker_pos, &locals, ctx)?;
                running_input = Expr::select(
                    running_input,
                    Expr::Lambda { param: loopvar.clone(), body: Box::new(predicate) },
                )
                .map_err(|_| TranslationError::UnsupportedControlFlow { offset: at })?;
                cursor = marker_pos + 1;
            }
            Marker::Nested => {
                let nested_input = exec_one(code, cursor, marker_pos, &locals, ctx)?;
                let Opcode::ForIter { target: nested_target } = code.instructions[marker_pos].op else {
                    unreachable!("next_marker only returns Nested for ForIter instructions")
                };
                let nested_offset = code.instructions[marker_pos].offset;
                ctx.budget.enter_frame()?;
                let nested_result =
                    lift_for_clause(code, marker_pos, nested_target, nested_offset, nested_input, &locals, ctx);
                ctx.budget.exit_frame();
                let (inner_tree, next_pos) = nested_result?;
                let result = Expr::project(
                    running_input,
                    Expr::Lambda { param: loopvar, body: Box::new(inner_tree) },
                )
                .map_err(|_| TranslationError::UnsupportedControlFlow { offset: at })?;
                let Some(Opcode::Jump(back)) = code.instructions.get(next_pos).map(|i| i.op.clone()) else {
                    return Err(TranslationError::UnsupportedControlFlow { offset: at });
                };
                if code.index_of_offset(back) != Some(for_iter_pos) {
                    return Err(TranslationError::UnsupportedControlFlow { offset: at });
                }
                return Ok((result, exhaustion_idx));
            }
            Marker::Append => {
                let body = exec_one(code, cursor, marker_pos, &locals, ctx)?;
                let result = finish_loop(code, marker_pos, for_iter_pos, at, running_input, loopvar, body, exhaustion_idx)?;
                return Ok(result);
            }
            Marker::MapAdd => {
                let (mut values, _) = exec_range(code, cursor, marker_pos, &locals, ctx)?;
                let value = values.pop().ok_or(TranslationError::StackUnderflow { offset: at })?;
                let key = values.pop().ok_or(TranslationError::StackUnderflow { offset: at })?;
                let body = Expr::tuple_cons(key, value, Expr::nil_tuple());
                let result = finish_loop(code, marker_pos, for_iter_pos, at, running_input, loopvar, body, exhaustion_idx)?;
                return Ok(result);
            }
        }
    }
}

fn finish_loop(
    code: &HostCode,
    append_pos: usize,
    for_iter_pos: usize,
    at: u32,
    running_input: Expr,
    loopvar: String,
    projection_body: Expr,
    exhaustion_idx: usize,
) -> Result<(Expr, usize), TranslationError> {
    let Some(Opcode::Jump(back)) = code.instructions.get(append_pos + 1).map(|i| i.op.clone()) else {
        return Err(TranslationError::UnsupportedControlFlow { offset: at });
    };
    if code.index_of_offset(back) != Some(for_iter_pos) {
        return Err(TranslationError::UnsupportedControlFlow { offset: at });
    }
    let result = Expr::project(running_input, Expr::Lambda { param: loopvar, body: Box::new(projection_body) })
        .map_err(|_| TranslationError::UnsupportedControlFlow { offset: at })?;
    Ok((result, exhaustion_idx))
}

/// Decodes `source` and translates its top-level body.
pub(crate) fn translate_source(source: &dyn BytecodeSource, ctx: &mut Ctx<'_>) -> Result<Expr, TranslationError> {
    let code = source.decode()?;
    translate_function(&code, ctx)
}
