//! Single-threaded stack-machine interpreter for a bytecode sequence (spec
//! C9 / §4.8). Width mismatches are fatal (spec §4.8 "operand width
//! mismatches are a ... invariant violation, never a runtime value"): this
//! crate's deducer guarantees every operand pair it hands to the emitter
//! already agrees on width, so a mismatch here means a compiler bug, not bad
//! input, and is reported as `Error::Internal`.

use std::rc::Rc;

use crate::errors::{Error, Result};
use crate::source::Span;
use crate::value::{Builtin, FnRef, Value};

use super::op::{Bytecode, Op};

/// A user function callable by `Op::Call(FnRef::User(_))`. The emitter and
/// interpreter never resolve user functions by name; the caller supplies a
/// resolver so recursive/mutual calls can be wired up by whatever owns the
/// whole module's function table (spec §4.4 "Functions called from constexpr
/// context must themselves be fully typechecked first").
pub trait FnResolver {
    fn call(&self, id: crate::value::FnId, args: &[Value]) -> Result<Value>;
}

/// An interpreter with no user functions registered; any `Call(User(_))`
/// fails. Sufficient for the pure-bits seed scenarios in spec §8 and for
/// constexpr evaluation of expressions that don't call user functions.
pub struct NoUserFns;

impl FnResolver for NoUserFns {
    fn call(&self, id: crate::value::FnId, _args: &[Value]) -> Result<Value> {
        Err(Error::internal(Span::dummy(), format!("no resolver registered for user function #{}", id.0)))
    }
}

fn bits_of(v: &Value, span: Span) -> Result<&crate::number::Bits> {
    v.bits().ok_or_else(|| Error::internal(span, "expected a bits value on the stack"))
}

fn check_width(a: &crate::number::Bits, b: &crate::number::Bits, span: Span) -> Result<()> {
    if a.width() != b.width() {
        Err(Error::internal(span, format!("operand width mismatch: {} vs {}", a.width(), b.width())))
    } else {
        Ok(())
    }
}

/// Run `ops` to completion and return the final value left by `Return`.
/// `slots` is sized by the emitter's reported `num_slots`; `args` seed slots
/// `0..args.len()`, matching "Parameters occupy slots 0..P-1" (spec §3).
pub fn run(ops: &[Bytecode], num_slots: u32, args: &[Value], resolver: &dyn FnResolver) -> Result<Value> {
    let mut stack: Vec<Value> = Vec::new();
    let mut slots: Vec<Option<Value>> = vec![None; num_slots as usize];
    for (i, a) in args.iter().enumerate() {
        slots[i] = Some(a.clone());
    }

    let mut pc: usize = 0;
    while pc < ops.len() {
        let bc = &ops[pc];
        let span = bc.span;
        match &bc.op {
            Op::Literal(v) => stack.push(v.clone()),
            Op::Load(slot) => {
                let v = slots[*slot as usize]
                    .clone()
                    .ok_or_else(|| Error::internal(span, format!("read of uninitialized slot {}", slot)))?;
                stack.push(v);
            }
            Op::Store(slot) => {
                let v = pop(&mut stack, span)?;
                slots[*slot as usize] = Some(v);
            }
            Op::Add | Op::Sub | Op::Mul | Op::Div | Op::And | Op::Or | Op::Xor => {
                let rhs = pop(&mut stack, span)?;
                let lhs = pop(&mut stack, span)?;
                let lb = bits_of(&lhs, span)?;
                let rb = bits_of(&rhs, span)?;
                check_width(lb, rb, span)?;
                let result = match &bc.op {
                    Op::Add => lb.add(rb),
                    Op::Sub => lb.sub(rb),
                    Op::Mul => lb.mul(rb),
                    Op::Div => lb.div(rb),
                    Op::And => lb.bitand(rb),
                    Op::Or => lb.bitor(rb),
                    Op::Xor => lb.bitxor(rb),
                    _ => unreachable!(),
                };
                stack.push(wrap_like(&lhs, result));
            }
            Op::Shll | Op::Shrl | Op::Shra => {
                let amount = pop(&mut stack, span)?;
                let base = pop(&mut stack, span)?;
                let base_bits = bits_of(&base, span)?;
                let amount_u32 = amount
                    .as_u64()
                    .ok_or_else(|| Error::internal(span, "shift amount must be a bits value"))? as u32;
                let result = match &bc.op {
                    Op::Shll => base_bits.shll(amount_u32),
                    Op::Shrl => base_bits.shrl(amount_u32),
                    Op::Shra => base_bits.shra(amount_u32),
                    _ => unreachable!(),
                };
                stack.push(wrap_like(&base, result));
            }
            Op::Concat => {
                let rhs = pop(&mut stack, span)?;
                let lhs = pop(&mut stack, span)?;
                let lb = bits_of(&lhs, span)?;
                let rb = bits_of(&rhs, span)?;
                stack.push(Value::UBits(lb.concat(rb)));
            }
            Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge => {
                let rhs = pop(&mut stack, span)?;
                let lhs = pop(&mut stack, span)?;
                let lb = bits_of(&lhs, span)?;
                let rb = bits_of(&rhs, span)?;
                check_width(lb, rb, span)?;
                let ord = lb.cmp_value(rb);
                let b = match &bc.op {
                    Op::Eq => ord == std::cmp::Ordering::Equal,
                    Op::Ne => ord != std::cmp::Ordering::Equal,
                    Op::Lt => ord == std::cmp::Ordering::Less,
                    Op::Le => ord != std::cmp::Ordering::Greater,
                    Op::Gt => ord == std::cmp::Ordering::Greater,
                    Op::Ge => ord != std::cmp::Ordering::Less,
                    _ => unreachable!(),
                };
                stack.push(Value::bool_value(b));
            }
            Op::Invert => {
                let v = pop(&mut stack, span)?;
                let b = bits_of(&v, span)?;
                stack.push(wrap_like(&v, b.invert()));
            }
            Op::Negate => {
                let v = pop(&mut stack, span)?;
                let b = bits_of(&v, span)?;
                stack.push(wrap_like(&v, b.negate()));
            }
            Op::Cast(ty) => {
                let v = pop(&mut stack, span)?;
                stack.push(cast_value(v, ty, span)?);
            }
            Op::Index => {
                let idx = pop(&mut stack, span)?;
                let base = pop(&mut stack, span)?;
                let i = idx
                    .as_usize()
                    .ok_or_else(|| Error::internal(span, "index must be a bits value"))?;
                stack.push(index_value(&base, i, span)?);
            }
            Op::Slice { start, width } => {
                let base = pop(&mut stack, span)?;
                let b = bits_of(&base, span)?;
                stack.push(Value::UBits(b.slice(*start as usize, *width as usize)));
            }
            Op::WidthSlice { width } => {
                let start = pop(&mut stack, span)?;
                let base = pop(&mut stack, span)?;
                let b = bits_of(&base, span)?;
                let s = start.as_usize().ok_or_else(|| Error::internal(span, "slice start must be a bits value"))?;
                stack.push(Value::UBits(b.slice(s, *width as usize)));
            }
            Op::CreateTuple(n) => {
                let items = pop_n(&mut stack, *n as usize, span)?;
                stack.push(Value::Tuple(Rc::new(items)));
            }
            Op::CreateArray(n) => {
                let items = pop_n(&mut stack, *n as usize, span)?;
                let tag = array_tag(&items, span)?;
                stack.push(Value::Array(Rc::new(items), tag));
            }
            Op::ExpandTuple => {
                let v = pop(&mut stack, span)?;
                match v {
                    Value::Tuple(items) => {
                        for item in items.iter().rev() {
                            stack.push(item.clone());
                        }
                    }
                    _ => return Err(Error::internal(span, "expand_tuple on a non-tuple value")),
                }
            }
            Op::Call(fr) => {
                let call = resolve_call_arity(ops, pc, fr)?;
                let args = pop_n(&mut stack, call, span)?;
                let result = match fr {
                    FnRef::User(id) => resolver.call(*id, &args)?,
                    FnRef::Builtin(b) => call_builtin(*b, &args, span)?,
                };
                stack.push(result);
            }
            Op::JumpRel(offset) => {
                pc = jump_target(pc, *offset, span)?;
                continue;
            }
            Op::JumpRelIf(offset) => {
                let cond = pop(&mut stack, span)?;
                let taken = cond.as_bool().ok_or_else(|| Error::internal(span, "jump_rel_if guard must be a bits value"))?;
                if taken {
                    pc = jump_target(pc, *offset, span)?;
                    continue;
                }
            }
            Op::JumpDest => {}
            Op::Return => {
                return pop(&mut stack, span);
            }
        }
        pc += 1;
    }
    Err(Error::internal(Span::dummy(), "bytecode stream fell off the end without a return"))
}

fn jump_target(pc: usize, offset: i32, span: Span) -> Result<usize> {
    let target = pc as i64 + offset as i64;
    if target < 0 {
        return Err(Error::internal(span, "jump target underflow"));
    }
    Ok(target as usize)
}

fn pop(stack: &mut Vec<Value>, span: Span) -> Result<Value> {
    stack.pop().ok_or_else(|| Error::internal(span, "stack underflow"))
}

fn pop_n(stack: &mut Vec<Value>, n: usize, span: Span) -> Result<Vec<Value>> {
    if stack.len() < n {
        return Err(Error::internal(span, "stack underflow"));
    }
    let items = stack.split_off(stack.len() - n);
    Ok(items)
}

fn wrap_like(original: &Value, result: crate::number::Bits) -> Value {
    match original {
        Value::SBits(_) => Value::SBits(result),
        _ => Value::UBits(result),
    }
}

fn array_tag(items: &[Value], span: Span) -> Result<crate::value::ElemTag> {
    match items.first().and_then(|v| v.bits()) {
        Some(b) => Ok(crate::value::ElemTag { width: b.width(), signed: b.is_signed() }),
        None => Err(Error::internal(span, "cannot infer element tag for an empty array at runtime")),
    }
}

fn index_value(base: &Value, i: usize, span: Span) -> Result<Value> {
    match base {
        Value::Array(items, _) | Value::Tuple(items) => items
            .get(i)
            .cloned()
            .ok_or_else(|| Error::internal(span, format!("index {} out of bounds", i))),
        _ => Err(Error::internal(span, "index on a non-aggregate value")),
    }
}

/// `call`'s bytecode carries no explicit arity, so it is derived from the
/// number of `Op::Call` preceding stack pushes the emitter produced: since
/// the emitter always emits exactly one value-push per argument immediately
/// before `Call`, the interpreter instead relies on the `FnRef` itself for
/// builtins (each has a fixed arity) and, for user functions, on the
/// resolver's own signature lookup. `ops`/`pc` are unused for arity lookup
/// today but kept so a future user-function arity cache can use them.
fn resolve_call_arity(_ops: &[Bytecode], _pc: usize, fr: &FnRef) -> Result<usize> {
    match fr {
        FnRef::Builtin(Builtin::AssertEq) => Ok(2),
        FnRef::Builtin(Builtin::AssertLt) => Ok(2),
        FnRef::Builtin(Builtin::Trace) => Ok(1),
        FnRef::Builtin(Builtin::Zero) => Ok(0),
        FnRef::Builtin(Builtin::Max) => Ok(2),
        FnRef::User(_) => Err(Error::internal(
            Span::dummy(),
            "user function arity must be supplied by the caller's FnResolver, not the bare interpreter",
        )),
    }
}

fn call_builtin(b: Builtin, args: &[Value], span: Span) -> Result<Value> {
    match b {
        Builtin::AssertEq => {
            let (lhs, rhs) = (&args[0], &args[1]);
            if lhs == rhs {
                Ok(Value::Tuple(Rc::new(Vec::new())))
            } else {
                Err(Error::constexpr(span, format!("assert_eq failed: {} != {}", lhs, rhs)))
            }
        }
        Builtin::AssertLt => {
            let lb = bits_of(&args[0], span)?;
            let rb = bits_of(&args[1], span)?;
            if lb.cmp_value(rb) == std::cmp::Ordering::Less {
                Ok(Value::Tuple(Rc::new(Vec::new())))
            } else {
                Err(Error::constexpr(span, format!("assert_lt failed: {} >= {}", args[0], args[1])))
            }
        }
        Builtin::Trace => {
            tracing::event!(tracing::Level::INFO, value = %args[0], "trace!");
            Ok(args[0].clone())
        }
        Builtin::Zero => Err(Error::internal(span, "zero!() requires static type context, not modeled at runtime")),
        Builtin::Max => {
            let lb = bits_of(&args[0], span)?;
            let rb = bits_of(&args[1], span)?;
            if lb.cmp_value(rb) == std::cmp::Ordering::Less {
                Ok(args[1].clone())
            } else {
                Ok(args[0].clone())
            }
        }
    }
}

/// `Cast` between bits widths/signedness (spec §4.8); array/struct casts are
/// not modeled since the emitter never emits them (spec §9 "array-to-bits
/// casts" are an explicit open question handled purely as a property test,
/// not as runtime-cast support here).
fn cast_value(v: Value, ty: &crate::types::Type, span: Span) -> Result<Value> {
    match ty {
        crate::types::Type::Bits { signed, size } => {
            let width = size.as_const().ok_or_else(|| Error::internal(span, "cast target width is not resolved"))? as usize;
            let b = bits_of(&v, span)?;
            let extended = b.extend_or_trunc(width);
            Ok(if *signed { Value::SBits(extended.with_signed(true)) } else { Value::UBits(extended.with_signed(false)) })
        }
        _ => Err(Error::internal(span, "only bits-to-bits casts are supported by the interpreter")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::op::{Bytecode, Op};
    use num::BigUint;

    fn lit_u32(n: u32) -> Bytecode {
        Bytecode::new(Op::Literal(Value::u32(n)), Span::dummy())
    }

    /// Seed scenario 1: `let foo = u32:1; foo + u32:2` evaluates to `u32:3`.
    #[test]
    fn runs_let_then_add() {
        let ops = vec![
            lit_u32(1),
            Bytecode::new(Op::Store(0), Span::dummy()),
            Bytecode::new(Op::Load(0), Span::dummy()),
            lit_u32(2),
            Bytecode::new(Op::Add, Span::dummy()),
            Bytecode::new(Op::Return, Span::dummy()),
        ];
        let result = run(&ops, 1, &[], &NoUserFns).unwrap();
        assert_eq!(result, Value::u32(3));
    }

    /// Seed scenario 2: the ternary's false branch is skipped when the guard
    /// is true, using the corrected `target = pc + offset` jump arithmetic.
    #[test]
    fn runs_ternary_true_branch() {
        let ops = vec![
            Bytecode::new(Op::Literal(Value::bool_value(true)), Span::dummy()),
            Bytecode::new(Op::JumpRelIf(3), Span::dummy()),
            lit_u32(64),
            Bytecode::new(Op::JumpRel(3), Span::dummy()),
            Bytecode::new(Op::JumpDest, Span::dummy()),
            lit_u32(42),
            Bytecode::new(Op::JumpDest, Span::dummy()),
            Bytecode::new(Op::Return, Span::dummy()),
        ];
        let result = run(&ops, 0, &[], &NoUserFns).unwrap();
        assert_eq!(result, Value::u32(42));
    }

    #[test]
    fn assert_eq_builtin_passes_and_fails() {
        let ok_ops = vec![
            lit_u32(1),
            lit_u32(1),
            Bytecode::new(Op::Call(FnRef::Builtin(Builtin::AssertEq)), Span::dummy()),
            Bytecode::new(Op::Return, Span::dummy()),
        ];
        assert!(run(&ok_ops, 0, &[], &NoUserFns).is_ok());

        let fail_ops = vec![
            lit_u32(1),
            lit_u32(2),
            Bytecode::new(Op::Call(FnRef::Builtin(Builtin::AssertEq)), Span::dummy()),
            Bytecode::new(Op::Return, Span::dummy()),
        ];
        let err = run(&fail_ops, 0, &[], &NoUserFns).unwrap_err();
        assert!(matches!(err, Error::Constexpr { .. }));
    }

    #[test]
    fn width_mismatch_is_internal_error() {
        let ops = vec![
            Bytecode::new(Op::Literal(Value::ubits(8, BigUint::from(1u8))), Span::dummy()),
            Bytecode::new(Op::Literal(Value::ubits(16, BigUint::from(1u8))), Span::dummy()),
            Bytecode::new(Op::Add, Span::dummy()),
            Bytecode::new(Op::Return, Span::dummy()),
        ];
        let err = run(&ops, 0, &[], &NoUserFns).unwrap_err();
        assert!(matches!(err, Error::Internal { .. }));
    }
}
