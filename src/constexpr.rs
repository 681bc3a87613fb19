//! Constexpr evaluation (spec C5 / §4.4): evaluates an already-typed
//! expression node by emitting bytecode for it and interpreting that
//! bytecode, then caches the result into `TypeInfo`, mirroring
//! `bytecode_emitter_test.cc`'s emit-then-interpret pattern.

use crate::ast::{Module, NodeId};
use crate::bytecode::{interp, Emitter};
use crate::errors::{Error, Result};
use crate::types::ParametricEnv;
use crate::typeinfo::TypeInfo;
use crate::value::Value;

/// Nodes currently being evaluated, used to detect a constexpr expression
/// that depends on its own value (spec §4.4 "recursive constexpr dependency
/// is a `ConstexprError`, not infinite recursion").
#[derive(Default)]
pub struct ConstexprGuard {
    in_progress: Vec<NodeId>,
}

impl ConstexprGuard {
    pub fn new() -> ConstexprGuard {
        ConstexprGuard::default()
    }
}

/// Evaluate `node` as a constexpr expression under `env`, consulting (and
/// populating) `type_info`'s constexpr cache.
pub fn evaluate(
    module: &Module,
    type_info: &mut TypeInfo,
    env: &ParametricEnv,
    guard: &mut ConstexprGuard,
    node: NodeId,
) -> Result<Value> {
    if let Some(v) = type_info.get_const_expr(node) {
        return Ok(v.clone());
    }
    let span = module.arena.span(node);
    if guard.in_progress.contains(&node) {
        return Err(Error::constexpr(span, "constexpr expression depends on its own value"));
    }
    guard.in_progress.push(node);

    let emitter = Emitter::new(module, type_info, env);
    let bc = emitter.emit_function(&[], node);
    let result = match bc {
        Ok(bc) => interp::run(&bc.ops, bc.num_slots, &[], &interp::NoUserFns),
        Err(e) => Err(e),
    };

    guard.in_progress.pop();
    let value = result?;
    type_info.note_const_expr(node, value.clone());
    Ok(value)
}

/// Evaluate a sequence of already-typed sibling nodes (e.g. parametric
/// actual arguments) left to right, short-circuiting on the first error.
pub fn evaluate_all(
    module: &Module,
    type_info: &mut TypeInfo,
    env: &ParametricEnv,
    guard: &mut ConstexprGuard,
    nodes: &[NodeId],
) -> Result<Vec<Value>> {
    let mut out = Vec::with_capacity(nodes.len());
    for &n in nodes {
        out.push(evaluate(module, type_info, env, guard, n)?);
    }
    Ok(out)
}

/// Evaluate `node` expecting a `u32`-representable result, used when a
/// constexpr value feeds a `Dim` (array sizes, bit widths; spec §4.3 "Dims
/// resolve from constexpr-evaluated expressions").
pub fn evaluate_as_dim_const(
    module: &Module,
    type_info: &mut TypeInfo,
    env: &ParametricEnv,
    guard: &mut ConstexprGuard,
    node: NodeId,
) -> Result<u32> {
    let v = evaluate(module, type_info, env, guard, node)?;
    v.as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| Error::constexpr(module.arena.span(node), "expected a u32-representable constexpr value"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Arena, ModuleMember, NodeKind};
    use crate::number::Bits;
    use crate::source::Span;
    use num::BigUint;

    #[test]
    fn evaluates_literal_addition() {
        let mut arena = Arena::new();
        let span = Span::dummy();
        let lhs = arena.alloc(NodeKind::ResolvedLiteral(Bits::from_unsigned(32, BigUint::from(2u8))), span);
        let rhs = arena.alloc(NodeKind::ResolvedLiteral(Bits::from_unsigned(32, BigUint::from(3u8))), span);
        let add = arena.alloc(NodeKind::Binary(lhs, crate::ast::BinOp::Add, rhs), span);
        arena.compute_parents();

        let module = Module::new("m", arena, Vec::<ModuleMember>::new());
        let mut type_info = TypeInfo::new();
        type_info.note_type(lhs, crate::types::Type::u(32));
        let env = ParametricEnv::new();
        let mut guard = ConstexprGuard::new();

        let v = evaluate(&module, &mut type_info, &env, &mut guard, add).unwrap();
        assert_eq!(v, Value::u32(5));
        assert!(type_info.is_const_expr(add));
    }

    #[test]
    fn caches_result_on_second_lookup() {
        let mut arena = Arena::new();
        let span = Span::dummy();
        let lit = arena.alloc(NodeKind::ResolvedLiteral(Bits::from_unsigned(32, BigUint::from(7u8))), span);
        arena.compute_parents();
        let module = Module::new("m", arena, Vec::<ModuleMember>::new());
        let mut type_info = TypeInfo::new();
        let env = ParametricEnv::new();
        let mut guard = ConstexprGuard::new();

        let first = evaluate(&module, &mut type_info, &env, &mut guard, lit).unwrap();
        let second = evaluate(&module, &mut type_info, &env, &mut guard, lit).unwrap();
        assert_eq!(first, second);
    }
}
