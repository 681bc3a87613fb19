//! Bytecode emission from a typed AST (spec C9 / §4.8).
//!
//! Expressions are emitted left-to-right, stack-machine style, matching the
//! "Emission shape" in spec §4.8 and the worked examples in spec §8 /
//! `original_source/xls/dslx/bytecode_emitter_test.cc`.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{BinOp, MatchArm, Module, NameDefTreeKind, NodeId, NodeKind, Stmt, UnOp};
use crate::errors::{Error, Result};
use crate::source::Span;
use crate::types::{ParametricEnv, Type};
use crate::value::{Builtin, FnRef, Value};

use super::op::{Bytecode, Op};
use crate::typeinfo::TypeInfo;

/// One emitted function: its instruction stream and the number of local
/// slots it uses (spec §3 "Slot allocation. A function's local slots are a
/// single flat vector").
#[derive(Debug, Clone)]
pub struct BytecodeFunction {
    pub ops: Vec<Bytecode>,
    pub num_slots: u32,
}

pub struct Emitter<'a> {
    module: &'a Module,
    type_info: &'a TypeInfo,
    env: &'a ParametricEnv,
    ops: Vec<Bytecode>,
    slot_names: Vec<Rc<str>>,
    scopes: Vec<HashMap<Rc<str>, u32>>,
}

impl<'a> Emitter<'a> {
    pub fn new(module: &'a Module, type_info: &'a TypeInfo, env: &'a ParametricEnv) -> Emitter<'a> {
        Emitter { module, type_info, env, ops: Vec::new(), slot_names: Vec::new(), scopes: vec![HashMap::new()] }
    }

    fn push(&mut self, op: Op, span: Span) {
        self.ops.push(Bytecode::new(op, span));
    }

    fn alloc_slot(&mut self, name: Rc<str>) -> u32 {
        let slot = self.slot_names.len() as u32;
        self.slot_names.push(name.clone());
        self.scopes.last_mut().unwrap().insert(name, slot);
        slot
    }

    fn lookup_slot(&self, name: &str) -> Option<u32> {
        for scope in self.scopes.iter().rev() {
            if let Some(s) = scope.get(name) {
                return Some(*s);
            }
        }
        None
    }

    /// Emit a whole function body. Parameters occupy slots `0..params.len()`
    /// (spec §3/§4.8 "Parameters occupy slots 0..P-1").
    pub fn emit_function(mut self, params: &[Rc<str>], body: NodeId) -> Result<BytecodeFunction> {
        for p in params {
            self.alloc_slot(p.clone());
        }
        self.emit_expr(body)?;
        self.push(Op::Return, self.module.arena.span(body));
        Ok(BytecodeFunction { ops: self.ops, num_slots: self.slot_names.len() as u32 })
    }

    fn ty(&self, node: NodeId) -> Result<&Type> {
        self.type_info.get_item_or_error(node, self.module.arena.span(node))
    }

    fn const_value(&self, node: NodeId) -> Result<Value> {
        self.type_info
            .get_const_expr(node)
            .cloned()
            .ok_or_else(|| Error::internal(self.module.arena.span(node), "expected constexpr value recorded by deducer"))
    }

    fn bind_pattern(&mut self, pattern: NodeId) -> Result<()> {
        match self.module.arena.kind(pattern).clone() {
            NodeKind::NameDefTree(NameDefTreeKind::Leaf(name)) => {
                let slot = self.alloc_slot(name);
                self.push(Op::Store(slot), self.module.arena.span(pattern));
                Ok(())
            }
            NodeKind::NameDefTree(NameDefTreeKind::Wildcard) => {
                // A wildcard still needs to consume the value the RHS left
                // on the stack; model it as a throwaway named slot rather
                // than adding a dedicated pop opcode.
                let slot = self.alloc_slot(Rc::from("_"));
                self.push(Op::Store(slot), self.module.arena.span(pattern));
                Ok(())
            }
            NodeKind::NameDefTree(NameDefTreeKind::Tuple(items)) => {
                self.push(Op::ExpandTuple, self.module.arena.span(pattern));
                for item in items {
                    self.bind_pattern(item)?;
                }
                Ok(())
            }
            NodeKind::NameDefTree(NameDefTreeKind::Literal(_))
            | NodeKind::NameDefTree(NameDefTreeKind::ColonRefPattern(_)) => {
                // Only `match` arms use refutable patterns; `emit_match`
                // handles those directly rather than through `bind_pattern`.
                Err(Error::internal(self.module.arena.span(pattern), "refutable pattern in irrefutable binding position"))
            }
            other => Err(Error::internal(self.module.arena.span(pattern), format!("not a pattern node: {:?}", other))),
        }
    }

    fn emit_expr(&mut self, node: NodeId) -> Result<()> {
        let span = self.module.arena.span(node);
        match self.module.arena.kind(node).clone() {
            NodeKind::Number { .. } | NodeKind::ColonRef { .. } => {
                let v = self.const_value(node)?;
                self.push(Op::Literal(v), span);
            }
            NodeKind::ResolvedLiteral(bits) => {
                self.push(Op::Literal(Value::UBits(bits)), span);
            }
            NodeKind::NameRef(name) => {
                if let Some(slot) = self.lookup_slot(&name) {
                    self.push(Op::Load(slot), span);
                } else if let Ok(v) = self.const_value(node) {
                    self.push(Op::Literal(v), span);
                } else {
                    return Err(Error::internal(span, format!("unresolved name ref `{}`", name)));
                }
            }
            NodeKind::Unary(op, e) => {
                self.emit_expr(e)?;
                match op {
                    UnOp::Invert | UnOp::LogicNot => self.push(Op::Invert, span),
                    UnOp::Negate => self.push(Op::Negate, span),
                }
            }
            NodeKind::Binary(l, op, r) => {
                self.emit_expr(l)?;
                self.emit_expr(r)?;
                let lhs_signed = self.ty(l)?.is_signed_bits();
                let bc_op = match op {
                    BinOp::Add => Op::Add,
                    BinOp::Sub => Op::Sub,
                    BinOp::Mul => Op::Mul,
                    BinOp::Div => Op::Div,
                    BinOp::And | BinOp::LogicAnd => Op::And,
                    BinOp::Or | BinOp::LogicOr => Op::Or,
                    BinOp::Xor => Op::Xor,
                    BinOp::Shll => Op::Shll,
                    // Open question #2 (DESIGN.md): Shra iff the static LHS
                    // type is signed.
                    BinOp::Shr => {
                        if lhs_signed {
                            Op::Shra
                        } else {
                            Op::Shrl
                        }
                    }
                    BinOp::Concat => Op::Concat,
                    BinOp::Eq => Op::Eq,
                    BinOp::Ne => Op::Ne,
                    BinOp::Lt => Op::Lt,
                    BinOp::Le => Op::Le,
                    BinOp::Gt => Op::Gt,
                    BinOp::Ge => Op::Ge,
                };
                self.push(bc_op, span);
            }
            NodeKind::Conditional { cond, then_branch, else_branch } => {
                // spec §4.8: guard, jump_rel_if to then-arm, else-arm,
                // jump_rel to end, jump_dest, then-arm, closing jump_dest.
                self.emit_expr(cond)?;
                let jump_if_idx = self.ops.len();
                self.push(Op::JumpRelIf(0), span);
                self.emit_expr(else_branch)?;
                let jump_end_idx = self.ops.len();
                self.push(Op::JumpRel(0), span);
                let then_dest_idx = self.ops.len();
                self.push(Op::JumpDest, span);
                self.patch_jump(jump_if_idx, then_dest_idx);
                self.emit_expr(then_branch)?;
                let end_dest_idx = self.ops.len();
                self.push(Op::JumpDest, span);
                self.patch_jump(jump_end_idx, end_dest_idx);
            }
            NodeKind::Block(stmts, tail) => {
                self.scopes.push(HashMap::new());
                for stmt in stmts {
                    self.emit_stmt(stmt)?;
                }
                match tail {
                    Some(t) => self.emit_expr(t)?,
                    None => self.push(Op::Literal(Value::Tuple(Rc::new(Vec::new()))), span),
                }
                self.scopes.pop();
            }
            NodeKind::TupleCtor(items) => {
                let n = items.len() as u32;
                for item in &items {
                    self.emit_expr(*item)?;
                }
                self.push(Op::CreateTuple(n), span);
            }
            NodeKind::ArrayCtor(items) => {
                let n = items.len() as u32;
                for item in &items {
                    self.emit_expr(*item)?;
                }
                self.push(Op::CreateArray(n), span);
            }
            NodeKind::StructCtor { name, members } => {
                self.emit_struct_literal(&name, &members, span)?;
            }
            NodeKind::SplatStructCtor { name, members, base } => {
                self.emit_splat_struct_literal(&name, &members, base, span)?;
            }
            NodeKind::Cast { expr, target } => {
                self.emit_expr(expr)?;
                let target_ty = self.ty(target)?.clone();
                let ty = target_ty.unwrap_meta().cloned().unwrap_or(target_ty);
                self.push(Op::Cast(ty), span);
            }
            NodeKind::Attr { base, member } => {
                self.emit_expr(base)?;
                let idx = self.struct_member_index(base, &member)?;
                self.push(Op::Literal(Value::u32(idx as u32)), span);
                self.push(Op::Index, span);
            }
            NodeKind::Index { base, index } => {
                self.emit_expr(base)?;
                self.emit_expr(index)?;
                self.push(Op::Index, span);
            }
            NodeKind::Slice { base, .. } => {
                self.emit_expr(base)?;
                let bounds = self
                    .type_info
                    .get_slice_bounds(node, self.env)
                    .ok_or_else(|| Error::internal(span, "no resolved slice bounds for this node"))?;
                self.push(Op::Slice { start: bounds.start as u32, width: bounds.width as u32 }, span);
            }
            NodeKind::WidthSlice { base, start, .. } => {
                self.emit_expr(base)?;
                self.emit_expr(start)?;
                let width_ty = self.ty(node)?.clone();
                let width = width_ty
                    .bits_size()
                    .and_then(|d| d.as_const())
                    .ok_or_else(|| Error::internal(span, "width-slice width must be a concrete constant"))?;
                self.push(Op::WidthSlice { width }, span);
            }
            NodeKind::Invocation { callee, args, .. } => {
                for a in &args {
                    self.emit_expr(*a)?;
                }
                let callee_val = self.resolve_callee(callee)?;
                self.push(Op::Call(callee_val), span);
            }
            NodeKind::Match { matched, arms } => {
                self.emit_match(matched, &arms, span)?;
            }
            NodeKind::Range { .. }
            | NodeKind::For { .. }
            | NodeKind::UnrollFor { .. }
            | NodeKind::Spawn { .. }
            | NodeKind::FormatMacro { .. }
            | NodeKind::ChannelDecl { .. } => {
                return Err(Error::internal(span, "emission for this node kind is not modeled by the reference interpreter"));
            }
            other => return Err(Error::internal(span, format!("unexpected node in expression position: {:?}", other))),
        }
        Ok(())
    }

    fn struct_member_index(&self, base: NodeId, member: &str) -> Result<usize> {
        let struct_ty = self.ty(base)?.clone();
        if let Type::Struct(s) = struct_ty {
            s.members
                .iter()
                .position(|(n, _)| n.as_ref() == member)
                .ok_or_else(|| Error::internal(self.module.arena.span(base), "unknown struct member"))
        } else {
            Err(Error::internal(self.module.arena.span(base), "attr access on non-struct"))
        }
    }

    /// Struct values are represented as plain `Value::Tuple`s in declared
    /// field order (the same representation `Attr` reads back with a
    /// `Literal(index)` + `Index` pair).
    fn emit_struct_literal(&mut self, name: &str, members: &[(Rc<str>, NodeId)], span: Span) -> Result<()> {
        let def = self
            .module
            .find_struct(name)
            .ok_or_else(|| Error::internal(span, format!("unknown struct `{}`", name)))?;
        let field_order: Vec<Rc<str>> = def.members.iter().map(|m| m.name.clone()).collect();
        for field in &field_order {
            let (_, expr) = members
                .iter()
                .find(|(n, _)| n == field)
                .ok_or_else(|| Error::internal(span, format!("missing field `{}` in struct literal", field)))?;
            self.emit_expr(*expr)?;
        }
        self.push(Op::CreateTuple(field_order.len() as u32), span);
        Ok(())
    }

    fn emit_splat_struct_literal(&mut self, name: &str, members: &[(Rc<str>, NodeId)], base: NodeId, span: Span) -> Result<()> {
        let def = self
            .module
            .find_struct(name)
            .ok_or_else(|| Error::internal(span, format!("unknown struct `{}`", name)))?;
        let field_order: Vec<Rc<str>> = def.members.iter().map(|m| m.name.clone()).collect();

        self.emit_expr(base)?;
        let base_slot = self.alloc_slot(Rc::from("$splat_base"));
        self.push(Op::Store(base_slot), span);

        for (idx, field) in field_order.iter().enumerate() {
            if let Some((_, expr)) = members.iter().find(|(n, _)| n == field) {
                self.emit_expr(*expr)?;
            } else {
                self.push(Op::Load(base_slot), span);
                self.push(Op::Literal(Value::u32(idx as u32)), span);
                self.push(Op::Index, span);
            }
        }
        self.push(Op::CreateTuple(field_order.len() as u32), span);
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: Stmt) -> Result<()> {
        match stmt {
            Stmt::Let { pattern, rhs, .. } => {
                self.emit_expr(rhs)?;
                self.bind_pattern(pattern)?;
            }
            Stmt::ConstAssert(e) => {
                self.emit_expr(e)?;
            }
            Stmt::Expr(e) => {
                self.emit_expr(e)?;
            }
        }
        Ok(())
    }

    /// `assert_eq`/`assert_lt` and friends lower to `Call(Builtin(..))`,
    /// matching `bytecode_emitter_test.cc`'s builtin-call lowering.
    fn resolve_callee(&self, callee: NodeId) -> Result<FnRef> {
        if let NodeKind::NameRef(name) = self.module.arena.kind(callee) {
            let builtin = match name.as_ref() {
                "assert_eq" => Some(Builtin::AssertEq),
                "assert_lt" => Some(Builtin::AssertLt),
                "trace" | "trace!" => Some(Builtin::Trace),
                "zero!" => Some(Builtin::Zero),
                _ => None,
            };
            if let Some(b) = builtin {
                return Ok(FnRef::Builtin(b));
            }
        }
        match self.const_value(callee) {
            Ok(Value::Function(fr)) => Ok(fr),
            _ => Err(Error::internal(self.module.arena.span(callee), "callee did not resolve to a function value")),
        }
    }

    fn emit_match(&mut self, matched: NodeId, arms: &[MatchArm], span: Span) -> Result<()> {
        // Desugar to a chain of equality tests against the matched value,
        // each held in a fresh slot so every arm can re-read it.
        self.emit_expr(matched)?;
        let scrutinee_slot = self.alloc_slot(Rc::from("$match"));
        self.push(Op::Store(scrutinee_slot), span);

        let mut end_jumps = Vec::new();
        for (i, arm) in arms.iter().enumerate() {
            let is_last = i + 1 == arms.len();
            let is_irrefutable = matches!(
                self.module.arena.kind(arm.pattern),
                NodeKind::NameDefTree(NameDefTreeKind::Leaf(_)) | NodeKind::NameDefTree(NameDefTreeKind::Wildcard)
            );
            if is_irrefutable || is_last {
                if let NodeKind::NameDefTree(NameDefTreeKind::Leaf(name)) = self.module.arena.kind(arm.pattern).clone() {
                    self.push(Op::Load(scrutinee_slot), span);
                    let slot = self.alloc_slot(name);
                    self.push(Op::Store(slot), span);
                }
                self.emit_expr(arm.body)?;
                break;
            }
            self.push(Op::Load(scrutinee_slot), span);
            self.emit_pattern_value(arm.pattern)?;
            self.push(Op::Eq, span);
            let skip_idx = self.ops.len();
            self.push(Op::JumpRelIf(0), span);
            let miss_jump = self.ops.len();
            self.push(Op::JumpRel(0), span);
            let body_dest = self.ops.len();
            self.push(Op::JumpDest, span);
            self.patch_jump(skip_idx, body_dest);
            self.emit_expr(arm.body)?;
            let end_jump = self.ops.len();
            self.push(Op::JumpRel(0), span);
            end_jumps.push(end_jump);
            let next_dest = self.ops.len();
            self.push(Op::JumpDest, span);
            self.patch_jump(miss_jump, next_dest);
        }
        let end_dest = self.ops.len();
        self.push(Op::JumpDest, span);
        for j in end_jumps {
            self.patch_jump(j, end_dest);
        }
        Ok(())
    }

    fn emit_pattern_value(&mut self, pattern: NodeId) -> Result<()> {
        match self.module.arena.kind(pattern).clone() {
            NodeKind::NameDefTree(NameDefTreeKind::Literal(e)) | NodeKind::NameDefTree(NameDefTreeKind::ColonRefPattern(e)) => {
                self.emit_expr(e)
            }
            other => Err(Error::internal(self.module.arena.span(pattern), format!("not a literal pattern: {:?}", other))),
        }
    }

    fn patch_jump(&mut self, jump_idx: usize, target_idx: usize) {
        // target = pc + offset  =>  offset = target - pc (DESIGN.md Open Q#1).
        let offset = target_idx as i32 - jump_idx as i32;
        match &mut self.ops[jump_idx].op {
            Op::JumpRel(o) | Op::JumpRelIf(o) => *o = offset,
            _ => unreachable!("patch_jump called on a non-jump instruction"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Arena, Module, ModuleMember};
    use crate::source::Span;
    use crate::typeinfo::TypeInfo;

    fn dummy_env() -> ParametricEnv {
        ParametricEnv::new()
    }

    /// Reproduces spec §8 seed scenario 1: `let foo = u32:1; foo + u32:2`.
    #[test]
    fn emits_let_then_add() {
        let mut arena = Arena::new();
        let span = Span::dummy();

        let lit1 = arena.alloc(NodeKind::ResolvedLiteral(crate::number::Bits::from_unsigned(32, num::BigUint::from(1u8))), span);
        let pattern = arena.alloc(NodeKind::NameDefTree(NameDefTreeKind::Leaf(Rc::from("foo"))), span);
        let name_ref = arena.alloc(NodeKind::NameRef(Rc::from("foo")), span);
        let lit2 = arena.alloc(NodeKind::ResolvedLiteral(crate::number::Bits::from_unsigned(32, num::BigUint::from(2u8))), span);
        let add = arena.alloc(NodeKind::Binary(name_ref, BinOp::Add, lit2), span);
        let block = arena.alloc(
            NodeKind::Block(vec![Stmt::Let { pattern, annotation: None, rhs: lit1 }], Some(add)),
            span,
        );
        arena.compute_parents();

        let module = Module::new("m", arena, Vec::<ModuleMember>::new());
        let mut type_info = TypeInfo::new();
        type_info.note_type(name_ref, Type::u(32));
        let env = dummy_env();

        let emitter = Emitter::new(&module, &type_info, &env);
        let bc = emitter.emit_function(&[], block).unwrap();

        let rendered = super::super::text::render(&bc.ops);
        assert!(rendered.contains("literal u32:1"));
        assert!(rendered.contains("store 0"));
        assert!(rendered.contains("load 0"));
        assert!(rendered.contains("literal u32:2"));
        assert!(rendered.contains("add"));
    }

    /// Reproduces spec §8 seed scenario 2's ternary jump shape and checks the
    /// corrected `target = pc + offset` arithmetic end to end.
    #[test]
    fn emits_ternary_with_correct_jump_targets() {
        let mut arena = Arena::new();
        let span = Span::dummy();

        let cond = arena.alloc(NodeKind::ResolvedLiteral(crate::number::Bits::from_unsigned(1, num::BigUint::from(1u8))), span);
        let then_lit = arena.alloc(NodeKind::ResolvedLiteral(crate::number::Bits::from_unsigned(32, num::BigUint::from(42u8))), span);
        let else_lit = arena.alloc(NodeKind::ResolvedLiteral(crate::number::Bits::from_unsigned(32, num::BigUint::from(64u8))), span);
        let cond_node =
            arena.alloc(NodeKind::Conditional { cond, then_branch: then_lit, else_branch: else_lit }, span);
        arena.compute_parents();

        let module = Module::new("m", arena, Vec::<ModuleMember>::new());
        let type_info = TypeInfo::new();
        let env = dummy_env();

        let emitter = Emitter::new(&module, &type_info, &env);
        let bc = emitter.emit_function(&[], cond_node).unwrap();

        assert_eq!(bc.ops[0].op, Op::Literal(Value::UBits(crate::number::Bits::from_unsigned(1, num::BigUint::from(1u8)))));
        assert_eq!(bc.ops[1].op, Op::JumpRelIf(3));
        assert_eq!(bc.ops[3].op, Op::JumpRel(3));
    }
}
