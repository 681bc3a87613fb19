//! Core type-inference engine (spec C6 / §4.5): one rule per AST node kind,
//! dispatched by an exhaustive match per the design note in spec §9
//! ("Dynamic dispatch over node kinds" — a tagged enum with an exhaustive
//! match, not a virtual hierarchy). Grounded on
//! `original_source/xls/dslx/type_system/deduce.cc`'s per-node `Deduce*`
//! functions, generalized the way `lowRISC-sv-elaborator/src/parser/mod.rs`
//! dispatches on token/node tag.

mod pattern;
mod ty_annotation;

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{BinOp, Module, NodeId, NodeKind, Stmt, UnOp};
use crate::constexpr::{self, ConstexprGuard};
use crate::errors::{Error, Result};
use crate::types::{Binding, ChannelDirection, Dim, EnumType, FunctionType, ParametricEnv, StructType, Type};
use crate::typeinfo::{SliceBounds, TypeInfo};
use crate::value::Value;
use crate::warnings::{WarningCollector, WarningKind};

pub use pattern::bind_name_def_tree;
pub use ty_annotation::deduce_type_annotation;

/// A `let`/`for`/match-arm-bound local name's inferred type and, when known,
/// its constexpr value (needed so a later `const_assert` or array-size
/// position can consume a locally-bound constant).
#[derive(Clone)]
pub struct LocalBinding {
    pub ty: Type,
    pub value: Option<Value>,
}

/// Everything a deduction rule needs: the module being typechecked (for AST
/// lookups and cross-member name resolution), the side tables it writes
/// into, the parametric environment active at this point, a stack of
/// lexical scopes for `let`/`for`/match-arm bindings, and the warning sink.
/// One `Deducer` exists per (module, parametric env) pair — a parametric
/// instantiation gets its own `Deducer` over a child `TypeInfo` (spec §5
/// "child TypeInfos ... are owned by their parent").
pub struct Deducer<'a> {
    pub module: &'a Module,
    pub type_info: &'a mut TypeInfo,
    pub env: ParametricEnv,
    pub warnings: &'a mut WarningCollector,
    pub guard: ConstexprGuard,
    /// Resolved imports of the module being typechecked, set by
    /// `typecheck_module` so a cross-module `ColonRef` can be answered
    /// without reparsing (spec §9 "child contexts carry a pointer to both
    /// the importing and imported TypeInfo"). `None` for a `Deducer` built
    /// over a module with no imports, or over a parametric instantiation's
    /// child body (which inherits the parent's already-resolved answer via
    /// its cached constexpr/type entries instead).
    imports: Option<crate::imports::ImportContext<'a>>,
    scopes: Vec<HashMap<Rc<str>, LocalBinding>>,
}

impl<'a> Deducer<'a> {
    pub fn new(module: &'a Module, type_info: &'a mut TypeInfo, env: ParametricEnv, warnings: &'a mut WarningCollector) -> Deducer<'a> {
        Deducer { module, type_info, env, warnings, guard: ConstexprGuard::new(), imports: None, scopes: vec![HashMap::new()] }
    }

    pub fn set_imports(&mut self, imports: crate::imports::ImportContext<'a>) {
        self.imports = Some(imports);
    }

    /// Bind a function/proc formal parameter into the outermost scope.
    /// Called by the module typechecker before deducing a body.
    pub fn bind_param(&mut self, name: Rc<str>, ty: Type) {
        self.scopes[0].insert(name, LocalBinding { ty, value: None });
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn bind_local(&mut self, name: Rc<str>, ty: Type, value: Option<Value>) {
        self.scopes.last_mut().expect("at least one scope").insert(name, LocalBinding { ty, value });
    }

    fn lookup_local(&self, name: &str) -> Option<&LocalBinding> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }

    fn span(&self, node: NodeId) -> crate::source::Span {
        self.module.arena.span(node)
    }

    fn note(&mut self, node: NodeId, ty: Type) -> Type {
        self.type_info.note_type(node, ty.clone());
        ty
    }

    fn eval_const(&mut self, node: NodeId) -> Result<Value> {
        constexpr::evaluate(self.module, self.type_info, &self.env, &mut self.guard, node)
    }

    pub(crate) fn eval_const_u32(&mut self, node: NodeId) -> Result<u32> {
        constexpr::evaluate_as_dim_const(self.module, self.type_info, &self.env, &mut self.guard, node)
    }

    fn unify(&self, node: NodeId, a: &Type, b: &Type, message: &str) -> Result<()> {
        if a.structural_eq(b) {
            Ok(())
        } else {
            Err(Error::type_mismatch(self.span(node), a.clone(), b.clone(), None, None, message))
        }
    }

    /// Top-level entry point: infer (and cache) the type of `node`.
    pub fn deduce(&mut self, node: NodeId) -> Result<Type> {
        if let Some(ty) = self.type_info.get_item(node) {
            return Ok(ty.clone());
        }
        let ty = self.deduce_uncached(node)?;
        Ok(self.note(node, ty))
    }

    fn deduce_uncached(&mut self, node: NodeId) -> Result<Type> {
        let span = self.span(node);
        match self.module.arena.kind(node).clone() {
            NodeKind::Number { annotation, .. } => self.deduce_number(node, annotation),
            NodeKind::ResolvedLiteral(bits) => {
                let ty = Type::Bits { signed: bits.is_signed(), size: Dim::konst(bits.width() as u32) };
                self.type_info.note_const_expr(node, if bits.is_signed() { Value::SBits(bits) } else { Value::UBits(bits) });
                Ok(ty)
            }
            NodeKind::NameRef(name) => self.deduce_name_ref(node, &name),
            NodeKind::ColonRef { lhs, member } => self.deduce_colon_ref(node, lhs, &member),
            NodeKind::Unary(op, e) => self.deduce_unary(node, op, e),
            NodeKind::Binary(l, op, r) => self.deduce_binary(node, l, op, r),
            NodeKind::Conditional { cond, then_branch, else_branch } => {
                self.deduce_conditional(node, cond, then_branch, else_branch)
            }
            NodeKind::Match { matched, arms } => self.deduce_match(node, matched, &arms),
            NodeKind::Block(stmts, tail) => self.deduce_block(&stmts, tail),
            NodeKind::For { iterable, pattern, init, body } => self.deduce_for(node, iterable, pattern, init, body),
            NodeKind::UnrollFor { iterable, pattern, init, body } => self.deduce_for(node, iterable, pattern, init, body),
            NodeKind::Cast { expr, target } => self.deduce_cast(node, expr, target),
            NodeKind::TupleCtor(items) => {
                let mut tys = Vec::with_capacity(items.len());
                for i in &items {
                    tys.push(self.deduce(*i)?);
                }
                Ok(Type::Tuple(tys))
            }
            NodeKind::ArrayCtor(items) => self.deduce_array_ctor(node, &items),
            NodeKind::StructCtor { name, members } => self.deduce_struct_ctor(node, &name, &members, None),
            NodeKind::SplatStructCtor { name, members, base } => self.deduce_struct_ctor(node, &name, &members, Some(base)),
            NodeKind::Attr { base, member } => self.deduce_attr(node, base, &member),
            NodeKind::Index { base, index } => self.deduce_index(node, base, index),
            NodeKind::Slice { base, start, limit } => self.deduce_slice(node, base, start, limit),
            NodeKind::WidthSlice { base, start, width } => self.deduce_width_slice(node, base, start, width),
            NodeKind::Invocation { callee, parametrics, args } => self.deduce_invocation(node, callee, &parametrics, &args),
            NodeKind::Spawn { callee, config_args, next_args } => self.deduce_spawn(node, callee, &config_args, &next_args),
            NodeKind::FormatMacro { args, .. } => {
                for a in &args {
                    self.deduce(*a)?;
                }
                Ok(Type::Token)
            }
            NodeKind::Range { start, end } => self.deduce_range(node, start, end),
            NodeKind::ChannelDecl { payload, dims, fifo_depth } => self.deduce_channel_decl(node, payload, &dims, fifo_depth),
            NodeKind::TyBuiltin { .. }
            | NodeKind::TySized { .. }
            | NodeKind::TyArray { .. }
            | NodeKind::TyTuple(_)
            | NodeKind::TyChannel { .. }
            | NodeKind::TyRef { .. } => Ok(deduce_type_annotation(self, node)?.meta()),
            NodeKind::NameDefTree(_) => {
                Err(Error::internal(span, "NameDefTree nodes are deduced through bind_name_def_tree, not deduce()"))
            }
            NodeKind::ConstAssertTop(e) => self.deduce_const_assert(node, e),
        }
    }

    fn deduce_number(&mut self, node: NodeId, annotation: Option<NodeId>) -> Result<Type> {
        let span = self.span(node);
        let ty = match annotation {
            Some(a) => deduce_type_annotation(self, a)?,
            // spec §8 "Numeric literal without annotation in dimension
            // position: defaults to u32".
            None => Type::u(32),
        };
        if ty.bits_size().and_then(|d| d.as_const()).is_none() {
            return Err(Error::type_inference(span, "numeric literal annotation must resolve to a concrete bit width"));
        }
        let value = self.eval_const(node)?;
        if let Some(bits) = value.bits() {
            if ty.is_unsigned_bits() && bits.to_bigint().sign() == num::bigint::Sign::Minus {
                return Err(Error::type_inference(span, "negative value rejected in unsigned position"));
            }
        }
        Ok(ty)
    }

    fn deduce_name_ref(&mut self, node: NodeId, name: &str) -> Result<Type> {
        let span = self.span(node);
        if let Some(local) = self.lookup_local(name) {
            let ty = local.ty.clone();
            if let Some(v) = local.value.clone() {
                self.type_info.note_const_expr(node, v);
            }
            return Ok(ty);
        }
        if let Some(binding) = self.env.lookup(name) {
            return match binding.clone() {
                Binding::Value(v) => {
                    let ty = value_type_hint(&v);
                    self.type_info.note_const_expr(node, v);
                    Ok(ty)
                }
                Binding::Residual(d) => Ok(Type::Bits { signed: false, size: d }),
            };
        }
        if let Some(c) = self.module.find_constant(name) {
            let value_node = c.value;
            let ty = self.deduce(value_node)?;
            let v = self.eval_const(value_node)?;
            self.type_info.note_const_expr(node, v);
            return Ok(ty);
        }
        if let Some(f) = self.module.find_function(name) {
            let f = f.clone();
            return self.function_type(&f);
        }
        Err(Error::type_inference(span, format!("unresolved name `{}`", name)))
    }

    /// Builds the `Type::Function` signature for a (possibly parametric)
    /// function name referenced by value. Parametric formals that don't yet
    /// have a binding are resolved as symbolic `Dim`s (see
    /// `ty_annotation::resolve_dim`) rather than evaluated, since no call
    /// site is present yet to constrain them.
    fn function_type(&mut self, f: &crate::ast::Function) -> Result<Type> {
        let saved = self.env.clone();
        let mut combined = self.env.child();
        for p in &f.parametrics {
            combined.bind_residual(p.name.clone(), Dim::symbol(p.name.clone(), p.span));
        }
        self.env = combined.clone();
        let result = (|| -> Result<Type> {
            let mut params = Vec::with_capacity(f.params.len());
            for p in &f.params {
                params.push(deduce_type_annotation(self, p.type_annotation)?);
            }
            let ret = match f.return_type {
                Some(rt) => deduce_type_annotation(self, rt)?,
                None => Type::Tuple(Vec::new()),
            };
            Ok(Type::Function(Box::new(FunctionType { params, ret: Box::new(ret), env: combined.clone() })))
        })();
        self.env = saved;
        result
    }

    fn deduce_colon_ref(&mut self, node: NodeId, lhs: NodeId, member: &str) -> Result<Type> {
        let span = self.span(node);
        if let NodeKind::TySized { .. } | NodeKind::TyBuiltin { .. } = self.module.arena.kind(lhs) {
            let lhs_ty = deduce_type_annotation(self, lhs)?;
            let width = lhs_ty
                .bits_size()
                .and_then(|d| d.as_const())
                .ok_or_else(|| Error::type_inference(span, "MAX/ZERO require a concrete bit width"))?;
            let signed = lhs_ty.is_signed_bits();
            return match member {
                "MAX" => {
                    let magnitude = (num::BigUint::from(1u8) << width as usize) - 1u8;
                    self.type_info.note_const_expr(node, Value::ubits(width as usize, magnitude));
                    Ok(lhs_ty)
                }
                "ZERO" => {
                    let zero = if signed {
                        Value::sbits(width as usize, num::BigInt::from(0))
                    } else {
                        Value::ubits(width as usize, num::BigUint::from(0u8))
                    };
                    self.type_info.note_const_expr(node, zero);
                    Ok(lhs_ty)
                }
                other => Err(Error::type_inference(span, format!("unknown builtin member `{}`", other))),
            };
        }
        if let NodeKind::NameRef(enum_name) = self.module.arena.kind(lhs).clone() {
            if let Some(e) = self.module.find_enum(&enum_name).cloned() {
                let underlying = deduce_type_annotation(self, e.underlying)?;
                let member_def = e
                    .members
                    .iter()
                    .find(|m| m.name.as_ref() == member)
                    .cloned()
                    .ok_or_else(|| Error::type_inference(span, format!("unknown enum member `{}`", member)))?;
                let v = self.eval_const(member_def.value)?;
                let enum_ty = Type::Enum(Box::new(EnumType { nominal: crate::types::NominalId { module: self.module.name.clone(), name: e.name.clone() }, name: e.name.clone(), underlying: Box::new(underlying) }));
                if let Some(bits) = v.bits() {
                    self.type_info.note_const_expr(node, Value::Enum(lhs, bits.clone()));
                }
                return Ok(enum_ty);
            }
            if let Some(imports) = self.imports {
                if let Some(imported) = imports.resolve(&enum_name) {
                    let constant = imported
                        .module
                        .find_constant(member)
                        .ok_or_else(|| Error::type_inference(span, format!("unknown member `{}` of imported module `{}`", member, enum_name)))?;
                    let value_ty = imported
                        .type_info
                        .get_item_or_error(constant.value, span)?
                        .clone();
                    if let Some(v) = imported.type_info.get_const_expr(constant.value) {
                        self.type_info.note_const_expr(node, v.clone());
                    }
                    return Ok(value_ty);
                }
            }
        }
        Err(Error::type_inference(span, format!("unresolved colon-ref member `{}`", member)))
    }

    fn deduce_unary(&mut self, node: NodeId, op: UnOp, e: NodeId) -> Result<Type> {
        let span = self.span(node);
        let ty = self.deduce(e)?;
        if !matches!(ty, Type::Bits { .. }) {
            return Err(Error::type_inference(span, "unary operator requires a bits operand"));
        }
        if op == UnOp::LogicNot && ty.bits_size().and_then(|d| d.as_const()) != Some(1) {
            return Err(Error::type_inference(span, "logical not requires u1"));
        }
        Ok(ty)
    }

    fn deduce_binary(&mut self, node: NodeId, l: NodeId, op: BinOp, r: NodeId) -> Result<Type> {
        let span = self.span(node);
        let lt = self.deduce(l)?;
        let rt = self.deduce(r)?;
        match op {
            BinOp::Concat => match (lt.bits_size().cloned(), rt.bits_size().cloned()) {
                (Some(a), Some(b)) => Ok(Type::Bits { signed: false, size: Dim::add(a, b) }),
                _ => Err(Error::type_inference(span, "concat requires bits operands")),
            },
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                self.unify(node, &lt, &rt, "comparison operands must have the same type")?;
                Ok(Type::bool_ty())
            }
            BinOp::LogicAnd | BinOp::LogicOr => {
                self.unify(node, &lt, &Type::bool_ty(), "logical operator requires u1 operands")?;
                self.unify(node, &rt, &Type::bool_ty(), "logical operator requires u1 operands")?;
                Ok(Type::bool_ty())
            }
            BinOp::Shll | BinOp::Shr => {
                if rt.is_signed_bits() {
                    return Err(Error::type_inference(span, "shift amount must be unsigned"));
                }
                Ok(lt)
            }
            _ => {
                self.unify(node, &lt, &rt, "binary operator operands must have the same type")?;
                Ok(lt)
            }
        }
    }

    fn deduce_conditional(&mut self, node: NodeId, cond: NodeId, then_branch: NodeId, else_branch: NodeId) -> Result<Type> {
        let ct = self.deduce(cond)?;
        self.unify(node, &ct, &Type::bool_ty(), "conditional guard must be u1")?;
        let tt = self.deduce(then_branch)?;
        let et = self.deduce(else_branch)?;
        self.unify(node, &tt, &et, "conditional branches must have the same type")?;
        Ok(tt)
    }

    fn deduce_match(&mut self, node: NodeId, matched: NodeId, arms: &[crate::ast::MatchArm]) -> Result<Type> {
        let span = self.span(node);
        let matched_ty = self.deduce(matched)?;
        let mut seen_patterns: Vec<NodeId> = Vec::new();
        let mut result_ty: Option<Type> = None;
        for arm in arms {
            if seen_patterns.iter().any(|p| pattern::patterns_syntactically_equal(self.module, *p, arm.pattern)) {
                self.warnings.push(WarningKind::DuplicateMatchPattern, self.span(arm.pattern), "duplicate match pattern");
            }
            seen_patterns.push(arm.pattern);

            self.push_scope();
            let bind_result = pattern::unify_match_pattern(self, arm.pattern, &matched_ty);
            let body_result = bind_result.and_then(|_| self.deduce(arm.body));
            self.pop_scope();
            let body_ty = body_result?;

            match &result_ty {
                None => result_ty = Some(body_ty),
                Some(prev) => self.unify(arm.body, prev, &body_ty, "match arms must have the same type")?,
            }
        }
        result_ty.ok_or_else(|| Error::type_inference(span, "match with no arms"))
    }

    fn deduce_block(&mut self, stmts: &[Stmt], tail: Option<NodeId>) -> Result<Type> {
        self.push_scope();
        let result = self.deduce_block_inner(stmts, tail);
        self.pop_scope();
        result
    }

    fn deduce_block_inner(&mut self, stmts: &[Stmt], tail: Option<NodeId>) -> Result<Type> {
        let last_idx = stmts.len().checked_sub(1);
        for (i, stmt) in stmts.iter().enumerate() {
            match stmt {
                Stmt::Let { pattern, annotation, rhs } => self.deduce_let(*pattern, *annotation, *rhs)?,
                Stmt::ConstAssert(e) => {
                    self.deduce_const_assert(*e, *e)?;
                }
                Stmt::Expr(e) => {
                    let e_ty = self.deduce(*e)?;
                    if matches!(self.module.arena.kind(*e), NodeKind::TupleCtor(items) if items.is_empty()) {
                        self.warnings.push(WarningKind::TrailingTupleAfterSemi, self.span(*e), "trailing `()` after `;` is redundant");
                    } else if tail.is_none() && Some(i) == last_idx && e_ty.structural_eq(&Type::Tuple(Vec::new())) {
                        self.warnings.push(
                            WarningKind::TrailingSemiWithNil,
                            self.span(*e),
                            "trailing `;` after a nil-typed expression is redundant; drop it to use the expression as the block's tail",
                        );
                    } else if matches!(self.module.arena.kind(*e), NodeKind::NameRef(_) | NodeKind::Number { .. } | NodeKind::ResolvedLiteral(_)) {
                        self.warnings.push(WarningKind::UselessExpressionStatement, self.span(*e), "expression statement has no effect; its value is discarded");
                    }
                }
            }
        }
        match tail {
            Some(t) => self.deduce(t),
            None => Ok(Type::Tuple(Vec::new())),
        }
    }

    fn deduce_let(&mut self, pattern: NodeId, annotation: Option<NodeId>, rhs: NodeId) -> Result<()> {
        let rhs_ty = self.deduce(rhs)?;
        if let Some(a) = annotation {
            let annot_ty = deduce_type_annotation(self, a)?;
            self.unify(rhs, &annot_ty, &rhs_ty, "let annotation does not match initializer type")?;
        }
        if matches!(self.module.arena.kind(pattern), NodeKind::NameDefTree(crate::ast::NameDefTreeKind::Wildcard)) {
            self.warnings.push(WarningKind::UselessLetBinding, self.span(pattern), "`let _ = e;` is a redundant binding form");
        }
        let rhs_val = if self.type_info.is_const_expr(rhs) { self.eval_const(rhs).ok() } else { None };
        pattern::bind_name_def_tree(self, pattern, &rhs_ty, rhs_val.as_ref())
    }

    fn deduce_for(&mut self, node: NodeId, iterable: NodeId, pattern: NodeId, init: NodeId, body: NodeId) -> Result<Type> {
        let span = self.span(node);
        let iter_ty = self.deduce(iterable)?;
        let elem_ty = match &iter_ty {
            Type::Array { elem, .. } => (**elem).clone(),
            _ => return Err(Error::type_inference(span, "for-loop iterable must be an array")),
        };
        let init_ty = self.deduce(init)?;
        self.push_scope();
        let combined = Type::Tuple(vec![elem_ty, init_ty.clone()]);
        let result = pattern::bind_name_def_tree(self, pattern, &combined, None).and_then(|_| self.deduce(body));
        self.pop_scope();
        let body_ty = result?;
        self.unify(node, &body_ty, &init_ty, "for-loop body type must equal the accumulator type")?;
        Ok(init_ty)
    }

    fn deduce_cast(&mut self, node: NodeId, expr: NodeId, target: NodeId) -> Result<Type> {
        let span = self.span(node);
        let src = self.deduce(expr)?;
        let target_ty = deduce_type_annotation(self, target)?;
        let ok = match (&src, &target_ty) {
            (Type::Bits { .. }, Type::Bits { .. }) => true,
            (Type::Bits { size: bs, .. }, Type::Enum(e)) | (Type::Enum(e), Type::Bits { size: bs, .. }) => {
                e.underlying.bits_size().map(|es| es == bs).unwrap_or(false)
            }
            (Type::Array { elem, size }, Type::Bits { size: bsize, .. }) | (Type::Bits { size: bsize, .. }, Type::Array { elem, size }) => {
                match (elem.bits_size().and_then(|d| d.as_const()), size.as_const(), bsize.as_const()) {
                    (Some(ew), Some(n), Some(total)) => ew * n == total,
                    _ => false,
                }
            }
            _ => false,
        };
        if !ok {
            return Err(Error::type_mismatch(span, src, target_ty, None, None, "unsupported cast"));
        }
        Ok(target_ty)
    }

    fn deduce_array_ctor(&mut self, node: NodeId, items: &[NodeId]) -> Result<Type> {
        let span = self.span(node);
        if items.is_empty() {
            return Err(Error::type_inference(span, "empty array literal requires an explicit annotation"));
        }
        let elem_ty = self.deduce(items[0])?;
        for it in &items[1..] {
            let t = self.deduce(*it)?;
            self.unify(*it, &elem_ty, &t, "array elements must have the same type")?;
        }
        Ok(Type::Array { elem: Box::new(elem_ty), size: Dim::konst(items.len() as u32) })
    }

    fn deduce_struct_ctor(&mut self, node: NodeId, name: &str, members: &[(Rc<str>, NodeId)], base: Option<NodeId>) -> Result<Type> {
        let span = self.span(node);
        let def = self
            .module
            .find_struct(name)
            .cloned()
            .ok_or_else(|| Error::type_inference(span, format!("unknown struct `{}`", name)))?;

        let given: Vec<&str> = members.iter().map(|(n, _)| n.as_ref()).collect();
        let mut seen = std::collections::HashSet::new();
        for g in &given {
            if !seen.insert(*g) {
                return Err(Error::type_inference(span, format!("duplicate member `{}` in struct literal", g)));
            }
        }
        let declared: Vec<&str> = def.members.iter().map(|m| m.name.as_ref()).collect();
        for g in &given {
            if !declared.contains(g) {
                return Err(Error::type_inference(span, format!("`{}` is not a member of struct `{}`", g, name)));
            }
        }
        if base.is_none() {
            for d in &declared {
                if !given.contains(d) {
                    return Err(Error::type_inference(span, format!("missing member `{}` in struct literal", d)));
                }
            }
        } else if given.len() == declared.len() {
            self.warnings.push(WarningKind::UselessSplat, span, "splat struct literal supplies every member; `..` has no effect");
        }
        if let Some(b) = base {
            let base_ty = self.deduce(b)?;
            match &base_ty {
                Type::Struct(s) if s.name.as_ref() == name => {}
                _ => return Err(Error::type_inference(self.span(b), "splat base must be a value of the same struct type")),
            }
        }

        let mut member_types = Vec::with_capacity(def.members.len());
        for decl in &def.members {
            let ty = if let Some((_, expr)) = members.iter().find(|(n, _)| n.as_ref() == decl.name.as_ref()) {
                self.deduce(*expr)?
            } else {
                deduce_type_annotation(self, decl.type_annotation)?
            };
            member_types.push((decl.name.clone(), ty));
        }
        Ok(Type::Struct(Box::new(StructType { nominal: crate::types::NominalId { module: self.module.name.clone(), name: Rc::from(name) }, name: Rc::from(name), members: member_types, env: self.env.clone() })))
    }

    fn deduce_attr(&mut self, node: NodeId, base: NodeId, member: &str) -> Result<Type> {
        let span = self.span(node);
        let base_ty = self.deduce(base)?;
        match base_ty {
            Type::Struct(s) => s
                .members
                .iter()
                .find(|(n, _)| n.as_ref() == member)
                .map(|(_, t)| t.clone())
                .ok_or_else(|| Error::type_inference(span, format!("unknown struct member `{}`", member))),
            _ => Err(Error::type_inference(span, "attribute access on a non-struct value")),
        }
    }

    fn deduce_index(&mut self, node: NodeId, base: NodeId, index: NodeId) -> Result<Type> {
        let span = self.span(node);
        let base_ty = self.deduce(base)?;
        let idx_ty = self.deduce(index)?;
        if !matches!(idx_ty, Type::Bits { signed: false, .. }) {
            return Err(Error::type_inference(span, "array index must be unsigned bits"));
        }
        match base_ty {
            Type::Array { elem, size } => {
                if self.type_info.is_const_expr(index) {
                    if let (Some(n), Ok(i)) = (size.as_const(), self.eval_const_u32(index)) {
                        if i >= n {
                            return Err(Error::constexpr(span, format!("index {} out of bounds for array of size {}", i, n)));
                        }
                    }
                }
                Ok(*elem)
            }
            _ => Err(Error::type_inference(span, "index access on a non-array value")),
        }
    }

    fn deduce_slice(&mut self, node: NodeId, base: NodeId, start: Option<NodeId>, limit: Option<NodeId>) -> Result<Type> {
        let span = self.span(node);
        let base_ty = self.deduce(base)?;
        if base_ty.is_signed_bits() {
            return Err(Error::type_inference(span, "slice LHS must be unsigned bits"));
        }
        let total = base_ty
            .bits_size()
            .and_then(|d| d.as_const())
            .ok_or_else(|| Error::type_inference(span, "slice LHS must have a concrete width"))? as i64;

        let resolve_bound = |d: &mut Self, n: Option<NodeId>, default: i64| -> Result<i64> {
            match n {
                None => Ok(default),
                Some(e) => {
                    let v = d.eval_const(e)?;
                    let bits = v.bits().ok_or_else(|| Error::type_inference(d.span(e), "slice bound must be a bits value"))?;
                    let as_i128: i128 = bits.to_bigint().try_into().unwrap_or(0);
                    Ok(as_i128 as i64)
                }
            }
        };
        let raw_start = resolve_bound(self, start, 0)?;
        let raw_limit = resolve_bound(self, limit, total)?;
        let norm = |v: i64| -> i64 { if v < 0 { v + total } else { v } };
        let clamp = |v: i64| -> i64 { v.clamp(0, total) };
        let limit_c = clamp(norm(raw_limit));
        let start_c = clamp(norm(raw_start)).min(limit_c);
        let width = (limit_c - start_c).max(0) as usize;

        self.type_info.note_slice_bounds(node, &self.env, SliceBounds { start: start_c as usize, width });
        Ok(Type::Bits { signed: false, size: Dim::konst(width as u32) })
    }

    fn deduce_width_slice(&mut self, node: NodeId, base: NodeId, start: NodeId, width: NodeId) -> Result<Type> {
        let span = self.span(node);
        let base_ty = self.deduce(base)?;
        let start_ty = self.deduce(start)?;
        if start_ty.is_signed_bits() {
            return Err(Error::type_inference(span, "width-slice start must be unsigned"));
        }
        let width_ty = deduce_type_annotation(self, width)?;
        if let (Some(bw), Some(sw)) = (base_ty.bits_size().and_then(|d| d.as_const()), width_ty.bits_size().and_then(|d| d.as_const())) {
            if sw > bw {
                return Err(Error::type_inference(span, "width-slice width exceeds the base bits width"));
            }
        }
        Ok(width_ty)
    }

    fn deduce_invocation(&mut self, node: NodeId, callee: NodeId, parametrics: &[NodeId], args: &[NodeId]) -> Result<Type> {
        let span = self.span(node);
        let callee_ty = self.deduce(callee)?;
        let mut arg_types = Vec::with_capacity(args.len());
        for a in args {
            arg_types.push(self.deduce(*a)?);
        }
        match callee_ty {
            Type::Function(ft) => {
                if ft.params.len() != arg_types.len() {
                    return Err(Error::type_inference(span, "argument count mismatch"));
                }
                if parametrics.is_empty() && ft.env.names().next().is_none() {
                    for (formal, actual) in ft.params.iter().zip(&arg_types) {
                        self.unify(node, formal, actual, "argument type mismatch")?;
                    }
                    return Ok(*ft.ret);
                }
                crate::instantiate::instantiate_call(self, callee, parametrics, &arg_types, span)
            }
            _ => Err(Error::type_inference(span, "callee is not a function")),
        }
    }

    fn deduce_spawn(&mut self, node: NodeId, callee: NodeId, config_args: &[NodeId], next_args: &[NodeId]) -> Result<Type> {
        let span = self.span(node);
        let name = match self.module.arena.kind(callee) {
            NodeKind::NameRef(n) => n.clone(),
            _ => return Err(Error::type_inference(span, "spawn callee must name a proc")),
        };
        let proc = self
            .module
            .find_proc(&name)
            .cloned()
            .ok_or_else(|| Error::type_inference(span, format!("unknown proc `{}`", name)))?;

        for a in config_args {
            self.deduce(*a)?;
        }
        for a in next_args {
            self.deduce(*a)?;
        }
        let init_ret_node = proc.init.return_type.ok_or_else(|| Error::internal(span, "proc init has no declared return type"))?;
        let init_ret = deduce_type_annotation(self, init_ret_node)?;
        if let Some(state_param) = proc.next.params.get(1) {
            let state_ty = deduce_type_annotation(self, state_param.type_annotation)?;
            self.unify(node, &init_ret, &state_ty, "proc init return type must equal next's state parameter type")?;
        }
        Ok(Type::Token)
    }

    fn deduce_range(&mut self, node: NodeId, start: NodeId, end: NodeId) -> Result<Type> {
        let span = self.span(node);
        let st = self.deduce(start)?;
        let et = self.deduce(end)?;
        self.unify(node, &st, &et, "range endpoints must have the same type")?;
        if !self.type_info.is_const_expr(start) || !self.type_info.is_const_expr(end) {
            return Err(Error::constexpr(span, "range endpoints must be constexpr"));
        }
        let a = self.eval_const_u32(start)?;
        let b = self.eval_const_u32(end)?;
        if b <= a {
            self.warnings.push(WarningKind::EmptyRange, span, "range is empty");
        }
        Ok(Type::Array { elem: Box::new(st), size: Dim::konst(b.saturating_sub(a)) })
    }

    fn deduce_channel_decl(&mut self, node: NodeId, payload: NodeId, dims: &[NodeId], fifo_depth: Option<NodeId>) -> Result<Type> {
        let payload_ty = deduce_type_annotation(self, payload)?;
        if let Some(fd) = fifo_depth {
            let fd_ty = self.deduce(fd)?;
            self.unify(node, &fd_ty, &Type::u(32), "fifo depth must be u32")?;
        }
        let mut out = Type::Channel { payload: Box::new(payload_ty.clone()), direction: ChannelDirection::Out };
        for d in dims {
            let n = self.eval_const_u32(*d)?;
            out = Type::Array { elem: Box::new(out), size: Dim::konst(n) };
        }
        let input = match &out {
            Type::Array { elem, size } => Type::Array { elem: Box::new(with_direction(elem, ChannelDirection::In)), size: size.clone() },
            _ => with_direction(&out, ChannelDirection::In),
        };
        Ok(Type::Tuple(vec![out, input]))
    }

    pub(crate) fn deduce_const_assert(&mut self, node: NodeId, e: NodeId) -> Result<Type> {
        let span = self.span(node);
        let ty = self.deduce(e)?;
        self.unify(node, &ty, &Type::bool_ty(), "const_assert argument must be u1")?;
        if !self.type_info.is_const_expr(e) {
            return Err(Error::constexpr(span, "const_assert argument must be constexpr"));
        }
        let v = self.eval_const(e)?;
        if !v.as_bool().unwrap_or(false) {
            return Err(Error::constexpr(span, format!("const_assert failed under environment {}", self.env)));
        }
        Ok(Type::Tuple(Vec::new()))
    }
}

fn with_direction(ty: &Type, direction: ChannelDirection) -> Type {
    match ty {
        Type::Channel { payload, .. } => Type::Channel { payload: payload.clone(), direction },
        other => other.clone(),
    }
}

fn value_type_hint(v: &Value) -> Type {
    match v {
        Value::UBits(b) => Type::Bits { signed: false, size: Dim::konst(b.width() as u32) },
        Value::SBits(b) => Type::Bits { signed: true, size: Dim::konst(b.width() as u32) },
        _ => Type::u(32),
    }
}
