//! Parametric instantiator (spec C7 / §4.6): resolves a parametric
//! function's formal parametrics against a call site's explicit parametrics
//! and argument types — explicit parametrics first (left to right), then
//! argument-driven unification binds newly-constrained symbols, then
//! defaults fill whatever remains — and typechecks the callee body once
//! under the resulting environment, caching it as a child `TypeInfo` keyed
//! by `(callee, env)` (spec §5).
//!
//! Grounded on `original_source/xls/dslx/type_system/parametric_instantiator.cc`'s
//! explicit-then-inferred-then-default ordering.

use std::rc::Rc;

use crate::ast::{Function, NodeId, NodeKind};
use crate::deduce::{deduce_type_annotation, Deducer};
use crate::errors::{Error, Result};
use crate::source::Span;
use crate::typeinfo::TypeInfo;
use crate::types::{ParametricEnv, Type};
use crate::value::Value;
use crate::warnings::WarningCollector;

pub fn instantiate_call(d: &mut Deducer, callee: NodeId, parametrics: &[NodeId], arg_types: &[Type], span: Span) -> Result<Type> {
    let name = match d.module.arena.kind(callee) {
        NodeKind::NameRef(n) => n.clone(),
        _ => return Err(Error::internal(span, "parametric call callee must be a plain name")),
    };
    let f = d
        .module
        .find_function(&name)
        .cloned()
        .ok_or_else(|| Error::type_inference(span, format!("unknown function `{}`", name)))?;

    if parametrics.len() > f.parametrics.len() {
        return Err(Error::type_inference(span, "too many explicit parametric arguments"));
    }

    let mut new_env = d.env.child();
    for (formal, actual) in f.parametrics.iter().zip(parametrics) {
        let v = d.eval_const_u32(*actual)?;
        new_env.bind_value(formal.name.clone(), Value::u32(v));
    }

    let unresolved: Vec<Rc<str>> = f.parametrics[parametrics.len()..].iter().map(|p| p.name.clone()).collect();
    let mut inferred: Vec<(Rc<str>, u32)> = Vec::new();
    for (param, actual) in f.params.iter().zip(arg_types) {
        infer_from_annotation(d, param.type_annotation, actual, &unresolved, &mut inferred);
    }
    for (name, width) in &inferred {
        new_env.bind_value(name.clone(), Value::u32(*width));
    }

    for formal in &f.parametrics[parametrics.len()..] {
        if new_env.lookup(&formal.name).is_some() {
            continue;
        }
        match formal.default {
            Some(default_expr) => {
                let saved = std::mem::replace(&mut d.env, new_env.clone());
                let v = d.eval_const_u32(default_expr);
                d.env = saved;
                new_env.bind_value(formal.name.clone(), Value::u32(v?));
            }
            None => return Err(Error::type_inference(span, format!("cannot infer parametric `{}`", formal.name))),
        }
    }

    let (ret_ty, child_ti, child_warnings) = typecheck_instantiation(d, &f, &new_env, arg_types, span)?;
    for w in child_warnings.into_warnings() {
        d.warnings.push(w.kind, w.span, w.message);
    }
    d.type_info.note_child(callee, &new_env, child_ti);
    Ok(ret_ty)
}

fn typecheck_instantiation(
    d: &Deducer,
    f: &Function,
    env: &ParametricEnv,
    arg_types: &[Type],
    span: Span,
) -> Result<(Type, TypeInfo, WarningCollector)> {
    let mut child_ti = TypeInfo::new();
    let mut child_warnings = WarningCollector::new();
    let ret_ty = {
        let mut child = Deducer::new(d.module, &mut child_ti, env.clone(), &mut child_warnings);
        for (p, actual) in f.params.iter().zip(arg_types) {
            let declared = deduce_type_annotation(&mut child, p.type_annotation)?;
            if !declared.structural_eq(actual) {
                return Err(Error::type_mismatch(span, declared, actual.clone(), None, None, "parametric argument type mismatch"));
            }
            child.bind_param(p.name.clone(), actual.clone());
        }
        let declared_ret = match f.return_type {
            Some(rt) => deduce_type_annotation(&mut child, rt)?,
            None => Type::Tuple(Vec::new()),
        };
        let body_ty = child.deduce(f.body)?;
        if !body_ty.structural_eq(&declared_ret) {
            return Err(Error::type_mismatch(span, body_ty, declared_ret, None, None, "function body type does not match declared return type"));
        }
        declared_ret
    };
    Ok((ret_ty, child_ti, child_warnings))
}

/// Walks a formal parameter's type-annotation syntax alongside its actual
/// (fully concrete) argument type, binding any `unresolved` symbol it finds
/// named directly as a `TySized`/`TyArray` size. Only direct `N`-shaped
/// positions are inverted; `N + 1`-shaped dimension expressions are left to
/// explicit parametrics or defaults (spec §4.6 Open Question, resolved in
/// `DESIGN.md`: argument-driven inference covers direct symbol positions
/// only).
fn infer_from_annotation(d: &Deducer, annotation: NodeId, actual: &Type, unresolved: &[Rc<str>], out: &mut Vec<(Rc<str>, u32)>) {
    let already_has = |out: &[(Rc<str>, u32)], name: &str| out.iter().any(|(n, _)| n.as_ref() == name);
    match d.module.arena.kind(annotation) {
        NodeKind::TySized { size, .. } => {
            if let NodeKind::NameRef(name) = d.module.arena.kind(*size) {
                if unresolved.iter().any(|u| u.as_ref() == name.as_ref()) && !already_has(out, name) {
                    if let Some(w) = actual.bits_size().and_then(|dd| dd.as_const()) {
                        out.push((name.clone(), w));
                    }
                }
            }
        }
        NodeKind::TyArray { elem, size } => {
            if let Type::Array { elem: aelem, size: asize } = actual {
                if let NodeKind::NameRef(name) = d.module.arena.kind(*size) {
                    if unresolved.iter().any(|u| u.as_ref() == name.as_ref()) && !already_has(out, name) {
                        if let Some(n) = asize.as_const() {
                            out.push((name.clone(), n));
                        }
                    }
                }
                infer_from_annotation(d, *elem, aelem, unresolved, out);
            }
        }
        NodeKind::TyTuple(items) => {
            if let Type::Tuple(ts) = actual {
                for (it, t) in items.iter().zip(ts) {
                    infer_from_annotation(d, *it, t, unresolved, out);
                }
            }
        }
        NodeKind::TyChannel { payload, .. } => {
            if let Type::Channel { payload: apayload, .. } = actual {
                infer_from_annotation(d, *payload, apayload, unresolved, out);
            }
        }
        _ => {}
    }
}
