//! Type-annotation deduction: resolves a `Ty*` AST node (spec §4.1's type
//! annotation forms) to the `Type` it denotes. Split out from the main
//! expression-deduction dispatch because every other rule calls into this
//! one repeatedly (annotations appear in `let`, `cast`, parameter, and
//! struct-member position).

use crate::ast::NodeId;
use crate::ast::{ChannelDirAnnot, NodeKind};
use crate::errors::Result;
use crate::errors::Error;
use crate::types::{Binding, ChannelDirection, Dim, EnumType, NominalId, StructType, Type};
use crate::value::Value;

use super::Deducer;

/// Resolves a dimension-position node to a `Dim`: a bare reference to a
/// still-unbound parametric symbol stays symbolic (spec §4.3), anything
/// else is evaluated to a concrete constant.
fn resolve_dim(d: &mut Deducer, node: NodeId) -> Result<Dim> {
    if let NodeKind::NameRef(name) = d.module.arena.kind(node).clone() {
        if let Some(Binding::Residual(dim)) = d.env.lookup(&name).cloned() {
            return Ok(dim);
        }
    }
    let w = d.eval_const_u32(node)?;
    Ok(Dim::konst(w))
}

pub fn deduce_type_annotation(d: &mut Deducer, node: NodeId) -> Result<Type> {
    let span = d.module.arena.span(node);
    let kind = d.module.arena.kind(node).clone();
    match kind {
        NodeKind::TyBuiltin { name } => builtin_type(&name, span),
        NodeKind::TySized { signed, size } => {
            let dim = resolve_dim(d, size)?;
            Ok(Type::Bits { signed, size: dim })
        }
        NodeKind::TyArray { elem, size } => {
            let elem_ty = deduce_type_annotation(d, elem)?;
            let dim = resolve_dim(d, size)?;
            Ok(Type::Array { elem: Box::new(elem_ty), size: dim })
        }
        NodeKind::TyTuple(items) => {
            let mut tys = Vec::with_capacity(items.len());
            for i in &items {
                tys.push(deduce_type_annotation(d, *i)?);
            }
            Ok(Type::Tuple(tys))
        }
        NodeKind::TyChannel { payload, direction } => {
            let payload_ty = deduce_type_annotation(d, payload)?;
            let dir = match direction {
                ChannelDirAnnot::In => ChannelDirection::In,
                ChannelDirAnnot::Out => ChannelDirection::Out,
            };
            Ok(Type::Channel { payload: Box::new(payload_ty), direction: dir })
        }
        NodeKind::TyRef { lhs, name, parametrics } => resolve_ty_ref(d, node, lhs, &name, &parametrics, span),
        _ => Err(Error::internal(span, "node is not a type annotation")),
    }
}

fn builtin_type(name: &str, span: crate::source::Span) -> Result<Type> {
    match name {
        "bool" => Ok(Type::bool_ty()),
        "token" => Ok(Type::Token),
        other => Err(Error::type_inference(span, format!("unknown builtin type `{}`", other))),
    }
}

/// Resolves a `TyRef` (type alias, enum, or struct name, optionally
/// parametrized) in the current module, or, when `lhs` names an imported
/// module, in that module via `typecheck_module`'s resolved import table
/// (spec §4.7, §9 "Imports and cross-module TypeInfo").
fn resolve_ty_ref(d: &mut Deducer, node: NodeId, lhs: Option<NodeId>, name: &str, parametrics: &[NodeId], span: crate::source::Span) -> Result<Type> {
    if let Some(lhs_node) = lhs {
        let module_name = match d.module.arena.kind(lhs_node) {
            NodeKind::NameRef(n) => n.clone(),
            _ => return Err(Error::internal(span, "cross-module type reference must have a plain module-name lhs")),
        };
        let imports = d
            .imports
            .ok_or_else(|| Error::internal(span, "this module has no resolved imports"))?;
        let imported = imports
            .resolve(&module_name)
            .ok_or_else(|| Error::type_inference(span, format!("unknown imported module `{}`", module_name)))?
            .clone();
        if !parametrics.is_empty() {
            return Err(Error::type_inference(span, "cross-module type reference does not take parametrics here"));
        }
        let mut scratch_ti = crate::typeinfo::TypeInfo::new();
        let mut scratch_warnings = crate::warnings::WarningCollector::new();
        let mut child = Deducer::new(imported.module.as_ref(), &mut scratch_ti, crate::types::ParametricEnv::new(), &mut scratch_warnings);
        if let Some(alias) = imported.module.find_type_alias(name).cloned() {
            return deduce_type_annotation(&mut child, alias.type_annotation);
        }
        if let Some(enum_def) = imported.module.find_enum(name).cloned() {
            let underlying = deduce_type_annotation(&mut child, enum_def.underlying)?;
            return Ok(Type::Enum(Box::new(EnumType {
                nominal: NominalId { module: imported.module.name.clone(), name: enum_def.name.clone() },
                name: enum_def.name.clone(),
                underlying: Box::new(underlying),
            })));
        }
        if let Some(struct_def) = imported.module.find_struct(name).cloned() {
            if !struct_def.parametrics.is_empty() {
                return Err(Error::type_inference(span, "cross-module parametric struct reference is not supported without explicit parametrics"));
            }
            let mut members = Vec::with_capacity(struct_def.members.len());
            for m in &struct_def.members {
                members.push((m.name.clone(), deduce_type_annotation(&mut child, m.type_annotation)?));
            }
            return Ok(Type::Struct(Box::new(StructType {
                nominal: NominalId { module: imported.module.name.clone(), name: struct_def.name.clone() },
                name: struct_def.name.clone(),
                members,
                env: child.env.clone(),
            })));
        }
        return Err(Error::type_inference(span, format!("unknown type `{}` in imported module `{}`", name, module_name)));
    }
    if let Some(alias) = d.module.find_type_alias(name).cloned() {
        if !parametrics.is_empty() {
            return Err(Error::type_inference(span, "type alias does not take parametrics"));
        }
        return deduce_type_annotation(d, alias.type_annotation);
    }
    if let Some(enum_def) = d.module.find_enum(name).cloned() {
        let underlying = deduce_type_annotation(d, enum_def.underlying)?;
        return Ok(Type::Enum(Box::new(EnumType { nominal: NominalId { module: d.module.name.clone(), name: enum_def.name.clone() }, name: enum_def.name.clone(), underlying: Box::new(underlying) })));
    }
    if let Some(struct_def) = d.module.find_struct(name).cloned() {
        if parametrics.len() > struct_def.parametrics.len() {
            return Err(Error::type_inference(span, "too many parametric arguments for struct type"));
        }
        let saved_env = d.env.clone();
        for (formal, actual) in struct_def.parametrics.iter().zip(parametrics) {
            let v = d.eval_const_u32(*actual)?;
            d.env.bind_value(formal.name.clone(), Value::u32(v));
        }
        for formal in struct_def.parametrics.iter().skip(parametrics.len()) {
            match formal.default {
                Some(def_expr) => {
                    let v = d.eval_const_u32(def_expr)?;
                    d.env.bind_value(formal.name.clone(), Value::u32(v));
                }
                None => {
                    d.env = saved_env;
                    return Err(Error::type_inference(span, format!("missing parametric `{}` for struct `{}`", formal.name, name)));
                }
            }
        }
        let mut members = Vec::with_capacity(struct_def.members.len());
        let mut member_err = None;
        for m in &struct_def.members {
            match deduce_type_annotation(d, m.type_annotation) {
                Ok(t) => members.push((m.name.clone(), t)),
                Err(e) => {
                    member_err = Some(e);
                    break;
                }
            }
        }
        let env = d.env.clone();
        d.env = saved_env;
        if let Some(e) = member_err {
            return Err(e);
        }
        return Ok(Type::Struct(Box::new(StructType { nominal: NominalId { module: d.module.name.clone(), name: struct_def.name.clone() }, name: struct_def.name.clone(), members, env })));
    }
    Err(Error::type_inference(span, format!("unknown type `{}`", name)))
}
