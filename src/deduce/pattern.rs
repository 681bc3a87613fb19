//! Pattern binding and matching: the "NameDefTree binding" and "Match"
//! deduction rules (spec §4.5), split out since both `let`/`for` irrefutable
//! binding and `match` refutable binding walk the same `NameDefTree` shape.

use crate::ast::{Module, NameDefTreeKind, NodeId, NodeKind};
use crate::errors::{Error, Result};
use crate::types::Type;
use crate::value::Value;

use super::Deducer;

/// Irrefutably bind every leaf of `pattern` against `ty` (and, when known,
/// `value`). Used by `let` and the `for`-loop pattern, where a pattern that
/// could fail to match (a literal or colon-ref pattern) is a compile error.
pub fn bind_name_def_tree(d: &mut Deducer, pattern: NodeId, ty: &Type, value: Option<&Value>) -> Result<()> {
    let span = d.module.arena.span(pattern);
    let kind = match d.module.arena.kind(pattern) {
        NodeKind::NameDefTree(k) => k.clone(),
        _ => return Err(Error::internal(span, "expected a NameDefTree node")),
    };
    match kind {
        NameDefTreeKind::Wildcard => Ok(()),
        NameDefTreeKind::Leaf(name) => {
            d.type_info.note_type(pattern, ty.clone());
            if let Some(v) = value {
                d.type_info.note_const_expr(pattern, v.clone());
            }
            d.bind_local(name, ty.clone(), value.cloned());
            Ok(())
        }
        NameDefTreeKind::Tuple(items) => {
            let elem_types = match ty {
                Type::Tuple(ts) if ts.len() == items.len() => ts.clone(),
                _ => return Err(Error::type_inference(span, "tuple pattern arity does not match the initializer's type")),
            };
            let elem_values: Vec<Option<Value>> = match value {
                Some(Value::Tuple(vs)) if vs.len() == items.len() => vs.iter().map(|v| Some(v.clone())).collect(),
                _ => vec![None; items.len()],
            };
            for ((item, t), v) in items.into_iter().zip(elem_types).zip(elem_values) {
                bind_name_def_tree(d, item, &t, v.as_ref())?;
            }
            Ok(())
        }
        NameDefTreeKind::Literal(_) | NameDefTreeKind::ColonRefPattern(_) => {
            Err(Error::type_inference(span, "refutable pattern is not allowed in an irrefutable binding position"))
        }
    }
}

/// Refutably unify `pattern` against `matched_ty`, binding any leaf names it
/// introduces into the current scope. Unlike `bind_name_def_tree`, literal
/// and colon-ref patterns are legal here — they just don't introduce a
/// binding, they constrain the match.
pub fn unify_match_pattern(d: &mut Deducer, pattern: NodeId, matched_ty: &Type) -> Result<()> {
    let span = d.module.arena.span(pattern);
    let kind = match d.module.arena.kind(pattern) {
        NodeKind::NameDefTree(k) => k.clone(),
        _ => return Err(Error::internal(span, "expected a NameDefTree node")),
    };
    match kind {
        NameDefTreeKind::Wildcard => Ok(()),
        NameDefTreeKind::Leaf(name) => {
            d.type_info.note_type(pattern, matched_ty.clone());
            d.bind_local(name, matched_ty.clone(), None);
            Ok(())
        }
        NameDefTreeKind::Tuple(items) => {
            let elem_types = match matched_ty {
                Type::Tuple(ts) if ts.len() == items.len() => ts.clone(),
                _ => return Err(Error::type_inference(span, "tuple pattern arity does not match the matched value's type")),
            };
            for (item, t) in items.into_iter().zip(elem_types) {
                unify_match_pattern(d, item, &t)?;
            }
            Ok(())
        }
        NameDefTreeKind::Literal(expr) => {
            let lit_ty = d.deduce(expr)?;
            if !lit_ty.structural_eq(matched_ty) {
                return Err(Error::type_mismatch(span, lit_ty, matched_ty.clone(), None, None, "match pattern type does not match the scrutinee"));
            }
            d.type_info.note_type(pattern, matched_ty.clone());
            Ok(())
        }
        NameDefTreeKind::ColonRefPattern(expr) => {
            let ref_ty = d.deduce(expr)?;
            if !ref_ty.structural_eq(matched_ty) {
                return Err(Error::type_mismatch(span, ref_ty, matched_ty.clone(), None, None, "match pattern type does not match the scrutinee"));
            }
            d.type_info.note_type(pattern, matched_ty.clone());
            Ok(())
        }
    }
}

/// Structural (not type-aware) equality of two pattern subtrees, used only
/// to flag a textually duplicate match arm (spec §11's supplemented
/// diagnostics, see `SPEC_FULL.md`).
pub fn patterns_syntactically_equal(module: &Module, a: NodeId, b: NodeId) -> bool {
    match (module.arena.kind(a), module.arena.kind(b)) {
        (NodeKind::NameDefTree(ka), NodeKind::NameDefTree(kb)) => match (ka, kb) {
            (NameDefTreeKind::Wildcard, NameDefTreeKind::Wildcard) => true,
            (NameDefTreeKind::Leaf(na), NameDefTreeKind::Leaf(nb)) => na == nb,
            (NameDefTreeKind::Tuple(ia), NameDefTreeKind::Tuple(ib)) => {
                ia.len() == ib.len() && ia.iter().zip(ib).all(|(x, y)| patterns_syntactically_equal(module, *x, *y))
            }
            (NameDefTreeKind::Literal(ea), NameDefTreeKind::Literal(eb)) => exprs_syntactically_equal(module, *ea, *eb),
            (NameDefTreeKind::ColonRefPattern(ea), NameDefTreeKind::ColonRefPattern(eb)) => exprs_syntactically_equal(module, *ea, *eb),
            _ => false,
        },
        _ => false,
    }
}

fn exprs_syntactically_equal(module: &Module, a: NodeId, b: NodeId) -> bool {
    match (module.arena.kind(a), module.arena.kind(b)) {
        (NodeKind::NameRef(na), NodeKind::NameRef(nb)) => na == nb,
        (NodeKind::ColonRef { lhs: la, member: ma }, NodeKind::ColonRef { lhs: lb, member: mb }) => {
            ma == mb && exprs_syntactically_equal(module, *la, *lb)
        }
        (NodeKind::Number { text: ta, .. }, NodeKind::Number { text: tb, .. }) => ta == tb,
        _ => false,
    }
}
