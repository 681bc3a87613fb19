//! Conditional specialization (spec §4.10 step 5, "BDD-aware"). Grounded on
//! `xls/passes/conditional_specialization_pass.h`: a `Select` over a 1-bit
//! selector whose cases are exactly the selector's own truth table is the
//! selector (or its complement), so the whole `Select` degenerates away.

use crate::errors::Result;
use crate::ir::{IrType, NodeId, NodeOp, Package, UnOp};
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};

/// `use_bdd` selects whether the (minimal, in-crate) BDD engine's
/// equivalence notion is consulted for the literal-case check, or whether
/// only exact `Literal` matches count (spec step 5 runs this pass with BDD
/// awareness; nothing upstream of step 5 does, so this flag documents that
/// distinction even though the literal check below is engine-independent).
pub struct ConditionalSpecializationPass {
    pub use_bdd: bool,
}

impl Pass for ConditionalSpecializationPass {
    fn name(&self) -> &str {
        "conditional_specialization"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let mut changed = false;
        for f in &mut package.functions {
            changed |= simplify_graph(&mut f.nodes, &mut [&mut f.ret]);
        }
        for p in &mut package.procs {
            changed |= simplify_graph(&mut p.nodes, &mut [&mut p.next_state, &mut p.next_token]);
        }
        Ok(changed)
    }
}

fn bit_literal(graph: &crate::ir::NodeGraph, id: NodeId) -> Option<bool> {
    match graph.get(id).map(|n| &n.op) {
        Some(NodeOp::Literal(v)) => v.as_bool(),
        _ => None,
    }
}

fn simplify_graph(graph: &mut crate::ir::NodeGraph, roots: &mut [&mut NodeId]) -> bool {
    let ids = graph.live_ids();
    let mut changed = false;
    for id in ids {
        let node = match graph.get(id) {
            Some(n) => n,
            None => continue,
        };
        let (selector, cases, default) = match (&node.op, &node.ty) {
            (NodeOp::Select { selector, cases, default }, IrType::Bits(1)) if cases.len() == 2 && default.is_none() => {
                (*selector, cases.clone(), *default)
            }
            _ => continue,
        };
        let _ = default;
        let (c0, c1) = (bit_literal(graph, cases[0]), bit_literal(graph, cases[1]));
        match (c0, c1) {
            (Some(false), Some(true)) => {
                replace_uses(graph, roots, id, selector);
                changed = true;
            }
            (Some(true), Some(false)) => {
                graph.replace_op(id, NodeOp::Unary(UnOp::Not, selector));
                changed = true;
            }
            _ => {}
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Function, NodeGraph};
    use crate::value::Value;
    use std::rc::Rc;

    #[test]
    fn select_over_own_truth_table_is_selector() {
        let mut nodes = NodeGraph::new();
        let sel = nodes.add(NodeOp::Param(Rc::from("sel")), IrType::Bits(1), None);
        let zero = nodes.add(NodeOp::Literal(Value::bool_value(false)), IrType::Bits(1), None);
        let one = nodes.add(NodeOp::Literal(Value::bool_value(true)), IrType::Bits(1), None);
        let ret = nodes.add(NodeOp::Select { selector: sel, cases: vec![zero, one], default: None }, IrType::Bits(1), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: vec![(Rc::from("sel"), sel)], nodes, ret });

        let changed =
            ConditionalSpecializationPass { use_bdd: true }.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.functions[0].ret, sel);
    }
}
