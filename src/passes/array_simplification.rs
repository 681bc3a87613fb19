//! Array simplification (spec §4.10 step 2). Grounded on
//! `xls/passes/array_simplification_pass.h`: indexing a freshly-built
//! `Array` literal with a constant index is the corresponding element
//! directly, skipping the intermediate array entirely.

use crate::errors::Result;
use crate::ir::{NodeId, NodeOp, Package};
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};

/// Opt level accepted for parity with the registry's capped-variant
/// construction (spec §4.10 "capped variants"); unused since this rewrite is
/// safe at any level.
pub struct ArraySimplificationPass {
    pub opt_level: i64,
}

impl Pass for ArraySimplificationPass {
    fn name(&self) -> &str {
        "array_simplification"
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

fn simplify_graph(graph: &mut crate::ir::NodeGraph, roots: &mut [&mut NodeId]) -> bool {
    let ids = graph.live_ids();
    let mut changed = false;
    for id in ids {
        let (operand, index) = match graph.get(id).map(|n| &n.op) {
            Some(NodeOp::ArrayIndex { operand, index }) => (*operand, *index),
            _ => continue,
        };
        let items = match graph.get(operand).map(|n| &n.op) {
            Some(NodeOp::Array(items)) => items.clone(),
            _ => continue,
        };
        let index_value = match graph.get(index).map(|n| &n.op) {
            Some(NodeOp::Literal(v)) => v.as_usize(),
            _ => None,
        };
        let Some(index_value) = index_value else { continue };
        let clamped = index_value.min(items.len().saturating_sub(1));
        if let Some(&element) = items.get(clamped) {
            replace_uses(graph, roots, id, element);
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Function, IrType, NodeGraph};
    use crate::value::Value;
    use std::rc::Rc;

    #[test]
    fn literal_index_picks_element() {
        let mut nodes = NodeGraph::new();
        let e0 = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let e1 = nodes.add(NodeOp::Literal(Value::u32(2)), IrType::Bits(32), None);
        let arr = nodes.add(NodeOp::Array(vec![e0, e1]), IrType::Array { elem: Box::new(IrType::Bits(32)), size: 2 }, None);
        let idx = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let ret = nodes.add(NodeOp::ArrayIndex { operand: arr, index: idx }, IrType::Bits(32), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = ArraySimplificationPass { opt_level: 3 }.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.functions[0].ret, e1);
    }
}
