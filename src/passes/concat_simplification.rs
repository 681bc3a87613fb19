//! Concat simplification (spec §4.10 step 2). Grounded on
//! `xls/passes/concat_simplification_pass.h`: a single-operand concat is an
//! identity.

use crate::errors::Result;
use crate::ir::{NodeId, NodeOp, Package};
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};

pub struct ConcatSimplificationPass {
    pub opt_level: i64,
}

impl Pass for ConcatSimplificationPass {
    fn name(&self) -> &str {
        "concat_simplification"
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
        let single = match graph.get(id).map(|n| &n.op) {
            Some(NodeOp::Concat(items)) if items.len() == 1 => Some(items[0]),
            _ => None,
        };
        if let Some(operand) = single {
            replace_uses(graph, roots, id, operand);
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
    fn single_item_concat_is_identity() {
        let mut nodes = NodeGraph::new();
        let x = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let ret = nodes.add(NodeOp::Concat(vec![x]), IrType::Bits(32), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = ConcatSimplificationPass { opt_level: 3 }.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.functions[0].ret, x);
    }
}
