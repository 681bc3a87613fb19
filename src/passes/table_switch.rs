//! Table-switch simplification (spec §4.10 step 2). Grounded on
//! `xls/passes/table_switch_pass.h`'s degenerate cases: a `Select` with no
//! cases is just its default, and a `Select` with exactly one case and no
//! default is that case regardless of the selector.

use crate::errors::Result;
use crate::ir::{NodeId, NodeOp, Package};
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};

pub struct TableSwitchPass;

impl Pass for TableSwitchPass {
    fn name(&self) -> &str {
        "table_switch"
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
        let degenerate = match graph.get(id).map(|n| &n.op) {
            Some(NodeOp::Select { cases, default, .. }) if cases.is_empty() => *default,
            Some(NodeOp::Select { cases, default: None, .. }) if cases.len() == 1 => Some(cases[0]),
            _ => None,
        };
        if let Some(replacement) = degenerate {
            replace_uses(graph, roots, id, replacement);
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
    fn single_case_no_default_collapses() {
        let mut nodes = NodeGraph::new();
        let sel = nodes.add(NodeOp::Literal(Value::u32(0)), IrType::Bits(32), None);
        let only_case = nodes.add(NodeOp::Literal(Value::u32(42)), IrType::Bits(32), None);
        let ret = nodes.add(NodeOp::Select { selector: sel, cases: vec![only_case], default: None }, IrType::Bits(32), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = TableSwitchPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.functions[0].ret, only_case);
    }
}
