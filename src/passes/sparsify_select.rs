//! Select sparsification (spec §4.10 registry). Grounded on
//! `xls/passes/sparsify_select_pass.h`: trailing `Select` cases identical to
//! the `default` are redundant — an out-of-range selector already evaluates
//! to `default` (see `select_simplification::pick_case`), so truncating them
//! changes the case-vector length without changing any result.

use crate::errors::Result;
use crate::ir::{NodeOp, Package};
use crate::passes::{Pass, PassOptions, PassResults};

pub struct SparsifySelectPass;

impl Pass for SparsifySelectPass {
    fn name(&self) -> &str {
        "sparsify_select"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let mut changed = false;
        for f in &mut package.functions {
            changed |= sparsify_graph(&mut f.nodes);
        }
        for p in &mut package.procs {
            changed |= sparsify_graph(&mut p.nodes);
        }
        Ok(changed)
    }
}

fn sparsify_graph(graph: &mut crate::ir::NodeGraph) -> bool {
    let ids = graph.live_ids();
    let mut changed = false;
    for id in ids {
        let (mut cases, selector, default) = match graph.get(id).map(|n| &n.op) {
            Some(NodeOp::Select { selector, cases, default: Some(default) }) => (cases.clone(), *selector, *default),
            _ => continue,
        };
        let original_len = cases.len();
        while cases.last() == Some(&default) {
            cases.pop();
        }
        if cases.len() != original_len {
            graph.replace_op(id, NodeOp::Select { selector, cases, default: Some(default) });
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
    fn trailing_default_duplicate_cases_truncate() {
        let mut nodes = NodeGraph::new();
        let sel = nodes.add(NodeOp::Param(Rc::from("sel")), IrType::Bits(32), None);
        let a = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let default = nodes.add(NodeOp::Literal(Value::u32(9)), IrType::Bits(32), None);
        let ret = nodes.add(
            NodeOp::Select { selector: sel, cases: vec![a, default, default], default: Some(default) },
            IrType::Bits(32),
            None,
        );
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: vec![(Rc::from("sel"), sel)], nodes, ret });

        let changed = SparsifySelectPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        match &pkg.functions[0].nodes.get(ret).unwrap().op {
            NodeOp::Select { cases, .. } => assert_eq!(cases.len(), 1),
            other => panic!("expected Select, got {:?}", other),
        }
    }
}
