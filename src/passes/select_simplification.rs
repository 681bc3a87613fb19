//! Select simplification (spec §4.10 step 2). Grounded on
//! `xls/passes/select_simplification_pass.h`: a `Select` whose selector is a
//! literal picks its case (or default) directly; a `Select` whose every case
//! (and default, if present) is the same node is that node regardless of the
//! selector's value.

use crate::errors::Result;
use crate::ir::{NodeId, NodeOp, Package};
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};

pub struct SelectSimplificationPass {
    pub opt_level: i64,
}

impl Pass for SelectSimplificationPass {
    fn name(&self) -> &str {
        "select_simplification"
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

pub(crate) fn pick_case(graph: &crate::ir::NodeGraph, selector: NodeId, cases: &[NodeId], default: Option<NodeId>) -> Option<NodeId> {
    let selector_value = match graph.get(selector).map(|n| &n.op) {
        Some(NodeOp::Literal(v)) => v.as_usize()?,
        _ => return None,
    };
    cases.get(selector_value).copied().or(default)
}

fn simplify_graph(graph: &mut crate::ir::NodeGraph, roots: &mut [&mut NodeId]) -> bool {
    let ids = graph.live_ids();
    let mut changed = false;
    for id in ids {
        let node = match graph.get(id) {
            Some(n) => n,
            None => continue,
        };
        let (selector, cases, default) = match &node.op {
            NodeOp::Select { selector, cases, default } => (*selector, cases.clone(), *default),
            _ => continue,
        };
        let replacement = pick_case(graph, selector, &cases, default).or_else(|| {
            let mut all = cases.iter().copied().chain(default);
            let first = all.next()?;
            if all.all(|c| c == first) {
                Some(first)
            } else {
                None
            }
        });
        if let Some(replacement) = replacement {
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
    fn literal_selector_picks_case() {
        let mut nodes = NodeGraph::new();
        let sel = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let c0 = nodes.add(NodeOp::Literal(Value::u32(10)), IrType::Bits(32), None);
        let c1 = nodes.add(NodeOp::Literal(Value::u32(20)), IrType::Bits(32), None);
        let ret = nodes.add(NodeOp::Select { selector: sel, cases: vec![c0, c1], default: None }, IrType::Bits(32), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = SelectSimplificationPass { opt_level: 3 }.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.functions[0].ret, c1);
    }
}
