//! Useless-assert removal (spec §4.10 step 7). Grounded on
//! `xls/passes/useless_assert_removal_pass.h`: an `Assert` whose condition is
//! a literal `true` can never fire, so it contributes nothing beyond
//! ordering — replaced by its own input token.

use crate::errors::Result;
use crate::ir::{NodeId, NodeOp, Package};
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};

pub struct UselessAssertRemovalPass;

impl Pass for UselessAssertRemovalPass {
    fn name(&self) -> &str {
        "useless_assert_removal"
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
        let (token, condition) = match graph.get(id).map(|n| &n.op) {
            Some(NodeOp::Assert { token, condition, .. }) => (*token, *condition),
            _ => continue,
        };
        let always_true = matches!(graph.get(condition).map(|n| &n.op), Some(NodeOp::Literal(v)) if v.as_bool() == Some(true));
        if always_true {
            replace_uses(graph, roots, id, token);
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
    fn always_true_assert_is_removed() {
        let mut nodes = NodeGraph::new();
        let token = nodes.add(NodeOp::AfterAll(Vec::new()), IrType::Token, None);
        let cond = nodes.add(NodeOp::Literal(Value::bool_value(true)), IrType::Bits(1), None);
        let ret = nodes.add(NodeOp::Assert { token, condition: cond, message: Rc::from("unreachable") }, IrType::Token, None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = UselessAssertRemovalPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.functions[0].ret, token);
    }
}
