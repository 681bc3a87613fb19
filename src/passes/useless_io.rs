//! Useless-IO removal (spec §4.10 step 7). Grounded on
//! `xls/passes/useless_io_removal_pass.h`: a `Send`/`Receive` guarded by a
//! literal-`false` predicate never fires, so it's replaced by its own input
//! token — same shape as `next_value_optimization`'s false-predicate case,
//! but for channel traffic rather than state writes.

use crate::errors::Result;
use crate::ir::{NodeId, NodeOp, Package};
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};

pub struct UselessIoRemovalPass;

impl Pass for UselessIoRemovalPass {
    fn name(&self) -> &str {
        "useless_io_removal"
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

fn never_fires(graph: &crate::ir::NodeGraph, predicate: Option<NodeId>) -> bool {
    match predicate {
        Some(p) => matches!(graph.get(p).map(|n| &n.op), Some(NodeOp::Literal(v)) if v.as_bool() == Some(false)),
        None => false,
    }
}

fn simplify_graph(graph: &mut crate::ir::NodeGraph, roots: &mut [&mut NodeId]) -> bool {
    let ids = graph.live_ids();
    let mut changed = false;
    for id in ids {
        let token = match graph.get(id).map(|n| &n.op) {
            Some(NodeOp::Send { token, predicate, .. }) if never_fires(graph, *predicate) => Some(*token),
            Some(NodeOp::Receive { token, predicate, .. }) if never_fires(graph, *predicate) => Some(*token),
            _ => None,
        };
        if let Some(token) = token {
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
    use crate::value::{ChannelId, Value};
    use std::rc::Rc;

    #[test]
    fn send_that_never_fires_is_removed() {
        let mut nodes = NodeGraph::new();
        let token = nodes.add(NodeOp::AfterAll(Vec::new()), IrType::Token, None);
        let data = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let pred = nodes.add(NodeOp::Literal(Value::bool_value(false)), IrType::Bits(1), None);
        let ret = nodes.add(NodeOp::Send { channel: ChannelId(0), token, data, predicate: Some(pred) }, IrType::Token, None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = UselessIoRemovalPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.functions[0].ret, token);
    }
}
