//! Token-dependency threading (spec §4.10 step 8, between
//! channel-legalization and proc-inlining). Grounded on
//! `xls/passes/token_dependency_pass.h`: every side-effecting node in a proc
//! (`Send`/`Receive`/`Assert`) must be ordered before the proc's emitted
//! `next_token`, so any not already reachable from it are folded into an
//! `AfterAll`.

use std::collections::HashSet;

use crate::errors::Result;
use crate::ir::{NodeId, NodeOp, Package};
use crate::passes::{Pass, PassOptions, PassResults};

pub struct TokenDependencyPass;

impl Pass for TokenDependencyPass {
    fn name(&self) -> &str {
        "token_dependency"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let mut changed = false;
        for p in &mut package.procs {
            let side_effecting: Vec<NodeId> = p.nodes.iter().filter(|n| n.op.is_side_effecting()).map(|n| n.id).collect();
            let reachable = reachable_from(&p.nodes, p.next_token);
            let missing: Vec<NodeId> = side_effecting.into_iter().filter(|id| !reachable.contains(id)).collect();
            if missing.is_empty() {
                continue;
            }
            let mut items = vec![p.next_token];
            items.extend(missing);
            p.next_token = p.nodes.add(NodeOp::AfterAll(items), crate::ir::IrType::Token, None);
            changed = true;
        }
        Ok(changed)
    }
}

fn reachable_from(graph: &crate::ir::NodeGraph, root: NodeId) -> HashSet<NodeId> {
    let mut seen = HashSet::new();
    let mut frontier = vec![root];
    while let Some(id) = frontier.pop() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(node) = graph.get(id) {
            frontier.extend(node.op.operands());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IrType, NodeGraph, Proc};
    use crate::value::{ChannelId, Value};
    use std::rc::Rc;

    #[test]
    fn threads_untracked_send_into_next_token() {
        let mut nodes = NodeGraph::new();
        let state = nodes.add(NodeOp::Literal(Value::u32(0)), IrType::Bits(32), None);
        let token = nodes.add(NodeOp::AfterAll(Vec::new()), IrType::Token, None);
        let data = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let send = nodes.add(NodeOp::Send { channel: ChannelId(0), token, data, predicate: None }, IrType::Token, None);
        // `next_token` deliberately does NOT reference `send`.
        let mut pkg = Package::new("p");
        pkg.procs.push(Proc { name: Rc::from("p"), state_param: state, token_param: token, nodes, next_state: state, next_token: token });

        let changed = TokenDependencyPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        let new_token = pkg.procs[0].next_token;
        match &pkg.procs[0].nodes.get(new_token).unwrap().op {
            NodeOp::AfterAll(items) => assert!(items.contains(&send)),
            other => panic!("expected AfterAll, got {:?}", other),
        }
    }
}
