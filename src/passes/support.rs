//! Shared mechanics every simplification-style pass in this module needs:
//! replacing one node's uses with another's across a whole graph, and the
//! mark-and-sweep liveness computation dead-code elimination is built on.
//! Not itself a registered pass (spec §4.10 names it implicitly as the
//! common "eliminate X, then DCE" shape every simplification pass shares).

use std::collections::HashSet;

use crate::ir::{NodeGraph, NodeId};

/// Rewrites every node's operands so that references to `from` become
/// references to `to`, across the whole graph, plus any of `roots` that
/// pointed at `from`. Does not remove `from` itself — DCE does that once it
/// observes `from` has no remaining readers.
pub fn replace_uses(graph: &mut NodeGraph, roots: &mut [&mut NodeId], from: NodeId, to: NodeId) {
    let ids: Vec<NodeId> = graph.live_ids();
    for id in ids {
        if let Some(node) = graph.get_mut(id) {
            node.op.replace_operand(from, to);
        }
    }
    for root in roots {
        if **root == from {
            **root = to;
        }
    }
}

/// Mark-and-sweep: every node reachable from `roots`, plus every
/// side-effecting node (a `Send`/`Receive`/`NextValue`/`Assert` is kept alive
/// even if its value is unused — spec "no partial optimization", side
/// effects are never silently dropped), is live; everything else is removed.
/// Returns whether anything was actually removed.
pub fn sweep_dead(graph: &mut NodeGraph, roots: &[NodeId]) -> bool {
    let mut live = HashSet::new();
    let mut frontier: Vec<NodeId> = roots.to_vec();
    for node in graph.iter() {
        if node.op.is_side_effecting() {
            frontier.push(node.id);
        }
    }
    while let Some(id) = frontier.pop() {
        if !live.insert(id) {
            continue;
        }
        if let Some(node) = graph.get(id) {
            frontier.extend(node.op.operands());
        }
    }
    let dead: Vec<NodeId> = graph.iter().map(|n| n.id).filter(|id| !live.contains(id)).collect();
    let changed = !dead.is_empty();
    for id in dead {
        graph.remove(id);
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IrType, NodeOp, UnOp};
    use crate::value::Value;

    #[test]
    fn sweep_dead_keeps_only_reachable() {
        let mut g = NodeGraph::new();
        let live = g.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let dead = g.add(NodeOp::Literal(Value::u32(2)), IrType::Bits(32), None);
        let root = g.add(NodeOp::Unary(UnOp::Identity, live), IrType::Bits(32), None);
        assert!(sweep_dead(&mut g, &[root]));
        assert!(g.get(dead).is_none());
        assert!(g.get(live).is_some());
        assert!(g.get(root).is_some());
    }

    #[test]
    fn replace_uses_rewrites_operands_and_roots() {
        let mut g = NodeGraph::new();
        let a = g.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let b = g.add(NodeOp::Literal(Value::u32(2)), IrType::Bits(32), None);
        let wrapper = g.add(NodeOp::Unary(UnOp::Identity, a), IrType::Bits(32), None);
        let mut root = wrapper;
        replace_uses(&mut g, &mut [&mut root], a, b);
        assert_eq!(g.get(wrapper).unwrap().op.operands().as_slice(), &[b]);

        replace_uses(&mut g, &mut [&mut root], wrapper, b);
        assert_eq!(root, b);
    }
}
