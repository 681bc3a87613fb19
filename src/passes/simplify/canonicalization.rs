//! Canonicalization (spec §4.10 step 2). Grounded on
//! `xls/passes/canonicalization_pass.h`: puts commutative binary ops into a
//! canonical operand order (lower `NodeId` first) so later passes like CSE
//! see structurally identical expressions as identical regardless of how
//! the operands were originally written.

use crate::errors::Result;
use crate::ir::{BinOp, NodeOp, Package};
use crate::passes::{Pass, PassOptions, PassResults};

pub struct CanonicalizationPass;

impl Pass for CanonicalizationPass {
    fn name(&self) -> &str {
        "canonicalization"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let mut changed = false;
        for f in &mut package.functions {
            changed |= canonicalize_graph(&mut f.nodes);
        }
        for p in &mut package.procs {
            changed |= canonicalize_graph(&mut p.nodes);
        }
        Ok(changed)
    }
}

fn is_commutative(op: BinOp) -> bool {
    matches!(op, BinOp::Add | BinOp::Umul | BinOp::Smul | BinOp::And | BinOp::Or | BinOp::Xor | BinOp::Eq | BinOp::Ne)
}

fn canonicalize_graph(graph: &mut crate::ir::NodeGraph) -> bool {
    let ids = graph.live_ids();
    let mut changed = false;
    for id in ids {
        let swap = match graph.get(id) {
            Some(node) => match &node.op {
                NodeOp::Binary(op, a, b) if is_commutative(*op) && a.0 > b.0 => Some((*op, *a, *b)),
                _ => None,
            },
            None => None,
        };
        if let Some((op, a, b)) = swap {
            graph.replace_op(id, NodeOp::Binary(op, b, a));
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
    fn reorders_commutative_operands_by_id() {
        let mut nodes = NodeGraph::new();
        let a = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let b = nodes.add(NodeOp::Literal(Value::u32(2)), IrType::Bits(32), None);
        // Deliberately built with the higher id first.
        let ret = nodes.add(NodeOp::Binary(BinOp::Add, b, a), IrType::Bits(32), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        CanonicalizationPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        match &pkg.functions[0].nodes.get(ret).unwrap().op {
            NodeOp::Binary(BinOp::Add, lhs, rhs) => {
                assert_eq!(*lhs, a);
                assert_eq!(*rhs, b);
            }
            other => panic!("unexpected op {:?}", other),
        }
    }
}
