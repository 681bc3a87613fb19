//! Reassociation (spec §4.10 step 2). Grounded on
//! `xls/passes/reassociation_pass.h`: folds a chain of two additions against
//! a literal, `(x + c1) + c2 => x + (c1 + c2)`, so a later constant-folding
//! pass collapses the combined literal and DCE reclaims the inner `Add`.

use crate::errors::Result;
use crate::ir::{BinOp, IrType, NodeId, NodeOp, Package};
use crate::number::Bits;
use crate::passes::{Pass, PassOptions, PassResults};
use crate::value::Value;

pub struct ReassociationPass;

impl Pass for ReassociationPass {
    fn name(&self) -> &str {
        "reassociation"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let mut changed = false;
        for f in &mut package.functions {
            changed |= simplify_graph(&mut f.nodes);
        }
        for p in &mut package.procs {
            changed |= simplify_graph(&mut p.nodes);
        }
        Ok(changed)
    }
}

fn literal_bits(graph: &crate::ir::NodeGraph, id: NodeId) -> Option<Bits> {
    match graph.get(id).map(|n| &n.op) {
        Some(NodeOp::Literal(v)) => v.bits().cloned(),
        _ => None,
    }
}

fn simplify_graph(graph: &mut crate::ir::NodeGraph) -> bool {
    let ids = graph.live_ids();
    let mut changed = false;
    for id in ids {
        let (inner, outer_const, width) = match graph.get(id) {
            Some(n) => match (&n.op, &n.ty) {
                (NodeOp::Binary(BinOp::Add, a, b), IrType::Bits(w)) => {
                    if let Some(c) = literal_bits(graph, *b) {
                        (*a, c, *w)
                    } else if let Some(c) = literal_bits(graph, *a) {
                        (*b, c, *w)
                    } else {
                        continue;
                    }
                }
                _ => continue,
            },
            None => continue,
        };
        let (grandchild, inner_const) = match graph.get(inner).map(|n| n.op.clone()) {
            Some(NodeOp::Binary(BinOp::Add, a, b)) => {
                if let Some(c) = literal_bits(graph, b) {
                    (a, c)
                } else if let Some(c) = literal_bits(graph, a) {
                    (b, c)
                } else {
                    continue;
                }
            }
            _ => continue,
        };
        let combined = inner_const.add(&outer_const);
        let combined_node = graph.add(NodeOp::Literal(Value::UBits(combined)), IrType::Bits(width), None);
        graph.replace_op(id, NodeOp::Binary(BinOp::Add, grandchild, combined_node));
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Function, NodeGraph};
    use std::rc::Rc;

    #[test]
    fn combines_chained_additions_of_literals() {
        let mut nodes = NodeGraph::new();
        let x = nodes.add(NodeOp::Param(Rc::from("x")), IrType::Bits(32), None);
        let c1 = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let inner = nodes.add(NodeOp::Binary(BinOp::Add, x, c1), IrType::Bits(32), None);
        let c2 = nodes.add(NodeOp::Literal(Value::u32(2)), IrType::Bits(32), None);
        let ret = nodes.add(NodeOp::Binary(BinOp::Add, inner, c2), IrType::Bits(32), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: vec![(Rc::from("x"), x)], nodes, ret });

        let changed = ReassociationPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        match &pkg.functions[0].nodes.get(ret).unwrap().op {
            NodeOp::Binary(BinOp::Add, a, lit) => {
                assert_eq!(*a, x);
                match &pkg.functions[0].nodes.get(*lit).unwrap().op {
                    NodeOp::Literal(v) => assert_eq!(v.as_u64(), Some(3)),
                    _ => panic!("expected combined literal"),
                }
            }
            _ => panic!("expected Add"),
        }
    }
}
