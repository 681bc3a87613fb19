//! Strength reduction (spec §4.10 step 2). Grounded on
//! `xls/passes/strength_reduction_pass.h`: multiplication or division by a
//! power-of-two literal becomes a shift.

use crate::errors::Result;
use crate::ir::{BinOp, IrType, NodeId, NodeOp, Package};
use crate::passes::{Pass, PassOptions, PassResults};

/// Opt level accepted for parity with the registry's capped-variant
/// construction (spec §4.10 "capped variants"); unused here since the
/// power-of-two rewrite is safe at any level.
pub struct StrengthReductionPass {
    pub opt_level: i64,
}

impl Pass for StrengthReductionPass {
    fn name(&self) -> &str {
        "strength_reduction"
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

fn power_of_two_shift(graph: &crate::ir::NodeGraph, id: NodeId) -> Option<u32> {
    match graph.get(id).map(|n| &n.op) {
        Some(NodeOp::Literal(v)) => {
            let bits = v.bits()?;
            let value = bits.to_u64()?;
            if value != 0 && value & (value - 1) == 0 {
                Some(value.trailing_zeros())
            } else {
                None
            }
        }
        _ => None,
    }
}

fn simplify_graph(graph: &mut crate::ir::NodeGraph) -> bool {
    let ids = graph.live_ids();
    let mut changed = false;
    for id in ids {
        let node = match graph.get(id) {
            Some(n) => n,
            None => continue,
        };
        let (op, a, b, width) = match (&node.op, &node.ty) {
            (NodeOp::Binary(op, a, b), IrType::Bits(w)) => (*op, *a, *b, *w),
            _ => continue,
        };
        let shift_op = match op {
            BinOp::Umul => BinOp::Shll,
            BinOp::Udiv => BinOp::Shrl,
            _ => continue,
        };
        if let Some(shift) = power_of_two_shift(graph, b) {
            let shift_node = shift_literal(graph, shift, width);
            graph.replace_op(id, NodeOp::Binary(shift_op, a, shift_node));
            changed = true;
        }
    }
    changed
}

/// Builds the shift-amount literal as a node in the same graph so the
/// rewritten `Shll`/`Shrl` has a real operand instead of a synthesized id.
fn shift_literal(graph: &mut crate::ir::NodeGraph, shift: u32, width: usize) -> NodeId {
    use crate::number::Bits;
    use crate::value::Value;
    graph.add(NodeOp::Literal(Value::UBits(Bits::from_unsigned(width, shift.into()))), IrType::Bits(width), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Function, NodeGraph};
    use crate::value::Value;
    use std::rc::Rc;

    #[test]
    fn multiply_by_power_of_two_becomes_shift() {
        let mut nodes = NodeGraph::new();
        let x = nodes.add(NodeOp::Param(Rc::from("x")), IrType::Bits(32), None);
        let four = nodes.add(NodeOp::Literal(Value::u32(4)), IrType::Bits(32), None);
        let ret = nodes.add(NodeOp::Binary(BinOp::Umul, x, four), IrType::Bits(32), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: vec![(Rc::from("x"), x)], nodes, ret });

        let changed = StrengthReductionPass { opt_level: 3 }.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        match &pkg.functions[0].nodes.get(ret).unwrap().op {
            NodeOp::Binary(BinOp::Shll, a, shift) => {
                assert_eq!(*a, x);
                assert_eq!(shift.0, 2);
            }
            other => panic!("expected Shll, got {:?}", other),
        }
    }
}
