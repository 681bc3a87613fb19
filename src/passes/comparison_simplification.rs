//! Comparison simplification (spec §4.10 step 2). Grounded on
//! `xls/passes/comparison_simplification_pass.h`: `x == x` and `x <= x` fold
//! to a literal `true`; `x != x` and `x < x` fold to a literal `false`.

use crate::errors::Result;
use crate::ir::{BinOp, IrType, NodeId, NodeOp, Package};
use crate::number::Bits;
use crate::passes::{Pass, PassOptions, PassResults};
use crate::value::Value;

pub struct ComparisonSimplificationPass;

impl Pass for ComparisonSimplificationPass {
    fn name(&self) -> &str {
        "comparison_simplification"
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

fn simplify_graph(graph: &mut crate::ir::NodeGraph) -> bool {
    let ids = graph.live_ids();
    let mut changed = false;
    for id in ids {
        let node = match graph.get(id) {
            Some(n) => n,
            None => continue,
        };
        let (op, a, b) = match (&node.op, &node.ty) {
            (NodeOp::Binary(op, a, b), IrType::Bits(1)) => (*op, *a, *b),
            _ => continue,
        };
        if a != b {
            continue;
        }
        let folded = match op {
            BinOp::Eq | BinOp::Ule => Some(true),
            BinOp::Ne | BinOp::Ult => Some(false),
            _ => None,
        };
        if let Some(v) = folded {
            graph.replace_op(id, NodeOp::Literal(Value::UBits(Bits::from_unsigned(1, (v as u8).into()))));
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Function, NodeGraph};
    use std::rc::Rc;

    #[test]
    fn equal_operands_fold_to_true() {
        let mut nodes = NodeGraph::new();
        let x = nodes.add(NodeOp::Literal(Value::u32(7)), IrType::Bits(32), None);
        let ret = nodes.add(NodeOp::Binary(BinOp::Eq, x, x), IrType::Bits(1), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = ComparisonSimplificationPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        match &pkg.functions[0].nodes.get(ret).unwrap().op {
            NodeOp::Literal(v) => assert_eq!(v.as_u64(), Some(1)),
            _ => panic!("expected literal"),
        }
    }
}
