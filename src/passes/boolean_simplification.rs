//! Boolean simplification (spec §4.10 step 2). Grounded on
//! `xls/passes/boolean_simplification_pass.h`: `a & a = a`, `a | a = a`,
//! `a ^ a = 0`.

use crate::errors::Result;
use crate::ir::{BinOp, IrType, NodeId, NodeOp, Package};
use crate::number::Bits;
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};
use crate::value::Value;

pub struct BooleanSimplificationPass;

impl Pass for BooleanSimplificationPass {
    fn name(&self) -> &str {
        "boolean_simplification"
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
        let node = match graph.get(id) {
            Some(n) => n,
            None => continue,
        };
        let (op, a, b, width) = match (&node.op, &node.ty) {
            (NodeOp::Binary(op, a, b), IrType::Bits(w)) => (*op, *a, *b, *w),
            _ => continue,
        };
        if a != b {
            continue;
        }
        match op {
            BinOp::And | BinOp::Or => {
                replace_uses(graph, roots, id, a);
                changed = true;
            }
            BinOp::Xor => {
                graph.replace_op(id, NodeOp::Literal(Value::UBits(Bits::zero(width, false))));
                changed = true;
            }
            _ => {}
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Function;
    use std::rc::Rc;

    #[test]
    fn and_self_is_identity() {
        let mut nodes = crate::ir::NodeGraph::new();
        let x = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let ret = nodes.add(NodeOp::Binary(BinOp::And, x, x), IrType::Bits(32), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = BooleanSimplificationPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.functions[0].ret, x);
    }
}
