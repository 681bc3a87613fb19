//! Bit-slice simplification (spec §4.10 step 2). Grounded on
//! `xls/passes/bit_slice_simplification_pass.h`: a slice spanning an
//! operand's entire width is an identity; a slice of a slice composes into
//! one slice.

use crate::errors::Result;
use crate::ir::{IrType, NodeId, NodeOp, Package};
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};

pub struct BitSliceSimplificationPass {
    pub opt_level: i64,
}

impl Pass for BitSliceSimplificationPass {
    fn name(&self) -> &str {
        "bit_slice_simplification"
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
        let (operand, start, width) = match &node.op {
            NodeOp::BitSlice { operand, start, width } => (*operand, *start, *width),
            _ => continue,
        };
        let operand_width = match graph.get(operand).map(|n| &n.ty) {
            Some(IrType::Bits(w)) => *w,
            _ => continue,
        };
        if start == 0 && width == operand_width {
            replace_uses(graph, roots, id, operand);
            changed = true;
            continue;
        }
        if let Some(NodeOp::BitSlice { operand: inner, start: inner_start, .. }) = graph.get(operand).map(|n| n.op.clone()) {
            graph.replace_op(id, NodeOp::BitSlice { operand: inner, start: inner_start + start, width });
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Function, NodeGraph};
    use crate::value::Value;
    use std::rc::Rc;

    #[test]
    fn full_width_slice_is_identity() {
        let mut nodes = NodeGraph::new();
        let x = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let ret = nodes.add(NodeOp::BitSlice { operand: x, start: 0, width: 32 }, IrType::Bits(32), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = BitSliceSimplificationPass { opt_level: 3 }.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.functions[0].ret, x);
    }
}
