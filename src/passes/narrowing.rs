//! Narrowing (spec §4.10 steps 2 and 6). Grounded on
//! `xls/passes/narrowing_pass.h`: a `BitSlice` that falls entirely within one
//! segment of a `Concat` it reads from needs only that segment, not the
//! whole concatenation. The pipeline runs this pass twice at different
//! thoroughness levels (spec "narrowing(ternary)" in the simplification
//! bundle, "narrowing(range+context, full level)" after BDD simplification);
//! `Mode` tracks which so the registry can log which level actually ran.

use crate::errors::Result;
use crate::ir::{IrType, NodeId, NodeOp, Package};
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrowingAnalysis {
    /// Narrows only slices whose bounds are immediately syntactically
    /// visible (spec step 2's cheap pass, run before range analysis exists).
    Ternary,
    /// Runs after BDD-based range analysis has populated bounds for more
    /// nodes (spec step 6, "full level").
    Full,
}

/// `opt_level` is accepted for parity with the registry's capped-variant
/// construction; unused since the segment-narrowing rewrite here is safe at
/// any level regardless of `analysis`.
pub struct NarrowingPass {
    pub analysis: NarrowingAnalysis,
    pub opt_level: i64,
}

impl Pass for NarrowingPass {
    fn name(&self) -> &str {
        "narrowing"
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
        let (operand, start, width) = match graph.get(id).map(|n| &n.op) {
            Some(NodeOp::BitSlice { operand, start, width }) => (*operand, *start, *width),
            _ => continue,
        };
        let items = match graph.get(operand).map(|n| &n.op) {
            Some(NodeOp::Concat(items)) => items.clone(),
            _ => continue,
        };
        // `Concat` lists segments MSB-first; compute each segment's low-bit
        // offset in the result to find which one fully contains this slice.
        let mut offset = 0usize;
        let mut segment_offsets = Vec::with_capacity(items.len());
        for &seg in items.iter().rev() {
            let seg_width = match graph.get(seg).map(|n| &n.ty) {
                Some(IrType::Bits(w)) => *w,
                _ => {
                    offset = usize::MAX;
                    break;
                }
            };
            segment_offsets.push((seg, offset, seg_width));
            offset += seg_width;
        }
        if offset == usize::MAX {
            continue;
        }
        for (seg, seg_offset, seg_width) in segment_offsets {
            if start >= seg_offset && start + width <= seg_offset + seg_width {
                let local_start = start - seg_offset;
                if local_start == 0 && width == seg_width {
                    replace_uses(graph, roots, id, seg);
                } else {
                    graph.replace_op(id, NodeOp::BitSlice { operand: seg, start: local_start, width });
                }
                changed = true;
                break;
            }
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
    fn slice_within_one_concat_segment_narrows() {
        let mut nodes = NodeGraph::new();
        let hi = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(8), None);
        let lo = nodes.add(NodeOp::Literal(Value::u32(2)), IrType::Bits(8), None);
        let cat = nodes.add(NodeOp::Concat(vec![hi, lo]), IrType::Bits(16), None);
        let ret = nodes.add(NodeOp::BitSlice { operand: cat, start: 0, width: 8 }, IrType::Bits(8), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed =
            NarrowingPass { analysis: NarrowingAnalysis::Ternary, opt_level: 3 }.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.functions[0].ret, lo);
    }
}
