//! Proc-state flattening and optimization (spec §4.10 step 9). Grounded on
//! `xls/passes/proc_state_flattening_pass.h`/`proc_state_narrowing_pass.h`.
//!
//! `ProcStateFlatteningPass` dedupes repeated `TupleIndex` reads of the same
//! state element (a tuple-typed state param read through several
//! independently-emitted `TupleIndex` nodes collapses to one, same idea as
//! `cse` but specific to the state param so it can run before general CSE in
//! the pipeline's step 9). `ProcStateOptimizationPass` recognizes a
//! `next_state` that simply rebuilds the current state element-for-element
//! unchanged and replaces it with the state param directly.

use std::collections::HashMap;

use crate::errors::Result;
use crate::ir::{IrType, NodeId, NodeOp, Package};
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};

pub struct ProcStateFlatteningPass;

impl Pass for ProcStateFlatteningPass {
    fn name(&self) -> &str {
        "proc_state_flattening"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let mut changed = false;
        for p in &mut package.procs {
            let state_param = p.state_param;
            let mut roots = [&mut p.next_state, &mut p.next_token];
            changed |= dedupe_tuple_index(&mut p.nodes, &mut roots, state_param);
        }
        Ok(changed)
    }
}

fn dedupe_tuple_index(graph: &mut crate::ir::NodeGraph, roots: &mut [&mut NodeId], state_param: NodeId) -> bool {
    let mut seen: HashMap<usize, NodeId> = HashMap::new();
    let mut changed = false;
    for id in graph.live_ids() {
        let index = match graph.get(id).map(|n| &n.op) {
            Some(NodeOp::TupleIndex { operand, index }) if *operand == state_param => Some(*index),
            _ => None,
        };
        let Some(index) = index else { continue };
        match seen.get(&index) {
            Some(&canonical) if canonical != id => {
                replace_uses(graph, roots, id, canonical);
                changed = true;
            }
            _ => {
                seen.insert(index, id);
            }
        }
    }
    changed
}

pub struct ProcStateOptimizationPass;

impl Pass for ProcStateOptimizationPass {
    fn name(&self) -> &str {
        "proc_state_optimization"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let mut changed = false;
        for p in &mut package.procs {
            let is_identity = match (&p.nodes.get(p.next_state).map(|n| n.op.clone()), &p.nodes.get(p.state_param).map(|n| &n.ty)) {
                (Some(NodeOp::Tuple(items)), Some(IrType::Tuple(elem_tys))) if items.len() == elem_tys.len() => {
                    items.iter().enumerate().all(|(i, &item)| {
                        matches!(p.nodes.get(item).map(|n| &n.op), Some(NodeOp::TupleIndex { operand, index }) if *operand == p.state_param && *index == i)
                    })
                }
                _ => false,
            };
            if is_identity {
                p.next_state = p.state_param;
                changed = true;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{NodeGraph, Proc};
    use crate::value::Value;
    use std::rc::Rc;

    #[test]
    fn unchanged_tuple_state_collapses_to_state_param() {
        let mut nodes = NodeGraph::new();
        let state = nodes.add(NodeOp::Param(Rc::from("state")), IrType::Tuple(vec![IrType::Bits(32), IrType::Bits(32)]), None);
        let e0 = nodes.add(NodeOp::TupleIndex { operand: state, index: 0 }, IrType::Bits(32), None);
        let e1 = nodes.add(NodeOp::TupleIndex { operand: state, index: 1 }, IrType::Bits(32), None);
        let next_state = nodes.add(NodeOp::Tuple(vec![e0, e1]), IrType::Tuple(vec![IrType::Bits(32), IrType::Bits(32)]), None);
        let token = nodes.add(NodeOp::AfterAll(Vec::new()), crate::ir::IrType::Token, None);
        let mut pkg = Package::new("p");
        pkg.procs.push(Proc { name: Rc::from("p"), state_param: state, token_param: token, nodes, next_state, next_token: token });
        let _ = Value::u32(0);

        let changed = ProcStateOptimizationPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.procs[0].next_state, state);
    }
}
