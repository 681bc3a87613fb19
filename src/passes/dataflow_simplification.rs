//! Dataflow simplification (spec §4.10 step 9). Grounded on
//! `xls/passes/dataflow_simplification_pass.h`: `TupleIndex` of a freshly
//! built `Tuple` literal is that element directly, and a `Tuple` that just
//! re-reads every element of another tuple in order is that tuple directly.

use crate::errors::Result;
use crate::ir::{IrType, NodeId, NodeOp, Package};
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};

pub struct DataflowSimplificationPass;

impl Pass for DataflowSimplificationPass {
    fn name(&self) -> &str {
        "dataflow_simplification"
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
        match &node.op {
            NodeOp::TupleIndex { operand, index } => {
                let (operand, index) = (*operand, *index);
                if let Some(NodeOp::Tuple(items)) = graph.get(operand).map(|n| &n.op) {
                    if let Some(&element) = items.get(index) {
                        replace_uses(graph, roots, id, element);
                        changed = true;
                    }
                }
            }
            NodeOp::Tuple(items) => {
                let items = items.clone();
                if let Some(source) = reconstructs_same_tuple(graph, &items) {
                    replace_uses(graph, roots, id, source);
                    changed = true;
                }
            }
            _ => {}
        }
    }
    changed
}

fn reconstructs_same_tuple(graph: &crate::ir::NodeGraph, items: &[NodeId]) -> Option<NodeId> {
    let first_operand = match graph.get(*items.first()?).map(|n| &n.op) {
        Some(NodeOp::TupleIndex { operand, index: 0 }) => *operand,
        _ => return None,
    };
    let arity = match graph.get(first_operand).map(|n| &n.ty) {
        Some(IrType::Tuple(elems)) => elems.len(),
        _ => return None,
    };
    if arity != items.len() {
        return None;
    }
    for (i, &item) in items.iter().enumerate() {
        match graph.get(item).map(|n| &n.op) {
            Some(NodeOp::TupleIndex { operand, index }) if *operand == first_operand && *index == i => {}
            _ => return None,
        }
    }
    Some(first_operand)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Function, NodeGraph};
    use crate::value::Value;
    use std::rc::Rc;

    #[test]
    fn tuple_index_of_tuple_literal_picks_element() {
        let mut nodes = NodeGraph::new();
        let a = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let b = nodes.add(NodeOp::Literal(Value::u32(2)), IrType::Bits(32), None);
        let tup = nodes.add(NodeOp::Tuple(vec![a, b]), IrType::Tuple(vec![IrType::Bits(32), IrType::Bits(32)]), None);
        let ret = nodes.add(NodeOp::TupleIndex { operand: tup, index: 1 }, IrType::Bits(32), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = DataflowSimplificationPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.functions[0].ret, b);
    }

    #[test]
    fn tuple_rebuilding_same_elements_collapses() {
        let mut nodes = NodeGraph::new();
        let state = nodes.add(NodeOp::Param(Rc::from("state")), IrType::Tuple(vec![IrType::Bits(32), IrType::Bits(32)]), None);
        let e0 = nodes.add(NodeOp::TupleIndex { operand: state, index: 0 }, IrType::Bits(32), None);
        let e1 = nodes.add(NodeOp::TupleIndex { operand: state, index: 1 }, IrType::Bits(32), None);
        let ret = nodes.add(NodeOp::Tuple(vec![e0, e1]), IrType::Tuple(vec![IrType::Bits(32), IrType::Bits(32)]), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: vec![(Rc::from("state"), state)], nodes, ret });

        let changed = DataflowSimplificationPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.functions[0].ret, state);
    }
}
