//! Next-value optimization (spec §4.10 step 9, run to a ≤3-iteration fixed
//! point). Grounded on `xls/passes/next_value_optimization_pass.h`: a
//! `NextValue` guarded by a literal-`true` predicate is unconditional; one
//! guarded by a literal-`false` predicate never fires and is dropped
//! (DCE then reclaims it, since a `NextValue` with a provably-false
//! predicate has no observable effect).

use crate::errors::Result;
use crate::ir::{NodeOp, Package};
use crate::passes::{Pass, PassOptions, PassResults};

pub struct NextValueOptimizationPass;

impl Pass for NextValueOptimizationPass {
    fn name(&self) -> &str {
        "next_value_optimization"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let mut changed = false;
        for p in &mut package.procs {
            for id in p.nodes.live_ids() {
                let (state, value, predicate) = match p.nodes.get(id).map(|n| n.op.clone()) {
                    Some(NodeOp::NextValue { state, value, predicate: Some(pred) }) => (state, value, pred),
                    _ => continue,
                };
                let literal = match p.nodes.get(predicate).map(|n| &n.op) {
                    Some(NodeOp::Literal(v)) => v.as_bool(),
                    _ => None,
                };
                match literal {
                    Some(true) => {
                        p.nodes.replace_op(id, NodeOp::NextValue { state, value, predicate: None });
                        changed = true;
                    }
                    Some(false) => {
                        p.nodes.remove(id);
                        changed = true;
                    }
                    None => {}
                }
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IrType, NodeGraph, Proc};
    use crate::value::Value;
    use std::rc::Rc;

    #[test]
    fn literal_true_predicate_becomes_unconditional() {
        let mut nodes = NodeGraph::new();
        let state = nodes.add(NodeOp::Literal(Value::u32(0)), IrType::Bits(32), None);
        let value = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let pred = nodes.add(NodeOp::Literal(Value::bool_value(true)), IrType::Bits(1), None);
        let token = nodes.add(NodeOp::AfterAll(Vec::new()), IrType::Token, None);
        let next = nodes.add(NodeOp::NextValue { state, value, predicate: Some(pred) }, IrType::Token, None);
        let mut pkg = Package::new("p");
        pkg.procs.push(Proc { name: Rc::from("p"), state_param: state, token_param: token, nodes, next_state: next, next_token: token });

        let changed = NextValueOptimizationPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        match &pkg.procs[0].nodes.get(next).unwrap().op {
            NodeOp::NextValue { predicate: None, .. } => {}
            other => panic!("expected unconditional NextValue, got {:?}", other),
        }
    }
}
