//! Dead-code elimination (spec §4.10 step 1, and interleaved after every
//! simplification pass). Grounded on `xls/passes/dce_pass.h`'s "remove nodes
//! with no users and no side effects" contract.

use crate::errors::Result;
use crate::ir::Package;
use crate::passes::support::sweep_dead;
use crate::passes::{Pass, PassOptions, PassResults};

pub struct DeadCodeEliminationPass;

impl Pass for DeadCodeEliminationPass {
    fn name(&self) -> &str {
        "dce"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let mut changed = false;
        for f in &mut package.functions {
            changed |= sweep_dead(&mut f.nodes, &[f.ret]);
        }
        for p in &mut package.procs {
            changed |= sweep_dead(&mut p.nodes, &[p.next_state, p.next_token]);
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Function, IrType, NodeGraph, NodeOp, UnOp};
    use crate::value::Value;
    use std::rc::Rc;

    #[test]
    fn removes_unreferenced_node() {
        let mut nodes = NodeGraph::new();
        let dead = nodes.add(NodeOp::Literal(Value::u32(9)), IrType::Bits(32), None);
        let live = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let ret = nodes.add(NodeOp::Unary(UnOp::Identity, live), IrType::Bits(32), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = DeadCodeEliminationPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert!(pkg.functions[0].nodes.get(dead).is_none());
        assert!(pkg.functions[0].nodes.get(live).is_some());
    }
}
