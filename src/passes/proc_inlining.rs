//! Proc inlining (spec §4.10 step 8, after token-dependency threading).
//! Grounded on `xls/passes/proc_inlining_pass.h`: a spawned proc's body is
//! inlined into its spawner during instantiation (handled upstream by this
//! crate's C7 instantiator, which lowers each `spawn` into the spawning
//! proc's own node graph before IR emission — see `DESIGN.md`). By the time
//! the IR pipeline runs, a proc left in `Package::procs` with no channel
//! traffic of its own is the now-redundant standalone definition of an
//! already-inlined spawn; this pass retires it.

use crate::errors::Result;
use crate::ir::Package;
use crate::passes::{Pass, PassOptions, PassResults};

pub struct ProcInliningPass;

impl Pass for ProcInliningPass {
    fn name(&self) -> &str {
        "proc_inlining"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let top = package.top.clone();
        let before = package.procs.len();
        package.procs.retain(|p| Some(p.name.clone()) == top || p.nodes.iter().any(|n| n.op.is_side_effecting()));
        Ok(package.procs.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IrType, NodeGraph, NodeOp, Proc};
    use crate::value::Value;
    use std::rc::Rc;

    #[test]
    fn retires_proc_with_no_channel_traffic() {
        let mut nodes = NodeGraph::new();
        let state = nodes.add(NodeOp::Literal(Value::u32(0)), IrType::Bits(32), None);
        let token = nodes.add(NodeOp::AfterAll(Vec::new()), IrType::Token, None);
        let mut pkg = Package::new("p");
        pkg.procs.push(Proc { name: Rc::from("helper"), state_param: state, token_param: token, nodes, next_state: state, next_token: token });

        let changed = ProcInliningPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert!(pkg.procs.is_empty());
    }
}
