//! Identity removal (spec §4.10 step 2 & step 9). Grounded on
//! `xls/passes/identity_removal_pass.h`: replaces every explicit identity
//! node with its operand; DCE then sweeps the now-unused wrapper away.

use crate::errors::Result;
use crate::ir::{NodeOp, Package, UnOp};
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};

pub struct IdentityRemovalPass;

impl Pass for IdentityRemovalPass {
    fn name(&self) -> &str {
        "identity_removal"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let mut changed = false;
        for f in &mut package.functions {
            let identities: Vec<_> = f.nodes.iter().filter_map(|n| match &n.op {
                NodeOp::Unary(UnOp::Identity, a) => Some((n.id, *a)),
                _ => None,
            }).collect();
            for (id, operand) in identities {
                replace_uses(&mut f.nodes, &mut [&mut f.ret], id, operand);
                changed = true;
            }
        }
        for p in &mut package.procs {
            let identities: Vec<_> = p.nodes.iter().filter_map(|n| match &n.op {
                NodeOp::Unary(UnOp::Identity, a) => Some((n.id, *a)),
                _ => None,
            }).collect();
            for (id, operand) in identities {
                replace_uses(&mut p.nodes, &mut [&mut p.next_state, &mut p.next_token], id, operand);
                changed = true;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Function, IrType, NodeGraph};
    use crate::value::Value;
    use std::rc::Rc;

    #[test]
    fn replaces_identity_with_operand() {
        let mut nodes = NodeGraph::new();
        let lit = nodes.add(NodeOp::Literal(Value::u32(5)), IrType::Bits(32), None);
        let ret = nodes.add(NodeOp::Unary(UnOp::Identity, lit), IrType::Bits(32), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = IdentityRemovalPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.functions[0].ret, lit);
    }
}
