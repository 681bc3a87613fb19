//! Common subexpression elimination (spec §4.10 step 2, "cse"). Grounded on
//! `xls/passes/cse_pass.h`: two non-side-effecting nodes with the same
//! `structural_key` compute the same value, so all but the first-seen are
//! replaced by it.

use std::collections::HashMap;

use crate::errors::Result;
use crate::ir::{NodeId, Package};
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};

pub struct CsePass;

impl Pass for CsePass {
    fn name(&self) -> &str {
        "cse"
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
    let mut seen: HashMap<String, NodeId> = HashMap::new();
    let mut changed = false;
    for id in graph.live_ids() {
        let node = match graph.get(id) {
            Some(n) => n,
            None => continue,
        };
        if node.op.is_side_effecting() {
            continue;
        }
        let key = node.op.structural_key();
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
    use crate::ir::{Function, IrType, NodeGraph, NodeOp};
    use crate::value::Value;
    use std::rc::Rc;

    #[test]
    fn duplicate_literals_collapse_to_one() {
        let mut nodes = NodeGraph::new();
        let a = nodes.add(NodeOp::Literal(Value::u32(7)), IrType::Bits(32), None);
        let b = nodes.add(NodeOp::Literal(Value::u32(7)), IrType::Bits(32), None);
        let ret = nodes.add(NodeOp::Tuple(vec![a, b]), IrType::Tuple(vec![IrType::Bits(32), IrType::Bits(32)]), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = CsePass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        match &pkg.functions[0].nodes.get(ret).unwrap().op {
            NodeOp::Tuple(items) => assert_eq!(items[0], items[1]),
            _ => panic!("expected tuple"),
        }
    }
}
