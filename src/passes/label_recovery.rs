//! Label recovery (spec §4.10 step 11, final pipeline step). Grounded on
//! `xls/passes/label_recovery_pass.h`: after a long pipeline run most nodes
//! have lost (or never had) a human-readable `name`, and any two that do
//! share one is confusing; this pass assigns `{op}_{id}` to every unnamed
//! node and disambiguates duplicate names with a numeric suffix.

use std::collections::HashMap;
use std::rc::Rc;

use crate::errors::Result;
use crate::ir::{NodeOp, Package};
use crate::passes::{Pass, PassOptions, PassResults};

pub struct LabelRecoveryPass;

impl Pass for LabelRecoveryPass {
    fn name(&self) -> &str {
        "label_recovery"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let mut changed = false;
        for f in &mut package.functions {
            changed |= recover_graph(&mut f.nodes);
        }
        for p in &mut package.procs {
            changed |= recover_graph(&mut p.nodes);
        }
        Ok(changed)
    }
}

fn op_tag(op: &NodeOp) -> &'static str {
    match op {
        NodeOp::Literal(_) => "literal",
        NodeOp::Param(_) => "param",
        NodeOp::Unary(..) => "unary",
        NodeOp::Binary(..) => "binary",
        NodeOp::Select { .. } => "sel",
        NodeOp::Concat(_) => "concat",
        NodeOp::BitSlice { .. } => "slice",
        NodeOp::Tuple(_) => "tuple",
        NodeOp::TupleIndex { .. } => "tuple_index",
        NodeOp::Array(_) => "array",
        NodeOp::ArrayIndex { .. } => "array_index",
        NodeOp::Send { .. } => "send",
        NodeOp::Receive { .. } => "receive",
        NodeOp::NextValue { .. } => "next_value",
        NodeOp::Assert { .. } => "assert",
        NodeOp::Invoke { .. } => "invoke",
        NodeOp::AfterAll(_) => "after_all",
    }
}

fn recover_graph(graph: &mut crate::ir::NodeGraph) -> bool {
    let mut changed = false;
    let mut used: HashMap<String, u32> = HashMap::new();
    for id in graph.live_ids() {
        let node = match graph.get(id) {
            Some(n) => n,
            None => continue,
        };
        let base = match &node.name {
            Some(n) => n.to_string(),
            None => format!("{}_{}", op_tag(&node.op), id.0),
        };
        let count = used.entry(base.clone()).or_insert(0);
        let name = if *count == 0 { base.clone() } else { format!("{}_{}", base, count) };
        *count += 1;
        if node.name.as_deref() != Some(name.as_str()) {
            if let Some(n) = graph.get_mut(id) {
                n.name = Some(Rc::from(name));
            }
            changed = true;
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
    fn assigns_name_to_unnamed_node() {
        let mut nodes = NodeGraph::new();
        let ret = nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = LabelRecoveryPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        assert_eq!(pkg.functions[0].nodes.get(ret).unwrap().name.as_deref(), Some("literal_0"));
    }
}
