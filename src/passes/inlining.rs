//! Function inlining (spec §4.10 step 3). Grounded on
//! `xls/passes/inlining_pass.h`: every `Invoke` is replaced by a copy of the
//! callee's node graph, renumbered into the caller's graph and with the
//! callee's params bound to the call's actual arguments. Assumes no
//! recursive calls (the deducer rejects recursive function definitions
//! before IR emission, same as the original frontend).

use std::collections::HashMap;

use crate::errors::Result;
use crate::ir::{Function, NodeId, NodeOp, Package};
use crate::passes::support::replace_uses;
use crate::passes::{Pass, PassOptions, PassResults};

pub struct InliningPass;

impl Pass for InliningPass {
    fn name(&self) -> &str {
        "inlining"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let functions = package.functions.clone();
        let mut changed = false;
        for f in &mut package.functions {
            changed |= inline_graph(&mut f.nodes, &mut [&mut f.ret], &functions);
        }
        for p in &mut package.procs {
            changed |= inline_graph(&mut p.nodes, &mut [&mut p.next_state, &mut p.next_token], &functions);
        }
        Ok(changed)
    }
}

fn inline_graph(graph: &mut crate::ir::NodeGraph, roots: &mut [&mut NodeId], functions: &[Function]) -> bool {
    let mut changed = false;
    loop {
        let invoke = graph.iter().find_map(|n| match &n.op {
            NodeOp::Invoke { function, args } => Some((n.id, function.clone(), args.clone())),
            _ => None,
        });
        let Some((id, callee_name, args)) = invoke else { break };
        let Some(callee) = functions.iter().find(|f| f.name == callee_name) else { break };
        inline_one(graph, roots, id, &args, callee);
        changed = true;
    }
    changed
}

fn inline_one(graph: &mut crate::ir::NodeGraph, roots: &mut [&mut NodeId], invoke_id: NodeId, args: &[NodeId], callee: &Function) {
    let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();
    for (i, (_, param_id)) in callee.params.iter().enumerate() {
        if let Some(&arg) = args.get(i) {
            mapping.insert(*param_id, arg);
        }
    }
    for node in callee.nodes.iter() {
        if mapping.contains_key(&node.id) {
            continue;
        }
        let mut new_op = node.op.clone();
        for (&old, &new) in mapping.iter() {
            new_op.replace_operand(old, new);
        }
        let new_id = graph.add(new_op, node.ty.clone(), None);
        mapping.insert(node.id, new_id);
    }
    let new_ret = mapping[&callee.ret];
    replace_uses(graph, roots, invoke_id, new_ret);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinOp, IrType, NodeGraph};
    use crate::value::Value;
    use std::rc::Rc;

    #[test]
    fn inlines_simple_callee() {
        let mut callee_nodes = NodeGraph::new();
        let p0 = callee_nodes.add(NodeOp::Param(Rc::from("x")), IrType::Bits(32), None);
        let one = callee_nodes.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let callee_ret = callee_nodes.add(NodeOp::Binary(BinOp::Add, p0, one), IrType::Bits(32), None);
        let callee = Function { name: Rc::from("succ"), params: vec![(Rc::from("x"), p0)], nodes: callee_nodes, ret: callee_ret };

        let mut caller_nodes = NodeGraph::new();
        let arg = caller_nodes.add(NodeOp::Literal(Value::u32(5)), IrType::Bits(32), None);
        let ret = caller_nodes.add(NodeOp::Invoke { function: Rc::from("succ"), args: vec![arg] }, IrType::Bits(32), None);
        let caller = Function { name: Rc::from("main"), params: Vec::new(), nodes: caller_nodes, ret };

        let mut pkg = Package::new("p");
        pkg.functions.push(callee);
        pkg.functions.push(caller);
        pkg.top = Some(Rc::from("main"));

        let changed = InliningPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        let main = pkg.function("main").unwrap();
        match &main.nodes.get(main.ret).unwrap().op {
            NodeOp::Binary(BinOp::Add, a, _) => assert_eq!(*a, arg),
            other => panic!("expected inlined Add, got {:?}", other),
        }
    }
}
