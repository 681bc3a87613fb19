//! Constant folding (spec §4.10 step 2). Grounded on
//! `xls/passes/constant_folding_pass.h`: any op whose every operand is
//! already a literal is replaced by a literal holding the computed result,
//! using the same `Bits` arithmetic the constexpr evaluator/interpreter use
//! (spec §4.4/§4.8) so IR-level folding agrees bit-for-bit with those.

use std::cmp::Ordering;

use crate::errors::Result;
use crate::ir::{BinOp, NodeOp, Package, UnOp};
use crate::number::Bits;
use crate::passes::{Pass, PassOptions, PassResults};
use crate::value::Value;

pub struct ConstantFoldingPass;

impl Pass for ConstantFoldingPass {
    fn name(&self) -> &str {
        "constant_folding"
    }

    fn run(&self, package: &mut Package, _options: &PassOptions, _results: &mut PassResults) -> Result<bool> {
        let mut changed = false;
        for f in &mut package.functions {
            changed |= fold_graph(&mut f.nodes);
        }
        for p in &mut package.procs {
            changed |= fold_graph(&mut p.nodes);
        }
        Ok(changed)
    }
}

fn fold_graph(graph: &mut crate::ir::NodeGraph) -> bool {
    let ids = graph.live_ids();
    let mut changed = false;
    for id in ids {
        let folded = {
            let node = match graph.get(id) {
                Some(n) => n,
                None => continue,
            };
            fold_one(graph, &node.op)
        };
        if let Some(v) = folded {
            graph.replace_op(id, NodeOp::Literal(v));
            changed = true;
        }
    }
    changed
}

fn literal_bits(graph: &crate::ir::NodeGraph, id: crate::ir::NodeId) -> Option<Bits> {
    match &graph.get(id)?.op {
        NodeOp::Literal(v) => v.bits().cloned(),
        _ => None,
    }
}

fn fold_one(graph: &crate::ir::NodeGraph, op: &NodeOp) -> Option<Value> {
    match op {
        NodeOp::Unary(unop, a) => {
            let a = literal_bits(graph, *a)?;
            Some(match unop {
                UnOp::Not => Value::UBits(a.invert()),
                UnOp::Neg => Value::UBits(a.negate()),
                UnOp::Identity => Value::UBits(a),
            })
        }
        NodeOp::Binary(binop, a, b) => {
            let a = literal_bits(graph, *a)?;
            let b = literal_bits(graph, *b)?;
            Some(fold_binary(*binop, &a, &b))
        }
        _ => None,
    }
}

fn fold_binary(op: BinOp, a: &Bits, b: &Bits) -> Value {
    match op {
        BinOp::Add => Value::UBits(a.add(b)),
        BinOp::Sub => Value::UBits(a.sub(b)),
        BinOp::Umul | BinOp::Smul => Value::UBits(a.mul(b)),
        BinOp::Udiv => Value::UBits(a.div(b)),
        BinOp::And => Value::UBits(a.bitand(b)),
        BinOp::Or => Value::UBits(a.bitor(b)),
        BinOp::Xor => Value::UBits(a.bitxor(b)),
        BinOp::Shll => Value::UBits(a.shll(b.to_u64().unwrap_or(0) as u32)),
        BinOp::Shrl => Value::UBits(a.shrl(b.to_u64().unwrap_or(0) as u32)),
        BinOp::Shra => Value::UBits(a.shra(b.to_u64().unwrap_or(0) as u32)),
        BinOp::Eq => Value::bool_value(a.cmp_value(b) == Ordering::Equal),
        BinOp::Ne => Value::bool_value(a.cmp_value(b) != Ordering::Equal),
        BinOp::Ult => Value::bool_value(a.cmp_value(b) == Ordering::Less),
        BinOp::Ule => Value::bool_value(a.cmp_value(b) != Ordering::Greater),
        BinOp::Ugt => Value::bool_value(a.cmp_value(b) == Ordering::Greater),
        BinOp::Uge => Value::bool_value(a.cmp_value(b) != Ordering::Less),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Function, IrType, NodeGraph};
    use num::BigUint;
    use std::rc::Rc;

    #[test]
    fn folds_constant_add() {
        let mut nodes = NodeGraph::new();
        let a = nodes.add(NodeOp::Literal(Value::UBits(Bits::from_unsigned(32, BigUint::from(2u8)))), IrType::Bits(32), None);
        let b = nodes.add(NodeOp::Literal(Value::UBits(Bits::from_unsigned(32, BigUint::from(3u8)))), IrType::Bits(32), None);
        let ret = nodes.add(NodeOp::Binary(BinOp::Add, a, b), IrType::Bits(32), None);
        let mut pkg = Package::new("p");
        pkg.functions.push(Function { name: Rc::from("f"), params: Vec::new(), nodes, ret });

        let changed = ConstantFoldingPass.run(&mut pkg, &PassOptions::default(), &mut PassResults::new()).unwrap();
        assert!(changed);
        match &pkg.functions[0].nodes.get(ret).unwrap().op {
            NodeOp::Literal(Value::UBits(bits)) => assert_eq!(bits.to_u64(), Some(5)),
            other => panic!("expected folded literal, got {:?}", other),
        }
    }
}
