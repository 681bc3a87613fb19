//! Reproduces spec §8 seed scenario 3: destructuring
//! `let (a,b,(c,d)) = (u4:0, u8:1, (u16:2, (u32:3,u64:4,uN[128]:5)))`.
//! Slot assignments `a=0,b=1,c=2,d=3`; `CreateTuple` arities observed in
//! order `3, 2, 3` (innermost tuple's constructor runs first since emission
//! is depth-first); one `ExpandTuple` per interior pattern node.

use std::rc::Rc;

use dslc::ast::{Arena, Module, ModuleMember, NameDefTreeKind, NodeKind, Stmt};
use dslc::bytecode::{Emitter, Op};
use dslc::number::Bits;
use dslc::source::Span;
use dslc::typeinfo::TypeInfo;
use dslc::types::ParametricEnv;
use num::BigUint;

#[test]
fn destructuring_let_slots_and_tuple_arities() {
    let mut arena = Arena::new();
    let span = Span::dummy();

    let u4_0 = arena.alloc(NodeKind::ResolvedLiteral(Bits::from_unsigned(4, BigUint::from(0u8))), span);
    let u8_1 = arena.alloc(NodeKind::ResolvedLiteral(Bits::from_unsigned(8, BigUint::from(1u8))), span);
    let u16_2 = arena.alloc(NodeKind::ResolvedLiteral(Bits::from_unsigned(16, BigUint::from(2u8))), span);
    let u32_3 = arena.alloc(NodeKind::ResolvedLiteral(Bits::from_unsigned(32, BigUint::from(3u8))), span);
    let u64_4 = arena.alloc(NodeKind::ResolvedLiteral(Bits::from_unsigned(64, BigUint::from(4u8))), span);
    let u128_5 = arena.alloc(NodeKind::ResolvedLiteral(Bits::from_unsigned(128, BigUint::from(5u8))), span);

    let innermost = arena.alloc(NodeKind::TupleCtor(vec![u32_3, u64_4, u128_5]), span);
    let inner = arena.alloc(NodeKind::TupleCtor(vec![u16_2, innermost]), span);
    let rhs = arena.alloc(NodeKind::TupleCtor(vec![u4_0, u8_1, inner]), span);

    let a = arena.alloc(NodeKind::NameDefTree(NameDefTreeKind::Leaf(Rc::from("a"))), span);
    let b = arena.alloc(NodeKind::NameDefTree(NameDefTreeKind::Leaf(Rc::from("b"))), span);
    let c = arena.alloc(NodeKind::NameDefTree(NameDefTreeKind::Leaf(Rc::from("c"))), span);
    let d = arena.alloc(NodeKind::NameDefTree(NameDefTreeKind::Leaf(Rc::from("d"))), span);
    let inner_pattern = arena.alloc(NodeKind::NameDefTree(NameDefTreeKind::Tuple(vec![c, d])), span);
    let pattern = arena.alloc(NodeKind::NameDefTree(NameDefTreeKind::Tuple(vec![a, b, inner_pattern])), span);

    let unit = arena.alloc(NodeKind::Block(Vec::new(), None), span);
    let body = arena.alloc(
        NodeKind::Block(vec![Stmt::Let { pattern, annotation: None, rhs }], Some(unit)),
        span,
    );
    arena.compute_parents();

    let module = Module::new("m", arena, Vec::<ModuleMember>::new());
    let type_info = TypeInfo::new();
    let env = ParametricEnv::new();
    let emitter = Emitter::new(&module, &type_info, &env);
    let bc = emitter.emit_function(&[], body).unwrap();

    let create_tuple_arities: Vec<u32> = bc
        .ops
        .iter()
        .filter_map(|op| match &op.op {
            Op::CreateTuple(n) => Some(*n),
            _ => None,
        })
        .collect();
    assert_eq!(create_tuple_arities, vec![3, 2, 3]);

    let expand_tuple_count = bc.ops.iter().filter(|op| op.op == Op::ExpandTuple).count();
    assert_eq!(expand_tuple_count, 2);

    let store_slots: Vec<u32> = bc
        .ops
        .iter()
        .filter_map(|op| match &op.op {
            Op::Store(slot) => Some(*slot),
            _ => None,
        })
        .collect();
    assert_eq!(store_slots, vec![0, 1, 2, 3]);
}
