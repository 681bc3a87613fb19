//! Reproduces spec §8 seed scenario 4:
//! `let a = u32:0xdeadbeef; a[-16:]` yields resolved `(start=16, width=16)`
//! and slice result type `u16`.

use dslc::ast::{Arena, Module, ModuleMember, NodeKind};
use dslc::deduce::Deducer;
use dslc::number::Bits;
use dslc::source::Span;
use dslc::types::{ParametricEnv, Type};
use dslc::warnings::WarningCollector;
use num::{BigInt, BigUint};

#[test]
fn negative_start_bound_resolves_via_wraparound() {
    let mut arena = Arena::new();
    let span = Span::dummy();

    let base = arena.alloc(NodeKind::ResolvedLiteral(Bits::from_unsigned(32, BigUint::from(0xdeadbeefu32))), span);
    let start = arena.alloc(NodeKind::ResolvedLiteral(Bits::from_signed(16, BigInt::from(-16))), span);
    let slice = arena.alloc(NodeKind::Slice { base, start: Some(start), limit: None }, span);
    arena.compute_parents();

    let module = Module::new("m", arena, Vec::<ModuleMember>::new());
    let mut type_info = dslc::typeinfo::TypeInfo::new();
    let mut warnings = WarningCollector::new();
    let env = ParametricEnv::new();
    let mut deducer = Deducer::new(&module, &mut type_info, env.clone(), &mut warnings);

    let ty = deducer.deduce(slice).unwrap();
    assert_eq!(ty, Type::u(16));

    let bounds = type_info.get_slice_bounds(slice, &env).unwrap();
    assert_eq!(bounds.start, 16);
    assert_eq!(bounds.width, 16);
}
