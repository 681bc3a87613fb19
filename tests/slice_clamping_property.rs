//! Quantified invariant from spec §8: for all slices `a[s:l]` on a `uK` LHS
//! with constant `s,l`, the resolved `(start,width)` equals the §4.5
//! wraparound-then-clamp rule: `norm(v) = if v<0 {v+total} else {v}`,
//! `clamp(v) = v.clamp(0,total)`, `limit_c = clamp(norm(l))`,
//! `start_c = clamp(norm(s)).min(limit_c)`, `width = limit_c - start_c`.

use dslc::ast::{Arena, Module, ModuleMember, NodeKind};
use dslc::deduce::Deducer;
use dslc::number::Bits;
use dslc::source::Span;
use dslc::types::{ParametricEnv, Type};
use dslc::warnings::WarningCollector;
use num::{BigInt, BigUint};
use proptest::prelude::*;

fn expected_bounds(raw_start: i64, raw_limit: i64, total: i64) -> (i64, i64) {
    let norm = |v: i64| -> i64 { if v < 0 { v + total } else { v } };
    let clamp = |v: i64| -> i64 { v.clamp(0, total) };
    let limit_c = clamp(norm(raw_limit));
    let start_c = clamp(norm(raw_start)).min(limit_c);
    (start_c, limit_c - start_c)
}

proptest! {
    #[test]
    fn slice_bounds_match_the_wraparound_clamp_rule(
        total in 1i64..=64,
        raw_start in -128i64..128,
        raw_limit in -128i64..128,
    ) {
        let mut arena = Arena::new();
        let span = Span::dummy();

        let base = arena.alloc(
            NodeKind::ResolvedLiteral(Bits::from_unsigned(total as usize, BigUint::from(0u8))),
            span,
        );
        let start = arena.alloc(
            NodeKind::ResolvedLiteral(Bits::from_signed(32, BigInt::from(raw_start))),
            span,
        );
        let limit = arena.alloc(
            NodeKind::ResolvedLiteral(Bits::from_signed(32, BigInt::from(raw_limit))),
            span,
        );
        let slice = arena.alloc(NodeKind::Slice { base, start: Some(start), limit: Some(limit) }, span);
        arena.compute_parents();

        let module = Module::new("m", arena, Vec::<ModuleMember>::new());
        let mut type_info = dslc::typeinfo::TypeInfo::new();
        let mut warnings = WarningCollector::new();
        let env = ParametricEnv::new();
        let mut deducer = Deducer::new(&module, &mut type_info, env.clone(), &mut warnings);

        let ty = deducer.deduce(slice).unwrap();
        let (expected_start, expected_width) = expected_bounds(raw_start, raw_limit, total);

        prop_assert_eq!(ty, Type::u(expected_width as u32));

        let bounds = type_info.get_slice_bounds(slice, &env).unwrap();
        prop_assert_eq!(bounds.start as i64, expected_start);
        prop_assert_eq!(bounds.width as i64, expected_width);
    }
}
