//! Property test for spec §9 Open Question #3 (DESIGN.md decision: array-to-
//! bits casts are little-endian, element 0 occupies the low bits).
//!
//! The interpreter itself doesn't implement a runtime array-to-bits cast
//! (`bytecode::interp::cast_value` only models bits-to-bits), so this
//! exercises the convention directly at the `Bits::concat` level: folding a
//! sequence of equal-width chunks most-significant-first (so element 0 ends
//! up concatenated last, i.e. in the low bits) and slicing the result back
//! apart must recover each original element.

use dslc::number::Bits;
use num::BigUint;
use proptest::prelude::*;

fn little_endian_concat(elems: &[Bits], elem_width: usize) -> Bits {
    let mut iter = elems.iter().rev();
    let mut acc = iter.next().cloned().unwrap_or_else(|| Bits::from_unsigned(elem_width, BigUint::from(0u8)));
    for e in iter {
        acc = acc.concat(e);
    }
    acc
}

proptest! {
    #[test]
    fn little_endian_array_to_bits_round_trips(values in proptest::collection::vec(0u32..256, 1..8)) {
        let elem_width = 8usize;
        let elems: Vec<Bits> = values.iter().map(|&v| Bits::from_unsigned(elem_width, BigUint::from(v))).collect();
        let packed = little_endian_concat(&elems, elem_width);
        prop_assert_eq!(packed.width(), elem_width * elems.len());

        for (i, original) in elems.iter().enumerate() {
            let recovered = packed.slice(i * elem_width, elem_width);
            prop_assert_eq!(recovered.to_biguint(), original.to_biguint());
        }
    }
}
