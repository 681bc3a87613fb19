//! Arbitrary-width, exact two's-complement integer values (spec C1).
//!
//! Grounded on the teacher's `LogicVec` (`examples/lowRISC-sv-elaborator/src/number/mod.rs`):
//! same `BigUint`-backed width tracking and `sign_extend_or_trunc` idiom, with
//! the 4-state (X/Z) half dropped since the DSL's value universe is 2-state
//! only (spec §3 `Value::UBits`/`SBits`).

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, BitAnd, BitOr, BitXor, Mul, Not, Shl, Shr, Sub};

use num::bigint::Sign;
use num::{BigInt, BigUint, One, Zero};

/// A fixed-width bit pattern. `signed` only affects how the pattern is
/// interpreted by arithmetic/comparison/cast, never how many bits it
/// occupies: width is exact and preserved by every operation here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bits {
    width: usize,
    signed: bool,
    magnitude: BigUint,
}

fn mask(width: usize) -> BigUint {
    if width == 0 {
        BigUint::zero()
    } else {
        (BigUint::one() << width) - 1u8
    }
}

impl Bits {
    pub fn from_unsigned(width: usize, value: BigUint) -> Bits {
        Bits { width, signed: false, magnitude: value & mask(width) }
    }

    /// Build from a (possibly negative) `BigInt`, taking its two's-complement
    /// representation within `width` bits. Mirrors the teacher's
    /// `LogicVec::from`.
    pub fn from_signed(width: usize, value: BigInt) -> Bits {
        let magnitude = if let Sign::Minus = value.sign() {
            let abs = (-value).to_biguint().expect("negation of negative is non-negative");
            let m = mask(width);
            ((abs ^ &m) + 1u8) & m
        } else {
            value.to_biguint().expect("non-negative BigInt has a BigUint representation")
        };
        Bits { width, signed: true, magnitude: magnitude & mask(width) }
    }

    pub fn zero(width: usize, signed: bool) -> Bits {
        Bits { width, signed, magnitude: BigUint::zero() }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn with_signed(mut self, signed: bool) -> Bits {
        self.signed = signed;
        self
    }

    fn sign_bit_set(&self) -> bool {
        self.width > 0 && self.magnitude.bit((self.width - 1) as u64)
    }

    /// Raw (always non-negative) bit pattern.
    pub fn to_biguint(&self) -> BigUint {
        self.magnitude.clone()
    }

    /// Value as a mathematical integer, honoring `signed`.
    pub fn to_bigint(&self) -> BigInt {
        if self.signed && self.sign_bit_set() {
            let m = mask(self.width);
            let inverted = ((&self.magnitude ^ &m) + 1u8) & m;
            -BigInt::from(inverted)
        } else {
            BigInt::from(self.magnitude.clone())
        }
    }

    pub fn sign_extend_or_trunc(&self, width: usize) -> Bits {
        if width >= self.width {
            let extended = if self.signed && self.sign_bit_set() {
                let extra = mask(width) ^ mask(self.width);
                &self.magnitude | &extra
            } else {
                self.magnitude.clone()
            };
            Bits { width, signed: self.signed, magnitude: extended & mask(width) }
        } else {
            Bits { width, signed: self.signed, magnitude: &self.magnitude & mask(width) }
        }
    }

    pub fn zero_extend_or_trunc(&self, width: usize) -> Bits {
        Bits { width, signed: self.signed, magnitude: &self.magnitude & mask(width) }
    }

    pub fn extend_or_trunc(&self, width: usize) -> Bits {
        if self.signed {
            self.sign_extend_or_trunc(width)
        } else {
            self.zero_extend_or_trunc(width)
        }
    }

    fn binop(&self, rhs: &Bits, f: impl Fn(&BigInt, &BigInt) -> BigInt) -> Bits {
        assert_eq!(self.width, rhs.width, "width mismatch in Bits arithmetic");
        let result = f(&self.to_bigint(), &rhs.to_bigint());
        Bits::from_signed(self.width, result).with_signed(self.signed)
    }

    pub fn add(&self, rhs: &Bits) -> Bits {
        self.binop(rhs, |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Bits) -> Bits {
        self.binop(rhs, |a, b| a - b)
    }

    pub fn mul(&self, rhs: &Bits) -> Bits {
        self.binop(rhs, |a, b| a * b)
    }

    pub fn div(&self, rhs: &Bits) -> Bits {
        self.binop(rhs, |a, b| a / b)
    }

    pub fn bitand(&self, rhs: &Bits) -> Bits {
        assert_eq!(self.width, rhs.width);
        Bits { width: self.width, signed: self.signed, magnitude: &self.magnitude & &rhs.magnitude }
    }

    pub fn bitor(&self, rhs: &Bits) -> Bits {
        assert_eq!(self.width, rhs.width);
        Bits { width: self.width, signed: self.signed, magnitude: &self.magnitude | &rhs.magnitude }
    }

    pub fn bitxor(&self, rhs: &Bits) -> Bits {
        assert_eq!(self.width, rhs.width);
        Bits { width: self.width, signed: self.signed, magnitude: &self.magnitude ^ &rhs.magnitude }
    }

    pub fn invert(&self) -> Bits {
        Bits { width: self.width, signed: self.signed, magnitude: &self.magnitude ^ &mask(self.width) }
    }

    pub fn negate(&self) -> Bits {
        Bits::from_signed(self.width, -self.to_bigint()).with_signed(self.signed)
    }

    /// Logical shift left by `amount` bits, truncating to width.
    pub fn shll(&self, amount: u32) -> Bits {
        let shifted = &self.magnitude << amount;
        Bits { width: self.width, signed: self.signed, magnitude: shifted & mask(self.width) }
    }

    /// Logical shift right (zero-filling from the top).
    pub fn shrl(&self, amount: u32) -> Bits {
        Bits { width: self.width, signed: self.signed, magnitude: &self.magnitude >> amount }
    }

    /// Arithmetic shift right (sign-extending from the top). Only meaningful
    /// (and only emitted, see `bytecode::emitter`) for statically-signed
    /// operands; open question #2 in `DESIGN.md`.
    pub fn shra(&self, amount: u32) -> Bits {
        let value = self.to_bigint() >> amount;
        Bits::from_signed(self.width, value).with_signed(self.signed)
    }

    pub fn concat(&self, lsb: &Bits) -> Bits {
        let width = self.width + lsb.width;
        let magnitude = (&self.magnitude << lsb.width) | &lsb.magnitude;
        Bits { width, signed: false, magnitude }
    }

    /// `self[start..start+width)`, zero-width allowed.
    pub fn slice(&self, start: usize, width: usize) -> Bits {
        let shifted = &self.magnitude >> start;
        Bits { width, signed: false, magnitude: shifted & mask(width) }
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    pub fn cmp_value(&self, rhs: &Bits) -> Ordering {
        if self.signed {
            self.to_bigint().cmp(&rhs.to_bigint())
        } else {
            self.magnitude.cmp(&rhs.magnitude)
        }
    }

    pub fn to_u64(&self) -> Option<u64> {
        use num::ToPrimitive;
        self.magnitude.to_u64()
    }

    pub fn to_usize(&self) -> Option<usize> {
        use num::ToPrimitive;
        self.magnitude.to_usize()
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let prefix = if self.signed { "s" } else { "u" };
        write!(f, "{}{}:{}", prefix, self.width, self.to_bigint())
    }
}

macro_rules! forward_owned_binop {
    ($trait:ident, $method:ident, $bits_method:ident) => {
        impl $trait for Bits {
            type Output = Bits;
            fn $method(self, rhs: Bits) -> Bits {
                Bits::$bits_method(&self, &rhs)
            }
        }
    };
}

forward_owned_binop!(Add, add, add);
forward_owned_binop!(Sub, sub, sub);
forward_owned_binop!(Mul, mul, mul);
forward_owned_binop!(BitAnd, bitand, bitand);
forward_owned_binop!(BitOr, bitor, bitor);
forward_owned_binop!(BitXor, bitxor, bitxor);

impl Not for Bits {
    type Output = Bits;
    fn not(self) -> Bits {
        self.invert()
    }
}

impl Shl<u32> for Bits {
    type Output = Bits;
    fn shl(self, amount: u32) -> Bits {
        self.shll(amount)
    }
}

impl Shr<u32> for Bits {
    type Output = Bits;
    fn shr(self, amount: u32) -> Bits {
        if self.signed {
            self.shra(amount)
        } else {
            self.shrl(amount)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_roundtrip() {
        let b = Bits::from_signed(8, BigInt::from(-1));
        assert_eq!(b.to_bigint(), BigInt::from(-1));
        assert_eq!(b.to_biguint(), BigUint::from(255u8));
    }

    #[test]
    fn sign_extend_negative() {
        let b = Bits::from_signed(4, BigInt::from(-1)).sign_extend_or_trunc(8);
        assert_eq!(b.to_bigint(), BigInt::from(-1));
    }

    #[test]
    fn zero_extend_keeps_unsigned_value() {
        let b = Bits::from_unsigned(4, BigUint::from(0b1010u8)).zero_extend_or_trunc(8);
        assert_eq!(b.to_biguint(), BigUint::from(0b1010u8));
    }

    #[test]
    fn concat_msb_first() {
        let hi = Bits::from_unsigned(4, BigUint::from(0xAu8));
        let lo = Bits::from_unsigned(4, BigUint::from(0xBu8));
        let c = hi.concat(&lo);
        assert_eq!(c.width(), 8);
        assert_eq!(c.to_biguint(), BigUint::from(0xABu8));
    }

    #[test]
    fn slice_extracts_middle_bits() {
        let v = Bits::from_unsigned(32, BigUint::from(0xdeadbeefu32));
        let s = v.slice(16, 16);
        assert_eq!(s.to_biguint(), BigUint::from(0xdeadu32));
    }
}
