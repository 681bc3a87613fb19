//! Value universe (spec C1 / §3).

use std::fmt;
use std::rc::Rc;

use num::{BigInt, BigUint};

use crate::ast::NodeId;
use crate::number::Bits;

/// Opaque identity of a user-defined function, resolved by the module
/// typechecker. Distinct from `NodeId` because a `Value::Function` can
/// outlive the AST node that introduced it (e.g. when passed as a constexpr
/// higher-order argument).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FnId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    AssertEq,
    AssertLt,
    Trace,
    Zero,
    Max,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FnRef {
    User(FnId),
    Builtin(Builtin),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u32);

/// Tagged sum of value kinds (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    UBits(Bits),
    SBits(Bits),
    Tuple(Rc<Vec<Value>>),
    /// `element_type_tag` only disambiguates empty arrays (whose element
    /// values carry no width/signedness of their own).
    Array(Rc<Vec<Value>>, ElemTag),
    Enum(NodeId, Bits),
    Channel(ChannelId, ChannelDirection),
    Token,
    Function(FnRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElemTag {
    pub width: usize,
    pub signed: bool,
}

impl Value {
    pub fn u32(v: u32) -> Value {
        Value::UBits(Bits::from_unsigned(32, BigUint::from(v)))
    }

    pub fn ubits(width: usize, v: BigUint) -> Value {
        Value::UBits(Bits::from_unsigned(width, v))
    }

    pub fn sbits(width: usize, v: BigInt) -> Value {
        Value::SBits(Bits::from_signed(width, v))
    }

    pub fn bool_value(b: bool) -> Value {
        Value::UBits(Bits::from_unsigned(1, BigUint::from(b as u8)))
    }

    pub fn bits(&self) -> Option<&Bits> {
        match self {
            Value::UBits(b) | Value::SBits(b) | Value::Enum(_, b) => Some(b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.bits().and_then(|b| b.to_u64())
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.bits().map(|b| !b.is_zero())
    }

    pub fn as_usize(&self) -> Option<usize> {
        self.bits().and_then(|b| b.to_usize())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::UBits(b) => write!(f, "u{}:{}", b.width(), b.to_biguint()),
            Value::SBits(b) => write!(f, "s{}:{}", b.width(), b.to_bigint()),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
            Value::Array(items, _) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Enum(id, b) => write!(f, "enum#{}:{}", id.0, b.to_biguint()),
            Value::Channel(id, dir) => write!(f, "chan#{}({:?})", id.0, dir),
            Value::Token => write!(f, "token"),
            Value::Function(FnRef::User(id)) => write!(f, "fn#{}", id.0),
            Value::Function(FnRef::Builtin(b)) => write!(f, "builtin({:?})", b),
        }
    }
}
