//! Type universe (spec C1 / §3, §4.2).

pub mod dim;

pub use dim::{Binding, Dim, ParametricEnv};

use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelDirection {
    In,
    Out,
}

/// Identity of a nominal type (struct or enum): the defining module's name
/// plus the type's own name. Two `Type::Struct`/`Type::Enum` are the "same"
/// nominal type iff their `NominalId`s are equal, regardless of parametric
/// environment — keyed by (module, name) rather than by AST node so that two
/// independent references to the same declared struct (a parameter
/// annotation here, a struct-literal there) compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NominalId {
    pub module: Rc<str>,
    pub name: Rc<str>,
}

#[derive(Debug, Clone)]
pub struct StructType {
    pub nominal: NominalId,
    pub name: Rc<str>,
    pub members: Vec<(Rc<str>, Type)>,
    pub env: ParametricEnv,
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub nominal: NominalId,
    pub name: Rc<str>,
    pub underlying: Box<Type>,
}

#[derive(Debug, Clone)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Box<Type>,
    pub env: ParametricEnv,
}

/// The full type universe (spec §3).
#[derive(Debug, Clone)]
pub enum Type {
    Bits { signed: bool, size: Dim },
    Array { elem: Box<Type>, size: Dim },
    Tuple(Vec<Type>),
    Struct(Box<StructType>),
    Enum(Box<EnumType>),
    Channel { payload: Box<Type>, direction: ChannelDirection },
    Token,
    Function(Box<FunctionType>),
    /// The "type of a type" used for type annotations occurring in
    /// expression position (spec §3). Distinct from `T` itself.
    Meta(Box<Type>),
}

impl Type {
    pub fn u(width: u32) -> Type {
        Type::Bits { signed: false, size: Dim::konst(width) }
    }

    pub fn s(width: u32) -> Type {
        Type::Bits { signed: true, size: Dim::konst(width) }
    }

    pub fn bool_ty() -> Type {
        Type::u(1)
    }

    pub fn meta(self) -> Type {
        Type::Meta(Box::new(self))
    }

    pub fn unwrap_meta(&self) -> Option<&Type> {
        match self {
            Type::Meta(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_meta(&self) -> bool {
        matches!(self, Type::Meta(_))
    }

    pub fn is_unsigned_bits(&self) -> bool {
        matches!(self, Type::Bits { signed: false, .. })
    }

    pub fn is_signed_bits(&self) -> bool {
        matches!(self, Type::Bits { signed: true, .. })
    }

    pub fn bits_size(&self) -> Option<&Dim> {
        match self {
            Type::Bits { size, .. } => Some(size),
            _ => None,
        }
    }

    /// Structural equality up to `Dim` equality, per spec §4.2: "Type
    /// equality is structural up to `Dim` equality; `Dim` equality is
    /// syntactic on the parametric expression tree after normalization."
    /// `Meta(T)` is distinct from `T`.
    pub fn structural_eq(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Bits { signed: s1, size: d1 }, Type::Bits { signed: s2, size: d2 }) => {
                s1 == s2 && d1 == d2
            }
            (Type::Array { elem: e1, size: d1 }, Type::Array { elem: e2, size: d2 }) => {
                d1 == d2 && e1.structural_eq(e2)
            }
            (Type::Tuple(a), Type::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structural_eq(y))
            }
            (Type::Struct(a), Type::Struct(b)) => {
                a.nominal == b.nominal
                    && a.members.len() == b.members.len()
                    && a.members
                        .iter()
                        .zip(&b.members)
                        .all(|((n1, t1), (n2, t2))| n1 == n2 && t1.structural_eq(t2))
            }
            (Type::Enum(a), Type::Enum(b)) => a.nominal == b.nominal,
            (Type::Channel { payload: p1, direction: d1 }, Type::Channel { payload: p2, direction: d2 }) => {
                d1 == d2 && p1.structural_eq(p2)
            }
            (Type::Token, Type::Token) => true,
            (Type::Function(a), Type::Function(b)) => {
                a.params.len() == b.params.len()
                    && a.params.iter().zip(&b.params).all(|(x, y)| x.structural_eq(y))
                    && a.ret.structural_eq(&b.ret)
            }
            (Type::Meta(a), Type::Meta(b)) => a.structural_eq(b),
            _ => false,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Type) -> bool {
        self.structural_eq(other)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Bits { signed, size } => write!(f, "{}{}", if *signed { "s" } else { "u" }, size),
            Type::Array { elem, size } => write!(f, "{}[{}]", elem, size),
            Type::Tuple(items) => {
                write!(f, "(")?;
                for (i, t) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ")")
            }
            Type::Struct(s) => write!(f, "{}", s.name),
            Type::Enum(e) => write!(f, "{}", e.name),
            Type::Channel { payload, direction } => {
                write!(f, "chan<{}> {}", payload, if *direction == ChannelDirection::In { "in" } else { "out" })
            }
            Type::Token => write!(f, "token"),
            Type::Function(ft) => {
                write!(f, "(")?;
                for (i, t) in ft.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ") -> {}", ft.ret)
            }
            Type::Meta(t) => write!(f, "typeof({})", t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_distinct_from_inner() {
        let t = Type::u(32);
        let m = t.clone().meta();
        assert!(!t.structural_eq(&m));
    }

    #[test]
    fn bits_equal_up_to_dim_value() {
        assert_eq!(Type::u(32), Type::u(32));
        assert_ne!(Type::u(32), Type::u(16));
        assert_ne!(Type::u(32), Type::s(32));
    }
}
