use crate::source::Span;
use crate::types::Type;
use crate::value::{FnRef, Value};

/// A single bytecode operation (spec §4.8/§6).
///
/// The spec describes each record as `{op, optional data, span}` with `data`
/// drawn from a handful of shapes (`Value`, `SlotIndex`, `NumElements`,
/// `JumpTarget`, `InvocationData`). Rust lets the operand ride directly on
/// the enum variant instead of through a second indirection, so that's what
/// we do here; the set of operand *shapes* below is unchanged from the spec.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Literal(Value),
    Load(u32),
    Store(u32),

    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Xor,
    Shll,
    Shrl,
    Shra,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    Invert,
    Negate,

    Cast(Type),

    Index,
    /// `base[start:limit]` with the `(start,width)` already resolved by the
    /// deducer (spec §4.5's clamping rule) and baked in at emit time, since
    /// both bounds are constexpr by construction.
    Slice { start: u32, width: u32 },
    /// `base[start +: uN[width]]`. `start` is a runtime value popped off the
    /// stack (it need not be constexpr); `width` is the annotated width,
    /// always constexpr, and baked in at emit time.
    WidthSlice { width: u32 },

    CreateTuple(u32),
    CreateArray(u32),
    ExpandTuple,

    Call(FnRef),

    /// `target = pc + offset`, where `pc` is this instruction's own index
    /// (spec §9 Open Question #1, resolved in `DESIGN.md`).
    JumpRel(i32),
    JumpRelIf(i32),
    JumpDest,

    Return,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bytecode {
    pub op: Op,
    pub span: Span,
}

impl Bytecode {
    pub fn new(op: Op, span: Span) -> Bytecode {
        Bytecode { op, span }
    }
}
