use std::rc::Rc;

use super::NodeId;
use crate::number::Bits;
use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Xor,
    Shll,
    Shr,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LogicAnd,
    LogicOr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Invert,
    Negate,
    LogicNot,
}

/// Leaf/interior shape of a `let`/`for`/match-arm binding pattern (spec §4.1,
/// §4.5 "NameDefTree binding").
#[derive(Debug, Clone)]
pub enum NameDefTreeKind {
    Leaf(Rc<str>),
    Wildcard,
    Tuple(Vec<NodeId>),
    /// A pattern that must match a specific already-bound value: a numeric
    /// literal pattern or a `colon_ref` to an enum member/constant.
    Literal(NodeId),
    ColonRefPattern(NodeId),
}

#[derive(Debug, Clone)]
pub struct MatchArm {
    pub pattern: NodeId,
    pub body: NodeId,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Let {
        pattern: NodeId,
        annotation: Option<NodeId>,
        rhs: NodeId,
    },
    ConstAssert(NodeId),
    Expr(NodeId),
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    // --- literals & refs ---
    Number { text: Rc<str>, annotation: Option<NodeId> },
    /// A literal whose value has already been resolved by the parser (used
    /// by synthesized nodes, e.g. the implicit terminator channel literal).
    ResolvedLiteral(Bits),
    NameRef(Rc<str>),
    ColonRef { lhs: NodeId, member: Rc<str> },

    // --- operators ---
    Unary(UnOp, NodeId),
    Binary(NodeId, BinOp, NodeId),
    Conditional { cond: NodeId, then_branch: NodeId, else_branch: NodeId },
    Match { matched: NodeId, arms: Vec<MatchArm> },

    // --- bindings & control flow ---
    Block(Vec<Stmt>, Option<NodeId>),
    For { iterable: NodeId, pattern: NodeId, init: NodeId, body: NodeId },
    UnrollFor { iterable: NodeId, pattern: NodeId, init: NodeId, body: NodeId },

    // --- casts ---
    Cast { expr: NodeId, target: NodeId },

    // --- constructors ---
    TupleCtor(Vec<NodeId>),
    ArrayCtor(Vec<NodeId>),
    StructCtor { name: Rc<str>, members: Vec<(Rc<str>, NodeId)> },
    SplatStructCtor { name: Rc<str>, members: Vec<(Rc<str>, NodeId)>, base: NodeId },

    // --- access ---
    Attr { base: NodeId, member: Rc<str> },
    Index { base: NodeId, index: NodeId },
    Slice { base: NodeId, start: Option<NodeId>, limit: Option<NodeId> },
    WidthSlice { base: NodeId, start: NodeId, width: NodeId },

    // --- invocation forms ---
    Invocation { callee: NodeId, parametrics: Vec<NodeId>, args: Vec<NodeId> },
    Spawn { callee: NodeId, config_args: Vec<NodeId>, next_args: Vec<NodeId> },
    FormatMacro { format: Rc<str>, args: Vec<NodeId> },

    // --- ranges / channels ---
    Range { start: NodeId, end: NodeId },
    ChannelDecl { payload: NodeId, dims: Vec<NodeId>, fifo_depth: Option<NodeId> },

    // --- type annotations (also arena nodes: they're addressable by C4) ---
    TyBuiltin { name: Rc<str> },
    TySized { signed: bool, size: NodeId },
    TyArray { elem: NodeId, size: NodeId },
    TyTuple(Vec<NodeId>),
    TyChannel { payload: NodeId, direction: super::ChannelDirAnnot },
    TyRef { lhs: Option<NodeId>, name: Rc<str>, parametrics: Vec<NodeId> },

    // --- patterns ---
    NameDefTree(NameDefTreeKind),

    // --- top-level assert ---
    ConstAssertTop(NodeId),
}

impl NodeKind {
    pub fn for_each_child(&self, mut f: impl FnMut(NodeId)) {
        use NodeKind::*;
        match self {
            Number { annotation, .. } => {
                if let Some(a) = annotation {
                    f(*a)
                }
            }
            ResolvedLiteral(_) | NameRef(_) | TyBuiltin { .. } => {}
            ColonRef { lhs, .. } => f(*lhs),
            Unary(_, e) => f(*e),
            Binary(l, _, r) => {
                f(*l);
                f(*r)
            }
            Conditional { cond, then_branch, else_branch } => {
                f(*cond);
                f(*then_branch);
                f(*else_branch)
            }
            Match { matched, arms } => {
                f(*matched);
                for arm in arms {
                    f(arm.pattern);
                    f(arm.body);
                }
            }
            Block(stmts, tail) => {
                for s in stmts {
                    match s {
                        Stmt::Let { pattern, annotation, rhs } => {
                            f(*pattern);
                            if let Some(a) = annotation {
                                f(*a)
                            }
                            f(*rhs)
                        }
                        Stmt::ConstAssert(e) => f(*e),
                        Stmt::Expr(e) => f(*e),
                    }
                }
                if let Some(t) = tail {
                    f(*t)
                }
            }
            For { iterable, pattern, init, body } | UnrollFor { iterable, pattern, init, body } => {
                f(*iterable);
                f(*pattern);
                f(*init);
                f(*body)
            }
            Cast { expr, target } => {
                f(*expr);
                f(*target)
            }
            TupleCtor(items) | ArrayCtor(items) => {
                for i in items {
                    f(*i)
                }
            }
            StructCtor { members, .. } => {
                for (_, v) in members {
                    f(*v)
                }
            }
            SplatStructCtor { members, base, .. } => {
                for (_, v) in members {
                    f(*v)
                }
                f(*base)
            }
            Attr { base, .. } => f(*base),
            Index { base, index } => {
                f(*base);
                f(*index)
            }
            Slice { base, start, limit } => {
                f(*base);
                if let Some(s) = start {
                    f(*s)
                }
                if let Some(l) = limit {
                    f(*l)
                }
            }
            WidthSlice { base, start, width } => {
                f(*base);
                f(*start);
                f(*width)
            }
            Invocation { callee, parametrics, args } => {
                f(*callee);
                for p in parametrics {
                    f(*p)
                }
                for a in args {
                    f(*a)
                }
            }
            Spawn { callee, config_args, next_args } => {
                f(*callee);
                for a in config_args {
                    f(*a)
                }
                for a in next_args {
                    f(*a)
                }
            }
            FormatMacro { args, .. } => {
                for a in args {
                    f(*a)
                }
            }
            Range { start, end } => {
                f(*start);
                f(*end)
            }
            ChannelDecl { payload, dims, fifo_depth } => {
                f(*payload);
                for d in dims {
                    f(*d)
                }
                if let Some(d) = fifo_depth {
                    f(*d)
                }
            }
            TySized { size, .. } => f(*size),
            TyArray { elem, size } => {
                f(*elem);
                f(*size)
            }
            TyTuple(items) => {
                for i in items {
                    f(*i)
                }
            }
            TyChannel { payload, .. } => f(*payload),
            TyRef { lhs, parametrics, .. } => {
                if let Some(l) = lhs {
                    f(*l)
                }
                for p in parametrics {
                    f(*p)
                }
            }
            NameDefTree(kind) => match kind {
                NameDefTreeKind::Leaf(_) | NameDefTreeKind::Wildcard => {}
                NameDefTreeKind::Tuple(items) => {
                    for i in items {
                        f(*i)
                    }
                }
                NameDefTreeKind::Literal(e) | NameDefTreeKind::ColonRefPattern(e) => f(*e),
            },
            ConstAssertTop(e) => f(*e),
        }
    }
}
