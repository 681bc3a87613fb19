//! IR package (spec C10 / §3 "IR package", §4.10): a pure-value SSA IR with
//! nodes, functions, procs (long-lived state machines with channels), and
//! channels. Treated as opaque by the pass manager except for the invariants
//! the verifier checks.
//!
//! Grounded on `xls/ir/package.h`/`xls/ir/function.h`'s node-owns-operands-by-id
//! shape, adapted to the teacher's arena-by-index idiom
//! (`examples/lowRISC-sv-elaborator/src/parser/ast.rs`) rather than XLS's
//! pointer-stable bump allocator, since this crate has no need for
//! cross-arena-survival of individual nodes.

pub mod verifier;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::number::Bits;
use crate::value::{ChannelDirection, ChannelId, Value};

/// Node-local type: a pure-value SSA IR has no symbolic dimensions left (spec
/// §3 "treated as opaque... except for invariants"), so widths are plain
/// `usize` rather than `Dim`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrType {
    Bits(usize),
    Tuple(Vec<IrType>),
    Array { elem: Box<IrType>, size: usize },
    Token,
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IrType::Bits(w) => write!(f, "bits[{}]", w),
            IrType::Tuple(items) => {
                write!(f, "(")?;
                for (i, t) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ")")
            }
            IrType::Array { elem, size } => write!(f, "{}[{}]", elem, size),
            IrType::Token => write!(f, "token"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Umul,
    Smul,
    Udiv,
    And,
    Or,
    Xor,
    Shll,
    Shrl,
    Shra,
    Eq,
    Ne,
    Ult,
    Ule,
    Ugt,
    Uge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
    Identity,
}

/// Stable identity of a single node within one function/proc body. Indexes
/// directly into that body's `nodes` vec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone)]
pub enum NodeOp {
    Literal(Value),
    Param(Rc<str>),
    Unary(UnOp, NodeId),
    Binary(BinOp, NodeId, NodeId),
    /// `cases[selector]`, or `default` if `selector` is out of range (spec
    /// select semantics match the `table_switch`/`select_simplification`
    /// passes' common target shape).
    Select { selector: NodeId, cases: Vec<NodeId>, default: Option<NodeId> },
    Concat(Vec<NodeId>),
    BitSlice { operand: NodeId, start: usize, width: usize },
    Tuple(Vec<NodeId>),
    TupleIndex { operand: NodeId, index: usize },
    Array(Vec<NodeId>),
    ArrayIndex { operand: NodeId, index: NodeId },
    Send { channel: ChannelId, token: NodeId, data: NodeId, predicate: Option<NodeId> },
    Receive { channel: ChannelId, token: NodeId, predicate: Option<NodeId> },
    /// Assigns the proc's next-iteration state; `predicate` absent means
    /// unconditional (spec §4.10 "next-value optimization").
    NextValue { state: NodeId, value: NodeId, predicate: Option<NodeId> },
    Assert { token: NodeId, condition: NodeId, message: Rc<str> },
    Invoke { function: Rc<str>, args: Vec<NodeId> },
    AfterAll(Vec<NodeId>),
}

impl NodeOp {
    /// Every node this op reads, in a stable (declaration) order — used by
    /// the verifier for dangling-use checks and by DCE for liveness
    /// propagation. Does not include channel ids, which are a separate
    /// namespace (spec "channel-use legality").
    pub fn operands(&self) -> SmallVec<[NodeId; 4]> {
        let mut out = SmallVec::new();
        match self {
            NodeOp::Literal(_) | NodeOp::Param(_) => {}
            NodeOp::Unary(_, a) => out.push(*a),
            NodeOp::Binary(_, a, b) => {
                out.push(*a);
                out.push(*b);
            }
            NodeOp::Select { selector, cases, default } => {
                out.push(*selector);
                out.extend(cases.iter().copied());
                out.extend(default.iter().copied());
            }
            NodeOp::Concat(items) | NodeOp::Tuple(items) | NodeOp::Array(items) | NodeOp::AfterAll(items) => {
                out.extend(items.iter().copied());
            }
            NodeOp::BitSlice { operand, .. } | NodeOp::TupleIndex { operand, .. } => out.push(*operand),
            NodeOp::ArrayIndex { operand, index } => {
                out.push(*operand);
                out.push(*index);
            }
            NodeOp::Send { token, data, predicate, .. } => {
                out.push(*token);
                out.push(*data);
                out.extend(predicate.iter().copied());
            }
            NodeOp::Receive { token, predicate, .. } => {
                out.push(*token);
                out.extend(predicate.iter().copied());
            }
            NodeOp::NextValue { state, value, predicate } => {
                out.push(*state);
                out.push(*value);
                out.extend(predicate.iter().copied());
            }
            NodeOp::Assert { token, condition, .. } => {
                out.push(*token);
                out.push(*condition);
            }
            NodeOp::Invoke { args, .. } => out.extend(args.iter().copied()),
        }
        out
    }

    /// Structural key for CSE: two nodes with equal `(op_key, ty)` and
    /// identical operands compute the same value. Side-effecting ops
    /// (channel traffic, asserts) are excluded by the caller before this is
    /// ever consulted.
    pub fn structural_key(&self) -> String {
        match self {
            NodeOp::Literal(v) => format!("lit:{}", v),
            NodeOp::Param(n) => format!("param:{}", n),
            NodeOp::Unary(op, a) => format!("un:{:?}:{}", op, a.0),
            NodeOp::Binary(op, a, b) => format!("bin:{:?}:{}:{}", op, a.0, b.0),
            NodeOp::Select { selector, cases, default } => {
                format!("sel:{}:{:?}:{:?}", selector.0, cases.iter().map(|n| n.0).collect::<Vec<_>>(), default.map(|n| n.0))
            }
            NodeOp::Concat(items) => format!("concat:{:?}", items.iter().map(|n| n.0).collect::<Vec<_>>()),
            NodeOp::BitSlice { operand, start, width } => format!("slice:{}:{}:{}", operand.0, start, width),
            NodeOp::Tuple(items) => format!("tuple:{:?}", items.iter().map(|n| n.0).collect::<Vec<_>>()),
            NodeOp::TupleIndex { operand, index } => format!("tidx:{}:{}", operand.0, index),
            NodeOp::Array(items) => format!("array:{:?}", items.iter().map(|n| n.0).collect::<Vec<_>>()),
            NodeOp::ArrayIndex { operand, index } => format!("aidx:{}:{}", operand.0, index.0),
            NodeOp::AfterAll(items) => format!("afterall:{:?}", items.iter().map(|n| n.0).collect::<Vec<_>>()),
            NodeOp::Send { .. } | NodeOp::Receive { .. } | NodeOp::NextValue { .. } | NodeOp::Assert { .. } | NodeOp::Invoke { .. } => {
                format!("effect:{:p}", self as *const NodeOp)
            }
        }
    }

    pub fn is_side_effecting(&self) -> bool {
        matches!(self, NodeOp::Send { .. } | NodeOp::Receive { .. } | NodeOp::NextValue { .. } | NodeOp::Assert { .. })
    }

    /// Rewrites every operand equal to `from` to `to` in place. Used by
    /// simplification passes to replace a node with an equivalent one
    /// without renumbering the graph (spec §4.10's many "-simplification"
    /// passes all reduce to this one operation plus DCE).
    pub fn replace_operand(&mut self, from: NodeId, to: NodeId) {
        let swap = |id: &mut NodeId| {
            if *id == from {
                *id = to;
            }
        };
        match self {
            NodeOp::Literal(_) | NodeOp::Param(_) => {}
            NodeOp::Unary(_, a) => swap(a),
            NodeOp::Binary(_, a, b) => {
                swap(a);
                swap(b);
            }
            NodeOp::Select { selector, cases, default } => {
                swap(selector);
                for c in cases.iter_mut() {
                    swap(c);
                }
                if let Some(d) = default {
                    swap(d);
                }
            }
            NodeOp::Concat(items) | NodeOp::Tuple(items) | NodeOp::Array(items) | NodeOp::AfterAll(items) => {
                for i in items.iter_mut() {
                    swap(i);
                }
            }
            NodeOp::BitSlice { operand, .. } | NodeOp::TupleIndex { operand, .. } => swap(operand),
            NodeOp::ArrayIndex { operand, index } => {
                swap(operand);
                swap(index);
            }
            NodeOp::Send { token, data, predicate, .. } => {
                swap(token);
                swap(data);
                if let Some(p) = predicate {
                    swap(p);
                }
            }
            NodeOp::Receive { token, predicate, .. } => {
                swap(token);
                if let Some(p) = predicate {
                    swap(p);
                }
            }
            NodeOp::NextValue { state, value, predicate } => {
                swap(state);
                swap(value);
                if let Some(p) = predicate {
                    swap(p);
                }
            }
            NodeOp::Assert { token, condition, .. } => {
                swap(token);
                swap(condition);
            }
            NodeOp::Invoke { args, .. } => {
                for a in args.iter_mut() {
                    swap(a);
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub op: NodeOp,
    pub ty: IrType,
    pub name: Option<Rc<str>>,
}

/// Owns every node of one function/proc body, indexed by `NodeId`. A node is
/// "dead" once no live node (including the return/next-state root) uses it;
/// `tombstone` marks that without needing to renumber every later id.
#[derive(Debug, Clone, Default)]
pub struct NodeGraph {
    nodes: Vec<Option<Node>>,
}

impl NodeGraph {
    pub fn new() -> NodeGraph {
        NodeGraph::default()
    }

    pub fn add(&mut self, op: NodeOp, ty: IrType, name: Option<Rc<str>>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(Node { id, op, ty, name }));
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize).and_then(|n| n.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize).and_then(|n| n.as_mut())
    }

    /// Tombstones the slot; leaves `id` permanently dangling in this graph.
    /// Callers must ensure nothing still reads `id` before calling this (DCE
    /// is the only caller).
    pub fn remove(&mut self, id: NodeId) {
        if let Some(slot) = self.nodes.get_mut(id.0 as usize) {
            *slot = None;
        }
    }

    pub fn replace_op(&mut self, id: NodeId, op: NodeOp) {
        if let Some(Some(n)) = self.nodes.get_mut(id.0 as usize) {
            n.op = op;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter_map(|n| n.as_ref())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node id currently live (not tombstoned), in ascending order.
    pub fn live_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().enumerate().filter(|(_, n)| n.is_some()).map(|(i, _)| NodeId(i as u32)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Rc<str>,
    pub params: Vec<(Rc<str>, NodeId)>,
    pub nodes: NodeGraph,
    pub ret: NodeId,
}

/// A long-lived state machine: `next` computes the state for the following
/// activation from `state_param`, communicating over `channels` (spec §3
/// "procs... with channels").
#[derive(Debug, Clone)]
pub struct Proc {
    pub name: Rc<str>,
    pub state_param: NodeId,
    pub token_param: NodeId,
    pub nodes: NodeGraph,
    pub next_state: NodeId,
    pub next_token: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Streaming,
    SingleValue,
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub id: ChannelId,
    pub name: Rc<str>,
    pub ty: IrType,
    pub kind: ChannelKind,
    /// Set once `passes::channel_legalization` has adapted a
    /// multiple-producer channel down to one (spec §4.10 step 8).
    pub legalized: bool,
}

/// A whole compilation unit: every function, proc, and channel the pass
/// pipeline operates over (spec §3 "IR package"). Exclusively owned by
/// whichever pass is currently running (spec §5 "no aliasing, no locks").
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub name: Rc<str>,
    pub functions: Vec<Function>,
    pub procs: Vec<Proc>,
    pub channels: Vec<Channel>,
    pub top: Option<Rc<str>>,
}

impl Package {
    pub fn new(name: impl Into<Rc<str>>) -> Package {
        Package { name: name.into(), functions: Vec::new(), procs: Vec::new(), channels: Vec::new(), top: None }
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name.as_ref() == name)
    }

    pub fn function_mut(&mut self, name: &str) -> Option<&mut Function> {
        self.functions.iter_mut().find(|f| f.name.as_ref() == name)
    }

    pub fn proc_by_name(&self, name: &str) -> Option<&Proc> {
        self.procs.iter().find(|p| p.name.as_ref() == name)
    }

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub fn channel_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.id == id)
    }

    /// Functions reachable from `top` (or, absent a declared top, from every
    /// function/proc) by `Invoke`, used by dead-function elimination (spec
    /// §4.10 step 1).
    pub fn reachable_functions(&self) -> HashMap<Rc<str>, ()> {
        let mut seen = HashMap::new();
        let mut frontier: Vec<Rc<str>> = match &self.top {
            Some(t) => vec![t.clone()],
            None => self.functions.iter().map(|f| f.name.clone()).collect(),
        };
        while let Some(name) = frontier.pop() {
            if seen.insert(name.clone(), ()).is_some() {
                continue;
            }
            if let Some(f) = self.function(&name) {
                for node in f.nodes.iter() {
                    if let NodeOp::Invoke { function, .. } = &node.op {
                        frontier.push(function.clone());
                    }
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_graph_add_and_remove() {
        let mut g = NodeGraph::new();
        let a = g.add(NodeOp::Literal(Value::u32(1)), IrType::Bits(32), None);
        let b = g.add(NodeOp::Unary(UnOp::Identity, a), IrType::Bits(32), None);
        assert_eq!(g.get(b).unwrap().op.operands().as_slice(), &[a]);
        g.remove(a);
        assert!(g.get(a).is_none());
        assert!(g.get(b).is_some());
    }

    #[test]
    fn reachable_functions_follows_invoke() {
        let mut pkg = Package::new("p");
        let mut callee_nodes = NodeGraph::new();
        let ret = callee_nodes.add(NodeOp::Literal(Value::u32(0)), IrType::Bits(32), None);
        pkg.functions.push(Function { name: Rc::from("callee"), params: Vec::new(), nodes: callee_nodes, ret });

        let mut caller_nodes = NodeGraph::new();
        let ret = caller_nodes.add(NodeOp::Invoke { function: Rc::from("callee"), args: Vec::new() }, IrType::Bits(32), None);
        pkg.functions.push(Function { name: Rc::from("caller"), params: Vec::new(), nodes: caller_nodes, ret });
        pkg.top = Some(Rc::from("caller"));

        let reachable = pkg.reachable_functions();
        assert!(reachable.contains_key("caller"));
        assert!(reachable.contains_key("callee"));
    }
}
