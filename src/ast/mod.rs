//! Immutable, post-parse AST (spec C3 / §4.1).
//!
//! Grounded on the teacher's `parser/ast.rs` tagged-enum-per-node-category
//! idiom (`examples/lowRISC-sv-elaborator/src/parser/ast.rs`: `Item`,
//! `ExprKind`, `Spanned<T>`), generalized from SystemVerilog's grammar to the
//! node categories named in spec §4.1. Unlike the teacher (which never needed
//! cross-references between sibling declarations), this DSL's structs can
//! refer back to themselves (a struct member's type can name the struct being
//! declared) and name-defs are looked up by parent constructs, so nodes live
//! in a flat arena addressed by `NodeId` rather than being owned by `Box`
//! (spec §9 "Cyclic and back-referenced AST graphs").

mod node;
pub mod module;

pub use node::{BinOp, MatchArm, NameDefTreeKind, NodeKind, Stmt, UnOp};
pub use module::*;

use std::collections::HashMap;

use crate::source::Span;

/// Stable identity of a single AST node, valid for the lifetime of the
/// `Arena` that produced it. Never implies ownership: a `NodeId` stored
/// inside another node's `NodeKind` is a plain reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Direction annotation on a `chan<T> in|out` type annotation (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelDirAnnot {
    In,
    Out,
}

struct NodeData {
    kind: NodeKind,
    span: Span,
}

/// Owns every node of a single module. Built once during parsing (external
/// to this crate) and read-only from then on.
pub struct Arena {
    nodes: Vec<NodeData>,
    /// Computed once, lazily, after the arena is fully populated; never
    /// mutated afterwards (spec §9 "Parent pointers").
    parents: HashMap<NodeId, NodeId>,
}

impl Arena {
    pub fn new() -> Arena {
        Arena { nodes: Vec::new(), parents: HashMap::new() }
    }

    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData { kind, span });
        id
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0 as usize].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.0 as usize].span
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recompute parent pointers from every node's children. Idempotent;
    /// intended to run exactly once after the arena is fully built.
    pub fn compute_parents(&mut self) {
        self.parents.clear();
        let mut edges = Vec::new();
        for (i, data) in self.nodes.iter().enumerate() {
            let parent = NodeId(i as u32);
            data.kind.for_each_child(|child| edges.push((child, parent)));
        }
        for (child, parent) in edges {
            self.parents.insert(child, parent);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }
}

impl Default for Arena {
    fn default() -> Arena {
        Arena::new()
    }
}

/// A user-friendly name for diagnostics, mirroring the teacher's `AstNode`
/// trait (`examples/lowRISC-sv-elaborator/src/parser/ast.rs`).
pub trait AstNode {
    fn name() -> &'static str;
}

impl AstNode for NodeKind {
    fn name() -> &'static str {
        "expression"
    }
}
