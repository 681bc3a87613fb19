use std::rc::Rc;

use super::{Arena, NodeId};
use crate::source::Span;

/// A formal parametric binding: `name: type [ = default_expr ]` (spec §4.6).
#[derive(Debug, Clone)]
pub struct ParamBinding {
    pub name: Rc<str>,
    pub type_annotation: NodeId,
    pub default: Option<NodeId>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Rc<str>,
    pub type_annotation: NodeId,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Rc<str>,
    pub parametrics: Vec<ParamBinding>,
    pub params: Vec<Param>,
    pub return_type: Option<NodeId>,
    pub body: NodeId,
    pub public: bool,
    pub span: Span,
    /// Set for a function that is one of a `Proc`'s `config`/`next`/`init`.
    pub proc_parent: Option<usize>,
}

impl Function {
    pub fn is_parametric(&self) -> bool {
        !self.parametrics.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Proc {
    pub name: Rc<str>,
    pub parametrics: Vec<ParamBinding>,
    pub config: Function,
    pub next: Function,
    pub init: Function,
    pub members: Vec<(Rc<str>, NodeId)>,
    pub public: bool,
    pub span: Span,
}

impl Proc {
    pub fn is_parametric(&self) -> bool {
        !self.parametrics.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct StructMemberDecl {
    pub name: Rc<str>,
    pub type_annotation: NodeId,
}

#[derive(Debug, Clone)]
pub struct StructDef {
    pub name: Rc<str>,
    pub parametrics: Vec<ParamBinding>,
    pub members: Vec<StructMemberDecl>,
    pub public: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: Rc<str>,
    pub value: NodeId,
}

#[derive(Debug, Clone)]
pub struct EnumDef {
    pub name: Rc<str>,
    pub underlying: NodeId,
    pub members: Vec<EnumMember>,
    pub public: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeAlias {
    pub name: Rc<str>,
    pub type_annotation: NodeId,
    pub public: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ConstantDef {
    pub name: Rc<str>,
    pub annotation: Option<NodeId>,
    pub value: NodeId,
    pub public: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Import {
    pub subject: Vec<Rc<str>>,
    pub alias: Option<Rc<str>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TestFunction {
    pub function: Function,
}

#[derive(Debug, Clone)]
pub struct TestProc {
    pub proc: Proc,
}

#[derive(Debug, Clone)]
pub struct QuickCheck {
    pub function: Function,
    pub test_count: Option<u32>,
}

#[derive(Debug, Clone)]
pub enum ModuleMember {
    Import(Import),
    ConstantDef(ConstantDef),
    EnumDef(EnumDef),
    Function(Function),
    Proc(Proc),
    QuickCheck(QuickCheck),
    StructDef(StructDef),
    TestFunction(TestFunction),
    TestProc(TestProc),
    TypeAlias(TypeAlias),
    ConstAssert(NodeId),
}

/// A single parsed, post-import-resolved module: the arena plus its
/// top-level members in source order (spec §4.7 "iterates module members in
/// source order").
pub struct Module {
    pub name: Rc<str>,
    pub arena: Arena,
    pub members: Vec<ModuleMember>,
}

impl Module {
    pub fn new(name: impl Into<Rc<str>>, arena: Arena, members: Vec<ModuleMember>) -> Module {
        Module { name: name.into(), arena, members }
    }

    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.members.iter().find_map(|m| match m {
            ModuleMember::Function(f) if f.name.as_ref() == name => Some(f),
            _ => None,
        })
    }

    pub fn find_proc(&self, name: &str) -> Option<&Proc> {
        self.members.iter().find_map(|m| match m {
            ModuleMember::Proc(p) if p.name.as_ref() == name => Some(p),
            _ => None,
        })
    }

    pub fn find_struct(&self, name: &str) -> Option<&StructDef> {
        self.members.iter().find_map(|m| match m {
            ModuleMember::StructDef(s) if s.name.as_ref() == name => Some(s),
            _ => None,
        })
    }

    pub fn find_type_alias(&self, name: &str) -> Option<&TypeAlias> {
        self.members.iter().find_map(|m| match m {
            ModuleMember::TypeAlias(t) if t.name.as_ref() == name => Some(t),
            _ => None,
        })
    }

    pub fn find_enum(&self, name: &str) -> Option<&EnumDef> {
        self.members.iter().find_map(|m| match m {
            ModuleMember::EnumDef(e) if e.name.as_ref() == name => Some(e),
            _ => None,
        })
    }

    pub fn find_constant(&self, name: &str) -> Option<&ConstantDef> {
        self.members.iter().find_map(|m| match m {
            ModuleMember::ConstantDef(c) if c.name.as_ref() == name => Some(c),
            _ => None,
        })
    }
}
