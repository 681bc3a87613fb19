//! Cross-module import boundary (spec §9 "Imports and cross-module
//! TypeInfo"). The import subsystem itself — turning a `subject` path into
//! parsed module tokens — is an external collaborator (spec §4.9); this
//! module only defines the shape `typecheck_module` needs to consult an
//! already-resolved imported module's root `TypeInfo`.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::Module;
use crate::errors::Result;
use crate::typeinfo::TypeInfo;

/// A fully typechecked imported module: its AST and the root `TypeInfo`
/// `typecheck_module` produced for it.
pub struct ImportedModule {
    pub module: Rc<Module>,
    pub type_info: Rc<TypeInfo>,
}

/// External collaborator that resolves an `import` statement's dotted
/// `subject` path to an already-typechecked module, recursively running
/// `typecheck_module` as needed (spec §4.7 "for imports: recursively
/// typecheck the imported module").
pub trait ImportResolver {
    fn do_import(&mut self, subject: &[Rc<str>]) -> Result<Rc<ImportedModule>>;
}

/// The view of the importing module's resolved imports a `Deducer` needs to
/// answer a cross-module `ColonRef` (spec §8 seed scenario 5): the resolved
/// modules in source order, and a name table mapping an import's alias (or,
/// absent an alias, the last path segment) to its index.
#[derive(Clone, Copy)]
pub struct ImportContext<'a> {
    pub modules: &'a [Rc<ImportedModule>],
    pub names: &'a HashMap<Rc<str>, usize>,
}

impl<'a> ImportContext<'a> {
    pub fn resolve(&self, name: &str) -> Option<&'a Rc<ImportedModule>> {
        self.names.get(name).map(|&i| &self.modules[i])
    }
}
