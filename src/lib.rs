//! `dslc`: type deduction, bytecode emission, and IR optimization pipeline
//! for a bit-width-precise hardware description DSL.
//!
//! Module layout mirrors the spec's component breakdown (C1-C10): value and
//! type universe (`value`, `types`, `number`), post-parse AST (`ast`),
//! per-module side tables (`typeinfo`), constexpr evaluation (`constexpr`),
//! type inference (`deduce`, `instantiate`, `typecheck_module`), bytecode
//! (`bytecode`), and the IR optimization pipeline (`ir`, `passes`).

pub mod ast;
pub mod bytecode;
pub mod constexpr;
pub mod deduce;
pub mod errors;
pub mod imports;
pub mod instantiate;
pub mod ir;
pub mod number;
pub mod passes;
pub mod source;
pub mod typecheck_module;
pub mod typeinfo;
pub mod types;
pub mod value;
pub mod warnings;
