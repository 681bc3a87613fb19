//! Bytecode emission and interpretation (spec C9 / §4.8, §6).

pub mod emitter;
pub mod interp;
pub mod op;
pub mod text;

pub use emitter::{BytecodeFunction, Emitter};
pub use interp::{run, FnResolver, NoUserFns};
pub use op::{Bytecode, Op};
