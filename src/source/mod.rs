mod diag;
mod span;
mod src;

pub use self::diag::{DiagMgr, Diagnostic, Note, Severity};
pub use self::span::{FatPos, FatSpan, Pos, Span, Spanned};
pub use self::src::{LineMap, Source, SrcMgr};
