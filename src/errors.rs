//! Closed error-kind enum (spec §7), grounded on the `TypeInferenceErrorStatus`
//! / `TypeMismatchErrorStatus` family of helpers in
//! `original_source/xls/dslx/type_system/typecheck_module.cc`.

use thiserror::Error;

use crate::source::Span;
use crate::types::Type;

#[derive(Debug, Error)]
pub enum Error {
    /// A node's type cannot be determined.
    #[error("{span}: could not infer type: {message}")]
    TypeInference { span: Span, message: String },

    /// Two types disagree. Carries both sides so `typecheck_module`'s
    /// explainer can enrich the message before it's surfaced.
    #[error("{span}: type mismatch: {lhs_type} vs {rhs_type}: {message}")]
    TypeMismatch {
        span: Span,
        lhs_type: Box<Type>,
        rhs_type: Box<Type>,
        lhs_span: Option<Span>,
        rhs_span: Option<Span>,
        message: String,
    },

    /// An expression required to be constexpr was not, or evaluation itself
    /// failed (including compile-time bound checks and `const_assert`
    /// failures).
    #[error("{span}: constexpr error: {message}")]
    Constexpr { span: Span, message: String },

    /// A compiler invariant was broken; never recovered from.
    #[error("internal error at {span}: {message}")]
    Internal { span: Span, message: String },

    /// A user-facing usage error at a module/pipeline boundary (e.g. unknown
    /// pass name).
    #[error("argument error: {message}")]
    Argument { message: String },

    /// Reserved for the external parser; never constructed by this crate,
    /// kept in the closed set so a driver can round-trip a single error type.
    #[error("{span}: parse error: {message}")]
    Parse { span: Span, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn type_inference(span: Span, message: impl Into<String>) -> Error {
        Error::TypeInference { span, message: message.into() }
    }

    pub fn internal(span: Span, message: impl Into<String>) -> Error {
        Error::Internal { span, message: message.into() }
    }

    pub fn argument(message: impl Into<String>) -> Error {
        Error::Argument { message: message.into() }
    }

    pub fn constexpr(span: Span, message: impl Into<String>) -> Error {
        Error::Constexpr { span, message: message.into() }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn type_mismatch(
        span: Span,
        lhs_type: Type,
        rhs_type: Type,
        lhs_span: Option<Span>,
        rhs_span: Option<Span>,
        message: impl Into<String>,
    ) -> Error {
        Error::TypeMismatch {
            span,
            lhs_type: Box::new(lhs_type),
            rhs_type: Box::new(rhs_type),
            lhs_span,
            rhs_span,
            message: message.into(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Error::TypeInference { span, .. }
            | Error::TypeMismatch { span, .. }
            | Error::Constexpr { span, .. }
            | Error::Internal { span, .. }
            | Error::Parse { span, .. } => *span,
            Error::Argument { .. } => Span::dummy(),
        }
    }
}
