use std::cell::RefCell;

use super::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

#[derive(Debug, Clone)]
pub struct Note {
    pub span: Span,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub notes: Vec<Note>,
}

/// Accumulates diagnostics for a single typecheck/compile run.
///
/// Mirrors the teacher's `DiagMgr` (`report_span`/`report_error` call
/// convention), generalized to also collect notes attached to a primary
/// diagnostic (used by the type-mismatch explainer, see
/// `typecheck_module::maybe_explain_error`).
#[derive(Default)]
pub struct DiagMgr {
    diags: RefCell<Vec<Diagnostic>>,
}

impl DiagMgr {
    pub fn new() -> DiagMgr {
        DiagMgr::default()
    }

    pub fn report_span(&self, severity: Severity, message: impl Into<String>, span: Span) {
        self.diags.borrow_mut().push(Diagnostic {
            severity,
            message: message.into(),
            span,
            notes: Vec::new(),
        });
    }

    pub fn report_error(&self, message: impl Into<String>, span: Span) {
        self.report_span(Severity::Error, message, span);
    }

    pub fn report_with_notes(
        &self,
        severity: Severity,
        message: impl Into<String>,
        span: Span,
        notes: Vec<Note>,
    ) {
        self.diags.borrow_mut().push(Diagnostic { severity, message: message.into(), span, notes });
    }

    pub fn has_errors(&self) -> bool {
        self.diags
            .borrow()
            .iter()
            .any(|d| d.severity >= Severity::Error)
    }

    pub fn take(self) -> Vec<Diagnostic> {
        self.diags.into_inner()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diags.borrow().clone()
    }
}
