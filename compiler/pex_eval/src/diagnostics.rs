//! Evaluation diagnostics.
//!
//! Nothing in the evaluator fails with a `Result`: a missing key, a bad
//! regex or an overflow all evaluate to Null (or the caller's default).
//! What went wrong is reported here instead, through `tracing` and, when the
//! caller attached one, a [`DiagnosticSink`].
//!
//! Factory functions (e.g. [`unresolved_variable`]) are the public API; they
//! populate both `kind` and `message`.

use std::fmt;

use parking_lot::Mutex;

/// Typed diagnostic category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// No function matched and no provider knew the key.
    UnresolvedVariable { key: String },
    /// Unmatched brace or bracket, bad arity, leftover operands.
    MalformedExpression { expression: String, reason: String },
    /// Checked integer arithmetic overflowed.
    NumericOverflow { operation: String },
    InvalidRegex { pattern: String, error: String },
    /// A key was looked up while its own value was being evaluated.
    CycleDetected { key: String },
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedVariable { key } => write!(f, "unresolved variable: {key}"),
            Self::MalformedExpression { expression, reason } => {
                write!(f, "malformed expression `{expression}`: {reason}")
            }
            Self::NumericOverflow { operation } => write!(f, "numeric overflow in {operation}"),
            Self::InvalidRegex { pattern, error } => {
                write!(f, "invalid regular expression `{pattern}`: {error}")
            }
            Self::CycleDetected { key } => {
                write!(f, "cycle detected while evaluating variable: {key}")
            }
        }
    }
}

/// One reported problem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalDiagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl EvalDiagnostic {
    pub fn from_kind(kind: DiagnosticKind) -> Self {
        let message = kind.to_string();
        EvalDiagnostic { kind, message }
    }

    /// Log through `tracing`. Unresolved variables are routine (most
    /// templates probe optional keys) and go to debug; the rest warn.
    pub(crate) fn log(&self) {
        match &self.kind {
            DiagnosticKind::UnresolvedVariable { key } => {
                tracing::debug!(key = %key, "unresolved variable");
            }
            DiagnosticKind::MalformedExpression { expression, reason } => {
                tracing::warn!(expression = %expression, reason = %reason, "malformed expression");
            }
            DiagnosticKind::NumericOverflow { operation } => {
                tracing::warn!(operation = %operation, "numeric overflow");
            }
            DiagnosticKind::InvalidRegex { pattern, error } => {
                tracing::warn!(pattern = %pattern, error = %error, "invalid regular expression");
            }
            DiagnosticKind::CycleDetected { key } => {
                tracing::warn!(key = %key, "cycle detected");
            }
        }
    }
}

impl fmt::Display for EvalDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub fn unresolved_variable(key: &str) -> EvalDiagnostic {
    EvalDiagnostic::from_kind(DiagnosticKind::UnresolvedVariable {
        key: key.to_owned(),
    })
}

pub fn malformed_expression(expression: &str, reason: impl Into<String>) -> EvalDiagnostic {
    EvalDiagnostic::from_kind(DiagnosticKind::MalformedExpression {
        expression: expression.to_owned(),
        reason: reason.into(),
    })
}

pub fn numeric_overflow(operation: &str) -> EvalDiagnostic {
    EvalDiagnostic::from_kind(DiagnosticKind::NumericOverflow {
        operation: operation.to_owned(),
    })
}

pub fn invalid_regex(pattern: &str, error: &regex::Error) -> EvalDiagnostic {
    EvalDiagnostic::from_kind(DiagnosticKind::InvalidRegex {
        pattern: pattern.to_owned(),
        error: error.to_string(),
    })
}

pub fn cycle_detected(key: &str) -> EvalDiagnostic {
    EvalDiagnostic::from_kind(DiagnosticKind::CycleDetected {
        key: key.to_owned(),
    })
}

/// Collects diagnostics reported while evaluating with a context that
/// carries this sink. Shareable across threads.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    entries: Mutex<Vec<EvalDiagnostic>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, diagnostic: EvalDiagnostic) {
        self.entries.lock().push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drain everything collected so far.
    pub fn take(&self) -> Vec<EvalDiagnostic> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Copy of the collected diagnostics, oldest first.
    pub fn snapshot(&self) -> Vec<EvalDiagnostic> {
        self.entries.lock().clone()
    }
}
