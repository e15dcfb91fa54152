use std::ops::Range;

use calcdoc::document::DocumentError;
use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use thiserror::Error;

/// Why an operation refused to run. The stack and the document are left as
/// they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("Insufficient operands for {0}")]
    InsufficientOperands(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Modulo by zero")]
    ModuloByZero,

    #[error("Reciprocal of zero")]
    ReciprocalOfZero,

    #[error("Square root of negative number")]
    NegativeSquareRoot,

    /// Failure reason of a user-registered operation.
    #[error("{0}")]
    Custom(String),
}

impl OperationError {
    pub fn insufficient(operation: impl Into<String>) -> Self {
        OperationError::InsufficientOperands(operation.into())
    }
}

/// Outcome of an operation: the replacement stack, or why there is none.
pub type OperationResult = Result<Vec<f64>, OperationError>;

/// Failure reported by the host while applying a rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("document not open: {0}")]
    UnknownDocument(String),

    #[error("edit rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("timing set for unknown operator '{0}'")]
    UnknownOperator(String),
}

/// A failed operation, surfaced to the host's warning display.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    /// Document the operation was typed into.
    pub uri: String,
    /// Line holding the operator token.
    pub line: usize,
    /// Byte span of that line at the time of the failure.
    pub span: Range<usize>,
    pub error: OperationError,
}

impl Warning {
    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        Diagnostic::new(Severity::Warning)
            .with_message(self.to_string())
            .with_labels(vec![Label::primary(file_id, self.span.clone())])
    }
}

/// The message hosts show: `Calculator: <reason>`.
impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Calculator: {}", self.error)
    }
}
