//! Error and outcome types for the patch engine.

use dom_path::PathError;
use thiserror::Error;

/// Fieldless classification of a [`PatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Missing,
    Invalid,
    TypeMismatch,
    TestFailed,
    Unsupported,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatchError {
    /// A required path segment does not exist.
    #[error("MISSING: {0}")]
    Missing(String),
    /// A path segment is invalid for its container, a move targets its own
    /// subtree, or a serialized operation is malformed.
    #[error("INVALID: {0}")]
    Invalid(String),
    #[error("TYPE_MISMATCH: {0}")]
    TypeMismatch(String),
    #[error("TEST_FAILED: {0}")]
    TestFailed(String),
    #[error("UNSUPPORTED: {0}")]
    Unsupported(String),
    /// Failures tolerated by a continuing strategy, in application order.
    #[error("{} operation(s) failed: {}", .0.len(), join_failures(.0))]
    Aggregate(Vec<OperationFailure>),
}

/// A failed operation inside a patch, with its position.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("[{index}] {error}")]
pub struct OperationFailure {
    pub index: usize,
    pub error: PatchError,
}

fn join_failures(failures: &[OperationFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl PatchError {
    /// The error kind. An aggregate reports the kind of its first failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PatchError::Missing(_) => ErrorKind::Missing,
            PatchError::Invalid(_) => ErrorKind::Invalid,
            PatchError::TypeMismatch(_) => ErrorKind::TypeMismatch,
            PatchError::TestFailed(_) => ErrorKind::TestFailed,
            PatchError::Unsupported(_) => ErrorKind::Unsupported,
            PatchError::Aggregate(failures) => failures
                .first()
                .map_or(ErrorKind::Invalid, |f| f.error.kind()),
        }
    }
}

impl From<PathError> for PatchError {
    fn from(e: PathError) -> Self {
        match e {
            PathError::Missing(m) => PatchError::Missing(m),
            PathError::Invalid(m) | PathError::Malformed(m) => PatchError::Invalid(m),
            PathError::TypeMismatch(m) => PatchError::TypeMismatch(m),
            PathError::Unsupported(m) => PatchError::Unsupported(m),
        }
    }
}

/// Result of applying an operation or a patch.
pub type PatchOutcome = Result<(), PatchError>;
