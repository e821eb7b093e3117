//! The atomic mutation descriptor.

use std::fmt;
use std::str::FromStr;

use dom_path::{denormalize_path, validate_destination, validate_source, Path};
use serde_json::Value;
use tracing::debug;

use crate::error::{PatchError, PatchOutcome};

/// The six operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchOperationType {
    Add,
    Remove,
    Replace,
    Copy,
    Move,
    Test,
}

impl PatchOperationType {
    /// The `op` name used in the structural representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchOperationType::Add => "add",
            PatchOperationType::Remove => "remove",
            PatchOperationType::Replace => "replace",
            PatchOperationType::Copy => "copy",
            PatchOperationType::Move => "move",
            PatchOperationType::Test => "test",
        }
    }
}

impl FromStr for PatchOperationType {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(PatchOperationType::Add),
            "remove" => Ok(PatchOperationType::Remove),
            "replace" => Ok(PatchOperationType::Replace),
            "copy" => Ok(PatchOperationType::Copy),
            "move" => Ok(PatchOperationType::Move),
            "test" => Ok(PatchOperationType::Test),
            other => Err(PatchError::Invalid(format!("unknown operation \"{other}\""))),
        }
    }
}

impl fmt::Display for PatchOperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single patch operation.
///
/// Each variant carries exactly the payload its kind needs: a value for
/// `Add`, `Replace` and `Test`, a source path (`from`) for `Copy` and
/// `Move`, nothing for `Remove`. `path` is always the destination.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOperation {
    Add { path: Path, value: Value },
    Remove { path: Path },
    Replace { path: Path, value: Value },
    Copy { path: Path, from: Path },
    Move { path: Path, from: Path },
    Test { path: Path, value: Value },
}

/// Borrowed view of an operation's payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload<'a> {
    None,
    Value(&'a Value),
    Source(&'a Path),
}

impl PatchOperation {
    pub fn add(path: Path, value: impl Into<Value>) -> Self {
        PatchOperation::Add { path, value: value.into() }
    }

    pub fn remove(path: Path) -> Self {
        PatchOperation::Remove { path }
    }

    pub fn replace(path: Path, value: impl Into<Value>) -> Self {
        PatchOperation::Replace { path, value: value.into() }
    }

    pub fn copy(path: Path, from: Path) -> Self {
        PatchOperation::Copy { path, from }
    }

    pub fn move_op(path: Path, from: Path) -> Self {
        PatchOperation::Move { path, from }
    }

    pub fn test(path: Path, value: impl Into<Value>) -> Self {
        PatchOperation::Test { path, value: value.into() }
    }

    pub fn op_type(&self) -> PatchOperationType {
        match self {
            PatchOperation::Add { .. } => PatchOperationType::Add,
            PatchOperation::Remove { .. } => PatchOperationType::Remove,
            PatchOperation::Replace { .. } => PatchOperationType::Replace,
            PatchOperation::Copy { .. } => PatchOperationType::Copy,
            PatchOperation::Move { .. } => PatchOperationType::Move,
            PatchOperation::Test { .. } => PatchOperationType::Test,
        }
    }

    /// Returns the operation name string (`"add"`, `"move"`, ...).
    #[inline]
    pub fn op_name(&self) -> &'static str {
        self.op_type().as_str()
    }

    /// Returns the destination path of the operation.
    pub fn destination_path(&self) -> &Path {
        match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Replace { path, .. }
            | PatchOperation::Copy { path, .. }
            | PatchOperation::Move { path, .. }
            | PatchOperation::Test { path, .. } => path,
        }
    }

    pub fn destination_path_mut(&mut self) -> &mut Path {
        match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Replace { path, .. }
            | PatchOperation::Copy { path, .. }
            | PatchOperation::Move { path, .. }
            | PatchOperation::Test { path, .. } => path,
        }
    }

    /// Returns the source path of a `Copy` or `Move`.
    pub fn source_path(&self) -> Option<&Path> {
        match self.payload() {
            Payload::Source(from) => Some(from),
            _ => None,
        }
    }

    pub fn source_path_mut(&mut self) -> Option<&mut Path> {
        match self {
            PatchOperation::Copy { from, .. } | PatchOperation::Move { from, .. } => Some(from),
            _ => None,
        }
    }

    /// Returns the value carried by an `Add`, `Replace` or `Test`.
    pub fn value(&self) -> Option<&Value> {
        match self.payload() {
            Payload::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn payload(&self) -> Payload<'_> {
        match self {
            PatchOperation::Add { value, .. }
            | PatchOperation::Replace { value, .. }
            | PatchOperation::Test { value, .. } => Payload::Value(value),
            PatchOperation::Copy { from, .. } | PatchOperation::Move { from, .. } => {
                Payload::Source(from)
            }
            PatchOperation::Remove { .. } => Payload::None,
        }
    }

    /// Returns true if the destination or source still holds a `-` marker.
    pub fn contains_normalized_entries(&self) -> bool {
        self.destination_path().contains_normalized_entries()
            || self
                .source_path()
                .is_some_and(Path::contains_normalized_entries)
    }

    /// Checks the structural path rules before the operation touches a
    /// document: `-` only as the last destination entry, never in a source.
    pub fn validate(&self) -> PatchOutcome {
        let path = self.destination_path();
        validate_destination(path)?;
        if let Some(from) = self.source_path() {
            validate_source(from)?;
        }
        Ok(())
    }

    /// Rewrites `-` markers into concrete indices using `reference`, the
    /// document after this operation was applied.
    pub fn denormalize(&mut self, reference: &Value) -> PatchOutcome {
        let op = self.op_name();
        let path = self.destination_path_mut();
        if path.contains_normalized_entries() {
            let concrete = denormalize_path(path, reference)?;
            debug!(op, from = %path, to = %concrete, "denormalized destination path");
            *path = concrete;
        }
        if let Some(from) = self.source_path_mut() {
            if from.contains_normalized_entries() {
                *from = denormalize_path(from, reference)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for PatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payload() {
            Payload::None => write!(f, "{} {}", self.op_name(), self.destination_path()),
            Payload::Value(value) => {
                write!(f, "{} {} {value}", self.op_name(), self.destination_path())
            }
            Payload::Source(from) => {
                write!(f, "{} {} from {from}", self.op_name(), self.destination_path())
            }
        }
    }
}
