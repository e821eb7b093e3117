//! Failure policies consulted after every operation of a patch.

use std::str::FromStr;

use serde_json::Value;

use crate::error::{PatchError, PatchOutcome};
use crate::operation::PatchOperation;
use crate::patch::Patch;

/// What a strategy sees after one operation has been applied.
///
/// Only `should_continue` is meant to be changed; the rest is context.
#[derive(Debug)]
pub struct PatchApplicationState<'a> {
    /// Outcome of the operation just applied.
    pub outcome: PatchOutcome,
    pub patch: &'a Patch,
    pub last_operation: &'a PatchOperation,
    /// Position of `last_operation` in `patch`.
    pub operation_index: usize,
    /// The document after `last_operation`.
    pub current_state: &'a Value,
    /// Set by the strategy. Starts out `true`.
    pub should_continue: bool,
}

/// Decides, after each operation, whether the patch keeps going.
pub trait PatchApplicationStrategy {
    fn evaluate(&mut self, state: &mut PatchApplicationState<'_>);
}

/// Stops at the first failed operation. This is the default policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HaltOnFailure;

impl PatchApplicationStrategy for HaltOnFailure {
    fn evaluate(&mut self, state: &mut PatchApplicationState<'_>) {
        state.should_continue = state.outcome.is_ok();
    }
}

/// Skips failed operations and keeps applying the rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IgnoreFailureAndContinue;

impl PatchApplicationStrategy for IgnoreFailureAndContinue {
    fn evaluate(&mut self, state: &mut PatchApplicationState<'_>) {
        state.should_continue = true;
    }
}

impl<F> PatchApplicationStrategy for F
where
    F: FnMut(&mut PatchApplicationState<'_>),
{
    fn evaluate(&mut self, state: &mut PatchApplicationState<'_>) {
        self(state)
    }
}

/// The built-in strategies as a plain config value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    #[default]
    Halt,
    Continue,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Halt => "halt",
            FailurePolicy::Continue => "continue",
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "halt" => Ok(FailurePolicy::Halt),
            "continue" => Ok(FailurePolicy::Continue),
            other => Err(PatchError::Invalid(format!("unknown failure policy \"{other}\""))),
        }
    }
}

impl PatchApplicationStrategy for FailurePolicy {
    fn evaluate(&mut self, state: &mut PatchApplicationState<'_>) {
        match self {
            FailurePolicy::Halt => HaltOnFailure.evaluate(state),
            FailurePolicy::Continue => IgnoreFailureAndContinue.evaluate(state),
        }
    }
}
