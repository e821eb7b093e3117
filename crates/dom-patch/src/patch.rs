//! Ordered operation sequences and their application loop.

use std::ops::{ControlFlow, Index};

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{OperationFailure, PatchError, PatchOutcome};
use crate::operation::PatchOperation;
use crate::strategy::{PatchApplicationState, PatchApplicationStrategy};

/// An ordered sequence of [`PatchOperation`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    operations: Vec<PatchOperation>,
}

/// The document produced by [`Patch::apply`] together with its outcome.
///
/// `doc` holds every operation that was applied, even when `outcome` is an
/// error.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchResult {
    pub doc: Value,
    pub outcome: PatchOutcome,
}

impl PatchResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Returns the document if every operation succeeded.
    pub fn into_result(self) -> Result<Value, PatchError> {
        self.outcome.map(|()| self.doc)
    }
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, op: PatchOperation) {
        self.operations.push(op);
    }

    pub fn push_front(&mut self, op: PatchOperation) {
        self.operations.insert(0, op);
    }

    pub fn pop_back(&mut self) -> Option<PatchOperation> {
        self.operations.pop()
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }

    pub fn get(&self, index: usize) -> Option<&PatchOperation> {
        self.operations.get(index)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatchOperation> {
        self.operations.iter()
    }

    pub fn operations(&self) -> &[PatchOperation] {
        &self.operations
    }

    /// Returns true if any operation still holds a `-` marker.
    pub fn contains_normalized_entries(&self) -> bool {
        self.operations.iter().any(PatchOperation::contains_normalized_entries)
    }

    /// Apply every operation to `root` in order, consulting `strategy` after
    /// each one.
    ///
    /// There is no rollback: when the strategy stops the patch, `root` keeps
    /// the operations applied so far. Failures the strategy tolerated are
    /// reported together as [`PatchError::Aggregate`].
    ///
    /// # Example
    ///
    /// ```
    /// use dom_patch::{HaltOnFailure, Patch, PatchOperation};
    /// use serde_json::json;
    ///
    /// let patch: Patch = vec![
    ///     PatchOperation::test("/a".parse().unwrap(), 1),
    ///     PatchOperation::add("/b".parse().unwrap(), 2),
    /// ]
    /// .into();
    ///
    /// let mut doc = json!({"a": 1});
    /// patch.apply_in_place(&mut doc, &mut HaltOnFailure).unwrap();
    /// assert_eq!(doc, json!({"a": 1, "b": 2}));
    /// ```
    pub fn apply_in_place<S>(&self, root: &mut Value, strategy: &mut S) -> PatchOutcome
    where
        S: PatchApplicationStrategy + ?Sized,
    {
        let mut failures = Vec::new();
        for (index, op) in self.operations.iter().enumerate() {
            trace!(index, op = op.op_name(), "patch step");
            let outcome = op.apply_in_place(root);
            if let ControlFlow::Break(outcome) =
                evaluate_step(strategy, self, index, outcome, root, &mut failures)
            {
                return outcome;
            }
        }
        finish(failures)
    }

    /// Apply to a copy of `root`. The copy is returned even on failure.
    pub fn apply<S>(&self, root: &Value, strategy: &mut S) -> PatchResult
    where
        S: PatchApplicationStrategy + ?Sized,
    {
        let mut doc = root.clone();
        let outcome = self.apply_in_place(&mut doc, strategy);
        PatchResult { doc, outcome }
    }

    /// Like [`Patch::apply_in_place`], but every operation that succeeds has
    /// its `-` markers rewritten into concrete indices.
    pub fn apply_and_denormalize<S>(&mut self, root: &mut Value, strategy: &mut S) -> PatchOutcome
    where
        S: PatchApplicationStrategy + ?Sized,
    {
        let mut failures = Vec::new();
        for index in 0..self.operations.len() {
            let op = &mut self.operations[index];
            trace!(index, op = op.op_name(), "patch step");
            let outcome = op.apply_and_denormalize(root);
            if let ControlFlow::Break(outcome) =
                evaluate_step(strategy, self, index, outcome, root, &mut failures)
            {
                return outcome;
            }
        }
        finish(failures)
    }

    /// Compute a patch that undoes this one.
    ///
    /// `state_before` is the document this patch is (or was) applied to.
    /// Every operation must succeed on it; the first one that does not
    /// fails the whole inversion. The result lists the per-operation
    /// inverses in reverse order.
    pub fn get_inverse(&self, state_before: &Value) -> Result<Patch, PatchError> {
        let mut scratch = state_before.clone();
        let mut groups = Vec::with_capacity(self.operations.len());
        for (index, op) in self.operations.iter().enumerate() {
            let step = op
                .get_inverse(&scratch)
                .and_then(|inverse| op.apply_in_place(&mut scratch).map(|()| inverse));
            match step {
                Ok(inverse) => groups.push(inverse),
                Err(error) => {
                    debug!(index, %error, "cannot invert patch");
                    return Err(error);
                }
            }
        }
        Ok(groups.into_iter().rev().flatten().collect())
    }
}

/// Hands one outcome to the strategy and records what it decided.
fn evaluate_step<S>(
    strategy: &mut S,
    patch: &Patch,
    index: usize,
    outcome: PatchOutcome,
    doc: &Value,
    failures: &mut Vec<OperationFailure>,
) -> ControlFlow<PatchOutcome>
where
    S: PatchApplicationStrategy + ?Sized,
{
    if let Err(error) = &outcome {
        debug!(index, %error, "operation failed");
    }
    let mut state = PatchApplicationState {
        outcome,
        patch,
        last_operation: &patch.operations[index],
        operation_index: index,
        current_state: doc,
        should_continue: true,
    };
    strategy.evaluate(&mut state);
    let PatchApplicationState { outcome, should_continue, .. } = state;

    match (outcome, should_continue) {
        (Ok(()), true) => ControlFlow::Continue(()),
        (Err(error), true) => {
            failures.push(OperationFailure { index, error });
            ControlFlow::Continue(())
        }
        (outcome, false) => {
            debug!(index, "strategy halted patch");
            let outcome = match outcome {
                Err(error) if failures.is_empty() => Err(error),
                Err(error) => {
                    failures.push(OperationFailure { index, error });
                    finish(std::mem::take(failures))
                }
                Ok(()) => finish(std::mem::take(failures)),
            };
            ControlFlow::Break(outcome)
        }
    }
}

fn finish(failures: Vec<OperationFailure>) -> PatchOutcome {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(PatchError::Aggregate(failures))
    }
}

impl Index<usize> for Patch {
    type Output = PatchOperation;

    fn index(&self, index: usize) -> &PatchOperation {
        &self.operations[index]
    }
}

impl From<Vec<PatchOperation>> for Patch {
    fn from(operations: Vec<PatchOperation>) -> Self {
        Patch { operations }
    }
}

impl FromIterator<PatchOperation> for Patch {
    fn from_iter<I: IntoIterator<Item = PatchOperation>>(iter: I) -> Self {
        Patch { operations: iter.into_iter().collect() }
    }
}

impl Extend<PatchOperation> for Patch {
    fn extend<I: IntoIterator<Item = PatchOperation>>(&mut self, iter: I) {
        self.operations.extend(iter);
    }
}

impl IntoIterator for Patch {
    type Item = PatchOperation;
    type IntoIter = std::vec::IntoIter<PatchOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

impl<'a> IntoIterator for &'a Patch {
    type Item = &'a PatchOperation;
    type IntoIter = std::slice::Iter<'a, PatchOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{HaltOnFailure, IgnoreFailureAndContinue};
    use serde_json::json;

    fn op(s: &str, value: i64) -> PatchOperation {
        PatchOperation::add(s.parse().unwrap(), value)
    }

    #[test]
    fn sequence_api() {
        let mut patch = Patch::new();
        assert!(patch.is_empty());
        patch.push_back(op("/b", 2));
        patch.push_front(op("/a", 1));
        patch.extend([op("/c", 3)]);
        assert_eq!(patch.len(), 3);
        assert_eq!(patch[0], op("/a", 1));
        assert_eq!(patch.get(2), Some(&op("/c", 3)));
        assert_eq!(patch.get(3), None);
        assert_eq!(patch.pop_back(), Some(op("/c", 3)));
        let names: Vec<String> = patch.iter().map(|o| o.destination_path().to_string()).collect();
        assert_eq!(names, ["/a", "/b"]);
        patch.clear();
        assert!(patch.is_empty());
    }

    #[test]
    fn empty_patch_is_ok() {
        let mut doc = json!({"a": 1});
        assert_eq!(Patch::new().apply_in_place(&mut doc, &mut HaltOnFailure), Ok(()));
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn halt_returns_plain_error() {
        let patch: Patch = vec![op("/a", 1), PatchOperation::remove("/zz".parse().unwrap()), op("/c", 3)].into();
        let result = patch.apply(&json!({}), &mut HaltOnFailure);
        assert_eq!(result.doc, json!({"a": 1}));
        assert!(matches!(result.outcome, Err(PatchError::Missing(_))));
    }

    #[test]
    fn continue_aggregates_failures() {
        let patch: Patch = vec![
            PatchOperation::remove("/x".parse().unwrap()),
            op("/a", 1),
            PatchOperation::remove("/y".parse().unwrap()),
        ]
        .into();
        let result = patch.apply(&json!({}), &mut IgnoreFailureAndContinue);
        assert_eq!(result.doc, json!({"a": 1}));
        match result.outcome {
            Err(PatchError::Aggregate(failures)) => {
                let indices: Vec<usize> = failures.iter().map(|f| f.index).collect();
                assert_eq!(indices, [0, 2]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn strategy_can_override_outcome() {
        let patch: Patch = vec![PatchOperation::remove("/x".parse().unwrap()), op("/a", 1)].into();
        fn forgive(state: &mut PatchApplicationState<'_>) {
            state.outcome = Ok(());
            state.should_continue = true;
        }
        let result = patch.apply(&json!({}), &mut forgive);
        assert_eq!(result.into_result(), Ok(json!({"a": 1})));
    }

    #[test]
    fn inverse_reverses_groups() {
        let patch: Patch = vec![op("/a", 1), op("/b", 2)].into();
        let inverse = patch.get_inverse(&json!({})).unwrap();
        let paths: Vec<String> = inverse.iter().map(|o| o.destination_path().to_string()).collect();
        assert_eq!(paths, ["/b", "/a"]);
    }

    #[test]
    fn inverse_of_move_onto_root() {
        let before = json!({"a": {"b": 1}, "c": 2});
        let patch: Patch = vec![
            PatchOperation::move_op(dom_path::Path::root(), "/a".parse().unwrap()),
            op("/d", 4),
        ]
        .into();
        let after = patch.apply(&before, &mut HaltOnFailure).into_result().unwrap();
        assert_eq!(after, json!({"b": 1, "d": 4}));
        let inverse = patch.get_inverse(&before).unwrap();
        assert_eq!(inverse.apply(&after, &mut HaltOnFailure).into_result(), Ok(before));
    }

    #[test]
    fn inverse_fails_when_patch_fails() {
        let patch: Patch = vec![op("/a", 1), PatchOperation::remove("/zz".parse().unwrap())].into();
        assert!(matches!(patch.get_inverse(&json!({})), Err(PatchError::Missing(_))));
    }
}
