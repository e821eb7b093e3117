//! Inverse derivation for undo.

use dom_path::{lookup, EntryView, Path, PathEntry};
use serde_json::Value;
use smallvec::SmallVec;

use crate::apply::take_at;
use crate::error::PatchError;
use crate::operation::PatchOperation;

/// The 0-2 operations that undo one operation.
pub type InverseOperations = SmallVec<[PatchOperation; 2]>;

/// Where an insert through `path` lands in `state`, and the value it
/// overwrites there (if any). The returned path never contains `-`.
fn insertion_target(path: &Path, state: &Value) -> Result<(Path, Option<Value>), PatchError> {
    let Some((last, parent_entries)) = path.split_last() else {
        return Ok((Path::root(), Some(state.clone())));
    };
    let parent_path = Path::from_entries(parent_entries.to_vec());
    match lookup(state, &parent_path)? {
        Value::Array(array) => {
            let index = match last.view() {
                EntryView::EndOfArray => array.len(),
                EntryView::Index(i) if i <= array.len() => i,
                EntryView::Index(i) => {
                    return Err(PatchError::Invalid(format!(
                        "index {i} is past the end (length {}) in \"{path}\"",
                        array.len()
                    )))
                }
                EntryView::Key(k) => {
                    return Err(PatchError::Invalid(format!(
                        "\"{k}\" is not a valid array index in \"{path}\""
                    )))
                }
            };
            Ok((parent_path.join(PathEntry::Index(index)), None))
        }
        Value::Object(_) => {
            if last.is_end_of_array() {
                return Err(PatchError::TypeMismatch(format!(
                    "'-' addresses an array but \"{path}\" reaches an object"
                )));
            }
            Ok((path.clone(), lookup(state, path).ok().cloned()))
        }
        _ => Err(PatchError::TypeMismatch(format!(
            "\"{parent_path}\" is not a container in \"{path}\""
        ))),
    }
}

/// Undo for an insert (`Add` / `Copy`) through `path`.
fn invert_insert(path: &Path, before: &Value) -> Result<InverseOperations, PatchError> {
    let (target, overwritten) = insertion_target(path, before)?;
    let undo = match overwritten {
        Some(old) => PatchOperation::replace(target, old),
        None => PatchOperation::remove(target),
    };
    Ok(smallvec::smallvec![undo])
}

fn invert_move(path: &Path, from: &Path, before: &Value) -> Result<InverseOperations, PatchError> {
    if from == path {
        lookup(before, from)?;
        return Ok(InverseOperations::new());
    }
    if from.is_prefix_of(path) {
        return Err(PatchError::Invalid(format!(
            "cannot move \"{from}\" into its own subtree at \"{path}\""
        )));
    }
    let moved = lookup(before, from)?;
    if path.is_empty() {
        return Ok(smallvec::smallvec![PatchOperation::replace(Path::root(), before.clone())]);
    }
    // The destination is resolved after the source is gone.
    let mut detached = before.clone();
    take_at(&mut detached, from)?;
    let (target, overwritten) = insertion_target(path, &detached)?;

    let mut inverse = InverseOperations::new();
    match overwritten {
        // Put the old value back first; `target` is only valid in the
        // document that still lacks the source.
        Some(old) => {
            inverse.push(PatchOperation::replace(target, old));
            inverse.push(PatchOperation::add(from.clone(), moved.clone()));
        }
        // Moving back would land inside the value being moved.
        None if target.is_prefix_of(from) => {
            inverse.push(PatchOperation::remove(target));
            inverse.push(PatchOperation::add(from.clone(), moved.clone()));
        }
        None => inverse.push(PatchOperation::move_op(from.clone(), target)),
    }
    Ok(inverse)
}

impl PatchOperation {
    /// Compute the operations that undo this one.
    ///
    /// `state_before` must be the document as it was *before* this operation
    /// was applied; the engine does not snapshot it. Applying the result
    /// after this operation restores `state_before`. The returned paths are
    /// always concrete.
    ///
    /// # Example
    ///
    /// ```
    /// use dom_patch::PatchOperation;
    /// use serde_json::json;
    ///
    /// let before = json!({"a": 1});
    /// let op = PatchOperation::replace("/a".parse().unwrap(), 2);
    /// let after = op.apply(&before).unwrap();
    ///
    /// let inverse = op.get_inverse(&before).unwrap();
    /// assert_eq!(inverse.as_slice(), &[PatchOperation::replace("/a".parse().unwrap(), 1)]);
    /// assert_eq!(inverse[0].apply(&after).unwrap(), before);
    /// ```
    pub fn get_inverse(&self, state_before: &Value) -> Result<InverseOperations, PatchError> {
        self.validate()?;
        match self {
            PatchOperation::Add { path, .. } => invert_insert(path, state_before),
            PatchOperation::Copy { path, from } => {
                lookup(state_before, from)?;
                invert_insert(path, state_before)
            }
            PatchOperation::Remove { path } => {
                if path.is_empty() {
                    return Err(PatchError::Invalid("cannot remove the document root".into()));
                }
                let old = lookup(state_before, path)?;
                Ok(smallvec::smallvec![PatchOperation::add(path.clone(), old.clone())])
            }
            PatchOperation::Replace { path, .. } => {
                let old = lookup(state_before, path)?;
                Ok(smallvec::smallvec![PatchOperation::replace(path.clone(), old.clone())])
            }
            PatchOperation::Move { path, from } => invert_move(path, from, state_before),
            PatchOperation::Test { .. } => Ok(InverseOperations::new()),
        }
    }
}
