//! Apply logic for single operations.
//!
//! Every routine resolves its paths before it mutates anything, so a failed
//! operation leaves the document untouched.

use dom_path::{lookup, resolve_mut, ArrayPosition, ExistenceCheckFlags, Path, Slot};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{PatchError, PatchOutcome};
use crate::operation::PatchOperation;

const INSERT: ExistenceCheckFlags = ExistenceCheckFlags::ALLOW_END_OF_ARRAY;
const EXISTING: ExistenceCheckFlags = ExistenceCheckFlags::VERIFY_FULL_PATH;

/// A value detached from the tree together with where it sat in its parent
/// container, so it can be put back in place.
#[derive(Debug)]
pub(crate) struct Taken {
    pub(crate) value: Value,
    position: usize,
}

/// Writes `value` into a resolved slot. Array slots insert and shift the
/// later elements; object slots insert or overwrite.
fn fill_slot(slot: Slot<'_>, value: Value) {
    match slot {
        Slot::Root(root) => *root = value,
        Slot::Member { map, key } => {
            map.insert(key, value);
        }
        Slot::Element { array, position } => {
            let index = position.to_index(array.len());
            array.insert(index, value);
        }
    }
}

/// Detaches the value at `path`. Object removal keeps the order of the
/// remaining members.
pub(crate) fn take_at(doc: &mut Value, path: &Path) -> Result<Taken, PatchError> {
    match resolve_mut(doc, path, EXISTING)? {
        Slot::Root(_) => Err(PatchError::Invalid("cannot remove the document root".into())),
        Slot::Member { map, key } => {
            let position = map.keys().position(|k| *k == key);
            match (position, map.shift_remove(&key)) {
                (Some(position), Some(value)) => Ok(Taken { value, position }),
                _ => Err(PatchError::Missing(format!("no member \"{key}\" in \"{path}\""))),
            }
        }
        Slot::Element { array, position: ArrayPosition::Index(i) } => Ok(Taken {
            value: array.remove(i),
            position: i,
        }),
        Slot::Element { position: ArrayPosition::End, .. } => Err(PatchError::Invalid(format!(
            "'-' does not address an existing element in \"{path}\""
        ))),
    }
}

/// Puts a value detached by [`take_at`] back where it was.
fn restore_at(doc: &mut Value, path: &Path, taken: Taken) -> PatchOutcome {
    match resolve_mut(doc, path, ExistenceCheckFlags::DEFAULT)? {
        Slot::Member { map, key } => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            let position = taken.position.min(entries.len());
            entries.insert(position, (key, taken.value));
            *map = entries.into_iter().collect::<Map<String, Value>>();
        }
        Slot::Element { array, .. } => {
            let position = taken.position.min(array.len());
            array.insert(position, taken.value);
        }
        Slot::Root(root) => *root = taken.value,
    }
    Ok(())
}

pub(crate) fn apply_add(doc: &mut Value, path: &Path, value: Value) -> PatchOutcome {
    let slot = resolve_mut(doc, path, INSERT)?;
    fill_slot(slot, value);
    Ok(())
}

pub(crate) fn apply_remove(doc: &mut Value, path: &Path) -> Result<Value, PatchError> {
    take_at(doc, path).map(|taken| taken.value)
}

pub(crate) fn apply_replace(doc: &mut Value, path: &Path, value: Value) -> Result<Value, PatchError> {
    let target = resolve_mut(doc, path, EXISTING)?
        .into_mut()
        .ok_or_else(|| PatchError::Missing(format!("nothing to replace at \"{path}\"")))?;
    Ok(std::mem::replace(target, value))
}

pub(crate) fn apply_copy(doc: &mut Value, path: &Path, from: &Path) -> PatchOutcome {
    let value = lookup(doc, from)?.clone();
    apply_add(doc, path, value)
}

pub(crate) fn apply_move(doc: &mut Value, path: &Path, from: &Path) -> PatchOutcome {
    if from == path {
        lookup(doc, from)?;
        return Ok(());
    }
    if from.is_prefix_of(path) {
        return Err(PatchError::Invalid(format!(
            "cannot move \"{from}\" into its own subtree at \"{path}\""
        )));
    }
    let taken = take_at(doc, from)?;
    // The destination is interpreted against the document without the
    // source value.
    match resolve_mut(doc, path, INSERT) {
        Ok(slot) => {
            fill_slot(slot, taken.value);
            Ok(())
        }
        Err(err) => {
            restore_at(doc, from, taken)?;
            Err(err.into())
        }
    }
}

pub(crate) fn apply_test(doc: &Value, path: &Path, expected: &Value) -> PatchOutcome {
    let actual = lookup(doc, path)?;
    if actual == expected {
        Ok(())
    } else {
        Err(PatchError::TestFailed(format!(
            "value at \"{path}\" is {actual}, expected {expected}"
        )))
    }
}

impl PatchOperation {
    /// Apply this operation to `doc` in place.
    ///
    /// # Example
    ///
    /// ```
    /// use dom_patch::PatchOperation;
    /// use serde_json::json;
    ///
    /// let mut doc = json!({"arr": [1, 2]});
    /// PatchOperation::add("/arr/-".parse().unwrap(), 3).apply_in_place(&mut doc).unwrap();
    /// assert_eq!(doc, json!({"arr": [1, 2, 3]}));
    /// ```
    pub fn apply_in_place(&self, doc: &mut Value) -> PatchOutcome {
        trace!(op = self.op_name(), path = %self.destination_path(), "applying operation");
        self.validate()?;
        match self {
            PatchOperation::Add { path, value } => apply_add(doc, path, value.clone()),
            PatchOperation::Remove { path } => apply_remove(doc, path).map(drop),
            PatchOperation::Replace { path, value } => {
                apply_replace(doc, path, value.clone()).map(drop)
            }
            PatchOperation::Copy { path, from } => apply_copy(doc, path, from),
            PatchOperation::Move { path, from } => apply_move(doc, path, from),
            PatchOperation::Test { path, value } => apply_test(doc, path, value),
        }
    }

    /// Apply this operation to a copy of `doc` and return the copy.
    pub fn apply(&self, doc: &Value) -> Result<Value, PatchError> {
        let mut out = doc.clone();
        self.apply_in_place(&mut out)?;
        Ok(out)
    }

    /// Apply this operation, then rewrite any `-` in its stored paths into
    /// the concrete index the value ended up at.
    ///
    /// This mutates the operation; clone it first to keep the symbolic form.
    pub fn apply_and_denormalize(&mut self, doc: &mut Value) -> PatchOutcome {
        self.apply_in_place(doc)?;
        self.denormalize(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn p(s: &str) -> Path {
        s.parse().unwrap()
    }

    fn kind(result: PatchOutcome) -> ErrorKind {
        result.unwrap_err().kind()
    }

    #[test]
    fn add_to_object() {
        let mut doc = json!({});
        PatchOperation::add(p("/a"), 1).apply_in_place(&mut doc).unwrap();
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn add_overwrites_member_in_place() {
        let mut doc = json!({"a": 1, "b": 2});
        PatchOperation::add(p("/a"), 9).apply_in_place(&mut doc).unwrap();
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"a":9,"b":2}"#);
    }

    #[test]
    fn add_inserts_into_array() {
        let mut doc = json!([1, 2, 3]);
        PatchOperation::add(p("/1"), 99).apply_in_place(&mut doc).unwrap();
        assert_eq!(doc, json!([1, 99, 2, 3]));
    }

    #[test]
    fn add_past_end_is_invalid() {
        let mut doc = json!([1]);
        assert_eq!(kind(PatchOperation::add(p("/5"), 0).apply_in_place(&mut doc)), ErrorKind::Invalid);
        assert_eq!(doc, json!([1]));
    }

    #[test]
    fn add_missing_parent() {
        let mut doc = json!({});
        assert_eq!(kind(PatchOperation::add(p("/x/y"), 0).apply_in_place(&mut doc)), ErrorKind::Missing);
    }

    #[test]
    fn add_at_root_replaces_document() {
        let mut doc = json!({"a": 1});
        PatchOperation::add(Path::root(), json!([1])).apply_in_place(&mut doc).unwrap();
        assert_eq!(doc, json!([1]));
    }

    #[test]
    fn remove_keeps_member_order() {
        let mut doc = json!({"a": 1, "b": 2, "c": 3});
        PatchOperation::remove(p("/a")).apply_in_place(&mut doc).unwrap();
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"b":2,"c":3}"#);
    }

    #[test]
    fn remove_shifts_array() {
        let mut doc = json!([1, 2, 3]);
        PatchOperation::remove(p("/0")).apply_in_place(&mut doc).unwrap();
        assert_eq!(doc, json!([2, 3]));
    }

    #[test]
    fn remove_failures() {
        let mut doc = json!({"arr": [1]});
        assert_eq!(kind(PatchOperation::remove(p("/zz")).apply_in_place(&mut doc)), ErrorKind::Missing);
        assert_eq!(kind(PatchOperation::remove(p("/arr/1")).apply_in_place(&mut doc)), ErrorKind::Missing);
        assert_eq!(kind(PatchOperation::remove(p("/arr/-")).apply_in_place(&mut doc)), ErrorKind::Invalid);
        assert_eq!(kind(PatchOperation::remove(Path::root()).apply_in_place(&mut doc)), ErrorKind::Invalid);
    }

    #[test]
    fn replace_keeps_position() {
        let mut doc = json!({"a": 1, "b": [1, 2]});
        PatchOperation::replace(p("/a"), 2).apply_in_place(&mut doc).unwrap();
        PatchOperation::replace(p("/b/0"), 7).apply_in_place(&mut doc).unwrap();
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"a":2,"b":[7,2]}"#);
    }

    #[test]
    fn replace_missing() {
        let mut doc = json!({"a": 1});
        assert_eq!(kind(PatchOperation::replace(p("/b"), 2).apply_in_place(&mut doc)), ErrorKind::Missing);
    }

    #[test]
    fn copy_value() {
        let mut doc = json!({"a": {"x": 1}, "b": {}});
        PatchOperation::copy(p("/b/x"), p("/a/x")).apply_in_place(&mut doc).unwrap();
        assert_eq!(doc, json!({"a": {"x": 1}, "b": {"x": 1}}));
    }

    #[test]
    fn copy_missing_source() {
        let mut doc = json!({"a": 1});
        assert_eq!(kind(PatchOperation::copy(p("/b"), p("/zz")).apply_in_place(&mut doc)), ErrorKind::Missing);
    }

    #[test]
    fn move_value() {
        let mut doc = json!({"a": 1, "b": 2});
        PatchOperation::move_op(p("/c"), p("/a")).apply_in_place(&mut doc).unwrap();
        assert_eq!(doc, json!({"b": 2, "c": 1}));
    }

    #[test]
    fn move_within_array_uses_post_removal_indices() {
        let mut doc = json!([1, 2, 3]);
        PatchOperation::move_op(p("/-"), p("/0")).apply_in_place(&mut doc).unwrap();
        assert_eq!(doc, json!([2, 3, 1]));
    }

    #[test]
    fn move_into_own_subtree_is_invalid() {
        let mut doc = json!({"a": {"b": {}}});
        let result = PatchOperation::move_op(p("/a/b/c"), p("/a")).apply_in_place(&mut doc);
        assert_eq!(kind(result), ErrorKind::Invalid);
        assert_eq!(doc, json!({"a": {"b": {}}}));
    }

    #[test]
    fn move_onto_itself_is_noop() {
        let mut doc = json!({"a": 1});
        PatchOperation::move_op(p("/a"), p("/a")).apply_in_place(&mut doc).unwrap();
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn failed_move_restores_source() {
        let mut doc = json!({"a": 1, "b": 2, "c": 3});
        let result = PatchOperation::move_op(p("/zz/q"), p("/b")).apply_in_place(&mut doc);
        assert_eq!(kind(result), ErrorKind::Missing);
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"a":1,"b":2,"c":3}"#);
    }

    #[test]
    fn test_pass_and_fail() {
        let mut doc = json!({"a": [1, {"b": null}]});
        PatchOperation::test(p("/a/1"), json!({"b": null})).apply_in_place(&mut doc).unwrap();
        let result = PatchOperation::test(p("/a/0"), 2).apply_in_place(&mut doc);
        assert_eq!(kind(result), ErrorKind::TestFailed);
        let result = PatchOperation::test(p("/q"), 2).apply_in_place(&mut doc);
        assert_eq!(kind(result), ErrorKind::Missing);
        assert_eq!(doc, json!({"a": [1, {"b": null}]}));
    }

    #[test]
    fn apply_leaves_input_untouched() {
        let doc = json!({"a": 1});
        let out = PatchOperation::remove(p("/a")).apply(&doc).unwrap();
        assert_eq!(doc, json!({"a": 1}));
        assert_eq!(out, json!({}));
    }

    #[test]
    fn apply_and_denormalize_rewrites_path() {
        let mut doc = json!({"arr": [1, 2]});
        let mut op = PatchOperation::add(p("/arr/-"), 3);
        op.apply_and_denormalize(&mut doc).unwrap();
        assert_eq!(doc, json!({"arr": [1, 2, 3]}));
        assert_eq!(op.destination_path(), &p("/arr/2"));
        assert!(!op.contains_normalized_entries());
    }

    #[test]
    fn failed_apply_and_denormalize_keeps_symbolic_path() {
        let mut doc = json!({"arr": 5});
        let mut op = PatchOperation::add(p("/arr/-"), 3);
        assert_eq!(kind(op.apply_and_denormalize(&mut doc)), ErrorKind::TypeMismatch);
        assert!(op.contains_normalized_entries());
    }
}
