//! Resolution of paths against a value tree.
//!
//! Resolution stops at the *parent* of the final entry and hands back a
//! [`Slot`], so callers can insert into, overwrite, or erase that slot.

use std::borrow::Cow;
use std::ops::{BitOr, BitOrAssign};

use serde_json::{Map, Value};

use crate::types::{EntryView, Path, PathEntry};
use crate::PathError;

/// Controls how strictly the final slot of a path is checked.
///
/// Flags combine with `|`.
///
/// ```
/// use dom_path::ExistenceCheckFlags;
///
/// let flags = ExistenceCheckFlags::VERIFY_FULL_PATH | ExistenceCheckFlags::ALLOW_END_OF_ARRAY;
/// assert!(flags.contains(ExistenceCheckFlags::VERIFY_FULL_PATH));
/// assert!(!ExistenceCheckFlags::DEFAULT.contains(ExistenceCheckFlags::ALLOW_END_OF_ARRAY));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExistenceCheckFlags(u8);

impl ExistenceCheckFlags {
    /// Only the parent of the final entry has to exist.
    pub const DEFAULT: Self = Self(0);
    /// The final slot must already hold a value.
    pub const VERIFY_FULL_PATH: Self = Self(1);
    /// `-` is accepted as the final entry of a path into an array.
    pub const ALLOW_END_OF_ARRAY: Self = Self(1 << 1);

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for ExistenceCheckFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for ExistenceCheckFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Where in an array a [`Slot`] points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayPosition {
    Index(usize),
    End,
}

impl ArrayPosition {
    /// The concrete index this position denotes in an array of `len`
    /// elements (the insert point for `End`).
    #[inline]
    pub fn to_index(self, len: usize) -> usize {
        match self {
            ArrayPosition::Index(i) => i,
            ArrayPosition::End => len,
        }
    }
}

/// A resolved location: the parent container plus the final entry.
#[derive(Debug)]
pub enum Slot<'a> {
    /// The empty path: the document itself.
    Root(&'a mut Value),
    /// A member slot of an object. The key may or may not be present.
    Member {
        map: &'a mut Map<String, Value>,
        key: String,
    },
    /// An element slot of an array.
    Element {
        array: &'a mut Vec<Value>,
        position: ArrayPosition,
    },
}

impl<'a> Slot<'a> {
    /// The value currently stored in the slot, if any.
    pub fn get(&self) -> Option<&Value> {
        match self {
            Slot::Root(v) => Some(&**v),
            Slot::Member { map, key } => map.get(key),
            Slot::Element { array, position } => match position {
                ArrayPosition::Index(i) => array.get(*i),
                ArrayPosition::End => None,
            },
        }
    }

    /// Returns true if the slot currently holds a value.
    #[inline]
    pub fn exists(&self) -> bool {
        self.get().is_some()
    }

    /// Consumes the slot, returning a mutable reference to its value.
    pub fn into_mut(self) -> Option<&'a mut Value> {
        match self {
            Slot::Root(v) => Some(v),
            Slot::Member { map, key } => map.get_mut(&key),
            Slot::Element { array, position } => match position {
                ArrayPosition::Index(i) => array.get_mut(i),
                ArrayPosition::End => None,
            },
        }
    }
}

/// Text used to look an entry up in an object.
fn member_key<'e>(entry: &'e PathEntry, path: &Path) -> Result<Cow<'e, str>, PathError> {
    match entry {
        PathEntry::Key(k) if k != "-" => Ok(Cow::Borrowed(k.as_str())),
        PathEntry::Index(i) => Ok(Cow::Owned(i.to_string())),
        _ => Err(PathError::TypeMismatch(format!(
            "'-' addresses an array but \"{path}\" reaches an object"
        ))),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Index of an interior entry into an array of `len` elements.
fn interior_index(entry: &PathEntry, len: usize, path: &Path) -> Result<usize, PathError> {
    match entry.view() {
        EntryView::Index(i) if i < len => Ok(i),
        EntryView::Index(i) => Err(PathError::Invalid(format!(
            "index {i} is out of bounds (length {len}) in \"{path}\""
        ))),
        EntryView::EndOfArray => Err(PathError::Invalid(format!(
            "'-' may only be the last entry of \"{path}\""
        ))),
        EntryView::Key(k) => Err(PathError::Invalid(format!(
            "\"{k}\" is not a valid array index in \"{path}\""
        ))),
    }
}

fn not_a_container(value: &Value, entry: &PathEntry, path: &Path) -> PathError {
    PathError::TypeMismatch(format!(
        "cannot descend into a {} with \"{entry}\" in \"{path}\"",
        kind_name(value)
    ))
}

fn step<'v>(node: &'v Value, entry: &PathEntry, path: &Path) -> Result<&'v Value, PathError> {
    match node {
        Value::Object(map) => {
            let key = member_key(entry, path)?;
            map.get(key.as_ref()).ok_or_else(|| {
                PathError::Missing(format!("no member \"{key}\" in \"{path}\""))
            })
        }
        Value::Array(array) => interior_index(entry, array.len(), path).map(|i| &array[i]),
        _ => Err(not_a_container(node, entry, path)),
    }
}

fn walk_mut<'v>(
    root: &'v mut Value,
    entries: &[PathEntry],
    path: &Path,
) -> Result<&'v mut Value, PathError> {
    let mut current = root;
    for entry in entries {
        let node = current;
        current = match node {
            Value::Object(map) => {
                let key = member_key(entry, path)?;
                map.get_mut(key.as_ref()).ok_or_else(|| {
                    PathError::Missing(format!("no member \"{key}\" in \"{path}\""))
                })?
            }
            Value::Array(array) => {
                let i = interior_index(entry, array.len(), path)?;
                &mut array[i]
            }
            other => return Err(not_a_container(other, entry, path)),
        };
    }
    Ok(current)
}

/// Resolve `path` against `root`, stopping at the final slot.
///
/// Interior entries must all exist. Errors are reported for the first
/// offending entry, walking left to right. The final entry is then checked
/// in this order: the parent's container kind, the eligibility of `-`
/// (which needs [`ExistenceCheckFlags::ALLOW_END_OF_ARRAY`]), and finally
/// existence (with [`ExistenceCheckFlags::VERIFY_FULL_PATH`]). The append
/// point counts as existing whenever `-` is allowed.
///
/// # Example
///
/// ```
/// use dom_path::{resolve_mut, ExistenceCheckFlags, Path, Slot};
/// use serde_json::json;
///
/// let mut doc = json!({"arr": [1, 2]});
/// let path: Path = "/arr/-".parse().unwrap();
/// match resolve_mut(&mut doc, &path, ExistenceCheckFlags::ALLOW_END_OF_ARRAY).unwrap() {
///     Slot::Element { array, .. } => array.push(json!(3)),
///     _ => unreachable!(),
/// }
/// assert_eq!(doc, json!({"arr": [1, 2, 3]}));
/// ```
pub fn resolve_mut<'v>(
    root: &'v mut Value,
    path: &Path,
    flags: ExistenceCheckFlags,
) -> Result<Slot<'v>, PathError> {
    let Some((last, parent_entries)) = path.split_last() else {
        return Ok(Slot::Root(root));
    };
    let verify = flags.contains(ExistenceCheckFlags::VERIFY_FULL_PATH);
    let parent = walk_mut(root, parent_entries, path)?;
    match parent {
        Value::Object(map) => {
            let key = member_key(last, path)?.into_owned();
            if verify && !map.contains_key(&key) {
                return Err(PathError::Missing(format!(
                    "no member \"{key}\" in \"{path}\""
                )));
            }
            Ok(Slot::Member { map, key })
        }
        Value::Array(array) => {
            let len = array.len();
            let position = match last.view() {
                EntryView::EndOfArray => {
                    if !flags.contains(ExistenceCheckFlags::ALLOW_END_OF_ARRAY) {
                        return Err(PathError::Invalid(format!(
                            "'-' does not address an existing element in \"{path}\""
                        )));
                    }
                    ArrayPosition::End
                }
                EntryView::Index(i) => {
                    if verify && i >= len {
                        return Err(PathError::Missing(format!(
                            "no element {i} (length {len}) in \"{path}\""
                        )));
                    }
                    if i > len {
                        return Err(PathError::Invalid(format!(
                            "index {i} is past the end (length {len}) in \"{path}\""
                        )));
                    }
                    ArrayPosition::Index(i)
                }
                EntryView::Key(k) => {
                    return Err(PathError::Invalid(format!(
                        "\"{k}\" is not a valid array index in \"{path}\""
                    )))
                }
            };
            Ok(Slot::Element { array, position })
        }
        other => Err(not_a_container(other, last, path)),
    }
}

/// Look up the value at `path`, reporting why it could not be found.
///
/// The whole path must exist; `-` never addresses a value.
pub fn lookup<'v>(root: &'v Value, path: &Path) -> Result<&'v Value, PathError> {
    let Some((last, parent_entries)) = path.split_last() else {
        return Ok(root);
    };
    let mut parent = root;
    for entry in parent_entries {
        parent = step(parent, entry, path)?;
    }
    match (parent, last.view()) {
        (Value::Array(_), EntryView::EndOfArray) => Err(PathError::Invalid(format!(
            "'-' does not address an existing element in \"{path}\""
        ))),
        (Value::Array(array), EntryView::Index(i)) if i >= array.len() => {
            Err(PathError::Missing(format!(
                "no element {i} (length {}) in \"{path}\"",
                array.len()
            )))
        }
        _ => step(parent, last, path),
    }
}

/// Get a value by path, or `None` if the path does not resolve.
///
/// # Example
///
/// ```
/// use dom_path::{get, Path};
/// use serde_json::json;
///
/// let doc = json!({"foo": {"bar": [10, 20]}});
/// let path = Path::root().key("foo").key("bar").index(1);
/// assert_eq!(get(&doc, &path), Some(&json!(20)));
/// assert_eq!(get(&doc, &Path::root().key("missing")), None);
/// ```
pub fn get<'v>(root: &'v Value, path: &Path) -> Option<&'v Value> {
    lookup(root, path).ok()
}

/// Get a mutable reference to a value by path.
pub fn get_mut<'v>(root: &'v mut Value, path: &Path) -> Option<&'v mut Value> {
    resolve_mut(root, path, ExistenceCheckFlags::VERIFY_FULL_PATH)
        .ok()
        .and_then(Slot::into_mut)
}

/// Rewrite a trailing `-` into the concrete index of the element it
/// produced in `reference`.
///
/// `reference` is the tree *after* an append through `path`, so the
/// appended element is the last one. Paths without `-` are returned
/// unchanged.
///
/// # Errors
///
/// [`PathError::Unsupported`] when `-` is not the final entry or when
/// `reference` has no non-empty array where the path points.
///
/// # Example
///
/// ```
/// use dom_path::{denormalize_path, Path};
/// use serde_json::json;
///
/// let path: Path = "/arr/-".parse().unwrap();
/// let after = json!({"arr": [1, 2, 3]});
/// assert_eq!(denormalize_path(&path, &after).unwrap().to_string(), "/arr/2");
/// ```
pub fn denormalize_path(path: &Path, reference: &Value) -> Result<Path, PathError> {
    if !path.contains_normalized_entries() {
        return Ok(path.clone());
    }
    let Some((last, parent_entries)) = path.split_last() else {
        return Ok(path.clone());
    };
    if !last.is_end_of_array() || parent_entries.iter().any(PathEntry::is_end_of_array) {
        return Err(PathError::Unsupported(format!(
            "cannot denormalize \"{path}\": '-' is not the final entry"
        )));
    }
    let mut concrete = Path::from_entries(parent_entries.to_vec());
    match get(reference, &concrete) {
        Some(Value::Array(array)) if !array.is_empty() => {
            concrete.push(PathEntry::Index(array.len() - 1));
            Ok(concrete)
        }
        Some(Value::Array(_)) => Err(PathError::Unsupported(format!(
            "cannot denormalize \"{path}\": the array is empty"
        ))),
        Some(other) => Err(PathError::Unsupported(format!(
            "cannot denormalize \"{path}\": found a {} instead of an array",
            kind_name(other)
        ))),
        None => Err(PathError::Unsupported(format!(
            "cannot denormalize \"{path}\": nothing at \"{concrete}\""
        ))),
    }
}
