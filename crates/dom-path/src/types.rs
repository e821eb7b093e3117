//! Type definitions for document paths.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::util::{format_path, parse_index, parse_path};
use crate::PathError;

/// A single component of a [`Path`].
///
/// Keys address object members, indices address array elements and
/// `EndOfArray` addresses the slot one past the last element of an array
/// (the append point, written `-` in the string form).
///
/// Equality and hashing use [`PathEntry::view`]: a key that spells a
/// canonical array index (`"3"`) is the same entry as `Index(3)`, and the
/// key `"-"` is the same entry as `EndOfArray`. Both address the same slot
/// during resolution, so they compare equal.
#[derive(Debug, Clone)]
pub enum PathEntry {
    Key(String),
    Index(usize),
    EndOfArray,
}

/// Borrowed, canonical form of a [`PathEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryView<'a> {
    Key(&'a str),
    Index(usize),
    EndOfArray,
}

impl PathEntry {
    /// Create a key entry.
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        PathEntry::Key(k.into())
    }

    /// Create an index entry.
    #[inline]
    pub fn index(i: usize) -> Self {
        PathEntry::Index(i)
    }

    /// Returns the canonical view of this entry.
    pub fn view(&self) -> EntryView<'_> {
        match self {
            PathEntry::Key(k) if k == "-" => EntryView::EndOfArray,
            PathEntry::Key(k) => match parse_index(k) {
                Some(i) => EntryView::Index(i),
                None => EntryView::Key(k),
            },
            PathEntry::Index(i) => EntryView::Index(*i),
            PathEntry::EndOfArray => EntryView::EndOfArray,
        }
    }

    /// Returns true if this entry is the append marker.
    #[inline]
    pub fn is_end_of_array(&self) -> bool {
        matches!(self.view(), EntryView::EndOfArray)
    }

    /// Returns the array index this entry denotes, if any.
    #[inline]
    pub fn as_index(&self) -> Option<usize> {
        match self.view() {
            EntryView::Index(i) => Some(i),
            _ => None,
        }
    }
}

impl PartialEq for PathEntry {
    fn eq(&self, other: &Self) -> bool {
        self.view() == other.view()
    }
}

impl Eq for PathEntry {}

impl Hash for PathEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.view().hash(state);
    }
}

impl fmt::Display for PathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathEntry::Key(k) => f.write_str(&crate::util::escape_component(k)),
            PathEntry::Index(i) => write!(f, "{i}"),
            PathEntry::EndOfArray => f.write_str("-"),
        }
    }
}

impl From<String> for PathEntry {
    fn from(s: String) -> Self {
        PathEntry::Key(s)
    }
}

impl From<&str> for PathEntry {
    fn from(s: &str) -> Self {
        PathEntry::Key(s.to_owned())
    }
}

impl From<usize> for PathEntry {
    fn from(i: usize) -> Self {
        PathEntry::Index(i)
    }
}

/// An address inside a value tree.
///
/// The empty path denotes the document root.
///
/// # Example
///
/// ```
/// use dom_path::Path;
///
/// let path = Path::root().key("arr").index(0).key("name");
/// assert_eq!(path.to_string(), "/arr/0/name");
/// assert_eq!("/arr/0/name".parse::<Path>().unwrap(), path);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathEntry>);

impl Path {
    /// Create an empty path (root).
    #[inline]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Create an empty path (alias for `new`).
    #[inline]
    pub fn root() -> Self {
        Self::new()
    }

    /// Create a path from a vector of entries.
    #[inline]
    pub fn from_entries(entries: Vec<PathEntry>) -> Self {
        Self(entries)
    }

    /// Parse a path from its string form (`/a/0/-`).
    pub fn parse(pointer: &str) -> Result<Self, PathError> {
        parse_path(pointer)
    }

    /// Append a key entry and return self.
    #[inline]
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(PathEntry::Key(k.into()));
        self
    }

    /// Append an index entry and return self.
    #[inline]
    pub fn index(mut self, i: usize) -> Self {
        self.0.push(PathEntry::Index(i));
        self
    }

    /// Append the append marker and return self.
    #[inline]
    pub fn end_of_array(mut self) -> Self {
        self.0.push(PathEntry::EndOfArray);
        self
    }

    /// Returns a copy of this path extended by `entry`.
    pub fn join(&self, entry: impl Into<PathEntry>) -> Self {
        let mut out = self.clone();
        out.push(entry.into());
        out
    }

    #[inline]
    pub fn push(&mut self, entry: PathEntry) {
        self.0.push(entry);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<PathEntry> {
        self.0.pop()
    }

    #[inline]
    pub fn entries(&self) -> &[PathEntry] {
        &self.0
    }

    #[inline]
    pub fn entries_mut(&mut self) -> &mut Vec<PathEntry> {
        &mut self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn last(&self) -> Option<&PathEntry> {
        self.0.last()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, PathEntry> {
        self.0.iter()
    }

    /// Splits off the final entry, returning the parent entries and the last
    /// entry. Returns `None` for the root path.
    #[inline]
    pub fn split_last(&self) -> Option<(&PathEntry, &[PathEntry])> {
        self.0.split_last()
    }

    /// Returns the parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        self.split_last()
            .map(|(_, parent)| Path(parent.to_vec()))
    }

    /// Returns true if `self` equals `other` or is an ancestor of it.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        self.len() <= other.len() && self.0[..] == other.0[..self.len()]
    }

    /// Returns true if any entry is still the relative append marker.
    pub fn contains_normalized_entries(&self) -> bool {
        self.0.iter().any(PathEntry::is_end_of_array)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_path(&self.0))
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}

impl From<Vec<PathEntry>> for Path {
    fn from(entries: Vec<PathEntry>) -> Self {
        Self(entries)
    }
}

impl FromIterator<PathEntry> for Path {
    fn from_iter<I: IntoIterator<Item = PathEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathEntry;
    type IntoIter = std::slice::Iter<'a, PathEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn numeric_key_equals_index() {
        assert_eq!(PathEntry::key("3"), PathEntry::Index(3));
        assert_eq!(PathEntry::key("-"), PathEntry::EndOfArray);
        assert_ne!(PathEntry::key("03"), PathEntry::Index(3));
        assert_ne!(PathEntry::key("a"), PathEntry::Index(0));
    }

    #[test]
    fn equal_entries_hash_alike() {
        let mut set = HashSet::new();
        set.insert(Path::root().key("a").key("0"));
        assert!(set.contains(&Path::root().key("a").index(0)));
    }

    #[test]
    fn builder_and_display() {
        let p = Path::root().key("a/b").index(2).end_of_array();
        assert_eq!(p.to_string(), "/a~1b/2/-");
        assert_eq!(p.len(), 3);
        assert!(p.contains_normalized_entries());
    }

    #[test]
    fn parent_and_prefix() {
        let p = Path::root().key("a").key("b");
        assert_eq!(p.parent(), Some(Path::root().key("a")));
        assert_eq!(Path::root().parent(), None);
        assert!(Path::root().key("a").is_prefix_of(&p));
        assert!(p.is_prefix_of(&p));
        assert!(!p.is_prefix_of(&Path::root().key("a")));
        assert!(Path::root().is_prefix_of(&p));
    }

    #[test]
    fn join_does_not_mutate() {
        let base = Path::root().key("items");
        let child = base.join(4usize);
        assert_eq!(base.len(), 1);
        assert_eq!(child.to_string(), "/items/4");
    }
}
