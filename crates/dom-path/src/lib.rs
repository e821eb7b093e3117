//! Typed paths into a document value tree.
//!
//! A [`Path`] is an ordered sequence of [`PathEntry`] values: object keys,
//! array indices, or the `EndOfArray` append marker. Paths have a string
//! form compatible with JSON Pointer (`/a/0/-`, with `~0` / `~1` escapes).
//!
//! # Example
//!
//! ```
//! use dom_path::{get, Path};
//!
//! let path: Path = "/foo/bar".parse().unwrap();
//! assert_eq!(path.to_string(), "/foo/bar");
//!
//! let doc = serde_json::json!({"foo": {"bar": 42}});
//! assert_eq!(get(&doc, &path), Some(&serde_json::json!(42)));
//! ```

use thiserror::Error;

pub mod types;
pub use types::{EntryView, Path, PathEntry};

pub mod util;
pub use util::{escape_component, format_path, is_valid_index, parse_index, parse_path, unescape_component};

pub mod validate;
pub use validate::{validate_destination, validate_pointer, validate_source};

pub mod resolve;
pub use resolve::{
    denormalize_path, get, get_mut, lookup, resolve_mut, ArrayPosition, ExistenceCheckFlags, Slot,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("MISSING: {0}")]
    Missing(String),
    #[error("INVALID: {0}")]
    Invalid(String),
    #[error("TYPE_MISMATCH: {0}")]
    TypeMismatch(String),
    #[error("UNSUPPORTED: {0}")]
    Unsupported(String),
    #[error("MALFORMED_PATH: {0}")]
    Malformed(String),
}
