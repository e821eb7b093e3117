//! Validation functions for path strings and paths.

use crate::types::Path;
use crate::PathError;

/// Validate a path string before parsing.
///
/// # Errors
///
/// Returns [`PathError::Malformed`] if the pointer is non-empty but doesn't
/// start with `/`.
///
/// # Example
///
/// ```
/// use dom_path::validate_pointer;
///
/// validate_pointer("").unwrap();
/// validate_pointer("/foo/bar").unwrap();
/// validate_pointer("foo").unwrap_err();
/// ```
pub fn validate_pointer(pointer: &str) -> Result<(), PathError> {
    if pointer.is_empty() || pointer.starts_with('/') {
        return Ok(());
    }
    Err(PathError::Malformed(format!(
        "path \"{pointer}\" must be empty or start with '/'"
    )))
}

/// Validate a path used as a write destination.
///
/// The append marker may only appear as the last entry.
pub fn validate_destination(path: &Path) -> Result<(), PathError> {
    match path.split_last() {
        Some((_, parent)) if parent.iter().any(|e| e.is_end_of_array()) => {
            Err(PathError::Malformed(format!(
                "'-' may only be the last entry of a path, got \"{path}\""
            )))
        }
        _ => Ok(()),
    }
}

/// Validate a path used as a read source.
///
/// Sources must address an existing value, so the append marker is never
/// allowed.
pub fn validate_source(path: &Path) -> Result<(), PathError> {
    if path.contains_normalized_entries() {
        return Err(PathError::Malformed(format!(
            "source path \"{path}\" may not contain '-'"
        )));
    }
    Ok(())
}
