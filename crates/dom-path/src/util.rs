use crate::types::{Path, PathEntry};
use crate::validate::validate_pointer;
use crate::PathError;

/// Unescapes a path component.
///
/// `~1` becomes `/` and `~0` becomes `~`. Any other use of `~` is rejected.
///
/// # Example
///
/// ```
/// use dom_path::unescape_component;
///
/// assert_eq!(unescape_component("a~0b").unwrap(), "a~b");
/// assert_eq!(unescape_component("c~1d").unwrap(), "c/d");
/// assert!(unescape_component("bad~2").is_err());
/// ```
pub fn unescape_component(component: &str) -> Result<String, PathError> {
    if !component.contains('~') {
        return Ok(component.to_string());
    }
    let mut out = String::with_capacity(component.len());
    let mut chars = component.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            Some(other) => {
                return Err(PathError::Malformed(format!(
                    "invalid escape sequence '~{other}' in \"{component}\""
                )))
            }
            None => {
                return Err(PathError::Malformed(format!(
                    "dangling '~' at end of \"{component}\""
                )))
            }
        }
    }
    Ok(out)
}

/// Escapes a path component.
///
/// `~` becomes `~0` and `/` becomes `~1`.
///
/// # Example
///
/// ```
/// use dom_path::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// assert_eq!(escape_component("plain"), "plain");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    // ~ first, otherwise the ~ produced by ~1 would be escaped again
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse a path string into a [`Path`].
///
/// - the empty string is the root;
/// - a non-empty pointer must start with `/`;
/// - canonical decimal segments become [`PathEntry::Index`];
/// - `-` becomes [`PathEntry::EndOfArray`];
/// - everything else is an unescaped [`PathEntry::Key`].
///
/// # Example
///
/// ```
/// use dom_path::{parse_path, PathEntry};
///
/// let path = parse_path("/arr/0/-").unwrap();
/// assert_eq!(path.entries(), &[PathEntry::key("arr"), PathEntry::Index(0), PathEntry::EndOfArray]);
/// assert!(parse_path("arr").is_err());
/// ```
pub fn parse_path(pointer: &str) -> Result<Path, PathError> {
    validate_pointer(pointer)?;
    if pointer.is_empty() {
        return Ok(Path::new());
    }
    pointer[1..]
        .split('/')
        .map(|raw| {
            if raw == "-" {
                return Ok(PathEntry::EndOfArray);
            }
            if let Some(i) = parse_index(raw) {
                return Ok(PathEntry::Index(i));
            }
            unescape_component(raw).map(PathEntry::Key)
        })
        .collect()
}

/// Format path entries into their string form.
///
/// Returns an empty string for the root path.
pub fn format_path(entries: &[PathEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push('/');
        match entry {
            PathEntry::Key(k) => out.push_str(&escape_component(k)),
            PathEntry::Index(i) => out.push_str(&i.to_string()),
            PathEntry::EndOfArray => out.push('-'),
        }
    }
    out
}

/// Check if a string is a canonical non-negative array index.
///
/// Leading zeros are not allowed except for `"0"` itself.
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

/// Parse a canonical array index. Returns `None` for anything else,
/// including values that overflow `usize`.
pub fn parse_index(index: &str) -> Option<usize> {
    if !is_valid_index(index) {
        return None;
    }
    index.parse().ok()
}
