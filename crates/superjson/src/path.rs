//! Dotted annotation paths.
//!
//! A path is a list of segments joined by `.`. Inside a segment a backslash is
//! written `\\` and a dot is written `\.`, so `{"a.b": {"c": 1}}` addresses
//! `c` as `a\.b.c`.
//!
//! Envelopes without a `v` field predate backslash escaping; for those
//! (`legacy`), only `\.` is an escape and any other backslash is literal.
//!
//! # Example
//!
//! ```
//! use superjson::path::{parse_path, stringify_path};
//!
//! let path = vec!["a.b".to_string(), "c\\d".to_string(), "0".to_string()];
//! let s = stringify_path(&path);
//! assert_eq!(s, r"a\.b.c\\d.0");
//! assert_eq!(parse_path(&s, false).unwrap(), path);
//! ```

use crate::error::DecodeError;

/// Escapes one path segment.
pub fn escape_key(key: &str) -> String {
    if !key.contains('\\') && !key.contains('.') {
        return key.to_string();
    }
    // Order matters: backslashes first, so escaped dots are not doubled
    key.replace('\\', "\\\\").replace('.', "\\.")
}

/// Joins segments into a path string.
pub fn stringify_path<S: AsRef<str>>(path: &[S]) -> String {
    let mut out = String::new();
    for (i, segment) in path.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&escape_key(segment.as_ref()));
    }
    out
}

/// Splits a path string into segments.
///
/// The empty string is a single empty segment, matching how an object key
/// `""` is addressed.
pub fn parse_path(path: &str, legacy: bool) -> Result<Vec<String>, DecodeError> {
    let mut out = Vec::new();
    let mut segment = String::new();
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some('.') => {
                    segment.push('.');
                    chars.next();
                }
                Some('\\') if !legacy => {
                    segment.push('\\');
                    chars.next();
                }
                _ if legacy => segment.push('\\'),
                _ => return Err(DecodeError::InvalidPath(path.to_string())),
            },
            '.' => out.push(std::mem::take(&mut segment)),
            c => segment.push(c),
        }
    }
    out.push(segment);
    Ok(out)
}
