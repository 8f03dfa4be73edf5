//! Filesystem path safety (spec §9 "Filesystem path safety").
//!
//! Grounded on `repository/document/helpers.rs::sanitize_filename`'s
//! character-filtering approach, extended to whole-path joins: exporters
//! and the file tracker must never let an externally derived path segment
//! escape the directory they were told to write under.

use std::path::{Path, PathBuf};

/// Join `base` and `segment`, refusing any `segment` containing a parent
/// directory traversal (`..`) or an absolute path, and resolving the
/// result to an absolute path before returning it.
///
/// Returns `None` if `segment` attempts to escape `base`.
pub fn safe_join(base: &Path, segment: &str) -> Option<PathBuf> {
    let candidate = Path::new(segment);
    if candidate.is_absolute() {
        return None;
    }
    if candidate.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
        return None;
    }

    let joined = base.join(candidate);
    Some(absolutize(&joined))
}

/// Make `path` absolute without requiring it to exist (unlike
/// `std::fs::canonicalize`, which fails on missing files — exporters write
/// files that don't exist yet).
fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}

/// Replace characters that are unsafe in filenames (path separators,
/// reserved characters, control characters) with `_`.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('_');
    if trimmed.is_empty() {
        "file".to_string()
    } else if trimmed.len() > 150 {
        trimmed[..150].to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_parent_traversal() {
        assert!(safe_join(Path::new("/out"), "../etc/passwd").is_none());
        assert!(safe_join(Path::new("/out"), "sub/../../escape").is_none());
    }

    #[test]
    fn rejects_absolute_segment() {
        assert!(safe_join(Path::new("/out"), "/etc/passwd").is_none());
    }

    #[test]
    fn joins_plain_relative_segment() {
        let joined = safe_join(Path::new("/out"), "reports/july.csv").unwrap();
        assert!(joined.starts_with("/out"));
        assert!(joined.ends_with("reports/july.csv"));
    }

    #[test]
    fn sanitize_filename_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("a/b\\c:d"), "a_b_c_d");
    }

    #[test]
    fn sanitize_filename_never_returns_empty() {
        assert_eq!(sanitize_filename("///"), "file");
    }
}
