//! Remote path composition.
//!
//! Paths are joined without inserting a separator: callers pass a
//! directory component that already ends in `/` when they want one.

/// Join a directory component and a leaf name.
///
/// - both non-empty → `path + name`
/// - `name` empty → `path`
/// - `path` empty → `name`
pub fn compose_path(path: &str, name: &str) -> String {
    match (path.is_empty(), name.is_empty()) {
        (false, false) => format!("{}{}", path, name),
        (false, true) => path.to_string(),
        _ => name.to_string(),
    }
}

/// The directory component children of `(path, name)` are addressed with:
/// the composed path with exactly one trailing `/`. The root folder
/// `("/", "/")` yields `/`.
pub fn child_directory(path: &str, name: &str) -> String {
    let full = compose_path(path, name);
    format!("{}/", full.trim_end_matches('/'))
}
