//! Store path helpers.

/// Join a listing prefix with one of its listed keys.
///
/// No normalization is applied: `prefix` is expected to end in `/`.
pub fn join_path(prefix: &str, key: &str) -> String {
    let mut path = String::with_capacity(prefix.len() + key.len());
    path.push_str(prefix);
    path.push_str(key);
    path
}

/// Final non-empty segment of a slash-delimited path.
///
/// Any number of trailing slashes is ignored. A path that is empty or made
/// only of slashes yields an empty string.
pub fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}
