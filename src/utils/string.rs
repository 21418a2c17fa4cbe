//! String utility functions for safe UTF-8 text manipulation

/// Keep at most `max_chars` characters of `s`, without any marker.
///
/// Used for snippets stored in corrections and instinct fields, where the
/// text must be a plain prefix of the original.
///
/// # Examples
/// ```
/// use lattice_core::utils::string::take_chars;
///
/// assert_eq!(take_chars("hello world", 5), "hello");
/// assert_eq!(take_chars("→→→", 2), "→→");
/// ```
pub fn take_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

/// Safely truncate a string at a character boundary, adding ellipsis if truncated.
///
/// Unlike naive byte slicing (`&s[..n]`), this never splits a multi-byte
/// UTF-8 character.
///
/// # Examples
/// ```
/// use lattice_core::utils::string::truncate_at_char_boundary;
///
/// assert_eq!(truncate_at_char_boundary("hello world", 5), "hello...");
/// assert_eq!(truncate_at_char_boundary("hello", 10), "hello");
/// ```
pub fn truncate_at_char_boundary(s: &str, max_chars: usize) -> String {
    let truncated = take_chars(s, max_chars);

    if truncated.len() == s.len() {
        truncated
    } else {
        format!("{}...", truncated)
    }
}
