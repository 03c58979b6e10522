//! Utility functions for the stream indexer repository.

use crate::errors::SearchIndexError;

/// Maximum number of characters of a response body kept for diagnostics.
pub const SNIPPET_MAX_CHARS: usize = 500;

/// Characters the search engine does not accept in index names.
const FORBIDDEN_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// Truncate a response body to at most `max_chars` characters.
///
/// Truncation happens on character boundaries so multi-byte text is never split.
///
/// # Example
///
/// ```
/// use stream_indexer_repository::truncate_snippet;
///
/// assert_eq!(truncate_snippet("abcdef", 3), "abc");
/// assert_eq!(truncate_snippet("ab", 3), "ab");
/// ```
pub fn truncate_snippet(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((byte_index, _)) => body[..byte_index].to_string(),
        None => body.to_string(),
    }
}

/// Validate an index name before it is placed in a request path.
///
/// # Returns
///
/// * `Ok(())` - If the name is usable
/// * `Err(SearchIndexError)` - If the name is empty, not lower case, starts
///   with `-`, `_` or `+`, or contains a forbidden character
pub fn validate_index_name(name: &str) -> Result<(), SearchIndexError> {
    if name.is_empty() {
        return Err(SearchIndexError::validation("Index name cannot be empty"));
    }

    if name.starts_with(['-', '_', '+']) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' cannot start with '-', '_' or '+'",
            name
        )));
    }

    if name.chars().any(|c| c.is_uppercase()) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' must be lower case",
            name
        )));
    }

    if let Some(c) = name.chars().find(|c| FORBIDDEN_INDEX_CHARS.contains(c)) {
        return Err(SearchIndexError::validation(format!(
            "Index name '{}' contains invalid character '{}'",
            name, c
        )));
    }

    Ok(())
}
