//! Field repairs applied to every decoded document before it is indexed.
//!
//! The search engine infers a field's type from the first value it sees, so a
//! single record carrying e.g. `comments: true` would mistype the field for
//! the whole index. These rules drop such values instead of indexing them.

use serde_json::Value;
use stream_indexer_shared::{fields, Document};
use tracing::debug;
use url::Url;

/// Apply every normalization rule to a document.
pub fn normalize(document: &mut Document) {
    normalize_comments(document);
    normalize_third_party_image(document);
}

/// Keep `comments` only when it is meaningful free text.
///
/// The field is removed when it is not a string, is blank, or is the text of a
/// boolean (`"true"`/`"false"` in any case).
pub fn normalize_comments(document: &mut Document) {
    let keep = match document.get(fields::COMMENTS) {
        None => return,
        Some(Value::String(text)) => is_meaningful_text(text),
        Some(_) => false,
    };

    if !keep {
        debug!(field = fields::COMMENTS, "Dropping non-text comments");
        document.remove(fields::COMMENTS);
    }
}

/// Keep `thirdPartyImage` only when it is an absolute http(s) URL.
///
/// A kept value is stored trimmed, with its scheme in lower case.
pub fn normalize_third_party_image(document: &mut Document) {
    let cleaned = match document.get(fields::THIRD_PARTY_IMAGE) {
        None => return,
        Some(Value::String(text)) => http_url(text),
        Some(_) => None,
    };

    match cleaned {
        Some(url) => {
            document.insert(fields::THIRD_PARTY_IMAGE, Value::String(url));
        }
        None => {
            debug!(
                field = fields::THIRD_PARTY_IMAGE,
                "Dropping invalid third-party image"
            );
            document.remove(fields::THIRD_PARTY_IMAGE);
        }
    }
}

fn is_meaningful_text(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty()
        && !trimmed.eq_ignore_ascii_case("true")
        && !trimmed.eq_ignore_ascii_case("false")
}

fn http_url(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let lower = trimmed.to_ascii_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return None;
    }

    let parsed = Url::parse(trimmed).ok()?;
    parsed.host_str().filter(|host| !host.is_empty())?;
    // The scheme is ASCII and the same length in either case.
    let scheme = parsed.scheme();
    Some(format!("{}{}", scheme, &trimmed[scheme.len()..]))
}
