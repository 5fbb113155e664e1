use std::sync::LazyLock;

use regex::Regex;

/// Matches a leading `<scheme>://` prefix.
static SCHEME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("valid scheme pattern"));

/// Accepts http(s) URLs whose host is a dotted domain, `localhost`, or an IPv4
/// literal, with an optional port and path.
static STRICT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^https?://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+[A-Z]{2,6}\.?",
        r"|localhost",
        r"|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})",
        r"(?::\d+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .expect("valid url pattern")
});

/// Reasons a raw value cannot be turned into a usable URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("URL is required")]
    Empty,
    #[error("Invalid URL - {0}")]
    Invalid(String),
}

/// Returns `true` if the value starts with an explicit `<scheme>://` prefix.
pub fn has_scheme(value: &str) -> bool {
    SCHEME_PREFIX.is_match(value)
}

/// Prepend `https://` to values without a scheme; values with one are returned
/// unchanged.
///
/// The caller is expected to pass a trimmed, non-empty value.
pub fn normalize_url(value: &str) -> String {
    if has_scheme(value) {
        value.to_string()
    } else {
        format!("https://{value}")
    }
}

/// Pattern check applied on top of [`normalize_url`].
pub fn is_valid_url(url: &str) -> bool {
    STRICT_URL.is_match(url)
}

/// Trim, normalize and validate a user-supplied URL.
pub fn normalize_and_validate(raw: &str) -> Result<String, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let normalized = normalize_url(trimmed);
    if is_valid_url(&normalized) {
        Ok(normalized)
    } else {
        Err(UrlError::Invalid(trimmed.to_string()))
    }
}
