//! String helpers shared by the service client and the CLI config layer.

/// Trimmed `value`, or `None` when it is absent or blank.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// First `limit` characters of the trimmed text, for error messages.
pub(crate) fn excerpt(text: &str, limit: usize) -> String {
    text.trim().chars().take(limit).collect()
}
