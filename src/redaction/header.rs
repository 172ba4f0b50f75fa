//! Header value masking.
//!
//! A header whose name contains a secret marker (case-insensitive) and whose
//! value is longer than `min_masked_len` characters is displayed as
//! `prefix + ellipsis + suffix`. Everything else is displayed unmodified.
//! Lengths are counted in `char`s so a UTF-8 sequence is never split.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::config::RedactionConfig;

/// Apply the masking rule to a value already known to be secret.
pub(crate) fn mask_value(value: &str, policy: &RedactionConfig) -> String {
    let len = value.chars().count();
    if len <= policy.min_masked_len {
        return value.to_string();
    }

    let prefix: String = value.chars().take(policy.visible_prefix).collect();
    let suffix: String = value
        .chars()
        .skip(len.saturating_sub(policy.visible_suffix))
        .collect();

    format!("{prefix}{}{suffix}", policy.ellipsis)
}

/// Returns true if `name` contains any of the lowercase `markers`.
pub(crate) fn contains_marker(name: &str, markers: &[String]) -> bool {
    let name = name.to_ascii_lowercase();
    markers
        .iter()
        .any(|marker| !marker.is_empty() && name.contains(marker.as_str()))
}

/// Lossy text view of a header value. Non-UTF-8 bytes become U+FFFD.
pub(crate) fn value_text(value: &HeaderValue) -> String {
    match value.to_str() {
        Ok(text) => text.to_string(),
        Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
    }
}

/// Render a lowercase wire name as `Title-Case` for display.
pub fn display_name(name: &HeaderName) -> String {
    name.as_str()
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Redacted `(name, value)` pairs in wire order, one entry per value.
pub(crate) fn redact_map(
    headers: &HeaderMap,
    mut redact: impl FnMut(&str, &str) -> String,
) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let text = value_text(value);
            (display_name(name), redact(name.as_str(), &text))
        })
        .collect()
}
