//! Body rendering for traces.
//!
//! A body is shown either as pretty-printed JSON ([`BodyView::Structured`]) or,
//! when it does not parse, as a lossy prefix of its raw bytes
//! ([`BodyView::Raw`]). Rendering is total: any byte sequence yields a view.

use std::fmt;

use serde_json::Value;

use crate::config::{BodyBudget, RedactionConfig};
use crate::redaction::header::{contains_marker, mask_value};

/// Displayable form of a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyView {
    /// Pretty-printed JSON, truncated to the structured budget.
    Structured(String),
    /// Lossy UTF-8 of the first raw-budget bytes.
    Raw(String),
}

impl BodyView {
    pub fn text(&self) -> &str {
        match self {
            BodyView::Structured(text) | BodyView::Raw(text) => text,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, BodyView::Structured(_))
    }

    fn label(&self) -> &'static str {
        match self {
            BodyView::Structured(_) => "json",
            BodyView::Raw(_) => "raw",
        }
    }
}

impl fmt::Display for BodyView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text().is_empty() {
            return write!(f, "Body: (empty)");
        }
        writeln!(f, "Body ({}):", self.label())?;
        let mut lines = self.text().lines().peekable();
        while let Some(line) = lines.next() {
            write!(f, "    {line}")?;
            if lines.peek().is_some() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn render(
    bytes: &[u8],
    budget: BodyBudget,
    policy: &RedactionConfig,
    markers: &[String],
) -> BodyView {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(mut value) => {
            mask_secret_fields(&mut value, policy, markers);
            match serde_json::to_string_pretty(&value) {
                Ok(pretty) => BodyView::Structured(truncate_chars(&pretty, budget.structured)),
                Err(_) => raw_view(bytes, budget),
            }
        }
        Err(_) => raw_view(bytes, budget),
    }
}

fn raw_view(bytes: &[u8], budget: BodyBudget) -> BodyView {
    let end = bytes.len().min(budget.raw);
    BodyView::Raw(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

fn mask_secret_fields(value: &mut Value, policy: &RedactionConfig, markers: &[String]) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                match field {
                    Value::String(text) if contains_marker(key, markers) => {
                        *text = mask_value(text, policy);
                    }
                    _ => mask_secret_fields(field, policy, markers),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                mask_secret_fields(item, policy, markers);
            }
        }
        _ => {}
    }
}

/// First `max` characters of `text`.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
