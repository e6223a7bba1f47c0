//! Handling of untrusted model output.
//!
//! Model responses are parsed into a [`ModelOutcome`]: either the payload was
//! accepted, or the caller gets a [`FallbackReason`] and switches to its
//! deterministic path. Nothing downstream ever sees an unchecked parse.

use serde::de::DeserializeOwned;

/// Why a model response was not used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The completion call itself failed.
    Service(String),
    /// The response text was not parseable JSON of the expected shape.
    Malformed(String),
    /// A required field was absent or empty.
    MissingField(&'static str),
    /// A split response listed no usable articles.
    NoArticles,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::Service(e) => write!(f, "model service error: {}", e),
            FallbackReason::Malformed(e) => write!(f, "malformed model response: {}", e),
            FallbackReason::MissingField(name) => {
                write!(f, "model response missing required field `{}`", name)
            }
            FallbackReason::NoArticles => write!(f, "model response contained no articles"),
        }
    }
}

impl std::error::Error for FallbackReason {}

/// Result of interpreting a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutcome<T> {
    Accepted(T),
    Fallback(FallbackReason),
}

impl<T> ModelOutcome<T> {
    pub fn and_then<U, F>(self, f: F) -> ModelOutcome<U>
    where
        F: FnOnce(T) -> ModelOutcome<U>,
    {
        match self {
            ModelOutcome::Accepted(value) => f(value),
            ModelOutcome::Fallback(reason) => ModelOutcome::Fallback(reason),
        }
    }
}

/// Removes a Markdown code fence (```` ```json ... ``` ````) around a payload.
///
/// Text before the opening fence and after the closing fence is dropped.
/// Input that already starts with `{` or `[`, or has no fence, is returned
/// trimmed, so fences inside string values survive.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    let after_open = &trimmed[open + 3..];
    // Language tag, e.g. "json".
    let body = after_open.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let body = match body.rfind("```") {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim()
}

/// Parses a fenced, possibly sloppy JSON payload.
///
/// Tries the text as-is first; if that fails, retries once on the outermost
/// `{...}` with raw control characters inside string literals escaped. The
/// error of the first attempt is returned when both fail.
pub fn parse_untrusted<T: DeserializeOwned>(text: &str) -> ModelOutcome<T> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return ModelOutcome::Fallback(FallbackReason::Malformed("empty response".to_string()));
    }

    match serde_json::from_str::<T>(body) {
        Ok(value) => ModelOutcome::Accepted(value),
        Err(first_err) => {
            let repaired = escape_string_controls(outermost_object(body));
            match serde_json::from_str::<T>(&repaired) {
                Ok(value) => ModelOutcome::Accepted(value),
                Err(_) => ModelOutcome::Fallback(FallbackReason::Malformed(first_err.to_string())),
            }
        }
    }
}

fn outermost_object(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Escapes raw newlines, tabs and other control characters that appear
/// inside JSON string literals. Structural whitespace is left alone.
fn escape_string_controls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            continue;
        }

        if escaped {
            escaped = false;
            out.push(c);
            continue;
        }

        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' => {
                in_string = false;
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Returns the string if it has non-whitespace content.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Probe {
        a: String,
    }

    #[test]
    fn strips_json_fence() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```\n"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn bare_json_keeps_embedded_fences() {
        let text = "{\"a\":\"<pre>```rust\\nfn main() {}\\n```</pre>\"}";
        assert_eq!(strip_code_fences(text), text);
    }

    #[test]
    fn strips_prose_around_fence() {
        let text = "Here you go:\n```json\n{\"a\":\"x\"}\n```\nEnjoy!";
        assert_eq!(strip_code_fences(text), "{\"a\":\"x\"}");
    }

    #[test]
    fn accepts_clean_json() {
        let outcome: ModelOutcome<Probe> = parse_untrusted("{\"a\":\"ok\"}");
        assert_eq!(outcome, ModelOutcome::Accepted(Probe { a: "ok".to_string() }));
    }

    #[test]
    fn repairs_raw_newlines_inside_strings() {
        let outcome: ModelOutcome<Probe> = parse_untrusted("{\n  \"a\": \"line one\nline two\"\n}");
        assert_eq!(
            outcome,
            ModelOutcome::Accepted(Probe {
                a: "line one\nline two".to_string()
            })
        );
    }

    #[test]
    fn repairs_leading_prose_without_fence() {
        let outcome: ModelOutcome<Probe> = parse_untrusted("Sure! {\"a\":\"x\"}");
        assert!(matches!(outcome, ModelOutcome::Accepted(_)));
    }

    #[test]
    fn garbage_is_malformed() {
        let outcome: ModelOutcome<Probe> = parse_untrusted("I could not do that.");
        assert!(matches!(
            outcome,
            ModelOutcome::Fallback(FallbackReason::Malformed(_))
        ));
        let empty: ModelOutcome<Probe> = parse_untrusted("```json\n```");
        assert!(matches!(empty, ModelOutcome::Fallback(FallbackReason::Malformed(_))));
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        let repaired = escape_string_controls("{\"a\":\"say \\\"hi\\\"\nbye\"}");
        assert_eq!(repaired, "{\"a\":\"say \\\"hi\\\"\\nbye\"}");
    }

    #[test]
    fn non_empty_trims() {
        assert_eq!(non_empty(Some("  x ".to_string())), Some("x".to_string()));
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }
}
