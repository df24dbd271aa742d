use once_cell::sync::Lazy;
use regex::Regex;

static CONTROL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").expect("control"));

/// Strip a surrounding markdown code fence from a model response.
///
/// Models asked for raw JSON still sometimes wrap it in ```json ... ```.
pub fn strip_code_fence(text: &str) -> String {
    let mut s = text.trim().to_string();
    if s.starts_with("```") {
        match s.find('\n') {
            Some(i) => s = s[i + 1..].to_string(),
            None => return String::new(),
        }
        if let Some(end) = s.rfind("```") {
            s = s[..end].to_string();
        }
    }
    s.trim().to_string()
}

/// Remove control characters that would break embedding the text in plain or
/// markup documents. Newlines and tabs stay; CRLF is normalized to LF.
pub fn sanitize_plain_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    CONTROL_RE.replace_all(&normalized, "").into_owned()
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_strip_is_transparent_for_plain_text() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn fence_strip_removes_json_fence() {
        let wrapped = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fence(wrapped), "{\"a\": 1}");
    }

    #[test]
    fn fence_strip_removes_bare_fence() {
        let wrapped = "```\n{\"a\": 1}\n```\n";
        assert_eq!(strip_code_fence(wrapped), "{\"a\": 1}");
    }

    #[test]
    fn sanitize_keeps_newlines_and_tabs() {
        let s = "line one\nline\ttwo";
        assert_eq!(sanitize_plain_text(s), s);
    }

    #[test]
    fn sanitize_strips_controls_and_normalizes_crlf() {
        assert_eq!(sanitize_plain_text("a\u{0007}b\r\nc\rd"), "ab\nc\nd");
    }

    #[test]
    fn truncate_appends_ellipsis() {
        assert_eq!(truncate_chars("abcdef", 3), "abc…");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }
}
