//! Input sanitization shared by analysis and rewriting.
//!
//! Input is truncated to a maximum number of characters and then has its
//! markup-significant characters escaped, so text echoed back into an HTML
//! page (element content or a quoted attribute) cannot inject markup.

use std::borrow::Cow;

use tracing::warn;

/// Default maximum input length in characters.
pub const DEFAULT_MAX_INPUT_LENGTH: usize = 10_000;

/// Escaped form of `'`.
pub const ESCAPED_APOSTROPHE: &str = "&#x27;";

/// Truncate `text` to `max_chars` characters and escape markup.
pub fn sanitize(text: &str, max_chars: usize) -> String {
    let truncated = truncate_chars(text, max_chars);
    if truncated.len() < text.len() {
        warn!(
            input_chars = text.chars().count(),
            max_chars, "input truncated"
        );
    }
    escape_markup(truncated)
}

/// Sanitize raw bytes. Anything that is not UTF-8 text becomes empty.
pub fn sanitize_bytes(bytes: &[u8], max_chars: usize) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => sanitize(text, max_chars),
        Err(_) => {
            warn!(input_bytes = bytes.len(), "input is not valid UTF-8, discarded");
            String::new()
        }
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Escape `&`, `<`, `>`, `"` and `'`.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str(ESCAPED_APOSTROPHE),
            c => out.push(c),
        }
    }
    out
}

/// Turn escaped apostrophes back into `'`, so elisions such as
/// `l&#x27;analisi` read as `l'analisi` to the text metrics.
pub fn restore_apostrophes(text: &str) -> Cow<'_, str> {
    if text.contains(ESCAPED_APOSTROPHE) {
        Cow::Owned(text.replace(ESCAPED_APOSTROPHE, "'"))
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("perché sì", 6), "perché");
        assert_eq!(truncate_chars("breve", 100), "breve");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape_markup(r#"<b onclick="x()">A & B</b>"#),
            "&lt;b onclick=&quot;x()&quot;&gt;A &amp; B&lt;/b&gt;"
        );
        assert_eq!(escape_markup("l'analisi"), "l&#x27;analisi");
    }

    #[test]
    fn test_single_quoted_attributes_are_escaped() {
        let out = sanitize("<a href='x' onclick='y'>", 100);
        assert!(!out.contains('\''));
        assert_eq!(out, "&lt;a href=&#x27;x&#x27; onclick=&#x27;y&#x27;&gt;");
    }

    #[test]
    fn test_restore_apostrophes() {
        assert_eq!(restore_apostrophes("l&#x27;analisi"), "l'analisi");
        assert!(matches!(restore_apostrophes("nessuna elisione"), Cow::Borrowed(_)));
        // other entities are left alone
        assert_eq!(restore_apostrophes("A &amp; B"), "A &amp; B");
    }

    #[test]
    fn test_sanitize_truncates_before_escaping() {
        let input = "a".repeat(15_000);
        let out = sanitize(&input, DEFAULT_MAX_INPUT_LENGTH);
        assert_eq!(out.chars().count(), 10_000);

        assert_eq!(sanitize("ab<c", 3), "ab&lt;");
    }

    #[test]
    fn test_sanitize_bytes_rejects_non_text() {
        assert_eq!(sanitize_bytes(&[0xff, 0xfe, 0x00], 100), "");
        assert_eq!(sanitize_bytes("ciao".as_bytes(), 100), "ciao");
    }
}
