//! Plain-text extraction from the rich-text note bodies.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_STYLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap()
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strip HTML markup and collapse whitespace.
///
/// Block-level tags become spaces so `<p>a</p><p>b</p>` reads "a b", and the
/// handful of entities the editor emits are decoded.
pub fn strip_html(html: &str) -> String {
    let without_blocks = SCRIPT_STYLE_RE.replace_all(html, " ");
    let without_tags = TAG_RE.replace_all(&without_blocks, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

/// Plain-text excerpt of an HTML body, at most `max_chars` characters.
///
/// Truncated excerpts end with an ellipsis, which counts toward the budget.
pub fn excerpt(html: &str, max_chars: usize) -> String {
    let text = strip_html(html);
    if text.chars().count() <= max_chars {
        return text;
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_paragraphs_and_lists() {
        let html = "<p>Need to buy:</p><ul><li>Milk</li><li>Eggs</li></ul>";
        assert_eq!(strip_html(html), "Need to buy: Milk Eggs");
    }

    #[test]
    fn test_strip_html_entities() {
        assert_eq!(strip_html("Fish &amp; chips&nbsp;&lt;3"), "Fish & chips <3");
    }

    #[test]
    fn test_strip_html_drops_scripts() {
        let html = "<p>safe</p><script>alert('x')</script><style>p{}</style>";
        assert_eq!(strip_html(html), "safe");
    }

    #[test]
    fn test_strip_html_plain_text_untouched() {
        assert_eq!(strip_html("just text"), "just text");
    }

    #[test]
    fn test_excerpt_respects_budget() {
        let html = format!("<p>{}</p>", "a".repeat(800));
        let ex = excerpt(&html, 500);
        assert_eq!(ex.chars().count(), 500);
        assert!(ex.ends_with('…'));
    }

    #[test]
    fn test_excerpt_short_text_unchanged() {
        assert_eq!(excerpt("<b>short</b>", 500), "short");
    }

    #[test]
    fn test_excerpt_multibyte_boundary() {
        let ex = excerpt(&"é".repeat(20), 10);
        assert_eq!(ex.chars().count(), 10);
    }
}
