//! Text helpers shared by the parser, the dispatcher and the agent loop

use std::sync::LazyLock;

use regex::Regex;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"'`\)\]\}]+"#).expect("URL pattern is valid")
});

/// First http(s) URL in `text`, without trailing punctuation
pub fn find_url(text: &str) -> Option<String> {
    URL_RE.find(text).map(|m| {
        m.as_str()
            .trim_end_matches(['.', ',', ';', ':', '!', '?'])
            .to_string()
    })
}

/// Collapse runs of whitespace into single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters, appending `marker` if cut
pub fn truncate_chars(text: &str, max_chars: usize, marker: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], marker),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_url() {
        assert_eq!(
            find_url("summarize https://example.com/page?x=1, please").as_deref(),
            Some("https://example.com/page?x=1")
        );
        assert_eq!(
            find_url("(see http://a.io/b)").as_deref(),
            Some("http://a.io/b")
        );
        assert!(find_url("best laptop 2024").is_none());
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 5, "…"), "héllo…");
        assert_eq!(truncate_chars("short", 10, "…"), "short");
        assert_eq!(truncate_chars("exact", 5, "…"), "exact");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
    }
}
