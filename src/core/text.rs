//! Chapter preview helpers

use pulldown_cmark::{Event, Parser, TagEnd};

/// Length of a chapter preview in characters
pub const PREVIEW_CHARS: usize = 60;

/// Shorten `text` to at most [`PREVIEW_CHARS`] characters on a word boundary
pub fn truncate(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    // Drop the word that was cut in half
    let kept = match head.rfind(' ') {
        Some(idx) => &head[..idx],
        None => "",
    };
    format!("{kept}...")
}

/// Number of words in the rendered text of a markdown body
pub fn count_words(markdown: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;
    for event in Parser::new(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => {
                for c in text.chars() {
                    if c.is_whitespace() {
                        in_word = false;
                    } else if !in_word {
                        in_word = true;
                        count += 1;
                    }
                }
            }
            // Inline markup can sit inside a word
            Event::Start(_)
            | Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link) => {}
            _ => in_word = false,
        }
    }
    count
}

/// Format a count with `,` thousands separators
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("# Title"), "# Title");
    }

    #[test]
    fn test_truncate_on_word_boundary() {
        let text = "The quick brown fox jumps over the lazy dog and keeps running far away";
        let short = truncate(text);
        assert_eq!(short, "The quick brown fox jumps over the lazy dog and keeps...");
        assert!(short.chars().count() <= PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_truncate_without_spaces() {
        let text = "x".repeat(80);
        assert_eq!(truncate(&text), "...");
    }

    #[test]
    fn test_count_words_ignores_markup() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("# Chapter One\n\nIt was a *dark* night."), 7);
        assert_eq!(count_words("- one\n- two"), 2);
        assert_eq!(count_words("un*believ*able"), 1);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }
}
