// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Normalises raw review text before tokenisation.
//
// Review corpora scraped from the web carry markup and odd
// whitespace that would otherwise end up as vocabulary entries:
//   - HTML line breaks (`<br />`, `<br>`) inside IMDB reviews
//   - Non-breaking and zero-width spaces
//   - Carriage returns and tabs
//   - Control characters
//
// Cleaning steps (applied in order):
//   1. Replace HTML line-break tags with a newline
//   2. Map whitespace variants to a plain space, \r to \n
//   3. Drop remaining control characters (newlines survive)
//   4. Collapse runs of spaces and trim each line
//
// Reference: Rust Book §8 (Strings in Rust)
//            regex crate documentation

use regex::Regex;
use std::sync::OnceLock;

fn line_break_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line-break pattern"))
}

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a raw review for the tokenizer.
    /// Line structure is preserved because line breaks end sentences.
    pub fn clean(&self, text: &str) -> String {
        // ── Step 1: Markup line breaks ───────────────────────────────────────
        let step1 = line_break_tag().replace_all(text, "\n");

        // ── Step 2/3: Character normalisation ────────────────────────────────
        let step2: String = step1
            .chars()
            .filter_map(|c| match c {
                '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => Some(' '),
                '\r' => Some('\n'),
                c if c.is_control() && c != '\n' => None,
                c => Some(c),
            })
            .collect();

        // ── Step 4: Collapse spaces per line ─────────────────────────────────
        step2
            .lines()
            .map(|line| line.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("great   movie"), "great movie");
    }

    #[test]
    fn test_html_breaks_become_lines() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("loved it.<br /><br />Would watch again"), "loved it.\nWould watch again");
        assert_eq!(p.clean("a<BR>b"), "a\nb");
    }

    #[test]
    fn test_removes_control_chars() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("bad\x01film"), "badfilm");
        assert_eq!(p.clean("bad\tfilm"), "bad film");
    }

    #[test]
    fn test_drops_blank_lines_and_trims() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  one \r\n\r\n  two  "), "one\ntwo");
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(""), "");
    }
}
