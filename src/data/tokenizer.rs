// ============================================================
// Layer 4 — Tokenizer
// ============================================================
// Turns cleaned text into sentences of tokens.
//
// Tokens are either words (`\w+`, optionally followed by an
// apostrophe suffix such as `don't`) or single punctuation
// characters. A sentence ends after `.`, `!` or `?` and at every
// line break.
//
// Sentences are produced lazily by walking the regex matches,
// so a long review is never materialised as a token list
// unless the caller collects it.
//
// Example:
//   "Great film! Loved it" → ["great", "film", "!"], ["loved", "it"]
//   with remove_punct       → ["great", "film"],      ["loved", "it"]
//
// Why a regex instead of splitting on whitespace?
//   Whitespace splitting would glue punctuation to words, so
//   "film!" and "film" would get two different ids.
//
// Reference: regex crate documentation
//            Rust Book §13 (Iterators)

use regex::{Match, Matches, Regex};
use std::sync::OnceLock;

fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+(?:'\w+)?|[^\w\s]").expect("valid token pattern"))
}

/// Word/punctuation tokenizer with sentence splitting.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    /// Drop punctuation tokens from the output
    pub remove_punct: bool,
    /// Lowercase every token
    pub lowercase: bool,
}

impl Tokenizer {
    pub fn new(remove_punct: bool) -> Self {
        Self { remove_punct, lowercase: true }
    }

    /// Lazily split `text` into sentences of tokens.
    pub fn sentences<'a>(&'a self, text: &'a str) -> Sentences<'a> {
        Sentences {
            tokenizer: self,
            text,
            matches:  token_pattern().find_iter(text),
            last_end: 0,
            pending:  None,
        }
    }

    /// All tokens of `text` with sentence boundaries flattened away.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        self.sentences(text).flatten().collect()
    }

    fn normalise(&self, token: &str) -> String {
        if self.lowercase {
            token.to_lowercase()
        } else {
            token.to_string()
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Iterator over the sentences of one text.
pub struct Sentences<'a> {
    tokenizer: &'a Tokenizer,
    text:      &'a str,
    matches:   Matches<'static, 'a>,
    last_end:  usize,
    // A match read past a line break, replayed as the start of the next sentence
    pending:   Option<Match<'a>>,
}

impl<'a> Iterator for Sentences<'a> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Vec<String>> {
        let mut sentence = Vec::new();

        loop {
            let m = match self.pending.take().or_else(|| self.matches.next()) {
                Some(m) => m,
                None => return (!sentence.is_empty()).then_some(sentence),
            };

            let crossed_line = self.text[self.last_end..m.start()].contains('\n');
            if crossed_line && !sentence.is_empty() {
                self.pending = Some(m);
                return Some(sentence);
            }
            self.last_end = m.end();

            let token = m.as_str();
            let is_word = token
                .chars()
                .next()
                .map_or(false, |c| c.is_alphanumeric() || c == '_');

            if is_word || !self.tokenizer.remove_punct {
                sentence.push(self.tokenizer.normalise(token));
            }

            if matches!(token, "." | "!" | "?") && !sentence.is_empty() {
                return Some(sentence);
            }
        }
    }
}
