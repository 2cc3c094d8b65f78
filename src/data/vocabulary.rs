// ============================================================
// Layer 4 — Vocabulary Builder
// ============================================================
// Ranks tokens by frequency and assigns dense ids.
//
// Id layout:
//   0        → `<unk>` (always present)
//   1..=n    → tokens in descending frequency, ties broken by
//              the order in which a token was first seen
//
// With a cap of N only the N-1 most frequent tokens keep an id;
// everything else encodes to 0.
//
// Why reserve id 0?
//   Every corpus has words too rare to keep. Mapping all of
//   them to one shared id keeps the sequences the same length
//   as the text and the id space dense.
//
// Reference: Rust Book §8 (Hash Maps)

use anyhow::{bail, Result};
use std::collections::{BTreeMap, HashMap};

/// The unknown-token sentinel, always id 0.
pub const UNK: &str = "<unk>";

/// Frequency ranking of a token stream.
#[derive(Debug, Clone, Default)]
pub struct TokenCounts {
    /// Token → rank (0 = most frequent)
    pub word_to_id: HashMap<String, usize>,
    /// Token → number of occurrences
    pub counter: HashMap<String, usize>,
    /// De-duplicated tokens in rank order
    pub words: Vec<String>,
}

/// Count `tokens` and rank them by descending frequency.
pub fn tokens_to_vocab<I, S>(tokens: I) -> TokenCounts
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counter: HashMap<String, usize> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();

    for token in tokens {
        let token: &str = token.as_ref();
        match counter.get_mut(token) {
            Some(n) => *n += 1,
            None => {
                counter.insert(token.to_string(), 1);
                first_seen.push(token.to_string());
            }
        }
    }

    // first_seen is already in first-seen order, so a stable sort
    // on count alone gives the tie-break for free
    let mut words = first_seen;
    words.sort_by(|a, b| counter[b].cmp(&counter[a]));

    let word_to_id = words
        .iter()
        .enumerate()
        .map(|(rank, w)| (w.clone(), rank))
        .collect();

    TokenCounts { word_to_id, counter, words }
}

/// Immutable token ↔ id mapping with `<unk>` at id 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    word_to_id: HashMap<String, u32>,
    id_to_word: Vec<String>,
}

impl Vocabulary {
    /// Build from a token stream, keeping at most `cap - 1` real tokens.
    /// `None` keeps every token.
    pub fn build<I, S>(tokens: I, cap: Option<usize>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if cap == Some(0) {
            bail!("vocabulary cap must be at least 1 (room for {UNK})");
        }

        let counts = tokens_to_vocab(
            tokens
                .into_iter()
                .filter(|t| AsRef::<str>::as_ref(t) != UNK),
        );
        let keep = cap.map_or(counts.words.len(), |n| (n - 1).min(counts.words.len()));

        let mut id_to_word = Vec::with_capacity(keep + 1);
        id_to_word.push(UNK.to_string());
        id_to_word.extend(counts.words.into_iter().take(keep));

        Self::from_id_to_word(id_to_word)
    }

    /// Rebuild from a stored id → word list.
    pub fn from_id_to_word(id_to_word: Vec<String>) -> Result<Self> {
        if id_to_word.first().map(String::as_str) != Some(UNK) {
            bail!("id 0 must be the {UNK} sentinel");
        }

        let mut word_to_id = HashMap::with_capacity(id_to_word.len());
        for (id, word) in id_to_word.iter().enumerate() {
            if word_to_id.insert(word.clone(), id as u32).is_some() {
                bail!("duplicate vocabulary entry '{word}'");
            }
        }

        Ok(Self { word_to_id, id_to_word })
    }

    /// Id of `token`, or 0 when it is out of vocabulary.
    pub fn encode(&self, token: &str) -> u32 {
        self.word_to_id.get(token).copied().unwrap_or(0)
    }

    pub fn encode_all<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<u32> {
        tokens.iter().map(|t| self.encode(t.as_ref())).collect()
    }

    pub fn id_to_word(&self) -> &[String] {
        &self.id_to_word
    }

    /// Word → id mapping serialised as a JSON object with sorted keys.
    pub fn word_to_id_json(&self) -> Result<String> {
        let sorted: BTreeMap<&str, u32> = self
            .word_to_id
            .iter()
            .map(|(w, &id)| (w.as_str(), id))
            .collect();
        Ok(serde_json::to_string(&sorted)?)
    }

    /// Number of ids, including `<unk>`.
    pub fn len(&self) -> usize {
        self.id_to_word.len()
    }

    /// True when only the sentinel is present.
    pub fn is_empty(&self) -> bool {
        self.id_to_word.len() <= 1
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rank_by_frequency_then_first_seen() {
        let counts = tokens_to_vocab(["b", "a", "c", "a", "c", "d"]);
        assert_eq!(counts.words, vec!["a", "c", "b", "d"]);
        assert_eq!(counts.word_to_id["a"], 0);
        assert_eq!(counts.word_to_id["d"], 3);
        assert_eq!(counts.counter["c"], 2);
    }

    #[test]
    fn test_uncapped_ids_are_shifted_by_one() {
        let v = Vocabulary::build(["x", "y", "x"], None).unwrap();
        assert_eq!(v.encode(UNK), 0);
        assert_eq!(v.encode("x"), 1);
        assert_eq!(v.encode("y"), 2);
        assert_eq!(v.encode("never"), 0);
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn test_cap_collapses_rare_tokens() {
        let v = Vocabulary::build(["a", "a", "a", "b", "b", "c"], Some(3)).unwrap();
        assert_eq!(v.id_to_word(), &["<unk>", "a", "b"]);
        assert_eq!(v.encode_all(&["a", "b", "c"][..]), vec![1, 2, 0]);
    }

    #[test]
    fn test_cap_of_one_keeps_only_sentinel() {
        let v = Vocabulary::build(["a", "b"], Some(1)).unwrap();
        assert!(v.is_empty());
        assert_eq!(v.encode("a"), 0);
    }

    #[test]
    fn test_zero_cap_is_rejected() {
        assert!(Vocabulary::build(["a"], Some(0)).is_err());
    }

    #[test]
    fn test_empty_input_gives_empty_vocabulary() {
        let v = Vocabulary::build(Vec::<String>::new(), Some(100)).unwrap();
        assert!(v.is_empty());
        assert_eq!(v.id_to_word(), &["<unk>"]);
    }

    #[test]
    fn test_sentinel_in_text_is_not_ranked() {
        let v = Vocabulary::build(["<unk>", "<unk>", "a"], None).unwrap();
        assert_eq!(v.id_to_word(), &["<unk>", "a"]);
    }

    #[test]
    fn test_json_and_reload() {
        let v = Vocabulary::build(["b", "a", "a"], None).unwrap();
        assert_eq!(v.word_to_id_json().unwrap(), r#"{"<unk>":0,"a":1,"b":2}"#);
        let back = Vocabulary::from_id_to_word(v.id_to_word().to_vec()).unwrap();
        assert_eq!(back, v);
        assert!(Vocabulary::from_id_to_word(vec!["a".into()]).is_err());
    }

    proptest! {
        #[test]
        fn prop_cap_keeps_only_most_frequent(
            tokens in prop::collection::vec("[a-f]", 0..60),
            cap in 1usize..8,
        ) {
            let v = Vocabulary::build(&tokens, Some(cap)).unwrap();
            let counts = tokens_to_vocab(&tokens);
            prop_assert!(v.len() <= cap);
            prop_assert_eq!(v.encode(UNK), 0);
            for (rank, word) in counts.words.iter().enumerate() {
                let expected = if rank < cap - 1 { rank as u32 + 1 } else { 0 };
                prop_assert_eq!(v.encode(word), expected);
            }
        }
    }
}
