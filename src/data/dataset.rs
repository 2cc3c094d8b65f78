// ============================================================
// Layer 4 — Prepared Dataset
// ============================================================
// What every corpus loader hands back to the seeding workflow:
// the vocabulary plus the encoded subsets, ready to persist.

use std::collections::BTreeMap;

use crate::data::vocabulary::Vocabulary;
use crate::domain::example::{Subset, SubsetData};

/// Encoded sentences of one official corpus split.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentenceSet {
    pub data: Vec<Vec<u32>>,
    pub ids:  Vec<u64>,
}

/// A fully processed corpus.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub vocabulary: Vocabulary,

    /// Whole sentences by official split (phrase-sentiment corpus only)
    pub sentences: Option<BTreeMap<Subset, SentenceSet>>,

    /// Labelled examples per subset
    pub subsets: BTreeMap<Subset, SubsetData>,
}

impl PreparedDataset {
    pub fn new(vocabulary: Vocabulary, subsets: BTreeMap<Subset, SubsetData>) -> Self {
        Self { vocabulary, sentences: None, subsets }
    }

    pub fn with_sentences(mut self, sentences: BTreeMap<Subset, SentenceSet>) -> Self {
        self.sentences = Some(sentences);
        self
    }

    /// Total number of labelled examples across subsets
    pub fn example_count(&self) -> usize {
        self.subsets.values().map(SubsetData::len).sum()
    }
}
