// ============================================================
// Layer 3 — Examples and Subsets
// ============================================================
// An Example is one labelled token-id sequence. A dataset is a
// set of disjoint subsets (train / valid / test); on disk each
// subset is stored in column form as `{data, label, ids}`.
//
// Why column form?
//   Consumers load a whole subset at once and index by row.
//   Three parallel arrays are smaller than one object per row.
//
// Reference: Rust Book §5 (Structs), §8 (Vectors)

use serde::{Deserialize, Serialize};
use std::fmt;

/// One labelled sequence of vocabulary ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    /// Token ids in reading order
    pub tokens: Vec<u32>,

    /// Class label (discretised sentiment or review polarity)
    pub label: i64,

    /// Position in the source corpus, for traceability
    pub id: u64,
}

impl Example {
    pub fn new(tokens: Vec<u32>, label: i64, id: u64) -> Self {
        Self { tokens, label, id }
    }
}

/// The named partitions a dataset is persisted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subset {
    Train,
    Valid,
    Test,
}

impl Subset {
    /// Every subset in storage order
    pub const ALL: [Subset; 3] = [Subset::Train, Subset::Valid, Subset::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Subset::Train => "train",
            Subset::Valid => "valid",
            Subset::Test  => "test",
        }
    }

    /// Parse a subset name; anything other than train/valid/test is None.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column-form subset exactly as stored: the three vectors are
/// parallel and always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubsetData {
    pub data:  Vec<Vec<u32>>,
    pub label: Vec<i64>,
    pub ids:   Vec<u64>,
}

impl SubsetData {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl FromIterator<Example> for SubsetData {
    fn from_iter<I: IntoIterator<Item = Example>>(iter: I) -> Self {
        let mut out = SubsetData::default();
        for e in iter {
            out.data.push(e.tokens);
            out.label.push(e.label);
            out.ids.push(e.id);
        }
        out
    }
}
