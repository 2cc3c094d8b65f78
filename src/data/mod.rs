// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between a raw corpus on disk and encoded subsets
// ready to be stored.
//
// The pipeline flows in this order:
//
//   raw corpus files
//       │
//       ▼
//   sst / imdb / yelp  → read the format-specific layout
//       │
//       ▼
//   Preprocessor       → normalise markup and whitespace
//       │
//       ▼
//   Tokenizer          → sentences of lowercase tokens
//       │
//       ▼
//   Vocabulary         → frequency-ranked ids, `<unk>` = 0
//       │
//       ▼
//   splitter           → shuffled train / valid / test subsets
//       │
//       ▼
//   PreparedDataset    → handed to the store adapter (Layer 6)
//
// Reference: Rust Book §7 (Modules)

/// Normalises raw review text
pub mod preprocessor;

/// Lazy sentence/word tokenizer
pub mod tokenizer;

/// Frequency ranking and token ↔ id mapping
pub mod vocabulary;

/// Fraction-based subset splitting
pub mod splitter;

/// Loader output shared by every corpus format
pub mod dataset;

/// Phrase-sentiment corpus (sentiment treebank)
pub mod sst;

/// Movie-review corpus (aclImdb)
pub mod imdb;

/// Business-review corpus (review_label.json)
pub mod yelp;
