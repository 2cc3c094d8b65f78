// ============================================================
// Layer 6 — Dataset Store Adapter
// ============================================================
// Persists prepared datasets through any DocumentStore and
// reads them back.
//
// Collections written:
//   word_to_id          {name, data: JSON-encoded word → id object}
//   id_to_word          {name, data: [word, …]}
//   sentences           {name, set, data, ids}   (sentence corpus only)
//   datasets            {name, set, data, label, ids}
//   inserted_datasets   {name, category}         (seed record)
//
// Two write modes:
//   InsertIfAbsent — write only when nothing matches the key;
//                    an existing document is retained untouched
//   Replace        — upsert, overwriting whatever matches
//
// Why is insert-if-absent the default?
//   Seeding is meant to be rerun freely. A second run without
//   upsert must never rewrite a dataset that other tools have
//   already read, or evaluation ids would stop matching.
//
// Reference: Rust Book §10 (Generic Types and Traits)

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::data::dataset::SentenceSet;
use crate::data::vocabulary::Vocabulary;
use crate::domain::document::{doc, Document};
use crate::domain::example::{Subset, SubsetData};
use crate::domain::traits::DocumentStore;

pub const WORD_TO_ID:        &str = "word_to_id";
pub const ID_TO_WORD:        &str = "id_to_word";
pub const SENTENCES:         &str = "sentences";
pub const DATASETS:          &str = "datasets";
pub const INSERTED_DATASETS: &str = "inserted_datasets";

/// What a single write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Replaced,
    Retained,
}

/// How conflicting keys are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    InsertIfAbsent,
    Replace,
}

impl WriteMode {
    pub fn from_upsert(upsert: bool) -> Self {
        if upsert { WriteMode::Replace } else { WriteMode::InsertIfAbsent }
    }
}

/// Dataset-level persistence over a document store.
pub struct DatasetStore<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> DatasetStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying document store
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Write `document` unless something already matches `filter`.
    pub fn insert_if_absent(
        &mut self,
        collection: &str,
        filter:     &Document,
        document:   Document,
    ) -> Result<WriteOutcome> {
        if self.store.find_one(collection, filter)?.is_some() {
            tracing::info!("Document {:?} already exists in '{}', keeping it", filter, collection);
            return Ok(WriteOutcome::Retained);
        }
        self.store
            .insert_one(collection, document)
            .with_context(|| format!("Cannot insert into '{collection}'"))?;
        Ok(WriteOutcome::Inserted)
    }

    /// Write `document`, overwriting whatever matches `filter`.
    pub fn replace_if_exists(
        &mut self,
        collection: &str,
        filter:     &Document,
        document:   Document,
    ) -> Result<WriteOutcome> {
        let replaced = self
            .store
            .replace_one(collection, filter, document, true)
            .with_context(|| format!("Cannot upsert into '{collection}'"))?;
        Ok(if replaced { WriteOutcome::Replaced } else { WriteOutcome::Inserted })
    }

    pub fn write(
        &mut self,
        mode:       WriteMode,
        collection: &str,
        filter:     &Document,
        document:   Document,
    ) -> Result<WriteOutcome> {
        match mode {
            WriteMode::InsertIfAbsent => self.insert_if_absent(collection, filter, document),
            WriteMode::Replace        => self.replace_if_exists(collection, filter, document),
        }
    }

    /// Store both directions of the vocabulary under `name`.
    pub fn store_vocabulary(&mut self, name: &str, vocab: &Vocabulary, mode: WriteMode) -> Result<()> {
        let key = doc([("name", json!(name))]);

        let mut word_to_id = key.clone();
        word_to_id.insert("data".into(), json!(vocab.word_to_id_json()?));
        self.write(mode, WORD_TO_ID, &key, word_to_id)?;

        let mut id_to_word = key.clone();
        id_to_word.insert("data".into(), json!(vocab.id_to_word()));
        self.write(mode, ID_TO_WORD, &key, id_to_word)?;
        Ok(())
    }

    /// Store whole sentences per official split.
    pub fn store_sentences(
        &mut self,
        name:      &str,
        sentences: &BTreeMap<Subset, SentenceSet>,
        mode:      WriteMode,
    ) -> Result<()> {
        for (subset, set) in sentences {
            let key = doc([("name", json!(name)), ("set", json!(subset.as_str()))]);
            let mut document = key.clone();
            document.insert("data".into(), json!(set.data));
            document.insert("ids".into(), json!(set.ids));
            self.write(mode, SENTENCES, &key, document)?;
        }
        Ok(())
    }

    /// Persist each of train / valid / test present in `subsets`.
    /// Without `upsert`, existing subsets are kept and a warning logged.
    pub fn store_dataset_by_default(
        &mut self,
        name:    &str,
        subsets: &BTreeMap<Subset, SubsetData>,
        upsert:  bool,
    ) -> Result<()> {
        let mode = WriteMode::from_upsert(upsert);

        for subset in Subset::ALL {
            let Some(data) = subsets.get(&subset) else {
                continue;
            };
            let key = doc([("name", json!(name)), ("set", json!(subset.as_str()))]);
            let mut document = key.clone();
            if let Value::Object(fields) = serde_json::to_value(data)? {
                document.extend(fields);
            }

            let outcome = self.write(mode, DATASETS, &key, document)?;
            match outcome {
                WriteOutcome::Retained => tracing::warn!(
                    "Dataset '{}' already has a '{}' subset, skipping (use upsert to replace)",
                    name,
                    subset
                ),
                _ => tracing::info!("Stored '{}' {} subset ({} examples)", name, subset, data.len()),
            }
        }
        Ok(())
    }

    /// Record that `name` was seeded under `category`.
    pub fn dataset_inserted(&mut self, name: &str, category: &str) -> Result<WriteOutcome> {
        let key = doc([("name", json!(name)), ("category", json!(category))]);
        self.insert_if_absent(INSERTED_DATASETS, &key, key.clone())
    }

    pub fn is_dataset_inserted(&self, name: &str, category: &str) -> Result<bool> {
        let key = doc([("name", json!(name)), ("category", json!(category))]);
        Ok(self.store.find_one(INSERTED_DATASETS, &key)?.is_some())
    }

    /// Read back the vocabulary stored under `name`.
    pub fn fetch_vocabulary(&self, name: &str) -> Result<Option<Vocabulary>> {
        let Some(found) = self.store.find_one(ID_TO_WORD, &doc([("name", json!(name))]))? else {
            return Ok(None);
        };
        let words: Vec<String> = serde_json::from_value(found.get("data").cloned().unwrap_or(Value::Null))
            .with_context(|| format!("Malformed id_to_word entry for '{name}'"))?;
        Ok(Some(Vocabulary::from_id_to_word(words)?))
    }

    /// Read back one stored subset.
    pub fn fetch_subset(&self, name: &str, subset: Subset) -> Result<Option<SubsetData>> {
        let key = doc([("name", json!(name)), ("set", json!(subset.as_str()))]);
        let Some(found) = self.store.find_one(DATASETS, &key)? else {
            return Ok(None);
        };
        let data = serde_json::from_value(Value::Object(found))
            .with_context(|| format!("Malformed '{subset}' subset for '{name}'"))?;
        Ok(Some(data))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::document_store::MemoryStore;

    fn subsets(offset: u32) -> BTreeMap<Subset, SubsetData> {
        let mut out = BTreeMap::new();
        out.insert(Subset::Train, SubsetData { data: vec![vec![offset, 2]], label: vec![1], ids: vec![0] });
        out.insert(Subset::Test,  SubsetData { data: vec![vec![offset]],    label: vec![0], ids: vec![0] });
        out
    }

    #[test]
    fn test_insert_if_absent_retains_existing() {
        let mut ds = DatasetStore::new(MemoryStore::new());
        let key = doc([("name", json!("x"))]);

        let mut first = key.clone();
        first.insert("data".into(), json!(1));
        assert_eq!(ds.insert_if_absent("c", &key, first).unwrap(), WriteOutcome::Inserted);

        let mut second = key.clone();
        second.insert("data".into(), json!(2));
        assert_eq!(ds.insert_if_absent("c", &key, second).unwrap(), WriteOutcome::Retained);

        let stored = ds.store().find_one("c", &key).unwrap().unwrap();
        assert_eq!(stored["data"], json!(1));
    }

    #[test]
    fn test_replace_if_exists_overwrites() {
        let mut ds = DatasetStore::new(MemoryStore::new());
        let key = doc([("name", json!("x"))]);

        assert_eq!(ds.replace_if_exists("c", &key, key.clone()).unwrap(), WriteOutcome::Inserted);
        let mut newer = key.clone();
        newer.insert("data".into(), json!("new"));
        assert_eq!(ds.replace_if_exists("c", &key, newer).unwrap(), WriteOutcome::Replaced);

        assert_eq!(ds.store().count("c"), 1);
        assert_eq!(ds.store().find_one("c", &key).unwrap().unwrap()["data"], json!("new"));
    }

    #[test]
    fn test_store_dataset_without_upsert_keeps_first() {
        let mut ds = DatasetStore::new(MemoryStore::new());
        ds.store_dataset_by_default("d", &subsets(7), false).unwrap();
        ds.store_dataset_by_default("d", &subsets(9), false).unwrap();

        let train = ds.fetch_subset("d", Subset::Train).unwrap().unwrap();
        assert_eq!(train.data, vec![vec![7, 2]]);
        assert!(ds.fetch_subset("d", Subset::Valid).unwrap().is_none());
        assert_eq!(ds.store().count(DATASETS), 2);
    }

    #[test]
    fn test_store_dataset_with_upsert_replaces() {
        let mut ds = DatasetStore::new(MemoryStore::new());
        ds.store_dataset_by_default("d", &subsets(7), false).unwrap();
        ds.store_dataset_by_default("d", &subsets(9), true).unwrap();

        let test = ds.fetch_subset("d", Subset::Test).unwrap().unwrap();
        assert_eq!(test.data, vec![vec![9]]);
        assert_eq!(ds.store().count(DATASETS), 2);
    }

    #[test]
    fn test_vocabulary_round_trip() {
        let mut ds = DatasetStore::new(MemoryStore::new());
        let vocab = Vocabulary::build(["good", "bad", "good"], None).unwrap();
        ds.store_vocabulary("v", &vocab, WriteMode::InsertIfAbsent).unwrap();

        assert_eq!(ds.fetch_vocabulary("v").unwrap(), Some(vocab));
        assert!(ds.fetch_vocabulary("other").unwrap().is_none());

        let w2i = ds.store().find_one(WORD_TO_ID, &doc([("name", json!("v"))])).unwrap().unwrap();
        let parsed: BTreeMap<String, u32> = serde_json::from_str(w2i["data"].as_str().unwrap()).unwrap();
        assert_eq!(parsed["good"], 1);
    }

    fn sentences(first: u32) -> BTreeMap<Subset, SentenceSet> {
        let mut out = BTreeMap::new();
        out.insert(Subset::Train, SentenceSet { data: vec![vec![first, 2], vec![3]], ids: vec![1, 4] });
        out.insert(Subset::Test,  SentenceSet { data: vec![vec![first]], ids: vec![2] });
        out
    }

    #[test]
    fn test_store_sentences_schema_and_modes() {
        let mut ds = DatasetStore::new(MemoryStore::new());
        ds.store_sentences("s", &sentences(7), WriteMode::InsertIfAbsent).unwrap();

        let key = doc([("name", json!("s")), ("set", json!("train"))]);
        let train = ds.store().find_one(SENTENCES, &key).unwrap().unwrap();
        assert_eq!(train["name"], json!("s"));
        assert_eq!(train["set"], json!("train"));
        assert_eq!(train["data"], json!([[7, 2], [3]]));
        assert_eq!(train["ids"], json!([1, 4]));
        assert_eq!(ds.store().count(SENTENCES), 2);

        // without upsert the first write stays
        ds.store_sentences("s", &sentences(9), WriteMode::InsertIfAbsent).unwrap();
        assert_eq!(ds.store().find_one(SENTENCES, &key).unwrap().unwrap()["data"], json!([[7, 2], [3]]));

        ds.store_sentences("s", &sentences(9), WriteMode::Replace).unwrap();
        assert_eq!(ds.store().find_one(SENTENCES, &key).unwrap().unwrap()["data"], json!([[9, 2], [3]]));
        assert_eq!(ds.store().count(SENTENCES), 2);
    }

    #[test]
    fn test_seed_record() {
        let mut ds = DatasetStore::new(MemoryStore::new());
        assert!(!ds.is_dataset_inserted("d", "sp").unwrap());
        assert_eq!(ds.dataset_inserted("d", "sp").unwrap(), WriteOutcome::Inserted);
        assert_eq!(ds.dataset_inserted("d", "sp").unwrap(), WriteOutcome::Retained);
        assert!(ds.is_dataset_inserted("d", "sp").unwrap());
        assert!(!ds.is_dataset_inserted("d", "lm").unwrap());
    }
}
