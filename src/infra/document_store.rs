// ============================================================
// Layer 6 — Document Store Backends
// ============================================================
// Two implementations of the DocumentStore trait:
//
//   MemoryStore   — collections held in a HashMap; used by tests
//                   and for dry runs
//   JsonFileStore — one `<collection>.json` file per collection
//                   inside a directory
//
// JsonFileStore reads the whole collection file for every call
// and rewrites it on every write, so a write is visible to the
// next read immediately. Single writer per directory assumed.
//
// File layout:
//   db/
//     word_to_id.json        ← [{"_id":0,"name":"sst","data":"{…}"}, …]
//     id_to_word.json
//     datasets.json
//     …
//
// Why a trait with two backends?
//   The seeding and analysis workflows only ever ask for
//   "find", "insert" and "replace". Tests run them against the
//   in-memory store, the binary against JSON files, and neither
//   workflow knows the difference.
//
// Reference: Rust Book §10 (Traits), §17 (Trait Objects)
//            serde_json documentation

use anyhow::{bail, Context, Result};
use serde_json::json;
use std::collections::HashMap;
use std::{fs, path::PathBuf};

use crate::domain::document::{id_of, matches, Document, ID_FIELD};
use crate::domain::traits::DocumentStore;

fn next_id(docs: &[Document]) -> u64 {
    docs.iter().filter_map(id_of).max().map_or(0, |max| max + 1)
}

fn insert_into(docs: &mut Vec<Document>, mut document: Document) {
    if !document.contains_key(ID_FIELD) {
        document.insert(ID_FIELD.to_string(), json!(next_id(docs)));
    }
    docs.push(document);
}

/// Replace in place keeping `_id`; returns true if something matched.
fn replace_in(docs: &mut Vec<Document>, filter: &Document, mut document: Document, upsert: bool) -> bool {
    if let Some(existing) = docs.iter_mut().find(|d| matches(d, filter)) {
        if let Some(id) = existing.get(ID_FIELD).cloned() {
            document.insert(ID_FIELD.to_string(), id);
        }
        *existing = document;
        return true;
    }
    if upsert {
        insert_into(docs, document);
    }
    false
}

// ─── MemoryStore ──────────────────────────────────────────────────────────────
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, Vec::len)
    }
}

impl DocumentStore for MemoryStore {
    fn find(&self, collection: &str, filter: &Document) -> Result<Vec<Document>> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| matches(d, filter)).cloned().collect())
            .unwrap_or_default())
    }

    fn insert_one(&mut self, collection: &str, document: Document) -> Result<()> {
        insert_into(self.collections.entry(collection.to_string()).or_default(), document);
        Ok(())
    }

    fn replace_one(
        &mut self,
        collection: &str,
        filter:     &Document,
        document:   Document,
        upsert:     bool,
    ) -> Result<bool> {
        let docs = self.collections.entry(collection.to_string()).or_default();
        Ok(replace_in(docs, filter, document, upsert))
    }
}

// ─── JsonFileStore ────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    /// Directory holding one JSON file per collection
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create store directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    fn path(&self, collection: &str) -> Result<PathBuf> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            bail!("invalid collection name '{collection}'");
        }
        Ok(self.dir.join(format!("{collection}.json")))
    }

    fn load(&self, collection: &str) -> Result<Vec<Document>> {
        let path = self.path(collection)?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read collection '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Collection file '{}' is not a JSON array of objects", path.display()))
    }

    fn save(&self, collection: &str, docs: &[Document]) -> Result<()> {
        let path = self.path(collection)?;
        // Write beside the target, then rename over it
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string(docs)?)
            .with_context(|| format!("Cannot write '{}'", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Cannot replace '{}'", path.display()))?;
        tracing::debug!("Wrote {} documents to '{}'", docs.len(), path.display());
        Ok(())
    }
}

impl DocumentStore for JsonFileStore {
    fn find(&self, collection: &str, filter: &Document) -> Result<Vec<Document>> {
        Ok(self
            .load(collection)?
            .into_iter()
            .filter(|d| matches(d, filter))
            .collect())
    }

    fn insert_one(&mut self, collection: &str, document: Document) -> Result<()> {
        let mut docs = self.load(collection)?;
        insert_into(&mut docs, document);
        self.save(collection, &docs)
    }

    fn replace_one(
        &mut self,
        collection: &str,
        filter:     &Document,
        document:   Document,
        upsert:     bool,
    ) -> Result<bool> {
        let mut docs = self.load(collection)?;
        let before = docs.len();
        let replaced = replace_in(&mut docs, filter, document, upsert);
        // an upsert with no match grew the collection and must be saved too
        if replaced || docs.len() != before {
            self.save(collection, &docs)?;
        }
        Ok(replaced)
    }
}
