// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between the pipelines and the outside world:
//   - DocumentStore → where datasets and evaluation records live
//   - SourceFetcher → how a missing raw corpus is obtained
//
// Implementations live in Layer 6 (infra).
//
// Why traits here and implementations elsewhere?
//   The workflows in Layer 2 only see these signatures, so a
//   test can hand them an in-memory store or a fetcher that
//   never touches the network.
//
// Reference: Rust Book §10 (Traits), §17 (Trait Objects)

use anyhow::Result;
use std::path::Path;

use crate::domain::document::Document;

// ─── DocumentStore ────────────────────────────────────────────────────────────
/// A collection-oriented document database.
///
/// Implementations:
///   - MemoryStore   → in-process collections
///   - JsonFileStore → one JSON file per collection
///
/// Writes must be visible to the next read on the same store.
pub trait DocumentStore {
    /// All documents in `collection` matching `filter`, in insertion order.
    fn find(&self, collection: &str, filter: &Document) -> Result<Vec<Document>>;

    /// First document in `collection` matching `filter`.
    fn find_one(&self, collection: &str, filter: &Document) -> Result<Option<Document>> {
        Ok(self.find(collection, filter)?.into_iter().next())
    }

    /// Append a document. A numeric `_id` is assigned when absent.
    fn insert_one(&mut self, collection: &str, document: Document) -> Result<()>;

    /// Replace the first document matching `filter`, keeping its `_id`.
    /// With `upsert` the document is inserted when nothing matches.
    /// Returns true if an existing document was replaced.
    fn replace_one(
        &mut self,
        collection: &str,
        filter:     &Document,
        document:   Document,
        upsert:     bool,
    ) -> Result<bool>;
}

// ─── SourceFetcher ────────────────────────────────────────────────────────────
/// Anything able to materialise a raw corpus on disk.
///
/// Implementations:
///   - ZipDownloader → fetches and unpacks a corpus archive over HTTP
pub trait SourceFetcher {
    /// Download and unpack the corpus so that `target_dir` exists.
    fn fetch(&self, target_dir: &Path) -> Result<()>;
}
