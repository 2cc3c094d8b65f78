// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the outside world:
//
//   document_store.rs — Document collections
//                       In-memory and JSON-file backends behind
//                       the DocumentStore trait.
//
//   dataset_store.rs  — Dataset persistence
//                       Vocabulary, sentences, subsets and seed
//                       records, with insert-if-absent / replace
//                       write modes.
//
//   download.rs       — Corpus download
//                       Fetches a zip archive over HTTP and
//                       unpacks it into the data directory.
//
//   state_cache.rs    — State series cache
//                       Bincode files keyed by a SHA-256 of the
//                       dataset, model and state names.
//
//   export.rs         — CSV export
//                       Candidate tables and error-bar series
//                       for external plotting.
//
// Why is this a separate layer?
//   File formats, HTTP and on-disk layouts change for reasons
//   unrelated to seeding or analysis. Keeping them here means
//   those workflows never change when a format does.
//
// Reference: Rust Book §7 (Modules)

/// Document collections (memory and JSON files)
pub mod document_store;

/// Dataset-level reads and writes on a document store
pub mod dataset_store;

/// Zip archive download and unpacking
pub mod download;

/// Cached state series
pub mod state_cache;

/// Analysis CSV writer
pub mod export;
