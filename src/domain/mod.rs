// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs, enums and traits describing what the system
// works with: store documents, labelled examples, subsets,
// and the seams other layers implement.
//
// Rules for this layer:
//   - NO file I/O or network calls
//   - NO array maths (that lives in `analysis`)
//   - Only plain Rust structs, enums, and traits
//
// Why keep this layer pure?
//   Every other layer depends on it. Keeping it free of I/O
//   means its types can be built and checked in any test.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A schemaless store document and key filters over it
pub mod document;

// Labelled token sequences and the train/valid/test subsets
pub mod example;

// Core abstractions (traits) that other layers implement
pub mod traits;
