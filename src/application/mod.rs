// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal
// (seeding the database or analysing recorded states).
//
// Rules for this layer:
//   - No text processing or statistics here (Layers 4 and 5)
//   - No printing here (that's Layer 1)
//   - Storage only through the DocumentStore trait
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

/// Directory layout and environment overrides
pub mod settings;

/// `config/db/sp.yml` parsing and loader dispatch
pub mod seed_config;

/// The database seeding workflow
pub mod seed_use_case;

/// The hidden-state analysis workflow
pub mod analyze_use_case;
