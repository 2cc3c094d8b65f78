// ============================================================
// Layer 5 — Hidden-State Analysis
// ============================================================
// Offline statistics over hidden states recorded while a trained
// model was evaluated. The model itself runs elsewhere; this
// layer only reads its evaluation records.
//
//   states.rs — fetch per-token records and turn the absolute
//               activations into step-to-step differences
//
//   stats.rs  — group differences by vocabulary id, compute
//               per-layer mean / std / error bars, and pick the
//               ids with the strongest mean response per neuron
//
// A state is a `layers × units` matrix (ndarray::Array2<f32>).
//
// Why keep this layer free of I/O beyond the store trait?
//   The same statistics run on states from the store, from the
//   cache, or from a test fixture built in memory.
//
// Reference: ndarray documentation

/// Fetching evaluation traces and computing state differences
pub mod states;

/// Per-id grouping, descriptive statistics and candidate search
pub mod stats;
