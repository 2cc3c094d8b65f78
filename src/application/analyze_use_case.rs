// ============================================================
// Layer 2 — AnalyzeUseCase
// ============================================================
// Summarises how each vocabulary id moves a model's hidden state:
//
//   Step 1: Load the state series, from cache or store  (Layer 6 / 5)
//   Step 2: Group state differences by word id          (Layer 5)
//   Step 3: Mean / std per id and layer                 (Layer 5)
//   Step 4: Top-k ids per unit, written as CSV          (Layer 5 / 6)
//   Step 5: Error-bar series for the selected ids       (Layer 5 / 6)
//
// Why only the first `candidate_ids` ids in Step 3?
//   Vocabulary ids are assigned by descending frequency, so the
//   low ids are the words seen often enough for a mean change
//   to mean something. Rare words would win the ranking on the
//   strength of one or two noisy occurrences.
//
// Why zeros for ids never observed?
//   Keeping one row per id lets a candidate's row index be its
//   vocabulary id, and a zero mean ranks no higher than any
//   observed change.
//
// Every state must share one (layers, units) shape. A series
// that mixes shapes, from the store or from a stale cache, is
// an error rather than a partial report.
//
// Configured by `config/analysis.yml`.
//
// Reference: Rust Book §10 (Generic Types, Traits, and Lifetimes)

use anyhow::{bail, Context, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::analysis::{
    states::{fetch_states, DEFAULT_STATE},
    stats::{compute_stats, find_candidate, id_frequencies, sort_by_id},
};
use crate::domain::traits::DocumentStore;
use crate::infra::{
    export::{CsvExporter, DimSlice},
    state_cache::{CacheKey, StateCache},
};

// ─── Analysis Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeConfig {
    pub data_name:  String,
    pub model_name: String,

    #[serde(default = "default_state_name")]
    pub state_name: String,

    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Only the first `candidate_ids` ids compete in the candidate search
    #[serde(default = "default_candidate_ids")]
    pub candidate_ids: usize,

    /// Candidates kept per unit
    #[serde(default = "default_k")]
    pub k: usize,

    /// Ids whose error-bar series are exported
    #[serde(default)]
    pub plot_ids: IdRange,

    #[serde(default)]
    pub dims: DimSlice,
}

/// Half-open id range `start..stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    pub start: usize,
    pub stop:  usize,
}

impl Default for IdRange {
    fn default() -> Self {
        Self { start: 50, stop: 60 }
    }
}

fn default_state_name() -> String { DEFAULT_STATE.to_string() }
fn default_cache_dir() -> PathBuf { PathBuf::from("cache") }
fn default_output_dir() -> PathBuf { PathBuf::from("output") }
fn default_candidate_ids() -> usize { 1000 }
fn default_k() -> usize { 20 }

impl AnalyzeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read analysis config '{}'", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid analysis config '{}'", path.display()))
    }
}

/// What one run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeReport {
    pub state_count: usize,
    pub layer_count: usize,
    pub distinct_ids: usize,
    /// Ids that received an error-bar file
    pub plotted: Vec<usize>,
}

// ─── AnalyzeUseCase ───────────────────────────────────────────────────────────
pub struct AnalyzeUseCase<'a, S: DocumentStore + ?Sized> {
    store:  &'a S,
    config: AnalyzeConfig,
}

impl<'a, S: DocumentStore + ?Sized> AnalyzeUseCase<'a, S> {
    pub fn new(store: &'a S, config: AnalyzeConfig) -> Self {
        Self { store, config }
    }

    pub fn execute(&self) -> Result<AnalyzeReport> {
        let cfg = &self.config;

        // ── Step 1: State series ─────────────────────────────────────────────
        let cache = StateCache::new(&cfg.cache_dir)?;
        let key = CacheKey::new(&cfg.data_name, &cfg.model_name, &cfg.state_name);
        let series = cache.load_or_compute(&key, || {
            fetch_states(self.store, &cfg.data_name, &cfg.model_name, &cfg.state_name)
        })?;
        let Some((layer_num, unit_num)) = series.shape()? else {
            bail!(
                "no recorded '{}' states for model '{}' on '{}'",
                cfg.state_name,
                cfg.model_name,
                cfg.data_name
            );
        };
        let state_count = series.len();
        tracing::info!("{} states of shape {}x{}", state_count, layer_num, unit_num);

        // ── Step 2: Group by word id ─────────────────────────────────────────
        let by_id = sort_by_id(&series.word_ids, series.states)?;
        let distinct_ids = id_frequencies(&by_id).iter().filter(|&&n| n > 0).count();
        tracing::info!("{} distinct word ids observed", distinct_ids);

        // ── Step 3: Per-id statistics (zeros for unseen ids) ─────────────────
        let mut mean_n: Vec<Vec<Array1<f32>>> = vec![Vec::new(); layer_num];
        let mut std_n:  Vec<Vec<Array1<f32>>> = vec![Vec::new(); layer_num];
        for states in by_id.iter().take(cfg.candidate_ids) {
            match states {
                Some(states) => {
                    let stats = compute_stats(states, false)?;
                    for layer in 0..layer_num {
                        mean_n[layer].push(stats.means[layer].clone());
                        std_n[layer].push(stats.stds[layer].clone());
                    }
                }
                None => {
                    for layer in 0..layer_num {
                        mean_n[layer].push(Array1::zeros(unit_num));
                        std_n[layer].push(Array1::zeros(unit_num));
                    }
                }
            }
        }

        // ── Step 4: Candidates per layer ─────────────────────────────────────
        let exporter = CsvExporter::new(&cfg.output_dir)?;
        for layer in 0..layer_num {
            let cand = find_candidate(&mean_n[layer], &std_n[layer], cfg.k)?;
            exporter.write_candidates(&cfg.data_name, &cfg.model_name, layer, cfg.k, &cand)?;
        }
        tracing::info!("Wrote candidate tables for {} layers to '{}'", layer_num, exporter.dir().display());

        // ── Step 5: Error bars ───────────────────────────────────────────────
        let mut plotted = Vec::new();
        for word_id in cfg.plot_ids.start..cfg.plot_ids.stop.min(by_id.len()) {
            let Some(states) = &by_id[word_id] else {
                continue;
            };
            let stats = compute_stats(states, true)?;
            exporter.write_error_bars(&cfg.data_name, &cfg.model_name, word_id, &stats, &cfg.dims)?;
            plotted.push(word_id);
        }
        tracing::info!("Wrote error bars for {} ids", plotted.len());

        Ok(AnalyzeReport { state_count, layer_count: layer_num, distinct_ids, plotted })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::states::{EVALUATIONS, EVAL_RECORDS};
    use crate::domain::document::doc;
    use crate::infra::document_store::MemoryStore;
    use serde_json::json;

    /// One evaluation of two layers by two units over the words 2, 0, 2, 3.
    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .insert_one(EVALUATIONS, doc([
                ("_id", json!(1)),
                ("data_name", json!("ptb")),
                ("model_name", json!("lstm")),
            ]))
            .unwrap();
        let steps = [
            (2, json!([[1.0, 0.0], [0.0, 0.0]])),
            (0, json!([[2.0, 0.0], [0.0, 1.0]])),
            (2, json!([[2.0, 4.0], [0.0, 1.0]])),
            (3, json!([[0.0, 4.0], [1.0, 1.0]])),
        ];
        for (i, (word_id, state)) in steps.into_iter().enumerate() {
            store
                .insert_one(EVAL_RECORDS, doc([
                    ("eval_id", json!(1)),
                    ("id", json!(i)),
                    ("word_id", json!(word_id)),
                    ("state_c", state),
                ]))
                .unwrap();
        }
        store
    }

    fn config(root: &Path) -> AnalyzeConfig {
        AnalyzeConfig {
            data_name:     "ptb".into(),
            model_name:    "lstm".into(),
            state_name:    "state_c".into(),
            cache_dir:     root.join("cache"),
            output_dir:    root.join("out"),
            candidate_ids: 1000,
            k:             2,
            plot_ids:      IdRange { start: 0, stop: 10 },
            dims:          DimSlice { start: 0, stop: 600, step: 1 },
        }
    }

    #[test]
    fn test_config_defaults() {
        let cfg: AnalyzeConfig = serde_yaml::from_str("data_name: ptb\nmodel_name: LSTM-PTB\n").unwrap();
        assert_eq!(cfg.state_name, "state_c");
        assert_eq!(cfg.candidate_ids, 1000);
        assert_eq!(cfg.k, 20);
        assert_eq!(cfg.plot_ids, IdRange { start: 50, stop: 60 });
        assert_eq!(cfg.dims, DimSlice::default());
    }

    #[test]
    fn test_execute_writes_candidates_and_error_bars() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store();
        let report = AnalyzeUseCase::new(&store, config(tmp.path())).execute().unwrap();

        assert_eq!(report.state_count, 4);
        assert_eq!(report.layer_count, 2);
        assert_eq!(report.distinct_ids, 3);
        assert_eq!(report.plotted, vec![0, 2, 3]);

        // diffs: id2 → [[1,0],[0,0]] and [[0,4],[0,0]]; id0 → [[1,0],[0,1]]; id3 → [[-2,0],[1,0]]
        // layer 0 unit 0 means: id0 1, id1 0, id2 0.5, id3 -2
        let out = tmp.path().join("out");
        let cand = fs::read_to_string(out.join("cand-ptb-lstm-0-2.csv")).unwrap();
        assert_eq!(cand.lines().next(), Some("3,0"));
        assert!(out.join("mean-ptb-lstm-1-2.csv").exists());
        assert!(out.join("std-ptb-lstm-1-2.csv").exists());
        assert!(out.join("errorbar-ptb-lstm-2.csv").exists());
        assert!(!out.join("errorbar-ptb-lstm-1.csv").exists());
    }

    #[test]
    fn test_second_run_uses_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store();
        let first = AnalyzeUseCase::new(&store, config(tmp.path())).execute().unwrap();

        // an empty store still works because the series is cached
        let empty = MemoryStore::new();
        let second = AnalyzeUseCase::new(&empty, config(tmp.path())).execute().unwrap();
        assert_eq!(first, second);
        assert!(tmp.path().join("cache").join("ptb-lstm-words.pkl").exists());
    }

    #[test]
    fn test_mixed_state_shapes_are_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = MemoryStore::new();
        for id in [1, 2] {
            store
                .insert_one(EVALUATIONS, doc([
                    ("_id", json!(id)),
                    ("data_name", json!("ptb")),
                    ("model_name", json!("lstm")),
                ]))
                .unwrap();
        }
        // a two-layer run for word 0, a one-layer run for word 1
        let steps = [(1, 0, json!([[1.0], [2.0]])), (2, 1, json!([[1.0]]))];
        for (eval_id, word_id, state) in steps {
            store
                .insert_one(EVAL_RECORDS, doc([
                    ("eval_id", json!(eval_id)),
                    ("id", json!(0)),
                    ("word_id", json!(word_id)),
                    ("state_c", state),
                ]))
                .unwrap();
        }

        let err = AnalyzeUseCase::new(&store, config(tmp.path())).execute().unwrap_err();
        assert!(format!("{err:#}").contains("shape"));
        assert!(!tmp.path().join("out").join("cand-ptb-lstm-0-2.csv").exists());
    }

    #[test]
    fn test_no_states_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let empty = MemoryStore::new();
        assert!(AnalyzeUseCase::new(&empty, config(tmp.path())).execute().is_err());
    }

    #[test]
    fn test_load_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("analysis.yml");
        fs::write(&path, "data_name: ptb\nmodel_name: lstm\nk: 5\ndims: {step: 10}\n").unwrap();
        let cfg = AnalyzeConfig::load(&path).unwrap();
        assert_eq!(cfg.k, 5);
        assert_eq!(cfg.dims.step, 10);
        assert_eq!(cfg.dims.stop, 600);
        assert!(AnalyzeConfig::load(&tmp.path().join("missing.yml")).is_err());
    }
}
