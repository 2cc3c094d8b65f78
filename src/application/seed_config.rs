// ============================================================
// Layer 2 — Seed Configuration
// ============================================================
// Parses `config/db/sp.yml` and turns every entry into a typed
// loader description.
//
//   seed: 42                       # optional
//   datasets:
//     - name: sst
//       dir: sentiment_prediction/sst
//       type: sst
//       scheme: {train: 0.8, valid: 0.1, test: 0.1}
//
// The `type` field selects a constructor from LOADERS. Each
// constructor reads the loader's own scheme keys; `upsert` always
// comes from the caller, never from the file.
//
// Why a constructor table instead of a match on strings?
//   Adding a corpus means one new row in LOADERS and one scheme
//   struct. Unknown types fall out of the lookup naturally and
//   the caller decides how loud to be about them.
//
// Reference: serde_yaml documentation
//            Rust Book §6 (Enums and Pattern Matching)

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::{fs, path::Path};

pub const DEFAULT_IMDB_WORDS: usize = 100_000;
pub const DEFAULT_YELP_WORDS: usize = 10_000;
pub const DEFAULT_VALID_PORTION: f64 = 0.1;

/// Name that selects the balanced two-class yelp variant
pub const YELP_BINARY_NAME: &str = "yelp-2";

#[derive(Debug, Clone, Deserialize)]
pub struct SeedFile {
    /// Seed for shuffling and balancing; entropy when absent
    #[serde(default)]
    pub seed:     Option<u64>,
    pub datasets: Vec<SeedEntry>,
}

impl SeedFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read seed config '{}'", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Invalid seed config '{}'", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    pub name:   String,
    pub dir:    String,
    #[serde(rename = "type")]
    pub kind:   String,
    pub scheme: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SstScheme {
    /// Subset name and fraction, in file order
    pub fractions: Vec<(String, f64)>,
    pub upsert:    bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImdbScheme {
    #[serde(default = "default_imdb_words")]
    pub n_words:       usize,
    #[serde(default = "default_valid_portion")]
    pub valid_portion: f64,
    #[serde(skip)]
    pub upsert:        bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct YelpScheme {
    #[serde(default = "default_yelp_words")]
    pub n_words: usize,
    #[serde(skip)]
    pub binary:  bool,
    #[serde(skip)]
    pub upsert:  bool,
}

fn default_imdb_words() -> usize { DEFAULT_IMDB_WORDS }
fn default_yelp_words() -> usize { DEFAULT_YELP_WORDS }
fn default_valid_portion() -> f64 { DEFAULT_VALID_PORTION }

/// One fully parsed seed entry.
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderSpec {
    Sst(SstScheme),
    Imdb(ImdbScheme),
    Yelp(YelpScheme),
}

impl LoaderSpec {
    pub fn upsert(&self) -> bool {
        match self {
            LoaderSpec::Sst(s)  => s.upsert,
            LoaderSpec::Imdb(s) => s.upsert,
            LoaderSpec::Yelp(s) => s.upsert,
        }
    }
}

pub type Constructor = fn(&SeedEntry, bool) -> Result<LoaderSpec>;

/// Supported `type` values.
pub const LOADERS: &[(&str, Constructor)] = &[
    ("sst", sst_spec),
    ("imdb", imdb_spec),
    ("yelp", yelp_spec),
];

/// Build the loader for `entry`; `None` when its type is unknown.
pub fn loader_spec(entry: &SeedEntry, upsert: bool) -> Result<Option<LoaderSpec>> {
    let Some((_, build)) = LOADERS.iter().find(|(kind, _)| *kind == entry.kind) else {
        return Ok(None);
    };
    let spec = build(entry, upsert)
        .with_context(|| format!("Invalid scheme for dataset '{}'", entry.name))?;
    Ok(Some(spec))
}

fn scheme_mapping(entry: &SeedEntry) -> Result<Mapping> {
    match &entry.scheme {
        Value::Null         => Ok(Mapping::new()),
        Value::Mapping(map) => Ok(map.clone()),
        other               => bail!("scheme must be a mapping, got {:?}", other),
    }
}

fn sst_spec(entry: &SeedEntry, upsert: bool) -> Result<LoaderSpec> {
    let mut fractions = Vec::new();
    for (key, value) in scheme_mapping(entry)? {
        let Some(name) = key.as_str() else {
            bail!("subset names must be strings, got {:?}", key);
        };
        if name == "upsert" {
            continue;
        }
        let Some(fraction) = value.as_f64() else {
            bail!("fraction of subset '{name}' is not a number");
        };
        fractions.push((name.to_string(), fraction));
    }
    Ok(LoaderSpec::Sst(SstScheme { fractions, upsert }))
}

fn imdb_spec(entry: &SeedEntry, upsert: bool) -> Result<LoaderSpec> {
    let mut scheme: ImdbScheme = serde_yaml::from_value(Value::Mapping(scheme_mapping(entry)?))?;
    if !(0.0..1.0).contains(&scheme.valid_portion) {
        bail!("valid_portion {} is outside [0, 1)", scheme.valid_portion);
    }
    scheme.upsert = upsert;
    Ok(LoaderSpec::Imdb(scheme))
}

fn yelp_spec(entry: &SeedEntry, upsert: bool) -> Result<LoaderSpec> {
    let mut scheme: YelpScheme = serde_yaml::from_value(Value::Mapping(scheme_mapping(entry)?))?;
    scheme.binary = entry.name == YELP_BINARY_NAME;
    scheme.upsert = upsert;
    Ok(LoaderSpec::Yelp(scheme))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
seed: 7
datasets:
  - name: sst
    dir: sentiment_prediction/sst
    type: sst
    scheme: {train: 0.8, test: 0.1, valid: 0.1, upsert: false}
  - name: imdb
    dir: sentiment_prediction/imdb
    type: imdb
    scheme: {n_words: 20000}
  - name: yelp-2
    dir: sentiment_prediction/yelp
    type: yelp
    scheme: {upsert: false}
  - name: ptb
    dir: ptb
    type: lm
    scheme:
";

    fn entries() -> Vec<SeedEntry> {
        SeedFile::from_yaml(SAMPLE).unwrap().datasets
    }

    #[test]
    fn test_parse_file() {
        let file = SeedFile::from_yaml(SAMPLE).unwrap();
        assert_eq!(file.seed, Some(7));
        assert_eq!(file.datasets.len(), 4);
        assert_eq!(file.datasets[1].kind, "imdb");
    }

    #[test]
    fn test_seed_is_optional() {
        let file = SeedFile::from_yaml("datasets: []").unwrap();
        assert_eq!(file.seed, None);
        assert!(file.datasets.is_empty());
    }

    #[test]
    fn test_sst_keeps_order_and_drops_upsert_key() {
        let spec = loader_spec(&entries()[0], true).unwrap().unwrap();
        assert_eq!(
            spec,
            LoaderSpec::Sst(SstScheme {
                fractions: vec![
                    ("train".to_string(), 0.8),
                    ("test".to_string(), 0.1),
                    ("valid".to_string(), 0.1),
                ],
                upsert: true,
            })
        );
    }

    #[test]
    fn test_imdb_defaults() {
        let spec = loader_spec(&entries()[1], false).unwrap().unwrap();
        assert_eq!(
            spec,
            LoaderSpec::Imdb(ImdbScheme { n_words: 20000, valid_portion: 0.1, upsert: false })
        );
    }

    #[test]
    fn test_yelp_binary_from_name_and_upsert_from_caller() {
        let spec = loader_spec(&entries()[2], true).unwrap().unwrap();
        assert_eq!(
            spec,
            LoaderSpec::Yelp(YelpScheme { n_words: DEFAULT_YELP_WORDS, binary: true, upsert: true })
        );
        assert!(spec.upsert());
    }

    #[test]
    fn test_unknown_type_is_none() {
        assert!(loader_spec(&entries()[3], false).unwrap().is_none());
    }

    #[test]
    fn test_bad_schemes_rejected() {
        let mut entry = entries()[0].clone();
        entry.scheme = serde_yaml::from_str("{train: lots}").unwrap();
        assert!(loader_spec(&entry, false).is_err());

        let mut entry = entries()[1].clone();
        entry.scheme = serde_yaml::from_str("[1, 2]").unwrap();
        assert!(loader_spec(&entry, false).is_err());

        entry.scheme = serde_yaml::from_str("{valid_portion: 1.5}").unwrap();
        assert!(loader_spec(&entry, false).is_err());
    }
}
