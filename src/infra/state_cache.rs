// ============================================================
// Layer 6 — State Cache
// ============================================================
// Persists the state series fetched for one (dataset, model,
// state) triple so repeated analysis runs skip the store.
//
// Files per triple, inside the cache directory:
//   {dataset}-{model}-words.pkl    ← word ids, one per step
//   {dataset}-{model}-{state}.pkl  ← state differences
//
// Both files are bincode-encoded and start with the hex SHA-256
// of "dataset\0model\0state". A file whose key does not match
// the requested triple, or that fails to decode, is a miss.
//
// Staleness is not tracked: if the underlying records change,
// delete the cache directory.
//
// Why cache at all?
//   Fetching a long evaluation means one record per token and a
//   JSON parse per state. The differences are the same on every
//   run, so they are computed once.
//
// Why store the key inside the file?
//   File names are built from free-form names and can collide
//   ("a-b" + "c" vs "a" + "b-c"). The digest in the file makes a
//   collision a miss instead of wrong data.
//
// Reference: bincode documentation
//            sha2 crate documentation

use anyhow::{Context, Result};
use ndarray::Array2;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{fs, path::PathBuf};

use crate::analysis::states::StateSeries;

/// Identifies one cached state series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub dataset: String,
    pub model:   String,
    pub state:   String,
}

impl CacheKey {
    pub fn new(dataset: impl Into<String>, model: impl Into<String>, state: impl Into<String>) -> Self {
        Self { dataset: dataset.into(), model: model.into(), state: state.into() }
    }

    /// Hex SHA-256 of the three names, NUL-separated.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.dataset.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.model.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.state.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    pub fn words_file(&self) -> String {
        format!("{}-{}-words.pkl", self.dataset, self.model)
    }

    pub fn states_file(&self) -> String {
        format!("{}-{}-{}.pkl", self.dataset, self.model, self.state)
    }
}

#[derive(Serialize, Deserialize)]
struct CacheFile<T> {
    key:     String,
    payload: T,
}

pub struct StateCache {
    dir: PathBuf,
}

impl StateCache {
    /// Open the cache, creating its directory when missing.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create cache directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// The cached series, or `None` when either file is missing or stale.
    pub fn load(&self, key: &CacheKey) -> Result<Option<StateSeries>> {
        let digest = key.digest();

        let Some(word_ids) = self.read::<Vec<usize>>(&key.words_file(), &digest)? else {
            return Ok(None);
        };
        let Some(states) = self.read::<Vec<Array2<f32>>>(&key.states_file(), &digest)? else {
            return Ok(None);
        };
        if word_ids.len() != states.len() {
            tracing::warn!(
                "Cached word ids ({}) and states ({}) differ in length; ignoring cache",
                word_ids.len(),
                states.len()
            );
            return Ok(None);
        }

        tracing::info!("Loaded {} cached states for {}/{}", states.len(), key.dataset, key.model);
        Ok(Some(StateSeries { word_ids, states }))
    }

    pub fn save(&self, key: &CacheKey, series: &StateSeries) -> Result<()> {
        let digest = key.digest();
        self.write(&key.words_file(), &digest, &series.word_ids)?;
        self.write(&key.states_file(), &digest, &series.states)?;
        tracing::debug!("Cached {} states in '{}'", series.len(), self.dir.display());
        Ok(())
    }

    /// Return the cached series, computing and storing it on a miss.
    pub fn load_or_compute<F>(&self, key: &CacheKey, compute: F) -> Result<StateSeries>
    where
        F: FnOnce() -> Result<StateSeries>,
    {
        if let Some(series) = self.load(key)? {
            return Ok(series);
        }
        let series = compute()?;
        self.save(key, &series)?;
        Ok(series)
    }

    fn read<T: DeserializeOwned>(&self, name: &str, digest: &str) -> Result<Option<T>> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)
            .with_context(|| format!("Cannot read cache file '{}'", path.display()))?;

        match bincode::deserialize::<CacheFile<T>>(&bytes) {
            Ok(file) if file.key == digest => Ok(Some(file.payload)),
            Ok(_) => {
                tracing::warn!("Cache file '{}' belongs to another key", path.display());
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("Cannot decode cache file '{}': {}", path.display(), e);
                Ok(None)
            }
        }
    }

    fn write<T: Serialize>(&self, name: &str, digest: &str, payload: &T) -> Result<()> {
        let path = self.dir.join(name);
        let bytes = bincode::serialize(&CacheFile { key: digest.to_string(), payload })?;
        fs::write(&path, bytes)
            .with_context(|| format!("Cannot write cache file '{}'", path.display()))?;
        Ok(())
    }
}
