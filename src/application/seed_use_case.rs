// ============================================================
// Layer 2 — SeedUseCase
// ============================================================
// Populates the document store from `config/db/sp.yml`:
//
//   For every configured dataset, in file order:
//     Step 1: Resolve the loader from its `type`   (skip if unknown)
//     Step 2: Load, tokenise, encode and split     (Layer 4 - data)
//     Step 3: Store vocabulary and sentences       (Layer 6 - infra)
//     Step 4: Store train / valid / test subsets   (Layer 6 - infra)
//     Step 5: Write the seed record {name, "sp"}   (Layer 6 - infra)
//
// Without upsert nothing already stored is touched, so seeding
// twice leaves the store as it was after the first run.
//
// Why one random source for the whole file?
//   With a `seed` in the config every shuffle, in every dataset,
//   comes from the same reproducible stream. Reordering entries
//   changes the splits; rerunning the same file does not.
//
// Reference: rand_chacha documentation
//            Rust Book §17 (Trait Objects)

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};

use crate::application::seed_config::{loader_spec, LoaderSpec, SeedFile};
use crate::data::{dataset::PreparedDataset, imdb::load_imdb, sst::load_sst, yelp::load_yelp};
use crate::domain::traits::{DocumentStore, SourceFetcher};
use crate::infra::dataset_store::{DatasetStore, WriteMode};

/// Category of every seed record written here
pub const SEED_CATEGORY: &str = "sp";

pub struct SeedUseCase<S: DocumentStore> {
    datasets: DatasetStore<S>,
    fetcher:  Box<dyn SourceFetcher>,
    data_dir: PathBuf,
}

impl<S: DocumentStore> SeedUseCase<S> {
    /// `data_dir` is the root that each entry's `dir` is resolved against.
    pub fn new(store: S, fetcher: Box<dyn SourceFetcher>, data_dir: impl Into<PathBuf>) -> Self {
        Self { datasets: DatasetStore::new(store), fetcher, data_dir: data_dir.into() }
    }

    pub fn datasets(&self) -> &DatasetStore<S> {
        &self.datasets
    }

    pub fn into_store(self) -> S {
        self.datasets.into_store()
    }

    /// Seed every dataset listed in the YAML file at `config`.
    pub fn execute(&mut self, config: &Path, upsert: bool) -> Result<Vec<String>> {
        let file = SeedFile::load(config)?;
        self.seed(&file, upsert)
    }

    /// Seed every entry of `file`; returns the names that were processed.
    pub fn seed(&mut self, file: &SeedFile, upsert: bool) -> Result<Vec<String>> {
        let mut rng = match file.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None       => ChaCha8Rng::from_entropy(),
        };
        let mut seeded = Vec::new();

        for entry in &file.datasets {
            tracing::info!("seeding {} data", entry.name);

            let Some(spec) = loader_spec(entry, upsert)? else {
                tracing::warn!("not able to seed datasets with type: {}", entry.kind);
                continue;
            };

            let dir = self.data_dir.join(&entry.dir);
            let prepared = self
                .load(&spec, &dir, &mut rng)
                .with_context(|| format!("Cannot load dataset '{}' from '{}'", entry.name, dir.display()))?;
            tracing::info!(
                "Prepared '{}': {} ids in vocabulary, {} examples",
                entry.name,
                prepared.vocabulary.len(),
                prepared.example_count()
            );

            self.store(&entry.name, &prepared, spec.upsert())?;
            self.datasets.dataset_inserted(&entry.name, SEED_CATEGORY)?;
            seeded.push(entry.name.clone());
        }

        Ok(seeded)
    }

    fn load(&self, spec: &LoaderSpec, dir: &Path, rng: &mut ChaCha8Rng) -> Result<PreparedDataset> {
        match spec {
            LoaderSpec::Sst(s)  => load_sst(dir, &s.fractions, &*self.fetcher, rng),
            LoaderSpec::Imdb(s) => load_imdb(dir, s.n_words, s.valid_portion, rng),
            LoaderSpec::Yelp(s) => load_yelp(dir, s.n_words, s.binary, rng),
        }
    }

    fn store(&mut self, name: &str, prepared: &PreparedDataset, upsert: bool) -> Result<()> {
        let mode = WriteMode::from_upsert(upsert);
        self.datasets.store_vocabulary(name, &prepared.vocabulary, mode)?;
        if let Some(sentences) = &prepared.sentences {
            self.datasets.store_sentences(name, sentences, mode)?;
        }
        self.datasets.store_dataset_by_default(name, &prepared.subsets, upsert)
    }
}
