// ============================================================
// Layer 4 — Movie-Review Corpus Loader
// ============================================================
// Loads the `aclImdb` directory layout:
//
//   train/pos/*.txt   train/neg/*.txt
//   test/pos/*.txt    test/neg/*.txt
//
// Each file holds one review; positive reviews get label 1 and
// negative reviews label 0. The vocabulary is built from the
// training reviews only and capped at `n_words`. A shuffled
// `valid_portion` of the training reviews becomes the
// validation subset.
//
// Why build the vocabulary from the training reviews only?
//   Test reviews must look unseen. Words that only appear in
//   the test set should encode to `<unk>`, exactly as they would
//   for any new review.
//
// Reference: Rust Book §9 (Error Handling), §12 (I/O)

use anyhow::{Context, Result};
use rand::Rng;
use std::collections::BTreeMap;
use std::{fs, path::Path};

use crate::data::dataset::PreparedDataset;
use crate::data::preprocessor::Preprocessor;
use crate::data::splitter::split_train_val;
use crate::data::tokenizer::Tokenizer;
use crate::data::vocabulary::Vocabulary;
use crate::domain::example::{Subset, SubsetData};

const POLARITIES: [(&str, i64); 2] = [("pos", 1), ("neg", 0)];

/// One tokenised review with its polarity.
struct Review {
    tokens: Vec<String>,
    label:  i64,
}

/// Load, encode and split the corpus in `dir`.
pub fn load_imdb<R: Rng + ?Sized>(
    dir:           &Path,
    n_words:       usize,
    valid_portion: f64,
    rng:           &mut R,
) -> Result<PreparedDataset> {
    let train = read_reviews(&dir.join("train"))?;
    let test  = read_reviews(&dir.join("test"))?;
    tracing::info!("Read {} training and {} test reviews", train.len(), test.len());

    let vocabulary = Vocabulary::build(
        train.iter().flat_map(|r| r.tokens.iter()),
        Some(n_words),
    )?;

    let (train, valid) = split_train_val(train, 1.0 - valid_portion, rng)?;

    let encode = |reviews: Vec<Review>| -> SubsetData {
        let mut subset = SubsetData::default();
        for (position, review) in reviews.into_iter().enumerate() {
            subset.data.push(vocabulary.encode_all(&review.tokens));
            subset.label.push(review.label);
            subset.ids.push(position as u64);
        }
        subset
    };

    let mut subsets = BTreeMap::new();
    subsets.insert(Subset::Train, encode(train));
    subsets.insert(Subset::Valid, encode(valid));
    subsets.insert(Subset::Test,  encode(test));

    Ok(PreparedDataset::new(vocabulary, subsets))
}

/// Read `<split_dir>/pos` and `<split_dir>/neg`, files in name order.
fn read_reviews(split_dir: &Path) -> Result<Vec<Review>> {
    let preprocessor = Preprocessor::new();
    let tokenizer    = Tokenizer::new(false);
    let mut reviews  = Vec::new();

    for (polarity, label) in POLARITIES {
        let dir = split_dir.join(polarity);
        let mut paths: Vec<_> = fs::read_dir(&dir)
            .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("txt"))
            .collect();
        paths.sort();

        for path in paths {
            match fs::read_to_string(&path) {
                Ok(text) => reviews.push(Review {
                    tokens: tokenizer.tokens(&preprocessor.clean(&text)),
                    label,
                }),
                // unreadable file: warn and keep going
                Err(e) => tracing::warn!("Skipping '{}': {}", path.display(), e),
            }
        }
        tracing::debug!("Loaded '{}'", dir.display());
    }

    Ok(reviews)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn write_review(dir: &Path, split: &str, polarity: &str, file: &str, text: &str) {
        let d = dir.join(split).join(polarity);
        fs::create_dir_all(&d).unwrap();
        fs::write(d.join(file), text).unwrap();
    }

    fn write_corpus(dir: &Path) {
        for i in 0..9 {
            write_review(dir, "train", "pos", &format!("{i}_9.txt"), "Great great movie!<br />Loved it.");
            write_review(dir, "train", "neg", &format!("{i}_1.txt"), "Awful movie. Boring plot.");
        }
        write_review(dir, "test", "pos", "0_8.txt", "great plot");
        write_review(dir, "test", "neg", "0_2.txt", "terrible");
        write_review(dir, "train", "pos", "notes.md", "ignored");
    }

    #[test]
    fn test_load_splits_and_labels() {
        let tmp = tempfile::tempdir().unwrap();
        write_corpus(tmp.path());

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let prepared = load_imdb(tmp.path(), 100, 0.1, &mut rng).unwrap();

        let train = &prepared.subsets[&Subset::Train];
        let valid = &prepared.subsets[&Subset::Valid];
        let test  = &prepared.subsets[&Subset::Test];
        assert_eq!(train.len() + valid.len(), 18);
        assert_eq!(valid.len(), 2);
        assert_eq!(test.label, vec![1, 0]);
        assert_eq!(train.ids, (0..train.len() as u64).collect::<Vec<_>>());
    }

    #[test]
    fn test_vocabulary_from_training_only() {
        let tmp = tempfile::tempdir().unwrap();
        write_corpus(tmp.path());

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let prepared = load_imdb(tmp.path(), 100, 0.1, &mut rng).unwrap();
        let vocab = &prepared.vocabulary;

        assert_eq!(vocab.encode("terrible"), 0);
        assert_ne!(vocab.encode("great"), 0);
        // test review "great plot" encodes with training ids
        assert_eq!(
            prepared.subsets[&Subset::Test].data[0],
            vec![vocab.encode("great"), vocab.encode("plot")]
        );
    }

    #[test]
    fn test_cap_limits_vocabulary() {
        let tmp = tempfile::tempdir().unwrap();
        write_corpus(tmp.path());

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let prepared = load_imdb(tmp.path(), 3, 0.1, &mut rng).unwrap();
        assert_eq!(prepared.vocabulary.len(), 3);
    }

    #[test]
    fn test_missing_split_dir_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert!(load_imdb(tmp.path(), 100, 0.1, &mut rng).is_err());
    }
}
