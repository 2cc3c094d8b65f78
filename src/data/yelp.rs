// ============================================================
// Layer 4 — Business-Review Corpus Loader
// ============================================================
// Loads `review_label.json`, an array of `{review, label}` where
// label is the star rating.
//
// Reviews are tokenised with punctuation removed and their
// sentences flattened. The vocabulary is built over every review
// and capped at `n_words`.
//
// Binary mode maps ratings to polarity:
//   stars < 3 → 0, stars > 3 → 1, stars == 3 → dropped
// and then downsamples the larger class (without replacement)
// so both classes end up the same size.
//
// Examples are split 0.8 / 0.1 / 0.1 after shuffling; each
// subset is then ordered by review length.
//
// Why order each subset by length?
//   Batches drawn from a length-ordered subset need almost no
//   padding, which is what the training side expects.
//
// Reference: serde_json documentation
//            rand crate documentation (SliceRandom)

use anyhow::{Context, Result};
use rand::{seq::index::sample, Rng};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::{fs, path::Path};

use crate::data::dataset::PreparedDataset;
use crate::data::splitter::split;
use crate::data::tokenizer::Tokenizer;
use crate::data::vocabulary::Vocabulary;
use crate::domain::example::{Subset, SubsetData};

const REVIEWS_FILE: &str = "review_label.json";
const FRACTIONS: [f64; 3] = [0.8, 0.1, 0.1];

#[derive(Debug, Deserialize)]
struct ReviewRecord {
    review: String,
    label:  i64,
}

/// Load, encode and split the corpus in `dir`.
pub fn load_yelp<R: Rng + ?Sized>(
    dir:     &Path,
    n_words: usize,
    binary:  bool,
    rng:     &mut R,
) -> Result<PreparedDataset> {
    let path = dir.join(REVIEWS_FILE);
    let json = fs::read_to_string(&path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    let records: Vec<ReviewRecord> = serde_json::from_str(&json)
        .with_context(|| format!("Malformed reviews in '{}'", path.display()))?;

    let tokenizer = Tokenizer::new(true);
    let reviews: Vec<(Vec<String>, i64)> = records
        .into_iter()
        .map(|r| (tokenizer.tokens(&r.review), r.label))
        .collect();
    tracing::info!("Tokenised {} reviews", reviews.len());

    let vocabulary = Vocabulary::build(
        reviews.iter().flat_map(|(tokens, _)| tokens.iter()),
        Some(n_words),
    )?;

    let reviews = if binary { binarize_and_balance(reviews, rng) } else { reviews };

    let encoded: Vec<(Vec<u32>, i64)> = reviews
        .into_iter()
        .map(|(tokens, label)| (vocabulary.encode_all(&tokens), label))
        .collect();

    let parts = split(encoded, &FRACTIONS, Some(rng))?;

    let mut subsets = BTreeMap::new();
    for (subset, mut part) in Subset::ALL.into_iter().zip(parts) {
        part.sort_by_key(|(tokens, _)| tokens.len());
        let mut data = SubsetData::default();
        for (position, (tokens, label)) in part.into_iter().enumerate() {
            data.data.push(tokens);
            data.label.push(label);
            data.ids.push(position as u64);
        }
        subsets.insert(subset, data);
    }

    Ok(PreparedDataset::new(vocabulary, subsets))
}

/// Map star ratings to 0/1, drop neutral ratings and balance classes.
pub fn binarize_and_balance<T, R: Rng + ?Sized>(items: Vec<(T, i64)>, rng: &mut R) -> Vec<(T, i64)> {
    let mut positives = Vec::new();
    let mut negatives = Vec::new();
    for (item, stars) in items {
        if stars < 3 {
            negatives.push((item, 0));
        } else if stars > 3 {
            positives.push((item, 1));
        }
    }
    tracing::info!("{} positive reviews, {} negative reviews", positives.len(), negatives.len());

    let target = positives.len().min(negatives.len());
    let mut positives = downsample(positives, target, rng);
    let negatives = downsample(negatives, target, rng);
    positives.extend(negatives);
    positives
}

/// Keep `amount` items chosen uniformly without replacement, in original order.
fn downsample<T, R: Rng + ?Sized>(items: Vec<T>, amount: usize, rng: &mut R) -> Vec<T> {
    if items.len() <= amount {
        return items;
    }
    let keep: HashSet<usize> = sample(rng, items.len(), amount).into_iter().collect();
    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| keep.contains(&i).then_some(item))
        .collect()
}
