// ============================================================
// Layer 4 — Phrase-Sentiment Corpus Loader
// ============================================================
// Reads the Stanford Sentiment Treebank layout:
//
//   datasetSentences.txt   header, then `index<TAB>sentence`
//   datasetSplit.txt       header, then `index,split`
//                          (1 = train, 2 = test, 3 = valid)
//   dictionary.txt         `phrase|phrase_id`
//   sentiment_labels.txt   header, then `phrase_id|score`
//
// The vocabulary is built from every sentence. Each phrase of
// the dictionary becomes one labelled example whose score is
// discretised into five ordinal classes; the examples are then
// shuffled and split by the configured fractions. Whole
// sentences are kept under their official split as well.
//
// Why split phrases and not sentences?
//   Every node of the treebank's parse trees is a scored phrase,
//   which gives far more labelled examples than the sentences
//   alone. The sentences keep their official split so results
//   stay comparable with other work on the corpus.
//
// Reference: Rust Book §9 (Error Handling), §13 (Iterators)

use anyhow::{bail, Context, Result};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::{fs, path::Path};

use crate::data::dataset::{PreparedDataset, SentenceSet};
use crate::data::splitter::split;
use crate::data::tokenizer::Tokenizer;
use crate::data::vocabulary::Vocabulary;
use crate::domain::example::{Example, Subset, SubsetData};
use crate::domain::traits::SourceFetcher;

const SENTENCES_FILE: &str = "datasetSentences.txt";
const SPLIT_FILE:     &str = "datasetSplit.txt";
const PHRASES_FILE:   &str = "dictionary.txt";
const LABELS_FILE:    &str = "sentiment_labels.txt";

/// Map a sentiment score in [0, 1] to one of five classes.
///
///   s ≤ 0.2 → 0, ≤ 0.4 → 1, ≤ 0.6 → 2, ≤ 0.8 → 3, else → 4
pub fn discretize(score: f64) -> i64 {
    match score {
        s if s <= 0.2 => 0,
        s if s <= 0.4 => 1,
        s if s <= 0.6 => 2,
        s if s <= 0.8 => 3,
        _ => 4,
    }
}

/// Load and split the corpus in `dir`.
///
/// If `dir` is missing, `fetcher` is asked to create it first;
/// any failure there is returned as is.
pub fn load_sst<R: Rng + ?Sized>(
    dir:       &Path,
    fractions: &[(String, f64)],
    fetcher:   &dyn SourceFetcher,
    rng:       &mut R,
) -> Result<PreparedDataset> {
    if !dir.exists() {
        tracing::info!("'{}' not found, downloading corpus", dir.display());
        fetcher.fetch(dir)?;
        if !dir.exists() {
            bail!("corpus download finished but '{}' still does not exist", dir.display());
        }
    }

    let tokenizer = Tokenizer::new(false);

    // ── Sentences and the vocabulary ─────────────────────────────────────────
    let sentences = read_sentences(&dir.join(SENTENCES_FILE))?;
    let sentence_tokens: Vec<(u64, Vec<String>)> = sentences
        .iter()
        .map(|(idx, text)| (*idx, tokenizer.tokens(text)))
        .collect();
    let vocabulary = Vocabulary::build(
        sentence_tokens.iter().flat_map(|(_, t)| t.iter()),
        None,
    )?;
    tracing::info!("Built vocabulary of {} ids from {} sentences", vocabulary.len(), sentences.len());

    // ── Sentences by official split ──────────────────────────────────────────
    let splits = read_sentence_splits(&dir.join(SPLIT_FILE))?;
    let mut by_split: BTreeMap<Subset, SentenceSet> =
        Subset::ALL.into_iter().map(|s| (s, SentenceSet::default())).collect();
    for (idx, tokens) in &sentence_tokens {
        let Some(subset) = splits.get(idx) else {
            tracing::debug!("Sentence {} has no split assignment, skipping", idx);
            continue;
        };
        let set = by_split.entry(*subset).or_default();
        set.data.push(vocabulary.encode_all(tokens));
        set.ids.push(*idx);
    }

    // ── Phrase examples ──────────────────────────────────────────────────────
    let scores = read_scores(&dir.join(LABELS_FILE))?;
    let mut phrases = read_phrases(&dir.join(PHRASES_FILE))?;
    phrases.sort_by_key(|(_, phrase_id)| *phrase_id);

    let mut examples = Vec::with_capacity(phrases.len());
    for (position, (phrase, phrase_id)) in phrases.iter().enumerate() {
        let tokens = tokenizer.tokens(phrase);
        if tokens.is_empty() {
            continue;
        }
        let score = *scores
            .get(phrase_id)
            .with_context(|| format!("phrase {phrase_id} has no sentiment score"))?;
        examples.push(Example::new(
            vocabulary.encode_all(&tokens),
            discretize(score),
            position as u64 + 1,
        ));
    }
    tracing::info!("Prepared {} phrase examples", examples.len());

    // ── Shuffle-split by the configured scheme ───────────────────────────────
    let weights: Vec<f64> = fractions.iter().map(|(_, f)| *f).collect();
    let parts = split(examples, &weights, Some(rng))?;

    if !fractions.iter().any(|(name, _)| name == Subset::Train.as_str()) {
        tracing::warn!("There is no train data in the split scheme");
    }

    let mut subsets = BTreeMap::new();
    for ((name, _), part) in fractions.iter().zip(parts) {
        match Subset::parse(name) {
            Some(subset) => {
                subsets.insert(subset, part.into_iter().collect::<SubsetData>());
            }
            None => tracing::warn!("Split '{}' is not train/valid/test and will not be stored", name),
        }
    }

    Ok(PreparedDataset::new(vocabulary, subsets).with_sentences(by_split))
}

fn read_lines(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Cannot read '{}'", path.display()))
}

fn read_sentences(path: &Path) -> Result<Vec<(u64, String)>> {
    read_lines(path)?
        .lines()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|line| -> Result<(u64, String)> {
            let (idx, text) = line
                .split_once('\t')
                .with_context(|| format!("Malformed sentence line '{line}'"))?;
            Ok((idx.trim().parse::<u64>()?, text.to_string()))
        })
        .collect()
}

fn read_sentence_splits(path: &Path) -> Result<HashMap<u64, Subset>> {
    read_lines(path)?
        .lines()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|line| -> Result<(u64, Subset)> {
            let (idx, label) = line
                .split_once(',')
                .with_context(|| format!("Malformed split line '{line}'"))?;
            let subset = match label.trim() {
                "1" => Subset::Train,
                "2" => Subset::Test,
                "3" => Subset::Valid,
                other => bail!("Unknown split label '{other}'"),
            };
            Ok((idx.trim().parse::<u64>()?, subset))
        })
        .collect()
}

fn read_phrases(path: &Path) -> Result<Vec<(String, u64)>> {
    read_lines(path)?
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| -> Result<(String, u64)> {
            let (phrase, id) = line
                .rsplit_once('|')
                .with_context(|| format!("Malformed dictionary line '{line}'"))?;
            Ok((phrase.to_string(), id.trim().parse::<u64>()?))
        })
        .collect()
}

fn read_scores(path: &Path) -> Result<HashMap<u64, f64>> {
    read_lines(path)?
        .lines()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|line| -> Result<(u64, f64)> {
            let (id, score) = line
                .split_once('|')
                .with_context(|| format!("Malformed label line '{line}'"))?;
            Ok((id.trim().parse::<u64>()?, score.trim().parse::<f64>()?))
        })
        .collect()
}
