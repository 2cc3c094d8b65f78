// ============================================================
// Layer 4 — Subset Splitter
// ============================================================
// Partitions a collection into as many disjoint subsets as there
// are requested fractions (e.g. train / valid / test).
//
// Boundaries use cumulative rounding: subset i covers
//   [round(c[i-1] * L), round(c[i] * L))
// where c is the running sum of fractions. Every subset is then
// within one item of `fraction * L`, and when the fractions sum
// to 1 the subsets cover the input exactly.
//
// Why cumulative rounding instead of rounding each size?
//   Rounding sizes one by one lets the errors add up, so three
//   subsets of 1/3 over 10 items would claim 3 + 3 + 3 and drop
//   an item. Rounding the boundaries keeps the total exact.
//
// A subset with a nonzero fraction is never left empty as long
// as there are at least as many items as nonzero fractions; it
// takes one unassigned item, or borrows one from the largest
// subset when every item is already assigned. Emptiness wins
// over closeness here: each borrowed item moves the donor one
// further from its target, so with
//   L = 4, fractions = [0.97, 0.01, 0.01, 0.01]
// the split is [1, 1, 1, 1] although the first target is 3.88.
//
// Why shuffle before splitting?
//   Corpus files are often ordered (by label, by source). An
//   unshuffled split would give each subset a different mix.
//   Shuffling uses Fisher-Yates via rand::seq::SliceRandom and
//   is applied to the whole input before any boundary is drawn.
//   The random source is passed in so runs are reproducible.
//
// Reference: Rust Book §8 (Vectors)
//            rand crate documentation

use anyhow::{bail, Result};
use rand::{seq::SliceRandom, Rng};

const FRACTION_TOLERANCE: f64 = 1e-9;

/// Split `items` into `fractions.len()` disjoint subsets.
///
/// # Arguments
/// * `items`     - All items (consumed)
/// * `fractions` - Target share per subset, each in [0, 1], summing to ≤ 1
/// * `rng`       - When present, items are shuffled before partitioning
pub fn split<T, R: Rng + ?Sized>(
    mut items: Vec<T>,
    fractions: &[f64],
    rng:       Option<&mut R>,
) -> Result<Vec<Vec<T>>> {
    validate(fractions)?;

    if let Some(rng) = rng {
        items.shuffle(rng);
    }

    // Sizes depend only on the count, so they are fixed before carving
    let total  = items.len();
    let mut sizes = subset_sizes(total, fractions);
    fill_empty_subsets(&mut sizes, fractions, total);

    // Carve subsets off the front in order
    let mut rest = items.into_iter();
    let subsets: Vec<Vec<T>> = sizes
        .iter()
        .map(|&n| rest.by_ref().take(n).collect())
        .collect();

    tracing::debug!(
        "Split {} items into subsets of sizes {:?}",
        total,
        subsets.iter().map(Vec::len).collect::<Vec<_>>()
    );

    Ok(subsets)
}

/// Shuffle and split into (train, validation).
pub fn split_train_val<T, R: Rng + ?Sized>(
    items:          Vec<T>,
    train_fraction: f64,
    rng:            &mut R,
) -> Result<(Vec<T>, Vec<T>)> {
    let train_fraction = train_fraction.clamp(0.0, 1.0);
    let mut parts = split(items, &[train_fraction, 1.0 - train_fraction], Some(rng))?;
    let val = parts.pop().unwrap_or_default();
    let train = parts.pop().unwrap_or_default();
    Ok((train, val))
}

fn validate(fractions: &[f64]) -> Result<()> {
    for &f in fractions {
        if !(0.0..=1.0).contains(&f) {
            bail!("split fraction {f} is outside [0, 1]");
        }
    }
    let sum: f64 = fractions.iter().sum();
    if sum > 1.0 + FRACTION_TOLERANCE {
        bail!("split fractions sum to {sum}, which exceeds 1");
    }
    Ok(())
}

fn subset_sizes(total: usize, fractions: &[f64]) -> Vec<usize> {
    let mut sizes = Vec::with_capacity(fractions.len());
    let mut cumulative = 0.0;
    let mut start = 0usize;

    for &f in fractions {
        cumulative += f;
        // clamp: float error must not push a boundary backwards or past the end
        let end = ((cumulative * total as f64).round() as usize).clamp(start, total);
        sizes.push(end - start);
        start = end;
    }
    sizes
}

fn fill_empty_subsets(sizes: &mut [usize], fractions: &[f64], total: usize) {
    let nonzero = fractions.iter().filter(|&&f| f > 0.0).count();
    if total < nonzero {
        return;
    }

    // Items past the last boundary (fractions summing below 1)
    let mut unassigned = total - sizes.iter().sum::<usize>();

    for i in 0..sizes.len() {
        if fractions[i] == 0.0 || sizes[i] > 0 {
            continue;
        }
        if unassigned > 0 {
            unassigned -= 1;
            sizes[i] += 1;
            continue;
        }
        // Largest subset donates, the earliest one on a tie. A donor
        // never drops to zero, so it cannot become empty itself.
        let donor = (0..sizes.len())
            .max_by_key(|&j| (sizes[j], std::cmp::Reverse(j)))
            .unwrap_or(i);
        if sizes[donor] > 1 {
            sizes[donor] -= 1;
            sizes[i] += 1;
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn no_shuffle() -> Option<&'static mut ChaCha8Rng> {
        None
    }

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let parts = split(items, &[0.8, 0.1, 0.1], no_shuffle()).unwrap();
        assert_eq!(parts.iter().map(Vec::len).collect::<Vec<_>>(), vec![80, 10, 10]);
    }

    #[test]
    fn test_unshuffled_split_keeps_order() {
        let items: Vec<usize> = (0..10).collect();
        let parts = split(items, &[0.5, 0.5], no_shuffle()).unwrap();
        assert_eq!(parts[0], vec![0, 1, 2, 3, 4]);
        assert_eq!(parts[1], vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_all_items_preserved_when_fractions_sum_to_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let items: Vec<usize> = (0..51).collect();
        let parts = split(items, &[0.7, 0.2, 0.1], Some(&mut rng)).unwrap();
        let mut seen: Vec<usize> = parts.into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..51).collect::<Vec<_>>());
    }

    #[test]
    fn test_partial_fractions_leave_remainder_out() {
        let items: Vec<usize> = (0..20).collect();
        let parts = split(items, &[0.5, 0.25], no_shuffle()).unwrap();
        assert_eq!(parts[0].len(), 10);
        assert_eq!(parts[1].len(), 5);
    }

    #[test]
    fn test_shuffle_is_reproducible() {
        let a = split((0..30).collect::<Vec<_>>(), &[0.5, 0.5], Some(&mut ChaCha8Rng::seed_from_u64(1))).unwrap();
        let b = split((0..30).collect::<Vec<_>>(), &[0.5, 0.5], Some(&mut ChaCha8Rng::seed_from_u64(1))).unwrap();
        assert_eq!(a, b);
        assert_ne!(a[0], (0..15).collect::<Vec<_>>());
    }

    #[test]
    fn test_small_input_fills_nonzero_subsets() {
        let items: Vec<usize> = (0..3).collect();
        let parts = split(items, &[0.8, 0.1, 0.1], no_shuffle()).unwrap();
        assert!(parts.iter().all(|p| p.len() == 1));
    }

    #[test]
    fn test_non_empty_subsets_win_over_target_sizes() {
        let parts = split((0..4).collect::<Vec<_>>(), &[0.97, 0.01, 0.01, 0.01], no_shuffle()).unwrap();
        // rounding alone gives [4, 0, 0, 0]; the first subset donates three items
        assert_eq!(subset_sizes(4, &[0.97, 0.01, 0.01, 0.01]), vec![4, 0, 0, 0]);
        assert_eq!(parts.iter().map(Vec::len).collect::<Vec<_>>(), vec![1, 1, 1, 1]);
        assert_eq!(parts.concat(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_zero_fraction_stays_empty() {
        let parts = split((0..10).collect::<Vec<_>>(), &[1.0, 0.0], no_shuffle()).unwrap();
        assert_eq!(parts[0].len(), 10);
        assert!(parts[1].is_empty());
    }

    #[test]
    fn test_empty_dataset() {
        let parts = split(Vec::<usize>::new(), &[0.8, 0.2], no_shuffle()).unwrap();
        assert!(parts.iter().all(Vec::is_empty));
    }

    #[test]
    fn test_invalid_fractions_rejected() {
        assert!(split(vec![1, 2], &[0.8, 0.3], no_shuffle()).is_err());
        assert!(split(vec![1, 2], &[-0.1], no_shuffle()).is_err());
        assert!(split(vec![1, 2], &[1.5], no_shuffle()).is_err());
    }

    #[test]
    fn test_train_val() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let (train, val) = split_train_val((0..100).collect::<Vec<_>>(), 0.9, &mut rng).unwrap();
        assert_eq!(train.len(), 90);
        assert_eq!(val.len(), 10);
    }

    proptest! {
        #[test]
        fn prop_subsets_disjoint_and_near_target(
            len in 0usize..200,
            raw in prop::collection::vec(0.0f64..1.0, 1..5),
            seed in any::<u64>(),
        ) {
            // Normalise so the fractions sum to at most 1
            let sum: f64 = raw.iter().sum::<f64>().max(1.0);
            let fractions: Vec<f64> = raw.iter().map(|f| f / sum).collect();

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let parts = split((0..len).collect::<Vec<_>>(), &fractions, Some(&mut rng)).unwrap();

            let mut seen = HashSet::new();
            for p in &parts {
                for x in p {
                    prop_assert!(seen.insert(*x));
                }
            }
            prop_assert!(seen.len() <= len);

            // Rounding alone keeps every subset within one item of its
            // target; each subset filled afterwards can cost a donor one more
            let nonzero = fractions.iter().filter(|&&f| f > 0.0).count();
            let filled = if len >= nonzero {
                subset_sizes(len, &fractions)
                    .iter()
                    .zip(&fractions)
                    .filter(|&(&n, &f)| n == 0 && f > 0.0)
                    .count()
            } else {
                0
            };
            let slack = 1.0 + filled as f64 + 1e-9;

            for (p, f) in parts.iter().zip(&fractions) {
                let target = f * len as f64;
                prop_assert!((p.len() as f64 - target).abs() <= slack);
                if *f > 0.0 && len >= nonzero {
                    prop_assert!(!p.is_empty());
                }
            }
        }
    }
}
