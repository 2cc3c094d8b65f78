// ============================================================
// Layer 5 — State Statistics
// ============================================================
// Groups state differences by the token that produced them and
// summarises each group.
//
// For one vocabulary id with n occurrences, and for each layer:
//   mean    — average over the n occurrences, per unit
//   std     — population standard deviation, per unit
//   error_l — mean - min   (lower error bar)
//   error_u — max - mean   (upper error bar)
//
// Candidate search works on a matrix of per-id means
// (rows = ids, columns = units): for every unit it returns the
// k ids whose mean change has the largest magnitude.
//
// Why the population standard deviation (ddof = 0)?
//   Each id's occurrences are the whole population observed in
//   the evaluation, not a sample drawn to estimate another one.
//   It also keeps a single occurrence at std 0 instead of NaN.
//
// Why rank by |mean| and not by mean?
//   A unit can respond to a word by moving strongly in either
//   direction. Both are a response worth showing.
//
// Reference: ndarray documentation (mean_axis, std_axis, stack)
//            Rust Book §13 (Iterators and Closures)

use anyhow::{bail, Context, Result};
use ndarray::{stack, Array1, Array2, ArrayView1, Axis};

/// State differences grouped by vocabulary id; `None` for ids never seen.
pub type IdStates = Vec<Option<Vec<Array2<f32>>>>;

/// Per-layer summary of one id's state changes.
#[derive(Debug, Clone, PartialEq)]
pub struct StateStats {
    pub stds:     Vec<Array1<f32>>,
    pub means:    Vec<Array1<f32>>,
    pub errors_l: Vec<Array1<f32>>,
    pub errors_u: Vec<Array1<f32>>,
    /// Ascending-mean permutation per layer, when sorting was requested
    pub indices:  Vec<Option<Vec<usize>>>,
}

impl StateStats {
    pub fn layer_count(&self) -> usize {
        self.means.len()
    }
}

/// Top-k ids per unit, with their means and stds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidates {
    pub ids:   Vec<Vec<usize>>,
    pub means: Vec<Vec<f32>>,
    pub stds:  Vec<Vec<f32>>,
}

/// Bucket `states` by their word id into a dense, id-indexed vector.
pub fn sort_by_id(word_ids: &[usize], states: Vec<Array2<f32>>) -> Result<IdStates> {
    if word_ids.len() != states.len() {
        bail!("{} word ids but {} states", word_ids.len(), states.len());
    }
    let Some(&max_id) = word_ids.iter().max() else {
        return Ok(Vec::new());
    };

    // Index = word id; gaps stay None so callers can tell "unseen" from "zero"
    let mut by_id: IdStates = vec![None; max_id + 1];
    for (&id, state) in word_ids.iter().zip(states) {
        by_id[id].get_or_insert_with(Vec::new).push(state);
    }
    Ok(by_id)
}

/// Number of recorded occurrences of every id.
pub fn id_frequencies(by_id: &IdStates) -> Vec<usize> {
    by_id.iter().map(|s| s.as_ref().map_or(0, Vec::len)).collect()
}

/// Layer-wise mean / std / error bars of one id's states.
pub fn compute_stats(states: &[Array2<f32>], sort_by_mean: bool) -> Result<StateStats> {
    let first = states.first().context("cannot compute statistics of zero states")?;
    if states.iter().any(|s| s.dim() != first.dim()) {
        bail!("states of one id have different shapes");
    }
    let layer_num = first.nrows();

    let mut stats = StateStats {
        stds:     Vec::with_capacity(layer_num),
        means:    Vec::with_capacity(layer_num),
        errors_l: Vec::with_capacity(layer_num),
        errors_u: Vec::with_capacity(layer_num),
        indices:  Vec::with_capacity(layer_num),
    };

    for layer in 0..layer_num {
        // rows = occurrences, columns = units
        let rows: Vec<ArrayView1<f32>> = states.iter().map(|s| s.row(layer)).collect();
        let mat = stack(Axis(0), &rows)?;

        let mean = mat.mean_axis(Axis(0)).context("empty state matrix")?;
        let std  = mat.std_axis(Axis(0), 0.0);
        let min  = mat.fold_axis(Axis(0), f32::INFINITY, |&acc, &x| acc.min(x));
        let max  = mat.fold_axis(Axis(0), f32::NEG_INFINITY, |&acc, &x| acc.max(x));
        let error_l = &mean - &min;
        let error_u = &max - &mean;

        if sort_by_mean {
            let idx = argsort(&mean);
            stats.means.push(mean.select(Axis(0), &idx));
            stats.stds.push(std.select(Axis(0), &idx));
            stats.errors_l.push(error_l.select(Axis(0), &idx));
            stats.errors_u.push(error_u.select(Axis(0), &idx));
            stats.indices.push(Some(idx));
        } else {
            stats.means.push(mean);
            stats.stds.push(std);
            stats.errors_l.push(error_l);
            stats.errors_u.push(error_u);
            stats.indices.push(None);
        }
    }

    Ok(stats)
}

/// For each unit, the `k` ids with the largest |mean|, strongest first.
///
/// `means[i]` and `stds[i]` are the per-unit vectors of id `i`.
/// Ties keep the lower id first; `k` is clamped to the number of ids.
pub fn find_candidate(means: &[Array1<f32>], stds: &[Array1<f32>], k: usize) -> Result<Candidates> {
    if means.len() != stds.len() {
        bail!("{} mean rows but {} std rows", means.len(), stds.len());
    }
    if means.is_empty() {
        return Ok(Candidates::default());
    }

    let mean_views: Vec<ArrayView1<f32>> = means.iter().map(|m| m.view()).collect();
    let std_views:  Vec<ArrayView1<f32>> = stds.iter().map(|s| s.view()).collect();
    let means = stack(Axis(0), &mean_views).context("mean rows have different lengths")?;
    let stds  = stack(Axis(0), &std_views).context("std rows have different lengths")?;
    if means.dim() != stds.dim() {
        bail!("mean matrix {:?} and std matrix {:?} differ", means.dim(), stds.dim());
    }

    // Fewer ids than k: every id is a candidate
    let k = k.min(means.nrows());
    let mut out = Candidates::default();

    // One column per unit; its rows are the per-id means
    for (col_means, col_stds) in means.columns().into_iter().zip(stds.columns()) {
        let mut order: Vec<usize> = (0..col_means.len()).collect();
        // sort_by is stable, so equal magnitudes keep the lower id first
        order.sort_by(|&a, &b| col_means[b].abs().total_cmp(&col_means[a].abs()));
        order.truncate(k);

        out.means.push(order.iter().map(|&i| col_means[i]).collect());
        out.stds.push(order.iter().map(|&i| col_stds[i]).collect());
        out.ids.push(order);
    }

    Ok(out)
}

/// Ascending order of `values`; total_cmp gives NaN a fixed place.
fn argsort(values: &Array1<f32>) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    idx
}
