// ============================================================
// Layer 5 — State Traces
// ============================================================
// Reads recorded evaluation runs from the document store.
//
// Collections read:
//   evaluations   {_id, data_name, model_name, …}
//   eval_records  {eval_id, id, word_id, state_c, state_h, …}
//
// Each record holds one token's hidden state as a nested array
// `[[f32; units]; layers]`. Records of one run are ordered by
// their `id` (position in the evaluated sequence).
//
// The series returned keeps the first state as-is and replaces
// every later one with its difference from the previous one:
//   [s0, s1, s2] → [s0, s1 - s0, s2 - s1]
//
// Why differences and not raw states?
//   A hidden state carries the whole history of the sequence.
//   What a single word contributes is how far it moves the
//   state, so the analysis groups these moves by word id.
//
// Why does each evaluation restart the chain?
//   Two evaluations are independent runs. Subtracting the last
//   state of one run from the first state of the next would
//   attribute a meaningless jump to that word.
//
// Every state of the series must share one (layers, units)
// shape; a run recorded with another architecture is rejected.
//
// Reference: ndarray documentation (ArrayBase arithmetic)
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::document::{doc, id_of, Document};
use crate::domain::traits::DocumentStore;

pub const EVALUATIONS:  &str = "evaluations";
pub const EVAL_RECORDS: &str = "eval_records";

/// Hidden state recorded by default (LSTM cell state)
pub const DEFAULT_STATE: &str = "state_c";

/// Token ids paired with the state change each token caused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSeries {
    pub word_ids: Vec<usize>,
    pub states:   Vec<Array2<f32>>,
}

impl StateSeries {
    pub fn len(&self) -> usize {
        self.word_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_ids.is_empty()
    }

    pub fn append(&mut self, other: StateSeries) {
        self.word_ids.extend(other.word_ids);
        self.states.extend(other.states);
    }

    /// Shared `(layers, units)` of every state, `None` when empty.
    pub fn shape(&self) -> Result<Option<(usize, usize)>> {
        let Some(first) = self.states.first() else {
            return Ok(None);
        };
        let shape = first.dim();
        if let Some(i) = self.states.iter().position(|s| s.dim() != shape) {
            bail!("state {} has shape {:?}, the first has {:?}", i, self.states[i].dim(), shape);
        }
        Ok(Some(shape))
    }
}

/// Word ids and state differences of one evaluation run.
pub fn fetch_states_of_eval<S: DocumentStore + ?Sized>(
    store:      &S,
    eval_id:    u64,
    state_name: &str,
) -> Result<StateSeries> {
    let records = store.find(EVAL_RECORDS, &doc([("eval_id", json!(eval_id))]))?;

    // Order by position; a record without one cannot be placed in the chain
    let mut positioned = records
        .into_iter()
        .map(|r| -> Result<(u64, Document)> {
            let pos = position_of(&r).with_context(|| format!("in eval {eval_id}"))?;
            Ok((pos, r))
        })
        .collect::<Result<Vec<_>>>()?;
    positioned.sort_by_key(|(pos, _)| *pos);

    let mut word_ids = Vec::with_capacity(positioned.len());
    let mut states   = Vec::with_capacity(positioned.len());
    for (_, record) in &positioned {
        word_ids.push(word_id_of(record)?);
        let raw = record
            .get(state_name)
            .with_context(|| format!("record of eval {eval_id} has no '{state_name}' field"))?;
        states.push(state_matrix(raw)?);
    }

    Ok(StateSeries { word_ids, states: differences(states)? })
}

/// Concatenated series over every evaluation of `model_name` on `data_name`.
pub fn fetch_states<S: DocumentStore + ?Sized>(
    store:      &S,
    data_name:  &str,
    model_name: &str,
    state_name: &str,
) -> Result<StateSeries> {
    let filter = doc([("data_name", json!(data_name)), ("model_name", json!(model_name))]);
    let mut evals = store.find(EVALUATIONS, &filter)?;
    evals.sort_by_key(id_of);
    tracing::info!("Found {} evaluations of '{}' on '{}'", evals.len(), model_name, data_name);

    let mut series = StateSeries::default();
    let mut expected: Option<(usize, usize)> = None;
    for eval in &evals {
        let eval_id = id_of(eval).context("evaluation document without a numeric _id")?;
        let part = fetch_states_of_eval(store, eval_id, state_name)?;

        // Within one run `differences` already enforces a single shape;
        // across runs the first non-empty one sets it
        if let Some(shape) = part.shape()? {
            match expected {
                None => expected = Some(shape),
                Some(first) if first != shape => bail!(
                    "evaluation {} records states of shape {:?}, earlier evaluations {:?}",
                    eval_id,
                    shape,
                    first
                ),
                Some(_) => {}
            }
        }

        tracing::debug!("Evaluation {} contributed {} states", eval_id, part.len());
        series.append(part);
    }
    Ok(series)
}

/// Parse a `[[f32; units]; layers]` JSON array.
pub fn state_matrix(value: &Value) -> Result<Array2<f32>> {
    let rows: Vec<Vec<f32>> = serde_json::from_value(value.clone())
        .context("state is not a nested array of numbers")?;
    let layers = rows.len();
    let units  = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != units) {
        bail!("state layers have different widths");
    }
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Ok(Array2::from_shape_vec((layers, units), flat)?)
}

/// First state unchanged, then consecutive differences.
pub fn differences(states: Vec<Array2<f32>>) -> Result<Vec<Array2<f32>>> {
    let mut out = Vec::with_capacity(states.len());
    for (i, state) in states.iter().enumerate() {
        if i == 0 {
            out.push(state.clone());
            continue;
        }
        let prev = &states[i - 1];
        if prev.dim() != state.dim() {
            bail!("state {} has shape {:?}, previous has {:?}", i, state.dim(), prev.dim());
        }
        out.push(state - prev);
    }
    Ok(out)
}

fn position_of(record: &Document) -> Result<u64> {
    record
        .get("id")
        .and_then(Value::as_u64)
        .context("record has no numeric id")
}

fn word_id_of(record: &Document) -> Result<usize> {
    let id = record
        .get("word_id")
        .and_then(Value::as_u64)
        .context("record has no numeric word_id")?;
    Ok(id as usize)
}
