//! Grid-search training of the Jelinek-Mercer smoothing weight.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{ScoringParams, SearchEngine};
use crate::error::{Error, Result};
use crate::evaluator::metrics::{evaluate_batch, BatchMetrics, EvalQuery, RelevanceJudgments};

/// Step between candidate lambda values in the reference training loop.
pub const DEFAULT_LAMBDA_STEP: f64 = 0.1;

/// The batch metric a training run optimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    Precision,
    Recall,
    Map,
}

impl MetricKind {
    /// Pick this metric out of a batch aggregate. Exhaustive by
    /// construction: exactly one of the three is selected per grid point.
    pub fn of(self, batch: &BatchMetrics) -> f64 {
        match self {
            MetricKind::Precision => batch.mean_precision,
            MetricKind::Recall => batch.mean_recall,
            MetricKind::Map => batch.map,
        }
    }
}

impl FromStr for MetricKind {
    type Err = Error;

    /// Accepts the metric names `p`, `r` and `map`, case-insensitive.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "p" => Ok(MetricKind::Precision),
            "r" => Ok(MetricKind::Recall),
            "map" => Ok(MetricKind::Map),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

/// One grid step: the candidate lambda and the batch metric it scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub lambda: f64,
    pub score: f64,
}

/// Outcome of a training run: the selected lambda plus the full grid,
/// kept as a side artifact for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub best_lambda: f64,
    pub best_score: f64,
    pub grid: Vec<GridPoint>,
}

/// Candidate lambda values from `step` to 1.0 inclusive.
///
/// Each candidate is re-rounded to the step's decimal precision after the
/// increment, so accumulated float drift can neither skip 1.0 nor produce
/// values like 0.30000000000000004. A step that is not positive and finite
/// yields an empty grid; [`train_lambda`] rejects such steps up front.
pub fn lambda_grid(step: f64) -> Vec<f64> {
    if !step.is_finite() || step <= 0.0 {
        return Vec::new();
    }
    let decimals = step_decimals(step);
    let scale = 10f64.powi(decimals);
    let mut grid = Vec::new();
    let mut i = 1u32;
    loop {
        let lambda = (step * i as f64 * scale).round() / scale;
        if lambda > 1.0 {
            break;
        }
        grid.push(lambda);
        i += 1;
    }
    grid
}

/// Number of decimal digits needed to write `step` exactly (capped).
fn step_decimals(step: f64) -> i32 {
    for d in 0..=9 {
        let scaled = step * 10f64.powi(d);
        if (scaled - scaled.round()).abs() < 1e-9 {
            return d;
        }
    }
    9
}

/// Grid-search the Jelinek-Mercer weight over a training query batch.
///
/// For every candidate value the external engine is queried with
/// `ScoringParams::JelinekMercer(lambda)` for each training query, the
/// per-query metrics are aggregated under the batch rule of
/// [`BatchMetrics::aggregate`], and the chosen [`MetricKind`] becomes the
/// grid point's score. The argmax wins; ties keep the first (lowest)
/// candidate. Grid points whose batch produced no valid query (NaN score)
/// are recorded but never selected; a grid with no valid point at all fails
/// with [`Error::NoValidGridPoint`].
///
/// Fails with [`Error::EmptyTrainingSet`] when `queries` is empty and with
/// [`Error::InvalidGridStep`] when `step` is not positive and finite.
pub fn train_lambda<E: SearchEngine>(
    engine: &E,
    queries: &[EvalQuery],
    judgments: &RelevanceJudgments<E::Key>,
    field: &str,
    cut: usize,
    metric: MetricKind,
    step: f64,
) -> Result<TrainingOutcome> {
    if queries.is_empty() {
        return Err(Error::EmptyTrainingSet);
    }
    if !step.is_finite() || step <= 0.0 {
        return Err(Error::InvalidGridStep(step));
    }

    let mut grid = Vec::new();
    let mut best: Option<GridPoint> = None;
    for lambda in lambda_grid(step) {
        let params = ScoringParams::JelinekMercer(lambda);
        let evaluations = evaluate_batch(engine, queries, judgments, field, &params, cut);
        let batch = BatchMetrics::aggregate(&evaluations);
        let score = metric.of(&batch);
        debug!(lambda, score, evaluated = batch.evaluated, "grid point");
        grid.push(GridPoint { lambda, score });

        // NaN never wins, not even as the first candidate; `best` holds a
        // finite score whenever it is Some.
        let better = !score.is_nan() && best.map_or(true, |current| score > current.score);
        if better {
            best = Some(GridPoint { lambda, score });
        }
    }

    // None left here means every candidate scored NaN: no query produced a
    // valid record at any lambda.
    let best = best.ok_or(Error::NoValidGridPoint)?;
    Ok(TrainingOutcome {
        best_lambda: best.lambda,
        best_score: best.score,
        grid,
    })
}
