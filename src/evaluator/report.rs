//! Serializable result tables for evaluation and training runs.
//!
//! These are plain data shapes, one row per query (or per grid point) plus
//! an aggregate row, ready to hand to a CSV writer or any serde format.
//! Excluded queries keep their row so the table always lines up with the
//! input batch; their metric cells are empty and the note says why.

use serde::{Deserialize, Serialize};

use crate::evaluator::metrics::{BatchMetrics, QueryEvaluation};
use crate::evaluator::trainer::{MetricKind, TrainingOutcome};

/// Label of the trailing aggregate row.
pub const AGGREGATE_LABEL: &str = "averages";

/// One query's row in a results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRow {
    pub query_id: String,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub average_precision: Option<f64>,
    /// Why the metric cells are empty, for excluded queries.
    pub note: Option<String>,
}

/// Per-query metrics at one cut, with the batch means as the last row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsTable {
    pub cut: usize,
    pub rows: Vec<QueryRow>,
    pub aggregate: QueryRow,
}

impl ResultsTable {
    /// Lay out a batch run as a table. Row order follows the batch.
    pub fn new(evaluations: &[QueryEvaluation], batch: &BatchMetrics, cut: usize) -> Self {
        let rows = evaluations
            .iter()
            .map(|eval| match &eval.outcome {
                Ok(record) if record.valid => QueryRow {
                    query_id: eval.id.clone(),
                    precision: Some(record.precision),
                    recall: Some(record.recall),
                    average_precision: Some(record.average_precision),
                    note: None,
                },
                Ok(_) => QueryRow {
                    query_id: eval.id.clone(),
                    precision: None,
                    recall: None,
                    average_precision: None,
                    note: Some("no results returned".to_string()),
                },
                Err(err) => QueryRow {
                    query_id: eval.id.clone(),
                    precision: None,
                    recall: None,
                    average_precision: None,
                    note: Some(err.to_string()),
                },
            })
            .collect();

        // NaN means (an all-excluded batch) serialize poorly; empty cells
        // carry the same information.
        let wrap = |v: f64| if v.is_nan() { None } else { Some(v) };
        let aggregate = QueryRow {
            query_id: AGGREGATE_LABEL.to_string(),
            precision: wrap(batch.mean_precision),
            recall: wrap(batch.mean_recall),
            average_precision: wrap(batch.map),
            note: (batch.excluded > 0).then(|| format!("{} queries excluded", batch.excluded)),
        };

        ResultsTable {
            cut,
            rows,
            aggregate,
        }
    }

    /// Column headers matching the row layout.
    pub fn headers(&self) -> [String; 4] {
        [
            "query".to_string(),
            format!("P@{}", self.cut),
            format!("R@{}", self.cut),
            format!("AP@{}", self.cut),
        ]
    }

    /// One-line summary of the aggregate row.
    pub fn summary_line(&self) -> String {
        let cell = |v: Option<f64>| match v {
            Some(v) => format!("{v:.4}"),
            None => "-".to_string(),
        };
        format!(
            "mean P@{cut} = {p}  mean R@{cut} = {r}  MAP@{cut} = {m}",
            cut = self.cut,
            p = cell(self.aggregate.precision),
            r = cell(self.aggregate.recall),
            m = cell(self.aggregate.average_precision),
        )
    }
}

/// One grid point's row in a training table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub lambda: f64,
    pub score: f64,
    /// Set on the selected grid point.
    pub best: bool,
}

/// The full training grid, best row marked, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingTable {
    pub metric: MetricKind,
    pub cut: usize,
    pub rows: Vec<TrainingRow>,
}

impl TrainingTable {
    pub fn new(outcome: &TrainingOutcome, metric: MetricKind, cut: usize) -> Self {
        let rows = outcome
            .grid
            .iter()
            .map(|point| TrainingRow {
                lambda: point.lambda,
                score: point.score,
                best: point.lambda == outcome.best_lambda,
            })
            .collect();
        TrainingTable { metric, cut, rows }
    }

    pub fn headers(&self) -> [String; 2] {
        let metric = match self.metric {
            MetricKind::Precision => "P",
            MetricKind::Recall => "R",
            MetricKind::Map => "MAP",
        };
        ["lambda".to_string(), format!("{}@{}", metric, self.cut)]
    }
}
