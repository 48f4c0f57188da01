//! Ranked-retrieval metrics at a fixed cut, per query and per batch.
//!
//! Two denominator policies are preserved from the reference behavior and
//! are deliberate, if debatable:
//!
//! - `precision@k` divides by the cut size, not by how many results were
//!   actually returned, so short result lists are penalized;
//! - a query whose ranked list came back empty is excluded from the batch
//!   aggregates entirely (the divisor shrinks with it).
//!
//! The two are mutually inconsistent (a partial-but-nonzero result list is
//! not excluded the way a zero-result one is); this is flagged for product
//! clarification rather than silently fixed here.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{ScoringParams, SearchEngine};
use crate::error::{Error, Result};

/// One evaluation query: a stable id (the join key into judgments and
/// reports) and the raw query text handed to the external engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalQuery {
    pub id: String,
    pub text: String,
}

impl EvalQuery {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        EvalQuery {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Ground-truth relevance judgments, keyed by query id.
///
/// A document key not present for a query is implicitly non-relevant.
/// Parsed once per run and read-only afterwards; concurrent readers need
/// no locking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelevanceJudgments<K: Eq + Hash> {
    by_query: HashMap<String, HashSet<K>>,
}

impl<K: Eq + Hash> RelevanceJudgments<K> {
    pub fn new() -> Self {
        RelevanceJudgments {
            by_query: HashMap::new(),
        }
    }

    /// Record `doc` as relevant for `query_id`.
    pub fn add(&mut self, query_id: impl Into<String>, doc: K) -> &mut Self {
        self.by_query.entry(query_id.into()).or_default().insert(doc);
        self
    }

    /// The relevant set for a query, if any judgments exist for it.
    pub fn relevant_for(&self, query_id: &str) -> Option<&HashSet<K>> {
        self.by_query.get(query_id)
    }

    pub fn len(&self) -> usize {
        self.by_query.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_query.is_empty()
    }
}

impl<K: Eq + Hash, Q: Into<String>, I: IntoIterator<Item = K>> FromIterator<(Q, I)>
    for RelevanceJudgments<K>
{
    fn from_iter<T: IntoIterator<Item = (Q, I)>>(iter: T) -> Self {
        let mut judgments = RelevanceJudgments::new();
        for (query_id, docs) in iter {
            let set = judgments.by_query.entry(query_id.into()).or_default();
            set.extend(docs);
        }
        judgments
    }
}

/// Metrics of one query at one cut.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub precision: f64,
    pub recall: f64,
    pub average_precision: f64,
    /// False iff the ranked list was empty. Invalid records are defined
    /// behavior, not errors: they drop out of batch aggregation.
    pub valid: bool,
}

/// Precision@k, recall@k and AP@k of one ranked list against a judgment set.
///
/// Walks `ranked` up to `min(cut, ranked.len())`; at every relevant hit the
/// AP numerator accumulates precision at that hit's own rank (`r / j`,
/// 1-indexed).
///
/// Fails with [`Error::ZeroCut`] when `cut` is 0 (precision would divide by
/// zero) and with [`Error::EmptyRelevanceSet`] when `relevant` is empty,
/// since recall would be undefined.
pub fn evaluate_query<K: Eq + Hash>(
    ranked: &[(K, f64)],
    relevant: &HashSet<K>,
    cut: usize,
) -> Result<MetricsRecord> {
    if cut == 0 {
        return Err(Error::ZeroCut);
    }
    if relevant.is_empty() {
        return Err(Error::EmptyRelevanceSet);
    }

    let mut hits = 0u64;
    let mut ap_numerator = 0.0;
    for (rank0, (doc, _score)) in ranked.iter().take(cut).enumerate() {
        if relevant.contains(doc) {
            hits += 1;
            ap_numerator += hits as f64 / (rank0 + 1) as f64;
        }
    }

    let judged = relevant.len() as f64;
    Ok(MetricsRecord {
        precision: hits as f64 / cut as f64,
        recall: hits as f64 / judged,
        average_precision: ap_numerator / judged,
        valid: !ranked.is_empty(),
    })
}

/// One query's slot in a batch run: the metrics, or the data error that
/// query produced. A single bad query never aborts the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryEvaluation {
    pub id: String,
    pub outcome: std::result::Result<MetricsRecord, Error>,
}

/// Batch aggregates: arithmetic means over the queries that produced a
/// valid record (shrinking-denominator policy, see module docs).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchMetrics {
    pub mean_precision: f64,
    pub mean_recall: f64,
    pub map: f64,
    /// Queries that contributed to the means.
    pub evaluated: usize,
    /// Queries excluded: errored, or returned zero results at the cut.
    pub excluded: usize,
}

impl BatchMetrics {
    /// Aggregate a batch of per-query outcomes.
    ///
    /// With no contributing query the means are NaN (0/0), reported as-is.
    pub fn aggregate(evaluations: &[QueryEvaluation]) -> Self {
        let mut sum_p = 0.0;
        let mut sum_r = 0.0;
        let mut sum_ap = 0.0;
        let mut evaluated = 0usize;
        for eval in evaluations {
            match &eval.outcome {
                Ok(record) if record.valid => {
                    sum_p += record.precision;
                    sum_r += record.recall;
                    sum_ap += record.average_precision;
                    evaluated += 1;
                }
                _ => {}
            }
        }
        let n = evaluated as f64;
        BatchMetrics {
            mean_precision: sum_p / n,
            mean_recall: sum_r / n,
            map: sum_ap / n,
            evaluated,
            excluded: evaluations.len() - evaluated,
        }
    }
}

fn evaluate_one<E: SearchEngine>(
    engine: &E,
    query: &EvalQuery,
    judgments: &RelevanceJudgments<E::Key>,
    field: &str,
    params: &ScoringParams,
    cut: usize,
) -> QueryEvaluation {
    let outcome = match judgments.relevant_for(&query.id) {
        Some(relevant) => {
            let ranked = engine.search(&query.text, field, params, cut);
            evaluate_query(&ranked, relevant, cut)
        }
        // No judgment line at all behaves like an empty judgment set.
        None => Err(Error::EmptyRelevanceSet),
    };
    QueryEvaluation {
        id: query.id.clone(),
        outcome,
    }
}

/// Evaluate a query batch sequentially, one slot per query in input order.
pub fn evaluate_batch<E: SearchEngine>(
    engine: &E,
    queries: &[EvalQuery],
    judgments: &RelevanceJudgments<E::Key>,
    field: &str,
    params: &ScoringParams,
    cut: usize,
) -> Vec<QueryEvaluation> {
    let evaluations: Vec<QueryEvaluation> = queries
        .iter()
        .map(|q| evaluate_one(engine, q, judgments, field, params, cut))
        .collect();
    debug!(
        queries = queries.len(),
        errors = evaluations.iter().filter(|e| e.outcome.is_err()).count(),
        "batch evaluated"
    );
    evaluations
}

/// Parallel batch evaluation across independent queries.
///
/// Queries are partitioned over the immutable input slice and the results
/// merged by index, so the output is identical to [`evaluate_batch`].
/// Within one query the rank walk stays sequential.
pub fn evaluate_batch_parallel<E>(
    engine: &E,
    queries: &[EvalQuery],
    judgments: &RelevanceJudgments<E::Key>,
    field: &str,
    params: &ScoringParams,
    cut: usize,
) -> Vec<QueryEvaluation>
where
    E: SearchEngine + Sync,
    E::Key: Send,
{
    queries
        .par_iter()
        .map(|q| evaluate_one(engine, q, judgments, field, params, cut))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ranked(keys: &[u32]) -> Vec<(u32, f64)> {
        keys.iter()
            .enumerate()
            .map(|(i, &k)| (k, 1.0 - i as f64 * 0.01))
            .collect()
    }

    fn relevant(keys: &[u32]) -> HashSet<u32> {
        keys.iter().copied().collect()
    }

    #[test]
    fn perfect_prefix_scores_one_across_the_board() {
        let record = evaluate_query(&ranked(&[1, 2, 3, 4, 5]), &relevant(&[1, 2, 3]), 3).unwrap();
        assert_relative_eq!(record.precision, 1.0);
        assert_relative_eq!(record.recall, 1.0);
        assert_relative_eq!(record.average_precision, 1.0);
        assert!(record.valid);
    }

    #[test]
    fn leading_miss_shifts_every_hit_rank() {
        // Hits at ranks 2, 3, 4: AP numerator = 1/2 + 2/3 + 3/4 = 1.91666...
        let record = evaluate_query(&ranked(&[9, 1, 2, 3, 4]), &relevant(&[1, 2, 3]), 5).unwrap();
        assert_relative_eq!(record.precision, 0.6);
        assert_relative_eq!(record.recall, 1.0);
        assert_relative_eq!(
            record.average_precision,
            (0.5 + 2.0 / 3.0 + 0.75) / 3.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn precision_divides_by_cut_not_by_returned_count() {
        // Only two results came back at cut 10; both relevant.
        let record = evaluate_query(&ranked(&[1, 2]), &relevant(&[1, 2, 3, 4]), 10).unwrap();
        assert_relative_eq!(record.precision, 2.0 / 10.0);
        assert_relative_eq!(record.recall, 0.5);
    }

    #[test]
    fn zero_cut_is_an_error_not_a_nan() {
        assert_eq!(
            evaluate_query(&ranked(&[1, 2]), &relevant(&[1]), 0),
            Err(Error::ZeroCut)
        );
    }

    #[test]
    fn empty_relevance_set_is_an_error() {
        let empty: HashSet<u32> = HashSet::new();
        assert_eq!(
            evaluate_query(&ranked(&[1, 2]), &empty, 5),
            Err(Error::EmptyRelevanceSet)
        );
    }

    #[test]
    fn zero_results_are_marked_invalid_not_errored() {
        let record = evaluate_query(&[], &relevant(&[1]), 5).unwrap();
        assert!(!record.valid);
        assert_relative_eq!(record.precision, 0.0);
        assert_relative_eq!(record.recall, 0.0);
    }

    #[test]
    fn aggregation_shrinks_the_denominator_for_invalid_queries() {
        let evaluations = vec![
            QueryEvaluation {
                id: "1".into(),
                outcome: Ok(MetricsRecord {
                    precision: 0.4,
                    recall: 0.8,
                    average_precision: 0.5,
                    valid: true,
                }),
            },
            QueryEvaluation {
                id: "2".into(),
                outcome: Ok(MetricsRecord {
                    precision: 0.2,
                    recall: 0.4,
                    average_precision: 0.3,
                    valid: true,
                }),
            },
            // Zero results: excluded from every mean.
            QueryEvaluation {
                id: "3".into(),
                outcome: Ok(MetricsRecord {
                    precision: 0.0,
                    recall: 0.0,
                    average_precision: 0.0,
                    valid: false,
                }),
            },
            // Data error: excluded as well, but kept in the batch output.
            QueryEvaluation {
                id: "4".into(),
                outcome: Err(Error::EmptyRelevanceSet),
            },
        ];
        let agg = BatchMetrics::aggregate(&evaluations);
        assert_eq!(agg.evaluated, 2);
        assert_eq!(agg.excluded, 2);
        assert_relative_eq!(agg.mean_precision, 0.3);
        assert_relative_eq!(agg.mean_recall, 0.6);
        assert_relative_eq!(agg.map, 0.4);
    }

    #[test]
    fn aggregation_of_nothing_is_nan() {
        let agg = BatchMetrics::aggregate(&[]);
        assert!(agg.map.is_nan());
        assert_eq!(agg.evaluated, 0);
    }
}
