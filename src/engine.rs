//! Seams to the external indexing/ranking engine.
//!
//! The evaluator never builds or stores an index. Everything it needs from
//! the engine fits in two capabilities: per-document term statistics for
//! vector building ([`TermIndex`]) and ranked search for metric computation
//! and training ([`SearchEngine`]).

use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::evaluator::frequency::TermFrequency;

/// Scoring configuration passed to the external engine per search call.
///
/// `JelinekMercer` carries the smoothing weight under training; `Classic`
/// is the fixed tf-idf style weighting used as the untrained baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScoringParams {
    /// Classic tf-idf weighting, no tunable parameter.
    Classic,
    /// Language-model scoring with a Jelinek-Mercer interpolation weight.
    JelinekMercer(f64),
}

/// Read access to per-document and collection-wide term statistics.
///
/// Implemented by the external index. All methods are collection reads with
/// no side effects; `term_frequencies` returns `None` when the document or
/// field has no stored term statistics.
pub trait TermIndex {
    /// Document handle type used by the index.
    type Key;

    /// Raw term counts of one document's field.
    fn term_frequencies(&self, key: &Self::Key, field: &str) -> Option<TermFrequency>;

    /// Number of documents in which `term` occurs, collection-wide.
    fn document_frequency(&self, term: &str, field: &str) -> u64;

    /// Total number of indexed documents.
    fn document_count(&self) -> u64;

    /// External document label, for reporting only. Metric computation joins
    /// ranked results against relevance judgments on the search key itself.
    fn stored_identifier(&self, key: &Self::Key) -> Option<String>;
}

/// Ranked retrieval for a textual query.
pub trait SearchEngine {
    /// Document label type, the join key against relevance judgments.
    type Key: Clone + Eq + Hash + Send + Sync;

    /// Ranked `(document, score)` list for `query`, at most `limit` entries,
    /// best first. Tie order is whatever the engine produced; the evaluator
    /// treats the returned order as ground truth.
    fn search(
        &self,
        query: &str,
        field: &str,
        params: &ScoringParams,
        limit: usize,
    ) -> Vec<(Self::Key, f64)>;
}
