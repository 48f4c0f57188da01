/// This crate is a ranked-retrieval evaluation and tuning engine: it turns
/// documents into term-weight vectors, clusters them, scores ranked result
/// lists against relevance judgments, grid-searches a smoothing parameter
/// and compares two system configurations for statistical significance.
pub mod evaluator;
pub mod engine;
pub mod error;

/// Term Frequency structure
/// A struct for analyzing/managing term occurrence counts within a document
/// field. It manages:
/// - The count of occurrences of each term, in first-seen order
/// - The total number of term occurrences in the field
///
/// Used as the base data for vector building: every weighting scheme reads
/// its raw counts from here. Provides adding terms, setting/getting counts,
/// and retrieving statistics.
pub use evaluator::frequency::TermFrequency;

/// Vocabulary for the evaluator
/// An ordered, deduplicated term list for one field, collection-wide.
/// Insertion order fixes the term-to-index mapping, so every vector built
/// against the same `Vocabulary` has identical dimension and coordinate
/// meaning.
///
/// Built once per run (from explicit terms or as the union over a document
/// collection) and read-only afterwards. Share between threads by wrapping
/// in `Arc`; concurrent readers need no locking.
pub use evaluator::vocabulary::Vocabulary;

/// Term-weighting schemes and dense document vectors
/// `WeightingScheme` selects how raw counts become weights:
/// - Binary: presence/absence (1.0 or 0.0)
/// - TermFrequency: the raw occurrence count
/// - TfIdf: count times `log10(N / df)`
///
/// `build_vector` projects one document's sparse counts onto a dense
/// `DocVector` aligned to a shared `Vocabulary`. Collection statistics come
/// from the caller (typically a [`TermIndex`] implementation), so vector
/// building itself never touches an index.
pub use evaluator::weights::{build_vector, DocVector, WeightingScheme};

/// Cosine similarity over aligned vectors
/// Returns the raw ratio `dot / (|a| * |b|)`. A zero-norm side yields NaN,
/// reported as-is rather than masked with an epsilon; call sites decide
/// whether NaN means "drop" or "error". Mismatched dimensions are an error.
pub use evaluator::similarity::{cosine_of_docs, cosine_similarity};

/// K-means clustering over document vectors
/// `KMeans::run` (or `run_seeded` for reproducible runs) partitions a slice
/// of `DocVector`s into k clusters: uniform min-max initial centroids,
/// nearest-centroid assignment, mean recentering, exact-equality
/// convergence. The returned `Clustering` carries every cluster's centroid
/// and member indices plus a sum-of-distances objective.
///
/// `rank_similar` is the front-end step: order a collection against one
/// target document by cosine similarity, best first.
pub use evaluator::cluster::{rank_similar, Cluster, Clustering, KMeans};

/// Ranked-retrieval metrics at a fixed cut
/// `evaluate_query` scores one ranked list against one judgment set
/// (precision@k, recall@k, AP@k). `evaluate_batch` and
/// `evaluate_batch_parallel` run a whole query batch against an external
/// [`SearchEngine`], one result-or-error slot per query, and
/// `BatchMetrics::aggregate` folds the valid slots into means (MAP among
/// them).
pub use evaluator::metrics::{
    evaluate_batch, evaluate_batch_parallel, evaluate_query, BatchMetrics, EvalQuery,
    MetricsRecord, QueryEvaluation, RelevanceJudgments,
};

/// Grid-search training of the Jelinek-Mercer smoothing weight
/// `train_lambda` walks candidate lambda values from `step` to 1.0
/// inclusive, evaluates the training batch at each, and selects the value
/// maximizing the chosen `MetricKind`. Ties keep the lowest candidate. The
/// full grid is returned alongside the winner for reporting.
pub use evaluator::trainer::{
    lambda_grid, train_lambda, GridPoint, MetricKind, TrainingOutcome, DEFAULT_LAMBDA_STEP,
};

/// Paired significance tests
/// `compare` runs a paired t-test or a Wilcoxon signed-rank test over two
/// aligned per-query metric series and reports the two-tailed p-value plus
/// the reject/keep decision at the caller's alpha. `compare_metric` adds
/// the running-mean transform applied when MAP series meet the t-test.
pub use evaluator::stats::{compare, compare_metric, cumulative_average, Comparison, TestKind};

/// Result tables
/// Serializable layouts of a batch evaluation (`ResultsTable`: one row per
/// query plus an aggregate row) and of a training run (`TrainingTable`: one
/// row per grid point, best marked), ready for a CSV writer or any serde
/// format.
pub use evaluator::report::{QueryRow, ResultsTable, TrainingRow, TrainingTable};

/// Engine seams
/// The evaluator never builds or stores an index; it reads term statistics
/// through `TermIndex` and ranked results through `SearchEngine`, with
/// `ScoringParams` selecting classic weighting or Jelinek-Mercer smoothing
/// per call.
pub use engine::{ScoringParams, SearchEngine, TermIndex};

/// Crate-wide error type and result alias
/// Every variant is a deterministic validation failure on malformed input;
/// batch runners collect per-query errors instead of aborting.
pub use error::{Error, Result};
