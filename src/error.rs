use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Evaluation errors.
///
/// Every variant is a deterministic validation failure on malformed input.
/// None of them is transient or retryable; callers should surface them
/// rather than substitute defaults. Batch runners keep going after a single
/// query's error and collect it in that query's slot instead of aborting.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// Unrecognized term-weighting scheme name.
    #[error("unknown weighting scheme '{0}', expected bin, tf or tfxidf")]
    InvalidMode(String),

    /// Two vectors of different dimension were compared.
    #[error("vector dimension mismatch: {left} != {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// K-means was asked to cluster nothing, or into zero clusters.
    #[error("invalid cluster request: {points} points, k = {k}")]
    InvalidClusterRequest { points: usize, k: usize },

    /// A query carries no relevance judgments; recall is undefined.
    #[error("query has an empty relevance set; recall is undefined")]
    EmptyRelevanceSet,

    /// The trainer was given no training queries.
    #[error("training query batch is empty")]
    EmptyTrainingSet,

    /// The metric cut must be at least 1.
    #[error("metric cut must be at least 1")]
    ZeroCut,

    /// The lambda grid step must be positive and finite.
    #[error("lambda grid step must be positive and finite, got {0}")]
    InvalidGridStep(f64),

    /// Every lambda candidate scored NaN; nothing to select.
    #[error("no lambda candidate produced a valid score")]
    NoValidGridPoint,

    /// Paired series of different lengths cannot be compared.
    #[error("unaligned metric series: {left} != {right}")]
    UnalignedSeries { left: usize, right: usize },
}
