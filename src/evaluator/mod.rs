//! Core evaluation pipeline: term statistics, vectors, clustering, metrics,
//! training and significance testing.

pub mod cluster;
pub mod frequency;
pub mod metrics;
pub mod report;
pub mod similarity;
pub mod stats;
pub mod trainer;
pub mod vocabulary;
pub mod weights;
