use num::Float;

use crate::error::{Error, Result};
use crate::evaluator::weights::DocVector;

/// Cosine similarity of two equal-dimension vectors.
///
/// `dot(a, b) / (‖a‖₂ · ‖b‖₂)`, in `[-1, 1]` (and `[0, 1]` for the
/// non-negative term weights this crate builds). Fails with
/// [`Error::DimensionMismatch`] when the lengths differ.
///
/// When either vector is all-zero the result is NaN by definition — the
/// degenerate input is reported, never masked. Callers that prefer a
/// convention (usually "similarity 0") must apply it themselves, as
/// [`rank_similar`](crate::evaluator::cluster::rank_similar) does.
pub fn cosine_similarity<N: Float>(a: &[N], b: &[N]) -> Result<N> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    let mut dot = N::zero();
    let mut norm_a = N::zero();
    let mut norm_b = N::zero();
    for (&va, &vb) in a.iter().zip(b.iter()) {
        dot = dot + va * vb;
        norm_a = norm_a + va * va;
        norm_b = norm_b + vb * vb;
    }
    Ok(dot / (norm_a * norm_b).sqrt())
}

/// [`cosine_similarity`] over built document vectors.
pub fn cosine_of_docs(a: &DocVector, b: &DocVector) -> Result<f64> {
    cosine_similarity(a.as_slice(), b.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn self_similarity_is_one() {
        let v = [0.3, 1.5, 0.0, 2.0];
        assert_relative_eq!(cosine_similarity(&v, &v).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = [1.0, 2.0, 3.0];
        let b = [0.5, 0.0, 4.0];
        let ab = cosine_similarity(&a, &b).unwrap();
        let ba = cosine_similarity(&b, &a).unwrap();
        assert_relative_eq!(ab, ba);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert_relative_eq!(cosine_similarity(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let a = [1.0, 2.0];
        let b = [1.0, 2.0, 3.0];
        assert_eq!(
            cosine_similarity(&a, &b),
            Err(Error::DimensionMismatch { left: 2, right: 3 })
        );
    }

    #[test]
    fn zero_norm_yields_nan_not_a_default() {
        let zero = [0.0, 0.0];
        let v = [1.0, 2.0];
        assert!(cosine_similarity(&zero, &v).unwrap().is_nan());
        assert!(cosine_similarity(&zero, &zero).unwrap().is_nan());
    }
}
