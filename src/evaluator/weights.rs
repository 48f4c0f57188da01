use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::evaluator::frequency::TermFrequency;
use crate::evaluator::vocabulary::Vocabulary;

/// Term-weighting scheme for document vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightingScheme {
    /// 1.0 when the term occurs in the document, else 0.0.
    Binary,
    /// Raw occurrence count.
    TermFrequency,
    /// Occurrence count times `log10(N / df)`.
    TfIdf,
}

impl FromStr for WeightingScheme {
    type Err = Error;

    /// Accepts the scheme names `bin`, `tf` and `tfxidf`, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "bin" => Ok(WeightingScheme::Binary),
            "tf" => Ok(WeightingScheme::TermFrequency),
            "tfxidf" => Ok(WeightingScheme::TfIdf),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

/// A dense term-weight vector aligned to a [`Vocabulary`].
///
/// One weight per vocabulary dimension; terms absent from the document hold
/// weight 0 regardless of scheme. Non-negative for every scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocVector {
    weights: Vec<f64>,
}

impl DocVector {
    pub(crate) fn from_weights(weights: Vec<f64>) -> Self {
        DocVector { weights }
    }

    /// Vector dimension, always the vocabulary size it was built against.
    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    #[inline]
    pub fn weight(&self, dim: usize) -> f64 {
        self.weights[dim]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    pub fn into_weights(self) -> Vec<f64> {
        self.weights
    }
}

/// Project a document's sparse term counts onto a dense vocabulary-aligned
/// weight vector.
///
/// Pure function of its inputs: same vocabulary, counts and collection
/// statistics always produce the same vector. `doc_count` and `df_lookup`
/// are only consulted under [`WeightingScheme::TfIdf`]; a term with zero
/// document frequency (not in the collection) weighs 0, which also guards
/// the `N / df` division.
pub fn build_vector<F>(
    vocab: &Vocabulary,
    freq: &TermFrequency,
    scheme: WeightingScheme,
    doc_count: u64,
    df_lookup: F,
) -> DocVector
where
    F: Fn(&str) -> u64,
{
    let mut weights = vec![0.0; vocab.len()];
    for (term, count) in freq.iter() {
        let Some(dim) = vocab.index_of(term) else {
            // Term outside the shared vocabulary: no dimension to carry it.
            continue;
        };
        if count == 0 {
            continue;
        }
        weights[dim] = match scheme {
            WeightingScheme::Binary => 1.0,
            WeightingScheme::TermFrequency => count as f64,
            WeightingScheme::TfIdf => {
                let df = df_lookup(term);
                if df == 0 {
                    0.0
                } else {
                    count as f64 * (doc_count as f64 / df as f64).log10()
                }
            }
        };
    }
    DocVector::from_weights(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn doc(terms: &[&str]) -> TermFrequency {
        let mut freq = TermFrequency::new();
        freq.add_terms(terms);
        freq
    }

    #[test]
    fn binary_weights_are_zero_or_one() {
        let vocab = Vocabulary::from_terms(["a", "b", "c"]);
        let freq = doc(&["a", "a", "c"]);
        let vec = build_vector(&vocab, &freq, WeightingScheme::Binary, 10, |_| 1);
        assert_eq!(vec.as_slice(), &[1.0, 0.0, 1.0]);
        for (dim, term) in vocab.iter().enumerate() {
            let expected = if freq.contains(term) { 1.0 } else { 0.0 };
            assert_eq!(vec.weight(dim), expected);
        }
    }

    #[test]
    fn tf_weights_are_raw_counts() {
        let vocab = Vocabulary::from_terms(["a", "b"]);
        let freq = doc(&["a", "a", "a", "b"]);
        let vec = build_vector(&vocab, &freq, WeightingScheme::TermFrequency, 10, |_| 1);
        assert_eq!(vec.as_slice(), &[3.0, 1.0]);
    }

    #[test]
    fn tfidf_term_in_every_document_weighs_zero() {
        let vocab = Vocabulary::from_terms(["common", "rare"]);
        let freq = doc(&["common", "common", "rare"]);
        let n = 100;
        let vec = build_vector(&vocab, &freq, WeightingScheme::TfIdf, n, |term| {
            if term == "common" {
                n // df == N => log10(1) == 0
            } else {
                10
            }
        });
        assert_relative_eq!(vec.weight(0), 0.0);
        assert_relative_eq!(vec.weight(1), 1.0 * (100f64 / 10.0).log10());
    }

    #[test]
    fn tfidf_zero_df_is_defined_as_zero() {
        let vocab = Vocabulary::from_terms(["ghost"]);
        let freq = doc(&["ghost"]);
        let vec = build_vector(&vocab, &freq, WeightingScheme::TfIdf, 100, |_| 0);
        assert_eq!(vec.weight(0), 0.0);
    }

    #[test]
    fn vector_length_is_vocabulary_size() {
        let vocab = Vocabulary::from_terms(["a", "b", "c", "d"]);
        let vec = build_vector(&vocab, &doc(&["b"]), WeightingScheme::Binary, 1, |_| 1);
        assert_eq!(vec.len(), 4);
    }

    #[test]
    fn scheme_parsing_matches_cli_spellings() {
        assert_eq!("bin".parse::<WeightingScheme>(), Ok(WeightingScheme::Binary));
        assert_eq!("TF".parse::<WeightingScheme>(), Ok(WeightingScheme::TermFrequency));
        assert_eq!("TfxIdf".parse::<WeightingScheme>(), Ok(WeightingScheme::TfIdf));
        assert_eq!(
            "idf".parse::<WeightingScheme>(),
            Err(Error::InvalidMode("idf".to_string()))
        );
    }
}
