use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::evaluator::frequency::TermFrequency;

/// The shared dimension sample of an evaluation run.
///
/// An ordered, deduplicated term list for one field, collection-wide.
/// Insertion order fixes the term-to-index mapping, so every vector built
/// against the same `Vocabulary` has identical dimension and identical
/// coordinate meaning. Built once per run and read-only afterwards;
/// concurrent readers need no locking (wrap in `Arc` to share).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: IndexSet<Box<str>>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Vocabulary {
            terms: IndexSet::new(),
        }
    }

    /// Build from terms in iteration order, dropping duplicates.
    pub fn from_terms<I, T>(terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut vocab = Vocabulary::new();
        for term in terms {
            vocab.insert(term.as_ref());
        }
        vocab
    }

    /// Collect the union of several documents' terms, in first-seen order.
    pub fn from_documents<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a TermFrequency>,
    {
        let mut vocab = Vocabulary::new();
        for freq in documents {
            for term in freq.terms() {
                vocab.insert(term);
            }
        }
        vocab
    }

    /// Insert a term; keeps the existing slot when already present.
    /// Returns the term's dimension index.
    pub fn insert(&mut self, term: &str) -> usize {
        if let Some(idx) = self.terms.get_index_of(term) {
            idx
        } else {
            self.terms.insert_full(Box::from(term)).0
        }
    }

    /// Dimension index of `term`, if it is part of the vocabulary.
    #[inline]
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.terms.get_index_of(term)
    }

    /// Term at dimension `index`.
    #[inline]
    pub fn term_at(&self, index: usize) -> Option<&str> {
        self.terms.get_index(index).map(|t| t.as_ref())
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    /// Terms in dimension order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.as_ref())
    }

    /// Vector dimension.
    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
