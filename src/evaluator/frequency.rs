use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Raw term occurrence counts of one document field.
///
/// This is the input to vector building: a sparse `term -> count` map in
/// first-seen order, plus the total count. It carries no weighting of its
/// own; weighting happens in [`crate::evaluator::weights::build_vector`].
///
/// # Examples
/// ```
/// use ir_evaluator::TermFrequency;
/// let mut freq = TermFrequency::new();
/// freq.add_term("heart").add_term("rate").add_term("heart");
/// assert_eq!(freq.count("heart"), 2);
/// assert_eq!(freq.term_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TermFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    term_count: IndexMap<String, u64>,
    total_term_count: u64,
}

impl TermFrequency {
    pub fn new() -> Self {
        TermFrequency {
            term_count: IndexMap::new(),
            total_term_count: 0,
        }
    }

    /// Count one occurrence of `term`.
    #[inline]
    pub fn add_term(&mut self, term: &str) -> &mut Self {
        let count = self.term_count.entry(term.to_string()).or_insert(0);
        *count += 1;
        self.total_term_count += 1;
        self
    }

    /// Count one occurrence of each term in `terms`.
    #[inline]
    pub fn add_terms<T>(&mut self, terms: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for term in terms {
            self.add_term(term.as_ref());
        }
        self
    }

    /// Set the occurrence count of `term` directly, replacing any prior
    /// count. Used when the external index already stores per-term counts.
    pub fn set_count(&mut self, term: &str, count: u64) -> &mut Self {
        if let Some(existing) = self.term_count.get_mut(term) {
            self.total_term_count = self.total_term_count - *existing + count;
            *existing = count;
        } else {
            self.term_count.insert(term.to_string(), count);
            self.total_term_count += count;
        }
        self
    }

    /// Occurrence count of `term`, 0 when absent.
    #[inline]
    pub fn count(&self, term: &str) -> u64 {
        self.term_count.get(term).copied().unwrap_or(0)
    }

    #[inline]
    pub fn contains(&self, term: &str) -> bool {
        self.term_count.contains_key(term)
    }

    /// Iterate `(term, count)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.term_count.iter().map(|(t, &c)| (t.as_str(), c))
    }

    /// Distinct terms in first-seen order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.term_count.keys().map(String::as_str)
    }

    /// Number of distinct terms.
    #[inline]
    pub fn unique_terms(&self) -> usize {
        self.term_count.len()
    }

    /// Total number of term occurrences.
    #[inline]
    pub fn term_sum(&self) -> u64 {
        self.total_term_count
    }

    pub fn is_empty(&self) -> bool {
        self.term_count.is_empty()
    }
}
