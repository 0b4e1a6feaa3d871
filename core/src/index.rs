use crate::error::{Result, SearchError};
use crate::tokenizer::{is_valid_word, split_into_words};
use crate::{DocId, DocumentStatus, ExecutionPolicy};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Interned term shared by the forward and inverted indices.
pub type Term = Arc<str>;
/// document id -> term frequency
pub type Postings = BTreeMap<DocId, f64>;
/// term -> term frequency
pub type WordFrequencies = BTreeMap<Term, f64>;

static EMPTY_FREQUENCIES: WordFrequencies = BTreeMap::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentData {
    pub rating: i32,
    pub status: DocumentStatus,
}

/// Owns the forward index, the inverted index and per-document metadata.
///
/// Both indices share the same interned terms and are always updated
/// together: a document is in `document_to_word_freqs` exactly when it is in
/// the posting list of each of its words.
#[derive(Debug, Default)]
pub struct IndexStore {
    stop_words: BTreeSet<String>,
    word_to_document_freqs: BTreeMap<Term, Postings>,
    document_to_word_freqs: BTreeMap<DocId, WordFrequencies>,
    documents: BTreeMap<DocId, DocumentData>,
    document_ids: Vec<DocId>,
}

impl IndexStore {
    /// Build an empty store. Empty stop words are dropped; a stop word with a
    /// control character is rejected.
    pub fn new<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for word in stop_words {
            let word = word.as_ref();
            if !is_valid_word(word) {
                return Err(SearchError::InvalidTerm(word.to_string()));
            }
            if !word.is_empty() {
                set.insert(word.to_string());
            }
        }
        Ok(Self { stop_words: set, ..Self::default() })
    }

    /// Build an empty store from space-separated stop words.
    pub fn from_stop_words_text(text: &str) -> Result<Self> {
        Self::new(split_into_words(text))
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    pub fn add_document(&mut self, document_id: DocId, text: &str, status: DocumentStatus, ratings: &[i32]) -> Result<()> {
        if document_id < 0 || self.documents.contains_key(&document_id) {
            return Err(SearchError::InvalidId(document_id));
        }
        let words = self.split_into_words_no_stop(text)?;

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for &word in &words {
            *counts.entry(word).or_insert(0) += 1;
        }
        let total = words.len() as f64;

        let mut frequencies = WordFrequencies::new();
        for (word, count) in counts {
            let term = match self.word_to_document_freqs.get_key_value(word) {
                Some((term, _)) => Arc::clone(term),
                None => Term::from(word),
            };
            let tf = count as f64 / total;
            self.word_to_document_freqs.entry(Arc::clone(&term)).or_default().insert(document_id, tf);
            frequencies.insert(term, tf);
        }

        tracing::debug!(document_id, terms = frequencies.len(), words = words.len(), "document added");
        if !frequencies.is_empty() {
            self.document_to_word_freqs.insert(document_id, frequencies);
        }
        self.documents.insert(document_id, DocumentData { rating: compute_average_rating(ratings), status });
        self.document_ids.push(document_id);
        Ok(())
    }

    /// Remove a document and every posting that refers to it. Absent ids are ignored.
    pub fn remove_document(&mut self, policy: ExecutionPolicy, document_id: DocId) {
        let Some(position) = self.document_ids.iter().position(|&id| id == document_id) else {
            return;
        };
        self.document_ids.remove(position);
        self.documents.remove(&document_id);

        let word_freqs = self.document_to_word_freqs.remove(&document_id).unwrap_or_default();
        match policy {
            ExecutionPolicy::Sequential => {
                for term in word_freqs.keys() {
                    if let Some(postings) = self.word_to_document_freqs.get_mut(term) {
                        postings.remove(&document_id);
                        if postings.is_empty() {
                            self.word_to_document_freqs.remove(term);
                        }
                    }
                }
            }
            ExecutionPolicy::Parallel => {
                let mut affected: Vec<(Term, Postings)> = word_freqs
                    .keys()
                    .filter_map(|term| self.word_to_document_freqs.remove_entry(term))
                    .collect();
                affected.par_iter_mut().for_each(|(_, postings)| {
                    postings.remove(&document_id);
                });
                self.word_to_document_freqs
                    .extend(affected.into_iter().filter(|(_, postings)| !postings.is_empty()));
            }
        }
        tracing::debug!(document_id, terms = word_freqs.len(), ?policy, "document removed");
    }

    /// Term frequencies of one document; empty when the id is absent.
    pub fn word_frequencies(&self, document_id: DocId) -> &WordFrequencies {
        self.document_to_word_freqs.get(&document_id).unwrap_or(&EMPTY_FREQUENCIES)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn document_data(&self, document_id: DocId) -> Option<DocumentData> {
        self.documents.get(&document_id).copied()
    }

    /// Posting list of a term together with the interned term itself.
    pub fn postings(&self, word: &str) -> Option<(&Term, &Postings)> {
        self.word_to_document_freqs.get_key_value(word).filter(|(_, postings)| !postings.is_empty())
    }

    /// Whether `document_id` appears in the posting list of `word`.
    pub fn contains(&self, word: &str, document_id: DocId) -> bool {
        self.postings(word).is_some_and(|(_, postings)| postings.contains_key(&document_id))
    }

    /// `ln(N / df)`; `None` when no document contains the term.
    pub fn inverse_document_freq(&self, word: &str) -> Option<f64> {
        self.postings(word)
            .map(|(_, postings)| (self.document_count() as f64 / postings.len() as f64).ln())
    }

    /// Live document ids in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, DocId> {
        self.document_ids.iter()
    }

    /// Number of distinct terms with at least one posting.
    pub fn term_count(&self) -> usize {
        self.word_to_document_freqs.len()
    }

    fn split_into_words_no_stop<'t>(&self, text: &'t str) -> Result<Vec<&'t str>> {
        let mut words = Vec::new();
        for word in split_into_words(text) {
            if !is_valid_word(word) {
                return Err(SearchError::InvalidTerm(word.to_string()));
            }
            if !self.is_stop_word(word) {
                words.push(word);
            }
        }
        Ok(words)
    }
}

impl<'a> IntoIterator for &'a IndexStore {
    type Item = &'a DocId;
    type IntoIter = std::slice::Iter<'a, DocId>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Mean of the ratings truncated toward zero, 0 for no ratings.
fn compute_average_rating(ratings: &[i32]) -> i32 {
    if ratings.is_empty() {
        return 0;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    (sum / ratings.len() as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> IndexStore {
        let mut store = IndexStore::from_stop_words_text("the and").unwrap();
        store.add_document(0, "the cat sat", DocumentStatus::Actual, &[1]).unwrap();
        store.add_document(1, "cat and dog", DocumentStatus::Actual, &[1]).unwrap();
        store.add_document(2, "dog dog dog", DocumentStatus::Banned, &[1]).unwrap();
        store
    }

    #[test]
    fn average_rating_truncates_toward_zero() {
        assert_eq!(compute_average_rating(&[]), 0);
        assert_eq!(compute_average_rating(&[1, 2]), 1);
        assert_eq!(compute_average_rating(&[-1, -2]), -1);
        assert_eq!(compute_average_rating(&[7, 2, 5]), 4);
        assert_eq!(compute_average_rating(&[i32::MAX, i32::MAX]), i32::MAX);
    }

    #[test]
    fn frequencies_skip_stop_words() {
        let store = store();
        let freqs = store.word_frequencies(0);
        assert_eq!(freqs.len(), 2);
        assert_eq!(freqs["cat"], 0.5);
        assert_eq!(freqs["sat"], 0.5);
        assert_eq!(store.word_frequencies(2)["dog"], 1.0);
        assert!(store.word_frequencies(99).is_empty());
    }

    #[test]
    fn terms_are_shared_between_indices() {
        let store = store();
        let (term, postings) = store.postings("cat").unwrap();
        assert_eq!(postings.len(), 2);
        let (forward_term, _) = store.word_frequencies(1).get_key_value("cat").unwrap();
        assert!(Arc::ptr_eq(term, forward_term));
    }

    #[test]
    fn invalid_input_leaves_store_untouched() {
        let mut store = store();
        assert_eq!(store.add_document(-1, "cat", DocumentStatus::Actual, &[]), Err(SearchError::InvalidId(-1)));
        assert_eq!(store.add_document(1, "fox", DocumentStatus::Actual, &[]), Err(SearchError::InvalidId(1)));
        assert!(matches!(
            store.add_document(3, "fox bad\u{1}word", DocumentStatus::Actual, &[]),
            Err(SearchError::InvalidTerm(_))
        ));
        assert_eq!(store.document_count(), 3);
        assert!(store.postings("fox").is_none());
        assert_eq!(store.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn invalid_stop_words_are_rejected() {
        assert!(matches!(IndexStore::new(["ok", "b\u{7}ad"]), Err(SearchError::InvalidTerm(_))));
        let store = IndexStore::new(["", "in", "in"]).unwrap();
        assert!(store.is_stop_word("in"));
        assert!(!store.is_stop_word(""));
    }

    #[test]
    fn stop_word_only_document_has_no_postings() {
        let mut store = store();
        store.add_document(7, "the and the", DocumentStatus::Actual, &[3]).unwrap();
        assert_eq!(store.document_count(), 4);
        assert!(store.word_frequencies(7).is_empty());
        assert_eq!(store.document_data(7), Some(DocumentData { rating: 3, status: DocumentStatus::Actual }));
        store.remove_document(ExecutionPolicy::Sequential, 7);
        assert_eq!(store.document_count(), 3);
    }

    #[test]
    fn removal_prunes_postings() {
        for policy in [ExecutionPolicy::Sequential, ExecutionPolicy::Parallel] {
            let mut store = store();
            store.remove_document(policy, 0);
            assert_eq!(store.document_count(), 2);
            assert!(store.postings("sat").is_none());
            assert!(!store.contains("cat", 0));
            assert!(store.contains("cat", 1));
            assert_eq!(store.term_count(), 2);
            assert_eq!(store.inverse_document_freq("cat"), Some((2.0f64).ln()));

            store.remove_document(policy, 0);
            assert_eq!(store.document_count(), 2);
        }
    }

    #[test]
    fn parallel_removal_only_touches_own_terms() {
        let mut sequential = store();
        let mut parallel = store();
        for store in [&mut sequential, &mut parallel] {
            store.add_document(3, "owl cat", DocumentStatus::Actual, &[2]).unwrap();
        }
        sequential.remove_document(ExecutionPolicy::Sequential, 1);
        parallel.remove_document(ExecutionPolicy::Parallel, 1);

        assert_eq!(parallel.term_count(), sequential.term_count());
        for word in ["cat", "sat", "dog", "owl"] {
            assert_eq!(parallel.postings(word), sequential.postings(word), "{word}");
        }
        assert!(parallel.contains("dog", 2));
        assert!(parallel.contains("owl", 3));
        assert!(!parallel.contains("cat", 1));
        assert_eq!(parallel.postings("cat").map(|(_, postings)| postings.len()), Some(2));
    }
}
