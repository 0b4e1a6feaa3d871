use crate::concurrent_map::{ConcurrentMap, DEFAULT_BUCKET_COUNT};
use crate::error::Result;
use crate::index::{DocumentData, IndexStore, WordFrequencies};
use crate::query::{parse_query, Query};
use crate::{DocId, Document, DocumentStatus, ExecutionPolicy, MAX_RESULT_DOCUMENT_COUNT, RELEVANCE_EPSILON};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// TF-IDF search over an in-memory [`IndexStore`].
///
/// Read-only calls may run concurrently from many threads. Mutations take
/// `&mut self`, so the borrow checker enforces the single-writer discipline.
#[derive(Debug, Default)]
pub struct SearchEngine {
    index: IndexStore,
}

impl SearchEngine {
    pub fn new<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self { index: IndexStore::new(stop_words)? })
    }

    pub fn from_stop_words_text(text: &str) -> Result<Self> {
        Ok(Self { index: IndexStore::from_stop_words_text(text)? })
    }

    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    pub fn add_document(&mut self, document_id: DocId, text: &str, status: DocumentStatus, ratings: &[i32]) -> Result<()> {
        self.index.add_document(document_id, text, status, ratings)
    }

    pub fn remove_document(&mut self, document_id: DocId) {
        self.remove_document_with(ExecutionPolicy::Sequential, document_id);
    }

    pub fn remove_document_with(&mut self, policy: ExecutionPolicy, document_id: DocId) {
        self.index.remove_document(policy, document_id);
    }

    pub fn word_frequencies(&self, document_id: DocId) -> &WordFrequencies {
        self.index.word_frequencies(document_id)
    }

    pub fn document_count(&self) -> usize {
        self.index.document_count()
    }

    /// Live document ids in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, DocId> {
        self.index.iter()
    }

    /// Top documents with [`DocumentStatus::Actual`].
    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_by_status(raw_query, DocumentStatus::Actual)
    }

    pub fn find_top_documents_by_status(&self, raw_query: &str, status: DocumentStatus) -> Result<Vec<Document>> {
        self.find_top_documents_with(ExecutionPolicy::Sequential, raw_query, status_filter(status))
    }

    pub fn find_top_documents_by<P>(&self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        self.find_top_documents_with(ExecutionPolicy::Sequential, raw_query, predicate)
    }

    pub fn find_top_documents_with_status(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_with(policy, raw_query, status_filter(status))
    }

    /// Rank the documents accepted by `predicate` against `raw_query`.
    ///
    /// Results are ordered by relevance, then by rating when relevances are
    /// within [`RELEVANCE_EPSILON`], and capped at [`MAX_RESULT_DOCUMENT_COUNT`].
    /// Both policies return the same ranking.
    pub fn find_top_documents_with<P>(&self, policy: ExecutionPolicy, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let query = parse_query(&self.index, raw_query, true)?;
        let relevance = match policy {
            ExecutionPolicy::Sequential => self.find_all_documents_seq(&query, &predicate),
            ExecutionPolicy::Parallel => self.find_all_documents_par(&query, &predicate),
        };

        let mut matched: Vec<Document> = relevance
            .into_iter()
            .filter_map(|(id, relevance)| {
                self.index.document_data(id).map(|data| Document::new(id, relevance, data.rating))
            })
            .collect();
        match policy {
            ExecutionPolicy::Sequential => matched.sort_by(by_relevance),
            ExecutionPolicy::Parallel => matched.par_sort_by(by_relevance),
        }
        order_ties_by_rating(&mut matched);
        matched.truncate(MAX_RESULT_DOCUMENT_COUNT);

        tracing::trace!(query = raw_query, ?policy, hits = matched.len(), "find_top_documents");
        Ok(matched)
    }

    fn find_all_documents_seq<P>(&self, query: &Query<'_>, predicate: &P) -> BTreeMap<DocId, f64>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool,
    {
        let mut document_to_relevance = BTreeMap::new();
        for &word in &query.plus_words {
            self.for_each_candidate(word, predicate, |id, score| {
                *document_to_relevance.entry(id).or_insert(0.0) += score;
            });
        }
        for &word in &query.minus_words {
            if let Some((_, postings)) = self.index.postings(word) {
                for id in postings.keys() {
                    document_to_relevance.remove(id);
                }
            }
        }
        document_to_relevance
    }

    fn find_all_documents_par<P>(&self, query: &Query<'_>, predicate: &P) -> BTreeMap<DocId, f64>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let document_to_relevance: ConcurrentMap<DocId, f64> = ConcurrentMap::new(DEFAULT_BUCKET_COUNT);
        query.plus_words.par_iter().for_each(|&word| {
            self.for_each_candidate(word, predicate, |id, score| {
                *document_to_relevance.access(id) += score;
            });
        });
        query.minus_words.par_iter().for_each(|&word| {
            if let Some((_, postings)) = self.index.postings(word) {
                for &id in postings.keys() {
                    document_to_relevance.erase(id);
                }
            }
        });
        document_to_relevance.build_ordinary_map()
    }

    /// Feed `tf * idf` of `word` for every accepted document into `accumulate`.
    fn for_each_candidate<P, F>(&self, word: &str, predicate: &P, mut accumulate: F)
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool,
        F: FnMut(DocId, f64),
    {
        let (Some((_, postings)), Some(idf)) = (self.index.postings(word), self.index.inverse_document_freq(word)) else {
            return;
        };
        for (&id, &tf) in postings {
            let Some(DocumentData { rating, status }) = self.index.document_data(id) else {
                continue;
            };
            if predicate(id, status, rating) {
                accumulate(id, tf * idf);
            }
        }
    }
}

impl<'a> IntoIterator for &'a SearchEngine {
    type Item = &'a DocId;
    type IntoIter = std::slice::Iter<'a, DocId>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn status_filter(status: DocumentStatus) -> impl Fn(DocId, DocumentStatus, i32) -> bool + Sync {
    move |_, document_status, _| document_status == status
}

fn by_relevance(lhs: &Document, rhs: &Document) -> Ordering {
    rhs.relevance.total_cmp(&lhs.relevance).then_with(|| lhs.id.cmp(&rhs.id))
}

/// Swap neighbours within `RELEVANCE_EPSILON` of each other until every such
/// pair is ordered by descending rating, then by id.
///
/// Expects `documents` sorted by relevance. Entries further apart than the
/// epsilon are never swapped, so they keep their relevance order. Every swap
/// removes one inversion under the rating order, which bounds the passes.
fn order_ties_by_rating(documents: &mut [Document]) {
    let outranks = |lhs: &Document, rhs: &Document| {
        (lhs.relevance - rhs.relevance).abs() < RELEVANCE_EPSILON
            && rhs.rating.cmp(&lhs.rating).then_with(|| lhs.id.cmp(&rhs.id)) == Ordering::Less
    };
    let mut swapped = true;
    while swapped {
        swapped = false;
        for i in 1..documents.len() {
            let mut j = i;
            while j > 0 && outranks(&documents[j], &documents[j - 1]) {
                documents.swap(j, j - 1);
                swapped = true;
                j -= 1;
            }
        }
    }
}
