use crate::engine::SearchEngine;
use crate::error::{Result, SearchError};
use crate::query::parse_query;
use crate::{DocId, DocumentStatus, ExecutionPolicy};
use rayon::prelude::*;

/// Query words found in a document, borrowed from the index, plus the document's status.
pub type MatchResult<'a> = (Vec<&'a str>, DocumentStatus);

impl SearchEngine {
    pub fn match_document(&self, raw_query: &str, document_id: DocId) -> Result<MatchResult<'_>> {
        self.match_document_with(ExecutionPolicy::Sequential, raw_query, document_id)
    }

    /// Report which plus-words of `raw_query` occur in the document.
    ///
    /// The word list is empty when any minus-word occurs in the document.
    /// Otherwise it is sorted and duplicate-free whichever policy is used.
    pub fn match_document_with(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        document_id: DocId,
    ) -> Result<MatchResult<'_>> {
        let index = self.index();
        let status = index
            .document_data(document_id)
            .map(|data| data.status)
            .ok_or(SearchError::UnknownDocument(document_id))?;

        let matched = match policy {
            ExecutionPolicy::Sequential => {
                let query = parse_query(index, raw_query, true)?;
                if query.minus_words.iter().any(|word| index.contains(word, document_id)) {
                    return Ok((Vec::new(), status));
                }
                query
                    .plus_words
                    .iter()
                    .filter_map(|word| index.postings(word))
                    .filter(|(_, postings)| postings.contains_key(&document_id))
                    .map(|(term, _)| &**term)
                    .collect::<Vec<&str>>()
            }
            ExecutionPolicy::Parallel => {
                let query = parse_query(index, raw_query, false)?;
                if query.minus_words.par_iter().any(|word| index.contains(word, document_id)) {
                    return Ok((Vec::new(), status));
                }
                let mut matched: Vec<&str> = query
                    .plus_words
                    .par_iter()
                    .filter_map(|word| index.postings(word))
                    .filter(|(_, postings)| postings.contains_key(&document_id))
                    .map(|(term, _)| &**term)
                    .collect();
                matched.par_sort_unstable();
                matched.dedup();
                matched
            }
        };
        Ok((matched, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SearchEngine {
        let mut engine = SearchEngine::from_stop_words_text("and in").unwrap();
        engine.add_document(4, "white cat and fancy collar", DocumentStatus::Actual, &[8, -3]).unwrap();
        engine.add_document(7, "fluffy cat fluffy tail", DocumentStatus::Irrelevant, &[7, 2, 7]).unwrap();
        engine
    }

    #[test]
    fn reports_matching_plus_words() {
        let engine = engine();
        for policy in [ExecutionPolicy::Sequential, ExecutionPolicy::Parallel] {
            let (words, status) = engine.match_document_with(policy, "fluffy tail cat dog tail", 7).unwrap();
            assert_eq!(words, vec!["cat", "fluffy", "tail"]);
            assert_eq!(status, DocumentStatus::Irrelevant);
        }
    }

    #[test]
    fn minus_word_empties_the_match() {
        let engine = engine();
        for policy in [ExecutionPolicy::Sequential, ExecutionPolicy::Parallel] {
            let (words, status) = engine.match_document_with(policy, "white cat -collar", 4).unwrap();
            assert!(words.is_empty());
            assert_eq!(status, DocumentStatus::Actual);

            let (words, _) = engine.match_document_with(policy, "white cat -collar", 7).unwrap();
            assert_eq!(words, vec!["cat"]);
        }
    }

    #[test]
    fn unknown_document_and_bad_query() {
        let engine = engine();
        assert_eq!(engine.match_document("cat", 5), Err(SearchError::UnknownDocument(5)));
        assert!(matches!(engine.match_document("cat --x", 4), Err(SearchError::InvalidQuery(_))));
    }

    #[test]
    fn stop_words_never_match() {
        let engine = engine();
        let (words, _) = engine.match_document_with(ExecutionPolicy::Parallel, "and in cat", 4).unwrap();
        assert_eq!(words, vec!["cat"]);
        assert!(words.iter().all(|word| !word.is_empty()));
    }
}
