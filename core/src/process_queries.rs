use crate::engine::SearchEngine;
use crate::error::Result;
use crate::Document;
use rayon::prelude::*;

/// Run every query in parallel; `result[i]` answers `queries[i]`.
///
/// The first failing query, in input order, fails the whole batch.
pub fn process_queries<S>(engine: &SearchEngine, queries: &[S]) -> Result<Vec<Vec<Document>>>
where
    S: AsRef<str> + Sync,
{
    queries
        .par_iter()
        .map(|query| engine.find_top_documents(query.as_ref()))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

/// Like [`process_queries`], flattened in query order.
pub fn process_queries_joined<S>(engine: &SearchEngine, queries: &[S]) -> Result<Vec<Document>>
where
    S: AsRef<str> + Sync,
{
    Ok(process_queries(engine, queries)?.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentStatus, SearchError};

    fn engine() -> SearchEngine {
        let mut engine = SearchEngine::from_stop_words_text("and with").unwrap();
        let texts = [
            "funny pet and nasty rat",
            "funny pet with curly hair",
            "funny pet and not very nasty rat",
            "pet with rat and rat and rat",
            "nasty rat with curly hair",
        ];
        for (id, text) in texts.iter().enumerate() {
            engine.add_document(id as i32 + 1, text, DocumentStatus::Actual, &[1, 2]).unwrap();
        }
        engine
    }

    #[test]
    fn results_follow_query_order() {
        let engine = engine();
        let queries = ["nasty rat -not", "not very funny nasty pet", "curly hair"];
        let results = process_queries(&engine, &queries).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 5, 2]);
        for (query, documents) in queries.iter().zip(&results) {
            assert_eq!(documents, &engine.find_top_documents(query).unwrap());
        }
    }

    #[test]
    fn joined_flattens_in_order() {
        let engine = engine();
        let queries = vec!["nasty rat -not".to_string(), "curly hair".to_string()];
        let joined = process_queries_joined(&engine, &queries).unwrap();
        let ids: Vec<_> = joined.iter().map(|doc| doc.id).collect();
        assert_eq!(ids.len(), 5);
        assert_eq!(&ids[3..], &[2, 5][..]);
    }

    #[test]
    fn first_error_wins() {
        let engine = engine();
        let queries = ["rat", "--x", "-"];
        assert_eq!(process_queries(&engine, &queries), Err(SearchError::InvalidQuery("--x".into())));
        assert!(process_queries(&engine, &Vec::<String>::new()).unwrap().is_empty());
    }
}
