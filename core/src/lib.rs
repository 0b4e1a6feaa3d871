use serde::{Deserialize, Serialize};
use std::fmt;

pub mod concurrent_map;
pub mod engine;
pub mod error;
pub mod index;
pub mod matcher;
pub mod paginator;
pub mod process_queries;
pub mod query;
pub mod request_queue;
pub mod tokenizer;

pub use concurrent_map::ConcurrentMap;
pub use engine::SearchEngine;
pub use error::{Result, SearchError};
pub use index::IndexStore;
pub use paginator::{paginate, Paginator};
pub use process_queries::{process_queries, process_queries_joined};
pub use request_queue::RequestQueue;

pub type DocId = i32;

/// Upper bound on the number of documents returned by a single query.
pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;
/// Relevances closer than this compare equal and are ordered by rating.
pub const RELEVANCE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    #[default]
    Actual,
    Irrelevant,
    Banned,
    Removed,
}

/// Scheduling strategy for the operations that have a data-parallel variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPolicy {
    #[default]
    Sequential,
    Parallel,
}

/// A ranked query hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub relevance: f64,
    pub rating: i32,
}

impl Document {
    pub fn new(id: DocId, relevance: f64, rating: i32) -> Self {
        Self { id, relevance, rating }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ document_id = {}, relevance = {}, rating = {} }}",
            self.id, self.relevance, self.rating
        )
    }
}
