use crate::engine::SearchEngine;
use crate::error::Result;
use crate::{DocId, Document, DocumentStatus};
use std::collections::VecDeque;

/// Number of most recent requests kept in the history window.
pub const REQUEST_WINDOW: usize = 1440;

#[derive(Debug, Clone, Copy)]
struct RequestRecord {
    empty: bool,
}

/// Forwards queries to an engine and tracks how many of the last
/// [`REQUEST_WINDOW`] requests returned nothing.
pub struct RequestQueue<'a> {
    engine: &'a SearchEngine,
    requests: VecDeque<RequestRecord>,
    no_result_requests: usize,
}

impl<'a> RequestQueue<'a> {
    pub fn new(engine: &'a SearchEngine) -> Self {
        Self { engine, requests: VecDeque::with_capacity(REQUEST_WINDOW + 1), no_result_requests: 0 }
    }

    pub fn add_find_request(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        self.add_find_request_by_status(raw_query, DocumentStatus::Actual)
    }

    pub fn add_find_request_by_status(&mut self, raw_query: &str, status: DocumentStatus) -> Result<Vec<Document>> {
        self.add_find_request_by(raw_query, move |_, document_status, _| document_status == status)
    }

    /// Failed queries propagate their error and are not recorded.
    pub fn add_find_request_by<P>(&mut self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let result = self.engine.find_top_documents_by(raw_query, predicate)?;
        self.record(result.is_empty());
        Ok(result)
    }

    pub fn no_result_requests(&self) -> usize {
        self.no_result_requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    fn record(&mut self, empty: bool) {
        self.requests.push_back(RequestRecord { empty });
        if empty {
            self.no_result_requests += 1;
        }
        if self.requests.len() > REQUEST_WINDOW {
            if let Some(expired) = self.requests.pop_front() {
                if expired.empty {
                    self.no_result_requests -= 1;
                }
            }
        }
    }
}
