use crate::DocId;
use thiserror::Error;

pub type Result<T, E = SearchError> = std::result::Result<T, E>;

/// Failures surfaced by the index and query operations.
///
/// Every variant is raised before any index mutation takes place, so a failed
/// call leaves the engine exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Negative id, or an id that is already present.
    #[error("document id {0} is negative or already present")]
    InvalidId(DocId),

    /// A word contains a control character.
    #[error("word {0:?} contains an invalid character")]
    InvalidTerm(String),

    /// Malformed minus-word: a bare `-`, a `--` prefix or nothing after the `-`.
    #[error("invalid minus-word {0:?}")]
    InvalidQuery(String),

    #[error("document {0} is not in the index")]
    UnknownDocument(DocId),
}
