/// Errors surfaced by corpus loading, index construction, and query parsing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Two documents in one corpus share an identifier.
    #[error("duplicate document id `{0}`")]
    DuplicateId(String),
    /// Boolean query could not be parsed. `position` is the 1-based word offset.
    #[error("query syntax error at word {position}: {message}")]
    QuerySyntax { position: usize, message: String },
    /// Model selector did not name a supported retrieval model.
    #[error("unknown model `{0}` (expected boolean, vsm-tfidf or vsm-sublinear)")]
    UnknownModel(String),
    /// Index or vectors were built from a corpus with no documents.
    #[error("corpus contains no documents")]
    EmptyCorpus,
}

pub type Result<T> = std::result::Result<T, Error>;
