//! In-memory retrieval engine: text normalization, an inverted index with boolean
//! AND/OR/NOT queries, a TF-IDF vector space model with cosine ranking, and
//! retrieval-quality metrics.
//!
//! ```
//! use search_core::{Engine, Model, Normalizer, RawDocument, SearchOptions};
//!
//! let engine = Engine::new(
//!     vec![
//!         RawDocument::new("d1", "universitas negeri semarang"),
//!         RawDocument::new("d2", "universitas dian nuswantoro"),
//!         RawDocument::new("d3", "fakultas teknik"),
//!     ],
//!     Normalizer::default(),
//! )?;
//! let hits = engine.search("universitas AND semarang", Model::Boolean, SearchOptions::default())?;
//! assert_eq!(hits[0].id, "d1");
//! # Ok::<(), search_core::Error>(())
//! ```

pub mod boolean;
pub mod corpus;
pub mod engine;
mod error;
pub mod eval;
pub mod index;
pub mod persist;
pub mod snippet;
pub mod tokenizer;
pub mod vsm;

/// Position of a document in its corpus.
pub type DocId = u32;
pub type TermId = u32;

pub use corpus::{load_corpus, Corpus, Document, RawDocument};
pub use engine::{evaluate_results, search, Engine, Hit, Model, SearchOptions, Snapshot};
pub use error::{Error, Result};
pub use eval::{Metrics, MetricsSummary, SetMetrics, SetMetricsSummary};
pub use index::{InvertedIndex, Posting};
pub use tokenizer::{normalize, Normalizer, NormalizerConfig, StemmerKind, Stemmer, StopwordList};
pub use vsm::{VectorStore, Weighting};

/// Build the inverted index for `corpus`.
pub fn build_index(corpus: &Corpus) -> Result<InvertedIndex> {
    InvertedIndex::build(corpus)
}

/// Build TF-IDF document vectors for both weighting schemes.
pub fn build_vectors(corpus: &Corpus, index: &InvertedIndex) -> Result<VectorStore> {
    VectorStore::build(corpus, index)
}
