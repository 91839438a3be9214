use crate::boolean::BooleanQuery;
use crate::corpus::{Corpus, RawDocument};
use crate::eval::{self, Metrics};
use crate::index::InvertedIndex;
use crate::tokenizer::Normalizer;
use crate::vsm::{self, VectorStore, Weighting};
use crate::{DocId, Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Retrieval model selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Model {
    Boolean,
    VsmTfidf,
    VsmSublinear,
}

impl Model {
    pub const ALL: [Model; 3] = [Model::Boolean, Model::VsmTfidf, Model::VsmSublinear];

    pub fn as_str(self) -> &'static str {
        match self {
            Model::Boolean => "boolean",
            Model::VsmTfidf => "vsm-tfidf",
            Model::VsmSublinear => "vsm-sublinear",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Ok(Model::Boolean),
            "vsm-tfidf" | "tfidf" | "vsm" => Ok(Model::VsmTfidf),
            "vsm-sublinear" | "sublinear" => Ok(Model::VsmSublinear),
            _ => Err(Error::UnknownModel(s.to_string())),
        }
    }
}

/// One search result. Boolean hits score 1.0; VSM hits carry the cosine similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub doc_id: DocId,
    pub id: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Truncate the result list; `None` returns everything.
    pub top_k: Option<usize>,
    /// VSM only: keep documents with similarity 0 at the tail of the ranking.
    pub include_zeros: bool,
}

/// Dispatch `query` to the boolean evaluator or the VSM ranker.
pub fn search(
    query: &str,
    model: Model,
    index: &InvertedIndex,
    vectors: &VectorStore,
    corpus: &Corpus,
    normalizer: &Normalizer,
    options: SearchOptions,
) -> Result<Vec<Hit>> {
    let hit = |doc_id: DocId, score: f32| {
        corpus.get(doc_id).map(|d| Hit { doc_id, id: d.id.clone(), score })
    };
    let mut hits: Vec<Hit> = match model {
        Model::Boolean => {
            let docs = BooleanQuery::parse(query, normalizer)?.evaluate(index);
            let mut hits: Vec<Hit> = docs.into_iter().filter_map(|d| hit(d, 1.0)).collect();
            hits.sort_by(|a, b| a.id.cmp(&b.id));
            hits
        }
        Model::VsmTfidf | Model::VsmSublinear => {
            let weighting = if model == Model::VsmTfidf { Weighting::Standard } else { Weighting::Sublinear };
            let terms = normalizer.normalize(query);
            vsm::rank(&terms, vectors, index, corpus, weighting, options.include_zeros)
                .into_iter()
                .filter_map(|(d, s)| hit(d, s))
                .collect()
        }
    };
    if let Some(k) = options.top_k {
        hits.truncate(k);
    }
    tracing::debug!(query, %model, hits = hits.len(), "search");
    Ok(hits)
}

/// Metrics for a result list against the relevant document ids.
pub fn evaluate_results(results: &[Hit], relevant: &HashSet<String>, k: usize) -> Metrics {
    let ranking: Vec<&str> = results.iter().map(|h| h.id.as_str()).collect();
    eval::evaluate(&ranking, relevant, k)
}

/// A fully built, immutable corpus + index + vectors, together with the normalizer
/// the corpus was built with. Queries against a snapshot go through that normalizer.
#[derive(Debug)]
pub struct Snapshot {
    pub corpus: Corpus,
    pub index: InvertedIndex,
    pub vectors: VectorStore,
    pub normalizer: Normalizer,
}

impl Snapshot {
    pub fn build(corpus: Corpus, normalizer: Normalizer) -> Result<Self> {
        let index = InvertedIndex::build(&corpus)?;
        let vectors = VectorStore::build(&corpus, &index)?;
        Ok(Self { corpus, index, vectors, normalizer })
    }

    pub fn search(&self, query: &str, model: Model, options: SearchOptions) -> Result<Vec<Hit>> {
        search(query, model, &self.index, &self.vectors, &self.corpus, &self.normalizer, options)
    }
}

/// Query facade. Readers take an `Arc` of the current snapshot; [`Engine::reload`]
/// builds a replacement off to the side and swaps it in.
pub struct Engine {
    state: RwLock<Arc<Snapshot>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snap = self.snapshot();
        f.debug_struct("Engine")
            .field("normalizer", &snap.normalizer)
            .field("num_docs", &snap.corpus.len())
            .field("num_terms", &snap.index.vocabulary_len())
            .finish()
    }
}

impl Engine {
    pub fn new<I>(docs: I, normalizer: Normalizer) -> Result<Self>
    where
        I: IntoIterator<Item = RawDocument>,
    {
        let corpus = Corpus::load(docs, &normalizer)?;
        Self::from_corpus(corpus, normalizer)
    }

    /// Build from an already normalized corpus. `normalizer` must be the one the
    /// corpus was normalized with, since queries go through it too.
    pub fn from_corpus(corpus: Corpus, normalizer: Normalizer) -> Result<Self> {
        let snapshot = Snapshot::build(corpus, normalizer)?;
        Ok(Self { state: RwLock::new(Arc::new(snapshot)) })
    }

    /// Normalizer of the current snapshot.
    pub fn normalizer(&self) -> Normalizer {
        self.snapshot().normalizer.clone()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.read().clone()
    }

    /// Rebuild from new documents with the current normalizer. On failure the current
    /// snapshot stays live.
    pub fn reload<I>(&self, docs: I) -> Result<usize>
    where
        I: IntoIterator<Item = RawDocument>,
    {
        let normalizer = self.normalizer();
        let corpus = Corpus::load(docs, &normalizer)?;
        self.replace(corpus, normalizer)
    }

    /// Swap in `corpus` and the normalizer it was built with, in one step.
    pub fn replace(&self, corpus: Corpus, normalizer: Normalizer) -> Result<usize> {
        let snapshot = Arc::new(Snapshot::build(corpus, normalizer)?);
        let num_docs = snapshot.corpus.len();
        *self.state.write() = snapshot;
        tracing::info!(num_docs, "swapped in rebuilt index");
        Ok(num_docs)
    }

    pub fn search(&self, query: &str, model: Model, options: SearchOptions) -> Result<Vec<Hit>> {
        self.snapshot().search(query, model, options)
    }

    pub fn evaluate_results(&self, results: &[Hit], relevant: &HashSet<String>, k: usize) -> Metrics {
        evaluate_results(results, relevant, k)
    }

    /// Highest-weighted terms of a document, or `None` for an unknown id.
    pub fn top_terms(&self, id: &str, weighting: Weighting, n: usize) -> Option<Vec<(String, f32)>> {
        let snap = self.snapshot();
        let doc_id = snap.corpus.doc_id(id)?;
        let vector = snap.vectors.document(doc_id, weighting)?;
        Some(vsm::top_terms(vector, &snap.index, n))
    }
}
