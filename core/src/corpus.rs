use crate::tokenizer::Normalizer;
use crate::{DocId, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A document as supplied by a loader, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub body: String,
}

impl RawDocument {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self { id: id.into(), title: None, body: body.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: Option<String>,
    pub text: String,
    /// Normalized terms in text order, duplicates kept.
    pub terms: Vec<String>,
}

/// Ordered, read-only collection of documents. A document's [`DocId`] is its
/// position in load order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: Vec<Document>,
    by_id: HashMap<String, DocId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthStats {
    /// (document id, term count) in corpus order.
    pub lengths: Vec<(String, usize)>,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
}

impl Corpus {
    /// Normalize each raw document once and collect them.
    pub fn load<I>(raw: I, normalizer: &Normalizer) -> Result<Self>
    where
        I: IntoIterator<Item = RawDocument>,
    {
        let docs = raw.into_iter().map(|r| Document {
            terms: normalizer.normalize(&r.body),
            id: r.id,
            title: r.title,
            text: r.body,
        });
        Self::from_documents(docs)
    }

    /// Assemble a corpus from already normalized documents (e.g. a cache).
    pub fn from_documents<I>(docs: I) -> Result<Self>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut corpus = Corpus::default();
        for doc in docs {
            let doc_id = corpus.docs.len() as DocId;
            if corpus.by_id.insert(doc.id.clone(), doc_id).is_some() {
                return Err(Error::DuplicateId(doc.id));
            }
            corpus.docs.push(doc);
        }
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn get(&self, doc_id: DocId) -> Option<&Document> {
        self.docs.get(doc_id as usize)
    }

    pub fn doc_id(&self, id: &str) -> Option<DocId> {
        self.by_id.get(id).copied()
    }

    pub fn by_external_id(&self, id: &str) -> Option<&Document> {
        self.doc_id(id).and_then(|d| self.get(d))
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, &Document)> {
        self.docs.iter().enumerate().map(|(i, d)| (i as DocId, d))
    }

    pub fn vocabulary_len(&self) -> usize {
        self.docs
            .iter()
            .flat_map(|d| d.terms.iter().map(String::as_str))
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn length_stats(&self) -> LengthStats {
        let lengths: Vec<(String, usize)> =
            self.docs.iter().map(|d| (d.id.clone(), d.terms.len())).collect();
        let min = lengths.iter().map(|(_, n)| *n).min().unwrap_or(0);
        let max = lengths.iter().map(|(_, n)| *n).max().unwrap_or(0);
        let total: usize = lengths.iter().map(|(_, n)| *n).sum();
        let mean = if lengths.is_empty() { 0.0 } else { total as f64 / lengths.len() as f64 };
        LengthStats { lengths, min, max, mean }
    }
}

/// Normalize `(id, text)` pairs into a corpus with the given normalizer.
pub fn load_corpus<I, S, T>(docs: I, normalizer: &Normalizer) -> Result<Corpus>
where
    I: IntoIterator<Item = (S, T)>,
    S: Into<String>,
    T: Into<String>,
{
    Corpus::load(docs.into_iter().map(|(id, text)| RawDocument::new(id, text)), normalizer)
}
