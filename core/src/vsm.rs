//! Vector-space model: TF-IDF document vectors and cosine ranking.
//!
//! With `N` documents, `df` the document frequency of a term and `tf` its raw count:
//!
//! - [`Weighting::Standard`]: `tf * ln(N / df)`
//! - [`Weighting::Sublinear`]: `(1 + ln tf) * ln(N / df)`, 0 when `tf == 0`
//!
//! Terms present in every document get idf 0 and therefore weight 0. Zero weights are
//! not stored.

use crate::corpus::Corpus;
use crate::index::InvertedIndex;
use crate::{DocId, Error, Result, TermId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
    Standard,
    Sublinear,
}

impl Weighting {
    pub fn tf(self, tf_raw: u32) -> f32 {
        if tf_raw == 0 {
            return 0.0;
        }
        match self {
            Weighting::Standard => tf_raw as f32,
            Weighting::Sublinear => 1.0 + (tf_raw as f32).ln(),
        }
    }
}

/// `ln(N / df)`; 0 for terms no document contains.
pub fn idf(num_docs: u32, df: u32) -> f32 {
    if df == 0 || num_docs == 0 {
        return 0.0;
    }
    ((num_docs as f32) / (df as f32)).ln().max(0.0)
}

/// Sum in f64 over ascending values, so the result does not depend on which term
/// ids the values sit on.
fn ordered_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    values.into_iter().sum()
}

/// Sparse weight vector over term ids, sorted by term id, with its Euclidean norm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(TermId, f32)>,
    norm: f64,
}

impl SparseVector {
    pub fn from_weights<I>(weights: I) -> Self
    where
        I: IntoIterator<Item = (TermId, f32)>,
    {
        let mut entries: Vec<(TermId, f32)> = weights.into_iter().filter(|(_, w)| *w > 0.0).collect();
        entries.sort_by_key(|(tid, _)| *tid);
        let norm = ordered_sum(entries.iter().map(|&(_, w)| f64::from(w) * f64::from(w)).collect()).sqrt();
        Self { entries, norm }
    }

    pub fn norm(&self) -> f32 {
        self.norm as f32
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(TermId, f32)] {
        &self.entries
    }

    pub fn get(&self, term_id: TermId) -> f32 {
        self.entries
            .binary_search_by_key(&term_id, |(tid, _)| *tid)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        self.dot_f64(other) as f32
    }

    fn dot_f64(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut products = Vec::new();
        while i < self.entries.len() && j < other.entries.len() {
            let (a, wa) = self.entries[i];
            let (b, wb) = other.entries[j];
            match a.cmp(&b) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    products.push(f64::from(wa) * f64::from(wb));
                    i += 1;
                    j += 1;
                }
            }
        }
        ordered_sum(products)
    }
}

/// Cosine similarity in `[0, 1]`; 0 if either vector has zero norm.
pub fn cosine(a: &SparseVector, b: &SparseVector) -> f32 {
    if a.norm == 0.0 || b.norm == 0.0 {
        return 0.0;
    }
    ((a.dot_f64(b) / (a.norm * b.norm)) as f32).clamp(0.0, 1.0)
}

/// Document vectors for both weighting schemes, indexed by [`DocId`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorStore {
    standard: Vec<SparseVector>,
    sublinear: Vec<SparseVector>,
}

impl VectorStore {
    pub fn build(corpus: &Corpus, index: &InvertedIndex) -> Result<Self> {
        if corpus.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let n = index.num_docs();
        let mut raw: Vec<Vec<(TermId, u32, f32)>> = vec![Vec::new(); corpus.len()];
        for tid in 0..index.vocabulary_len() as TermId {
            let idf_t = idf(n, index.df_by_id(tid));
            for p in index.postings_by_id(tid) {
                if let Some(slot) = raw.get_mut(p.doc_id as usize) {
                    slot.push((tid, p.tf, idf_t));
                }
            }
        }
        let weigh = |w: Weighting| -> Vec<SparseVector> {
            raw.iter()
                .map(|terms| SparseVector::from_weights(terms.iter().map(|&(tid, tf, idf_t)| (tid, w.tf(tf) * idf_t))))
                .collect()
        };
        let store = VectorStore { standard: weigh(Weighting::Standard), sublinear: weigh(Weighting::Sublinear) };
        tracing::info!(num_docs = corpus.len(), dims = index.vocabulary_len(), "built document vectors");
        Ok(store)
    }

    pub fn vectors(&self, weighting: Weighting) -> &[SparseVector] {
        match weighting {
            Weighting::Standard => &self.standard,
            Weighting::Sublinear => &self.sublinear,
        }
    }

    pub fn document(&self, doc_id: DocId, weighting: Weighting) -> Option<&SparseVector> {
        self.vectors(weighting).get(doc_id as usize)
    }
}

/// Weight a normalized query as a one-document bag of terms. Terms outside the
/// vocabulary are dropped.
pub fn query_vector(terms: &[String], index: &InvertedIndex, weighting: Weighting) -> SparseVector {
    let mut tf_q: HashMap<TermId, u32> = HashMap::new();
    for term in terms {
        if let Some(tid) = index.term_id(term) {
            *tf_q.entry(tid).or_insert(0) += 1;
        }
    }
    let n = index.num_docs();
    SparseVector::from_weights(
        tf_q.into_iter().map(|(tid, tf)| (tid, weighting.tf(tf) * idf(n, index.df_by_id(tid)))),
    )
}

/// Rank documents by cosine similarity to `terms`: score descending, then document
/// id ascending. Zero scores are dropped unless `include_zeros` is set.
pub fn rank(
    terms: &[String],
    vectors: &VectorStore,
    index: &InvertedIndex,
    corpus: &Corpus,
    weighting: Weighting,
    include_zeros: bool,
) -> Vec<(DocId, f32)> {
    let q = query_vector(terms, index, weighting);
    let docs = vectors.vectors(weighting);

    let candidates: HashSet<DocId> = if include_zeros {
        (0..docs.len() as DocId).collect()
    } else {
        q.entries()
            .iter()
            .flat_map(|(tid, _)| index.postings_by_id(*tid).iter().map(|p| p.doc_id))
            .collect()
    };

    let mut scored: Vec<(DocId, f32)> = candidates
        .into_iter()
        .filter_map(|doc_id| docs.get(doc_id as usize).map(|d| (doc_id, cosine(&q, d))))
        .filter(|(_, score)| include_zeros || *score > 0.0)
        .collect();

    let external = |doc_id: DocId| corpus.get(doc_id).map(|d| d.id.as_str()).unwrap_or("");
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| external(a.0).cmp(external(b.0))));
    scored
}

/// The `n` highest-weighted terms of a document vector.
pub fn top_terms(vector: &SparseVector, index: &InvertedIndex, n: usize) -> Vec<(String, f32)> {
    let mut entries = vector.entries().to_vec();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
        .into_iter()
        .take(n)
        .filter_map(|(tid, w)| index.term(tid).map(|t| (t.to_string(), w)))
        .collect()
}
