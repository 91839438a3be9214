use crate::corpus::Corpus;
use crate::{DocId, Error, Result, TermId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    /// Occurrences of the term in the document's normalized sequence.
    pub tf: u32,
}

/// Term → postings, built once from a [`Corpus`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvertedIndex {
    dictionary: HashMap<String, TermId>,
    terms: Vec<String>,
    df: Vec<u32>,
    postings: Vec<Vec<Posting>>, // indexed by term id, sorted by doc_id
    num_docs: u32,
}

impl InvertedIndex {
    pub fn build(corpus: &Corpus) -> Result<Self> {
        if corpus.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let mut index = InvertedIndex { num_docs: corpus.len() as u32, ..Default::default() };
        for (doc_id, doc) in corpus.iter() {
            let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
            for term in &doc.terms {
                let tid = index.intern(term);
                *tf_counts.entry(tid).or_insert(0) += 1;
            }
            for (tid, tf) in tf_counts {
                index.df[tid as usize] += 1;
                // documents are visited in ascending doc_id, so each list stays sorted
                index.postings[tid as usize].push(Posting { doc_id, tf });
            }
        }
        tracing::info!(num_docs = index.num_docs, num_terms = index.terms.len(), "built inverted index");
        Ok(index)
    }

    fn intern(&mut self, term: &str) -> TermId {
        if let Some(&tid) = self.dictionary.get(term) {
            return tid;
        }
        let tid = self.terms.len() as TermId;
        self.dictionary.insert(term.to_string(), tid);
        self.terms.push(term.to_string());
        self.df.push(0);
        self.postings.push(Vec::new());
        tid
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn vocabulary_len(&self) -> usize {
        self.terms.len()
    }

    /// Terms in first-seen order; a term's position is its [`TermId`].
    pub fn vocabulary(&self) -> &[String] {
        &self.terms
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.dictionary.get(term).copied()
    }

    pub fn term(&self, term_id: TermId) -> Option<&str> {
        self.terms.get(term_id as usize).map(String::as_str)
    }

    /// Postings with term frequencies, sorted by doc id. Empty for unseen terms.
    pub fn posting_list(&self, term: &str) -> &[Posting] {
        self.term_id(term).map(|tid| self.postings_by_id(tid)).unwrap_or(&[])
    }

    pub fn postings_by_id(&self, term_id: TermId) -> &[Posting] {
        self.postings.get(term_id as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Set of documents containing `term`.
    pub fn postings(&self, term: &str) -> BTreeSet<DocId> {
        self.posting_list(term).iter().map(|p| p.doc_id).collect()
    }

    pub fn document_frequency(&self, term: &str) -> u32 {
        self.term_id(term).map(|tid| self.df_by_id(tid)).unwrap_or(0)
    }

    pub fn df_by_id(&self, term_id: TermId) -> u32 {
        self.df.get(term_id as usize).copied().unwrap_or(0)
    }

    /// Raw frequency of `term` in `doc_id`; 0 when absent.
    pub fn term_frequency(&self, doc_id: DocId, term: &str) -> u32 {
        let list = self.posting_list(term);
        list.binary_search_by_key(&doc_id, |p| p.doc_id)
            .map(|i| list[i].tf)
            .unwrap_or(0)
    }

    /// Every document id in the indexed corpus.
    pub fn all_docs(&self) -> BTreeSet<DocId> {
        (0..self.num_docs).collect()
    }
}
