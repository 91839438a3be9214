//! Boolean retrieval over the inverted index.
//!
//! Grammar, with case-insensitive keywords:
//!
//! ```text
//! query   := <empty> | operand (("AND" | "OR") operand)*
//! operand := ["NOT"] word
//! ```
//!
//! Operators are folded strictly left to right with no precedence:
//! `a OR b AND c` is `(a OR b) AND c`. `NOT` binds only to the word right after it.
//! A word is normalized like document text; if it yields several terms the operand
//! matches documents containing all of them, and if it yields none (stopword or
//! punctuation) the operand matches nothing.

use crate::index::InvertedIndex;
use crate::tokenizer::Normalizer;
use crate::{DocId, Error, Result};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    /// The word as typed.
    pub word: String,
    pub terms: Vec<String>,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BooleanQuery {
    head: Option<Operand>,
    tail: Vec<(BoolOp, Operand)>,
}

enum Token<'a> {
    And,
    Or,
    Not,
    Word(&'a str),
}

fn lex(query: &str) -> impl Iterator<Item = Token<'_>> {
    query.split_whitespace().map(|w| {
        if w.eq_ignore_ascii_case("and") {
            Token::And
        } else if w.eq_ignore_ascii_case("or") {
            Token::Or
        } else if w.eq_ignore_ascii_case("not") {
            Token::Not
        } else {
            Token::Word(w)
        }
    })
}

fn syntax(position: usize, message: impl Into<String>) -> Error {
    Error::QuerySyntax { position, message: message.into() }
}

impl BooleanQuery {
    pub fn parse(query: &str, normalizer: &Normalizer) -> Result<Self> {
        let mut parsed = BooleanQuery::default();
        let mut pending: Option<BoolOp> = None;
        let mut negated = false;
        let mut last = 0;

        for (i, token) in lex(query).enumerate() {
            let position = i + 1;
            last = position;
            let expecting_operand = parsed.head.is_none() || pending.is_some();
            match token {
                Token::Word(word) => {
                    if !expecting_operand {
                        return Err(syntax(position, format!("expected AND or OR before `{word}`")));
                    }
                    let operand = Operand {
                        word: word.to_string(),
                        terms: normalizer.normalize(word),
                        negated: std::mem::take(&mut negated),
                    };
                    match pending.take() {
                        Some(op) => parsed.tail.push((op, operand)),
                        None => parsed.head = Some(operand),
                    }
                }
                Token::Not => {
                    if !expecting_operand {
                        return Err(syntax(position, "NOT must follow AND or OR"));
                    }
                    if negated {
                        return Err(syntax(position, "NOT must be followed by a word"));
                    }
                    negated = true;
                }
                Token::And | Token::Or => {
                    let name = if matches!(token, Token::And) { "AND" } else { "OR" };
                    if negated {
                        return Err(syntax(position, format!("NOT must be followed by a word, found {name}")));
                    }
                    if expecting_operand {
                        return Err(syntax(position, format!("{name} is missing its left operand")));
                    }
                    pending = Some(if matches!(token, Token::And) { BoolOp::And } else { BoolOp::Or });
                }
            }
        }

        if negated {
            return Err(syntax(last, "NOT is missing its operand"));
        }
        if let Some(op) = pending {
            let name = if op == BoolOp::And { "AND" } else { "OR" };
            return Err(syntax(last, format!("{name} is missing its right operand")));
        }
        Ok(parsed)
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn operands(&self) -> impl Iterator<Item = &Operand> {
        self.head.iter().chain(self.tail.iter().map(|(_, o)| o))
    }

    pub fn evaluate(&self, index: &InvertedIndex) -> BTreeSet<DocId> {
        let Some(head) = &self.head else {
            return BTreeSet::new();
        };
        let mut acc = eval_operand(head, index);
        for (op, operand) in &self.tail {
            let rhs = eval_operand(operand, index);
            acc = match op {
                BoolOp::And => acc.intersection(&rhs).copied().collect(),
                BoolOp::Or => acc.union(&rhs).copied().collect(),
            };
        }
        acc
    }

    /// One line per operator kind used, describing its set operation.
    pub fn explain(&self) -> Vec<&'static str> {
        let mut lines = Vec::new();
        if self.tail.iter().any(|(op, _)| *op == BoolOp::And) {
            lines.push("AND = intersection (documents must contain both sides)");
        }
        if self.tail.iter().any(|(op, _)| *op == BoolOp::Or) {
            lines.push("OR = union (documents containing either side)");
        }
        if self.operands().any(|o| o.negated) {
            lines.push("NOT = complement (all documents except those containing the word)");
        }
        lines
    }
}

fn eval_operand(operand: &Operand, index: &InvertedIndex) -> BTreeSet<DocId> {
    let mut terms = operand.terms.iter();
    let matched = match terms.next() {
        None => BTreeSet::new(),
        Some(first) => terms.fold(index.postings(first), |acc, t| {
            let p = index.postings(t);
            acc.intersection(&p).copied().collect()
        }),
    };
    if operand.negated {
        index.all_docs().difference(&matched).copied().collect()
    } else {
        matched
    }
}

/// Parse and evaluate `query` in one step.
pub fn evaluate(query: &str, index: &InvertedIndex, normalizer: &Normalizer) -> Result<BTreeSet<DocId>> {
    let parsed = BooleanQuery::parse(query, normalizer)?;
    let docs = parsed.evaluate(index);
    tracing::debug!(query, hits = docs.len(), "evaluated boolean query");
    Ok(docs)
}
