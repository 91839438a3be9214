//! Retrieval-quality metrics with binary relevance.
//!
//! All functions are total: empty rankings, empty judgment sets and `k == 0` give 0.
//! A document id repeated in a ranking only counts as relevant at its first rank.
//! Average precision uses the cutoff-aware normalization
//! `AP@k = (1 / min(|G|, k)) * sum of precision@i over relevant ranks i <= k`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub map_at_k: f64,
    pub ndcg_at_k: f64,
}

/// Metrics for an unranked result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SetMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per rank: whether this is the first occurrence of a relevant id.
fn relevance<'a, S: AsRef<str>>(ranking: &'a [S], relevant: &'a HashSet<String>) -> impl Iterator<Item = bool> + 'a {
    let mut seen: HashSet<&str> = HashSet::new();
    ranking.iter().map(move |id| {
        let id = id.as_ref();
        relevant.contains(id) && seen.insert(id)
    })
}

fn hits<S: AsRef<str>>(ranking: &[S], relevant: &HashSet<String>) -> usize {
    relevance(ranking, relevant).filter(|&r| r).count()
}

pub fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Relevant fraction of the first `k` results, dividing by `k` even when fewer were
/// returned.
pub fn precision_at_k<S: AsRef<str>>(ranking: &[S], relevant: &HashSet<String>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    hits(&ranking[..k.min(ranking.len())], relevant) as f64 / k as f64
}

pub fn average_precision_at_k<S: AsRef<str>>(ranking: &[S], relevant: &HashSet<String>, k: usize) -> f64 {
    let denom = relevant.len().min(k);
    if denom == 0 {
        return 0.0;
    }
    let mut found = 0usize;
    let mut sum = 0.0;
    for (i, rel) in relevance(ranking, relevant).take(k).enumerate() {
        if rel {
            found += 1;
            sum += found as f64 / (i + 1) as f64;
        }
    }
    sum / denom as f64
}

pub fn ndcg_at_k<S: AsRef<str>>(ranking: &[S], relevant: &HashSet<String>, k: usize) -> f64 {
    let dcg: f64 = relevance(ranking, relevant)
        .take(k)
        .enumerate()
        .filter(|&(_, rel)| rel)
        .map(|(i, _)| 1.0 / (i as f64 + 2.0).log2())
        .sum();
    let idcg: f64 = (0..relevant.len().min(k)).map(|i| 1.0 / (i as f64 + 2.0).log2()).sum();
    if idcg == 0.0 {
        0.0
    } else {
        dcg / idcg
    }
}

/// Evaluate the top-`k` prefix of `ranking` against `relevant`.
pub fn evaluate<S: AsRef<str>>(ranking: &[S], relevant: &HashSet<String>, k: usize) -> Metrics {
    let top = &ranking[..k.min(ranking.len())];
    let found = hits(top, relevant);
    let precision = if top.is_empty() { 0.0 } else { found as f64 / top.len() as f64 };
    let recall = if relevant.is_empty() { 0.0 } else { found as f64 / relevant.len() as f64 };
    Metrics {
        precision,
        recall,
        f1: f1(precision, recall),
        map_at_k: average_precision_at_k(ranking, relevant, k),
        ndcg_at_k: ndcg_at_k(ranking, relevant, k),
    }
}

pub fn evaluate_set(retrieved: &HashSet<String>, relevant: &HashSet<String>) -> SetMetrics {
    let found = retrieved.intersection(relevant).count();
    let precision = if retrieved.is_empty() { 0.0 } else { found as f64 / retrieved.len() as f64 };
    let recall = if relevant.is_empty() { 0.0 } else { found as f64 / relevant.len() as f64 };
    SetMetrics { precision, recall, f1: f1(precision, recall) }
}

/// Per-query metrics averaged over a judgment set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub queries: usize,
    pub mean: Metrics,
}

impl MetricsSummary {
    pub fn mean<I: IntoIterator<Item = Metrics>>(metrics: I) -> Self {
        let mut sum = Metrics::default();
        let mut queries = 0;
        for m in metrics {
            sum.precision += m.precision;
            sum.recall += m.recall;
            sum.f1 += m.f1;
            sum.map_at_k += m.map_at_k;
            sum.ndcg_at_k += m.ndcg_at_k;
            queries += 1;
        }
        if queries == 0 {
            return Self::default();
        }
        let n = queries as f64;
        Self {
            queries,
            mean: Metrics {
                precision: sum.precision / n,
                recall: sum.recall / n,
                f1: sum.f1 / n,
                map_at_k: sum.map_at_k / n,
                ndcg_at_k: sum.ndcg_at_k / n,
            },
        }
    }
}

/// Set metrics averaged over a judgment set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SetMetricsSummary {
    pub queries: usize,
    pub mean: SetMetrics,
}

impl SetMetricsSummary {
    pub fn mean<I: IntoIterator<Item = SetMetrics>>(metrics: I) -> Self {
        let mut sum = SetMetrics::default();
        let mut queries = 0;
        for m in metrics {
            sum.precision += m.precision;
            sum.recall += m.recall;
            sum.f1 += m.f1;
            queries += 1;
        }
        if queries == 0 {
            return Self::default();
        }
        let n = queries as f64;
        Self {
            queries,
            mean: SetMetrics { precision: sum.precision / n, recall: sum.recall / n, f1: sum.f1 / n },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn cutoff_two() {
        let m = evaluate(&["d2", "d3", "d1"], &set(&["d1", "d2"]), 2);
        assert!(close(m.precision, 0.5));
        assert!(close(m.recall, 0.5));
        assert!(close(m.f1, 0.5));
        // AP@2 = (1/2) * (1/1)
        assert!(close(m.map_at_k, 0.5));
        let idcg = 1.0 + 1.0 / 3f64.log2();
        assert!(close(m.ndcg_at_k, 1.0 / idcg));
    }

    #[test]
    fn perfect_ranking_scores_one() {
        let m = evaluate(&["a", "b", "c"], &set(&["a", "b"]), 3);
        assert!(close(m.recall, 1.0));
        assert!(close(m.map_at_k, 1.0));
        assert!(close(m.ndcg_at_k, 1.0));
        assert!(close(m.precision, 2.0 / 3.0));
    }

    #[test]
    fn empty_inputs_are_zero() {
        let none: [&str; 0] = [];
        assert_eq!(evaluate(&none, &set(&["a"]), 5), Metrics::default());
        assert_eq!(evaluate(&["a"], &HashSet::new(), 5), Metrics::default());
        assert_eq!(evaluate(&["a"], &set(&["a"]), 0), Metrics::default());
        assert_eq!(evaluate_set(&HashSet::new(), &HashSet::new()), SetMetrics::default());
    }

    #[test]
    fn precision_at_k_divides_by_k() {
        assert!(close(precision_at_k(&["a"], &set(&["a"]), 4), 0.25));
        assert_eq!(precision_at_k(&["a"], &set(&["a"]), 0), 0.0);
    }

    #[test]
    fn set_metrics() {
        let m = evaluate_set(&set(&["a", "b", "c", "d"]), &set(&["a", "e"]));
        assert!(close(m.precision, 0.25));
        assert!(close(m.recall, 0.5));
        assert!(close(m.f1, 1.0 / 3.0));
    }

    #[test]
    fn summary_averages() {
        let s = MetricsSummary::mean([
            Metrics { precision: 1.0, recall: 0.5, f1: 0.0, map_at_k: 1.0, ndcg_at_k: 0.0 },
            Metrics { precision: 0.0, recall: 0.5, f1: 1.0, map_at_k: 0.0, ndcg_at_k: 1.0 },
        ]);
        assert_eq!(s.queries, 2);
        assert!(close(s.mean.precision, 0.5));
        assert!(close(s.mean.recall, 0.5));
        assert_eq!(MetricsSummary::mean(std::iter::empty()).queries, 0);
    }

    #[test]
    fn set_summary_averages() {
        let s = SetMetricsSummary::mean([
            SetMetrics { precision: 1.0, recall: 0.0, f1: 0.0 },
            SetMetrics { precision: 0.5, recall: 1.0, f1: 1.0 },
        ]);
        assert_eq!(s.queries, 2);
        assert!(close(s.mean.precision, 0.75));
        assert!(close(s.mean.f1, 0.5));
        assert_eq!(SetMetricsSummary::mean(std::iter::empty()), SetMetricsSummary::default());
    }

    #[test]
    fn repeated_ids_count_once() {
        let m = evaluate(&["d1", "d1"], &set(&["d1", "d2"]), 2);
        assert!(close(m.recall, 0.5));
        assert!(close(m.precision, 0.5));
        assert!(close(m.map_at_k, 0.5));
        assert!(m.ndcg_at_k <= 1.0);
        let m = evaluate(&["d1", "d1", "d1"], &set(&["d1"]), 3);
        assert!(close(m.recall, 1.0));
        assert!(close(m.map_at_k, 1.0));
        assert!(close(m.ndcg_at_k, 1.0));
        assert!(close(precision_at_k(&["d1", "d1"], &set(&["d1"]), 2), 0.5));
    }
}
