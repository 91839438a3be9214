use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use search_core::eval::{self, MetricsSummary, SetMetrics, SetMetricsSummary};
use search_core::persist::{open_corpus, save_corpus_cache, CachePaths};
use search_core::snippet::snippet;
use search_core::{
    Corpus, Engine, Hit, Model, Normalizer, NormalizerConfig, RawDocument, SearchOptions, StemmerKind,
    StopwordList, Weighting,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Preprocess, search and evaluate a document collection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct NormalizeArgs {
    /// Stopword list: english, indonesian, combined or none
    #[arg(long, default_value = "combined")]
    stopwords: StopwordList,
    /// Stemmer: english or none
    #[arg(long, default_value = "english")]
    stemmer: StemmerKind,
    /// Additional comma-separated stopwords
    #[arg(long, value_delimiter = ',')]
    extra_stopwords: Vec<String>,
}

impl From<NormalizeArgs> for NormalizerConfig {
    fn from(a: NormalizeArgs) -> Self {
        let mut config = NormalizerConfig::new(a.stopwords, a.stemmer);
        config.extra_stopwords = a.extra_stopwords.iter().map(|w| w.trim().to_lowercase()).collect();
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize raw documents (.txt/.json/.jsonl) into a corpus cache
    Preprocess {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output cache directory
        #[arg(long)]
        output: String,
        #[command(flatten)]
        normalize: NormalizeArgs,
    },
    /// Run one query
    Search {
        /// Corpus cache directory or raw document path
        #[arg(long)]
        index: String,
        #[arg(long)]
        query: String,
        /// boolean, vsm-tfidf or vsm-sublinear
        #[arg(long, default_value = "vsm-tfidf")]
        model: String,
        /// Number of results to show
        #[arg(long, default_value_t = 5)]
        k: usize,
        /// Keep zero-scoring documents in VSM rankings
        #[arg(long, default_value_t = false)]
        all: bool,
        #[command(flatten)]
        normalize: NormalizeArgs,
    },
    /// Evaluate queries against relevance judgments
    Eval {
        /// Corpus cache directory or raw document path
        #[arg(long)]
        index: String,
        /// JSON array of {"query", "relevant": [ids], "models"?: [..]}
        #[arg(long)]
        judgments: String,
        /// Rank cutoff
        #[arg(long, default_value_t = 5)]
        k: usize,
        #[command(flatten)]
        normalize: NormalizeArgs,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Preprocess { input, output, normalize } => preprocess(&input, &output, normalize.into()),
        Commands::Search { index, query, model, k, all, normalize } => {
            let model: Model = model.parse()?;
            let engine = open_engine(&index, normalize.into())?;
            run_search(&engine, &query, model, k, all)
        }
        Commands::Eval { index, judgments, k, normalize } => {
            let engine = open_engine(&index, normalize.into())?;
            let judgments = load_judgments(Path::new(&judgments))?;
            let report = evaluate(&engine, &judgments, k)?;
            print_report(&report, k);
            Ok(())
        }
    }
}

fn preprocess(input: &str, output: &str, config: NormalizerConfig) -> Result<()> {
    let raw: Vec<RawDocument> = search_core::persist::load_raw_documents(input)?;
    let normalizer = Normalizer::new(config);
    let corpus = Corpus::load(raw, &normalizer)?;
    let meta = save_corpus_cache(&CachePaths::new(output), &corpus, normalizer.config())?;

    let stats = corpus.length_stats();
    println!("{} documents normalized into {}", meta.num_docs, output);
    println!("term counts per document:");
    for (id, n) in &stats.lengths {
        println!("  {id:<30} : {n:>6}");
    }
    println!("min {} / max {} / mean {:.1} terms, vocabulary {}", stats.min, stats.max, stats.mean, meta.num_terms);
    Ok(())
}

fn open_engine(path: &str, config: NormalizerConfig) -> Result<Engine> {
    let (corpus, used) = open_corpus(path, config)?;
    let engine = Engine::from_corpus(corpus, Normalizer::new(used))
        .with_context(|| format!("building index from {path}"))?;
    Ok(engine)
}

fn run_search(engine: &Engine, query: &str, model: Model, k: usize, all: bool) -> Result<()> {
    let hits = engine.search(query, model, SearchOptions { top_k: Some(k), include_zeros: all })?;
    let snap = engine.snapshot();
    println!("{model} | {query}");
    if hits.is_empty() {
        println!("no matching documents");
    }
    let words: Vec<&str> = query.split_whitespace().collect();
    for (rank, hit) in hits.iter().enumerate() {
        let text = snap.corpus.get(hit.doc_id).map(|d| d.text.as_str()).unwrap_or("");
        println!("{:>3}. {:<30} {:.4}  {}", rank + 1, hit.id, hit.score, snippet(text, &words, 80));
        let weighting = match model {
            Model::Boolean => None,
            Model::VsmTfidf => Some(Weighting::Standard),
            Model::VsmSublinear => Some(Weighting::Sublinear),
        };
        if let Some(terms) = weighting.and_then(|w| engine.top_terms(&hit.id, w, 3)) {
            let shown: Vec<String> = terms.iter().map(|(t, w)| format!("{t}={w:.3}")).collect();
            println!("     top terms: {}", shown.join(", "));
        }
    }
    if model == Model::Boolean {
        let parsed = search_core::boolean::BooleanQuery::parse(query, &snap.normalizer)?;
        for line in parsed.explain() {
            println!("- {line}");
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct Judgment {
    query: String,
    relevant: Vec<String>,
    /// Models to run this query under; all of them when empty.
    #[serde(default)]
    models: Vec<Model>,
}

fn load_judgments(path: &Path) -> Result<Vec<Judgment>> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let judgments: Vec<Judgment> = serde_json::from_str(&data)?;
    Ok(judgments)
}

#[derive(Debug, Default)]
struct Report {
    /// (query, model, metrics) for ranked models.
    ranked: Vec<(String, Model, eval::Metrics)>,
    /// (query, set metrics) for boolean queries.
    boolean: Vec<(String, SetMetrics)>,
}

fn evaluate(engine: &Engine, judgments: &[Judgment], k: usize) -> Result<Report> {
    let mut report = Report::default();
    for j in judgments {
        let relevant: HashSet<String> = j.relevant.iter().cloned().collect();
        let models = if j.models.is_empty() { Model::ALL.to_vec() } else { j.models.clone() };
        for model in models {
            let hits = engine.search(&j.query, model, SearchOptions::default())?;
            match model {
                Model::Boolean => {
                    let retrieved: HashSet<String> = hits.into_iter().map(|h: Hit| h.id).collect();
                    report.boolean.push((j.query.clone(), eval::evaluate_set(&retrieved, &relevant)));
                }
                Model::VsmTfidf | Model::VsmSublinear => {
                    let metrics = engine.evaluate_results(&hits, &relevant, k);
                    report.ranked.push((j.query.clone(), model, metrics));
                }
            }
        }
    }
    tracing::info!(ranked = report.ranked.len(), boolean = report.boolean.len(), "evaluation finished");
    Ok(report)
}

fn print_report(report: &Report, k: usize) {
    for model in [Model::VsmTfidf, Model::VsmSublinear] {
        let rows: Vec<_> = report.ranked.iter().filter(|(_, m, _)| *m == model).collect();
        if rows.is_empty() {
            continue;
        }
        println!("== {model} ==");
        for (query, _, m) in &rows {
            println!(
                "{query:<30} P={:.2} R={:.2} F1={:.2} MAP@{k}={:.2} nDCG@{k}={:.2}",
                m.precision, m.recall, m.f1, m.map_at_k, m.ndcg_at_k
            );
        }
        let summary = MetricsSummary::mean(rows.iter().map(|(_, _, m)| *m));
        let m = summary.mean;
        println!(
            "mean over {} queries: P={:.2} R={:.2} F1={:.2} MAP@{k}={:.2} nDCG@{k}={:.2}",
            summary.queries, m.precision, m.recall, m.f1, m.map_at_k, m.ndcg_at_k
        );
    }
    if !report.boolean.is_empty() {
        println!("== boolean ==");
        for (query, m) in &report.boolean {
            println!("{query:<30} P={:.2} R={:.2} F1={:.2}", m.precision, m.recall, m.f1);
        }
        let summary = SetMetricsSummary::mean(report.boolean.iter().map(|(_, m)| *m));
        let m = summary.mean;
        println!("mean over {} queries: P={:.2} R={:.2} F1={:.2}", summary.queries, m.precision, m.recall, m.f1);
    }
}
