use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use search_core::persist::open_corpus;
use search_core::snippet::{highlight, snippet};
use search_core::{Engine, Error, Hit, Metrics, Model, Normalizer, NormalizerConfig, SearchOptions, SetMetrics};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

type ApiError = (StatusCode, String);

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub include_zeros: bool,
}
fn default_model() -> String { Model::VsmTfidf.to_string() }
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub model: Model,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub score: f32,
    pub title: Option<String>,
    pub snippet: Option<String>,
}

#[derive(Deserialize)]
pub struct EvaluateRequest {
    pub query: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub relevant: Vec<String>,
    #[serde(default = "default_eval_k")]
    pub k: usize,
}
fn default_eval_k() -> usize { 5 }

#[derive(Serialize)]
pub struct EvaluateResponse {
    pub query: String,
    pub model: Model,
    pub results: Vec<SearchHit>,
    /// Rank metrics over the top `k` results.
    pub metrics: Metrics,
    /// Precision/recall/F1 over every retrieved document.
    pub set_metrics: SetMetrics,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    /// Where documents are (re)loaded from: a corpus cache or raw documents.
    pub source: PathBuf,
    /// Normalization for raw-document sources; a cache brings its own.
    pub normalizer: NormalizerConfig,
    pub admin_token: Option<String>,
}

impl AppState {
    /// Load the corpus at `source` and build the engine.
    pub fn load(source: impl Into<PathBuf>, normalizer: NormalizerConfig, admin_token: Option<String>) -> Result<Self> {
        let source = source.into();
        let (corpus, used) = open_corpus(&source, normalizer.clone())?;
        let engine = Engine::from_corpus(corpus, Normalizer::new(used))?;
        Ok(Self { engine: Arc::new(engine), source, normalizer, admin_token })
    }
}

pub fn build_app(source: String, normalizer: NormalizerConfig) -> Result<Router> {
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let state = AppState::load(source, normalizer, admin_token)?;

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Ok(router(state).layer(cors))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/evaluate", post(evaluate_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn api_error(err: Error) -> ApiError {
    let status = match err {
        Error::QuerySyntax { .. } | Error::UnknownModel(_) => StatusCode::BAD_REQUEST,
        Error::DuplicateId(_) | Error::EmptyCorpus => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, err.to_string())
}

/// Query words worth highlighting: everything except boolean keywords.
fn highlight_words(query: &str) -> Vec<&str> {
    query
        .split_whitespace()
        .filter(|w| !["and", "or", "not"].iter().any(|k| w.eq_ignore_ascii_case(k)))
        .collect()
}

fn render_hits(state: &AppState, hits: &[Hit], query: &str) -> Vec<SearchHit> {
    let snap = state.engine.snapshot();
    let words = highlight_words(query);
    hits.iter()
        .map(|h| {
            let doc = snap.corpus.get(h.doc_id);
            SearchHit {
                doc_id: h.id.clone(),
                score: h.score,
                title: doc.and_then(|d| d.title.clone()),
                snippet: doc.filter(|d| !d.text.is_empty()).map(|d| highlight(&snippet(&d.text, &words, 200), &words)),
            }
        })
        .collect()
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let model: Model = params.model.parse().map_err(api_error)?;
    let options = SearchOptions { top_k: None, include_zeros: params.include_zeros };
    if params.k == 0 {
        return Err((StatusCode::BAD_REQUEST, "k must be at least 1".into()));
    }
    let mut hits = state.engine.search(&params.q, model, options).map_err(api_error)?;
    let total_hits = hits.len();
    hits.truncate(params.k.min(100));

    let results = render_hits(&state, &hits, &params.q);
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, model, took_s: elapsed.as_secs_f64(), total_hits, results }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    let snap = state.engine.snapshot();
    match snap.corpus.by_external_id(&doc_id) {
        Some(doc) => Ok(Json(serde_json::json!({
            "doc_id": doc.id,
            "title": doc.title,
            "text": doc.text,
            "num_terms": doc.terms.len(),
        }))),
        None => Err((StatusCode::NOT_FOUND, format!("document `{doc_id}` not found"))),
    }
}

pub async fn evaluate_handler(State(state): State<AppState>, Json(req): Json<EvaluateRequest>) -> Result<Json<EvaluateResponse>, ApiError> {
    let model: Model = req.model.parse().map_err(api_error)?;
    let hits = state.engine.search(&req.query, model, SearchOptions::default()).map_err(api_error)?;
    let relevant: HashSet<String> = req.relevant.into_iter().collect();
    let retrieved: HashSet<String> = hits.iter().map(|h| h.id.clone()).collect();

    let metrics = state.engine.evaluate_results(&hits, &relevant, req.k);
    let set_metrics = search_core::eval::evaluate_set(&retrieved, &relevant);
    let results = render_hits(&state, &hits, &req.query);
    Ok(Json(EvaluateResponse { query: req.query, model, results, metrics, set_metrics }))
}

async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let engine = state.engine.clone();
    let source = state.source.clone();
    let config = state.normalizer.clone();
    let reloaded = tokio::task::spawn_blocking(move || -> Result<usize> {
        let (corpus, used) = open_corpus(&source, config)?;
        Ok(engine.replace(corpus, Normalizer::new(used))?)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    match reloaded {
        Ok(num_docs) => Ok(Json(serde_json::json!({ "num_docs": num_docs }))),
        Err(e) => {
            tracing::warn!(error = %e, "reload failed, keeping current index");
            Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
