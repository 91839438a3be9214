use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use search_core::persist::{save_corpus_cache, CachePaths};
use search_core::{load_corpus, Normalizer, NormalizerConfig, StemmerKind, StopwordList};
use serde_json::Value;
use server::{router, AppState};
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use tower::ServiceExt;

fn write_corpus(dir: &Path) {
    fs::write(dir.join("d1.txt"), "Universitas Negeri Semarang").unwrap();
    fs::write(dir.join("d2.txt"), "Universitas Dian Nuswantoro").unwrap();
    fs::write(dir.join("d3.txt"), "Fakultas Teknik").unwrap();
}

fn app(dir: &Path) -> Router {
    let state = AppState::load(dir, NormalizerConfig::default(), Some("secret".into())).unwrap();
    router(state)
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::String(String::from_utf8_lossy(&body).into_owned()));
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn doc_ids(json: &Value) -> Vec<String> {
    json["results"].as_array().unwrap().iter().map(|r| r["doc_id"].as_str().unwrap().to_string()).collect()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());

    let (status, json) = call(app(dir.path()), get("/search?q=universitas&model=vsm-tfidf&k=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc_ids(&json), vec!["d1.txt", "d2.txt"]);
    assert_eq!(json["total_hits"], 2);
    let snippet = json["results"][0]["snippet"].as_str().unwrap();
    assert!(snippet.contains("<em>Universitas</em>"));
}

#[tokio::test]
async fn boolean_search_and_bad_queries() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());

    let (status, json) = call(app(dir.path()), get("/search?q=NOT%20teknik&model=boolean")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc_ids(&json), vec!["d1.txt", "d2.txt"]);

    let (status, _) = call(app(dir.path()), get("/search?q=teknik%20AND&model=boolean")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(app(dir.path()), get("/search?q=teknik&model=bm25")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(app(dir.path()), get("/search?q=teknik&k=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn doc_lookup() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());

    let (status, json) = call(app(dir.path()), get("/doc/d3.txt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["text"], "Fakultas Teknik");

    let (status, _) = call(app(dir.path()), get("/doc/missing.txt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn evaluate_endpoint() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());

    let body = serde_json::json!({ "query": "universitas", "model": "vsm-sublinear", "relevant": ["d1.txt", "d3.txt"], "k": 2 });
    let req = Request::post("/evaluate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, json) = call(app(dir.path()), req).await;
    assert_eq!(status, StatusCode::OK);
    let precision = json["metrics"]["precision"].as_f64().unwrap();
    let recall = json["metrics"]["recall"].as_f64().unwrap();
    assert!((precision - 0.5).abs() < 1e-9);
    assert!((recall - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn reload_requires_token_and_swaps_index() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let state = AppState::load(dir.path(), NormalizerConfig::default(), Some("secret".into())).unwrap();

    let (status, _) = call(router(state.clone()), Request::post("/index/reload").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    fs::write(dir.path().join("d4.txt"), "Institut Teknologi Bandung").unwrap();
    let req = Request::post("/index/reload").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, json) = call(router(state.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 4);

    let (_, json) = call(router(state), get("/search?q=bandung&model=boolean")).await;
    assert_eq!(doc_ids(&json), vec!["d4.txt"]);
}

fn write_cache(dir: &Path, config: NormalizerConfig) {
    let normalizer = Normalizer::new(config);
    let corpus = load_corpus(
        [("d1", "universitas negeri semarang"), ("d2", "fakultas teknik")],
        &normalizer,
    )
    .unwrap();
    save_corpus_cache(&CachePaths::new(dir), &corpus, normalizer.config()).unwrap();
}

#[tokio::test]
async fn reload_picks_up_the_cache_normalizer() {
    let dir = tempdir().unwrap();
    write_cache(dir.path(), NormalizerConfig::default());
    let state = AppState::load(dir.path(), NormalizerConfig::default(), Some("secret".into())).unwrap();

    let (_, json) = call(router(state.clone()), get("/search?q=universitas&model=boolean")).await;
    assert_eq!(doc_ids(&json), vec!["d1"]);

    // re-preprocessed without stemming or stopwords
    write_cache(dir.path(), NormalizerConfig::new(StopwordList::None, StemmerKind::None));
    let req = Request::post("/index/reload").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, _) = call(router(state.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.engine.normalizer().config().stemmer, StemmerKind::None);

    let (_, json) = call(router(state.clone()), get("/search?q=universitas&model=boolean")).await;
    assert_eq!(doc_ids(&json), vec!["d1"]);
    let (_, json) = call(router(state), get("/search?q=negeri&model=boolean")).await;
    assert_eq!(doc_ids(&json), vec!["d1"]);
}
