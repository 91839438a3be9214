use search_core::persist::{load_corpus_cache, load_raw_documents, open_corpus, save_corpus_cache, CachePaths};
use search_core::{build_index, build_vectors, Corpus, Normalizer, NormalizerConfig, StemmerKind, StopwordList, Weighting};
use std::fs;
use tempfile::tempdir;

#[test]
fn loads_txt_json_and_jsonl_sorted_by_id() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("itb.txt"), "Institut Teknologi Bandung").unwrap();
    fs::write(dir.path().join("docs.jsonl"), "{\"id\":\"b\",\"body\":\"fakultas teknik\"}\n\n{\"id\":\"a\",\"title\":\"A\",\"body\":\"universitas\"}\n").unwrap();
    fs::write(dir.path().join("one.json"), "{\"id\":\"c\",\"body\":\"kampus\"}").unwrap();
    fs::write(dir.path().join("notes.md"), "ignored").unwrap();

    let docs = load_raw_documents(dir.path()).unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "itb.txt"]);
    assert_eq!(docs[0].title.as_deref(), Some("A"));
}

#[test]
fn missing_path_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(load_raw_documents(dir.path().join("nope")).is_err());
}

#[test]
fn cache_rebuilds_identical_index_and_vectors() {
    let src = tempdir().unwrap();
    fs::write(src.path().join("d1.txt"), "universitas negeri semarang universitas").unwrap();
    fs::write(src.path().join("d2.txt"), "universitas dian nuswantoro").unwrap();
    fs::write(src.path().join("d3.txt"), "fakultas teknik").unwrap();

    let config = NormalizerConfig::default();
    let normalizer = Normalizer::new(config.clone());
    let corpus = Corpus::load(load_raw_documents(src.path()).unwrap(), &normalizer).unwrap();

    let out = tempdir().unwrap();
    let paths = CachePaths::new(out.path());
    let meta = save_corpus_cache(&paths, &corpus, &config).unwrap();
    assert_eq!(meta.num_docs, 3);
    assert!(paths.exists());

    let (loaded, meta2) = load_corpus_cache(&paths).unwrap();
    assert_eq!(meta2.normalizer, config);
    assert_eq!(loaded.documents(), corpus.documents());

    let (i1, i2) = (build_index(&corpus).unwrap(), build_index(&loaded).unwrap());
    assert_eq!(i1.vocabulary(), i2.vocabulary());
    let (v1, v2) = (build_vectors(&corpus, &i1).unwrap(), build_vectors(&loaded, &i2).unwrap());
    for w in [Weighting::Standard, Weighting::Sublinear] {
        assert_eq!(v1.vectors(w), v2.vectors(w));
    }

    // open_corpus prefers the cache over raw documents
    let (opened, cfg) = open_corpus(out.path(), NormalizerConfig::default()).unwrap();
    assert_eq!(opened.len(), 3);
    assert_eq!(cfg, config);
}

#[test]
fn unsupported_cache_version_is_rejected() {
    let out = tempdir().unwrap();
    let paths = CachePaths::new(out.path());
    let corpus = search_core::load_corpus([("d1", "teknik")], &Normalizer::default()).unwrap();
    save_corpus_cache(&paths, &corpus, &NormalizerConfig::default()).unwrap();
    let meta_path = out.path().join("meta.json");
    let meta = fs::read_to_string(&meta_path).unwrap().replace("\"version\": 1", "\"version\": 99");
    fs::write(&meta_path, meta).unwrap();
    assert!(load_corpus_cache(&paths).is_err());
}

#[test]
fn extra_stopwords_are_restored_from_the_cache() {
    let normalizer = Normalizer::new(NormalizerConfig::new(StopwordList::None, StemmerKind::None))
        .with_extra_stopwords(["negeri"]);
    let corpus = search_core::load_corpus([("d1", "universitas negeri"), ("d2", "fakultas")], &normalizer).unwrap();
    let out = tempdir().unwrap();
    save_corpus_cache(&CachePaths::new(out.path()), &corpus, normalizer.config()).unwrap();

    let (_, cfg) = open_corpus(out.path(), NormalizerConfig::default()).unwrap();
    assert_eq!(cfg.extra_stopwords, vec!["negeri"]);
    assert_eq!(Normalizer::new(cfg).normalize("negeri universitas"), vec!["universitas"]);
}

#[test]
fn custom_stemmer_cannot_be_cached_or_reopened() {
    let normalizer = Normalizer::default().with_stemmer(|t: &str| t.to_string());
    let corpus = search_core::load_corpus([("d1", "teknik")], &normalizer).unwrap();
    let out = tempdir().unwrap();
    let paths = CachePaths::new(out.path());
    assert!(save_corpus_cache(&paths, &corpus, normalizer.config()).is_err());
    assert!(!paths.exists());

    // a cache edited to claim a custom stemmer is refused as well
    save_corpus_cache(&paths, &corpus, &NormalizerConfig::default()).unwrap();
    let meta_path = out.path().join("meta.json");
    let meta = fs::read_to_string(&meta_path).unwrap().replace("\"english\"", "\"custom\"");
    fs::write(&meta_path, meta).unwrap();
    assert!(open_corpus(out.path(), NormalizerConfig::default()).is_err());

    let raw = tempdir().unwrap();
    fs::write(raw.path().join("a.txt"), "teknik").unwrap();
    let custom = NormalizerConfig { stemmer: StemmerKind::Custom, ..NormalizerConfig::default() };
    assert!(open_corpus(raw.path(), custom).is_err());
}
