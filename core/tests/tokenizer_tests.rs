use search_core::tokenizer::{normalize, Normalizer, NormalizerConfig, StemmerKind, StopwordList};

#[test]
fn it_normalizes_and_stems() {
    let words = normalize("Running Runners RUN! The café's menu.");
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    // NFKC + lowercase keeps the accent
    assert!(words.iter().any(|w| w.starts_with("café")));
}

#[test]
fn it_filters_stopwords() {
    let words = normalize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
}

#[test]
fn compatibility_forms_fold_together() {
    let n = Normalizer::new(NormalizerConfig::new(StopwordList::None, StemmerKind::None));
    // fullwidth letters and the "ﬁ" ligature
    assert_eq!(n.normalize("ＴＥＫＮＩＫ ﬁsika"), vec!["teknik", "fisika"]);
}

#[test]
fn numbers_are_terms() {
    let n = Normalizer::new(NormalizerConfig::new(StopwordList::English, StemmerKind::None));
    assert_eq!(n.normalize("Founded in 1920."), vec!["founded", "1920"]);
}
