use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::Algorithm;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{N}_']*").expect("valid regex");
    static ref DEFAULT: Normalizer = Normalizer::new(NormalizerConfig::default());
}

const ENGLISH_STOPWORDS: &[&str] = &[
    "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
    "be","because","been","before","being","below","between","both","but","by",
    "can","can't","cannot","could","couldn't",
    "did","didn't","do","does","doesn't","doing","don't","down","during",
    "each","few","for","from","further",
    "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
    "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
    "let's","me","more","most","mustn't","my","myself",
    "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
    "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
    "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
    "under","until","up","very",
    "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
    "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves",
];

const INDONESIAN_STOPWORDS: &[&str] = &[
    "judul","dan","atau","serta",
    "di","ke","dari","pada","dalam","antara",
    "ini","itu","tersebut",
    "adalah","sebagai","untuk","sebuah","seorang",
    "juga","lebih","tidak","bukan","saat","hingga",
    "adanya","agar","karenanya","sehingga","per",
    "yang","dengan","oleh","akan","telah","sudah","dapat",
];

/// Which built-in stopword list a [`Normalizer`] drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwordList {
    English,
    Indonesian,
    /// English and Indonesian together.
    #[default]
    Combined,
    None,
}

impl StopwordList {
    fn words(self) -> impl Iterator<Item = &'static str> {
        const NONE: &[&str] = &[];
        let (en, id) = match self {
            StopwordList::English => (ENGLISH_STOPWORDS, NONE),
            StopwordList::Indonesian => (NONE, INDONESIAN_STOPWORDS),
            StopwordList::Combined => (ENGLISH_STOPWORDS, INDONESIAN_STOPWORDS),
            StopwordList::None => (NONE, NONE),
        };
        en.iter().chain(id.iter()).copied()
    }
}

impl std::str::FromStr for StopwordList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(StopwordList::English),
            "indonesian" | "id" => Ok(StopwordList::Indonesian),
            "combined" => Ok(StopwordList::Combined),
            "none" => Ok(StopwordList::None),
            other => Err(format!("unknown stopword list `{other}`")),
        }
    }
}

/// Built-in stemmer selection. `Custom` marks a normalizer that was given its own
/// [`Stemmer`] implementation; it cannot be reconstructed from configuration alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemmerKind {
    #[default]
    English,
    None,
    Custom,
}

impl std::str::FromStr for StemmerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "english" | "snowball" => Ok(StemmerKind::English),
            "none" => Ok(StemmerKind::None),
            other => Err(format!("unknown stemmer `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizerConfig {
    pub stopwords: StopwordList,
    pub stemmer: StemmerKind,
    /// Lowercased words dropped on top of `stopwords`.
    #[serde(default)]
    pub extra_stopwords: Vec<String>,
}

impl NormalizerConfig {
    pub fn new(stopwords: StopwordList, stemmer: StemmerKind) -> Self {
        Self { stopwords, stemmer, extra_stopwords: Vec::new() }
    }
}

/// A deterministic token → term transform applied after stopword removal.
pub trait Stemmer: Send + Sync {
    fn stem<'a>(&self, token: &'a str) -> Cow<'a, str>;
}

impl<F> Stemmer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn stem<'a>(&self, token: &'a str) -> Cow<'a, str> {
        Cow::Owned(self(token))
    }
}

/// Snowball stemmer backed by `rust-stemmers`.
pub struct SnowballStemmer(rust_stemmers::Stemmer);

impl SnowballStemmer {
    pub fn new(algorithm: Algorithm) -> Self {
        Self(rust_stemmers::Stemmer::create(algorithm))
    }
}

impl Stemmer for SnowballStemmer {
    fn stem<'a>(&self, token: &'a str) -> Cow<'a, str> {
        self.0.stem(token)
    }
}

/// Leaves tokens untouched.
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    fn stem<'a>(&self, token: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(token)
    }
}

/// Text → term pipeline: NFKC, lowercase, word split, stopword removal, stemming.
///
/// Cloning is cheap; the stemmer is shared.
#[derive(Clone)]
pub struct Normalizer {
    config: NormalizerConfig,
    stopwords: Arc<HashSet<String>>,
    stemmer: Arc<dyn Stemmer>,
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("config", &self.config)
            .field("stopwords", &self.stopwords.len())
            .finish()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        DEFAULT.clone()
    }
}

impl Normalizer {
    /// Build from configuration. `StemmerKind::Custom` has no built-in stemmer and
    /// falls back to identity; attach the real one with [`Normalizer::with_stemmer`].
    pub fn new(config: NormalizerConfig) -> Self {
        let stemmer: Arc<dyn Stemmer> = match config.stemmer {
            StemmerKind::English => Arc::new(SnowballStemmer::new(Algorithm::English)),
            StemmerKind::None | StemmerKind::Custom => Arc::new(IdentityStemmer),
        };
        let stopwords = config
            .stopwords
            .words()
            .map(str::to_string)
            .chain(config.extra_stopwords.iter().map(|w| w.to_lowercase()))
            .collect();
        Self { config, stopwords: Arc::new(stopwords), stemmer }
    }

    /// Replace the stemmer with a caller-supplied one.
    pub fn with_stemmer<S: Stemmer + 'static>(mut self, stemmer: S) -> Self {
        self.stemmer = Arc::new(stemmer);
        self.config.stemmer = StemmerKind::Custom;
        self
    }

    /// Add words to the stopword set on top of the configured list.
    pub fn with_extra_stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = (*self.stopwords).clone();
        for word in words {
            let word = word.as_ref().to_lowercase();
            if set.insert(word.clone()) {
                self.config.extra_stopwords.push(word);
            }
        }
        self.stopwords = Arc::new(set);
        self
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Normalize text into an ordered term sequence. Duplicates are kept.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let folded = text.nfkc().collect::<String>().to_lowercase();
        let mut terms = Vec::new();
        for mat in RE.find_iter(&folded) {
            let token = mat.as_str();
            if self.is_stopword(token) {
                continue;
            }
            let stem = self.stemmer.stem(token);
            // a stem can collide with a stopword ("herring" -> "her")
            if stem.is_empty() || self.is_stopword(&stem) {
                continue;
            }
            terms.push(stem.into_owned());
        }
        terms
    }
}

/// Normalize with the default configuration (combined stopwords, English stemmer).
pub fn normalize(text: &str) -> Vec<String> {
    DEFAULT.normalize(text)
}
