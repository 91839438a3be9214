use crate::corpus::{Corpus, Document, RawDocument};
use crate::tokenizer::{NormalizerConfig, StemmerKind};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
    pub normalizer: NormalizerConfig,
}

/// Layout of a normalized corpus cache directory.
pub struct CachePaths {
    pub root: PathBuf,
}

impl CachePaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn corpus(&self) -> PathBuf { self.root.join("corpus.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    /// Whether `root` looks like a cache written by [`save_corpus_cache`].
    pub fn exists(&self) -> bool {
        self.meta().is_file() && self.corpus().is_file()
    }
}

pub fn save_meta(paths: &CachePaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &CachePaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta()).with_context(|| format!("opening {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// A custom stemmer cannot be rebuilt from `meta.json`, so queries against such a
/// cache would be normalized differently from its documents.
fn ensure_reproducible(config: &NormalizerConfig) -> Result<()> {
    if config.stemmer == StemmerKind::Custom {
        bail!("corpus normalized with a custom stemmer cannot be cached or reopened from configuration");
    }
    Ok(())
}

/// Persist a normalized corpus (ids, titles, raw text, term sequences).
pub fn save_corpus_cache(paths: &CachePaths, corpus: &Corpus, normalizer: &NormalizerConfig) -> Result<MetaFile> {
    ensure_reproducible(normalizer)?;
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.corpus())?;
    let bytes = bincode::serialize(corpus.documents())?;
    f.write_all(&bytes)?;

    let meta = MetaFile {
        num_docs: corpus.len() as u32,
        num_terms: corpus.vocabulary_len() as u32,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: CACHE_VERSION,
        normalizer: normalizer.clone(),
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, num_terms = meta.num_terms, "saved corpus cache");
    Ok(meta)
}

/// Load a cache written by [`save_corpus_cache`] without re-normalizing.
pub fn load_corpus_cache(paths: &CachePaths) -> Result<(Corpus, MetaFile)> {
    let meta = load_meta(paths)?;
    if meta.version != CACHE_VERSION {
        bail!("corpus cache version {} is not supported (expected {})", meta.version, CACHE_VERSION);
    }
    let mut f = File::open(paths.corpus())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let docs: Vec<Document> = bincode::deserialize(&buf)?;
    let corpus = Corpus::from_documents(docs)?;
    Ok((corpus, meta))
}

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: String,
    #[serde(default)]
    title: Option<String>,
    body: String,
}

impl From<InputDoc> for RawDocument {
    fn from(d: InputDoc) -> Self {
        RawDocument { id: d.id, title: d.title, body: d.body }
    }
}

/// Read raw documents from a file or directory: `.txt` files become one document
/// each (id = file name), `.json` holds an object or an array of `{id, title?, body}`,
/// `.jsonl` holds one such object per line. Output is sorted by id.
pub fn load_raw_documents<P: AsRef<Path>>(path: P) -> Result<Vec<RawDocument>> {
    let path = path.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            if entry.path().is_file() {
                files.push(entry.path().to_path_buf());
            }
        }
    } else if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        bail!("{} does not exist", path.display());
    }

    let mut docs = Vec::new();
    for file in files {
        match file.extension().and_then(|s| s.to_str()) {
            Some("txt") => docs.push(read_txt(&file)?),
            Some("jsonl") => read_jsonl(&file, &mut docs)?,
            Some("json") => read_json(&file, &mut docs)?,
            _ => {}
        }
    }
    docs.sort_by(|a, b| a.id.cmp(&b.id));
    tracing::info!(path = %path.display(), num_docs = docs.len(), "loaded raw documents");
    Ok(docs)
}

fn read_txt(file: &Path) -> Result<RawDocument> {
    let bytes = std::fs::read(file)?;
    let body = String::from_utf8_lossy(&bytes).into_owned();
    let id = file
        .file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .with_context(|| format!("non UTF-8 file name {}", file.display()))?;
    Ok(RawDocument { id, title: None, body })
}

fn read_jsonl(file: &Path, docs: &mut Vec<RawDocument>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{} line {}", file.display(), n + 1))?;
        docs.push(doc.into());
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<RawDocument>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                let doc: InputDoc = serde_json::from_value(v)?;
                docs.push(doc.into());
            }
        }
        serde_json::Value::Object(_) => {
            let doc: InputDoc = serde_json::from_value(json)?;
            docs.push(doc.into());
        }
        _ => {}
    }
    Ok(())
}

/// Load a corpus from `path`: a cache directory if it holds one, raw documents
/// otherwise. Returns the normalizer config the corpus was built with.
pub fn open_corpus<P: AsRef<Path>>(path: P, config: NormalizerConfig) -> Result<(Corpus, NormalizerConfig)> {
    let paths = CachePaths::new(&path);
    if paths.exists() {
        let (corpus, meta) = load_corpus_cache(&paths)?;
        ensure_reproducible(&meta.normalizer)?;
        return Ok((corpus, meta.normalizer));
    }
    ensure_reproducible(&config)?;
    let normalizer = crate::tokenizer::Normalizer::new(config.clone());
    let corpus = Corpus::load(load_raw_documents(path)?, &normalizer)?;
    Ok((corpus, config))
}
