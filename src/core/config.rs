use super::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Corpus directory used when none is given
pub const DEFAULT_CORPUS_DIR: &str = "corpus_texts";

/// Name of the cache snapshot kept inside the corpus directory
pub const CACHE_FILENAME: &str = "corpus_cache.redb";

/// Default number of context characters on each side of a concordance hit
pub const DEFAULT_CONCORDANCE_WIDTH: usize = 80;

/// Default length of frequency listings
pub const DEFAULT_TOP_N: usize = 20;

/// Configuration for concordex
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the source documents
    pub corpus_dir: PathBuf,
    /// Path to the cache snapshot (always inside `corpus_dir`)
    pub cache_path: PathBuf,
    /// Optional lexicon handed to the NLP provider at construction
    pub lexicon_path: Option<PathBuf>,
    /// Context width for concordance lines
    pub concordance_width: usize,
    /// Number of entries in frequency listings
    pub top_n: usize,
}

impl Config {
    /// Create a new configuration
    pub fn new(corpus_dir: Option<PathBuf>) -> Result<Self> {
        let corpus_dir = corpus_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CORPUS_DIR));

        if corpus_dir.as_os_str().is_empty() {
            return Err(Error::Config("Corpus directory path is empty".to_string()));
        }

        Ok(Self {
            cache_path: corpus_dir.join(CACHE_FILENAME),
            corpus_dir,
            lexicon_path: None,
            concordance_width: DEFAULT_CONCORDANCE_WIDTH,
            top_n: DEFAULT_TOP_N,
        })
    }

    /// Use a lexicon file for the NLP provider
    pub fn with_lexicon(mut self, path: impl AsRef<Path>) -> Self {
        self.lexicon_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Make sure the corpus directory exists.
    ///
    /// A regular file squatting on the corpus path is removed first.
    pub fn init(&self) -> Result<()> {
        if self.corpus_dir.exists() && !self.corpus_dir.is_dir() {
            tracing::warn!(
                path = %self.corpus_dir.display(),
                "Corpus path exists but is a file, removing it"
            );
            std::fs::remove_file(&self.corpus_dir)?;
        }
        std::fs::create_dir_all(&self.corpus_dir)?;
        Ok(())
    }

    /// Check if the corpus directory is present
    pub fn is_initialized(&self) -> bool {
        self.corpus_dir.is_dir()
    }
}
