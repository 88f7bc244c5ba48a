use crate::core::config::Config;
use crate::core::error::Result;
use crate::indexing::discovery::DocumentLoader;
use crate::indexing::extract::ExtractorRegistry;
use crate::indexing::nlp::NlpProvider;
use crate::indexing::rules::{ProviderConfig, RuleBasedProvider};
use crate::storage::cache::{CacheLookup, CacheStore};
use crate::storage::xml;
use std::fmt;
use std::path::Path;

use super::concordance::ConcordanceLine;
use super::index::CorpusIndex;
use super::word_info::WordInfo;

/// Where the live index came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSource {
    Cache,
    Processed,
    Xml,
}

impl fmt::Display for IndexSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndexSource::Cache => "cache",
            IndexSource::Processed => "processed",
            IndexSource::Xml => "xml import",
        })
    }
}

/// A corpus directory together with its live index.
///
/// Opening restores the index from the cache when it is fresh and otherwise
/// processes the directory and writes a new cache. All operations run
/// synchronously on the caller's thread.
pub struct Corpus<P: NlpProvider = RuleBasedProvider> {
    config: Config,
    loader: DocumentLoader,
    provider: P,
    cache: CacheStore,
    index: CorpusIndex,
    source: IndexSource,
}

impl Corpus<RuleBasedProvider> {
    /// Open with the built-in provider and the default extractors
    pub fn open(config: Config) -> Result<Self> {
        let provider = RuleBasedProvider::new(&ProviderConfig {
            lexicon_path: config.lexicon_path.clone(),
        })?;
        Self::with_provider(config, provider, ExtractorRegistry::with_defaults())
    }

    /// Open an index exported as XML without touching the corpus directory
    pub fn open_xml(config: Config, path: &Path) -> Result<Self> {
        let provider = RuleBasedProvider::new(&ProviderConfig {
            lexicon_path: config.lexicon_path.clone(),
        })?;
        Self::from_xml(config, provider, ExtractorRegistry::with_defaults(), path)
    }
}

impl<P: NlpProvider> Corpus<P> {
    pub fn with_provider(config: Config, provider: P, extractors: ExtractorRegistry) -> Result<Self> {
        config.init()?;
        let mut corpus = Self::unloaded(config, provider, extractors);

        match corpus.cache.load(&corpus.loader) {
            CacheLookup::Hit(index) => {
                corpus.index = index;
                corpus.source = IndexSource::Cache;
            }
            CacheLookup::Miss(reason) => {
                tracing::info!(reason = %reason, "Cache not usable, processing corpus");
                corpus.process();
            }
        }

        Ok(corpus)
    }

    /// Build the index from an XML export alone.
    ///
    /// The directory is neither read nor created and its cache is left as
    /// it is, so a later plain open still finds it. A `reload` switches
    /// back to the directory.
    pub fn from_xml(
        config: Config,
        provider: P,
        extractors: ExtractorRegistry,
        path: &Path,
    ) -> Result<Self> {
        let mut corpus = Self::unloaded(config, provider, extractors);
        corpus.index = xml::import(path)?;
        corpus.source = IndexSource::Xml;
        Ok(corpus)
    }

    fn unloaded(config: Config, provider: P, extractors: ExtractorRegistry) -> Self {
        Self {
            loader: DocumentLoader::new(&config.corpus_dir, extractors),
            cache: CacheStore::new(&config.cache_path),
            config,
            provider,
            index: CorpusIndex::default(),
            source: IndexSource::Processed,
        }
    }

    /// Rebuild the whole index from the directory and cache it
    fn process(&mut self) -> bool {
        let documents = self.loader.load();
        self.index = CorpusIndex::build(documents, &self.provider);
        self.source = IndexSource::Processed;

        if let Err(e) = self.cache.save(&self.index) {
            tracing::warn!(error = %e, "Failed to save cache");
        }
        self.index.token_count() > 0
    }

    /// Drop the cache and reprocess the directory.
    ///
    /// Returns whether the new index has any tokens.
    pub fn reload(&mut self) -> bool {
        tracing::info!(dir = %self.config.corpus_dir.display(), "Reloading corpus");
        if let Err(e) = self.config.init() {
            tracing::warn!(error = %e, "Failed to prepare corpus directory");
        }
        self.cache.invalidate();
        self.process()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    pub fn source(&self) -> IndexSource {
        self.source
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn wordform_frequency(&self, top_n: usize) -> Vec<(String, usize)> {
        self.index.wordform_frequency(top_n)
    }

    pub fn lemma_frequency(&self, top_n: usize) -> Vec<(String, usize)> {
        self.index.lemma_frequency(top_n)
    }

    pub fn pos_frequency(&self, top_n: usize) -> Vec<(String, usize)> {
        self.index.pos_frequency(top_n)
    }

    pub fn word_info(&self, word: &str) -> WordInfo {
        self.index.word_info(word, &self.provider)
    }

    pub fn concordance(
        &self,
        keyword: &str,
        width: usize,
        pos_filter: Option<&str>,
    ) -> Vec<ConcordanceLine> {
        self.index.concordance(keyword, width, pos_filter)
    }

    pub fn raw_text(&self, filename: &str) -> String {
        self.index.raw_text(filename)
    }

    /// Replace the stored text of `filename` and drop the cache.
    ///
    /// Tokens are not reprocessed until the next reload. Returns false when
    /// the file is not part of the corpus.
    pub fn update_raw_text(&mut self, filename: &str, text: &str) -> bool {
        if !self.index.set_raw_text(filename, text) {
            tracing::warn!(file = filename, "Cannot update text of unknown file");
            return false;
        }
        self.cache.invalidate();
        true
    }

    pub fn processed_filenames(&self) -> Vec<String> {
        self.index.processed_filenames()
    }

    /// Write the index as XML. Returns false on any failure.
    pub fn export_xml(&self, path: &Path) -> bool {
        match xml::export(&self.index, path) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "XML export failed");
                false
            }
        }
    }

    /// Replace the index with the contents of an XML file.
    ///
    /// The file is parsed completely first; on failure the current index and
    /// cache are left untouched. On success the cache is deleted so a later
    /// open cannot bring back the replaced data.
    pub fn import_xml(&mut self, path: &Path) -> bool {
        match xml::import(path) {
            Ok(index) => {
                self.cache.invalidate();
                self.index = index;
                self.source = IndexSource::Xml;
                true
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "XML import failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Config) {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("corpus_texts");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("cake.txt"), "The cake was baked. We ate the cake.").unwrap();
        fs::write(dir.join("pie.txt"), "Apple pie and cake.").unwrap();
        let config = Config::new(Some(dir)).unwrap();
        (temp_dir, config)
    }

    #[test]
    fn test_open_processes_then_uses_cache() {
        let (_temp_dir, config) = setup();

        let first = Corpus::open(config.clone()).unwrap();
        assert_eq!(first.source(), IndexSource::Processed);
        assert!(first.cache().exists());
        assert_eq!(first.processed_filenames(), vec!["cake.txt", "pie.txt"]);

        let second = Corpus::open(config).unwrap();
        assert_eq!(second.source(), IndexSource::Cache);
        assert_eq!(second.index(), first.index());
    }

    #[test]
    fn test_open_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("fresh");
        let corpus = Corpus::open(Config::new(Some(dir.clone())).unwrap()).unwrap();
        assert!(dir.is_dir());
        assert!(corpus.index().is_empty());
        assert!(!corpus.cache().exists());
    }

    #[test]
    fn test_update_raw_text_drops_cache() {
        let (_temp_dir, config) = setup();
        let mut corpus = Corpus::open(config).unwrap();
        let tokens = corpus.index().token_count();

        assert!(corpus.update_raw_text("pie.txt", "Cherry pie and cake."));
        assert_eq!(corpus.raw_text("pie.txt"), "Cherry pie and cake.");
        assert_eq!(corpus.index().token_count(), tokens);
        assert!(!corpus.cache().exists());

        assert!(!corpus.update_raw_text("missing.txt", "text"));
    }

    #[test]
    fn test_reload_rebuilds_from_directory() {
        let (_temp_dir, config) = setup();
        let mut corpus = Corpus::open(config.clone()).unwrap();
        fs::write(config.corpus_dir.join("tart.txt"), "Lemon tart.").unwrap();

        assert!(corpus.reload());
        assert_eq!(corpus.source(), IndexSource::Processed);
        assert!(corpus.processed_filenames().contains(&"tart.txt".to_string()));
        assert!(corpus.cache().exists());
    }

    #[test]
    fn test_failed_import_keeps_state() {
        let (temp_dir, config) = setup();
        let mut corpus = Corpus::open(config).unwrap();
        let before = corpus.index().clone();

        let bad = temp_dir.path().join("bad.xml");
        fs::write(&bad, "<corpus><nothing/></corpus>").unwrap();
        assert!(!corpus.import_xml(&bad));
        assert_eq!(corpus.index(), &before);
        assert!(corpus.cache().exists());
        assert!(!corpus.import_xml(&temp_dir.path().join("absent.xml")));
    }

    #[test]
    fn test_import_replaces_state_and_cache() {
        let (temp_dir, config) = setup();
        let mut corpus = Corpus::open(config).unwrap();

        let path = temp_dir.path().join("other.xml");
        fs::write(
            &path,
            r#"<corpus><files><file name="x.txt" mtime="3">
                <raw_text>Scones</raw_text>
                <tokens><token>scones</token></tokens>
                <tagged_tokens><tagged_token token="scones" tag="NNS"/></tagged_tokens>
                <lemmas><lemma>scone</lemma></lemmas>
            </file></files></corpus>"#,
        )
        .unwrap();

        assert!(corpus.import_xml(&path));
        assert_eq!(corpus.source(), IndexSource::Xml);
        assert_eq!(corpus.processed_filenames(), vec!["x.txt"]);
        assert!(!corpus.cache().exists());
        assert_eq!(corpus.word_info("scones").lemma, "scone");
    }

    #[test]
    fn test_from_xml_skips_directory() {
        let (temp_dir, config) = setup();
        let exported = Corpus::open(config.clone()).unwrap();
        let path = temp_dir.path().join("export.xml");
        assert!(exported.export_xml(&path));
        fs::remove_file(&config.cache_path).unwrap();

        let corpus = Corpus::open_xml(config.clone(), &path).unwrap();
        assert_eq!(corpus.source(), IndexSource::Xml);
        assert_eq!(corpus.index(), exported.index());
        assert!(!config.cache_path.exists());

        assert!(Corpus::open_xml(config, &temp_dir.path().join("absent.xml")).is_err());
    }
}
