use crate::core::error::{Error, Result};
use crate::corpus::index::CorpusIndex;
use crate::corpus::occurrence::{Occurrence, RawDocument};
use crate::indexing::discovery::DocumentLoader;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Snapshot metadata
const META_TABLE: TableDefinition<&str, &str> = TableDefinition::new("meta");

/// Raw text and mtime per file, JSON encoded
const DOCUMENT_TABLE: TableDefinition<&str, &str> = TableDefinition::new("documents");

/// Occurrence stream as consecutive same-file segments, keyed by sequence number
const OCCURRENCE_TABLE: TableDefinition<u64, &str> = TableDefinition::new("occurrences");

const META_SCHEMA_VERSION_KEY: &str = "__concordex_schema_version__";

/// Bumped whenever the table layout or value encoding changes
pub const SCHEMA_VERSION: &str = "1";

#[derive(Debug, Serialize, Deserialize)]
struct DocumentRecord {
    text: String,
    mtime: f64,
}

/// A run of consecutive occurrences from one file
#[derive(Debug, Serialize, Deserialize)]
struct Segment {
    filename: String,
    /// (surface, tag, lemma)
    entries: Vec<(String, String, String)>,
}

/// Why a cache lookup did not produce an index
#[derive(Debug, Clone, PartialEq)]
pub enum MissReason {
    Absent,
    Corrupt(String),
    Empty,
    VersionMismatch(Option<String>),
    Stale(String),
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissReason::Absent => write!(f, "no cache file"),
            MissReason::Corrupt(e) => write!(f, "unreadable cache: {}", e),
            MissReason::Empty => write!(f, "cache holds no tokens"),
            MissReason::VersionMismatch(Some(v)) => {
                write!(f, "schema version {} (expected {})", v, SCHEMA_VERSION)
            }
            MissReason::VersionMismatch(None) => write!(f, "schema version missing"),
            MissReason::Stale(why) => write!(f, "stale: {}", why),
        }
    }
}

/// Outcome of [`CacheStore::load`]
#[derive(Debug)]
pub enum CacheLookup {
    Hit(CorpusIndex),
    Miss(MissReason),
}

/// On-disk snapshot of a processed corpus
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Persist `index`, replacing any previous snapshot.
    ///
    /// An index without tokens is never written; returns whether a snapshot
    /// was written. The new snapshot is built in a sibling temporary file and
    /// renamed into place after commit.
    pub fn save(&self, index: &CorpusIndex) -> Result<bool> {
        if index.token_count() == 0 {
            tracing::debug!("Nothing to cache, index has no tokens");
            return Ok(false);
        }

        let tmp_path = self.tmp_path();
        if tmp_path.exists() {
            std::fs::remove_file(&tmp_path)?;
        }

        if let Err(e) = self.write_and_replace(&tmp_path, index) {
            if let Err(cleanup) = std::fs::remove_file(&tmp_path) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %tmp_path.display(), error = %cleanup, "Failed to remove temporary cache");
                }
            }
            return Err(e);
        }
        tracing::info!(
            path = %self.path.display(),
            files = index.document_count(),
            tokens = index.token_count(),
            "Cache saved"
        );
        Ok(true)
    }

    /// Restore the index if the snapshot is readable and still matches the
    /// files in the loader's directory.
    pub fn load(&self, loader: &DocumentLoader) -> CacheLookup {
        if !self.exists() {
            return CacheLookup::Miss(MissReason::Absent);
        }

        let snapshot = match self.read_snapshot() {
            Ok(snapshot) => snapshot,
            Err(reason) => return CacheLookup::Miss(reason),
        };
        if snapshot.token_count() == 0 || snapshot.document_count() == 0 {
            return CacheLookup::Miss(MissReason::Empty);
        }
        if let Err(e) = snapshot.validate() {
            return CacheLookup::Miss(MissReason::Corrupt(e.to_string()));
        }
        if let Some(why) = staleness(&snapshot, loader) {
            return CacheLookup::Miss(MissReason::Stale(why));
        }

        tracing::info!(
            files = snapshot.document_count(),
            tokens = snapshot.token_count(),
            "Corpus restored from cache"
        );
        CacheLookup::Hit(snapshot)
    }

    /// Delete the snapshot. Returns true when a file was removed.
    pub fn invalidate(&self) -> bool {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Cache deleted");
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to delete cache");
                false
            }
        }
    }

    fn write_and_replace(&self, tmp_path: &Path, index: &CorpusIndex) -> Result<()> {
        {
            let db = Database::create(tmp_path)
                .map_err(|e| Error::Database(format!("Failed to create cache database: {}", e)))?;
            write_snapshot(&db, index)?;
        }
        std::fs::rename(tmp_path, &self.path)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_snapshot(&self) -> std::result::Result<CorpusIndex, MissReason> {
        let db = Database::open(&self.path).map_err(|e| MissReason::Corrupt(e.to_string()))?;

        match read_schema_version(&db) {
            Ok(Some(v)) if v == SCHEMA_VERSION => {}
            Ok(other) => return Err(MissReason::VersionMismatch(other)),
            Err(e) => return Err(MissReason::Corrupt(e.to_string())),
        }

        read_index(&db).map_err(|e| MissReason::Corrupt(e.to_string()))
    }
}

/// Describe why `snapshot` no longer matches the directory, if it doesn't
fn staleness(snapshot: &CorpusIndex, loader: &DocumentLoader) -> Option<String> {
    let live: BTreeSet<String> = match loader.list_supported() {
        Ok(files) => files.into_iter().collect(),
        Err(e) => return Some(e.to_string()),
    };
    let recorded = snapshot.mtimes();

    if !live.iter().eq(recorded.keys()) {
        let added = live.iter().filter(|f| !recorded.contains_key(*f)).count();
        let removed = recorded.keys().filter(|f| !live.contains(*f)).count();
        return Some(format!(
            "file set changed ({} added, {} removed)",
            added, removed
        ));
    }

    recorded.iter().find_map(|(file, recorded_mtime)| {
        (loader.mtime(file) > *recorded_mtime).then(|| format!("'{}' was modified", file))
    })
}

fn write_snapshot(db: &Database, index: &CorpusIndex) -> Result<()> {
    let write_txn = db
        .begin_write()
        .map_err(|e| Error::Database(format!("Failed to begin write transaction: {}", e)))?;

    {
        let mut meta = write_txn
            .open_table(META_TABLE)
            .map_err(|e| Error::Database(format!("Failed to open table: {}", e)))?;
        meta.insert(META_SCHEMA_VERSION_KEY, SCHEMA_VERSION)
            .map_err(|e| Error::Database(format!("Failed to store schema version: {}", e)))?;

        let mut documents = write_txn
            .open_table(DOCUMENT_TABLE)
            .map_err(|e| Error::Database(format!("Failed to open table: {}", e)))?;
        for doc in index.documents() {
            let record = DocumentRecord {
                text: doc.text.clone(),
                mtime: doc.mtime,
            };
            let json = serde_json::to_string(&record)
                .map_err(|e| Error::Database(format!("Failed to serialize document: {}", e)))?;
            documents
                .insert(doc.filename.as_str(), json.as_str())
                .map_err(|e| Error::Database(format!("Failed to insert document: {}", e)))?;
        }

        let mut occurrences = write_txn
            .open_table(OCCURRENCE_TABLE)
            .map_err(|e| Error::Database(format!("Failed to open table: {}", e)))?;
        for (seq, segment) in segments(index.occurrences()).iter().enumerate() {
            let json = serde_json::to_string(segment)
                .map_err(|e| Error::Database(format!("Failed to serialize occurrences: {}", e)))?;
            occurrences
                .insert(seq as u64, json.as_str())
                .map_err(|e| Error::Database(format!("Failed to insert occurrences: {}", e)))?;
        }
    }

    write_txn
        .commit()
        .map_err(|e| Error::Database(format!("Failed to commit transaction: {}", e)))?;
    Ok(())
}

fn read_schema_version(db: &Database) -> Result<Option<String>> {
    let read_txn = db
        .begin_read()
        .map_err(|e| Error::Database(format!("Failed to begin read transaction: {}", e)))?;
    let meta = read_txn
        .open_table(META_TABLE)
        .map_err(|e| Error::Database(format!("Failed to open table: {}", e)))?;
    let version = meta
        .get(META_SCHEMA_VERSION_KEY)
        .map_err(|e| Error::Database(format!("Failed to get schema version: {}", e)))?;
    Ok(version.map(|guard| guard.value().to_string()))
}

fn read_index(db: &Database) -> Result<CorpusIndex> {
    let read_txn = db
        .begin_read()
        .map_err(|e| Error::Database(format!("Failed to begin read transaction: {}", e)))?;

    let table = read_txn
        .open_table(DOCUMENT_TABLE)
        .map_err(|e| Error::Database(format!("Failed to open table: {}", e)))?;
    let mut documents = Vec::new();
    for entry in table
        .iter()
        .map_err(|e| Error::Database(format!("Failed to read documents: {}", e)))?
    {
        let (key, value) =
            entry.map_err(|e| Error::Database(format!("Failed to read document: {}", e)))?;
        let record: DocumentRecord = serde_json::from_str(value.value())
            .map_err(|e| Error::Database(format!("Failed to deserialize document: {}", e)))?;
        documents.push(RawDocument::new(key.value(), record.text, record.mtime));
    }

    let table = read_txn
        .open_table(OCCURRENCE_TABLE)
        .map_err(|e| Error::Database(format!("Failed to open table: {}", e)))?;
    let mut occurrences = Vec::new();
    for entry in table
        .iter()
        .map_err(|e| Error::Database(format!("Failed to read occurrences: {}", e)))?
    {
        let (_, value) =
            entry.map_err(|e| Error::Database(format!("Failed to read occurrences: {}", e)))?;
        let segment: Segment = serde_json::from_str(value.value())
            .map_err(|e| Error::Database(format!("Failed to deserialize occurrences: {}", e)))?;
        occurrences.extend(segment.entries.into_iter().map(|(surface, tag, lemma)| {
            Occurrence::new(surface, tag, lemma, segment.filename.as_str())
        }));
    }

    Ok(CorpusIndex::new(documents, occurrences))
}

/// Group the occurrence stream into runs of the same file, keeping order
fn segments(occurrences: &[Occurrence]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for occ in occurrences {
        let entry = (occ.surface.clone(), occ.tag.clone(), occ.lemma.clone());
        match segments.last_mut() {
            Some(segment) if segment.filename == occ.filename => segment.entries.push(entry),
            _ => segments.push(Segment {
                filename: occ.filename.clone(),
                entries: vec![entry],
            }),
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::extract::ExtractorRegistry;
    use crate::indexing::rules::{ProviderConfig, RuleBasedProvider};
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        dir: PathBuf,
        loader: DocumentLoader,
        store: CacheStore,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("corpus");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("cake.txt"), "The cake was baked. Bake another cake!").unwrap();
        fs::write(dir.join("bread.txt"), "Knead the dough, then rest it.").unwrap();

        let loader = DocumentLoader::new(&dir, ExtractorRegistry::with_defaults());
        let store = CacheStore::new(dir.join("corpus_cache.redb"));
        Fixture {
            _temp_dir: temp_dir,
            dir,
            loader,
            store,
        }
    }

    fn build(loader: &DocumentLoader) -> CorpusIndex {
        let provider = RuleBasedProvider::new(&ProviderConfig::default()).unwrap();
        CorpusIndex::build(loader.load(), &provider)
    }

    fn bump_mtime(path: &Path) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();
    }

    #[test]
    fn test_round_trip() {
        let fx = fixture();
        let index = build(&fx.loader);
        assert!(fx.store.save(&index).unwrap());
        assert!(fx.store.exists());
        assert!(!fx.store.tmp_path().exists());

        match fx.store.load(&fx.loader) {
            CacheLookup::Hit(restored) => assert_eq!(restored, index),
            CacheLookup::Miss(reason) => panic!("unexpected miss: {}", reason),
        }
    }

    #[test]
    fn test_failed_save_removes_temporary_file() {
        let fx = fixture();
        let index = build(&fx.loader);

        // A directory in the way makes the final rename fail
        fs::create_dir_all(fx.store.path()).unwrap();
        fs::write(fx.store.path().join("keep"), "x").unwrap();

        assert!(fx.store.save(&index).is_err());
        assert!(!fx.store.tmp_path().exists());
    }

    #[test]
    fn test_absent_is_miss() {
        let fx = fixture();
        assert!(matches!(
            fx.store.load(&fx.loader),
            CacheLookup::Miss(MissReason::Absent)
        ));
    }

    #[test]
    fn test_empty_index_not_saved() {
        let fx = fixture();
        assert!(!fx.store.save(&CorpusIndex::default()).unwrap());
        assert!(!fx.store.exists());
    }

    #[test]
    fn test_modified_file_is_stale() {
        let fx = fixture();
        fx.store.save(&build(&fx.loader)).unwrap();
        bump_mtime(&fx.dir.join("bread.txt"));
        assert!(matches!(
            fx.store.load(&fx.loader),
            CacheLookup::Miss(MissReason::Stale(_))
        ));
    }

    #[test]
    fn test_added_file_is_stale() {
        let fx = fixture();
        fx.store.save(&build(&fx.loader)).unwrap();
        fs::write(fx.dir.join("scones.txt"), "Warm scones.").unwrap();
        assert!(matches!(
            fx.store.load(&fx.loader),
            CacheLookup::Miss(MissReason::Stale(_))
        ));
    }

    #[test]
    fn test_removed_file_is_stale() {
        let fx = fixture();
        fx.store.save(&build(&fx.loader)).unwrap();
        fs::remove_file(fx.dir.join("cake.txt")).unwrap();
        assert!(matches!(
            fx.store.load(&fx.loader),
            CacheLookup::Miss(MissReason::Stale(_))
        ));
    }

    #[test]
    fn test_unrelated_file_keeps_cache_fresh() {
        let fx = fixture();
        fx.store.save(&build(&fx.loader)).unwrap();
        fs::write(fx.dir.join("notes.md"), "not part of the corpus").unwrap();
        assert!(matches!(fx.store.load(&fx.loader), CacheLookup::Hit(_)));
    }

    #[test]
    fn test_garbage_file_is_miss() {
        let fx = fixture();
        fs::write(fx.store.path(), "definitely not a database ".repeat(400)).unwrap();
        assert!(matches!(
            fx.store.load(&fx.loader),
            CacheLookup::Miss(MissReason::Corrupt(_))
        ));
    }

    #[test]
    fn test_schema_version_mismatch_is_miss() {
        let fx = fixture();
        fx.store.save(&build(&fx.loader)).unwrap();
        {
            let db = Database::open(fx.store.path()).unwrap();
            let write_txn = db.begin_write().unwrap();
            {
                let mut meta = write_txn.open_table(META_TABLE).unwrap();
                meta.insert(META_SCHEMA_VERSION_KEY, "0").unwrap();
            }
            write_txn.commit().unwrap();
        }
        assert_eq!(
            match fx.store.load(&fx.loader) {
                CacheLookup::Miss(reason) => Some(reason),
                CacheLookup::Hit(_) => None,
            },
            Some(MissReason::VersionMismatch(Some("0".to_string())))
        );
    }

    #[test]
    fn test_invalidate() {
        let fx = fixture();
        fx.store.save(&build(&fx.loader)).unwrap();
        assert!(fx.store.invalidate());
        assert!(!fx.store.exists());
        assert!(!fx.store.invalidate());
    }

    #[test]
    fn test_segments_keep_order() {
        let occs = vec![
            Occurrence::new("a", "DT", "a", "x.txt"),
            Occurrence::new("cake", "NN", "cake", "x.txt"),
            Occurrence::new("pie", "NN", "pie", "y.txt"),
            Occurrence::new("tart", "NN", "tart", "x.txt"),
        ];
        let segs = segments(&occs);
        let shape: Vec<(&str, usize)> = segs
            .iter()
            .map(|s| (s.filename.as_str(), s.entries.len()))
            .collect();
        assert_eq!(shape, vec![("x.txt", 2), ("y.txt", 1), ("x.txt", 1)]);
    }
}
