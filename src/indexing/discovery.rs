use crate::core::error::{Error, Result};
use crate::corpus::occurrence::{RawDocument, UNKNOWN_MTIME};
use crate::indexing::extract::ExtractorRegistry;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Extensions accepted into the corpus
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["txt", "pdf", "docx", "rtf"];

/// Check if a file is a supported corpus document based on extension
pub fn is_supported_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// List supported files directly inside `dir`, sorted by name.
///
/// Subdirectories are not descended into.
pub fn list_supported(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(Error::Config(format!(
            "Corpus directory does not exist: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .max_depth(Some(1))
        .build();

    for result in walker {
        match result {
            Ok(entry) => {
                let path = entry.path();
                if !entry.file_type().is_some_and(|t| t.is_file()) || !is_supported_file(path) {
                    continue;
                }
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    files.push(name.to_string());
                }
            }
            Err(err) => {
                // Log but continue - some files might be inaccessible
                tracing::warn!(error = %err, "Failed to access corpus entry");
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Get file modification time as fractional seconds since the Unix epoch
pub fn get_file_modified_time(path: &Path) -> Result<f64> {
    let modified = std::fs::metadata(path)?.modified()?;
    let duration = modified
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| Error::Io(std::io::Error::other(format!(
            "Failed to get modification time: {}",
            e
        ))))?;
    Ok(duration.as_secs_f64())
}

/// Modification time of `file` in `dir`, or [`UNKNOWN_MTIME`] when it
/// cannot be read
pub fn file_mtime(dir: &Path, file: &str) -> f64 {
    match get_file_modified_time(&dir.join(file)) {
        Ok(mtime) => mtime,
        Err(e) => {
            tracing::warn!(file, error = %e, "Could not read modification time");
            UNKNOWN_MTIME
        }
    }
}

/// Reads the documents of one corpus directory
pub struct DocumentLoader {
    dir: PathBuf,
    extractors: ExtractorRegistry,
}

impl DocumentLoader {
    pub fn new(dir: impl Into<PathBuf>, extractors: ExtractorRegistry) -> Self {
        Self {
            dir: dir.into(),
            extractors,
        }
    }

    /// Supported file names in the corpus directory
    pub fn list_supported(&self) -> Result<Vec<String>> {
        list_supported(&self.dir)
    }

    pub fn mtime(&self, file: &str) -> f64 {
        file_mtime(&self.dir, file)
    }

    /// Plain text of `file`, empty when it cannot be extracted
    pub fn extract_text(&self, file: &str) -> String {
        self.extractors.extract(&self.dir.join(file))
    }

    /// Read every supported document from scratch.
    ///
    /// Files that yield no text are skipped with a warning.
    pub fn load(&self) -> Vec<RawDocument> {
        tracing::info!(dir = %self.dir.display(), "Loading corpus");

        let files = match self.list_supported() {
            Ok(files) => files,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list corpus directory");
                return Vec::new();
            }
        };

        if files.is_empty() {
            tracing::warn!(
                dir = %self.dir.display(),
                "No supported files (.txt, .pdf, .docx, .rtf) found"
            );
            return Vec::new();
        }

        let mut documents = Vec::with_capacity(files.len());
        for file in files {
            let text = self.extract_text(&file);
            if text.is_empty() {
                tracing::warn!(file = %file, "Could not extract text, file skipped");
                continue;
            }
            let mtime = self.mtime(&file);
            tracing::debug!(file = %file, chars = text.chars().count(), "Loaded document");
            documents.push(RawDocument::new(file, text, mtime));
        }

        if documents.is_empty() {
            tracing::warn!("No text could be loaded from any file");
        }
        documents
    }
}
