use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Marker appended to tags that were guessed for words outside the corpus
pub const INFERRED_MARKER: &str = "(inferred)";

/// Placeholder for keys missing from an imported word-info record
pub const UNSPECIFIED: &str = "(unspecified)";

/// Result of a single-word lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordInfo {
    /// The word as asked for, lowercased
    pub wordform: String,
    pub lemma: String,
    pub tag: String,
    /// File of the first corpus occurrence; `None` for inferred results
    pub source_file: Option<String>,
    /// True when the word is not in the corpus and was tagged on the fly
    pub inferred: bool,
}

impl WordInfo {
    /// Tag as shown to users, with the inferred marker when applicable
    pub fn display_tag(&self) -> String {
        if self.inferred {
            format!("{} {}", self.tag, INFERRED_MARKER)
        } else {
            self.tag.clone()
        }
    }

    pub fn to_record(&self) -> WordInfoRecord {
        WordInfoRecord {
            wordform: self.wordform.clone(),
            lemma: self.lemma.clone(),
            pos_tag: self.display_tag(),
        }
    }
}

/// JSON interchange form of a word lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordInfoRecord {
    #[serde(default = "unspecified")]
    pub wordform: String,
    #[serde(default = "unspecified")]
    pub lemma: String,
    #[serde(default = "unspecified")]
    pub pos_tag: String,
}

fn unspecified() -> String {
    UNSPECIFIED.to_string()
}

impl WordInfoRecord {
    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Parsing(format!("Failed to serialize word info: {}", e)))
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Parsing(format!("Failed to deserialize word info: {}", e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// True when the tag carries the inferred marker
    pub fn is_inferred(&self) -> bool {
        self.pos_tag.contains(INFERRED_MARKER)
    }
}
