use serde::{Deserialize, Serialize};

/// Modification time recorded when a file's timestamp cannot be read.
/// Any readable timestamp is newer, so the file gets reprocessed.
pub const UNKNOWN_MTIME: f64 = 0.0;

/// A source document and the text extracted from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    /// File name relative to the corpus directory (unique key)
    pub filename: String,
    /// Extracted plain text
    pub text: String,
    /// Modification time in seconds since the Unix epoch
    pub mtime: f64,
}

impl RawDocument {
    pub fn new(filename: impl Into<String>, text: impl Into<String>, mtime: f64) -> Self {
        Self {
            filename: filename.into(),
            text: text.into(),
            mtime,
        }
    }
}

/// One surviving token of the corpus together with its annotations.
///
/// The corpus keeps a single ordered sequence of these, so the surface form,
/// tag, lemma and source file of position `i` can never drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Lowercased alphabetic surface form
    pub surface: String,
    /// Part-of-speech tag
    pub tag: String,
    /// Dictionary base form
    pub lemma: String,
    /// Source file
    pub filename: String,
    /// Character offset of this occurrence in the source raw text.
    /// Resolved by the index, never persisted.
    #[serde(skip)]
    pub offset: Option<usize>,
}

impl Occurrence {
    pub fn new(
        surface: impl Into<String>,
        tag: impl Into<String>,
        lemma: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            surface: surface.into(),
            tag: tag.into(),
            lemma: lemma.into(),
            filename: filename.into(),
            offset: None,
        }
    }

    pub fn token(&self) -> Token<'_> {
        Token {
            surface: &self.surface,
            filename: &self.filename,
        }
    }

    pub fn tagged_token(&self) -> TaggedToken<'_> {
        TaggedToken {
            surface: &self.surface,
            tag: &self.tag,
            filename: &self.filename,
        }
    }

    pub fn lemma_token(&self) -> LemmaToken<'_> {
        LemmaToken {
            lemma: &self.lemma,
            filename: &self.filename,
        }
    }
}

/// Word-form view of an occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub surface: &'a str,
    pub filename: &'a str,
}

/// Tagged view of an occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedToken<'a> {
    pub surface: &'a str,
    pub tag: &'a str,
    pub filename: &'a str,
}

/// Lemma view of an occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LemmaToken<'a> {
    pub lemma: &'a str,
    pub filename: &'a str,
}

/// Returns true for a non-empty token made only of alphabetic characters
pub fn is_alphabetic_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}
