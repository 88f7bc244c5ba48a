use std::collections::{BTreeMap, HashMap};

use crate::core::error::{Error, Result};
use crate::indexing::annotate::AnnotationPipeline;
use crate::indexing::nlp::{NlpProvider, WordCategory};

use super::concordance::{self, ConcordanceLine};
use super::occurrence::{
    is_alphabetic_token, LemmaToken, Occurrence, RawDocument, TaggedToken, Token,
};
use super::position::{assign_all_offsets, assign_offsets};
use super::word_info::WordInfo;

/// Tag used when the provider cannot tag a lookup word
const FALLBACK_TAG: &str = "NN";

/// Raw documents plus the annotated occurrence sequence built from them.
///
/// An index is always replaced wholesale; the only in-place mutation is
/// swapping a document's raw text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusIndex {
    documents: BTreeMap<String, RawDocument>,
    occurrences: Vec<Occurrence>,
}

impl CorpusIndex {
    /// Assemble an index and resolve every occurrence's raw-text offset
    pub fn new(
        documents: impl IntoIterator<Item = RawDocument>,
        occurrences: Vec<Occurrence>,
    ) -> Self {
        let documents = documents
            .into_iter()
            .map(|doc| (doc.filename.clone(), doc))
            .collect();
        let mut index = Self {
            documents,
            occurrences,
        };
        index.resolve_offsets();
        index
    }

    /// Annotate `documents` with `provider` and index the result
    pub fn build<P: NlpProvider + ?Sized>(documents: Vec<RawDocument>, provider: &P) -> Self {
        let occurrences = AnnotationPipeline::new(provider).annotate_documents(&documents);
        Self::new(documents, occurrences)
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.occurrences.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.occurrences.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Documents in filename order
    pub fn documents(&self) -> impl Iterator<Item = &RawDocument> {
        self.documents.values()
    }

    pub fn document(&self, filename: &str) -> Option<&RawDocument> {
        self.documents.get(filename)
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    /// Recorded modification time per file
    pub fn mtimes(&self) -> BTreeMap<String, f64> {
        self.documents
            .values()
            .map(|doc| (doc.filename.clone(), doc.mtime))
            .collect()
    }

    pub fn tokens(&self) -> impl Iterator<Item = Token<'_>> {
        self.occurrences.iter().map(Occurrence::token)
    }

    pub fn tagged_tokens(&self) -> impl Iterator<Item = TaggedToken<'_>> {
        self.occurrences.iter().map(Occurrence::tagged_token)
    }

    pub fn lemmas(&self) -> impl Iterator<Item = LemmaToken<'_>> {
        self.occurrences.iter().map(Occurrence::lemma_token)
    }

    /// Occurrences of one file, in stream order
    pub fn occurrences_of<'a>(&'a self, filename: &'a str) -> impl Iterator<Item = &'a Occurrence> {
        self.occurrences.iter().filter(move |o| o.filename == filename)
    }

    /// Most frequent word forms
    pub fn wordform_frequency(&self, top_n: usize) -> Vec<(String, usize)> {
        rank(self.occurrences.iter().map(|o| o.surface.as_str()), top_n)
    }

    /// Most frequent lemmas
    pub fn lemma_frequency(&self, top_n: usize) -> Vec<(String, usize)> {
        rank(self.occurrences.iter().map(|o| o.lemma.as_str()), top_n)
    }

    /// Most frequent POS tags
    pub fn pos_frequency(&self, top_n: usize) -> Vec<(String, usize)> {
        rank(self.occurrences.iter().map(|o| o.tag.as_str()), top_n)
    }

    /// Lemma, tag and source file of the first occurrence of `word`.
    ///
    /// Words outside the corpus are tagged and lemmatized on the fly and the
    /// result is flagged as inferred. Never fails.
    pub fn word_info<P: NlpProvider + ?Sized>(&self, word: &str, provider: &P) -> WordInfo {
        let wordform = word.trim().to_lowercase();

        if let Some(occ) = self.occurrences.iter().find(|o| o.surface == wordform) {
            return WordInfo {
                lemma: occ.lemma.clone(),
                tag: occ.tag.clone(),
                source_file: Some(occ.filename.clone()),
                inferred: false,
                wordform,
            };
        }

        let tag = match provider.pos_tag(std::slice::from_ref(&wordform)) {
            Ok(tags) => tags.into_iter().next().filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(word = %wordform, error = %e, "Failed to tag lookup word");
                None
            }
        }
        .unwrap_or_else(|| FALLBACK_TAG.to_string());

        let lemma = provider
            .lemmatize(&wordform, WordCategory::from_tag(&tag))
            .unwrap_or_else(|e| {
                tracing::warn!(word = %wordform, error = %e, "Failed to lemmatize lookup word");
                wordform.clone()
            });

        WordInfo {
            lemma,
            tag,
            source_file: None,
            inferred: true,
            wordform,
        }
    }

    /// Raw text of `filename`, or a placeholder message when it is unknown
    pub fn raw_text(&self, filename: &str) -> String {
        match self.documents.get(filename) {
            Some(doc) => doc.text.clone(),
            None => format!("Text of file '{filename}' not found in the loaded corpus."),
        }
    }

    /// Replace the raw text of a known file and re-resolve its offsets.
    ///
    /// Tokens are not re-annotated. Returns false for unknown files.
    pub fn set_raw_text(&mut self, filename: &str, text: impl Into<String>) -> bool {
        let Some(doc) = self.documents.get_mut(filename) else {
            return false;
        };
        doc.text = text.into();
        assign_offsets(&doc.text, filename, self.occurrences.iter_mut());
        true
    }

    /// Names of files with extracted text, sorted
    pub fn processed_filenames(&self) -> Vec<String> {
        self.documents.keys().cloned().collect()
    }

    /// Keyword-in-context lines, see [`concordance::concordance`]
    pub fn concordance(
        &self,
        keyword: &str,
        width: usize,
        pos_filter: Option<&str>,
    ) -> Vec<ConcordanceLine> {
        concordance::concordance(self, keyword, width, pos_filter)
    }

    /// Check that every occurrence is well formed and belongs to a known file
    pub fn validate(&self) -> Result<()> {
        for (i, occ) in self.occurrences.iter().enumerate() {
            if !self.documents.contains_key(&occ.filename) {
                return Err(Error::Alignment(format!(
                    "Occurrence {} refers to unknown file '{}'",
                    i, occ.filename
                )));
            }
            if !is_alphabetic_token(&occ.surface) || occ.tag.is_empty() || occ.lemma.is_empty() {
                return Err(Error::Alignment(format!(
                    "Occurrence {} in '{}' is malformed: {:?}/{:?}/{:?}",
                    i, occ.filename, occ.surface, occ.tag, occ.lemma
                )));
            }
        }
        Ok(())
    }

    fn resolve_offsets(&mut self) {
        assign_all_offsets(
            self.documents
                .values()
                .map(|doc| (doc.filename.as_str(), doc.text.as_str())),
            &mut self.occurrences,
        );
    }
}

/// Count items and rank them by descending count; ties keep first-seen order
fn rank<'a>(items: impl Iterator<Item = &'a str>, top_n: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for item in items {
        match slots.get(item) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                slots.insert(item, counts.len());
                counts.push((item, 1));
            }
        }
    }

    // Stable sort keeps first-encountered order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(top_n)
        .map(|(item, count)| (item.to_string(), count))
        .collect()
}
