use crate::core::error::{Error, Result};
use crate::corpus::occurrence::{is_alphabetic_token, Occurrence, RawDocument};
use crate::indexing::nlp::{NlpProvider, WordCategory};

/// One annotated token of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub token: String,
    pub tag: String,
    pub lemma: String,
}

/// Turns raw text into aligned (token, tag, lemma) triples
pub struct AnnotationPipeline<'a, P: NlpProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: NlpProvider + ?Sized> AnnotationPipeline<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Annotate one text: lowercase, tokenize, keep alphabetic tokens only,
    /// tag the survivors, then lemmatize each by its tag's category.
    pub fn annotate(&self, text: &str) -> Result<Vec<Annotation>> {
        let lowered = text.to_lowercase();
        let words: Vec<String> = self
            .provider
            .tokenize(&lowered)?
            .into_iter()
            .filter(|t| is_alphabetic_token(t))
            .collect();

        if words.is_empty() {
            return Ok(Vec::new());
        }

        let tags = self.provider.pos_tag(&words)?;
        if tags.len() != words.len() {
            return Err(Error::Annotation(format!(
                "Tagger returned {} tags for {} tokens",
                tags.len(),
                words.len()
            )));
        }

        words
            .into_iter()
            .zip(tags)
            .map(|(token, tag)| {
                let lemma = self
                    .provider
                    .lemmatize(&token, WordCategory::from_tag(&tag))?;
                Ok(Annotation { token, tag, lemma })
            })
            .collect()
    }

    /// Annotate a batch of documents into one occurrence sequence.
    ///
    /// A document that is empty or fails to annotate is logged and skipped;
    /// the rest of the batch still goes through.
    pub fn annotate_documents<'d>(
        &self,
        documents: impl IntoIterator<Item = &'d RawDocument>,
    ) -> Vec<Occurrence> {
        let mut occurrences = Vec::new();

        for doc in documents {
            if doc.text.trim().is_empty() {
                tracing::warn!(file = %doc.filename, "Empty document, skipped");
                continue;
            }
            match self.annotate(&doc.text) {
                Ok(annotations) => {
                    tracing::debug!(file = %doc.filename, tokens = annotations.len(), "Annotated");
                    occurrences.extend(annotations.into_iter().map(|a| {
                        Occurrence::new(a.token, a.tag, a.lemma, doc.filename.as_str())
                    }));
                }
                Err(e) => {
                    tracing::warn!(file = %doc.filename, error = %e, "Failed to annotate document");
                }
            }
        }

        tracing::info!(tokens = occurrences.len(), "Corpus annotated");
        occurrences
    }
}
