use crate::core::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Anything that can turn a document file into plain text
pub trait TextExtractor {
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Reads `.txt` files as UTF-8
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Pulls paragraph text out of `.docx` files
#[derive(Debug, Default)]
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        let docx = docx_rs::read_docx(&bytes).map_err(|e| {
            Error::Extraction(format!("Failed to parse {}: {:?}", path.display(), e))
        })?;

        let mut text = String::new();
        for child in &docx.document.children {
            if let docx_rs::DocumentChild::Paragraph(para) = child {
                text.push_str(&paragraph_text(para));
                text.push('\n');
            }
        }
        Ok(text)
    }
}

/// Page text of `.pdf` files, one line break after each page
#[derive(Debug, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        // The PDF backend panics on some malformed files
        let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(&bytes))
            .map_err(|_| {
                Error::Extraction(format!("PDF parser crashed on {}", path.display()))
            })?
            .map_err(|e| {
                Error::Extraction(format!("Failed to parse {}: {:?}", path.display(), e))
            })?;

        let mut text = String::new();
        for page in pages.iter().filter(|p| !p.is_empty()) {
            text.push_str(page);
            text.push('\n');
        }
        Ok(text)
    }
}

/// Plain text of `.rtf` files; invalid UTF-8 is replaced rather than rejected
#[derive(Debug, Default)]
pub struct RtfExtractor;

impl TextExtractor for RtfExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        let document = std::panic::catch_unwind(|| {
            rtf_parser::document::RtfDocument::try_from(content.as_ref())
        })
        .map_err(|_| Error::Extraction(format!("RTF parser crashed on {}", path.display())))?
        .map_err(|e| Error::Extraction(format!("Failed to parse {}: {:?}", path.display(), e)))?;
        Ok(document.get_text())
    }
}

/// Concatenate the text runs of one paragraph
fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut parts = Vec::new();
    for child in &para.children {
        if let docx_rs::ParagraphChild::Run(run) = child {
            for rc in &run.children {
                if let docx_rs::RunChild::Text(t) = rc {
                    parts.push(t.text.as_str());
                }
            }
        }
    }
    parts.concat()
}

/// Extractors keyed by lowercase file extension
pub struct ExtractorRegistry {
    by_extension: HashMap<String, Box<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    /// Registry without any extractor
    pub fn empty() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    /// Registry with the built-in `.txt`, `.pdf`, `.docx` and `.rtf` extractors
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("txt", PlainTextExtractor);
        registry.register("pdf", PdfExtractor);
        registry.register("docx", DocxExtractor);
        registry.register("rtf", RtfExtractor);
        registry
    }

    /// Add or replace the extractor for an extension
    pub fn register(&mut self, extension: &str, extractor: impl TextExtractor + 'static) {
        self.by_extension
            .insert(extension.to_lowercase(), Box::new(extractor));
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.by_extension.contains_key(&extension.to_lowercase())
    }

    /// Extract text from `path`.
    ///
    /// Missing extractors and extraction failures are logged and produce an
    /// empty string so that one bad file never stops a batch.
    pub fn extract(&self, path: &Path) -> String {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let Some(extractor) = self.by_extension.get(&extension) else {
            tracing::warn!(
                file = %path.display(),
                extension = %extension,
                "No text extractor available, file skipped"
            );
            return String::new();
        };

        match extractor.extract(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Failed to extract text");
                String::new()
            }
        }
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
