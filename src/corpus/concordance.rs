use std::collections::{BTreeSet, HashMap};

use super::index::CorpusIndex;

/// Marker wrapped around both context sides
pub const ELLIPSIS: &str = "...";

/// One keyword-in-context line
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConcordanceLine {
    // Field order is the sort order: by file, then by left context.
    pub filename: String,
    pub left: String,
    pub keyword: String,
    pub right: String,
}

impl ConcordanceLine {
    /// Render as a single aligned line
    pub fn render(&self, left_width: usize) -> String {
        format!(
            "{:>width$} [{}] {}  ({})",
            self.left,
            self.keyword,
            self.right,
            self.filename,
            width = left_width
        )
    }
}

/// Keyword-in-context lines for `keyword`.
///
/// Matching is on the lowercased surface form; `pos_filter`, when given,
/// keeps only occurrences whose tag starts with it (so `NN` also selects
/// `NNS`, `NNP`, ...). Each hit contributes `width` characters of raw text
/// on either side. Lines are deduplicated and sorted by file and left
/// context. An empty keyword or corpus yields nothing.
pub fn concordance(
    index: &CorpusIndex,
    keyword: &str,
    width: usize,
    pos_filter: Option<&str>,
) -> Vec<ConcordanceLine> {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() || index.token_count() == 0 {
        return Vec::new();
    }
    let pos_filter = pos_filter.map(str::trim).filter(|f| !f.is_empty());

    let mut lines = BTreeSet::new();
    let mut texts: HashMap<&str, Vec<char>> = HashMap::new();
    for occ in index.occurrences() {
        if occ.surface != keyword {
            continue;
        }
        if pos_filter.is_some_and(|prefix| !occ.tag.starts_with(prefix)) {
            continue;
        }

        let Some(doc) = index.document(&occ.filename) else {
            tracing::warn!(file = %occ.filename, "No raw text for occurrence, skipped");
            continue;
        };
        let Some(offset) = occ.offset else {
            tracing::debug!(file = %occ.filename, word = %occ.surface, "Occurrence not found in raw text");
            continue;
        };

        let chars = texts
            .entry(doc.filename.as_str())
            .or_insert_with(|| doc.text.chars().collect());
        let len = occ.surface.chars().count();
        if offset.saturating_add(len) > chars.len() {
            tracing::warn!(file = %occ.filename, offset, "Occurrence offset past end of text, skipped");
            continue;
        }

        let start = offset.saturating_sub(width);
        let end = offset.saturating_add(len).saturating_add(width).min(chars.len());
        lines.insert(ConcordanceLine {
            filename: occ.filename.clone(),
            left: format!("{ELLIPSIS}{}", collapse_whitespace(&chars[start..offset])),
            keyword: chars[offset..offset + len].iter().collect(),
            right: format!("{}{ELLIPSIS}", collapse_whitespace(&chars[offset + len..end])),
        });
    }

    lines.into_iter().collect()
}

/// Join whitespace-separated pieces with single spaces
fn collapse_whitespace(chars: &[char]) -> String {
    let text: String = chars.iter().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
