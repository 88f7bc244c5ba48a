//! Mapping filtered tokens back to character positions in raw text.
//!
//! The annotation pipeline drops punctuation and numerals, so the `i`-th
//! token of a file is not the `i`-th word of its text. A token is located by
//! its occurrence rank `k` (how many earlier tokens of the same file share its
//! surface form): it sits at the `k`-th whole-word occurrence of that surface
//! in the text, compared case-insensitively. When the text has fewer
//! occurrences than that, the first one is used.
//!
//! A whole-word match of an alphabetic surface is exactly a maximal run of
//! alphanumeric characters, so one scan over the text collects every
//! candidate position for every surface at once.

use std::collections::HashMap;

use super::occurrence::Occurrence;

/// Whole-word positions of every alphanumeric run in a text
#[derive(Debug, Default)]
pub struct WordPositions {
    by_word: HashMap<String, Vec<usize>>,
}

impl WordPositions {
    /// Scan `text` once, recording the character offset of each run
    pub fn scan(text: &str) -> Self {
        let mut by_word: HashMap<String, Vec<usize>> = HashMap::new();
        let mut current = String::new();
        let mut start = 0;

        for (idx, ch) in text.chars().enumerate() {
            if ch.is_alphanumeric() {
                if current.is_empty() {
                    start = idx;
                }
                current.push(lower_char(ch));
            } else if !current.is_empty() {
                by_word.entry(std::mem::take(&mut current)).or_default().push(start);
            }
        }
        if !current.is_empty() {
            by_word.entry(current).or_default().push(start);
        }

        Self { by_word }
    }

    /// Offset of the `rank`-th (0-based) occurrence of `word`, falling back
    /// to the first occurrence. `None` when the word never occurs.
    pub fn nth(&self, word: &str, rank: usize) -> Option<usize> {
        let positions = self.by_word.get(word)?;
        positions.get(rank).or_else(|| positions.first()).copied()
    }

    /// Number of whole-word occurrences of `word`
    pub fn count(&self, word: &str) -> usize {
        self.by_word.get(word).map_or(0, Vec::len)
    }
}

/// Hands out offsets for one file's occurrences in stream order
struct FileCursor {
    positions: WordPositions,
    ranks: HashMap<String, usize>,
}

impl FileCursor {
    fn new(text: &str) -> Self {
        Self {
            positions: WordPositions::scan(text),
            ranks: HashMap::new(),
        }
    }

    fn next(&mut self, surface: &str) -> Option<usize> {
        let rank = self.ranks.entry(surface.to_string()).or_insert(0);
        let offset = self.positions.nth(surface, *rank);
        *rank += 1;
        offset
    }
}

/// Resolve offsets for the occurrences of one file against its raw text.
///
/// `occurrences` may contain entries of other files; they are left alone.
pub fn assign_offsets<'a>(
    text: &str,
    filename: &str,
    occurrences: impl IntoIterator<Item = &'a mut Occurrence>,
) {
    let mut cursor = FileCursor::new(text);
    for occ in occurrences {
        if occ.filename == filename {
            occ.offset = cursor.next(&occ.surface);
        }
    }
}

/// Resolve offsets for every occurrence in one pass.
///
/// `texts` yields `(filename, raw text)` pairs; occurrences of files without
/// a text get no offset.
pub fn assign_all_offsets<'t>(
    texts: impl IntoIterator<Item = (&'t str, &'t str)>,
    occurrences: &mut [Occurrence],
) {
    let mut cursors: HashMap<&str, FileCursor> = texts
        .into_iter()
        .map(|(filename, text)| (filename, FileCursor::new(text)))
        .collect();

    for occ in occurrences.iter_mut() {
        occ.offset = cursors
            .get_mut(occ.filename.as_str())
            .and_then(|cursor| cursor.next(&occ.surface));
    }
}

/// Lowercase a single character without changing the character count
fn lower_char(ch: char) -> char {
    let mut lower = ch.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(single), None) => single,
        _ => ch,
    }
}
