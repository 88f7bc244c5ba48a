use crate::core::error::Result;

/// Coarse word category used to pick lemmatization rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCategory {
    Adjective,
    Verb,
    Noun,
    Adverb,
}

impl WordCategory {
    /// Infer the category from a Penn Treebank tag's leading letter.
    /// Anything unrecognised counts as a noun.
    pub fn from_tag(tag: &str) -> Self {
        match tag.chars().next() {
            Some('J') => WordCategory::Adjective,
            Some('V') => WordCategory::Verb,
            Some('R') => WordCategory::Adverb,
            _ => WordCategory::Noun,
        }
    }
}

/// Tokenizer, tagger and lemmatizer used to annotate the corpus.
///
/// Implementations receive already-lowercased text.
pub trait NlpProvider {
    /// Split text into tokens, punctuation included
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;

    /// Tag a token sequence; the result has one tag per token
    fn pos_tag(&self, tokens: &[String]) -> Result<Vec<String>>;

    /// Base form of `token` read as a word of `category`
    fn lemmatize(&self, token: &str, category: WordCategory) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_tag() {
        assert_eq!(WordCategory::from_tag("JJR"), WordCategory::Adjective);
        assert_eq!(WordCategory::from_tag("VBD"), WordCategory::Verb);
        assert_eq!(WordCategory::from_tag("NNS"), WordCategory::Noun);
        assert_eq!(WordCategory::from_tag("RB"), WordCategory::Adverb);
        assert_eq!(WordCategory::from_tag("DT"), WordCategory::Noun);
        assert_eq!(WordCategory::from_tag(""), WordCategory::Noun);
    }
}
