//! Human-readable names for Penn Treebank tags.

use std::collections::HashMap;
use std::sync::LazyLock;

static DESCRIPTIONS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("CC", "Coordinating conjunction"),
        ("CD", "Cardinal number"),
        ("DT", "Determiner"),
        ("EX", "Existential there"),
        ("FW", "Foreign word"),
        ("IN", "Preposition or subordinating conjunction"),
        ("JJ", "Adjective"),
        ("JJR", "Adjective, comparative"),
        ("JJS", "Adjective, superlative"),
        ("LS", "List item marker"),
        ("MD", "Modal"),
        ("NN", "Noun, singular or mass"),
        ("NNS", "Noun, plural"),
        ("NNP", "Proper noun, singular"),
        ("NNPS", "Proper noun, plural"),
        ("PDT", "Predeterminer"),
        ("POS", "Possessive ending"),
        ("PRP", "Personal pronoun"),
        ("PRP$", "Possessive pronoun"),
        ("RB", "Adverb"),
        ("RBR", "Adverb, comparative"),
        ("RBS", "Adverb, superlative"),
        ("RP", "Particle"),
        ("SYM", "Symbol"),
        ("TO", "to"),
        ("UH", "Interjection"),
        ("VB", "Verb, base form"),
        ("VBD", "Verb, past tense"),
        ("VBG", "Verb, gerund or present participle"),
        ("VBN", "Verb, past participle"),
        ("VBP", "Verb, non-3rd person singular present"),
        ("VBZ", "Verb, 3rd person singular present"),
        ("WDT", "Wh-determiner"),
        ("WP", "Wh-pronoun"),
        ("WP$", "Possessive wh-pronoun"),
        ("WRB", "Wh-adverb"),
    ]
    .into_iter()
    .collect()
});

/// Description of `tag`, or the tag itself when it is not a known tag
pub fn describe(tag: &str) -> &str {
    DESCRIPTIONS.get(tag).copied().unwrap_or(tag)
}

/// All known tags with their descriptions, sorted by tag
pub fn all() -> Vec<(&'static str, &'static str)> {
    let mut tags: Vec<_> = DESCRIPTIONS.iter().map(|(t, d)| (*t, *d)).collect();
    tags.sort_unstable();
    tags
}
