//! Built-in rule-based NLP provider.
//!
//! Tokenizes on whitespace and punctuation (splitting `n't` and `'s` style
//! clitics off their host word), tags with the Penn Treebank tagset using a
//! closed-class lexicon, irregular forms, suffix rules and a few left-context
//! rules, and lemmatizes by category-specific suffix stripping.

use crate::core::error::{Error, Result};
use crate::indexing::nlp::{NlpProvider, WordCategory};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static CLOSED_CLASS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("the", "DT"), ("a", "DT"), ("an", "DT"), ("this", "DT"), ("that", "DT"),
        ("these", "DT"), ("those", "DT"), ("every", "DT"), ("each", "DT"), ("some", "DT"),
        ("any", "DT"), ("no", "DT"), ("all", "DT"), ("both", "DT"), ("another", "DT"),
        ("and", "CC"), ("or", "CC"), ("but", "CC"), ("nor", "CC"), ("yet", "CC"),
        ("of", "IN"), ("in", "IN"), ("on", "IN"), ("at", "IN"), ("by", "IN"),
        ("for", "IN"), ("with", "IN"), ("from", "IN"), ("into", "IN"), ("onto", "IN"),
        ("over", "IN"), ("under", "IN"), ("about", "IN"), ("after", "IN"), ("before", "IN"),
        ("between", "IN"), ("through", "IN"), ("during", "IN"), ("without", "IN"),
        ("within", "IN"), ("against", "IN"), ("among", "IN"), ("upon", "IN"), ("than", "IN"),
        ("as", "IN"), ("if", "IN"), ("because", "IN"), ("while", "IN"), ("although", "IN"),
        ("since", "IN"), ("until", "IN"),
        ("to", "TO"),
        ("i", "PRP"), ("you", "PRP"), ("he", "PRP"), ("she", "PRP"), ("it", "PRP"),
        ("we", "PRP"), ("they", "PRP"), ("me", "PRP"), ("him", "PRP"), ("us", "PRP"),
        ("them", "PRP"), ("myself", "PRP"), ("itself", "PRP"), ("themselves", "PRP"),
        ("my", "PRP$"), ("your", "PRP$"), ("his", "PRP$"), ("her", "PRP$"), ("its", "PRP$"),
        ("our", "PRP$"), ("their", "PRP$"),
        ("can", "MD"), ("could", "MD"), ("will", "MD"), ("would", "MD"), ("shall", "MD"),
        ("should", "MD"), ("may", "MD"), ("might", "MD"), ("must", "MD"),
        ("not", "RB"), ("very", "RB"), ("too", "RB"), ("also", "RB"), ("just", "RB"),
        ("then", "RB"), ("now", "RB"), ("here", "RB"), ("so", "RB"), ("again", "RB"),
        ("often", "RB"), ("never", "RB"), ("always", "RB"), ("soon", "RB"),
        ("there", "EX"),
        ("which", "WDT"), ("who", "WP"), ("whom", "WP"), ("what", "WP"), ("whose", "WP$"),
        ("where", "WRB"), ("when", "WRB"), ("why", "WRB"), ("how", "WRB"),
        ("oh", "UH"), ("yes", "UH"), ("hello", "UH"),
    ]
    .into_iter()
    .collect()
});

/// Irregular forms: word -> (tag, lemma)
static IRREGULAR: LazyLock<HashMap<&'static str, (&'static str, &'static str)>> =
    LazyLock::new(|| {
        [
            ("be", ("VB", "be")), ("is", ("VBZ", "be")), ("are", ("VBP", "be")),
            ("am", ("VBP", "be")), ("was", ("VBD", "be")), ("were", ("VBD", "be")),
            ("been", ("VBN", "be")), ("being", ("VBG", "be")),
            ("have", ("VBP", "have")), ("has", ("VBZ", "have")), ("had", ("VBD", "have")),
            ("do", ("VBP", "do")), ("does", ("VBZ", "do")), ("did", ("VBD", "do")),
            ("done", ("VBN", "do")),
            ("went", ("VBD", "go")), ("gone", ("VBN", "go")), ("ate", ("VBD", "eat")),
            ("eaten", ("VBN", "eat")), ("made", ("VBD", "make")), ("took", ("VBD", "take")),
            ("taken", ("VBN", "take")), ("gave", ("VBD", "give")), ("given", ("VBN", "give")),
            ("came", ("VBD", "come")), ("saw", ("VBD", "see")), ("seen", ("VBN", "see")),
            ("knew", ("VBD", "know")), ("known", ("VBN", "know")), ("got", ("VBD", "get")),
            ("found", ("VBD", "find")), ("thought", ("VBD", "think")), ("told", ("VBD", "tell")),
            ("said", ("VBD", "say")), ("began", ("VBD", "begin")), ("left", ("VBD", "leave")),
            ("children", ("NNS", "child")), ("men", ("NNS", "man")), ("women", ("NNS", "woman")),
            ("feet", ("NNS", "foot")), ("teeth", ("NNS", "tooth")), ("mice", ("NNS", "mouse")),
            ("geese", ("NNS", "goose")), ("people", ("NNS", "person")),
            ("better", ("JJR", "good")), ("best", ("JJS", "good")), ("worse", ("JJR", "bad")),
            ("worst", ("JJS", "bad")), ("more", ("JJR", "more")), ("most", ("JJS", "most")),
        ]
        .into_iter()
        .collect()
    });

/// Suffixes that mark an adjective
const ADJECTIVE_SUFFIXES: [&str; 8] = ["ous", "ful", "able", "ible", "ive", "less", "ical", "ish"];

/// Plural/third-person endings that drop `es` rather than `s`
const SIBILANT_ENDINGS: [&str; 5] = ["ches", "shes", "sses", "xes", "zes"];

/// Initialisation parameters for [`RuleBasedProvider`]
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// Tab-separated lexicon (`word<TAB>TAG[<TAB>lemma]`) overriding the built-ins
    pub lexicon_path: Option<PathBuf>,
}

/// A lexicon line: the tag to assign and an optional fixed lemma
#[derive(Debug, Clone, PartialEq)]
pub struct LexiconEntry {
    pub tag: String,
    pub lemma: Option<String>,
}

/// Provider backed by hand-written English rules
#[derive(Debug, Default)]
pub struct RuleBasedProvider {
    lexicon: HashMap<String, LexiconEntry>,
}

impl RuleBasedProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let lexicon = match &config.lexicon_path {
            Some(path) => load_lexicon(path)?,
            None => HashMap::new(),
        };
        tracing::debug!(entries = lexicon.len(), "Rule-based provider ready");
        Ok(Self { lexicon })
    }

    fn tag_token(&self, token: &str, prev: Option<&str>) -> String {
        if let Some(entry) = self.lexicon.get(token) {
            return entry.tag.clone();
        }
        if !token.chars().all(char::is_alphabetic) {
            return tag_non_word(token).to_string();
        }
        if let Some(tag) = CLOSED_CLASS.get(token) {
            return tag.to_string();
        }
        if let Some((tag, _)) = IRREGULAR.get(token) {
            return tag.to_string();
        }

        let tag = suffix_tag(token);
        let tag = match (prev, tag) {
            (Some("TO" | "MD"), "NN" | "NNS") => "VB",
            (Some("PRP"), "NN") => "VBP",
            (Some("PRP"), "NNS") => "VBZ",
            (Some("DT" | "PRP$"), "VBD") => "VBN",
            (_, tag) => tag,
        };
        tag.to_string()
    }
}

impl NlpProvider for RuleBasedProvider {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            if ch.is_whitespace() {
                i += 1;
            } else if ch.is_alphanumeric() {
                let start = i;
                i += 1;
                while i < chars.len() {
                    let joined = is_joiner(chars[i])
                        && chars[i - 1].is_alphanumeric()
                        && chars.get(i + 1).is_some_and(|c| c.is_alphanumeric());
                    if chars[i].is_alphanumeric() || joined {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let word: String = chars[start..i].iter().collect();
                split_clitics(word, &mut tokens);
            } else {
                tokens.push(ch.to_string());
                i += 1;
            }
        }

        Ok(tokens)
    }

    fn pos_tag(&self, tokens: &[String]) -> Result<Vec<String>> {
        let mut tags: Vec<String> = Vec::with_capacity(tokens.len());
        for token in tokens {
            let tag = self.tag_token(token, tags.last().map(String::as_str));
            tags.push(tag);
        }
        Ok(tags)
    }

    fn lemmatize(&self, token: &str, category: WordCategory) -> Result<String> {
        if let Some(lemma) = self.lexicon.get(token).and_then(|e| e.lemma.as_ref()) {
            return Ok(lemma.clone());
        }
        if let Some((tag, lemma)) = IRREGULAR.get(token) {
            if WordCategory::from_tag(tag) == category {
                return Ok(lemma.to_string());
            }
        }

        Ok(match category {
            WordCategory::Noun => noun_lemma(token),
            WordCategory::Verb => verb_lemma(token),
            WordCategory::Adjective => adjective_lemma(token),
            WordCategory::Adverb => token.to_string(),
        })
    }
}

/// Read a lexicon file
pub fn load_lexicon(path: &Path) -> Result<HashMap<String, LexiconEntry>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read lexicon {}: {}", path.display(), e))
    })?;
    parse_lexicon(&content, path)
}

fn parse_lexicon(content: &str, source: &Path) -> Result<HashMap<String, LexiconEntry>> {
    let mut entries = HashMap::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        if fields.len() < 2 || fields[0].is_empty() || fields[1].is_empty() {
            return Err(Error::Parsing(format!(
                "{}:{}: expected word<TAB>TAG[<TAB>lemma]",
                source.display(),
                line_no + 1
            )));
        }
        entries.insert(
            fields[0].to_lowercase(),
            LexiconEntry {
                tag: fields[1].to_string(),
                lemma: fields.get(2).filter(|l| !l.is_empty()).map(|l| l.to_string()),
            },
        );
    }
    Ok(entries)
}

fn is_joiner(ch: char) -> bool {
    matches!(ch, '\'' | '\u{2019}' | '-')
}

fn split_clitics(word: String, tokens: &mut Vec<String>) {
    if let Some(stem) = word.strip_suffix("n't").filter(|s| !s.is_empty()) {
        tokens.push(stem.to_string());
        tokens.push("n't".to_string());
    } else if let Some(pos) = word.find(['\'', '\u{2019}']) {
        let (host, clitic) = word.split_at(pos);
        tokens.push(host.to_string());
        tokens.push(clitic.to_string());
    } else {
        tokens.push(word);
    }
}

fn tag_non_word(token: &str) -> &'static str {
    match token {
        "n't" => "RB",
        "'s" | "\u{2019}s" => "POS",
        "'ll" | "'d" => "MD",
        "'re" | "'ve" | "'m" => "VBP",
        "." | "!" | "?" => ".",
        "," => ",",
        ":" | ";" => ":",
        "(" | "[" | "{" => "(",
        ")" | "]" | "}" => ")",
        "$" => "$",
        "#" => "#",
        "\"" | "'" | "\u{201c}" | "\u{201d}" => "''",
        _ if token.chars().any(|c| c.is_ascii_digit())
            && token.chars().all(|c| c.is_alphanumeric() || c == '.' || c == ',') =>
        {
            "CD"
        }
        _ => "SYM",
    }
}

fn suffix_tag(word: &str) -> &'static str {
    let n = word.chars().count();
    if n > 4 && word.ends_with("ly") {
        "RB"
    } else if n > 4 && word.ends_with("ing") {
        "VBG"
    } else if (n > 4 && word.ends_with("ed") && !word.ends_with("eed"))
        || (n > 5 && word.ends_with("eed"))
    {
        "VBD"
    } else if n > 4 && ADJECTIVE_SUFFIXES.iter().any(|s| word.ends_with(s)) {
        "JJ"
    } else if n > 3 && is_plural_s(word) {
        "NNS"
    } else {
        "NN"
    }
}

fn is_plural_s(word: &str) -> bool {
    word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") && !word.ends_with("is")
}

fn is_vowel(ch: char) -> bool {
    matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn noun_lemma(word: &str) -> String {
    let n = word.chars().count();
    if n > 4 {
        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{stem}y");
        }
    }
    if SIBILANT_ENDINGS.iter().any(|s| word.ends_with(s)) && n > 4 {
        return word[..word.len() - 2].to_string();
    }
    if n > 3 && is_plural_s(word) {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

fn verb_lemma(word: &str) -> String {
    let n = word.chars().count();
    if n > 4 {
        if let Some(stem) = word.strip_suffix("ies").or_else(|| word.strip_suffix("ied")) {
            return format!("{stem}y");
        }
    }
    if SIBILANT_ENDINGS.iter().any(|s| word.ends_with(s)) && n > 4 {
        return word[..word.len() - 2].to_string();
    }
    if n > 3 && word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    if n > 4 {
        if let Some(stem) = word.strip_suffix("ing") {
            return restore_stem(stem, word);
        }
    }
    if n > 5 && word.ends_with("eed") {
        return word[..word.len() - 1].to_string();
    }
    if n > 4 {
        if let Some(stem) = word.strip_suffix("ed") {
            return restore_stem(stem, word);
        }
    }
    word.to_string()
}

fn adjective_lemma(word: &str) -> String {
    let n = word.chars().count();
    if n > 4 {
        if let Some(stem) = word.strip_suffix("iest") {
            return format!("{stem}y");
        }
    }
    if n > 3 {
        if let Some(stem) = word.strip_suffix("ier") {
            return format!("{stem}y");
        }
    }
    if n > 5 {
        if let Some(stem) = word.strip_suffix("est") {
            return undouble(stem);
        }
    }
    if n > 4 {
        if let Some(stem) = word.strip_suffix("er") {
            return undouble(stem);
        }
    }
    word.to_string()
}

/// Rebuild a verb stem after `-ed`/`-ing` removal
fn restore_stem(stem: &str, original: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n < 2 || !chars.iter().any(|c| is_vowel(*c)) {
        return original.to_string();
    }

    let last = chars[n - 1];
    if n > 3 && last == chars[n - 2] && !is_vowel(last) && !matches!(last, 'l' | 's' | 'z') {
        return chars[..n - 1].iter().collect();
    }
    let short_cvc = n <= 3
        && is_vowel(chars[n - 2])
        && !is_vowel(last)
        && !matches!(last, 'w' | 'x' | 'y')
        && (n < 3 || !is_vowel(chars[n - 3]));
    if short_cvc || last == 'v' || stem.ends_with("nc") || stem.ends_with("rc") {
        return format!("{stem}e");
    }
    stem.to_string()
}

fn undouble(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n > 2 && chars[n - 1] == chars[n - 2] && !is_vowel(chars[n - 1]) {
        chars[..n - 1].iter().collect()
    } else {
        stem.to_string()
    }
}
