// German stopword lexicon consumed by the TF-IDF vectorizer.
//
// The compact list is the fixed set the comparison was tuned on: articles,
// prepositions, possessives and a few letter-boilerplate words ("bitte",
// "dank", "wenden"). The extended set merges in the full German list shipped
// with the `stop-words` crate for callers who want more aggressive filtering.

use std::collections::HashSet;
use std::str::FromStr;

use stop_words::{get, LANGUAGE};

/// The fixed German stopword list.
pub const GERMAN_STOPWORDS: &[&str] = &[
    "die", "der", "das", "ein", "eine", "und", "im", "in", "zu", "auf", "mit", "ist", "sind",
    "für", "an", "von", "sie", "den", "dem", "des", "am", "aus", "bei", "durch", "nach",
    "über", "unter", "vor", "zwischen", "bitte", "dank", "ihre", "ihren", "ihrer", "unser",
    "unsere", "nicht", "ab", "als", "wenden",
];

/// Which stopword lexicon the vectorizer filters against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopwordSet {
    /// The compact 40-word German list (default)
    #[default]
    German,
    /// Compact list plus the `stop-words` crate's German list
    GermanExtended,
    /// No filtering at all
    None,
}

impl StopwordSet {
    /// Materialize the lexicon as a lowercase lookup set.
    pub fn load(self) -> Stopwords {
        let mut words: HashSet<String> = HashSet::new();
        match self {
            StopwordSet::German => {
                words.extend(GERMAN_STOPWORDS.iter().map(|w| w.to_string()));
            }
            StopwordSet::GermanExtended => {
                words.extend(GERMAN_STOPWORDS.iter().map(|w| w.to_string()));
                let extended: Vec<String> = get(LANGUAGE::German);
                words.extend(extended.into_iter().map(|w| w.to_lowercase()));
            }
            StopwordSet::None => {}
        }
        Stopwords { words }
    }
}

impl FromStr for StopwordSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "german" | "de" => Ok(StopwordSet::German),
            "german-extended" | "extended" => Ok(StopwordSet::GermanExtended),
            "none" | "off" => Ok(StopwordSet::None),
            other => Err(format!(
                "unknown stopword set '{other}' (expected german, german-extended or none)"
            )),
        }
    }
}

/// A loaded stopword lexicon.
#[derive(Debug, Clone, Default)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Stopwords {
    /// Whether `token` (already lowercased) is a stopword.
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
