// Tokenization and n-gram formation for the TF-IDF vectorizer.
//
// Text is NFC-normalized and lowercased, then split on anything that is not
// a Unicode alphanumeric character or '_', so "Größe" and "Übergabe" survive
// as single tokens even when the source spells the umlaut as a base letter
// plus a combining diaeresis.
// Stopwords are removed from the unigram stream BEFORE bigrams are formed:
// "endet am Januar" yields the bigram "endet januar", never "endet am".

use unicode_normalization::UnicodeNormalization;

use super::stopwords::Stopwords;

/// Tokens shorter than this (in characters) are discarded.
pub const MIN_TOKEN_CHARS: usize = 2;

/// Options that change which tokens survive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Keep tokens made only of digits ("2024", "01").
    pub keep_numeric: bool,
}

/// Split `text` into lowercase unigrams, dropping short tokens, stopwords
/// and (unless `keep_numeric`) purely numeric tokens.
pub fn tokenize(text: &str, stopwords: &Stopwords, options: TokenizerOptions) -> Vec<String> {
    let buffer = text.nfc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in buffer.char_indices() {
        if is_word_char(c) {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            push_token(&buffer[s..i], stopwords, options, &mut tokens);
        }
    }
    if let Some(s) = start {
        push_token(&buffer[s..], stopwords, options, &mut tokens);
    }

    tokens
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn push_token(token: &str, stopwords: &Stopwords, options: TokenizerOptions, out: &mut Vec<String>) {
    if token.chars().count() < MIN_TOKEN_CHARS {
        return;
    }
    if !options.keep_numeric && token.chars().all(char::is_numeric) {
        return;
    }
    if stopwords.contains(token) {
        return;
    }
    out.push(token.to_string());
}

/// All terms of a document: filtered unigrams followed by the bigrams of
/// adjacent surviving unigrams (space-joined).
pub fn terms(text: &str, stopwords: &Stopwords, options: TokenizerOptions) -> Vec<String> {
    let unigrams = tokenize(text, stopwords, options);
    let bigrams: Vec<String> = unigrams
        .windows(2)
        .map(|pair| format!("{} {}", pair[0], pair[1]))
        .collect();

    let mut all = unigrams;
    all.extend(bigrams);
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::stopwords::StopwordSet;

    fn german() -> Stopwords {
        StopwordSet::German.load()
    }

    #[test]
    fn test_umlauts_and_eszett_stay_in_token() {
        let tokens = tokenize("Größe, Übergabe; Maßnahme!", &german(), TokenizerOptions::default());
        assert_eq!(tokens, vec!["größe", "übergabe", "maßnahme"]);
    }

    #[test]
    fn test_decomposed_umlauts_are_composed() {
        let tokens = tokenize(
            "Ku\u{308}ndigung U\u{308}bergabe Gro\u{308}ße",
            &german(),
            TokenizerOptions::default(),
        );
        assert_eq!(tokens, vec!["kündigung", "übergabe", "größe"]);
    }

    #[test]
    fn test_underscore_joins_token() {
        let tokens = tokenize("Vertrag_Nr 17", &german(), TokenizerOptions::default());
        assert_eq!(tokens, vec!["vertrag_nr"]);
    }

    #[test]
    fn test_stopwords_and_short_tokens_dropped() {
        let tokens = tokenize("Der Vertrag endet am 1. Januar", &german(), TokenizerOptions::default());
        assert_eq!(tokens, vec!["vertrag", "endet", "januar"]);
    }

    #[test]
    fn test_numeric_tokens_optional() {
        let text = "Rechnung 2024 Nr 17a";
        let dropped = tokenize(text, &german(), TokenizerOptions::default());
        assert_eq!(dropped, vec!["rechnung", "nr", "17a"]);

        let kept = tokenize(text, &german(), TokenizerOptions { keep_numeric: true });
        assert_eq!(kept, vec!["rechnung", "2024", "nr", "17a"]);
    }

    #[test]
    fn test_bigrams_span_removed_stopwords() {
        let all = terms("endet am Januar", &german(), TokenizerOptions::default());
        assert_eq!(all, vec!["endet", "januar", "endet januar"]);
    }

    #[test]
    fn test_empty_and_all_stopwords() {
        assert!(terms("", &german(), TokenizerOptions::default()).is_empty());
        assert!(terms("der die das", &german(), TokenizerOptions::default()).is_empty());
    }

    #[test]
    fn test_single_token_has_no_bigram() {
        assert_eq!(
            terms("Vertrag", &german(), TokenizerOptions::default()),
            vec!["vertrag"]
        );
    }
}
