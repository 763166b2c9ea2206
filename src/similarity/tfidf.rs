// TF-IDF vectorization over a single comparison batch.
//
// Every call to `fit_transform` builds its own vocabulary and IDF table from
// the texts it is given and nothing else. Scores computed from two different
// batches are not comparable, so nothing here is cached between calls.
//
//   idf(t)   = ln((1 + N) / (1 + df(t))) + 1
//   w(d, t)  = tf(d, t) * idf(t)
//   vec(d)   = w(d, .) / ||w(d, .)||        (zero vector stays zero)

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::stopwords::{StopwordSet, Stopwords};
use super::tokenize::{terms, TokenizerOptions};

/// Term → column index, assigned in lexicographic term order.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    index: HashMap<String, usize>,
    terms: Vec<String>,
}

impl Vocabulary {
    fn from_terms(unique: BTreeSet<String>) -> Self {
        let terms: Vec<String> = unique.into_iter().collect();
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { index, terms }
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn term(&self, column: usize) -> Option<&str> {
        self.terms.get(column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Sparse document vector: (column, weight) pairs sorted by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentVector {
    entries: Vec<(usize, f64)>,
}

impl DocumentVector {
    /// Build from unsorted (column, weight) pairs. Zero weights are dropped.
    pub fn from_entries(mut entries: Vec<(usize, f64)>) -> Self {
        entries.retain(|&(_, w)| w != 0.0);
        entries.sort_by_key(|&(col, _)| col);
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn get(&self, column: usize) -> f64 {
        self.entries
            .binary_search_by_key(&column, |&(col, _)| col)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Sparse dot product (merge over the two sorted entry lists).
    pub fn dot(&self, other: &DocumentVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (ca, wa) = self.entries[i];
            let (cb, wb) = other.entries[j];
            match ca.cmp(&cb) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += wa * wb;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    fn normalized(self) -> Self {
        let norm = self.norm();
        if norm == 0.0 {
            return self;
        }
        Self {
            entries: self
                .entries
                .into_iter()
                .map(|(col, w)| (col, w / norm))
                .collect(),
        }
    }
}

/// The document-term matrix produced for one batch.
#[derive(Debug, Clone)]
pub struct TfIdfMatrix {
    pub vocabulary: Vocabulary,
    /// Smoothed IDF per column.
    pub idf: Vec<f64>,
    /// One L2-normalized vector per input text, in input order.
    pub vectors: Vec<DocumentVector>,
}

/// Unigram + bigram TF-IDF vectorizer with stopword filtering.
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    stopwords: Stopwords,
    options: TokenizerOptions,
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new(StopwordSet::German, TokenizerOptions::default())
    }
}

impl TfIdfVectorizer {
    pub fn new(stopwords: StopwordSet, options: TokenizerOptions) -> Self {
        Self {
            stopwords: stopwords.load(),
            options,
        }
    }

    /// Vectorize a batch. Index 0 is, by convention, the reference document.
    pub fn fit_transform<S: AsRef<str>>(&self, texts: &[S]) -> TfIdfMatrix {
        let doc_terms: Vec<Vec<String>> = texts
            .iter()
            .map(|t| terms(t.as_ref(), &self.stopwords, self.options))
            .collect();

        let unique: BTreeSet<String> = doc_terms.iter().flatten().cloned().collect();
        let vocabulary = Vocabulary::from_terms(unique);

        // Raw term frequencies per document, keyed by column
        let counts: Vec<HashMap<usize, f64>> = doc_terms
            .iter()
            .map(|terms| {
                let mut tf: HashMap<usize, f64> = HashMap::new();
                for term in terms {
                    if let Some(col) = vocabulary.index_of(term) {
                        *tf.entry(col).or_insert(0.0) += 1.0;
                    }
                }
                tf
            })
            .collect();

        let mut df = vec![0usize; vocabulary.len()];
        for tf in &counts {
            for &col in tf.keys() {
                df[col] += 1;
            }
        }

        let n = texts.len() as f64;
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let vectors: Vec<DocumentVector> = counts
            .into_iter()
            .map(|tf| {
                let entries = tf.into_iter().map(|(col, f)| (col, f * idf[col])).collect();
                DocumentVector::from_entries(entries).normalized()
            })
            .collect();

        debug!(
            documents = texts.len(),
            vocabulary = vocabulary.len(),
            "Built TF-IDF matrix"
        );

        TfIdfMatrix {
            vocabulary,
            idf,
            vectors,
        }
    }
}
