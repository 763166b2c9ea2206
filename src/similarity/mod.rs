// Lexical similarity: tokenization, TF-IDF weighting and cosine scoring.

pub mod cosine;
pub mod stopwords;
pub mod tfidf;
pub mod tokenize;
