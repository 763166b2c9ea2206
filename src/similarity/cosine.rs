// Cosine similarity between TF-IDF document vectors.
//
//   cos(a, b) = dot(a, b) / (||a|| * ||b||)
//
// A zero vector on either side (empty text, all stopwords, nothing
// extractable) scores 0.0 instead of dividing by zero. TF-IDF weights are
// never negative, so the result lives in [0, 1]; it is clamped to absorb
// floating-point overshoot on identical vectors.

use super::tfidf::DocumentVector;

/// Cosine similarity of two sparse vectors, 0.0 if either is zero.
pub fn cosine(reference: &DocumentVector, other: &DocumentVector) -> f64 {
    let denom = reference.norm() * other.norm();
    if denom == 0.0 {
        return 0.0;
    }
    (reference.dot(other) / denom).clamp(0.0, 1.0)
}

/// Score every vector against `vectors[0]`, the batch reference.
///
/// The first entry is the reference scored against itself (1.0, or 0.0 for
/// a zero reference). Returns an empty list for an empty batch.
pub fn scores_against_reference(vectors: &[DocumentVector]) -> Vec<f64> {
    let Some(reference) = vectors.first() else {
        return Vec::new();
    };
    vectors.iter().map(|v| cosine(reference, v)).collect()
}
