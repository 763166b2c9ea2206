// Orchestration: extraction results → TF-IDF batch → cosine scores.
//
// Three shapes of comparison:
//   compare      two texts, one score
//   rank         one reference vs N candidates, each scored as its own
//                two-document batch, sorted descending (stable on ties)
//   score_batch  all texts in ONE batch (shared vocabulary/IDF), scored
//                against index 0
//
// Extraction errors are resolved here according to an explicit ErrorPolicy.

pub mod session;

use std::borrow::Cow;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::extract::{ExtractError, Extraction};
use crate::similarity::cosine::{cosine, scores_against_reference};
use crate::similarity::tfidf::TfIdfVectorizer;

pub use session::SessionCache;

/// Number of characters of each document shown alongside a score.
pub const PREVIEW_CHARS: usize = 500;

/// First `PREVIEW_CHARS` characters of `text`, cut without regard to word
/// boundaries and without an ellipsis.
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// What to do with a document whose extraction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop the comparison and report the failed document
    #[default]
    Abort,
    /// Score the failed document as 0.0 against everything
    ZeroScore,
    /// Score the error message as if it were the document's text
    Inline,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(ErrorPolicy::Abort),
            "zero" | "zero-score" | "zero_score" => Ok(ErrorPolicy::ZeroScore),
            "inline" => Ok(ErrorPolicy::Inline),
            other => Err(format!(
                "unknown error policy '{other}' (expected abort, zero or inline)"
            )),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("cannot compare '{filename}': {source}")]
    Extraction {
        filename: String,
        #[source]
        source: ExtractError,
    },
}

/// One pairwise score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    pub document_a: String,
    pub document_b: String,
    pub score: f64,
}

/// A candidate's position in a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ranked {
    /// Position in the caller's candidate list
    pub index: usize,
    pub score: f64,
}

/// Display-side view of one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub preview: String,
    pub error: Option<ExtractError>,
}

impl DocumentSummary {
    pub fn of(extraction: &Extraction) -> Self {
        Self {
            id: extraction.id.clone(),
            filename: extraction.filename.clone(),
            preview: preview(&extraction.text()),
            error: extraction.error().cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseComparison {
    pub reference: DocumentSummary,
    pub candidate: DocumentSummary,
    pub result: SimilarityResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDocument {
    pub index: usize,
    pub document: DocumentSummary,
    pub score: f64,
}

/// Runs comparisons with a fixed vectorizer configuration and error policy.
/// Holds no per-batch state; every call builds its own vocabulary.
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    vectorizer: TfIdfVectorizer,
    policy: ErrorPolicy,
}

impl Comparator {
    pub fn new(vectorizer: TfIdfVectorizer, policy: ErrorPolicy) -> Self {
        Self { vectorizer, policy }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Similarity of two texts in [0, 1].
    pub fn compare(&self, a: &str, b: &str) -> f64 {
        let matrix = self.vectorizer.fit_transform(&[a, b]);
        cosine(&matrix.vectors[0], &matrix.vectors[1])
    }

    /// Score each candidate against `reference` and sort by descending score.
    /// Equal scores keep their original relative order.
    pub fn rank<S: AsRef<str>>(&self, reference: &str, candidates: &[S]) -> Vec<Ranked> {
        let scored = candidates
            .iter()
            .enumerate()
            .map(|(index, c)| Ranked {
                index,
                score: self.compare(reference, c.as_ref()),
            })
            .collect();
        sort_descending(scored, |r| r.score)
    }

    /// Score every text against `texts[0]` within a single shared batch.
    pub fn score_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<f64> {
        let matrix = self.vectorizer.fit_transform(texts);
        scores_against_reference(&matrix.vectors)
    }

    /// Compare two extracted documents, applying the error policy.
    pub fn compare_documents(
        &self,
        reference: &Extraction,
        candidate: &Extraction,
    ) -> Result<PairwiseComparison, CompareError> {
        let a = self.scoring_text(reference)?;
        let b = self.scoring_text(candidate)?;
        let score = match (a, b) {
            (Some(a), Some(b)) => self.compare(&a, &b),
            _ => 0.0,
        };

        debug!(
            reference = %reference.filename,
            candidate = %candidate.filename,
            score,
            "Compared documents"
        );

        Ok(PairwiseComparison {
            reference: DocumentSummary::of(reference),
            candidate: DocumentSummary::of(candidate),
            result: SimilarityResult {
                document_a: reference.id.clone(),
                document_b: candidate.id.clone(),
                score,
            },
        })
    }

    /// Rank extracted candidates against an extracted reference.
    pub fn rank_documents(
        &self,
        reference: &Extraction,
        candidates: &[Extraction],
    ) -> Result<Vec<RankedDocument>, CompareError> {
        let reference_text = self.scoring_text(reference)?;

        let mut scored = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            let score = match (&reference_text, self.scoring_text(candidate)?) {
                (Some(r), Some(c)) => self.compare(r, &c),
                _ => 0.0,
            };
            scored.push(RankedDocument {
                index,
                document: DocumentSummary::of(candidate),
                score,
            });
        }

        Ok(sort_descending(scored, |r| r.score))
    }

    /// The text to score for `extraction`: `None` means "force a zero score".
    fn scoring_text<'a>(
        &self,
        extraction: &'a Extraction,
    ) -> Result<Option<Cow<'a, str>>, CompareError> {
        match (&extraction.outcome, self.policy) {
            (Ok(text), _) => Ok(Some(Cow::Borrowed(text.as_str()))),
            // Unsupported input is a placeholder, not a failure: never aborts
            (Err(e), ErrorPolicy::Abort) if e.is_unsupported() => Ok(Some(extraction.text())),
            (Err(e), ErrorPolicy::Abort) => Err(CompareError::Extraction {
                filename: extraction.filename.clone(),
                source: e.clone(),
            }),
            (Err(_), ErrorPolicy::ZeroScore) => Ok(None),
            (Err(_), ErrorPolicy::Inline) => Ok(Some(extraction.text())),
        }
    }
}

/// Stable sort by descending score.
fn sort_descending<T>(mut items: Vec<T>, score: impl Fn(&T) -> f64) -> Vec<T> {
    items.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    items
}
