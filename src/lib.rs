// doccompare: TF-IDF similarity for German PDF and scanned documents
//
// This is the library root. Each module corresponds to one stage of the
// comparison: extraction, vectorization, scoring and presentation.

pub mod compare;
pub mod config;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod similarity;

#[cfg(feature = "web")]
pub mod web;
