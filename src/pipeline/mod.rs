// File-level pipeline: read documents from disk and extract them.
//
// This is boundary glue for the CLI. The core extractor only ever sees bytes
// and a filename; reading files, bounded concurrency and progress display
// live here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};

use crate::extract::{Document, Extraction, Extractor};

/// Read `path` into a `Document` named after its final path component.
pub async fn read_document(path: &Path) -> Result<Document> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Document::new(path.display().to_string(), filename, bytes))
}

/// Read and extract one file.
pub async fn extract_file(extractor: &Extractor, path: &Path) -> Result<Extraction> {
    let doc = read_document(path).await?;
    Ok(extractor.process(doc).await)
}

/// Read and extract many files, at most `concurrency` at a time.
/// Results come back in the order of `paths`.
pub async fn extract_files(
    extractor: &Extractor,
    paths: &[PathBuf],
    concurrency: usize,
    show_progress: bool,
) -> Result<Vec<Extraction>> {
    let pb = if show_progress {
        let pb = ProgressBar::new(paths.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar().template("  Extracting [{bar:30}] {pos}/{len} ({eta})")?,
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let results: Vec<Result<Extraction>> = stream::iter(paths.iter().map(|path| {
        let pb = pb.clone();
        async move {
            let extraction = extract_file(extractor, path).await;
            pb.inc(1);
            extraction
        }
    }))
    .buffered(concurrency.max(1))
    .collect()
    .await;
    pb.finish_and_clear();

    results.into_iter().collect()
}
