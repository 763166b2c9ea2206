// Document-to-text extraction.
//
// Routes raw bytes to the PDF text-layer reader or the OCR path based on the
// filename extension (no content sniffing). Extraction never fails past this
// boundary: every call returns an `Extraction` whose outcome is either the
// text or a typed `ExtractError`. The orchestrator decides what an error
// means for a comparison.

pub mod image;
pub mod ocr;
pub mod pdf;

use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use self::ocr::{OcrEngine, TesseractEngine, DEFAULT_LANGUAGE};

/// Default OCR timeout.
pub const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(30);

/// In-band placeholder text for files that are neither PDF nor image.
pub const UNSUPPORTED_PLACEHOLDER: &str = "Unsupported file type";

/// Supported document formats, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Pdf,
    Image,
}

impl Format {
    /// `.pdf` → Pdf, `.png`/`.jpg`/`.jpeg` → Image (case-insensitive).
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".pdf") {
            Some(Format::Pdf)
        } else if [".png", ".jpg", ".jpeg"].iter().any(|ext| lower.ends_with(ext)) {
            Some(Format::Image)
        } else {
            None
        }
    }
}

/// Why a document produced no usable text.
///
/// The `Display` form of each variant is the in-band message shown to users
/// in place of extracted content.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ExtractError {
    #[error("Error processing PDF: {0}")]
    Pdf(String),

    #[error("Error processing image: {0}")]
    Image(String),

    #[error("Error processing image: {0}")]
    Ocr(String),

    #[error("Error: Tesseract timed out while processing the image")]
    OcrTimeout(u64),

    #[error("Unsupported file type")]
    UnsupportedFormat(String),
}

impl ExtractError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExtractError::OcrTimeout(_))
    }

    /// Unsupported input is a placeholder outcome rather than a failure.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ExtractError::UnsupportedFormat(_))
    }
}

/// A document awaiting extraction. The bytes are consumed by `Extractor::process`.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub format: Option<Format>,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(id: impl Into<String>, filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        Self {
            id: id.into(),
            format: Format::from_filename(&filename),
            filename,
            bytes,
        }
    }
}

/// The result of extracting one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub id: String,
    pub filename: String,
    pub format: Option<Format>,
    pub outcome: Result<String, ExtractError>,
}

impl Extraction {
    /// Extracted text, or the error's in-band message.
    pub fn text(&self) -> Cow<'_, str> {
        match &self.outcome {
            Ok(text) => Cow::Borrowed(text.as_str()),
            Err(e) => Cow::Owned(e.to_string()),
        }
    }

    pub fn error(&self) -> Option<&ExtractError> {
        self.outcome.as_ref().err()
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Tunables for extraction.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// OCR language model (tesseract `-l`)
    pub ocr_language: String,
    /// Hard limit on a single OCR run
    pub ocr_timeout: Duration,
    /// Images are shrunk to fit inside this square before OCR
    pub max_image_dim: u32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ocr_language: DEFAULT_LANGUAGE.to_string(),
            ocr_timeout: DEFAULT_OCR_TIMEOUT,
            max_image_dim: image::DEFAULT_MAX_DIMENSION,
        }
    }
}

/// Converts document bytes into text.
pub struct Extractor {
    config: ExtractorConfig,
    ocr: Arc<dyn OcrEngine>,
}

impl Extractor {
    pub fn new(config: ExtractorConfig, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { config, ocr }
    }

    /// Extractor backed by the tesseract binary at `program`.
    pub fn with_tesseract(config: ExtractorConfig, program: &str) -> Self {
        Self::new(config, Arc::new(TesseractEngine::new(program)))
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract text from `bytes`, routing on the extension of `filename`.
    pub async fn extract(&self, bytes: Vec<u8>, filename: &str) -> Extraction {
        self.process(Document::new(filename, filename, bytes)).await
    }

    /// Extract a prepared document. Its byte buffer is dropped when this returns.
    pub async fn process(&self, doc: Document) -> Extraction {
        let Document {
            id,
            filename,
            format,
            bytes,
        } = doc;

        let start = Instant::now();
        let outcome = match format {
            Some(Format::Pdf) => self.extract_pdf(bytes).await,
            Some(Format::Image) => self.extract_image(bytes).await,
            None => Err(ExtractError::UnsupportedFormat(extension_of(&filename))),
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &outcome {
            Ok(text) => info!(
                filename = %filename,
                format = ?format,
                chars = text.chars().count(),
                elapsed_ms,
                "Extracted text"
            ),
            Err(e) if e.is_unsupported() => info!(filename = %filename, "Unsupported file type"),
            Err(e) => warn!(filename = %filename, error = %e, elapsed_ms, "Extraction failed"),
        }

        Extraction {
            id,
            filename,
            format,
            outcome,
        }
    }

    /// Native text layer of a PDF. Parsing runs on the blocking pool.
    pub async fn extract_pdf(&self, bytes: Vec<u8>) -> Result<String, ExtractError> {
        tokio::task::spawn_blocking(move || pdf::extract_text(&bytes))
            .await
            .map_err(|e| ExtractError::Pdf(format!("extraction task failed: {e}")))?
    }

    /// Downsample then OCR an image under the configured timeout.
    pub async fn extract_image(&self, bytes: Vec<u8>) -> Result<String, ExtractError> {
        let max_dim = self.config.max_image_dim;
        let prepared = tokio::task::spawn_blocking(move || image::prepare_for_ocr(&bytes, max_dim))
            .await
            .map_err(|e| ExtractError::Image(format!("decode task failed: {e}")))??;

        let recognize = self.ocr.recognize(prepared.png, &self.config.ocr_language);
        match tokio::time::timeout(self.config.ocr_timeout, recognize).await {
            Ok(Ok(text)) => Ok(text.trim().to_string()),
            Ok(Err(e)) => Err(ExtractError::Ocr(e.to_string())),
            Err(_) => {
                warn!(
                    engine = self.ocr.name(),
                    timeout_secs = self.config.ocr_timeout.as_secs(),
                    "OCR timed out"
                );
                Err(ExtractError::OcrTimeout(self.config.ocr_timeout.as_secs()))
            }
        }
    }
}

fn extension_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}
