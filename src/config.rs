use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::compare::{Comparator, ErrorPolicy};
use crate::extract::ocr::{DEFAULT_LANGUAGE, DEFAULT_TESSERACT_CMD};
use crate::extract::{Extractor, ExtractorConfig, DEFAULT_OCR_TIMEOUT};
use crate::similarity::stopwords::StopwordSet;
use crate::similarity::tfidf::TfIdfVectorizer;
use crate::similarity::tokenize::TokenizerOptions;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every
/// setting has a default; invalid values are rejected rather than ignored.
#[derive(Debug, Clone)]
pub struct Config {
    /// Tesseract language model (DOCCOMPARE_OCR_LANG, default "deu")
    pub ocr_language: String,
    /// OCR timeout (DOCCOMPARE_OCR_TIMEOUT_SECS, default 30)
    pub ocr_timeout: Duration,
    /// OCR binary (DOCCOMPARE_TESSERACT_CMD, default "tesseract")
    pub tesseract_cmd: String,
    /// Bounding box edge for image downsampling (DOCCOMPARE_MAX_IMAGE_DIM)
    pub max_image_dim: u32,
    /// What a failed extraction means for a comparison (DOCCOMPARE_ON_ERROR)
    pub error_policy: ErrorPolicy,
    /// Stopword lexicon (DOCCOMPARE_STOPWORDS)
    pub stopwords: StopwordSet,
    /// Keep purely numeric tokens (DOCCOMPARE_KEEP_NUMERIC)
    pub keep_numeric: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ocr_language: DEFAULT_LANGUAGE.to_string(),
            ocr_timeout: DEFAULT_OCR_TIMEOUT,
            tesseract_cmd: DEFAULT_TESSERACT_CMD.to_string(),
            max_image_dim: crate::extract::image::DEFAULT_MAX_DIMENSION,
            error_policy: ErrorPolicy::default(),
            stopwords: StopwordSet::default(),
            keep_numeric: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let ocr_timeout_secs: u64 =
            parse_var(&lookup, "DOCCOMPARE_OCR_TIMEOUT_SECS")?.unwrap_or(defaults.ocr_timeout.as_secs());
        if ocr_timeout_secs == 0 {
            anyhow::bail!(
                "DOCCOMPARE_OCR_TIMEOUT_SECS must be at least 1 \
                 (OCR always runs under a timeout)"
            );
        }

        let max_image_dim: u32 =
            parse_var(&lookup, "DOCCOMPARE_MAX_IMAGE_DIM")?.unwrap_or(defaults.max_image_dim);
        if max_image_dim == 0 {
            anyhow::bail!("DOCCOMPARE_MAX_IMAGE_DIM must be greater than 0");
        }

        Ok(Self {
            ocr_language: lookup("DOCCOMPARE_OCR_LANG")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.ocr_language),
            ocr_timeout: Duration::from_secs(ocr_timeout_secs),
            tesseract_cmd: lookup("DOCCOMPARE_TESSERACT_CMD")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.tesseract_cmd),
            max_image_dim,
            error_policy: parse_var(&lookup, "DOCCOMPARE_ON_ERROR")?
                .unwrap_or(defaults.error_policy),
            stopwords: parse_var(&lookup, "DOCCOMPARE_STOPWORDS")?.unwrap_or(defaults.stopwords),
            keep_numeric: parse_bool(&lookup, "DOCCOMPARE_KEEP_NUMERIC")?
                .unwrap_or(defaults.keep_numeric),
        })
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            ocr_language: self.ocr_language.clone(),
            ocr_timeout: self.ocr_timeout,
            max_image_dim: self.max_image_dim,
        }
    }

    /// Extractor backed by the configured tesseract binary.
    pub fn extractor(&self) -> Extractor {
        Extractor::with_tesseract(self.extractor_config(), &self.tesseract_cmd)
    }

    pub fn comparator(&self) -> Comparator {
        let vectorizer = TfIdfVectorizer::new(
            self.stopwords,
            TokenizerOptions {
                keep_numeric: self.keep_numeric,
            },
        );
        Comparator::new(vectorizer, self.error_policy)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).filter(|s| !s.trim().is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid value for {key}: '{raw}'")),
    }
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>> {
    match lookup(key).map(|s| s.trim().to_lowercase()) {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => match s.as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => anyhow::bail!("invalid value for {key}: '{s}' (expected true or false)"),
        },
    }
}
