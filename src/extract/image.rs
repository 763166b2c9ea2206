// Image preparation for OCR.
//
// Scans straight off a phone or flatbed are routinely 4000px+ on a side and
// OCR time grows with pixel count. Images are decoded, shrunk to fit inside a
// square bounding box (aspect ratio preserved, never upscaled) and re-encoded
// as PNG for the OCR engine. The decoded pixel buffer is dropped before this
// function returns.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{GenericImageView, ImageFormat};

use super::ExtractError;

/// Default bounding-box edge in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 1000;

/// A PNG-encoded image ready for OCR.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode `bytes`, downsample into a `max_dim` × `max_dim` box and encode as PNG.
pub fn prepare_for_ocr(bytes: &[u8], max_dim: u32) -> Result<PreparedImage, ExtractError> {
    let img = image::load_from_memory(bytes).map_err(|e| ExtractError::Image(e.to_string()))?;

    let (w, h) = img.dimensions();
    let img = if w > max_dim || h > max_dim {
        img.resize(max_dim, max_dim, FilterType::Lanczos3)
    } else {
        img
    };
    let (width, height) = img.dimensions();

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| ExtractError::Image(e.to_string()))?;

    tracing::debug!(
        original_width = w,
        original_height = h,
        width,
        height,
        "Prepared image for OCR"
    );

    Ok(PreparedImage { png, width, height })
}
