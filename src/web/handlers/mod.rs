pub mod index;
pub mod submit;
pub mod tesseract;
