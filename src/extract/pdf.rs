use lopdf::Document;
use tracing::debug;

use super::ExtractError;

/// Extract the native text layer of a PDF, page by page.
///
/// Each page that yields text is preceded by a `--- Page N ---` marker
/// (1-indexed). Pages without text get no marker. The result is trimmed.
pub fn extract_text(pdf_bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = Document::load_mem(pdf_bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;

    // get_pages is keyed by page number, so iteration is already in page order
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();

    let mut text = String::new();
    for (i, page_num) in pages.iter().enumerate() {
        let page_text = doc
            .extract_text(&[*page_num])
            .map_err(|e| ExtractError::Pdf(format!("page {}: {e}", i + 1)))?;
        if page_text.trim().is_empty() {
            continue;
        }
        text.push_str(&format!("\n--- Page {} ---\n", i + 1));
        text.push_str(&page_text);
    }

    debug!(pages = pages.len(), chars = text.len(), "Extracted PDF text layer");

    Ok(text.trim().to_string())
}


#[cfg(test)]
mod tests {
    use super::test_support::build_pdf;
    use super::*;

    #[test]
    fn test_single_page() {
        let text = extract_text(&build_pdf(&["Hello World"])).unwrap();
        assert!(text.starts_with("--- Page 1 ---"), "got: {text:?}");
        assert!(text.contains("Hello"), "got: {text:?}");
    }

    #[test]
    fn test_pages_in_order_with_markers() {
        let text = extract_text(&build_pdf(&["Alpha", "Beta", "Gamma"])).unwrap();
        let p1 = text.find("--- Page 1 ---").unwrap();
        let p2 = text.find("--- Page 2 ---").unwrap();
        let p3 = text.find("--- Page 3 ---").unwrap();
        assert!(p1 < p2 && p2 < p3);
        assert!(text.find("Alpha").unwrap() < text.find("Beta").unwrap());
        assert!(text.find("Beta").unwrap() < text.find("Gamma").unwrap());
    }

    #[test]
    fn test_blank_page_has_no_marker() {
        let text = extract_text(&build_pdf(&["Alpha", "", "Gamma"])).unwrap();
        assert!(!text.contains("--- Page 2 ---"), "got: {text:?}");
        assert!(text.contains("--- Page 3 ---"));
    }

    #[test]
    fn test_garbage_bytes() {
        let err = extract_text(b"this is not a valid pdf file").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
        assert!(err.to_string().starts_with("Error processing PDF: "));
    }

    #[test]
    fn test_empty_bytes() {
        assert!(matches!(extract_text(&[]), Err(ExtractError::Pdf(_))));
    }
}
