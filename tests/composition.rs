// Composition tests: extraction results flowing into comparisons.
//
// These tests exercise the data flow between modules:
//   bytes -> Extractor -> Extraction -> Comparator -> scores
// plus the session cache that sits in front of the reference document.
// OCR is faked; PDFs are built in memory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lopdf::{dictionary, Document, Object, Stream};
use tokio::sync::Mutex;

use doccompare::compare::{Comparator, CompareError, ErrorPolicy, SessionCache, PREVIEW_CHARS};
use doccompare::config::Config;
use doccompare::extract::ocr::{OcrEngine, OcrError};
use doccompare::extract::{Extractor, ExtractorConfig};
use doccompare::similarity::tfidf::TfIdfVectorizer;

/// OCR stand-in returning a fixed German letter.
struct LetterOcr;

#[async_trait]
impl OcrEngine for LetterOcr {
    fn name(&self) -> &str {
        "letter"
    }

    async fn recognize(&self, _png: Vec<u8>, _language: &str) -> Result<String, OcrError> {
        Ok("Sehr geehrte Damen und Herren, hiermit kündige ich den Mietvertrag \
            für die Wohnung fristgerecht zum Monatsende."
            .to_string())
    }
}

fn single_page_pdf(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(40, 40, image::Rgb([255, 255, 255]));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn extractor() -> Extractor {
    Extractor::new(ExtractorConfig::default(), Arc::new(LetterOcr))
}

// ============================================================
// Chain: Extractor -> Comparator
// ============================================================

#[tokio::test]
async fn pdf_and_scan_of_same_letter_are_similar() {
    let extractor = extractor();
    let comparator = Comparator::default();

    let pdf = extractor
        .extract(
            single_page_pdf("hiermit kuendige ich den Mietvertrag fuer die Wohnung zum Monatsende"),
            "kuendigung.pdf",
        )
        .await;
    let scan = extractor.extract(png_bytes(), "scan.png").await;
    let unrelated = extractor
        .extract(single_page_pdf("Rechnung Stromverbrauch Quartal"), "rechnung.pdf")
        .await;

    let similar = comparator.compare_documents(&pdf, &scan).unwrap();
    let different = comparator.compare_documents(&unrelated, &scan).unwrap();

    assert!(similar.result.score > 0.0);
    assert_eq!(different.result.score, 0.0);
    assert_eq!(similar.reference.filename, "kuendigung.pdf");
    assert!(similar.candidate.preview.starts_with("Sehr geehrte"));
}

#[tokio::test]
async fn rank_documents_puts_best_match_first() {
    let extractor = extractor();
    let comparator = Comparator::default();

    let reference = extractor.extract(png_bytes(), "brief.jpg").await;
    let candidates = vec![
        extractor
            .extract(single_page_pdf("Rechnung Nummer 17"), "rechnung.pdf")
            .await,
        extractor
            .extract(single_page_pdf("kuendige Mietvertrag Wohnung Monatsende"), "treffer.pdf")
            .await,
        extractor.extract(b"plain".to_vec(), "notiz.txt").await,
    ];

    let ranked = comparator.rank_documents(&reference, &candidates).unwrap();
    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0].document.filename, "treffer.pdf");
    assert!(ranked[0].score > ranked[1].score);
}

#[tokio::test]
async fn abort_policy_surfaces_broken_candidate() {
    let extractor = extractor();
    let comparator = Comparator::default();

    let reference = extractor.extract(png_bytes(), "brief.png").await;
    let broken = extractor.extract(b"garbage".to_vec(), "kaputt.pdf").await;

    let err = comparator.compare_documents(&reference, &broken).unwrap_err();
    let CompareError::Extraction { filename, source } = err;
    assert_eq!(filename, "kaputt.pdf");
    assert!(source.to_string().starts_with("Error processing PDF"));
}

#[tokio::test]
async fn previews_are_truncated_for_long_documents() {
    let extractor = extractor();
    let comparator = Comparator::new(TfIdfVectorizer::default(), ErrorPolicy::ZeroScore);

    let long_text = "Wohnung ".repeat(200);
    let long = extractor
        .extract(single_page_pdf(&long_text), "lang.pdf")
        .await;
    let scan = extractor.extract(png_bytes(), "scan.png").await;

    let result = comparator.compare_documents(&long, &scan).unwrap();
    assert_eq!(result.reference.preview.chars().count(), PREVIEW_CHARS);
}

// ============================================================
// Session cache in front of extraction
// ============================================================

#[tokio::test]
async fn session_resolve_extracts_once_per_session() {
    let extractor = extractor();
    let cache = Mutex::new(SessionCache::new());
    let calls = AtomicUsize::new(0);

    for _ in 0..3 {
        let doc = SessionCache::resolve(&cache, "sitzung-1", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            extractor.extract(png_bytes(), "referenz.png").await
        })
        .await;
        assert_eq!(doc.filename, "referenz.png");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Another session overwrites the single slot
    SessionCache::resolve(&cache, "sitzung-2", || async {
        calls.fetch_add(1, Ordering::SeqCst);
        extractor.extract(png_bytes(), "andere.png").await
    })
    .await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(cache.lock().await.get("sitzung-1").is_none());
}

// ============================================================
// Config -> Extractor/Comparator
// ============================================================

#[test]
fn config_policy_reaches_comparator() {
    let config = Config::from_lookup(|key| match key {
        "DOCCOMPARE_ON_ERROR" => Some("inline".to_string()),
        "DOCCOMPARE_STOPWORDS" => Some("none".to_string()),
        _ => None,
    })
    .unwrap();

    let comparator = config.comparator();
    assert_eq!(comparator.policy(), ErrorPolicy::Inline);
    // With no stopwords, articles count as shared terms
    assert!(comparator.compare("der die das", "das die der") > 0.0);
}

#[test]
fn config_rejects_bad_values() {
    assert!(Config::from_lookup(|key| (key == "DOCCOMPARE_OCR_TIMEOUT_SECS").then(|| "0".into())).is_err());
    assert!(Config::from_lookup(|key| (key == "DOCCOMPARE_ON_ERROR").then(|| "maybe".into())).is_err());
}
