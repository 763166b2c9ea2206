// Web server: Axum upload endpoint for two-document comparison.
//
// GET  /                starts a fresh session (drops any cached reference)
// POST /submit          multipart file1 + file2 → JSON similarity result
// GET  /test-tesseract  OCR engine version and installed languages
// GET  /health          liveness
//
// Sessions: an opaque random id in a cookie. The first document of a session
// is cached in a single-slot SessionCache and reused for later submissions
// until the session is reset.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use rand::RngCore;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::compare::{Comparator, SessionCache};
use crate::config::Config;
use crate::extract::ocr::TesseractEngine;
use crate::extract::Extractor;

pub mod handlers;

/// Session cookie name.
pub const COOKIE_NAME: &str = "doccompare_session";

/// Upload limit per request (both files together).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<Extractor>,
    pub comparator: Arc<Comparator>,
    pub tesseract: Arc<TesseractEngine>,
    pub sessions: Arc<Mutex<SessionCache>>,
}

impl AppState {
    pub fn new(extractor: Extractor, comparator: Comparator, tesseract: TesseractEngine) -> Self {
        Self {
            extractor: Arc::new(extractor),
            comparator: Arc::new(comparator),
            tesseract: Arc::new(tesseract),
            sessions: Arc::new(Mutex::new(SessionCache::new())),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.extractor(),
            config.comparator(),
            TesseractEngine::new(config.tesseract_cmd.clone()),
        )
    }
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(config: Config, port: u16, bind: &str) -> Result<()> {
    let state = AppState::from_config(&config);
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("doccompare listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index::index))
        .route("/submit", post(handlers::submit::submit))
        .route("/test-tesseract", get(handlers::tesseract::test_tesseract))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}

/// Fresh random session id (128-bit, hex).
pub fn new_session_id() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Read the session id from the request's Cookie header, if present.
pub fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty())
}

/// `Set-Cookie` value for `session`.
pub fn session_cookie(session: &str) -> String {
    format!("{COOKIE_NAME}={session}; Path=/; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, Request};
    use tower::ServiceExt;

    use crate::compare::ErrorPolicy;
    use crate::extract::ExtractorConfig;
    use crate::similarity::tfidf::TfIdfVectorizer;

    const BOUNDARY: &str = "XDOCCOMPAREBOUNDARY";

    fn state(policy: ErrorPolicy) -> AppState {
        AppState::new(
            Extractor::with_tesseract(ExtractorConfig::default(), "/nonexistent/tesseract"),
            Comparator::new(TfIdfVectorizer::default(), policy),
            TesseractEngine::new("/nonexistent/tesseract"),
        )
    }

    fn multipart_body(files: &[(&str, &str, &str)]) -> String {
        let mut body = String::new();
        for (field, filename, content) in files {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n\
                 {content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn submit_request(files: &[(&str, &str, &str)], cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/submit")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        builder.body(Body::from(multipart_body(files))).unwrap()
    }

    async fn json_body(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_session_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; doccompare_session=abc123"),
        );
        assert_eq!(session_from_headers(&headers), Some("abc123".to_string()));
        assert_eq!(session_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_new_session_ids_differ() {
        let a = new_session_id();
        assert_eq!(a.len(), 32);
        assert_ne!(a, new_session_id());
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(state(ErrorPolicy::Abort));
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_submit_requires_both_files() {
        let app = build_router(state(ErrorPolicy::Abort));
        let resp = app
            .oneshot(submit_request(&[("file1", "a.pdf", "x")], None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "Please upload both files!");
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_filename() {
        let app = build_router(state(ErrorPolicy::Abort));
        let resp = app
            .oneshot(submit_request(
                &[("file1", "a.pdf", "x"), ("file2", "", "")],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert_eq!(body["error"], "Please select both files!");
    }

    #[tokio::test]
    async fn test_submit_abort_policy_is_unprocessable() {
        let app = build_router(state(ErrorPolicy::Abort));
        let resp = app
            .oneshot(submit_request(
                &[("file1", "a.pdf", "not a pdf"), ("file2", "b.txt", "welt")],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(resp).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("Error processing PDF"));
    }

    #[tokio::test]
    async fn test_submit_unsupported_flows_through_under_abort() {
        let app = build_router(state(ErrorPolicy::Abort));
        let resp = app
            .oneshot(submit_request(
                &[("file1", "a.txt", "hallo"), ("file2", "b.docx", "welt")],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["text2"], "Unsupported file type");
    }

    #[tokio::test]
    async fn test_submit_inline_policy_and_session_reuse() {
        let app = build_router(state(ErrorPolicy::Inline));

        let resp = app
            .clone()
            .oneshot(submit_request(
                &[("file1", "first.txt", "a"), ("file2", "second.txt", "b")],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .unwrap()
            .to_string();
        let body = json_body(resp).await;
        assert_eq!(body["file1_name"], "first.txt");
        assert_eq!(body["text1"], "Unsupported file type");
        assert!((body["tfidf_similarity"].as_f64().unwrap() - 1.0).abs() < 1e-9);

        // Same session: the cached first document wins over the new upload
        let resp = app
            .oneshot(submit_request(
                &[("file1", "ignored.txt", "c"), ("file2", "third.txt", "d")],
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["file1_name"], "first.txt");
        assert_eq!(body["file2_name"], "third.txt");
    }

    #[tokio::test]
    async fn test_index_resets_session() {
        let state = state(ErrorPolicy::Inline);
        let app = build_router(state.clone());

        let resp = app
            .clone()
            .oneshot(submit_request(
                &[("file1", "first.txt", "a"), ("file2", "second.txt", "b")],
                Some("doccompare_session=s1"),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.sessions.lock().await.get("s1").is_some());

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::COOKIE, "doccompare_session=s1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.sessions.lock().await.is_empty());
    }
}
