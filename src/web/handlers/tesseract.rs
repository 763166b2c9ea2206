// GET /test-tesseract: report the OCR engine's version and installed
// language models, so a deployment can confirm `deu` is available.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::web::AppState;

pub async fn test_tesseract(State(state): State<AppState>) -> Response {
    let version = state.tesseract.version().await;
    let languages = state.tesseract.languages().await;

    match (version, languages) {
        (Ok(version), Ok(languages)) => Html(format!(
            "Tesseract version: {version}<br>Available languages: {}",
            languages.join(", ")
        ))
        .into_response(),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Tesseract diagnostics failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Html(format!("Tesseract error: {e}")),
            )
                .into_response()
        }
    }
}
