// POST /submit: compare two uploaded documents.
//
// Expects multipart fields `file1` and `file2`. If the caller's session
// already holds a cached first document, that document is used as the
// reference and the uploaded `file1` is ignored. Uploads stay in memory.
//
// 200: { file1_name, text1, file2_name, text2, tfidf_similarity, ... }
// 400: a file is missing or has no filename
// 422: an extraction failed and the error policy is `abort`

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::web::{api_error, new_session_id, session_cookie, session_from_headers, AppState};
use crate::compare::SessionCache;

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut file1: Option<Option<Upload>> = None;
    let mut file2: Option<Option<Upload>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return api_error(StatusCode::BAD_REQUEST, &format!("Invalid upload: {e}")),
        };

        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(sanitize_filename).unwrap_or_default();
        let bytes = match field.bytes().await {
            Ok(b) => b.to_vec(),
            Err(e) => return api_error(StatusCode::BAD_REQUEST, &format!("Invalid upload: {e}")),
        };

        let upload = (!filename.is_empty()).then_some(Upload { filename, bytes });
        match name.as_str() {
            "file1" => file1 = Some(upload),
            "file2" => file2 = Some(upload),
            _ => {}
        }
    }

    let (Some(file1), Some(file2)) = (file1, file2) else {
        return api_error(StatusCode::BAD_REQUEST, "Please upload both files!");
    };
    let (Some(file1), Some(file2)) = (file1, file2) else {
        return api_error(StatusCode::BAD_REQUEST, "Please select both files!");
    };

    let (session, is_new_session) = match session_from_headers(&headers) {
        Some(s) => (s, false),
        None => (new_session_id(), true),
    };

    let extractor = state.extractor.clone();
    let reference = SessionCache::resolve(&state.sessions, &session, || async move {
        extractor.extract(file1.bytes, &file1.filename).await
    })
    .await;
    let candidate = state.extractor.extract(file2.bytes, &file2.filename).await;

    let comparison = match state.comparator.compare_documents(&reference, &candidate) {
        Ok(c) => c,
        Err(e) => return api_error(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()),
    };

    let body = Json(serde_json::json!({
        "file1_name": comparison.reference.filename,
        "text1": comparison.reference.preview,
        "file1_error": comparison.reference.error,
        "file2_name": comparison.candidate.filename,
        "text2": comparison.candidate.preview,
        "file2_error": comparison.candidate.error,
        "tfidf_similarity": comparison.result.score,
    }));

    if is_new_session {
        ([(header::SET_COOKIE, session_cookie(&session))], body).into_response()
    } else {
        body.into_response()
    }
}

/// Keep only the final path component and replace anything outside
/// `[A-Za-z0-9._-]` with '_'. Leading dots are stripped.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}
