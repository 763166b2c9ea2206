// GET /: start a new comparison session.
//
// Drops the cached reference document of the caller's current session (if
// any), issues a fresh session cookie and serves the upload form.

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse};

use crate::web::{new_session_id, session_cookie, session_from_headers, AppState};

const UPLOAD_FORM: &str = r#"<!doctype html>
<html lang="de">
<head><meta charset="utf-8"><title>Dokumentvergleich</title></head>
<body>
<h1>Dokumentvergleich</h1>
<form action="/submit" method="post" enctype="multipart/form-data">
  <p><label>Dokument 1 <input type="file" name="file1" accept=".pdf,.png,.jpg,.jpeg"></label></p>
  <p><label>Dokument 2 <input type="file" name="file2" accept=".pdf,.png,.jpg,.jpeg"></label></p>
  <p><button type="submit">Vergleichen</button></p>
</form>
</body>
</html>
"#;

pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(old) = session_from_headers(&headers) {
        if state.sessions.lock().await.evict(&old).is_some() {
            tracing::debug!(session = %old, "Reset session, cached reference dropped");
        }
    }

    let session = new_session_id();
    (
        [(header::SET_COOKIE, session_cookie(&session))],
        Html(UPLOAD_FORM),
    )
}
