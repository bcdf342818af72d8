//! Fallback handler for unknown routes.

use crate::api::error_response::plain_text;
use axum::{http::StatusCode, response::Response};

/// Any method/path other than `POST /` - 404 with a plain-text body
pub async fn not_found() -> Response {
    plain_text(StatusCode::NOT_FOUND, "404")
}
