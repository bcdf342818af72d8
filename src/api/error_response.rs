//! HTTP response writing for the API
//!
//! Successful batches are written as `application/json`; every failure is
//! written as `text/plain` carrying the error's status code and message.

use crate::error::{Error, FetchError, ToHttpStatus};
use crate::types::OrchestrationResult;
use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Build a `text/plain` response with the given status and body
pub fn plain_text(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain")],
        message.into(),
    )
        .into_response()
}

fn status_of(error: &impl ToHttpStatus) -> StatusCode {
    StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Implement IntoResponse for Error to automatically convert errors to HTTP responses
///
/// Batch-level errors carry their own message. Operator-side errors are logged
/// and reported as a generic internal error so no diagnostic detail leaks.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(e) => plain_text(status_of(&e), e.to_string()),
            Error::Fetch(e) => e.into_response(),
            other => {
                tracing::error!(error = %other, code = other.error_code(), "request failed");
                FetchError::Internal.into_response()
            }
        }
    }
}

impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        plain_text(status_of(&self), self.to_string())
    }
}

/// `Completed` → 200 `{"responses": [...]}`; `Aborted` → carried status, plain text
impl IntoResponse for OrchestrationResult {
    fn into_response(self) -> Response {
        match self {
            OrchestrationResult::Completed(response) => match serde_json::to_vec(&response) {
                Ok(body) => (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "application/json")],
                    body,
                )
                    .into_response(),
                Err(e) => {
                    tracing::error!(error = %e, "failed to serialize batch response");
                    FetchError::Internal.into_response()
                }
            },
            OrchestrationResult::Aborted(error) => error.into_response(),
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::types::BatchResponse;

    async fn body_string(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn content_type(response: &Response) -> &str {
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[tokio::test]
    async fn test_completed_is_json_200() {
        let result = OrchestrationResult::Completed(BatchResponse {
            responses: vec!["a".into(), "b".into()],
        });
        let response = result.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), "application/json");
        assert_eq!(body_string(response).await, r#"{"responses":["a","b"]}"#);
    }

    #[tokio::test]
    async fn test_aborted_upstream_status_is_passed_through() {
        let result = OrchestrationResult::Aborted(FetchError::UpstreamStatus {
            url: "http://x/y".into(),
            status: 418,
        });
        let response = result.into_response();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(content_type(&response), "text/plain");
        assert_eq!(
            body_string(response).await,
            "failed to get \"http://x/y\" with status code: 418"
        );
    }

    #[tokio::test]
    async fn test_deadline_is_408() {
        let response = OrchestrationResult::Aborted(FetchError::DeadlineExceeded).into_response();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body_string(response).await, "request timeout");
    }

    #[tokio::test]
    async fn test_validation_error_is_plain_text_400() {
        let error: Error = ValidationError::TooManyUrls { max: 20 }.into();
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(content_type(&response), "text/plain");
        assert_eq!(
            body_string(response).await,
            "the maximum number of URLs allowed is 20"
        );
    }

    #[tokio::test]
    async fn test_operator_errors_do_not_leak_details() {
        let error = Error::ApiServerError("listener exploded at 0xdeadbeef".into());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "internal server error");
    }

    #[tokio::test]
    async fn test_plain_text_helper() {
        let response = plain_text(StatusCode::NOT_FOUND, "404");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(content_type(&response), "text/plain");
        assert_eq!(body_string(response).await, "404");
    }
}
