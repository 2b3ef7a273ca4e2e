use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::actions::{FailureKind, Outcome};

// ============================================================================
// Outcome envelope (application API)
// ============================================================================

pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::Auth => StatusCode::UNAUTHORIZED,
        FailureKind::Conflict => StatusCode::CONFLICT,
        FailureKind::ExternalService => StatusCode::BAD_GATEWAY,
        FailureKind::NotFound => StatusCode::NOT_FOUND,
        FailureKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        FailureKind::Validation => StatusCode::BAD_REQUEST,
    }
}

impl<T: Serialize> IntoResponse for Outcome<T> {
    fn into_response(self) -> Response {
        let status = self.failure.map(status_for).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// A request that never reached its action, answered as a validation failure.
pub fn invalid_request(message: impl Into<String>) -> Outcome<()> {
    Outcome::failure(FailureKind::Validation, message)
}

// ============================================================================
// Plain-text errors (public read API)
// ============================================================================

/// Errors of the public read API. Bodies are the bare status reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    Unauthorized,
    NotFound,
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not Found"),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        };
        (status, body).into_response()
    }
}

// ============================================================================
// Custom extractors (reject with an Outcome)
// ============================================================================

/// Drop-in replacement for `axum::Json` that rejects with an `Outcome` body.
pub struct AppJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Outcome<()>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Outcome<()>> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                let message = match rejection {
                    JsonRejection::JsonDataError(err) => {
                        format!("Invalid request body: {}", err.body_text())
                    }
                    JsonRejection::JsonSyntaxError(_) => "Malformed JSON in request body".into(),
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing Content-Type: application/json header".into()
                    }
                    _ => "Failed to read request body".into(),
                };
                Err(invalid_request(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds_map_to_statuses() {
        assert_eq!(status_for(FailureKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(FailureKind::Auth), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(FailureKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(FailureKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(FailureKind::ExternalService), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(FailureKind::Unknown),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_outcome_body_hides_failure_kind() {
        let outcome: Outcome<()> = Outcome::failure(FailureKind::NotFound, "Post not found");
        let body = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"success": false, "message": "Post not found"})
        );
    }
}
