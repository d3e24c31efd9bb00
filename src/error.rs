use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{auth::TokenError, password::HashError};

/// ApiError
///
/// The application's single error taxonomy. Every handler and middleware failure is
/// expressed as one of these variants; the `IntoResponse` implementation is the only
/// place where an internal failure is translated into an HTTP status and body.
///
/// The caller-facing split is deliberately coarse:
/// - 401 Unauthorized: the request never established an identity. The body is the same
///   generic message whether the credential was missing, malformed, expired, forged,
///   or referenced a deleted user.
/// - 403 Forbidden: identity established, role insufficient.
/// - 5xx: infrastructure failure. Full detail is logged server-side; neither the
///   credential nor the underlying error ever reaches the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No bearer credential on the request (absent header, wrong scheme, empty value).
    #[error("no bearer credential on the request")]
    MissingCredential,
    /// The presented token failed verification.
    #[error("bearer token rejected: {0}")]
    InvalidCredential(TokenError),
    /// The token verified but its subject no longer exists in the user store.
    #[error("token subject has no matching identity")]
    UnknownSubject,
    /// The resolved role does not satisfy the route's requirement.
    #[error("role does not satisfy the route requirement")]
    InsufficientRole,
    /// Login-time rejection. Unknown email and wrong password both produce this exact
    /// variant so the two cases cannot be told apart from outside.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Credential hashing infrastructure failed (entropy, malformed stored hash).
    #[error("credential hashing failed: {0}")]
    Hashing(HashError),
    #[error("resource not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::MissingCredential
            | ApiError::InvalidCredential(_)
            | ApiError::UnknownSubject => {
                // The precise reason stays in the server logs only.
                tracing::debug!("request rejected: {}", self);
                (StatusCode::UNAUTHORIZED, "unauthorized")
            }
            ApiError::InsufficientRole => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid credentials"),
            ApiError::Hashing(_) | ApiError::Internal(_) => {
                tracing::error!("internal failure: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found"),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
