//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use cursus_core::Error;
use serde_json::json;

/// An error returned by an API handler — the core taxonomy mapped onto
/// HTTP status codes.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self.0 {
      Error::LearnerNotFound(_)
      | Error::CourseNotFound(_)
      | Error::EnrollmentNotFound { .. }
      | Error::CertificateNotFound { .. } => StatusCode::NOT_FOUND,

      Error::UnknownLesson { .. } => StatusCode::UNPROCESSABLE_ENTITY,

      // Conflicts: the caller's picture of the world is stale. A retried
      // read (or, for IllegalTransition, finishing the preceding lessons)
      // resolves these.
      Error::AlreadyEnrolled { .. }
      | Error::IllegalTransition { .. }
      | Error::NotEligible { .. }
      | Error::VersionConflict { .. } => StatusCode::CONFLICT,

      Error::CatalogUnavailable(_) => StatusCode::BAD_GATEWAY,

      // DuplicateCertificate is handled inside the issuer and should never
      // reach a handler; seeing it here, or any corruption, is a server
      // fault worth alerting on.
      Error::DuplicateCertificate { .. }
      | Error::Corrupt(_)
      | Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
      tracing::error!(error = %self.0, "internal error serving request");
    }

    (status, Json(json!({ "error": self.0.to_string() }))).into_response()
  }
}
