//! Handlers for `/certificates` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/certificates` | Idempotent issuance; body: `{"learner_id":..,"course_id":..}` |
//! | `GET`  | `/certificates/:learner_id/:course_id` | 404 until issued |
//!
//! The POST surface lets a certificate view lazily generate on first visit;
//! repeated calls always return the one persisted record.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use cursus_core::{
  catalog::{CourseCatalog, LearnerDirectory},
  certificate::Certificate,
  store::EnrollmentStore,
  tracker::ProgressTracker,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct IssueBody {
  pub learner_id: Uuid,
  pub course_id:  Uuid,
}

/// `POST /certificates`
pub async fn issue<S, C>(
  State(tracker): State<Arc<ProgressTracker<S, C>>>,
  Json(body): Json<IssueBody>,
) -> Result<Json<Certificate>, ApiError>
where
  S: EnrollmentStore,
  C: CourseCatalog + LearnerDirectory,
{
  let certificate = tracker
    .issuer()
    .issue(body.learner_id, body.course_id)
    .await?;
  tracing::info!(
    learner_id = %body.learner_id,
    course_id = %body.course_id,
    certificate_id = %certificate.certificate_id,
    "certificate issued or re-served"
  );
  Ok(Json(certificate))
}

/// `GET /certificates/:learner_id/:course_id`
pub async fn get_one<S, C>(
  State(tracker): State<Arc<ProgressTracker<S, C>>>,
  Path((learner_id, course_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Certificate>, ApiError>
where
  S: EnrollmentStore,
  C: CourseCatalog + LearnerDirectory,
{
  Ok(Json(tracker.issuer().get(learner_id, course_id).await?))
}
