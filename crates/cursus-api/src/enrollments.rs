//! Handlers for `/enrollments` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/enrollments` | Body: `{"learner_id":..,"course_id":..}`; 409 if already enrolled |
//! | `GET`  | `/enrollments/:learner_id/:course_id` | 404 if not enrolled |
//! | `GET`  | `/enrollments/learner/:learner_id` | newest first |
//! | `GET`  | `/enrollments/course/:course_id` | oldest first |
//! | `DELETE` | `/enrollments/:learner_id/:course_id` | admin unenroll; keeps certificates |
//! | `POST` | `/enrollments/:learner_id/:course_id/lessons/:lesson_id/complete` | completion event |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use cursus_core::{
  catalog::{CourseCatalog, LearnerDirectory},
  enrollment::Enrollment,
  store::EnrollmentStore,
  tracker::{CompletionOutcome, ProgressTracker},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EnrollBody {
  pub learner_id: Uuid,
  pub course_id:  Uuid,
}

/// `POST /enrollments`
pub async fn create<S, C>(
  State(tracker): State<Arc<ProgressTracker<S, C>>>,
  Json(body): Json<EnrollBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EnrollmentStore,
  C: CourseCatalog + LearnerDirectory,
{
  let enrollment = tracker.enroll(body.learner_id, body.course_id).await?;
  tracing::info!(
    learner_id = %body.learner_id,
    course_id = %body.course_id,
    "learner enrolled"
  );
  Ok((StatusCode::CREATED, Json(enrollment)))
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /enrollments/:learner_id/:course_id`
pub async fn get_one<S, C>(
  State(tracker): State<Arc<ProgressTracker<S, C>>>,
  Path((learner_id, course_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Enrollment>, ApiError>
where
  S: EnrollmentStore,
  C: CourseCatalog + LearnerDirectory,
{
  Ok(Json(tracker.enrollment(learner_id, course_id).await?))
}

/// `GET /enrollments/learner/:learner_id`
pub async fn list_for_learner<S, C>(
  State(tracker): State<Arc<ProgressTracker<S, C>>>,
  Path(learner_id): Path<Uuid>,
) -> Result<Json<Vec<Enrollment>>, ApiError>
where
  S: EnrollmentStore,
  C: CourseCatalog + LearnerDirectory,
{
  Ok(Json(tracker.enrollments_for_learner(learner_id).await?))
}

/// `GET /enrollments/course/:course_id`
pub async fn list_for_course<S, C>(
  State(tracker): State<Arc<ProgressTracker<S, C>>>,
  Path(course_id): Path<Uuid>,
) -> Result<Json<Vec<Enrollment>>, ApiError>
where
  S: EnrollmentStore,
  C: CourseCatalog + LearnerDirectory,
{
  Ok(Json(tracker.enrollments_for_course(course_id).await?))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /enrollments/:learner_id/:course_id`
pub async fn delete_one<S, C>(
  State(tracker): State<Arc<ProgressTracker<S, C>>>,
  Path((learner_id, course_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError>
where
  S: EnrollmentStore,
  C: CourseCatalog + LearnerDirectory,
{
  tracker.unenroll(learner_id, course_id).await?;
  tracing::info!(%learner_id, %course_id, "enrollment removed");
  Ok(StatusCode::NO_CONTENT)
}

// ─── The completion event ────────────────────────────────────────────────────

/// `POST /enrollments/:learner_id/:course_id/lessons/:lesson_id/complete`
pub async fn complete_lesson<S, C>(
  State(tracker): State<Arc<ProgressTracker<S, C>>>,
  Path((learner_id, course_id, lesson_id)): Path<(Uuid, Uuid, String)>,
) -> Result<Json<CompletionOutcome>, ApiError>
where
  S: EnrollmentStore,
  C: CourseCatalog + LearnerDirectory,
{
  let outcome = tracker
    .record_lesson_completion(learner_id, course_id, &lesson_id)
    .await?;

  if let Some(certificate) = &outcome.certificate {
    tracing::info!(
      %learner_id,
      %course_id,
      certificate_id = %certificate.certificate_id,
      "course completed"
    );
  }

  Ok(Json(outcome))
}
