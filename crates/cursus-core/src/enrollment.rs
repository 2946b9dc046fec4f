//! Enrollment — the record binding a learner to a course.
//!
//! There is at most one enrollment per (learner, course) pair; the storage
//! layer enforces the compound uniqueness. Progress is mutated only through
//! [`crate::tracker::ProgressTracker`], which goes through the store's
//! compare-and-swap write, so the `version` field serializes concurrent
//! updates to the same pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a learner stands in a course.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
  #[default]
  NotStarted,
  InProgress,
  Completed,
}

impl CompletionStatus {
  pub fn is_completed(self) -> bool { matches!(self, Self::Completed) }
}

/// One learner's relationship to one course.
///
/// Invariants, maintained by the tracker and checked by tests:
/// - `progress == 100` exactly when `status == Completed`
/// - `progress > 0` implies `status != NotStarted`
/// - `progress` never decreases over the lifetime of the record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
  pub learner_id:          Uuid,
  pub course_id:           Uuid,
  /// Percentage of the course completed, 0–100.
  pub progress:            u8,
  pub status:              CompletionStatus,
  /// Resume pointer: the lesson the learner should see next. `None` until
  /// the first lesson has been completed.
  pub last_lesson_watched: Option<String>,
  /// Set at creation; never changes afterwards.
  pub enrollment_date:     DateTime<Utc>,
  pub last_accessed:       DateTime<Utc>,
  /// The moment `status` became `Completed`. Copied onto the certificate at
  /// issuance so a delayed or retried issuance keeps the historical date.
  pub completed_at:        Option<DateTime<Utc>>,
  /// Optimistic-concurrency token; incremented by every successful write.
  pub version:             i64,
}

/// Input to [`crate::store::EnrollmentStore::create_enrollment`].
/// Timestamps and the initial state are always set by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEnrollment {
  pub learner_id: Uuid,
  pub course_id:  Uuid,
}
