//! Error types for `cursus-core`.
//!
//! One semantic taxonomy is shared across layers so that components can
//! react to specific outcomes: the tracker retries on [`Error::VersionConflict`]
//! and the issuer recovers from [`Error::DuplicateCertificate`]. Backend
//! faults that carry no domain meaning travel in [`Error::Storage`].

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  // ── Not found ─────────────────────────────────────────────────────────

  #[error("learner not found: {0}")]
  LearnerNotFound(Uuid),

  #[error("course not found: {0}")]
  CourseNotFound(Uuid),

  #[error("learner {learner_id} is not enrolled in course {course_id}")]
  EnrollmentNotFound { learner_id: Uuid, course_id: Uuid },

  #[error("no certificate issued to learner {learner_id} for course {course_id}")]
  CertificateNotFound { learner_id: Uuid, course_id: Uuid },

  // ── Validation ────────────────────────────────────────────────────────

  #[error("lesson {lesson_id:?} does not exist in course {course_id}")]
  UnknownLesson { course_id: Uuid, lesson_id: String },

  // ── Conflicts ─────────────────────────────────────────────────────────

  #[error("learner {learner_id} is already enrolled in course {course_id}")]
  AlreadyEnrolled { learner_id: Uuid, course_id: Uuid },

  /// A completion event for a lesson the learner has not unlocked yet.
  #[error("lesson {attempted} is still locked; highest unlocked lesson is {frontier}")]
  IllegalTransition { attempted: usize, frontier: usize },

  #[error("learner {learner_id} has not completed course {course_id}")]
  NotEligible { learner_id: Uuid, course_id: Uuid },

  /// The unique-pair constraint on certificates fired. The issuer converts
  /// this into returning the record that won the race; it never escapes to
  /// API callers.
  #[error("certificate already exists for learner {learner_id} in course {course_id}")]
  DuplicateCertificate { learner_id: Uuid, course_id: Uuid },

  /// The optimistic version check on an enrollment write failed.
  #[error("enrollment for learner {learner_id} in course {course_id} was modified concurrently")]
  VersionConflict { learner_id: Uuid, course_id: Uuid },

  // ── Infrastructure ────────────────────────────────────────────────────

  #[error("course catalog unavailable: {0}")]
  CatalogUnavailable(String),

  /// A storage invariant was violated (e.g. two certificates for one pair,
  /// or an undecodable row). Alert, do not auto-heal.
  #[error("storage invariant violated: {0}")]
  Corrupt(String),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
