//! The `EnrollmentStore` trait and supporting write types.
//!
//! The trait is implemented by storage backends (e.g.
//! `cursus-store-sqlite`). Higher layers (`cursus-api`, the tracker, the
//! issuer) depend on this abstraction, not on any concrete backend.
//!
//! Methods return the shared semantic [`Error`](crate::Error) rather than a
//! backend-specific type: the tracker retries on `VersionConflict` and the
//! issuer recovers from `DuplicateCertificate`, so those outcomes must be
//! distinguishable regardless of backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  certificate::{Certificate, NewCertificate},
  enrollment::{CompletionStatus, Enrollment, NewEnrollment},
  Result,
};

// ─── Write type ──────────────────────────────────────────────────────────────

/// The mutable portion of an enrollment, written as one atomic unit by
/// [`EnrollmentStore::update_progress`]. Identity fields, the enrollment
/// date, and the version counter are never patched directly.
#[derive(Debug, Clone)]
pub struct ProgressPatch {
  pub progress:            u8,
  pub status:              CompletionStatus,
  pub last_lesson_watched: Option<String>,
  pub last_accessed:       DateTime<Utc>,
  pub completed_at:        Option<DateTime<Utc>>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a cursus storage backend.
///
/// Implementations must uphold two guarantees that the components above
/// rely on:
/// - at most one enrollment and at most one certificate per
///   (learner, course) pair, enforced by storage constraints;
/// - `update_progress` is an atomic compare-and-swap on the enrollment's
///   version counter.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait EnrollmentStore: Send + Sync {
  // ── Enrollments ───────────────────────────────────────────────────────

  /// Create an enrollment in its initial state (no progress, `NotStarted`).
  ///
  /// Fails with [`Error::AlreadyEnrolled`](crate::Error::AlreadyEnrolled)
  /// when the pair already exists.
  fn create_enrollment(
    &self,
    input: NewEnrollment,
  ) -> impl Future<Output = Result<Enrollment>> + Send + '_;

  /// Retrieve one enrollment. Returns `None` if the pair is not enrolled.
  fn enrollment(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
  ) -> impl Future<Output = Result<Option<Enrollment>>> + Send + '_;

  /// All enrollments for a learner, newest first.
  fn enrollments_for_learner(
    &self,
    learner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Enrollment>>> + Send + '_;

  /// All enrollments in a course, oldest first.
  fn enrollments_for_course(
    &self,
    course_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Enrollment>>> + Send + '_;

  /// Atomically replace the mutable state of an enrollment, provided its
  /// current version equals `expected_version`; the stored version is
  /// incremented on success.
  ///
  /// Fails with [`Error::VersionConflict`](crate::Error::VersionConflict)
  /// when another writer got there first, and with
  /// [`Error::EnrollmentNotFound`](crate::Error::EnrollmentNotFound) when
  /// the row is gone (e.g. an administrative unenroll raced the write).
  fn update_progress(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
    expected_version: i64,
    patch: ProgressPatch,
  ) -> impl Future<Output = Result<Enrollment>> + Send + '_;

  /// Administrative unenroll. Removes the enrollment record only; any
  /// already-issued certificate is deliberately left in place.
  fn delete_enrollment(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Certificates ──────────────────────────────────────────────────────

  /// Retrieve the certificate for a pair, if one has been issued.
  fn certificate(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
  ) -> impl Future<Output = Result<Option<Certificate>>> + Send + '_;

  /// Persist a new certificate. The storage-level unique-pair constraint is
  /// the authoritative duplicate guard: a concurrent insert for the same
  /// pair must surface as
  /// [`Error::DuplicateCertificate`](crate::Error::DuplicateCertificate)
  /// so the issuer can return the winning record instead.
  fn insert_certificate(
    &self,
    input: NewCertificate,
  ) -> impl Future<Output = Result<Certificate>> + Send + '_;
}
