//! Applying lesson-completion events to enrollments.
//!
//! The tracker owns the read-modify-write cycle: fetch the lesson sequence
//! (bounded by a timeout), gate the event through [`crate::policy`], derive
//! the new persisted state, and write it through the store's
//! compare-and-swap, retrying a bounded number of times when a concurrent
//! writer wins the version check. The persisted enrollment is the sole
//! source of truth for progress — nothing is tracked in process memory.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  catalog::{CourseCatalog, LearnerDirectory, LessonSequence},
  certificate::Certificate,
  enrollment::{CompletionStatus, Enrollment, NewEnrollment},
  issuer::CertificateIssuer,
  policy,
  store::{EnrollmentStore, ProgressPatch},
  Error, Result,
};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TrackerConfig {
  /// Upper bound on a catalog lookup. On elapse the completion event is
  /// rejected with `CatalogUnavailable` so the client can retry; it is
  /// never silently skipped.
  pub catalog_timeout:    Duration,
  /// How many times a completion event re-reads and re-writes after losing
  /// the version check. Exhausting the budget surfaces the conflict rather
  /// than masking a persistently contended record.
  pub max_write_attempts: u32,
}

impl Default for TrackerConfig {
  fn default() -> Self {
    Self {
      catalog_timeout:    Duration::from_secs(5),
      max_write_attempts: 4,
    }
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// What a completion event produced.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CompletionOutcome {
  pub enrollment:  Enrollment,
  /// Present whenever the enrollment is `Completed` after this event —
  /// both on the completing call itself and on idempotent re-delivery of a
  /// final-lesson event, so every caller observes the same certificate.
  pub certificate: Option<Certificate>,
}

// ─── Tracker ─────────────────────────────────────────────────────────────────

pub struct ProgressTracker<S, C> {
  store:   Arc<S>,
  catalog: Arc<C>,
  issuer:  CertificateIssuer<S>,
  config:  TrackerConfig,
}

impl<S, C> ProgressTracker<S, C>
where
  S: EnrollmentStore,
  C: CourseCatalog + LearnerDirectory,
{
  pub fn new(store: Arc<S>, catalog: Arc<C>) -> Self {
    Self::with_config(store, catalog, TrackerConfig::default())
  }

  pub fn with_config(
    store: Arc<S>,
    catalog: Arc<C>,
    config: TrackerConfig,
  ) -> Self {
    let issuer = CertificateIssuer::new(Arc::clone(&store));
    Self { store, catalog, issuer, config }
  }

  pub fn issuer(&self) -> &CertificateIssuer<S> { &self.issuer }

  // ── Enrollment lifecycle ──────────────────────────────────────────────

  /// Enroll a learner in a course.
  ///
  /// Both references are validated against the external collaborators
  /// before the row is created; an existing pair surfaces as
  /// `AlreadyEnrolled`.
  pub async fn enroll(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
  ) -> Result<Enrollment> {
    if !self.catalog.learner_exists(learner_id).await? {
      return Err(Error::LearnerNotFound(learner_id));
    }
    // Also validates the course reference: an unknown course fails here
    // with CourseNotFound before anything is written.
    self.lesson_sequence(course_id).await?;

    self
      .store
      .create_enrollment(NewEnrollment { learner_id, course_id })
      .await
  }

  /// Administrative unenroll. Never retracts an issued certificate.
  pub async fn unenroll(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
  ) -> Result<()> {
    self.store.delete_enrollment(learner_id, course_id).await
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub async fn enrollment(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
  ) -> Result<Enrollment> {
    self
      .store
      .enrollment(learner_id, course_id)
      .await?
      .ok_or(Error::EnrollmentNotFound { learner_id, course_id })
  }

  pub async fn enrollments_for_learner(
    &self,
    learner_id: Uuid,
  ) -> Result<Vec<Enrollment>> {
    self.store.enrollments_for_learner(learner_id).await
  }

  pub async fn enrollments_for_course(
    &self,
    course_id: Uuid,
  ) -> Result<Vec<Enrollment>> {
    self.store.enrollments_for_course(course_id).await
  }

  // ── The completion event ──────────────────────────────────────────────

  /// Apply the event "lesson `lesson_id` of `course_id` finished playing
  /// for `learner_id`" — the single public mutating operation of the core.
  ///
  /// Re-delivery of the same event (double submission, client retry) is an
  /// idempotent no-op that only refreshes `last_accessed`.
  pub async fn record_lesson_completion(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
    lesson_id: &str,
  ) -> Result<CompletionOutcome> {
    let seq = self.lesson_sequence(course_id).await?;
    let index = seq.position(lesson_id).ok_or_else(|| {
      Error::UnknownLesson { course_id, lesson_id: lesson_id.to_owned() }
    })?;

    let mut attempt = 0;
    loop {
      attempt += 1;

      let enrollment = self
        .store
        .enrollment(learner_id, course_id)
        .await?
        .ok_or(Error::EnrollmentNotFound { learner_id, course_id })?;

      let result = self.apply(&enrollment, &seq, index).await;
      match result {
        Err(Error::VersionConflict { .. })
          if attempt < self.config.max_write_attempts =>
        {
          continue;
        }
        other => return other,
      }
    }
  }

  /// One read-modify-write attempt against a snapshot of the enrollment.
  async fn apply(
    &self,
    enrollment: &Enrollment,
    seq: &LessonSequence,
    index: usize,
  ) -> Result<CompletionOutcome> {
    let frontier = policy::frontier_index(enrollment, seq);
    if !policy::can_access(index, enrollment, seq) {
      return Err(Error::IllegalTransition { attempted: index, frontier });
    }

    let now = Utc::now();
    let watched_before = policy::watched_count(enrollment, seq);

    // Already inside the watched set: re-delivered event. Touch the access
    // timestamp and return the current state unchanged.
    if index < watched_before {
      let patch = ProgressPatch {
        progress:            enrollment.progress,
        status:              enrollment.status,
        last_lesson_watched: enrollment.last_lesson_watched.clone(),
        last_accessed:       now,
        completed_at:        enrollment.completed_at,
      };
      let updated = self
        .store
        .update_progress(
          enrollment.learner_id,
          enrollment.course_id,
          enrollment.version,
          patch,
        )
        .await?;
      return self.outcome(updated).await;
    }

    let advance = policy::record_completion(index, enrollment, seq);
    let total = seq.len();
    let watched = watched_before.max(index + 1);
    let is_final = index + 1 == total;

    // round(watched/total * 100), clamped so that only the final lesson can
    // reach 100 (progress == 100 must coincide with Completed), and never
    // below the previously persisted value.
    let progress = if is_final {
      100
    } else {
      let computed =
        ((watched as f64 / total as f64) * 100.0).round() as u8;
      computed.min(99).max(enrollment.progress)
    };

    let status = if progress == 100 {
      CompletionStatus::Completed
    } else if progress > 0 {
      CompletionStatus::InProgress
    } else {
      enrollment.status
    };

    let newly_completed =
      status.is_completed() && !enrollment.status.is_completed();

    // Resume at the lesson after the completed one; on the final lesson the
    // pointer stays on it.
    let resume = advance
      .next_lesson
      .or_else(|| seq.get(index).map(|l| l.lesson_id.clone()));

    let patch = ProgressPatch {
      progress,
      status,
      last_lesson_watched: resume,
      last_accessed: now,
      completed_at: if newly_completed {
        Some(now)
      } else {
        enrollment.completed_at
      },
    };

    let updated = self
      .store
      .update_progress(
        enrollment.learner_id,
        enrollment.course_id,
        enrollment.version,
        patch,
      )
      .await?;
    self.outcome(updated).await
  }

  /// Attach the certificate whenever the enrollment is completed; issuance
  /// is idempotent, so re-delivered final-lesson events converge on the
  /// same record.
  async fn outcome(&self, enrollment: Enrollment) -> Result<CompletionOutcome> {
    let certificate = if enrollment.status.is_completed() {
      Some(
        self
          .issuer
          .issue(enrollment.learner_id, enrollment.course_id)
          .await?,
      )
    } else {
      None
    };
    Ok(CompletionOutcome { enrollment, certificate })
  }

  // ── Catalog access ────────────────────────────────────────────────────

  async fn lesson_sequence(&self, course_id: Uuid) -> Result<LessonSequence> {
    match tokio::time::timeout(
      self.config.catalog_timeout,
      self.catalog.lesson_sequence(course_id),
    )
    .await
    {
      Ok(result) => result,
      Err(_) => Err(Error::CatalogUnavailable(format!(
        "lesson sequence lookup for course {course_id} timed out"
      ))),
    }
  }
}
