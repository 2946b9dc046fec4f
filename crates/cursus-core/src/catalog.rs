//! Read-side contracts with the external collaborators.
//!
//! Course content and learner identity are owned elsewhere; the core only
//! reads them through these two narrow traits. A course's lesson sequence
//! may change between calls (content edits after enrollment) — consumers
//! must not cache it across requests and must tolerate a stale
//! `last_lesson_watched` (see [`crate::policy`]).

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

// ─── Lessons ─────────────────────────────────────────────────────────────────

/// One lesson as the catalog describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
  pub lesson_id:        String,
  pub duration_seconds: u32,
}

/// The ordered lessons of a course — the single source of truth for
/// "next lesson" computations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LessonSequence(Vec<Lesson>);

impl LessonSequence {
  pub fn new(lessons: Vec<Lesson>) -> Self { Self(lessons) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn get(&self, index: usize) -> Option<&Lesson> { self.0.get(index) }

  /// Position of a lesson id in the sequence, if it is (still) present.
  pub fn position(&self, lesson_id: &str) -> Option<usize> {
    self.0.iter().position(|l| l.lesson_id == lesson_id)
  }

  pub fn lessons(&self) -> &[Lesson] { &self.0 }

  pub fn total_duration_seconds(&self) -> u32 {
    self.0.iter().map(|l| l.duration_seconds).sum()
  }
}

// ─── Collaborator traits ─────────────────────────────────────────────────────

/// Read view onto the system that owns course content.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CourseCatalog: Send + Sync {
  /// The ordered lesson sequence for a course.
  ///
  /// Fails with [`crate::Error::CourseNotFound`] for an unknown course.
  /// Callers bound this with a timeout; implementations may be remote.
  fn lesson_sequence(
    &self,
    course_id: Uuid,
  ) -> impl Future<Output = Result<LessonSequence>> + Send + '_;
}

/// Read view onto the system that owns learner registration.
pub trait LearnerDirectory: Send + Sync {
  fn learner_exists(
    &self,
    learner_id: Uuid,
  ) -> impl Future<Output = Result<bool>> + Send + '_;
}
