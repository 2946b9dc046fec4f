//! The sequential-unlock policy.
//!
//! Pure functions over an [`Enrollment`] and a [`LessonSequence`] — no side
//! effects, no storage access. Lessons unlock strictly in order: a learner
//! may revisit anything they have watched plus the single next lesson, and
//! nothing beyond it. Enforcement lives here, server-side, exclusively; any
//! client-side gating is a UX convenience.
//!
//! The watched set is not stored as a set. It is derived from the resume
//! pointer (`last_lesson_watched`): every lesson strictly before it counts
//! as watched. When the pointer no longer matches the sequence (course
//! content edited since enrollment) the count falls back to a best-effort
//! derivation from the persisted percentage. The fallback is deterministic
//! but not authoritative.

use crate::{
  catalog::LessonSequence,
  enrollment::Enrollment,
};

/// Number of distinct lessons the learner has completed.
pub fn watched_count(enrollment: &Enrollment, seq: &LessonSequence) -> usize {
  if enrollment.progress == 100 {
    return seq.len();
  }
  match &enrollment.last_lesson_watched {
    None => 0,
    Some(lesson_id) => match seq.position(lesson_id) {
      // Lessons strictly before the resume pointer are watched.
      Some(pos) => pos,
      // Stale pointer: derive from the percentage instead.
      None => {
        (enrollment.progress as usize * seq.len()) / 100
      }
    },
  }
}

/// The highest lesson index the learner currently has access to.
pub fn frontier_index(enrollment: &Enrollment, seq: &LessonSequence) -> usize {
  watched_count(enrollment, seq).min(seq.len().saturating_sub(1))
}

/// Whether the learner may access the lesson at `index`.
/// Lesson 0 is always accessible (bootstrap case).
pub fn can_access(
  index: usize,
  enrollment: &Enrollment,
  seq: &LessonSequence,
) -> bool {
  index == 0 || index <= frontier_index(enrollment, seq)
}

/// The result of recording that the lesson at some index finished playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionAdvance {
  /// `max(previous frontier, completed index)`.
  pub new_frontier: usize,
  /// The lesson immediately following the completed one, or `None` when the
  /// completed lesson was the last in the sequence.
  pub next_lesson:  Option<String>,
}

/// Record that the lesson at `index` has just finished playing.
///
/// Callers must have validated `index` with [`can_access`] first.
pub fn record_completion(
  index: usize,
  enrollment: &Enrollment,
  seq: &LessonSequence,
) -> CompletionAdvance {
  CompletionAdvance {
    new_frontier: frontier_index(enrollment, seq).max(index),
    next_lesson:  seq.get(index + 1).map(|l| l.lesson_id.clone()),
  }
}
