//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::Utc;
use cursus_core::{
  catalog::{CourseCatalog, LearnerDirectory, Lesson},
  certificate::NewCertificate,
  enrollment::{CompletionStatus, NewEnrollment},
  store::{EnrollmentStore, ProgressPatch},
  Error,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn lessons(n: usize) -> Vec<Lesson> {
  (0..n)
    .map(|i| Lesson {
      lesson_id:        format!("lesson-{i}"),
      duration_seconds: 120,
    })
    .collect()
}

/// Seed one learner and one 3-lesson course; return their ids.
async fn seed(s: &SqliteStore) -> (Uuid, Uuid) {
  let learner_id = s
    .add_learner("Alice Liddell", "alice@example.com")
    .await
    .unwrap();
  let course_id = s.add_course("Intro to Rust", lessons(3)).await.unwrap();
  (learner_id, course_id)
}

fn patch(progress: u8, status: CompletionStatus) -> ProgressPatch {
  ProgressPatch {
    progress,
    status,
    last_lesson_watched: Some("lesson-1".into()),
    last_accessed: Utc::now(),
    completed_at: None,
  }
}

// ─── Enrollments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_enrollment() {
  let s = store().await;
  let (learner_id, course_id) = seed(&s).await;

  let created = s
    .create_enrollment(NewEnrollment { learner_id, course_id })
    .await
    .unwrap();
  assert_eq!(created.progress, 0);
  assert_eq!(created.status, CompletionStatus::NotStarted);
  assert_eq!(created.version, 0);

  let fetched = s.enrollment(learner_id, course_id).await.unwrap().unwrap();
  assert_eq!(fetched.learner_id, learner_id);
  assert_eq!(fetched.course_id, course_id);
  assert_eq!(fetched.enrollment_date, created.enrollment_date);
}

#[tokio::test]
async fn create_duplicate_pair_errors() {
  let s = store().await;
  let (learner_id, course_id) = seed(&s).await;

  s.create_enrollment(NewEnrollment { learner_id, course_id })
    .await
    .unwrap();
  let err = s
    .create_enrollment(NewEnrollment { learner_id, course_id })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AlreadyEnrolled { .. }));
}

#[tokio::test]
async fn create_with_unknown_learner_errors() {
  let s = store().await;
  let (_, course_id) = seed(&s).await;

  let err = s
    .create_enrollment(NewEnrollment {
      learner_id: Uuid::new_v4(),
      course_id,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::LearnerNotFound(_)));
}

#[tokio::test]
async fn create_with_unknown_course_errors() {
  let s = store().await;
  let (learner_id, _) = seed(&s).await;

  let err = s
    .create_enrollment(NewEnrollment {
      learner_id,
      course_id: Uuid::new_v4(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CourseNotFound(_)));
}

#[tokio::test]
async fn get_missing_enrollment_returns_none() {
  let s = store().await;
  let result = s.enrollment(Uuid::new_v4(), Uuid::new_v4()).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn list_enrollments_by_learner_and_course() {
  let s = store().await;
  let learner_id = s.add_learner("Bob", "bob@example.com").await.unwrap();
  let other = s.add_learner("Carol", "carol@example.com").await.unwrap();
  let course_a = s.add_course("Course A", lessons(2)).await.unwrap();
  let course_b = s.add_course("Course B", lessons(2)).await.unwrap();

  for (l, c) in [(learner_id, course_a), (learner_id, course_b), (other, course_a)] {
    s.create_enrollment(NewEnrollment { learner_id: l, course_id: c })
      .await
      .unwrap();
  }

  let mine = s.enrollments_for_learner(learner_id).await.unwrap();
  assert_eq!(mine.len(), 2);
  assert!(mine.iter().all(|e| e.learner_id == learner_id));

  let roster = s.enrollments_for_course(course_a).await.unwrap();
  assert_eq!(roster.len(), 2);
  assert!(roster.iter().all(|e| e.course_id == course_a));
}

// ─── Compare-and-swap ────────────────────────────────────────────────────────

#[tokio::test]
async fn update_progress_bumps_the_version() {
  let s = store().await;
  let (learner_id, course_id) = seed(&s).await;
  s.create_enrollment(NewEnrollment { learner_id, course_id })
    .await
    .unwrap();

  let updated = s
    .update_progress(
      learner_id,
      course_id,
      0,
      patch(33, CompletionStatus::InProgress),
    )
    .await
    .unwrap();

  assert_eq!(updated.progress, 33);
  assert_eq!(updated.status, CompletionStatus::InProgress);
  assert_eq!(updated.last_lesson_watched.as_deref(), Some("lesson-1"));
  assert_eq!(updated.version, 1);
}

#[tokio::test]
async fn update_with_stale_version_conflicts() {
  let s = store().await;
  let (learner_id, course_id) = seed(&s).await;
  s.create_enrollment(NewEnrollment { learner_id, course_id })
    .await
    .unwrap();

  s.update_progress(
    learner_id,
    course_id,
    0,
    patch(33, CompletionStatus::InProgress),
  )
  .await
  .unwrap();

  // A second writer holding the old version loses.
  let err = s
    .update_progress(
      learner_id,
      course_id,
      0,
      patch(67, CompletionStatus::InProgress),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::VersionConflict { .. }));

  let e = s.enrollment(learner_id, course_id).await.unwrap().unwrap();
  assert_eq!(e.progress, 33);
}

#[tokio::test]
async fn update_missing_enrollment_is_not_found() {
  let s = store().await;
  let err = s
    .update_progress(
      Uuid::new_v4(),
      Uuid::new_v4(),
      0,
      patch(10, CompletionStatus::InProgress),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::EnrollmentNotFound { .. }));
}

#[tokio::test]
async fn completed_at_roundtrips() {
  let s = store().await;
  let (learner_id, course_id) = seed(&s).await;
  s.create_enrollment(NewEnrollment { learner_id, course_id })
    .await
    .unwrap();

  let now = Utc::now();
  let updated = s
    .update_progress(
      learner_id,
      course_id,
      0,
      ProgressPatch {
        progress: 100,
        status: CompletionStatus::Completed,
        last_lesson_watched: Some("lesson-2".into()),
        last_accessed: now,
        completed_at: Some(now),
      },
    )
    .await
    .unwrap();
  assert_eq!(updated.completed_at, Some(now));

  let fetched = s.enrollment(learner_id, course_id).await.unwrap().unwrap();
  assert_eq!(fetched.completed_at, Some(now));
  assert_eq!(fetched.status, CompletionStatus::Completed);
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_removes_the_enrollment() {
  let s = store().await;
  let (learner_id, course_id) = seed(&s).await;
  s.create_enrollment(NewEnrollment { learner_id, course_id })
    .await
    .unwrap();

  s.delete_enrollment(learner_id, course_id).await.unwrap();
  assert!(s.enrollment(learner_id, course_id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_missing_enrollment_errors() {
  let s = store().await;
  let err = s
    .delete_enrollment(Uuid::new_v4(), Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::EnrollmentNotFound { .. }));
}

#[tokio::test]
async fn delete_does_not_cascade_to_certificates() {
  let s = store().await;
  let (learner_id, course_id) = seed(&s).await;
  s.create_enrollment(NewEnrollment { learner_id, course_id })
    .await
    .unwrap();

  let cert = s
    .insert_certificate(NewCertificate::new(learner_id, course_id, Utc::now()))
    .await
    .unwrap();

  s.delete_enrollment(learner_id, course_id).await.unwrap();

  let kept = s.certificate(learner_id, course_id).await.unwrap().unwrap();
  assert_eq!(kept.certificate_id, cert.certificate_id);
}

// ─── Certificates ────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_certificate() {
  let s = store().await;
  let (learner_id, course_id) = seed(&s).await;

  let completion = Utc::now();
  let cert = s
    .insert_certificate(NewCertificate::new(learner_id, course_id, completion))
    .await
    .unwrap();
  assert_eq!(cert.completion_date, completion);

  let fetched = s.certificate(learner_id, course_id).await.unwrap().unwrap();
  assert_eq!(fetched.certificate_id, cert.certificate_id);
  assert_eq!(fetched.completion_date, completion);
}

#[tokio::test]
async fn get_missing_certificate_returns_none() {
  let s = store().await;
  let result = s.certificate(Uuid::new_v4(), Uuid::new_v4()).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn duplicate_certificate_insert_trips_the_constraint() {
  let s = store().await;
  let (learner_id, course_id) = seed(&s).await;

  s.insert_certificate(NewCertificate::new(learner_id, course_id, Utc::now()))
    .await
    .unwrap();

  // A second insert for the pair — fresh certificate id, same pair — must
  // be rejected by the unique constraint, not silently accepted.
  let err = s
    .insert_certificate(NewCertificate::new(learner_id, course_id, Utc::now()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateCertificate { .. }));
}

// ─── Catalog views ───────────────────────────────────────────────────────────

#[tokio::test]
async fn lesson_sequence_preserves_order() {
  let s = store().await;
  let course_id = s.add_course("Ordered", lessons(4)).await.unwrap();

  let seq = s.lesson_sequence(course_id).await.unwrap();
  assert_eq!(seq.len(), 4);
  let ids: Vec<_> = seq.lessons().iter().map(|l| l.lesson_id.as_str()).collect();
  assert_eq!(ids, ["lesson-0", "lesson-1", "lesson-2", "lesson-3"]);
  assert_eq!(seq.total_duration_seconds(), 480);
}

#[tokio::test]
async fn lesson_sequence_for_unknown_course_errors() {
  let s = store().await;
  let err = s.lesson_sequence(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::CourseNotFound(_)));
}

#[tokio::test]
async fn replace_lessons_swaps_the_sequence() {
  let s = store().await;
  let course_id = s.add_course("Re-cut", lessons(2)).await.unwrap();

  s.replace_lessons(
    course_id,
    vec![
      Lesson { lesson_id: "part-0".into(), duration_seconds: 60 },
      Lesson { lesson_id: "part-1".into(), duration_seconds: 60 },
      Lesson { lesson_id: "part-2".into(), duration_seconds: 60 },
    ],
  )
  .await
  .unwrap();

  let seq = s.lesson_sequence(course_id).await.unwrap();
  assert_eq!(seq.len(), 3);
  assert_eq!(seq.position("part-2"), Some(2));
  assert_eq!(seq.position("lesson-0"), None);
}

#[tokio::test]
async fn learner_exists_checks_the_directory() {
  let s = store().await;
  let learner_id = s.add_learner("Dave", "dave@example.com").await.unwrap();

  assert!(s.learner_exists(learner_id).await.unwrap());
  assert!(!s.learner_exists(Uuid::new_v4()).await.unwrap());
}
