//! Integration tests driving the router end-to-end over an in-memory
//! SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{header, Request, StatusCode},
};
use cursus_core::{catalog::Lesson, tracker::ProgressTracker};
use cursus_store_sqlite::SqliteStore;
use serde_json::{json, Value};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::api_router;

type Tracker = Arc<ProgressTracker<SqliteStore, SqliteStore>>;

struct Harness {
  tracker:    Tracker,
  learner_id: Uuid,
  course_id:  Uuid,
}

fn lessons(n: usize) -> Vec<Lesson> {
  (0..n)
    .map(|i| Lesson {
      lesson_id:        format!("lesson-{i}"),
      duration_seconds: 300,
    })
    .collect()
}

async fn harness(lesson_count: usize) -> Harness {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let learner_id = store
    .add_learner("Alice Liddell", "alice@example.com")
    .await
    .unwrap();
  let course_id = store
    .add_course("Intro to Rust", lessons(lesson_count))
    .await
    .unwrap();
  let tracker = Arc::new(ProgressTracker::new(
    Arc::clone(&store),
    Arc::clone(&store),
  ));
  Harness { tracker, learner_id, course_id }
}

fn app(tracker: &Tracker) -> Router {
  api_router(Arc::clone(tracker))
}

async fn send(
  tracker: &Tracker,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app(tracker)
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();

  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn enroll(h: &Harness) {
  let (status, _) = send(
    &h.tracker,
    "POST",
    "/enrollments",
    Some(json!({ "learner_id": h.learner_id, "course_id": h.course_id })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
}

fn complete_uri(h: &Harness, lesson: &str) -> String {
  format!(
    "/enrollments/{}/{}/lessons/{}/complete",
    h.learner_id, h.course_id, lesson
  )
}

// ─── Enrollment lifecycle ────────────────────────────────────────────────────

#[tokio::test]
async fn enrolling_twice_returns_conflict() {
  let h = harness(4).await;
  enroll(&h).await;

  let (status, body) = send(
    &h.tracker,
    "POST",
    "/enrollments",
    Some(json!({ "learner_id": h.learner_id, "course_id": h.course_id })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].as_str().unwrap().contains("already enrolled"));
}

#[tokio::test]
async fn enrolling_unknown_learner_returns_404() {
  let h = harness(4).await;
  let (status, _) = send(
    &h.tracker,
    "POST",
    "/enrollments",
    Some(json!({ "learner_id": Uuid::new_v4(), "course_id": h.course_id })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_by_learner_and_course() {
  let h = harness(4).await;
  enroll(&h).await;

  let (status, body) = send(
    &h.tracker,
    "GET",
    &format!("/enrollments/learner/{}", h.learner_id),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 1);

  let (status, body) = send(
    &h.tracker,
    "GET",
    &format!("/enrollments/course/{}", h.course_id),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn getting_a_missing_enrollment_returns_404() {
  let h = harness(4).await;
  let (status, _) = send(
    &h.tracker,
    "GET",
    &format!("/enrollments/{}/{}", h.learner_id, h.course_id),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Scenario A: linear completion ───────────────────────────────────────────

#[tokio::test]
async fn completing_all_lessons_in_order_issues_one_certificate() {
  let h = harness(4).await;
  enroll(&h).await;

  let mut final_body = Value::Null;
  for (i, expected) in [(0, 25), (1, 50), (2, 75), (3, 100)] {
    let (status, body) = send(
      &h.tracker,
      "POST",
      &complete_uri(&h, &format!("lesson-{i}")),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enrollment"]["progress"], expected);
    final_body = body;
  }

  assert_eq!(final_body["enrollment"]["status"], "completed");
  let cert_id = final_body["certificate"]["certificate_id"]
    .as_str()
    .unwrap()
    .to_owned();

  // The retrieval surface returns the same record.
  let (status, body) = send(
    &h.tracker,
    "GET",
    &format!("/certificates/{}/{}", h.learner_id, h.course_id),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["certificate_id"], cert_id.as_str());
}

// ─── Scenario B: skip-ahead ──────────────────────────────────────────────────

#[tokio::test]
async fn skipping_ahead_is_rejected_and_state_unchanged() {
  let h = harness(4).await;
  enroll(&h).await;

  let (status, body) =
    send(&h.tracker, "POST", &complete_uri(&h, "lesson-2"), None).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].as_str().unwrap().contains("locked"));

  let (_, body) = send(
    &h.tracker,
    "GET",
    &format!("/enrollments/{}/{}", h.learner_id, h.course_id),
    None,
  )
  .await;
  assert_eq!(body["progress"], 0);
  assert_eq!(body["status"], "not_started");
}

// ─── Scenario C: concurrent final completions ────────────────────────────────

#[tokio::test]
async fn concurrent_final_completions_observe_one_certificate() {
  let h = harness(2).await;
  enroll(&h).await;
  send(&h.tracker, "POST", &complete_uri(&h, "lesson-0"), None).await;

  let uri = complete_uri(&h, "lesson-1");
  let (a, b) = tokio::join!(
    send(&h.tracker, "POST", &uri, None),
    send(&h.tracker, "POST", &uri, None),
  );

  assert_eq!(a.0, StatusCode::OK);
  assert_eq!(b.0, StatusCode::OK);

  let id_a = a.1["certificate"]["certificate_id"].as_str().unwrap();
  let id_b = b.1["certificate"]["certificate_id"].as_str().unwrap();
  assert_eq!(id_a, id_b);
}

// ─── Scenario D: rounding ────────────────────────────────────────────────────

#[tokio::test]
async fn two_of_three_lessons_show_sixty_seven_percent() {
  let h = harness(3).await;
  enroll(&h).await;

  send(&h.tracker, "POST", &complete_uri(&h, "lesson-0"), None).await;
  let (_, body) =
    send(&h.tracker, "POST", &complete_uri(&h, "lesson-1"), None).await;

  assert_eq!(body["enrollment"]["progress"], 67);
  assert_eq!(body["enrollment"]["status"], "in_progress");
  assert!(body["certificate"].is_null());
}

// ─── Scenario E: certificate before completion ───────────────────────────────

#[tokio::test]
async fn certificate_before_completion_is_404() {
  let h = harness(3).await;
  enroll(&h).await;

  let (status, _) = send(
    &h.tracker,
    "GET",
    &format!("/certificates/{}/{}", h.learner_id, h.course_id),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn issuing_before_completion_is_a_conflict() {
  let h = harness(3).await;
  enroll(&h).await;

  let (status, _) = send(
    &h.tracker,
    "POST",
    "/certificates",
    Some(json!({ "learner_id": h.learner_id, "course_id": h.course_id })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_lesson_is_unprocessable() {
  let h = harness(3).await;
  enroll(&h).await;

  let (status, _) =
    send(&h.tracker, "POST", &complete_uri(&h, "bogus"), None).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ─── Unenroll ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unenroll_returns_204_and_keeps_the_certificate() {
  let h = harness(2).await;
  enroll(&h).await;
  send(&h.tracker, "POST", &complete_uri(&h, "lesson-0"), None).await;
  let (_, body) =
    send(&h.tracker, "POST", &complete_uri(&h, "lesson-1"), None).await;
  let cert_id = body["certificate"]["certificate_id"].as_str().unwrap().to_owned();

  let (status, _) = send(
    &h.tracker,
    "DELETE",
    &format!("/enrollments/{}/{}", h.learner_id, h.course_id),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = send(
    &h.tracker,
    "GET",
    &format!("/enrollments/{}/{}", h.learner_id, h.course_id),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, body) = send(
    &h.tracker,
    "GET",
    &format!("/certificates/{}/{}", h.learner_id, h.course_id),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["certificate_id"], cert_id.as_str());
}
