//! Async HTTP client wrapping the cursus JSON API.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use cursus_core::{
  certificate::Certificate, enrollment::Enrollment,
  tracker::CompletionOutcome,
};
use reqwest::Client;
use serde_json::json;
use uuid::Uuid;

/// Connection settings for the cursus API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Async HTTP client for the cursus JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.config.base_url.trim_end_matches('/'))
  }

  // ── Enrollments ───────────────────────────────────────────────────────

  /// `POST /enrollments`
  pub async fn enroll(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
  ) -> Result<Enrollment> {
    let resp = self
      .client
      .post(self.url("/enrollments"))
      .json(&json!({ "learner_id": learner_id, "course_id": course_id }))
      .send()
      .await
      .context("POST /enrollments failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("POST /enrollments → {}", resp.status()));
    }
    resp.json().await.context("deserialising enrollment")
  }

  /// `GET /enrollments/:learner_id/:course_id`
  pub async fn enrollment(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
  ) -> Result<Enrollment> {
    let resp = self
      .client
      .get(self.url(&format!("/enrollments/{learner_id}/{course_id}")))
      .send()
      .await
      .context("GET /enrollments failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /enrollments → {}", resp.status()));
    }
    resp.json().await.context("deserialising enrollment")
  }

  /// `GET /enrollments/learner/:learner_id`
  pub async fn enrollments_for_learner(
    &self,
    learner_id: Uuid,
  ) -> Result<Vec<Enrollment>> {
    let resp = self
      .client
      .get(self.url(&format!("/enrollments/learner/{learner_id}")))
      .send()
      .await
      .context("GET /enrollments/learner failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /enrollments/learner → {}", resp.status()));
    }
    resp.json().await.context("deserialising enrollments")
  }

  /// `POST /enrollments/:learner_id/:course_id/lessons/:lesson_id/complete`
  pub async fn complete_lesson(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
    lesson_id: &str,
  ) -> Result<CompletionOutcome> {
    let resp = self
      .client
      .post(self.url(&format!(
        "/enrollments/{learner_id}/{course_id}/lessons/{lesson_id}/complete"
      )))
      .send()
      .await
      .context("POST completion event failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("POST completion event → {}", resp.status()));
    }
    resp.json().await.context("deserialising completion outcome")
  }

  // ── Certificates ──────────────────────────────────────────────────────

  /// `POST /certificates` — idempotent issuance.
  pub async fn issue_certificate(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
  ) -> Result<Certificate> {
    let resp = self
      .client
      .post(self.url("/certificates"))
      .json(&json!({ "learner_id": learner_id, "course_id": course_id }))
      .send()
      .await
      .context("POST /certificates failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("POST /certificates → {}", resp.status()));
    }
    resp.json().await.context("deserialising certificate")
  }

  /// `GET /certificates/:learner_id/:course_id`
  pub async fn certificate(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
  ) -> Result<Certificate> {
    let resp = self
      .client
      .get(self.url(&format!("/certificates/{learner_id}/{course_id}")))
      .send()
      .await
      .context("GET /certificates failed")?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET /certificates → {}", resp.status()));
    }
    resp.json().await.context("deserialising certificate")
  }
}
