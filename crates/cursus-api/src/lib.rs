//! JSON REST API for cursus.
//!
//! Exposes an axum [`Router`] backed by any
//! [`cursus_core::store::EnrollmentStore`] and catalog pair, wired through a
//! [`ProgressTracker`]. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", cursus_api::api_router(tracker.clone()))
//! ```

pub mod certificates;
pub mod enrollments;
pub mod error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post},
};
use cursus_core::{
  catalog::{CourseCatalog, LearnerDirectory},
  store::EnrollmentStore,
  tracker::{ProgressTracker, TrackerConfig},
};
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_catalog_timeout_ms() -> u64 { 5_000 }

fn default_write_attempts() -> u32 { 4 }

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Upper bound on a catalog lookup before a completion event is rejected.
  #[serde(default = "default_catalog_timeout_ms")]
  pub catalog_timeout_ms: u64,
  /// Retry budget for the optimistic progress write.
  #[serde(default = "default_write_attempts")]
  pub completion_write_attempts: u32,
}

impl ServerConfig {
  pub fn tracker_config(&self) -> TrackerConfig {
    TrackerConfig {
      catalog_timeout:    Duration::from_millis(self.catalog_timeout_ms),
      max_write_attempts: self.completion_write_attempts,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router over `tracker`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(tracker: Arc<ProgressTracker<S, C>>) -> Router<()>
where
  S: EnrollmentStore + 'static,
  C: CourseCatalog + LearnerDirectory + 'static,
{
  Router::new()
    // Enrollments
    .route("/enrollments", post(enrollments::create::<S, C>))
    .route(
      "/enrollments/learner/{learner_id}",
      get(enrollments::list_for_learner::<S, C>),
    )
    .route(
      "/enrollments/course/{course_id}",
      get(enrollments::list_for_course::<S, C>),
    )
    .route(
      "/enrollments/{learner_id}/{course_id}",
      get(enrollments::get_one::<S, C>)
        .delete(enrollments::delete_one::<S, C>),
    )
    // The completion event — the single mutating operation of the core.
    .route(
      "/enrollments/{learner_id}/{course_id}/lessons/{lesson_id}/complete",
      post(enrollments::complete_lesson::<S, C>),
    )
    // Certificates
    .route("/certificates", post(certificates::issue::<S, C>))
    .route(
      "/certificates/{learner_id}/{course_id}",
      get(certificates::get_one::<S, C>),
    )
    .with_state(tracker)
}

#[cfg(test)]
mod tests;
