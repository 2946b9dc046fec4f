//! Certificate — proof of completion for one (learner, course) pair.
//!
//! Certificates are write-once. At most one exists per pair, enforced by a
//! uniqueness constraint at the storage layer, not only by the issuer's
//! check-then-create. Deleting an enrollment never deletes its certificate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
  /// Globally unique opaque token identifying this certificate.
  pub certificate_id:  Uuid,
  pub learner_id:      Uuid,
  pub course_id:       Uuid,
  /// When the learner completed the course — copied from the enrollment at
  /// issuance time, never from the wall clock.
  pub completion_date: DateTime<Utc>,
  /// When the record was created. Set by the store.
  pub issue_date:      DateTime<Utc>,
}

/// Input to [`crate::store::EnrollmentStore::insert_certificate`].
/// `issue_date` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewCertificate {
  pub certificate_id:  Uuid,
  pub learner_id:      Uuid,
  pub course_id:       Uuid,
  pub completion_date: DateTime<Utc>,
}

impl NewCertificate {
  /// Build an issuance request with a freshly generated certificate id.
  pub fn new(
    learner_id: Uuid,
    course_id: Uuid,
    completion_date: DateTime<Utc>,
  ) -> Self {
    Self {
      certificate_id: Uuid::new_v4(),
      learner_id,
      course_id,
      completion_date,
    }
  }
}
