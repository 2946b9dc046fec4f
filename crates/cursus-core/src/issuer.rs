//! Idempotent certificate issuance.
//!
//! `issue` may be called any number of times for a pair — by the tracker on
//! the completion transition, by a retrying client, or lazily from a
//! certificate-retrieval surface — and always converges on the single
//! persisted record. The storage uniqueness constraint is the authoritative
//! guard; the check-then-create here is only an optimisation.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  certificate::{Certificate, NewCertificate},
  store::EnrollmentStore,
  Error, Result,
};

pub struct CertificateIssuer<S> {
  store: Arc<S>,
}

impl<S> Clone for CertificateIssuer<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store) }
  }
}

impl<S: EnrollmentStore> CertificateIssuer<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Issue (or return the existing) certificate for a pair.
  ///
  /// The enrollment must be `Completed`; the issuer does not trust its
  /// caller on this, since it is also invoked directly by the retrieval
  /// surface. The certificate's `completion_date` is copied from the
  /// enrollment, never taken from the wall clock.
  pub async fn issue(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
  ) -> Result<Certificate> {
    if let Some(existing) =
      self.store.certificate(learner_id, course_id).await?
    {
      return Ok(existing);
    }

    let enrollment = self
      .store
      .enrollment(learner_id, course_id)
      .await?
      .ok_or(Error::EnrollmentNotFound { learner_id, course_id })?;

    if !enrollment.status.is_completed() {
      return Err(Error::NotEligible { learner_id, course_id });
    }

    // Rows written before `completed_at` existed fall back to the last
    // touch, which for a completed enrollment is the completing write.
    let completion_date =
      enrollment.completed_at.unwrap_or(enrollment.last_accessed);

    let input = NewCertificate::new(learner_id, course_id, completion_date);
    match self.store.insert_certificate(input).await {
      Ok(certificate) => Ok(certificate),
      // Lost a race against a concurrent issuance: the record that actually
      // persisted wins, and both callers observe the same id.
      Err(Error::DuplicateCertificate { .. }) => self
        .store
        .certificate(learner_id, course_id)
        .await?
        .ok_or_else(|| {
          Error::Corrupt(format!(
            "duplicate certificate reported for learner {learner_id} in \
             course {course_id}, but no row is readable"
          ))
        }),
      Err(e) => Err(e),
    }
  }

  /// Fetch the certificate for a pair without issuing one.
  pub async fn get(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
  ) -> Result<Certificate> {
    self
      .store
      .certificate(learner_id, course_id)
      .await?
      .ok_or(Error::CertificateNotFound { learner_id, course_id })
  }
}
