//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings; UUIDs as hyphenated
//! lowercase strings; the completion status as a short token. A row that
//! fails to decode is reported as [`Error::Corrupt`] — the store never
//! guesses at damaged data.

use chrono::{DateTime, Utc};
use cursus_core::{
  certificate::Certificate,
  enrollment::{CompletionStatus, Enrollment},
  Error, Result,
};
use uuid::Uuid;

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s)
    .map_err(|e| Error::Corrupt(format!("bad uuid {s:?}: {e}")))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Corrupt(format!("bad timestamp {s:?}: {e}")))
}

// ─── CompletionStatus ────────────────────────────────────────────────────────

pub fn encode_status(s: CompletionStatus) -> &'static str {
  match s {
    CompletionStatus::NotStarted => "not_started",
    CompletionStatus::InProgress => "in_progress",
    CompletionStatus::Completed => "completed",
  }
}

pub fn decode_status(s: &str) -> Result<CompletionStatus> {
  match s {
    "not_started" => Ok(CompletionStatus::NotStarted),
    "in_progress" => Ok(CompletionStatus::InProgress),
    "completed" => Ok(CompletionStatus::Completed),
    other => Err(Error::Corrupt(format!("unknown status: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `enrollments` row.
pub struct RawEnrollment {
  pub learner_id:          String,
  pub course_id:           String,
  pub progress:            i64,
  pub status:              String,
  pub last_lesson_watched: Option<String>,
  pub enrollment_date:     String,
  pub last_accessed:       String,
  pub completed_at:        Option<String>,
  pub version:             i64,
}

impl RawEnrollment {
  pub fn into_enrollment(self) -> Result<Enrollment> {
    let progress = u8::try_from(self.progress).map_err(|_| {
      Error::Corrupt(format!("progress out of range: {}", self.progress))
    })?;
    if progress > 100 {
      return Err(Error::Corrupt(format!(
        "progress out of range: {progress}"
      )));
    }

    Ok(Enrollment {
      learner_id:          decode_uuid(&self.learner_id)?,
      course_id:           decode_uuid(&self.course_id)?,
      progress,
      status:              decode_status(&self.status)?,
      last_lesson_watched: self.last_lesson_watched,
      enrollment_date:     decode_dt(&self.enrollment_date)?,
      last_accessed:       decode_dt(&self.last_accessed)?,
      completed_at:        self
        .completed_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      version:             self.version,
    })
  }
}

/// Raw strings read directly from a `certificates` row.
pub struct RawCertificate {
  pub certificate_id:  String,
  pub learner_id:      String,
  pub course_id:       String,
  pub completion_date: String,
  pub issue_date:      String,
}

impl RawCertificate {
  pub fn into_certificate(self) -> Result<Certificate> {
    Ok(Certificate {
      certificate_id:  decode_uuid(&self.certificate_id)?,
      learner_id:      decode_uuid(&self.learner_id)?,
      course_id:       decode_uuid(&self.course_id)?,
      completion_date: decode_dt(&self.completion_date)?,
      issue_date:      decode_dt(&self.issue_date)?,
    })
  }
}
