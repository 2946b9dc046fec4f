//! [`SqliteStore`] — the SQLite implementation of [`EnrollmentStore`] and
//! the catalog read views.

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use cursus_core::{
  catalog::{CourseCatalog, LearnerDirectory, Lesson, LessonSequence},
  certificate::{Certificate, NewCertificate},
  enrollment::{CompletionStatus, Enrollment, NewEnrollment},
  store::{EnrollmentStore, ProgressPatch},
  Error, Result,
};

use crate::{
  encode::{
    encode_dt, encode_status, encode_uuid, RawCertificate, RawEnrollment,
  },
  schema::SCHEMA,
};

// ─── Error mapping ───────────────────────────────────────────────────────────

fn storage(e: tokio_rusqlite::Error) -> Error { Error::Storage(Box::new(e)) }

/// Outcome of an insert that may trip a uniqueness constraint.
enum Insert {
  Done,
  Duplicate,
}

fn classify_insert(
  result: rusqlite::Result<usize>,
  duplicate_code: i32,
) -> std::result::Result<Insert, tokio_rusqlite::Error> {
  match result {
    Ok(_) => Ok(Insert::Done),
    Err(rusqlite::Error::SqliteFailure(f, _))
      if f.extended_code == duplicate_code =>
    {
      Ok(Insert::Duplicate)
    }
    Err(e) => Err(e.into()),
  }
}

/// Outcome of the compare-and-swap update.
enum Cas {
  Updated(RawEnrollment),
  Stale,
  Missing,
}

// ─── SQL fragments ───────────────────────────────────────────────────────────

const ENROLLMENT_COLUMNS: &str = "learner_id, course_id, progress, status, \
   last_lesson_watched, enrollment_date, last_accessed, completed_at, version";

fn enrollment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEnrollment> {
  Ok(RawEnrollment {
    learner_id:          row.get(0)?,
    course_id:           row.get(1)?,
    progress:            row.get(2)?,
    status:              row.get(3)?,
    last_lesson_watched: row.get(4)?,
    enrollment_date:     row.get(5)?,
    last_accessed:       row.get(6)?,
    completed_at:        row.get(7)?,
    version:             row.get(8)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A cursus store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(storage)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(storage)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(storage)
  }

  // ── Seeding helpers ───────────────────────────────────────────────────
  //
  // The learner/course tables belong to the out-of-scope registration and
  // catalog systems; these helpers exist for that surrounding system (and
  // for tests) and are not part of the core trait surface.

  pub async fn add_learner(
    &self,
    name: impl Into<String>,
    email: impl Into<String>,
  ) -> Result<Uuid> {
    let learner_id = Uuid::new_v4();
    let id_str = encode_uuid(learner_id);
    let at_str = encode_dt(Utc::now());
    let name = name.into();
    let email = email.into();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO learners (learner_id, name, email, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, email, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(storage)?;

    Ok(learner_id)
  }

  pub async fn add_course(
    &self,
    title: impl Into<String>,
    lessons: Vec<Lesson>,
  ) -> Result<Uuid> {
    let course_id = Uuid::new_v4();
    let id_str = encode_uuid(course_id);
    let at_str = encode_dt(Utc::now());
    let title = title.into();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO courses (course_id, title, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, title, at_str],
        )?;
        for (position, lesson) in lessons.iter().enumerate() {
          tx.execute(
            "INSERT INTO lessons
               (course_id, position, lesson_id, duration_seconds)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
              id_str,
              position as i64,
              lesson.lesson_id,
              lesson.duration_seconds as i64,
            ],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(storage)?;

    Ok(course_id)
  }

  /// Replace a course's lesson sequence (content edit by the catalog
  /// system). Enrollments are untouched; the core reconciles on the next
  /// completion event.
  pub async fn replace_lessons(
    &self,
    course_id: Uuid,
    lessons: Vec<Lesson>,
  ) -> Result<()> {
    let id_str = encode_uuid(course_id);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM lessons WHERE course_id = ?1",
          rusqlite::params![id_str],
        )?;
        for (position, lesson) in lessons.iter().enumerate() {
          tx.execute(
            "INSERT INTO lessons
               (course_id, position, lesson_id, duration_seconds)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
              id_str,
              position as i64,
              lesson.lesson_id,
              lesson.duration_seconds as i64,
            ],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(storage)
  }
}

// ─── EnrollmentStore impl ────────────────────────────────────────────────────

impl EnrollmentStore for SqliteStore {
  async fn create_enrollment(&self, input: NewEnrollment) -> Result<Enrollment> {
    let now = Utc::now();
    let enrollment = Enrollment {
      learner_id: input.learner_id,
      course_id: input.course_id,
      progress: 0,
      status: CompletionStatus::NotStarted,
      last_lesson_watched: None,
      enrollment_date: now,
      last_accessed: now,
      completed_at: None,
      version: 0,
    };

    let learner_str = encode_uuid(enrollment.learner_id);
    let course_str = encode_uuid(enrollment.course_id);
    let status_str = encode_status(enrollment.status).to_owned();
    let date_str = encode_dt(enrollment.enrollment_date);

    enum Created {
      Done,
      Duplicate,
      NoLearner,
      NoCourse,
    }

    let outcome = self
      .conn
      .call(move |conn| {
        let learner_ok: bool = conn
          .query_row(
            "SELECT 1 FROM learners WHERE learner_id = ?1",
            rusqlite::params![learner_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !learner_ok {
          return Ok(Created::NoLearner);
        }

        let course_ok: bool = conn
          .query_row(
            "SELECT 1 FROM courses WHERE course_id = ?1",
            rusqlite::params![course_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !course_ok {
          return Ok(Created::NoCourse);
        }

        let result = conn.execute(
          "INSERT INTO enrollments
             (learner_id, course_id, progress, status, last_lesson_watched,
              enrollment_date, last_accessed, completed_at, version)
           VALUES (?1, ?2, 0, ?3, NULL, ?4, ?4, NULL, 0)",
          rusqlite::params![learner_str, course_str, status_str, date_str],
        );
        match classify_insert(
          result,
          rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
        )? {
          Insert::Done => Ok(Created::Done),
          Insert::Duplicate => Ok(Created::Duplicate),
        }
      })
      .await
      .map_err(storage)?;

    match outcome {
      Created::Done => Ok(enrollment),
      Created::Duplicate => Err(Error::AlreadyEnrolled {
        learner_id: input.learner_id,
        course_id:  input.course_id,
      }),
      Created::NoLearner => Err(Error::LearnerNotFound(input.learner_id)),
      Created::NoCourse => Err(Error::CourseNotFound(input.course_id)),
    }
  }

  async fn enrollment(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
  ) -> Result<Option<Enrollment>> {
    let learner_str = encode_uuid(learner_id);
    let course_str = encode_uuid(course_id);

    let raw: Option<RawEnrollment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
                 WHERE learner_id = ?1 AND course_id = ?2"
              ),
              rusqlite::params![learner_str, course_str],
              enrollment_from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(storage)?;

    raw.map(RawEnrollment::into_enrollment).transpose()
  }

  async fn enrollments_for_learner(
    &self,
    learner_id: Uuid,
  ) -> Result<Vec<Enrollment>> {
    let learner_str = encode_uuid(learner_id);

    let raws: Vec<RawEnrollment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
           WHERE learner_id = ?1
           ORDER BY enrollment_date DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![learner_str], enrollment_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(storage)?;

    raws.into_iter().map(RawEnrollment::into_enrollment).collect()
  }

  async fn enrollments_for_course(
    &self,
    course_id: Uuid,
  ) -> Result<Vec<Enrollment>> {
    let course_str = encode_uuid(course_id);

    let raws: Vec<RawEnrollment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
           WHERE course_id = ?1
           ORDER BY enrollment_date ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![course_str], enrollment_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(storage)?;

    raws.into_iter().map(RawEnrollment::into_enrollment).collect()
  }

  async fn update_progress(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
    expected_version: i64,
    patch: ProgressPatch,
  ) -> Result<Enrollment> {
    let learner_str = encode_uuid(learner_id);
    let course_str = encode_uuid(course_id);
    let status_str = encode_status(patch.status).to_owned();
    let accessed_str = encode_dt(patch.last_accessed);
    let completed_str = patch.completed_at.map(encode_dt);
    let progress = patch.progress as i64;
    let last_lesson = patch.last_lesson_watched;

    let outcome = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE enrollments
           SET progress = ?1, status = ?2, last_lesson_watched = ?3,
               last_accessed = ?4, completed_at = ?5,
               version = version + 1
           WHERE learner_id = ?6 AND course_id = ?7 AND version = ?8",
          rusqlite::params![
            progress,
            status_str,
            last_lesson,
            accessed_str,
            completed_str,
            learner_str,
            course_str,
            expected_version,
          ],
        )?;

        if n == 0 {
          let exists: bool = conn
            .query_row(
              "SELECT 1 FROM enrollments
               WHERE learner_id = ?1 AND course_id = ?2",
              rusqlite::params![learner_str, course_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          return Ok(if exists { Cas::Stale } else { Cas::Missing });
        }

        let raw = conn.query_row(
          &format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
             WHERE learner_id = ?1 AND course_id = ?2"
          ),
          rusqlite::params![learner_str, course_str],
          enrollment_from_row,
        )?;
        Ok(Cas::Updated(raw))
      })
      .await
      .map_err(storage)?;

    match outcome {
      Cas::Updated(raw) => raw.into_enrollment(),
      Cas::Stale => Err(Error::VersionConflict { learner_id, course_id }),
      Cas::Missing => Err(Error::EnrollmentNotFound { learner_id, course_id }),
    }
  }

  async fn delete_enrollment(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
  ) -> Result<()> {
    let learner_str = encode_uuid(learner_id);
    let course_str = encode_uuid(course_id);

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM enrollments
           WHERE learner_id = ?1 AND course_id = ?2",
          rusqlite::params![learner_str, course_str],
        )?)
      })
      .await
      .map_err(storage)?;

    if n == 0 {
      return Err(Error::EnrollmentNotFound { learner_id, course_id });
    }
    Ok(())
  }

  async fn certificate(
    &self,
    learner_id: Uuid,
    course_id: Uuid,
  ) -> Result<Option<Certificate>> {
    let learner_str = encode_uuid(learner_id);
    let course_str = encode_uuid(course_id);

    let raw: Option<RawCertificate> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT certificate_id, learner_id, course_id,
                      completion_date, issue_date
               FROM certificates
               WHERE learner_id = ?1 AND course_id = ?2",
              rusqlite::params![learner_str, course_str],
              |row| {
                Ok(RawCertificate {
                  certificate_id:  row.get(0)?,
                  learner_id:      row.get(1)?,
                  course_id:       row.get(2)?,
                  completion_date: row.get(3)?,
                  issue_date:      row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(storage)?;

    raw.map(RawCertificate::into_certificate).transpose()
  }

  async fn insert_certificate(
    &self,
    input: NewCertificate,
  ) -> Result<Certificate> {
    let certificate = Certificate {
      certificate_id:  input.certificate_id,
      learner_id:      input.learner_id,
      course_id:       input.course_id,
      completion_date: input.completion_date,
      issue_date:      Utc::now(),
    };

    let cert_str = encode_uuid(certificate.certificate_id);
    let learner_str = encode_uuid(certificate.learner_id);
    let course_str = encode_uuid(certificate.course_id);
    let completion_str = encode_dt(certificate.completion_date);
    let issue_str = encode_dt(certificate.issue_date);

    let outcome = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO certificates
             (certificate_id, learner_id, course_id,
              completion_date, issue_date)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            cert_str,
            learner_str,
            course_str,
            completion_str,
            issue_str,
          ],
        );
        classify_insert(result, rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
      })
      .await
      .map_err(storage)?;

    match outcome {
      Insert::Done => Ok(certificate),
      Insert::Duplicate => Err(Error::DuplicateCertificate {
        learner_id: input.learner_id,
        course_id:  input.course_id,
      }),
    }
  }
}

// ─── Catalog read views ──────────────────────────────────────────────────────

impl CourseCatalog for SqliteStore {
  async fn lesson_sequence(&self, course_id: Uuid) -> Result<LessonSequence> {
    let course_str = encode_uuid(course_id);

    let rows: Option<Vec<(String, i64)>> = self
      .conn
      .call(move |conn| {
        let exists: bool = conn
          .query_row(
            "SELECT 1 FROM courses WHERE course_id = ?1",
            rusqlite::params![course_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(None);
        }

        let mut stmt = conn.prepare(
          "SELECT lesson_id, duration_seconds FROM lessons
           WHERE course_id = ?1
           ORDER BY position ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![course_str], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(rows))
      })
      .await
      .map_err(storage)?;

    let rows = rows.ok_or(Error::CourseNotFound(course_id))?;
    let lessons = rows
      .into_iter()
      .map(|(lesson_id, duration)| {
        let duration_seconds = u32::try_from(duration).map_err(|_| {
          Error::Corrupt(format!(
            "lesson duration out of range: {duration}"
          ))
        })?;
        Ok(Lesson { lesson_id, duration_seconds })
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(LessonSequence::new(lessons))
  }
}

impl LearnerDirectory for SqliteStore {
  async fn learner_exists(&self, learner_id: Uuid) -> Result<bool> {
    let learner_str = encode_uuid(learner_id);

    self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM learners WHERE learner_id = ?1",
              rusqlite::params![learner_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await
      .map_err(storage)
  }
}
