//! SQL schema for the cursus SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Owned by the registration system; read-only to the core.
CREATE TABLE IF NOT EXISTS learners (
    learner_id TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    email      TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- Owned by the catalog system; read-only to the core.
CREATE TABLE IF NOT EXISTS courses (
    course_id  TEXT PRIMARY KEY,
    title      TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lessons (
    course_id        TEXT NOT NULL REFERENCES courses(course_id) ON DELETE CASCADE,
    position         INTEGER NOT NULL,
    lesson_id        TEXT NOT NULL,
    duration_seconds INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (course_id, position)
);

-- One row per (learner, course); the compound primary key is the
-- authoritative guard against double enrollment. `version` backs the
-- compare-and-swap progress write.
CREATE TABLE IF NOT EXISTS enrollments (
    learner_id          TEXT NOT NULL REFERENCES learners(learner_id),
    course_id           TEXT NOT NULL REFERENCES courses(course_id),
    progress            INTEGER NOT NULL DEFAULT 0
                        CHECK (progress BETWEEN 0 AND 100),
    status              TEXT NOT NULL DEFAULT 'not_started',
    last_lesson_watched TEXT,
    enrollment_date     TEXT NOT NULL,
    last_accessed       TEXT NOT NULL,
    completed_at        TEXT,
    version             INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (learner_id, course_id)
);

-- Write-once. The unique pair constraint is the authoritative guard
-- against duplicate issuance; no UPDATE or DELETE is ever issued against
-- this table. Deliberately no foreign key on enrollments: a certificate
-- outlives an unenroll.
CREATE TABLE IF NOT EXISTS certificates (
    certificate_id  TEXT PRIMARY KEY,
    learner_id      TEXT NOT NULL,
    course_id       TEXT NOT NULL,
    completion_date TEXT NOT NULL,
    issue_date      TEXT NOT NULL,
    UNIQUE (learner_id, course_id)
);

CREATE INDEX IF NOT EXISTS enrollments_course_idx ON enrollments(course_id);

PRAGMA user_version = 1;
";
