//! SQLite backend for the cursus enrollment store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Also implements the catalog
//! read views over the `courses`/`lessons`/`learners` tables, which the
//! core treats as externally owned and read-only.

mod encode;
mod schema;
mod store;

pub use store::SqliteStore;

#[cfg(test)]
mod tests;
