//! Database layer for clinic-core.

mod schema;
mod admissions;
mod appointments;
mod audit;
mod billing;
mod inventory;
mod patients;
mod staff;
mod vitals;

pub use schema::*;
#[allow(unused_imports)]
pub use audit::*;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use thiserror::Error;

use crate::clock::{Clock, SystemClock};
use crate::rules::ValidationError;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper with an injected clock.
pub struct Database {
    conn: Connection,
    clock: Box<dyn Clock>,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn,
            clock: Box::new(SystemClock),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open_in_memory_with_clock(Box::new(SystemClock))
    }

    /// Create in-memory database with a caller-supplied clock, so tests can
    /// pin "now" for date rules and duration derivation.
    pub fn open_in_memory_with_clock(clock: Box<dyn Clock>) -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn, clock };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// The current instant, read from the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Begin a write transaction. Opened IMMEDIATE so the read-validate-write
    /// sequences inside (payments, occupancy recounts) serialize at the store
    /// rather than racing on a stale read.
    pub fn transaction(&mut self) -> DbResult<rusqlite::Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

/// Kind of schema constraint an insert or update tripped over.
enum ConstraintKind {
    Unique,
    ForeignKey,
    Other,
}

fn constraint_kind(e: &rusqlite::Error) -> Option<ConstraintKind> {
    if let rusqlite::Error::SqliteFailure(f, _) = e {
        if f.code == rusqlite::ErrorCode::ConstraintViolation {
            return Some(match f.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ConstraintKind::ForeignKey,
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => ConstraintKind::Unique,
                _ => ConstraintKind::Other,
            });
        }
    }
    None
}

/// Map a SQLite failure from a write into the error taxonomy: uniqueness
/// collisions become conflicts, dangling foreign keys become not-found.
pub(crate) fn map_write_err(e: rusqlite::Error, entity: &str) -> DbError {
    match constraint_kind(&e) {
        Some(ConstraintKind::Unique) => DbError::Conflict(format!("{} already exists ({})", entity, e)),
        Some(ConstraintKind::ForeignKey) => {
            DbError::NotFound(format!("{} references a missing record", entity))
        }
        Some(ConstraintKind::Other) => DbError::Constraint(format!("{}: {}", entity, e)),
        None => DbError::Sqlite(e),
    }
}

/// Parse an RFC 3339 timestamp stored as TEXT.
pub(crate) fn parse_timestamp(s: &str, field: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Constraint(format!("{} '{}' is not RFC 3339: {}", field, s, e)))
}
