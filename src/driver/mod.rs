//! Abstract driver boundary.
//!
//! The crate never talks to a database directly; it issues built query plans
//! and staged writes through the [`Session`] trait and receives rows or a
//! typed [`DriverFault`] back. Concrete drivers (a PostgreSQL binding, the
//! in-memory engine behind the `mock` feature) live behind this boundary, and
//! suspension while waiting on I/O happens inside them.

use std::fmt;

use crate::query::QueryPlan;
use crate::record::{Record, ValueMap};

#[cfg(any(test, feature = "mock"))]
pub mod memory;

/// Structured constraint metadata attached to an integrity fault.
///
/// Drivers that expose constraint classes (e.g. SQLSTATE 23505/23503) report
/// them here so commit classification does not depend on message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
}

/// Typed fault surface reported by a driver.
///
/// `Integrity` carries optional structured constraint metadata; when a driver
/// cannot classify the constraint, classification falls back to inspecting
/// the message text. `Data` is a value-shape fault (wrong type/length),
/// `Statement` a malformed or mistyped statement, `Storage` any other
/// recognized storage-layer fault, and `Other` everything unrecognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverFault {
    Integrity {
        constraint: Option<ConstraintKind>,
        message: String,
    },
    Data(String),
    Statement(String),
    Storage(String),
    Other(String),
}

impl DriverFault {
    /// The driver's original fault text.
    pub fn message(&self) -> &str {
        match self {
            DriverFault::Integrity { message, .. } => message,
            DriverFault::Data(message)
            | DriverFault::Statement(message)
            | DriverFault::Storage(message)
            | DriverFault::Other(message) => message,
        }
    }
}

impl fmt::Display for DriverFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverFault::Integrity { message, .. } => write!(f, "integrity error: {message}"),
            DriverFault::Data(message) => write!(f, "data error: {message}"),
            DriverFault::Statement(message) => write!(f, "statement error: {message}"),
            DriverFault::Storage(message) => write!(f, "storage error: {message}"),
            DriverFault::Other(message) => write!(f, "driver error: {message}"),
        }
    }
}

impl std::error::Error for DriverFault {}

/// One logical database session.
///
/// A session belongs to exactly one unit of work. Reads go through
/// [`Session::execute`] with a fully built plan; writes are staged with
/// [`Session::add`] / [`Session::remove`] and take effect only at
/// [`Session::commit`]. Calls are synchronous from the caller's point of
/// view; a driver may suspend internally while waiting on the wire.
pub trait Session {
    /// Execute a built query plan and return its rows.
    ///
    /// For `Count` and `Exists` projections the scalar comes back as the
    /// single column of a single row.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverFault`] when the statement fails; the executor is
    /// responsible for translating it into the error taxonomy.
    fn execute(&self, plan: &QueryPlan) -> Result<Vec<ValueMap>, DriverFault>;

    /// Stage a record for insertion. Deferred until commit.
    fn add(&self, record: &Record);

    /// Stage a record for deletion. Deferred until commit.
    fn remove(&self, record: &Record);

    /// Apply all staged work and make it durable.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverFault`] when the transaction cannot be committed;
    /// staged work is discarded.
    fn commit(&self) -> Result<(), DriverFault>;

    /// Discard all staged work.
    fn rollback(&self);

    /// Release the session. The unit of work invokes this exactly once per
    /// session, on every exit path.
    fn close(&self);
}

/// Source of sessions for units of work.
pub trait SessionFactory {
    /// Open a fresh session bound to its own storage-side transaction.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverFault`] when a session cannot be acquired.
    fn open_session(&self) -> Result<Box<dyn Session>, DriverFault>;
}
