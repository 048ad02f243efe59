//! Unit of work: one session, one transaction boundary.
//!
//! A [`UnitOfWork`] owns exactly one driver session for its scope and ends in
//! exactly one terminal action — commit or rollback — after which the session
//! is released. Commit-time driver faults are rolled back first, then
//! classified into the error taxonomy (structured constraint metadata when
//! the driver provides it, message inspection as the fallback).
//!
//! The scoped form runs a body against the session and picks the terminal
//! action from its outcome:
//!
//! ```no_run
//! use quaymaster::driver::SessionFactory;
//! use quaymaster::{RepositoryError, UnitOfWork};
//!
//! # fn demo(factory: &dyn SessionFactory) -> Result<(), RepositoryError> {
//! let inserted = UnitOfWork::run(factory, |_session| {
//!     // repository calls against `_session` go here
//!     Ok(1)
//! })?;
//! assert_eq!(inserted, 1);
//! # Ok(())
//! # }
//! ```

use crate::driver::{ConstraintKind, DriverFault, Session, SessionFactory};
use crate::error::RepositoryError;

#[cfg(feature = "tracing")]
use crate::observe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UowState {
    Entered,
    Closed,
}

/// Scope guard owning one session and its transaction boundary.
///
/// Not reentrant and not shareable across concurrent scopes; callers needing
/// concurrency open independent units of work, each with its own session.
pub struct UnitOfWork {
    session: Option<Box<dyn Session>>,
    state: UowState,
}

impl UnitOfWork {
    /// Acquire a session from `factory` and enter the scope.
    ///
    /// # Errors
    ///
    /// `Transaction` when the factory cannot open a session.
    pub fn begin(factory: &dyn SessionFactory) -> Result<Self, RepositoryError> {
        let session = factory
            .open_session()
            .map_err(|fault| RepositoryError::Transaction {
                original: fault.message().to_string(),
            })?;
        Ok(Self {
            session: Some(session),
            state: UowState::Entered,
        })
    }

    /// The session owned by this scope.
    ///
    /// # Errors
    ///
    /// `Usage` once the unit of work has been committed or rolled back.
    pub fn session(&self) -> Result<&dyn Session, RepositoryError> {
        match (&self.state, &self.session) {
            (UowState::Entered, Some(session)) => Ok(session.as_ref()),
            _ => Err(closed_usage_error()),
        }
    }

    /// Commit the scope's work and release the session.
    ///
    /// On a driver fault the transaction is rolled back before the
    /// classified error is returned; the session is released either way.
    ///
    /// # Errors
    ///
    /// `Usage` on a closed unit of work; otherwise the classified commit
    /// fault per the taxonomy (`UniqueViolation`, `ForeignKeyViolation`,
    /// `DataValidation`, `Transaction`, `UnknownTransaction`).
    pub fn commit(&mut self) -> Result<(), RepositoryError> {
        let Some(session) = self.take_session() else {
            return Err(closed_usage_error());
        };

        #[cfg(feature = "tracing")]
        let _span = observe::commit_span().entered();

        match session.commit() {
            Ok(()) => {
                session.close();
                Ok(())
            }
            Err(fault) => {
                log::warn!("commit failed, rolling back: {fault}");
                session.rollback();
                session.close();
                Err(classify_commit_fault(&fault))
            }
        }
    }

    /// Roll the scope's work back and release the session.
    ///
    /// # Errors
    ///
    /// `Usage` on a closed unit of work.
    pub fn rollback(&mut self) -> Result<(), RepositoryError> {
        let Some(session) = self.take_session() else {
            return Err(closed_usage_error());
        };
        roll_back_and_close(&*session);
        Ok(())
    }

    /// Run `body` in its own unit of work.
    ///
    /// Commits when the body returns `Ok`, rolls back when it returns `Err`;
    /// the session is released on every path.
    ///
    /// # Errors
    ///
    /// The body's error, or the classified commit fault.
    pub fn run<T, F>(factory: &dyn SessionFactory, body: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&dyn Session) -> Result<T, RepositoryError>,
    {
        let mut uow = Self::begin(factory)?;
        match body(uow.session()?) {
            Ok(value) => {
                uow.commit()?;
                Ok(value)
            }
            Err(err) => {
                // The body's error is the one the caller must see; the
                // rollback itself cannot fail on an open scope.
                let _ = uow.rollback();
                Err(err)
            }
        }
    }

    fn take_session(&mut self) -> Option<Box<dyn Session>> {
        if self.state == UowState::Closed {
            return None;
        }
        self.state = UowState::Closed;
        self.session.take()
    }
}

impl Drop for UnitOfWork {
    /// An abandoned open scope (early return, panic) rolls back and releases
    /// the session.
    fn drop(&mut self) {
        if let Some(session) = self.take_session() {
            log::debug!("unit of work dropped while open; rolling back");
            roll_back_and_close(&*session);
        }
    }
}

fn roll_back_and_close(session: &dyn Session) {
    #[cfg(feature = "tracing")]
    let _span = observe::rollback_span().entered();
    session.rollback();
    session.close();
}

fn closed_usage_error() -> RepositoryError {
    RepositoryError::Usage {
        details: "unit of work already committed or rolled back".to_string(),
    }
}

fn classify_commit_fault(fault: &DriverFault) -> RepositoryError {
    match fault {
        DriverFault::Integrity {
            constraint,
            message,
        } => match constraint {
            Some(ConstraintKind::Unique) => RepositoryError::UniqueViolation {
                original: message.clone(),
            },
            Some(ConstraintKind::ForeignKey) => RepositoryError::ForeignKeyViolation {
                original: message.clone(),
            },
            // Unclassified integrity fault: fall back to message inspection.
            None => {
                let lowered = message.to_lowercase();
                if lowered.contains("unique") {
                    RepositoryError::UniqueViolation {
                        original: message.clone(),
                    }
                } else if lowered.contains("foreign key") {
                    RepositoryError::ForeignKeyViolation {
                        original: message.clone(),
                    }
                } else {
                    RepositoryError::Transaction {
                        original: message.clone(),
                    }
                }
            }
        },
        DriverFault::Data(message) => RepositoryError::DataValidation {
            details: String::new(),
            original: message.clone(),
        },
        DriverFault::Statement(message) | DriverFault::Storage(message) => {
            RepositoryError::Transaction {
                original: message.clone(),
            }
        }
        DriverFault::Other(message) => RepositoryError::UnknownTransaction {
            details: String::new(),
            original: message.clone(),
        },
    }
}
