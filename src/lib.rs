//! # Quaymaster
//!
//! Repository and unit-of-work data access layer for relational drivers.
//!
//! Quaymaster sits between application code and a relational database:
//! repositories translate declarative filter/join/order/pagination requests
//! into SeaQuery plans and run them through an abstract driver session, while
//! a unit of work demarcates the transaction around a group of operations.
//! Every storage failure surfaces as one kind of [`RepositoryError`].
//!
//! See the `repository` and `uow` modules for the two public surfaces.

pub mod error;
pub use error::RepositoryError;

pub mod schema;

pub mod record;
pub use record::{Record, ValueMap};

pub mod driver;

pub mod query;
pub use query::{Page, QueryPlan};

pub mod repository;
pub use repository::{Creator, Deleter, Reader, RepositoryDef, Updater};

pub mod uow;
pub use uow::UnitOfWork;

pub mod json;

#[cfg(feature = "tracing")]
pub mod observe;
