//! Repository operations over one model.
//!
//! A repository is a unit type that names its model by returning a schema
//! descriptor, then opts into capabilities by implementing the marker-style
//! traits with default method bodies:
//!
//! - [`Creator`]: `create` ([`create`])
//! - [`Reader`]: `get_one`, `list`, `first`, `count`, `exists` ([`read`])
//! - [`Updater`]: `update` ([`update`])
//! - [`Deleter`]: `delete` ([`delete`])
//!
//! ```
//! use once_cell::sync::Lazy;
//! use quaymaster::repository::{Creator, Reader, RepositoryDef};
//! use quaymaster::schema::{FieldDef, FieldType, SchemaDescriptor};
//!
//! static USER_SCHEMA: Lazy<SchemaDescriptor> = Lazy::new(|| {
//!     SchemaDescriptor::builder("User", "users")
//!         .field(FieldDef::new("id", FieldType::Integer).primary_key().auto_increment())
//!         .field(FieldDef::new("name", FieldType::Text).unique())
//!         .build()
//! });
//!
//! struct UserRepository;
//!
//! impl RepositoryDef for UserRepository {
//!     fn schema(&self) -> Option<&'static SchemaDescriptor> {
//!         Some(&USER_SCHEMA)
//!     }
//!     fn repository_name(&self) -> &'static str {
//!         "UserRepository"
//!     }
//! }
//!
//! impl Creator for UserRepository {}
//! impl Reader for UserRepository {}
//! ```
//!
//! Every operation validates its inputs against the schema before touching
//! the session, and none of them commits: transaction boundaries belong to
//! the unit of work.

use crate::error::RepositoryError;
use crate::record::Record;
use crate::schema::SchemaDescriptor;

pub mod create;
#[doc(inline)]
pub use create::Creator;

pub mod read;
#[doc(inline)]
pub use read::Reader;

pub mod update;
#[doc(inline)]
pub use update::Updater;

pub mod delete;
#[doc(inline)]
pub use delete::Deleter;

/// Base definition every repository capability builds on.
pub trait RepositoryDef {
    /// Schema descriptor of the bound model, or `None` when the repository
    /// does not declare one. Operations on an undeclared repository fail
    /// with a usage error.
    fn schema(&self) -> Option<&'static SchemaDescriptor>;

    /// Repository name used in usage-error messages.
    fn repository_name(&self) -> &'static str;
}

pub(crate) fn require_schema<R>(repo: &R) -> Result<&'static SchemaDescriptor, RepositoryError>
where
    R: RepositoryDef + ?Sized,
{
    repo.schema().ok_or_else(|| RepositoryError::Usage {
        details: format!(
            "{} repository must define model attribute",
            repo.repository_name()
        ),
    })
}

pub(crate) fn require_model_instance(
    schema: &SchemaDescriptor,
    obj: &Record,
    operation: &str,
) -> Result<(), RepositoryError> {
    if obj.model() != schema.model() {
        return Err(RepositoryError::Usage {
            details: format!(
                "{}() expects an instance of model '{}', got '{}'",
                operation,
                schema.model(),
                obj.model()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unbound;

    impl RepositoryDef for Unbound {
        fn schema(&self) -> Option<&'static SchemaDescriptor> {
            None
        }
        fn repository_name(&self) -> &'static str {
            "Unbound"
        }
    }

    #[test]
    fn test_require_schema_usage_error() {
        let err = require_schema(&Unbound).expect_err("no schema");
        assert_eq!(
            err,
            RepositoryError::Usage {
                details: "Unbound repository must define model attribute".to_string(),
            }
        );
    }
}
