//! Update capability.

use crate::error::RepositoryError;
use crate::record::{check_field, Record, ValueMap};
use crate::repository::{require_model_instance, require_schema, RepositoryDef};

/// Repository capability: mutate existing records.
pub trait Updater: RepositoryDef {
    /// Apply `data` to `obj`, field by field.
    ///
    /// Application is atomic: every key is validated against the schema
    /// (existence and value type) before any field is mutated, so a failed
    /// update leaves `obj` untouched. The change is in-memory only — staging
    /// and committing remain the caller's and the unit of work's business.
    ///
    /// # Errors
    ///
    /// - `Usage` when the repository does not declare a model or `obj` is
    ///   not an instance of it.
    /// - `DataValidation` naming the offending key when a key of `data` is
    ///   not a field of the model or its value does not fit.
    fn update(&self, obj: &mut Record, data: &ValueMap) -> Result<(), RepositoryError> {
        let schema = require_schema(self)?;
        require_model_instance(schema, obj, "update")?;

        for (key, value) in data {
            check_field(schema, key, value)?;
        }
        for (key, value) in data {
            obj.set(key, value.clone())?;
        }
        Ok(())
    }
}
