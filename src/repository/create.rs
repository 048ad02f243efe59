//! Create capability.

use crate::driver::Session;
use crate::error::RepositoryError;
use crate::record::{Record, ValueMap};
use crate::repository::{require_schema, RepositoryDef};

/// Repository capability: stage new records.
pub trait Creator: RepositoryDef {
    /// Construct a record from `data` and stage it for insertion.
    ///
    /// The record is staged on the session only; it becomes durable when the
    /// owning unit of work commits. Driver-assigned fields (auto-increment
    /// keys) are absent from the returned record until then.
    ///
    /// # Errors
    ///
    /// - `Usage` when the repository does not declare a model.
    /// - `DataValidation` when a key of `data` is not a field of the model or
    ///   its value does not fit the field's type.
    fn create(&self, session: &dyn Session, data: &ValueMap) -> Result<Record, RepositoryError> {
        let schema = require_schema(self)?;
        let record = Record::from_values(schema, data)?;
        session.add(&record);
        Ok(record)
    }
}
