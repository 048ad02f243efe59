//! Delete capability.

use crate::driver::Session;
use crate::error::RepositoryError;
use crate::record::Record;
use crate::repository::{require_model_instance, require_schema, RepositoryDef};

/// Repository capability: stage record deletion.
pub trait Deleter: RepositoryDef {
    /// Stage `obj` for deletion.
    ///
    /// Deletion is deferred: nothing is flushed or committed here, the row
    /// disappears when the owning unit of work commits.
    ///
    /// # Errors
    ///
    /// `Usage` when the repository does not declare a model or `obj` is not
    /// an instance of it.
    fn delete(&self, session: &dyn Session, obj: &Record) -> Result<(), RepositoryError> {
        let schema = require_schema(self)?;
        require_model_instance(schema, obj, "delete")?;
        session.remove(obj);
        Ok(())
    }
}
