//! Repository error taxonomy.
//!
//! Every failure this crate raises is one variant of [`RepositoryError`]: a
//! closed set of classified kinds, each carrying the structured context
//! (model, field, relation, details, original driver text) that its message
//! template renders. Callers dispatch with an ordinary `match` instead of
//! downcasting through an exception hierarchy.

use std::fmt;

/// Classified repository failure.
///
/// The write-path kinds (`Transaction`, `UniqueViolation`,
/// `ForeignKeyViolation`, `DataValidation`, `UnknownTransaction`) are raised
/// at commit time by the unit of work; the read-path kinds (`Query`,
/// `RelationNotFound`, `FieldNotFound`, `QueryExecution`, `OrderByField`,
/// `PaginationParameter`) are raised by the query builder and executor; and
/// `Usage` signals a programmer error in how a repository was wired.
///
/// Context fields that do not apply render as an empty string; an error can
/// always be constructed and displayed.
///
/// # Example
///
/// ```
/// use quaymaster::RepositoryError;
///
/// let err = RepositoryError::FieldNotFound {
///     model: "User".into(),
///     field: "nickname".into(),
///     original: String::new(),
/// };
/// assert_eq!(
///     err.to_string(),
///     "Model 'User': filter field 'nickname' not found. "
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Generic commit/transaction failure.
    Transaction { original: String },
    /// Unique constraint violation reported at commit.
    UniqueViolation { original: String },
    /// Foreign key constraint violation reported at commit.
    ForeignKeyViolation { original: String },
    /// Invalid data shape/type/length for the model.
    DataValidation { details: String, original: String },
    /// Any unrecognized failure during commit.
    UnknownTransaction { details: String, original: String },
    /// Unclassified fault while attaching a filter predicate.
    Query {
        model: String,
        field: String,
        original: String,
    },
    /// A requested join relation does not exist on the model.
    RelationNotFound {
        model: String,
        rel: String,
        original: String,
    },
    /// A requested filter field does not exist on the model.
    FieldNotFound {
        model: String,
        field: String,
        original: String,
    },
    /// Execution-time fault not classifiable more specifically.
    QueryExecution {
        model: String,
        details: String,
        original: String,
    },
    /// Order-by field does not exist or is invalid.
    OrderByField {
        model: String,
        field: String,
        original: String,
    },
    /// Invalid pagination parameter (wrong type, negative).
    PaginationParameter {
        model: String,
        field: String,
        details: String,
        original: String,
    },
    /// Caller misuse: model not configured, wrong object type, reuse of a
    /// closed unit of work.
    Usage { details: String },
}

impl RepositoryError {
    /// Whether this kind belongs to the commit/transaction family.
    pub fn is_transaction_error(&self) -> bool {
        matches!(
            self,
            RepositoryError::Transaction { .. }
                | RepositoryError::UniqueViolation { .. }
                | RepositoryError::ForeignKeyViolation { .. }
                | RepositoryError::DataValidation { .. }
                | RepositoryError::UnknownTransaction { .. }
        )
    }

    /// Whether this kind belongs to the read/query family.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            RepositoryError::Query { .. }
                | RepositoryError::RelationNotFound { .. }
                | RepositoryError::FieldNotFound { .. }
                | RepositoryError::QueryExecution { .. }
                | RepositoryError::OrderByField { .. }
                | RepositoryError::PaginationParameter { .. }
        )
    }

    /// The lowest-level fault text preserved for diagnostics, if any.
    pub fn original(&self) -> Option<&str> {
        match self {
            RepositoryError::Transaction { original }
            | RepositoryError::UniqueViolation { original }
            | RepositoryError::ForeignKeyViolation { original }
            | RepositoryError::DataValidation { original, .. }
            | RepositoryError::UnknownTransaction { original, .. }
            | RepositoryError::Query { original, .. }
            | RepositoryError::RelationNotFound { original, .. }
            | RepositoryError::FieldNotFound { original, .. }
            | RepositoryError::QueryExecution { original, .. }
            | RepositoryError::OrderByField { original, .. }
            | RepositoryError::PaginationParameter { original, .. } => Some(original),
            RepositoryError::Usage { .. } => None,
        }
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::Transaction { original } => {
                write!(f, "Transaction failed. {original}")
            }
            RepositoryError::UniqueViolation { original } => {
                write!(f, "Unique constraint violation. {original}")
            }
            RepositoryError::ForeignKeyViolation { original } => {
                write!(f, "Foreign key constraint violation. {original}")
            }
            RepositoryError::DataValidation { details, original } => {
                write!(f, "Invalid data: {details}. {original}")
            }
            RepositoryError::UnknownTransaction { details, original } => {
                write!(f, "Unexpected error during transaction. {details}. {original}")
            }
            RepositoryError::Query {
                model,
                field,
                original,
            } => {
                write!(
                    f,
                    "Model '{model}': unknown filter error for field '{field}'. {original}"
                )
            }
            RepositoryError::RelationNotFound {
                model,
                rel,
                original,
            } => {
                write!(
                    f,
                    "Model '{model}': relation '{rel}' for join not found or invalid. {original}"
                )
            }
            RepositoryError::FieldNotFound {
                model,
                field,
                original,
            } => {
                write!(f, "Model '{model}': filter field '{field}' not found. {original}")
            }
            RepositoryError::QueryExecution {
                model,
                details,
                original,
            } => {
                write!(f, "Model '{model}': query execution error '{details}'. {original}")
            }
            RepositoryError::OrderByField {
                model,
                field,
                original,
            } => {
                write!(
                    f,
                    "Model '{model}': specified order_by field '{field}' does not exist or is invalid. {original}"
                )
            }
            RepositoryError::PaginationParameter {
                model,
                field,
                details,
                original,
            } => {
                write!(
                    f,
                    "Model '{model}': invalid pagination parameter '{field}'. {details}. {original}"
                )
            }
            RepositoryError::Usage { details } => {
                write!(f, "Repository usage error: {details}")
            }
        }
    }
}

impl std::error::Error for RepositoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_not_found_template() {
        let err = RepositoryError::FieldNotFound {
            model: "User".to_string(),
            field: "nickname".to_string(),
            original: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "Model 'User': filter field 'nickname' not found. "
        );
    }

    #[test]
    fn test_relation_not_found_template() {
        let err = RepositoryError::RelationNotFound {
            model: "User".to_string(),
            rel: "posts".to_string(),
            original: " Original error: no such relation".to_string(),
        };
        assert!(err.to_string().starts_with(
            "Model 'User': relation 'posts' for join not found or invalid."
        ));
        assert!(err.to_string().contains("no such relation"));
    }

    #[test]
    fn test_pagination_template_renders_all_fields() {
        let err = RepositoryError::PaginationParameter {
            model: "User".to_string(),
            field: "skip".to_string(),
            details: "expected a non-negative integer".to_string(),
            original: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "Model 'User': invalid pagination parameter 'skip'. expected a non-negative integer. "
        );
    }

    #[test]
    fn test_usage_template() {
        let err = RepositoryError::Usage {
            details: "UserRepository repository must define model attribute".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Repository usage error: UserRepository repository must define model attribute"
        );
    }

    #[test]
    fn test_missing_context_renders_empty() {
        // Constructing with empty context must render, never panic.
        let err = RepositoryError::UnknownTransaction {
            details: String::new(),
            original: String::new(),
        };
        assert_eq!(err.to_string(), "Unexpected error during transaction. . ");
    }

    #[test]
    fn test_family_predicates() {
        let commit = RepositoryError::UniqueViolation {
            original: String::new(),
        };
        assert!(commit.is_transaction_error());
        assert!(!commit.is_query_error());

        let read = RepositoryError::OrderByField {
            model: "User".to_string(),
            field: "nope".to_string(),
            original: String::new(),
        };
        assert!(read.is_query_error());
        assert!(!read.is_transaction_error());

        let usage = RepositoryError::Usage {
            details: "x".to_string(),
        };
        assert!(!usage.is_query_error());
        assert!(!usage.is_transaction_error());
    }

    #[test]
    fn test_original_text_preserved() {
        let err = RepositoryError::QueryExecution {
            model: "User".to_string(),
            details: "(data/type issue)".to_string(),
            original: "operator does not exist: text = integer".to_string(),
        };
        assert_eq!(
            err.original(),
            Some("operator does not exist: text = integer")
        );
    }
}
