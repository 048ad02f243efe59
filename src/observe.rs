//! Tracing span helpers around the suspending calls.

use tracing::{debug_span, Span};

/// Span entered for the duration of one plan execution.
pub fn execute_query_span(model: &str) -> Span {
    debug_span!("execute_query", model = %model)
}

/// Span entered while a unit of work commits.
pub fn commit_span() -> Span {
    debug_span!("commit_transaction")
}

/// Span entered while a unit of work rolls back.
pub fn rollback_span() -> Span {
    debug_span!("rollback_transaction")
}
