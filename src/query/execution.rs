//! Plan execution against a session.
//!
//! This is the single translation point between the driver's fault surface
//! and the error taxonomy on the read path: no [`DriverFault`] escapes it
//! untranslated. Building never suspends; execution is the first point a
//! read may wait on I/O.

use sea_query::Value;

use crate::driver::{DriverFault, Session};
use crate::error::RepositoryError;
use crate::query::plan::{Projection, QueryPlan};
use crate::record::ValueMap;

#[cfg(feature = "tracing")]
use crate::observe;

/// Execute a built plan, translating any driver fault.
///
/// # Errors
///
/// `QueryExecution` with `"(data/type issue)"` details for statement/data
/// faults, `"(unknown error)"` for anything else. The driver's own fault
/// text is preserved in `original`.
pub fn execute(plan: &QueryPlan, session: &dyn Session) -> Result<Vec<ValueMap>, RepositoryError> {
    #[cfg(feature = "tracing")]
    let _span = observe::execute_query_span(plan.schema().model()).entered();

    log::debug!(
        "executing {:?} plan for model {}",
        plan.projection(),
        plan.schema().model()
    );
    session
        .execute(plan)
        .map_err(|fault| classify_execution_fault(plan.schema().model(), &fault))
}

fn classify_execution_fault(model: &str, fault: &DriverFault) -> RepositoryError {
    let details = match fault {
        DriverFault::Statement(_) | DriverFault::Data(_) => "(data/type issue)",
        _ => "(unknown error)",
    };
    RepositoryError::QueryExecution {
        model: model.to_string(),
        details: details.to_string(),
        original: fault.message().to_string(),
    }
}

/// Execute a rows plan and return every row.
pub fn fetch_all(plan: &QueryPlan, session: &dyn Session) -> Result<Vec<ValueMap>, RepositoryError> {
    execute(plan, session)
}

/// Execute a rows plan and return the first row, if any.
pub fn fetch_first(
    plan: &QueryPlan,
    session: &dyn Session,
) -> Result<Option<ValueMap>, RepositoryError> {
    Ok(execute(plan, session)?.into_iter().next())
}

/// Execute a count plan and return the scalar.
pub fn fetch_count(plan: &QueryPlan, session: &dyn Session) -> Result<u64, RepositoryError> {
    debug_assert_eq!(plan.projection(), Projection::Count);
    let rows = execute(plan, session)?;
    let scalar = rows.first().and_then(|row| row.values().next());
    match scalar {
        Some(value) => count_scalar(plan.schema().model(), value),
        None => Err(RepositoryError::QueryExecution {
            model: plan.schema().model().to_string(),
            details: "(unknown error)".to_string(),
            original: "count query returned no rows".to_string(),
        }),
    }
}

/// Execute an existence plan and return whether any row matched.
pub fn fetch_exists(plan: &QueryPlan, session: &dyn Session) -> Result<bool, RepositoryError> {
    debug_assert_eq!(plan.projection(), Projection::Exists);
    Ok(!execute(plan, session)?.is_empty())
}

fn count_scalar(model: &str, value: &Value) -> Result<u64, RepositoryError> {
    match value {
        Value::TinyInt(Some(v)) if *v >= 0 => Ok(*v as u64),
        Value::SmallInt(Some(v)) if *v >= 0 => Ok(*v as u64),
        Value::Int(Some(v)) if *v >= 0 => Ok(*v as u64),
        Value::BigInt(Some(v)) if *v >= 0 => Ok(*v as u64),
        Value::TinyUnsigned(Some(v)) => Ok(u64::from(*v)),
        Value::SmallUnsigned(Some(v)) => Ok(u64::from(*v)),
        Value::Unsigned(Some(v)) => Ok(u64::from(*v)),
        Value::BigUnsigned(Some(v)) => Ok(*v),
        other => Err(RepositoryError::QueryExecution {
            model: model.to_string(),
            details: "(data/type issue)".to_string(),
            original: format!("count query returned non-integer scalar {:?}", other),
        }),
    }
}
