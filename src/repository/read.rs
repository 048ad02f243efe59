//! Read capability.

use crate::driver::Session;
use crate::error::RepositoryError;
use crate::query::execution::{fetch_all, fetch_count, fetch_exists, fetch_first};
use crate::query::{Page, QueryPlan};
use crate::record::{Record, ValueMap};
use crate::repository::{require_schema, RepositoryDef};

/// Repository capability: read records.
///
/// Every method builds a full plan first — joins, then filters, then order,
/// then pagination — so classification errors surface before any I/O, and
/// executes it exactly once.
pub trait Reader: RepositoryDef {
    /// Return one record matching `filters`, or `None`.
    ///
    /// # Errors
    ///
    /// `Usage` without a declared model; `RelationNotFound` /
    /// `FieldNotFound` for unresolvable joins or filter keys;
    /// `QueryExecution` for driver faults.
    fn get_one(
        &self,
        session: &dyn Session,
        filters: Option<&ValueMap>,
        joins: Option<&[&str]>,
    ) -> Result<Option<Record>, RepositoryError> {
        let schema = require_schema(self)?;
        let plan = QueryPlan::select(schema)
            .with_joins(joins.unwrap_or(&[]))?
            .with_filters(filters)?;
        let row = fetch_first(&plan, session)?;
        Ok(row.map(|row| Record::from_row(schema, row)))
    }

    /// Return every record matching `filters`, honoring order and pagination.
    ///
    /// # Errors
    ///
    /// As [`Reader::get_one`], plus `OrderByField` and
    /// `PaginationParameter` for invalid order/page input.
    fn list(
        &self,
        session: &dyn Session,
        filters: Option<&ValueMap>,
        order_by: Option<&str>,
        page: &Page,
        joins: Option<&[&str]>,
    ) -> Result<Vec<Record>, RepositoryError> {
        let schema = require_schema(self)?;
        let plan = QueryPlan::select(schema)
            .with_joins(joins.unwrap_or(&[]))?
            .with_filters(filters)?
            .with_order_by(order_by)?
            .with_pagination(page)?;
        let rows = fetch_all(&plan, session)?;
        Ok(rows
            .into_iter()
            .map(|row| Record::from_row(schema, row))
            .collect())
    }

    /// Return the first record matching `filters` in `order_by` order.
    fn first(
        &self,
        session: &dyn Session,
        filters: Option<&ValueMap>,
        order_by: Option<&str>,
        joins: Option<&[&str]>,
    ) -> Result<Option<Record>, RepositoryError> {
        let schema = require_schema(self)?;
        let plan = QueryPlan::select(schema)
            .with_joins(joins.unwrap_or(&[]))?
            .with_filters(filters)?
            .with_order_by(order_by)?;
        let row = fetch_first(&plan, session)?;
        Ok(row.map(|row| Record::from_row(schema, row)))
    }

    /// Count records matching `filters`.
    fn count(
        &self,
        session: &dyn Session,
        filters: Option<&ValueMap>,
    ) -> Result<u64, RepositoryError> {
        let schema = require_schema(self)?;
        let plan = QueryPlan::count(schema).with_filters(filters)?;
        fetch_count(&plan, session)
    }

    /// Whether any record matches `filters`.
    fn exists(
        &self,
        session: &dyn Session,
        filters: Option<&ValueMap>,
        joins: Option<&[&str]>,
    ) -> Result<bool, RepositoryError> {
        let schema = require_schema(self)?;
        let plan = QueryPlan::exists(schema)
            .with_joins(joins.unwrap_or(&[]))?
            .with_filters(filters)?;
        fetch_exists(&plan, session)
    }
}
