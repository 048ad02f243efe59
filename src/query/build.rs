//! Plan building: joins, filters, order-by, pagination.
//!
//! Pure, side-effect-free transformations from a base [`QueryPlan`] plus the
//! caller's declarative inputs to an augmented plan — or a classification
//! error before any I/O happens. Steps must run joins → filters → order →
//! pagination to match load/aliasing semantics; each fails closed, returning
//! no partial plan.

use sea_query::Value;

use crate::error::RepositoryError;
use crate::query::plan::{JoinSpec, OrderDirection, OrderSpec, QueryPlan};
use crate::record::ValueMap;

/// Pagination input as it arrives from the caller.
///
/// Values are deliberately untyped ([`sea_query::Value`]): pagination
/// parameters usually originate in a transport layer, and anything that is
/// not a non-negative integer must surface as a `PaginationParameter` error
/// rather than be silently coerced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub skip: Option<Value>,
    pub limit: Option<Value>,
}

impl Page {
    /// Page with both bounds set.
    pub fn new(skip: impl Into<Value>, limit: impl Into<Value>) -> Self {
        Self {
            skip: Some(skip.into()),
            limit: Some(limit.into()),
        }
    }
}

impl QueryPlan {
    /// Attach an eager-load instruction for each relation name, in order.
    ///
    /// # Errors
    ///
    /// `RelationNotFound` naming the first relation that does not resolve on
    /// the model; the plan is abandoned, not partially returned.
    pub fn with_joins(mut self, joins: &[&str]) -> Result<Self, RepositoryError> {
        for rel in joins {
            let spec = {
                let relation = self.schema().resolve_relation(rel).ok_or_else(|| {
                    RepositoryError::RelationNotFound {
                        model: self.schema().model().to_string(),
                        rel: (*rel).to_string(),
                        original: String::new(),
                    }
                })?;
                JoinSpec {
                    relation: relation.name(),
                    target_table: relation.target_table(),
                    local_column: relation.local_column(),
                    target_column: relation.target_column(),
                }
            };
            self.push_join(spec);
        }
        Ok(self)
    }

    /// Attach one equality predicate per filter entry, ANDed together.
    ///
    /// # Errors
    ///
    /// `FieldNotFound` naming the first filter key that does not resolve on
    /// the model.
    pub fn with_filters(mut self, filters: Option<&ValueMap>) -> Result<Self, RepositoryError> {
        let Some(filters) = filters else {
            return Ok(self);
        };
        for (key, value) in filters {
            let column = self
                .schema()
                .resolve_field(key)
                .ok_or_else(|| RepositoryError::FieldNotFound {
                    model: self.schema().model().to_string(),
                    field: key.clone(),
                    original: String::new(),
                })?
                .name();
            self.push_filter(column, value.clone());
        }
        Ok(self)
    }

    /// Attach an order-by clause.
    ///
    /// A bare field name orders ascending; a `desc` (or explicit `asc`)
    /// suffix after whitespace selects the direction.
    ///
    /// # Errors
    ///
    /// `OrderByField` when the field does not resolve on the model or the
    /// specification cannot be parsed.
    pub fn with_order_by(mut self, order_by: Option<&str>) -> Result<Self, RepositoryError> {
        let Some(order_by) = order_by else {
            return Ok(self);
        };
        let order_by_error = |original: String| RepositoryError::OrderByField {
            model: self.schema().model().to_string(),
            field: order_by.to_string(),
            original,
        };

        let mut parts = order_by.split_whitespace();
        let name = parts.next().ok_or_else(|| order_by_error(String::new()))?;
        let direction = match parts.next() {
            None => OrderDirection::Asc,
            Some(word) if word.eq_ignore_ascii_case("asc") => OrderDirection::Asc,
            Some(word) if word.eq_ignore_ascii_case("desc") => OrderDirection::Desc,
            Some(word) => {
                return Err(order_by_error(format!("unknown direction '{word}'")));
            }
        };
        if parts.next().is_some() {
            return Err(order_by_error("trailing tokens after direction".to_string()));
        }

        let column = self
            .schema()
            .resolve_field(name)
            .ok_or_else(|| order_by_error(String::new()))?
            .name();
        self.set_order_by(OrderSpec { column, direction });
        Ok(self)
    }

    /// Attach offset/limit bounds.
    ///
    /// # Errors
    ///
    /// `PaginationParameter` when `skip` or `limit` is present but not a
    /// non-negative integer value.
    pub fn with_pagination(mut self, page: &Page) -> Result<Self, RepositoryError> {
        if let Some(skip) = &page.skip {
            let skip = page_parameter(self.schema().model(), "skip", skip)?;
            self.set_skip(skip);
        }
        if let Some(limit) = &page.limit {
            let limit = page_parameter(self.schema().model(), "limit", limit)?;
            self.set_limit(limit);
        }
        Ok(self)
    }
}

fn page_parameter(model: &str, name: &str, value: &Value) -> Result<u64, RepositoryError> {
    let out_of_range = |got: &dyn std::fmt::Debug| RepositoryError::PaginationParameter {
        model: model.to_string(),
        field: name.to_string(),
        details: format!("expected a non-negative integer, got {:?}", got),
        original: String::new(),
    };
    match value {
        Value::TinyInt(Some(v)) if *v >= 0 => Ok(*v as u64),
        Value::SmallInt(Some(v)) if *v >= 0 => Ok(*v as u64),
        Value::Int(Some(v)) if *v >= 0 => Ok(*v as u64),
        Value::BigInt(Some(v)) if *v >= 0 => Ok(*v as u64),
        Value::TinyUnsigned(Some(v)) => Ok(u64::from(*v)),
        Value::SmallUnsigned(Some(v)) => Ok(u64::from(*v)),
        Value::Unsigned(Some(v)) => Ok(u64::from(*v)),
        Value::BigUnsigned(Some(v)) => Ok(*v),
        other => Err(out_of_range(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, FieldType, RelationDef, SchemaDescriptor};
    use once_cell::sync::Lazy;

    static SCHEMA: Lazy<SchemaDescriptor> = Lazy::new(|| {
        SchemaDescriptor::builder("User", "users")
            .field(FieldDef::new("id", FieldType::Integer).primary_key())
            .field(FieldDef::new("name", FieldType::Text).unique())
            .field(FieldDef::new("position", FieldType::Text).nullable())
            .relation(RelationDef::new("profile", "profiles", "id", "user_id"))
            .build()
    });

    fn filters(pairs: &[(&str, Value)]) -> ValueMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_with_filters_resolves_fields() {
        let plan = QueryPlan::select(&SCHEMA)
            .with_filters(Some(&filters(&[("name", Value::from("amy"))])))
            .expect("valid filter");
        assert_eq!(plan.filters().len(), 1);
        assert_eq!(plan.filters()[0].0, "name");
    }

    #[test]
    fn test_with_filters_unknown_field_fails_closed() {
        let err = QueryPlan::select(&SCHEMA)
            .with_filters(Some(&filters(&[("nickname", Value::from("x"))])))
            .expect_err("unknown field");
        assert_eq!(
            err,
            RepositoryError::FieldNotFound {
                model: "User".to_string(),
                field: "nickname".to_string(),
                original: String::new(),
            }
        );
    }

    #[test]
    fn test_with_joins_unknown_relation_reports_first_invalid() {
        let err = QueryPlan::select(&SCHEMA)
            .with_joins(&["bogus", "also_bogus"])
            .expect_err("unknown relation");
        assert_eq!(
            err,
            RepositoryError::RelationNotFound {
                model: "User".to_string(),
                rel: "bogus".to_string(),
                original: String::new(),
            }
        );
    }

    #[test]
    fn test_with_joins_attaches_in_order() {
        let plan = QueryPlan::select(&SCHEMA)
            .with_joins(&["profile"])
            .expect("valid join");
        assert_eq!(plan.joins().len(), 1);
        assert_eq!(plan.joins()[0].target_table, "profiles");
    }

    #[test]
    fn test_with_order_by_bare_field_is_ascending() {
        let plan = QueryPlan::select(&SCHEMA)
            .with_order_by(Some("name"))
            .expect("valid order");
        let order = plan.order_by().expect("order set");
        assert_eq!(order.column, "name");
        assert_eq!(order.direction, OrderDirection::Asc);
    }

    #[test]
    fn test_with_order_by_direction_suffix() {
        let plan = QueryPlan::select(&SCHEMA)
            .with_order_by(Some("name desc"))
            .expect("valid order");
        assert_eq!(plan.order_by().unwrap().direction, OrderDirection::Desc);
    }

    #[test]
    fn test_with_order_by_unknown_field() {
        let err = QueryPlan::select(&SCHEMA)
            .with_order_by(Some("nickname"))
            .expect_err("unknown field");
        assert!(matches!(err, RepositoryError::OrderByField { field, .. } if field == "nickname"));
    }

    #[test]
    fn test_with_order_by_bad_direction() {
        let err = QueryPlan::select(&SCHEMA)
            .with_order_by(Some("name sideways"))
            .expect_err("bad direction");
        assert!(matches!(err, RepositoryError::OrderByField { .. }));
    }

    #[test]
    fn test_with_pagination_valid() {
        let plan = QueryPlan::select(&SCHEMA)
            .with_pagination(&Page::new(5, 3))
            .expect("valid page");
        assert_eq!(plan.skip(), Some(5));
        assert_eq!(plan.limit(), Some(3));
    }

    #[test]
    fn test_with_pagination_negative() {
        let err = QueryPlan::select(&SCHEMA)
            .with_pagination(&Page {
                skip: Some(Value::from(-1)),
                limit: None,
            })
            .expect_err("negative skip");
        assert!(
            matches!(err, RepositoryError::PaginationParameter { field, .. } if field == "skip")
        );
    }

    #[test]
    fn test_with_pagination_non_integer() {
        let err = QueryPlan::select(&SCHEMA)
            .with_pagination(&Page {
                skip: None,
                limit: Some(Value::from("ten")),
            })
            .expect_err("non-integer limit");
        assert!(
            matches!(err, RepositoryError::PaginationParameter { field, .. } if field == "limit")
        );
    }

    #[test]
    fn test_building_is_idempotent() {
        let build = || {
            QueryPlan::select(&SCHEMA)
                .with_joins(&["profile"])
                .and_then(|p| p.with_filters(Some(&filters(&[("name", Value::from("amy"))]))))
                .and_then(|p| p.with_order_by(Some("name")))
                .and_then(|p| p.with_pagination(&Page::new(5, 3)))
                .expect("plan builds")
        };
        assert_eq!(build(), build());
    }
}
